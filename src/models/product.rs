//! Product data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product extracted from one listing item.
///
/// Every field is independently optional at extraction time; an item with
/// all four fields empty is discarded before it ever reaches the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    /// Product display name
    pub name: String,

    /// The catalog's own unique product identifier (upsert join key)
    pub external_id: String,

    /// Secondary identifier recovered from the embedded encoded payload
    pub secondary_id: String,

    /// URL of the primary listing image
    pub image_url: String,
}

impl ProductRecord {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.external_id.is_empty()
            && self.secondary_id.is_empty()
            && self.image_url.is_empty()
    }
}

/// A product row as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredProduct {
    /// Unique product identifier (row key)
    pub external_id: String,

    /// Product display name
    pub name: String,

    /// Decoded secondary identifier (may be empty)
    pub secondary_id: String,

    /// URL of the primary listing image (may be empty)
    pub image_url: String,

    /// Owning brand identifier
    pub brand_id: String,

    /// Time of the last upsert touching this row
    pub updated_at: DateTime<Utc>,
}

impl StoredProduct {
    /// Build a fresh row from an extracted record.
    pub fn from_record(record: &ProductRecord, brand_id: &str) -> Self {
        Self {
            external_id: record.external_id.clone(),
            name: record.name.clone(),
            secondary_id: record.secondary_id.clone(),
            image_url: record.image_url.clone(),
            brand_id: brand_id.to_string(),
            updated_at: Utc::now(),
        }
    }

    /// Overwrite the mutable fields from a re-crawled record.
    ///
    /// The `external_id` key never changes.
    pub fn apply(&mut self, record: &ProductRecord, brand_id: &str) {
        self.name = record.name.clone();
        self.secondary_id = record.secondary_id.clone();
        self.image_url = record.image_url.clone();
        self.brand_id = brand_id.to_string();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(ProductRecord::default().is_empty());

        let record = ProductRecord {
            image_url: "https://img.example.com/1.jpg".to_string(),
            ..ProductRecord::default()
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn test_apply_keeps_key() {
        let record = ProductRecord {
            name: "Widget".to_string(),
            external_id: "B000TEST01".to_string(),
            ..ProductRecord::default()
        };
        let mut row = StoredProduct::from_record(&record, "acme");

        let updated = ProductRecord {
            name: "Widget v2".to_string(),
            external_id: "B000TEST01".to_string(),
            secondary_id: "sku-9".to_string(),
            ..ProductRecord::default()
        };
        row.apply(&updated, "acme");

        assert_eq!(row.external_id, "B000TEST01");
        assert_eq!(row.name, "Widget v2");
        assert_eq!(row.secondary_id, "sku-9");
    }
}
