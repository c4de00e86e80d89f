//! Brand data structure.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A crawl target: one brand with a paginated category listing.
///
/// Brands are created through the admin surface (`add-brand`) and are
/// read-only to the crawl pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Brand {
    /// Unique brand identifier
    pub id: String,

    /// Brand display name
    pub name: String,

    /// Absolute URL of the first listing page
    pub listing_url: String,
}

impl Brand {
    /// Check that the brand carries usable values.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::validation("brand id is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation("brand name is empty"));
        }
        url::Url::parse(&self.listing_url)
            .map_err(|e| AppError::validation(format!("brand listing_url invalid: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_brand() -> Brand {
        Brand {
            id: "acme".to_string(),
            name: "Acme".to_string(),
            listing_url: "https://shop.example.com/s?me=acme".to_string(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_brand().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let mut brand = sample_brand();
        brand.listing_url = "/s?me=acme".to_string();
        assert!(brand.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let mut brand = sample_brand();
        brand.id = "  ".to_string();
        assert!(brand.validate().is_err());
    }
}
