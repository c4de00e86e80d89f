//! Local filesystem storage implementation.
//!
//! Keeps brands and products in two JSON files under a root directory:
//!
//! ```text
//! {root}/
//! ├── brands.json     # Vec<Brand>
//! └── products.json   # Vec<StoredProduct>, keyed by external_id
//! ```
//!
//! Writes go through a temp-file-and-rename so a crashed write never leaves
//! a half-written file behind. A single interior mutex serializes all
//! read-modify-write cycles, which gives the per-external-id atomicity the
//! upsert contract requires.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Brand, ProductRecord, StoredProduct};
use crate::storage::{BrandWithProducts, ProductStore};

const BRANDS_FILE: &str = "brands.json";
const PRODUCTS_FILE: &str = "products.json";

/// Local filesystem storage backend.
pub struct LocalStore {
    root_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data, defaulting to an empty collection when absent.
    async fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(T::default()),
        }
    }

    async fn load_brands(&self) -> Result<Vec<Brand>> {
        self.read_json(BRANDS_FILE).await
    }

    async fn load_products(&self) -> Result<Vec<StoredProduct>> {
        self.read_json(PRODUCTS_FILE).await
    }
}

#[async_trait]
impl ProductStore for LocalStore {
    async fn put_brand(&self, brand: &Brand) -> Result<()> {
        brand.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut brands = self.load_brands().await?;
        match brands.iter_mut().find(|b| b.id == brand.id) {
            Some(existing) => *existing = brand.clone(),
            None => brands.push(brand.clone()),
        }
        self.write_json(BRANDS_FILE, &brands).await?;
        log::info!("Stored brand '{}' ({})", brand.name, brand.id);
        Ok(())
    }

    async fn find_brand(&self, id: &str) -> Result<Option<Brand>> {
        let brands = self.load_brands().await?;
        Ok(brands.into_iter().find(|b| b.id == id))
    }

    async fn list_brands(&self) -> Result<Vec<Brand>> {
        self.load_brands().await
    }

    async fn upsert_product(
        &self,
        record: &ProductRecord,
        brand_id: &str,
    ) -> Result<StoredProduct> {
        if record.external_id.is_empty() {
            return Err(AppError::validation(
                "cannot upsert a product without an external id",
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut products = self.load_products().await?;

        let row = match products
            .iter_mut()
            .find(|p| p.external_id == record.external_id)
        {
            Some(existing) => {
                existing.apply(record, brand_id);
                existing.clone()
            }
            None => {
                let row = StoredProduct::from_record(record, brand_id);
                products.push(row.clone());
                row
            }
        };

        self.write_json(PRODUCTS_FILE, &products).await?;
        Ok(row)
    }

    async fn search_products(&self, name_substring: &str) -> Result<Vec<StoredProduct>> {
        let needle = name_substring.to_lowercase();
        let products = self.load_products().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn get_brand_with_products(&self, id: &str) -> Result<Option<BrandWithProducts>> {
        let Some(brand) = self.find_brand(id).await? else {
            return Ok(None);
        };
        let products: Vec<StoredProduct> = self
            .load_products()
            .await?
            .into_iter()
            .filter(|p| p.brand_id == id)
            .collect();
        let count = products.len();
        Ok(Some(BrandWithProducts {
            brand,
            products,
            count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn brand(id: &str) -> Brand {
        Brand {
            id: id.to_string(),
            name: format!("Brand {id}"),
            listing_url: format!("https://shop.example.com/s?me={id}"),
        }
    }

    fn record(external_id: &str, name: &str) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            external_id: external_id.to_string(),
            secondary_id: String::new(),
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_put_and_find_brand() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.put_brand(&brand("acme")).await.unwrap();

        let found = store.find_brand("acme").await.unwrap().unwrap();
        assert_eq!(found.name, "Brand acme");
        assert!(store.find_brand("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_brand_replaces_by_id() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.put_brand(&brand("acme")).await.unwrap();
        let mut renamed = brand("acme");
        renamed.name = "Acme Corp".to_string();
        store.put_brand(&renamed).await.unwrap();

        let brands = store.list_brands().await.unwrap();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name, "Acme Corp");
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_external_id() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .upsert_product(&record("B000TEST01", "Widget"), "acme")
            .await
            .unwrap();

        let mut updated = record("B000TEST01", "Widget v2");
        updated.image_url = "https://img.example.com/2.jpg".to_string();
        let row = store.upsert_product(&updated, "acme").await.unwrap();

        assert_eq!(row.name, "Widget v2");

        let all = store.search_products("").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Widget v2");
        assert_eq!(all[0].image_url, "https://img.example.com/2.jpg");
    }

    #[tokio::test]
    async fn test_upsert_rejects_empty_key() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let result = store.upsert_product(&record("", "No Key"), "acme").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_contains() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .upsert_product(&record("B1", "Acme Deluxe Widget"), "acme")
            .await
            .unwrap();
        store
            .upsert_product(&record("B2", "Generic Gadget"), "acme")
            .await
            .unwrap();

        let hits = store.search_products("deluxe").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, "B1");

        assert!(store.search_products("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_brand_with_products_filters_and_counts() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.put_brand(&brand("acme")).await.unwrap();
        store
            .upsert_product(&record("B1", "Widget"), "acme")
            .await
            .unwrap();
        store
            .upsert_product(&record("B2", "Gadget"), "other")
            .await
            .unwrap();

        let result = store
            .get_brand_with_products("acme")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.products[0].external_id, "B1");

        assert!(store
            .get_brand_with_products("missing")
            .await
            .unwrap()
            .is_none());
    }
}
