//! Storage abstractions for brand and product persistence.
//!
//! The store is a simple keyed collaborator: brands by id, products by their
//! catalog `external_id`. Upserts are idempotent: re-crawling the same
//! `external_id` updates the row in place, never duplicates it.

pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Brand, ProductRecord, StoredProduct};

// Re-export for convenience
pub use local::LocalStore;

/// A brand together with its stored products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandWithProducts {
    pub brand: Brand,
    pub products: Vec<StoredProduct>,
    pub count: usize,
}

/// Trait for brand/product storage backends.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert or replace a brand definition (admin surface).
    async fn put_brand(&self, brand: &Brand) -> Result<()>;

    /// Look up a brand by id.
    async fn find_brand(&self, id: &str) -> Result<Option<Brand>>;

    /// All known brands, in insertion order.
    async fn list_brands(&self) -> Result<Vec<Brand>>;

    /// Insert or update a product row keyed on `record.external_id`.
    ///
    /// An existing row keeps its key and gets its mutable fields (name,
    /// secondary id, image, brand) overwritten.
    async fn upsert_product(&self, record: &ProductRecord, brand_id: &str)
        -> Result<StoredProduct>;

    /// Case-insensitive substring search over product names.
    async fn search_products(&self, name_substring: &str) -> Result<Vec<StoredProduct>>;

    /// A brand with its products and their count, if the brand exists.
    async fn get_brand_with_products(&self, id: &str) -> Result<Option<BrandWithProducts>>;
}
