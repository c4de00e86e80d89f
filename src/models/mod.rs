// src/models/mod.rs

//! Domain models for the crawler application.

mod brand;
mod config;
mod product;

// Re-export all public types
pub use brand::Brand;
pub use config::{CacheConfig, Config, CrawlerConfig, DelayRange, MarkupConfig};
pub use product::{ProductRecord, StoredProduct};
