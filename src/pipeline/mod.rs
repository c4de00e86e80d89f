//! Pipeline entry points for crawler operations.
//!
//! - `scrape_all_brands`: run the crawl for every known brand

pub mod crawl;

pub use crawl::{RunSummary, scrape_all_brands};
