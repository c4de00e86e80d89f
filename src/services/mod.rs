// src/services/mod.rs

//! Crawl services: user-agent pool, page fetcher, field extractor,
//! run cache, and the per-brand pagination walker.

pub mod agents;
pub mod cache;
pub mod crawler;
pub mod extractor;
pub mod fetcher;

pub use agents::UserAgentPool;
pub use cache::RunCache;
pub use crawler::{BrandCrawler, CrawlReport};
pub use extractor::{FieldExtractor, ListingPage, decode_secondary_id};
pub use fetcher::{FetchOutcome, PageFetcher};
