// src/services/crawler.rs

//! Per-brand pagination walker.
//!
//! Drives the page-by-page crawl for one brand: politeness delay, fetch with
//! retry, pure extraction, per-record upsert, next-link resolution. The run
//! cache is consulted once before any network activity and armed once at the
//! end, including after an early termination (partial pages are kept).

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Brand, Config, ProductRecord};
use crate::services::{FetchOutcome, FieldExtractor, PageFetcher, RunCache, UserAgentPool};
use crate::storage::ProductStore;
use crate::utils::sleep_range;

/// Summary of one brand crawl run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub brand_id: String,
    /// True when the run cache was warm and no work was done
    pub from_cache: bool,
    pub pages_fetched: usize,
    pub records_collected: usize,
    pub items_skipped: usize,
    pub upsert_failures: usize,
    /// True when the retry budget ran out before the last page
    pub terminated_early: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    fn started(brand_id: &str) -> Self {
        let now = Utc::now();
        Self {
            brand_id: brand_id.to_string(),
            from_cache: false,
            pages_fetched: 0,
            records_collected: 0,
            items_skipped: 0,
            upsert_failures: 0,
            terminated_early: false,
            started_at: now,
            finished_at: now,
        }
    }
}

/// Crawls one brand's paginated listing into the store.
pub struct BrandCrawler {
    fetcher: PageFetcher,
    extractor: FieldExtractor,
    cache: RunCache,
    config: Config,
}

impl BrandCrawler {
    /// Build a crawler from configuration and a user-agent pool.
    pub fn new(config: Config, agents: UserAgentPool) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(config.crawler.clone(), agents)?,
            extractor: FieldExtractor::new(&config.markup)?,
            cache: RunCache::new(config.cache.ttl_secs),
            config,
        })
    }

    /// Bound for parallel brand runs, from configuration.
    pub fn max_concurrent_brands(&self) -> usize {
        self.config.crawler.max_concurrent_brands.max(1)
    }

    /// The run cache gating this crawler's runs.
    pub fn cache(&self) -> &RunCache {
        &self.cache
    }

    /// Run one full pagination traversal for a brand.
    ///
    /// Upsert failures never abort the page loop; they are logged, counted,
    /// and the record still joins the run result handed to the cache.
    pub async fn crawl(&self, brand: &Brand, store: &dyn ProductStore) -> Result<CrawlReport> {
        let mut report = CrawlReport::started(&brand.id);

        if self.cache.get(&brand.id).is_some() {
            log::info!(
                "Results for brand '{}' already cached; skipping crawl",
                brand.name
            );
            report.from_cache = true;
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let mut collected: Vec<ProductRecord> = Vec::new();
        let mut current_url = Some(brand.listing_url.clone());
        let mut page_number = 1usize;

        while let Some(url) = current_url.take() {
            sleep_range(&self.config.crawler.page_delay).await;

            let (body, final_url) = match self.fetcher.fetch_with_retry(&url).await {
                FetchOutcome::Success { body, final_url } => (body, final_url),
                FetchOutcome::Blocked | FetchOutcome::Failed(_) => {
                    log::warn!(
                        "Stopping crawl for brand '{}' at page {page_number}; keeping {} records from earlier pages",
                        brand.name,
                        collected.len()
                    );
                    report.terminated_early = true;
                    break;
                }
            };

            // Extraction is synchronous and store-free; persistence follows.
            let page = self.extractor.parse_listing_page(&body, &final_url);
            log::info!(
                "Page {page_number} for brand '{}': {} items, {} kept",
                brand.name,
                page.records.len() + page.skipped,
                page.records.len()
            );
            report.items_skipped += page.skipped;

            for record in &page.records {
                if let Err(e) = store.upsert_product(record, &brand.id).await {
                    report.upsert_failures += 1;
                    log::error!(
                        "Upsert failed for product '{}' of brand '{}': {e}",
                        record.external_id,
                        brand.name
                    );
                }
            }
            collected.extend(page.records);

            report.pages_fetched += 1;
            current_url = page.next_url;
            page_number += 1;
        }

        report.records_collected = collected.len();
        self.cache.set(&brand.id, &collected)?;
        log::info!(
            "Scraped and cached {} records for brand '{}'",
            collected.len(),
            brand.name
        );

        report.finished_at = Utc::now();
        Ok(report)
    }
}
