// src/pipeline/crawl.rs

//! All-brands crawl pipeline.
//!
//! The scheduler-facing entry point: iterate every known brand and run the
//! pagination walker for each. One brand's terminal failure never prevents
//! the next brand from being attempted.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::services::BrandCrawler;
use crate::storage::ProductStore;

/// Summary of one all-brands run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub brands_total: usize,
    pub brands_failed: usize,
    pub brands_cached: usize,
    pub records_collected: usize,
    pub upsert_failures: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Crawl every brand in the store.
///
/// Brands run with bounded concurrency; pages within one brand stay strictly
/// sequential. Per-brand errors are logged and counted, never propagated.
pub async fn scrape_all_brands(
    crawler: &BrandCrawler,
    store: &dyn ProductStore,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    let brands = store.list_brands().await?;
    log::info!("Starting crawl for {} brands", brands.len());

    let mut summary = RunSummary {
        brands_total: brands.len(),
        brands_failed: 0,
        brands_cached: 0,
        records_collected: 0,
        upsert_failures: 0,
        started_at,
        finished_at: started_at,
    };

    let mut runs = stream::iter(brands)
        .map(|brand| async move {
            let result = crawler.crawl(&brand, store).await;
            (brand, result)
        })
        .buffer_unordered(crawler.max_concurrent_brands());

    while let Some((brand, result)) = runs.next().await {
        match result {
            Ok(report) => {
                if report.from_cache {
                    summary.brands_cached += 1;
                }
                summary.records_collected += report.records_collected;
                summary.upsert_failures += report.upsert_failures;
            }
            Err(error) => {
                summary.brands_failed += 1;
                log::error!("Crawl failed for brand '{}': {error}", brand.name);
            }
        }
    }

    summary.finished_at = Utc::now();
    log::info!(
        "Crawl finished: {} brands ({} cached, {} failed), {} records collected, {} upsert failures, took {}s",
        summary.brands_total,
        summary.brands_cached,
        summary.brands_failed,
        summary.records_collected,
        summary.upsert_failures,
        (summary.finished_at - summary.started_at).num_seconds()
    );

    Ok(summary)
}
