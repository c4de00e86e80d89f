// src/main.rs

//! shelfwatch CLI
//!
//! Local entry point for crawling brand listings and querying the store.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use shelfwatch::error::Result;
use shelfwatch::models::{Brand, Config};
use shelfwatch::pipeline;
use shelfwatch::services::{BrandCrawler, UserAgentPool};
use shelfwatch::storage::{LocalStore, ProductStore};

/// shelfwatch - brand listing crawler
#[derive(Parser, Debug)]
#[command(
    name = "shelfwatch",
    version,
    about = "Crawls e-commerce brand listings and keeps product records up to date"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Directory holding the brand/product store
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register or update a crawl target
    AddBrand {
        /// Unique brand identifier
        id: String,
        /// Brand display name
        name: String,
        /// Absolute URL of the first listing page
        listing_url: String,
    },

    /// Crawl a single brand
    Crawl {
        /// Brand identifier
        brand_id: String,
    },

    /// Crawl all known brands once
    CrawlAll,

    /// Crawl all known brands on a fixed interval
    Watch {
        /// Seconds between runs
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },

    /// Search stored products by name substring
    Search {
        /// Case-insensitive name fragment
        name: String,
    },

    /// Show a brand and its stored products
    Show {
        /// Brand identifier
        brand_id: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_crawler(config: &Config) -> Result<BrandCrawler> {
    let agents = UserAgentPool::load(&config.crawler.user_agent_file);
    BrandCrawler::new(config.clone(), agents)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let store = LocalStore::new(&cli.storage_dir);

    match cli.command {
        Command::AddBrand {
            id,
            name,
            listing_url,
        } => {
            let brand = Brand {
                id,
                name,
                listing_url,
            };
            store.put_brand(&brand).await?;
            println!("Added brand '{}' ({})", brand.name, brand.id);
        }

        Command::Crawl { brand_id } => {
            let Some(brand) = store.find_brand(&brand_id).await? else {
                log::error!("Unknown brand '{brand_id}'. Run 'add-brand' first.");
                return Err(shelfwatch::error::AppError::config("brand not found"));
            };

            let crawler = build_crawler(&config)?;
            let report = crawler.crawl(&brand, &store).await?;
            println!(
                "Crawled brand '{}': {} pages, {} records, {} skipped, {} upsert failures",
                brand.name,
                report.pages_fetched,
                report.records_collected,
                report.items_skipped,
                report.upsert_failures
            );
        }

        Command::CrawlAll => {
            let crawler = build_crawler(&config)?;
            let summary = pipeline::scrape_all_brands(&crawler, &store).await?;
            println!(
                "Crawled {} brands ({} cached, {} failed), {} records",
                summary.brands_total,
                summary.brands_cached,
                summary.brands_failed,
                summary.records_collected
            );
        }

        Command::Watch { interval_secs } => {
            // One crawler instance so the run cache survives across ticks.
            let crawler = build_crawler(&config)?;
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

            log::info!("Watching all brands every {interval_secs}s. Ctrl-C to stop.");
            loop {
                ticker.tick().await;
                if let Err(e) = pipeline::scrape_all_brands(&crawler, &store).await {
                    log::error!("Scheduled crawl failed: {e}");
                }
            }
        }

        Command::Search { name } => {
            let products = store.search_products(&name).await?;
            println!("{} products match '{}'", products.len(), name);
            for product in products {
                println!(
                    "  {}  {}  [{}]",
                    product.external_id, product.name, product.brand_id
                );
            }
        }

        Command::Show { brand_id } => {
            match store.get_brand_with_products(&brand_id).await? {
                Some(result) => {
                    println!(
                        "{} ({}): {} products",
                        result.brand.name, result.brand.id, result.count
                    );
                    for product in result.products {
                        println!(
                            "  {}  {}  updated {}",
                            product.external_id,
                            product.name,
                            product.updated_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                None => println!("Unknown brand '{brand_id}'"),
            }
        }

        Command::Validate => {
            config.validate()?;
            println!("Configuration OK");
        }
    }

    Ok(())
}
