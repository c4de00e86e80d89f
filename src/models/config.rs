//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing markup selectors and attribute markers
    #[serde(default)]
    pub markup: MarkupConfig,

    /// Run cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_fetch_attempts == 0 {
            return Err(AppError::validation(
                "crawler.max_fetch_attempts must be > 0",
            ));
        }
        if self.crawler.max_concurrent_brands == 0 {
            return Err(AppError::validation(
                "crawler.max_concurrent_brands must be > 0",
            ));
        }
        if self.crawler.captcha_marker.trim().is_empty() {
            return Err(AppError::validation("crawler.captcha_marker is empty"));
        }
        self.crawler.page_delay.validate("crawler.page_delay")?;
        self.crawler.retry_delay.validate("crawler.retry_delay")?;
        self.crawler
            .blocked_cooldown
            .validate("crawler.blocked_cooldown")?;
        for (name, value) in [
            ("markup.item_selector", &self.markup.item_selector),
            ("markup.title_selector", &self.markup.title_selector),
            ("markup.image_selector", &self.markup.image_selector),
            ("markup.external_id_attr", &self.markup.external_id_attr),
            ("markup.trigger_attr", &self.markup.trigger_attr),
            ("markup.next_page_selector", &self.markup.next_page_selector),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        Ok(())
    }
}

/// A randomized delay interval in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A zero-length range, used by tests to disable sleeping.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min_ms > self.max_ms {
            return Err(AppError::validation(format!("{name}: min_ms > max_ms")));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Path to the newline-separated user-agent list
    #[serde(default = "defaults::user_agent_file")]
    pub user_agent_file: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Total fetch attempts per URL (first try included)
    #[serde(default = "defaults::max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// Politeness delay before each page fetch
    #[serde(default = "defaults::page_delay")]
    pub page_delay: DelayRange,

    /// Delay before re-attempting a failed fetch
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay: DelayRange,

    /// Cooldown after a CAPTCHA or rate-limit response
    #[serde(default = "defaults::blocked_cooldown")]
    pub blocked_cooldown: DelayRange,

    /// Maximum brands crawled in parallel
    #[serde(default = "defaults::max_concurrent_brands")]
    pub max_concurrent_brands: usize,

    /// Substring of the final URL that signals a CAPTCHA interstitial
    #[serde(default = "defaults::captcha_marker")]
    pub captcha_marker: String,

    /// Referer header sent with every request
    #[serde(default = "defaults::referer")]
    pub referer: String,

    /// Accept-Language header sent with every request
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent_file: defaults::user_agent_file(),
            timeout_secs: defaults::timeout(),
            max_fetch_attempts: defaults::max_fetch_attempts(),
            page_delay: defaults::page_delay(),
            retry_delay: defaults::retry_delay(),
            blocked_cooldown: defaults::blocked_cooldown(),
            max_concurrent_brands: defaults::max_concurrent_brands(),
            captcha_marker: defaults::captcha_marker(),
            referer: defaults::referer(),
            accept_language: defaults::accept_language(),
        }
    }
}

/// Listing markup selectors and attribute markers.
///
/// Defaults target the result-grid markup of the source catalog; brittle to
/// site changes, which is why every marker is configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// CSS selector for one listing item
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// CSS selector for the product title region (last match wins)
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Data attribute carrying the catalog identifier
    #[serde(default = "defaults::external_id_attr")]
    pub external_id_attr: String,

    /// CSS selector for the primary product image
    #[serde(default = "defaults::image_selector")]
    pub image_selector: String,

    /// Data attribute carrying the JSON-encoded trigger payload
    #[serde(default = "defaults::trigger_attr")]
    pub trigger_attr: String,

    /// CSS selector for the next-page navigation link
    #[serde(default = "defaults::next_page_selector")]
    pub next_page_selector: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            external_id_attr: defaults::external_id_attr(),
            image_selector: defaults::image_selector(),
            trigger_attr: defaults::trigger_attr(),
            next_page_selector: defaults::next_page_selector(),
        }
    }
}

/// Run cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a crawled result blocks a redundant re-crawl
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::cache_ttl(),
        }
    }
}

mod defaults {
    use super::DelayRange;

    // Crawler defaults
    pub fn user_agent_file() -> String {
        "data/user-agents.txt".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_fetch_attempts() -> u32 {
        3
    }
    pub fn page_delay() -> DelayRange {
        DelayRange::new(2_000, 6_000)
    }
    pub fn retry_delay() -> DelayRange {
        DelayRange::new(5_000, 10_000)
    }
    pub fn blocked_cooldown() -> DelayRange {
        DelayRange::new(60_000, 120_000)
    }
    pub fn max_concurrent_brands() -> usize {
        1
    }
    pub fn captcha_marker() -> String {
        "captcha".into()
    }
    pub fn referer() -> String {
        "https://www.google.com/".into()
    }
    pub fn accept_language() -> String {
        "da, en-gb, en".into()
    }

    // Markup defaults
    pub fn item_selector() -> String {
        "div.sg-col-inner".into()
    }
    pub fn title_selector() -> String {
        "span.a-size-base-plus".into()
    }
    pub fn external_id_attr() -> String {
        "data-csa-c-asin".into()
    }
    pub fn image_selector() -> String {
        "img.s-image".into()
    }
    pub fn trigger_attr() -> String {
        "data-s-safe-ajax-modal-trigger".into()
    }
    pub fn next_page_selector() -> String {
        "a.s-pagination-next".into()
    }

    // Cache defaults
    pub fn cache_ttl() -> u64 {
        3_600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.crawler.max_fetch_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_delay_range() {
        let mut config = Config::default();
        config.crawler.page_delay = DelayRange::new(5_000, 1_000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_selector() {
        let mut config = Config::default();
        config.markup.item_selector = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_overrides_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [crawler]
            timeout_secs = 5
            captcha_marker = "robotcheck"

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(parsed.crawler.timeout_secs, 5);
        assert_eq!(parsed.crawler.captcha_marker, "robotcheck");
        assert_eq!(parsed.cache.ttl_secs, 60);
        // Untouched sections fall back to defaults
        assert_eq!(parsed.crawler.max_fetch_attempts, 3);
        assert_eq!(parsed.markup.item_selector, "div.sg-col-inner");
    }
}
