//! Utility functions and helpers.

use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::models::DelayRange;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Sleep for a random duration drawn from the given range.
///
/// A zero range returns immediately, which is how tests disable the
/// politeness and backoff delays.
pub async fn sleep_range(range: &DelayRange) {
    if range.max_ms == 0 {
        return;
    }
    let ms = if range.min_ms >= range.max_ms {
        range.min_ms
    } else {
        rand::rng().random_range(range.min_ms..=range.max_ms)
    };
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
