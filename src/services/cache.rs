// src/services/cache.rs

//! Time-boxed per-brand run cache.
//!
//! Gates redundant crawl runs: a warm entry means the brand was scraped
//! within the TTL window and the whole run is skipped, with zero network
//! activity and zero writes. Entries are armed once, at the end of a run,
//! with the serialized record sequence that run collected.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::ProductRecord;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// In-memory memoization gate keyed by brand id.
///
/// Reads and writes are atomic per key. Two workers starting the same brand
/// simultaneously can both observe a cold cache and both crawl; that race is
/// accepted and left unguarded.
#[derive(Debug)]
pub struct RunCache {
    ttl_secs: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RunCache {
    /// Create a cache whose entries stay warm for `ttl_secs` seconds.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs: ttl_secs as i64,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached payload for a brand if it is still warm.
    ///
    /// Expired entries are dropped on access and read as a miss.
    pub fn get(&self, brand_id: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(brand_id) {
            Some(entry) if Utc::now() < entry.expires_at => {
                log::info!("Run cache hit for brand '{brand_id}'");
                Some(entry.payload.clone())
            }
            Some(_) => {
                entries.remove(brand_id);
                None
            }
            None => None,
        }
    }

    /// Arm the cache with a run's collected records.
    pub fn set(&self, brand_id: &str, records: &[ProductRecord]) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        let entry = CacheEntry {
            payload,
            expires_at: Utc::now() + Duration::seconds(self.ttl_secs),
        };
        self.entries
            .lock()
            .unwrap()
            .insert(brand_id.to_string(), entry);
        log::info!(
            "Run cache armed for brand '{brand_id}' ({} records, ttl {}s)",
            records.len(),
            self.ttl_secs
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: usize) -> Vec<ProductRecord> {
        (0..count)
            .map(|i| ProductRecord {
                name: format!("Product {i}"),
                external_id: format!("B{i:09}"),
                ..ProductRecord::default()
            })
            .collect()
    }

    #[test]
    fn test_miss_when_never_set() {
        let cache = RunCache::new(3600);
        assert!(cache.get("acme").is_none());
    }

    #[test]
    fn test_warm_within_ttl() {
        let cache = RunCache::new(3600);
        cache.set("acme", &records(3)).unwrap();

        let payload = cache.get("acme").expect("entry should be warm");
        let cached: Vec<ProductRecord> = serde_json::from_str(&payload).unwrap();
        assert_eq!(cached.len(), 3);
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = RunCache::new(0);
        cache.set("acme", &records(1)).unwrap();
        assert!(cache.get("acme").is_none());
    }

    #[test]
    fn test_entries_are_per_brand() {
        let cache = RunCache::new(3600);
        cache.set("acme", &records(2)).unwrap();
        assert!(cache.get("other").is_none());
        assert!(cache.get("acme").is_some());
    }
}
