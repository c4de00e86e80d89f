// src/services/agents.rs

//! User-agent pool.
//!
//! Loads a list of browser user-agent strings from a local file and hands
//! one out at random per request. A missing or empty file degrades to an
//! empty pool rather than aborting the process; the fetcher turns an empty
//! pool into an explicit failure instead of sending a blank header.

use std::fs;
use std::path::Path;

use rand::Rng;

/// Pool of user-agent strings for request header rotation.
#[derive(Debug, Clone, Default)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Load the pool from a newline-separated file, skipping blank lines.
    ///
    /// Fails soft: an unreadable file yields an empty pool with a warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                let agents: Vec<String> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from)
                    .collect();
                if agents.is_empty() {
                    log::warn!("User agent file {path:?} contains no entries");
                } else {
                    log::info!("Loaded {} user agents from {path:?}", agents.len());
                }
                Self { agents }
            }
            Err(e) => {
                log::warn!("User agent file {path:?} not readable: {e}. Pool is empty.");
                Self::default()
            }
        }
    }

    /// Build a pool from an explicit list.
    pub fn from_agents(agents: Vec<String>) -> Self {
        Self { agents }
    }

    /// Number of agents in the pool.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when no agents are loaded.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Pick one agent uniformly at random, or `None` if the pool is empty.
    pub fn pick(&self) -> Option<&str> {
        if self.agents.is_empty() {
            return None;
        }
        let i = rand::rng().random_range(0..self.agents.len());
        Some(&self.agents[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Mozilla/5.0 (X11; Linux x86_64)").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "  Mozilla/5.0 (Windows NT 10.0)  ").unwrap();

        let pool = UserAgentPool::load(file.path());
        assert_eq!(pool.len(), 2);
        assert!(pool.pick().unwrap().starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let pool = UserAgentPool::load("/nonexistent/user-agents.txt");
        assert!(pool.is_empty());
        assert_eq!(pool.pick(), None);
    }

    #[test]
    fn test_pick_covers_all_entries() {
        let pool = UserAgentPool::from_agents(vec!["a".into(), "b".into()]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pool.pick().unwrap().to_string());
        }
        assert_eq!(seen.len(), 2);
    }
}
