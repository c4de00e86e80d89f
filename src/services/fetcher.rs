// src/services/fetcher.rs

//! Page fetcher with anti-blocking mitigation.
//!
//! A single fetch sends a spoofed browser header set with a randomly chosen
//! user agent and classifies the response into a typed [`FetchOutcome`].
//! CAPTCHA interstitials and HTTP 503 are treated as a blocking signal: the
//! fetcher serves a long randomized cooldown itself and reports `Blocked` so
//! the caller can decide whether to spend another attempt.
//!
//! [`PageFetcher::fetch_with_retry`] wraps single fetches in a bounded
//! attempt budget with a shorter randomized delay before each retry of a
//! plain failure.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};

use crate::error::Result;
use crate::models::CrawlerConfig;
use crate::services::UserAgentPool;
use crate::utils::sleep_range;

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page fetched; carries the body and the URL after redirects.
    Success { body: String, final_url: String },

    /// The site answered with a CAPTCHA or rate-limit response.
    /// The cooldown has already been served when this is returned.
    Blocked,

    /// Network fault or non-success status.
    Failed(String),
}

impl FetchOutcome {
    /// True for the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// HTTP fetcher with header spoofing and retry policy.
pub struct PageFetcher {
    client: Client,
    agents: UserAgentPool,
    config: CrawlerConfig,
}

impl PageFetcher {
    /// Build a fetcher from crawler settings and a user-agent pool.
    pub fn new(config: CrawlerConfig, agents: UserAgentPool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            agents,
            config,
        })
    }

    /// Issue one GET and classify the response.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let Some(agent) = self.agents.pick() else {
            log::error!("User agent pool is empty; refusing to fetch {url}");
            return FetchOutcome::Failed("user agent pool is empty".to_string());
        };

        let response = match self
            .client
            .get(url)
            .header(header::USER_AGENT, agent)
            .header(header::ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(header::ACCEPT, ACCEPT)
            .header(header::REFERER, &self.config.referer)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("Request failed for URL {url}: {e}");
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let final_url = response.url().to_string();
        let status = response.status();

        // CAPTCHA interstitial or rate limit: cool down, then report back.
        if final_url.contains(&self.config.captcha_marker)
            || status == StatusCode::SERVICE_UNAVAILABLE
        {
            log::warn!("CAPTCHA or rate limit encountered at {url}. Cooling down.");
            sleep_range(&self.config.blocked_cooldown).await;
            return FetchOutcome::Blocked;
        }

        if !status.is_success() {
            log::error!("HTTP {status} for URL {url}");
            return FetchOutcome::Failed(format!("HTTP {status}"));
        }

        match response.text().await {
            Ok(body) => {
                log::info!("Fetched {url} ({} bytes)", body.len());
                FetchOutcome::Success { body, final_url }
            }
            Err(e) => {
                log::error!("Failed to read body from {url}: {e}");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch with a bounded attempt budget.
    ///
    /// `Failed` attempts wait a randomized retry delay; `Blocked` attempts
    /// re-try immediately because their cooldown was already served inside
    /// [`fetch`](Self::fetch). The first success wins. After the budget is
    /// spent the URL is abandoned with a terminal `Failed`.
    pub async fn fetch_with_retry(&self, url: &str) -> FetchOutcome {
        let max_attempts = self.config.max_fetch_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.fetch(url).await {
                outcome @ FetchOutcome::Success { .. } => return outcome,
                FetchOutcome::Blocked => {
                    log::warn!("Blocked at {url} (attempt {attempt}/{max_attempts})");
                    last_error = "blocked after cooldown".to_string();
                }
                FetchOutcome::Failed(error) => {
                    last_error = error;
                    if attempt < max_attempts {
                        log::info!(
                            "Retrying {url} ({} attempts left)",
                            max_attempts - attempt
                        );
                        sleep_range(&self.config.retry_delay).await;
                    }
                }
            }
        }

        log::error!("Max retries reached. Abandoning URL {url}");
        FetchOutcome::Failed(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CrawlerConfig {
        use crate::models::DelayRange;
        CrawlerConfig {
            retry_delay: DelayRange::zero(),
            blocked_cooldown: DelayRange::zero(),
            page_delay: DelayRange::zero(),
            ..CrawlerConfig::default()
        }
    }

    #[test]
    fn test_build_fetcher() {
        let fetcher = PageFetcher::new(test_config(), UserAgentPool::from_agents(vec!["ua".into()]));
        assert!(fetcher.is_ok());
    }

    #[tokio::test]
    async fn test_empty_pool_fails_clearly() {
        let fetcher = PageFetcher::new(test_config(), UserAgentPool::default()).unwrap();
        match fetcher.fetch("https://example.com/").await {
            FetchOutcome::Failed(message) => assert!(message.contains("user agent pool")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    // HTTP-level behavior (blocked detection, retry budget) is covered by
    // the wiremock integration tests in tests/crawl_tests.rs.
}
