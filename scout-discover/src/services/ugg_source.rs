//! u.gg-backed profile source
//!
//! Fetches public profile pages over HTTP and extracts rank, recency and
//! linked accounts with [`page_extract`](super::page_extract).
//!
//! The HTTP client is the shared session handle: built on first use, shared
//! by concurrent fetches, dropped by `shutdown()` and rebuilt on the next
//! fetch. Request starts are spaced by a `governor` rate limiter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use scout_common::Identity;
use tokio::sync::RwLock;

use super::page_extract::{parse_neighbors, parse_profile, profile_url};
use super::{ProfileSource, SourceError};
use crate::models::{Candidate, PlayerRecord, Region};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default spacing between request starts
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1500;

pub struct UggSource {
    client: RwLock<Option<reqwest::Client>>,
    /// One request start per period; `None` when spacing is disabled
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl UggSource {
    pub fn new(request_delay: Duration) -> Self {
        Self {
            client: RwLock::new(None),
            rate_limiter: Quota::with_period(request_delay).map(RateLimiter::direct),
        }
    }

    /// Shared client, built on first use
    async fn client(&self) -> Result<reqwest::Client, SourceError> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        tracing::debug!("Created HTTP session");
        *slot = Some(client.clone());
        Ok(client)
    }

    #[cfg(test)]
    async fn has_client(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Wait until the next request may start
    async fn wait_turn(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Page body, or `None` when the profile is missing or private
    async fn fetch_page(&self, url: &str) -> Result<Option<String>, SourceError> {
        let client = self.client().await?;
        self.wait_turn().await;

        tracing::debug!(url = %url, "Fetching page");
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            tracing::debug!(url = %url, status = status.as_u16(), "Profile not viewable");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(Some(body))
    }
}

impl Default for UggSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_REQUEST_DELAY_MS))
    }
}

#[async_trait]
impl ProfileSource for UggSource {
    async fn fetch_profile(
        &self,
        region: Region,
        identity: &Identity,
    ) -> Result<Option<PlayerRecord>, SourceError> {
        let url = profile_url(region, identity);
        let Some(html) = self.fetch_page(&url).await? else {
            return Ok(None);
        };
        Ok(Some(parse_profile(&html, identity, region, &url, Utc::now())))
    }

    async fn fetch_neighbors(
        &self,
        region: Region,
        identity: &Identity,
    ) -> Result<Vec<Candidate>, SourceError> {
        let url = profile_url(region, identity);
        let Some(html) = self.fetch_page(&url).await? else {
            tracing::info!(seed = %identity, "Seed profile not viewable");
            return Ok(Vec::new());
        };

        let neighbors = parse_neighbors(&html, identity, region);
        tracing::info!(seed = %identity, count = neighbors.len(), "Found unique players");
        Ok(neighbors)
    }

    async fn shutdown(&self) {
        if self.client.write().await.take().is_some() {
            tracing::debug!("Released HTTP session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_request_starts_are_spaced() {
        let source = UggSource::new(Duration::from_millis(100));
        let start = Instant::now();

        source.wait_turn().await;
        assert!(start.elapsed() < Duration::from_millis(50));

        source.wait_turn().await;
        source.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_zero_delay_never_waits() {
        let source = UggSource::new(Duration::ZERO);
        assert!(source.rate_limiter.is_none());

        let start = Instant::now();
        for _ in 0..5 {
            source.wait_turn().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_session_handle_is_lazy_and_rebuilt() {
        let source = UggSource::new(Duration::ZERO);
        assert!(!source.has_client().await);

        source.client().await.unwrap();
        assert!(source.has_client().await);

        source.shutdown().await;
        assert!(!source.has_client().await);
        source.shutdown().await;

        source.client().await.unwrap();
        assert!(source.has_client().await);
    }
}
