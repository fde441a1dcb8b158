//! Batch profile fetcher
//!
//! Resolves candidates to profiles in fixed-width chunks. Chunks run strictly
//! one after another; fetches within a chunk run concurrently and are handed
//! to the callback in completion order.
//!
//! The callback cannot stop the batch. Only the cancellation token can: it is
//! checked before every chunk and raced against in-flight fetches and the
//! inter-chunk delay, so cancelling drops outstanding fetches immediately.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use scout_common::LogSink;
use tokio_util::sync::CancellationToken;

use super::ProfileSource;
use crate::models::{Candidate, PlayerRecord};

/// Fetches in flight at once
pub const CHUNK_WIDTH: usize = 3;

/// Pause between consecutive chunks
pub const INTER_CHUNK_DELAY: Duration = Duration::from_millis(500);

/// Tally of one `fetch_all` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Profiles handed to the callback
    pub delivered: usize,
    /// Fetches that failed or found no profile
    pub dropped: usize,
    /// Whether the run ended on cancellation
    pub cancelled: bool,
}

pub struct BatchFetcher {
    source: Arc<dyn ProfileSource>,
    log: LogSink,
    cancel_token: CancellationToken,
    inter_chunk_delay: Duration,
}

impl BatchFetcher {
    pub fn new(source: Arc<dyn ProfileSource>, log: LogSink, cancel_token: CancellationToken) -> Self {
        Self {
            source,
            log,
            cancel_token,
            inter_chunk_delay: INTER_CHUNK_DELAY,
        }
    }

    pub fn with_inter_chunk_delay(mut self, delay: Duration) -> Self {
        self.inter_chunk_delay = delay;
        self
    }

    /// Fetch every candidate, streaming merged records to `on_profile`.
    pub async fn fetch_all<F>(&self, candidates: &[Candidate], mut on_profile: F) -> BatchSummary
    where
        F: FnMut(PlayerRecord),
    {
        let mut summary = BatchSummary::default();
        let total = candidates.len();

        for (chunk_idx, chunk) in candidates.chunks(CHUNK_WIDTH).enumerate() {
            if self.cancel_token.is_cancelled() {
                tracing::info!(chunk = chunk_idx, "Batch fetch cancelled before chunk");
                summary.cancelled = true;
                return summary;
            }

            let first = chunk_idx * CHUNK_WIDTH;
            self.log.info(format!(
                "Batch fetching {} profiles ({}-{} of {})...",
                chunk.len(),
                first + 1,
                first + chunk.len(),
                total
            ));

            let mut in_flight: FuturesUnordered<_> =
                chunk.iter().map(|candidate| self.fetch_one(candidate)).collect();

            loop {
                tokio::select! {
                    biased;
                    _ = self.cancel_token.cancelled() => {
                        tracing::info!(
                            outstanding = in_flight.len(),
                            "Batch fetch cancelled with fetches in flight"
                        );
                        summary.cancelled = true;
                        return summary;
                    }
                    next = in_flight.next() => match next {
                        Some(Some(record)) => {
                            summary.delivered += 1;
                            on_profile(record);
                        }
                        Some(None) => summary.dropped += 1,
                        None => break,
                    }
                }
            }

            let is_last = first + chunk.len() >= total;
            if !is_last && !self.inter_chunk_delay.is_zero() {
                tokio::select! {
                    _ = self.cancel_token.cancelled() => {
                        summary.cancelled = true;
                        return summary;
                    }
                    _ = tokio::time::sleep(self.inter_chunk_delay) => {}
                }
            }
        }

        tracing::debug!(
            delivered = summary.delivered,
            dropped = summary.dropped,
            "Batch fetch finished"
        );
        summary
    }

    /// Resolve one candidate; failures are logged and become `None`
    async fn fetch_one(&self, candidate: &Candidate) -> Option<PlayerRecord> {
        match self
            .source
            .fetch_profile(candidate.region, &candidate.identity)
            .await
        {
            Ok(Some(profile)) => Some(profile.merge_candidate(candidate)),
            Ok(None) => {
                self.log
                    .info(format!("Profile not available: {}", candidate.identity));
                None
            }
            Err(e) => {
                self.log
                    .error(format!("Error fetching {}: {}", candidate.identity, e));
                None
            }
        }
    }
}
