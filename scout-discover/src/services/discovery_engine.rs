//! Discovery engine
//!
//! Drives one session: expand the seed's neighbor list a single level,
//! fetch candidate profiles through [`BatchFetcher`], filter and store them.
//!
//! ```text
//! Idle ──discover()──▶ Running ──batch done──▶ Completed (timed_out flag)
//!                         │
//!                         └──stop()──▶ Stopped
//! ```
//!
//! The result cap and the deadline only gate acceptance of records; fetches
//! keep running until the batch ends. `stop()` cancels the seed expansion or
//! the batch outright, then waits for `discover` to save and release the
//! source, so there is exactly one final write.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use scout_common::human_time::format_duration_short;
use scout_common::{Identity, LogSink};
use tokio_util::sync::CancellationToken;

use super::{BatchFetcher, FilterPipeline, ProfileSource, ResultStore, INTER_CHUNK_DELAY};
use crate::error::DiscoveryError;
use crate::models::{DiscoveryState, FilterOptions, PlayerRecord, Region, SessionState};

/// Default output file for CLI sessions
pub const DEFAULT_OUTPUT: &str = "discovered_players.json";

/// Per-session settings, fixed once the engine is built
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub region: Region,
    pub filters: FilterOptions,
    /// Stop accepting records once this many are stored
    pub result_cap: usize,
    /// Stop accepting records after this long
    pub max_duration: Option<Duration>,
    pub output_path: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            region: Region::Na,
            filters: FilterOptions::default(),
            result_cap: 100,
            max_duration: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    source: Arc<dyn ProfileSource>,
    pipeline: FilterPipeline,
    store: Mutex<ResultStore>,
    session: Mutex<SessionState>,
    cancel_token: CancellationToken,
    /// Cancelled once `discover` has saved and released the source
    settled: CancellationToken,
    log: LogSink,
    inter_chunk_delay: Duration,
}

impl DiscoveryEngine {
    /// Build an engine, loading any records already in the output file
    pub fn new(config: DiscoveryConfig, source: Arc<dyn ProfileSource>, log: LogSink) -> Self {
        let store = ResultStore::open(config.output_path.clone(), log.clone());
        let session = SessionState::new(config.result_cap, config.max_duration);
        let pipeline = FilterPipeline::new(config.filters.clone());

        Self {
            config,
            source,
            pipeline,
            store: Mutex::new(store),
            session: Mutex::new(session),
            cancel_token: CancellationToken::new(),
            settled: CancellationToken::new(),
            log,
            inter_chunk_delay: INTER_CHUNK_DELAY,
        }
    }

    pub fn with_inter_chunk_delay(mut self, delay: Duration) -> Self {
        self.inter_chunk_delay = delay;
        self
    }

    /// Run a session from `seed` to completion or stop.
    ///
    /// Returns every stored record, including ones loaded from the output
    /// file. A failure to expand the seed is fatal: progress is still saved
    /// and the source released before the error is returned.
    pub async fn discover(&self, seed: &Identity) -> Result<Vec<PlayerRecord>, DiscoveryError> {
        {
            let mut session = self.session();
            if session.state != DiscoveryState::Idle {
                return Err(DiscoveryError::AlreadyStarted);
            }
            session.start();
        }

        self.log_banner(seed);
        self.store().mark_seen(seed);

        let expanded = self.expand(seed).await;

        let state = {
            let mut session = self.session();
            if session.is_running() {
                session.finish(if expanded.is_ok() {
                    DiscoveryState::Completed
                } else {
                    DiscoveryState::Stopped
                });
            }
            session.state
        };

        self.persist();
        self.source.shutdown().await;
        self.settled.cancel();

        if let Err(e) = expanded {
            self.log.error(format!("Error: {}", e));
            return Err(e);
        }

        self.log_summary(state);
        Ok(self.results())
    }

    /// One level of expansion: the seed's neighbors, fetched and filtered
    async fn expand(&self, seed: &Identity) -> Result<(), DiscoveryError> {
        self.log
            .info(format!("[Seed] Fetching match history for {}...", seed));

        let neighbors = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => {
                tracing::info!(seed = %seed, "Seed expansion cancelled");
                return Ok(());
            }
            fetched = self.source.fetch_neighbors(self.config.region, seed) => {
                fetched.map_err(|source| DiscoveryError::Source {
                    seed: seed.clone(),
                    source,
                })?
            }
        };

        if neighbors.is_empty() {
            self.log.info("  No players found in match history");
            return Ok(());
        }

        let limit = self.config.result_cap.saturating_mul(2);
        let candidates: Vec<_> = {
            let mut store = self.store();
            let mut fresh = Vec::new();
            for mut candidate in neighbors {
                if store.has_seen(&candidate.identity) {
                    continue;
                }
                store.mark_seen(&candidate.identity);
                candidate.discovered_from = Some(seed.clone());
                fresh.push(candidate);
            }
            fresh.truncate(limit);
            fresh
        };

        tracing::info!(
            seed = %seed,
            candidates = candidates.len(),
            "Expanded seed"
        );
        self.log.info(format!(
            "[Batch] Fetching {} player profiles in parallel...",
            candidates.len()
        ));

        let started = tokio::time::Instant::now();
        let fetcher = BatchFetcher::new(
            Arc::clone(&self.source),
            self.log.clone(),
            self.cancel_token.clone(),
        )
        .with_inter_chunk_delay(self.inter_chunk_delay);

        let summary = fetcher
            .fetch_all(&candidates, |player| self.accept(player))
            .await;

        if !summary.cancelled {
            self.log.info(format!(
                "[Done] Processed {} profiles in {:.1}s",
                candidates.len(),
                started.elapsed().as_secs_f64()
            ));
        }
        Ok(())
    }

    /// Batch callback: deadline, cap, filters, then store
    fn accept(&self, player: PlayerRecord) {
        if self.cancel_token.is_cancelled() {
            return;
        }

        {
            let mut session = self.session();
            if session.deadline_passed() {
                if !session.timed_out {
                    session.timed_out = true;
                    let limit = session
                        .max_duration
                        .map(|d| format_duration_short(d.as_millis() as u64))
                        .unwrap_or_default();
                    drop(session);
                    self.log
                        .info(format!("[Timeout] Search time limit reached ({})", limit));
                }
                return;
            }
        }

        let mut store = self.store();
        if store.count() >= self.config.result_cap {
            return;
        }
        if !self.pipeline.accepts(&player) {
            return;
        }

        let rank = player
            .rank
            .as_ref()
            .map_or_else(|| "Unranked".to_string(), ToString::to_string);
        let when = player
            .last_activity
            .as_ref()
            .map_or("unknown", |a| a.relative_label.as_str())
            .to_string();
        let riot_id = format!("{}#{}", player.summoner_name, player.tag);

        if store.add_player(player) {
            let count = store.count();
            drop(store);
            self.log.info(format!(
                "    ✓ [{}/{}] {} ({}) - {}",
                count, self.config.result_cap, riot_id, rank, when
            ));
        }
    }

    /// Stop a running session and cancel outstanding fetches.
    ///
    /// Returns once `discover` has saved the results and released the
    /// source. No-op unless the session is running.
    pub async fn stop(&self) {
        {
            let mut session = self.session();
            if !session.is_running() {
                return;
            }
            session.finish(DiscoveryState::Stopped);
        }

        tracing::info!("Stopping discovery session");
        self.cancel_token.cancel();
        self.settled.cancelled().await;
    }

    /// Best-effort save; failures are logged, never fatal
    fn persist(&self) {
        if let Err(e) = self.store().save() {
            self.log.error(format!(
                "Error saving results to {}: {}",
                self.config.output_path.display(),
                e
            ));
        }
    }

    fn log_banner(&self, seed: &Identity) {
        let filters = &self.config.filters;
        let bound = |b: Option<&scout_common::RankBound>| {
            b.map_or_else(|| "any".to_string(), ToString::to_string)
        };

        self.log
            .info(format!("Starting discovery from seed: {}", seed));
        self.log.info(format!(
            "Region: {}",
            self.config.region.as_str().to_uppercase()
        ));
        self.log
            .info(format!("Game type filter: {}", filters.game_type));
        self.log.info(format!(
            "Rank filter: {} - {}",
            bound(filters.min_rank.as_ref()),
            bound(filters.max_rank.as_ref())
        ));
        self.log.info(format!(
            "Max age filter: {}",
            filters
                .max_age_ms
                .map_or_else(|| "none".to_string(), format_duration_short)
        ));
        self.log.info(format!(
            "Max search time: {}",
            self.config.max_duration.map_or_else(
                || "unlimited".to_string(),
                |d| format_duration_short(d.as_millis() as u64)
            )
        ));
        self.log
            .info(format!("Max results: {}", self.config.result_cap));
    }

    fn log_summary(&self, state: DiscoveryState) {
        let (timed_out, elapsed) = {
            let session = self.session();
            (session.timed_out, session.elapsed())
        };

        let headline = match state {
            DiscoveryState::Stopped => "Discovery stopped.".to_string(),
            _ if timed_out => "Discovery complete! (stopped due to time limit)".to_string(),
            _ => "Discovery complete!".to_string(),
        };
        self.log.info(headline);
        self.log.info(format!(
            "Found {} players matching filters",
            self.result_count()
        ));
        self.log
            .info(format!("Total time: {:.1}s", elapsed.as_secs_f64()));
        self.log.info(format!(
            "Results saved to: {}",
            self.config.output_path.display()
        ));
    }

    /// Snapshot of stored records in insertion order
    pub fn results(&self) -> Vec<PlayerRecord> {
        self.store().players()
    }

    pub fn result_count(&self) -> usize {
        self.store().count()
    }

    pub fn state(&self) -> DiscoveryState {
        self.session().state
    }

    pub fn is_running(&self) -> bool {
        self.session().is_running()
    }

    pub fn timed_out(&self) -> bool {
        self.session().timed_out
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    fn store(&self) -> MutexGuard<'_, ResultStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;
    use crate::services::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Returns a fixed neighbor list; every profile resolves
    struct FixedSource {
        neighbors: Vec<&'static str>,
        fail_neighbors: bool,
        neighbor_delay: Duration,
        shutdowns: AtomicUsize,
    }

    impl FixedSource {
        fn new(neighbors: Vec<&'static str>) -> Self {
            Self {
                neighbors,
                fail_neighbors: false,
                neighbor_delay: Duration::ZERO,
                shutdowns: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProfileSource for FixedSource {
        async fn fetch_profile(
            &self,
            region: Region,
            identity: &Identity,
        ) -> Result<Option<PlayerRecord>, SourceError> {
            Ok(Some(PlayerRecord::new(identity, region)))
        }

        async fn fetch_neighbors(
            &self,
            region: Region,
            _identity: &Identity,
        ) -> Result<Vec<Candidate>, SourceError> {
            if !self.neighbor_delay.is_zero() {
                tokio::time::sleep(self.neighbor_delay).await;
            }
            if self.fail_neighbors {
                return Err(SourceError::Status(500));
            }
            Ok(self
                .neighbors
                .iter()
                .map(|n| Candidate::new(Identity::new(*n, "NA1"), region))
                .collect())
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine(dir: &TempDir, source: Arc<FixedSource>, cap: usize) -> DiscoveryEngine {
        let config = DiscoveryConfig {
            result_cap: cap,
            output_path: dir.path().join("players.json"),
            ..Default::default()
        };
        DiscoveryEngine::new(config, source, LogSink::default())
            .with_inter_chunk_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_discover_twice_is_rejected() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, Arc::new(FixedSource::new(vec!["a"])), 5);
        let seed = Identity::new("Seed", "NA1");

        engine.discover(&seed).await.unwrap();
        assert!(matches!(
            engine.discover(&seed).await,
            Err(DiscoveryError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_seed_is_never_stored() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FixedSource::new(vec!["Seed", "other"]));
        let engine = engine(&dir, source, 5);

        let results = engine.discover(&Identity::new("seed", "na1")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].summoner_name, "other");
        assert_eq!(
            results[0].discovered_from,
            Some(Identity::new("seed", "na1"))
        );
    }

    #[tokio::test]
    async fn test_truncates_candidates_to_twice_cap() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FixedSource::new(vec!["a", "b", "c", "d", "e", "f", "g"]));
        let engine = engine(&dir, source, 2);
        let log = engine.log().clone();

        engine.discover(&Identity::new("Seed", "NA1")).await.unwrap();

        let entries = log.entries_since(0);
        assert!(entries
            .iter()
            .any(|e| e.message == "[Batch] Fetching 4 player profiles in parallel..."));
    }

    #[tokio::test]
    async fn test_fatal_neighbor_error_still_saves_and_releases() {
        let dir = TempDir::new().unwrap();
        let mut source = FixedSource::new(vec![]);
        source.fail_neighbors = true;
        let source = Arc::new(source);
        let engine = engine(&dir, Arc::clone(&source), 5);

        let err = engine.discover(&Identity::new("Seed", "NA1")).await;
        assert!(matches!(err, Err(DiscoveryError::Source { .. })));
        assert_eq!(source.shutdowns.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("players.json").exists());
    }

    #[tokio::test]
    async fn test_empty_neighbor_list_completes() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, Arc::new(FixedSource::new(vec![])), 5);

        let results = engine.discover(&Identity::new("Seed", "NA1")).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(engine.state(), DiscoveryState::Completed);
        assert!(!engine.timed_out());
    }

    #[tokio::test]
    async fn test_stop_during_seed_expansion_saves_once() {
        let dir = TempDir::new().unwrap();
        let mut source = FixedSource::new(vec!["a", "b"]);
        source.neighbor_delay = Duration::from_secs(60);
        let source = Arc::new(source);
        let engine = Arc::new(engine(&dir, source.clone(), 5));

        let running = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.discover(&Identity::new("Seed", "NA1")).await })
        };
        while !engine.is_running() {
            tokio::task::yield_now().await;
        }

        tokio::time::timeout(Duration::from_secs(2), engine.stop())
            .await
            .expect("stop waited on the seed request");

        // stop returns only after the final save and release
        assert!(dir.path().join("players.json").exists());
        assert_eq!(source.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(engine.state(), DiscoveryState::Stopped);

        let results = running.await.unwrap().unwrap();
        assert!(results.is_empty());
        assert_eq!(source.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FixedSource::new(vec![]));
        let engine = engine(&dir, Arc::clone(&source), 5);

        engine.stop().await;
        assert_eq!(engine.state(), DiscoveryState::Idle);
        assert_eq!(source.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_deadline_times_out_and_accepts_nothing() {
        let dir = TempDir::new().unwrap();
        let config = DiscoveryConfig {
            result_cap: 5,
            max_duration: Some(Duration::ZERO),
            output_path: dir.path().join("players.json"),
            ..Default::default()
        };
        let engine = DiscoveryEngine::new(
            config,
            Arc::new(FixedSource::new(vec!["a", "b"])),
            LogSink::default(),
        )
        .with_inter_chunk_delay(Duration::ZERO);

        let results = engine.discover(&Identity::new("Seed", "NA1")).await.unwrap();
        assert!(results.is_empty());
        assert!(engine.timed_out());
        assert_eq!(engine.state(), DiscoveryState::Completed);

        let timeouts = engine
            .log()
            .entries_since(0)
            .into_iter()
            .filter(|e| e.message.starts_with("[Timeout]"))
            .count();
        assert_eq!(timeouts, 1);
    }
}
