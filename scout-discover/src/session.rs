//! HTTP discovery session
//!
//! One search started through the HTTP surface. Handlers share it by
//! reference through [`AppState`](crate::AppState); it owns the engine, the
//! session log and the running flag.
//!
//! Lifecycle: `create → run → terminate`. `run` drives the engine to
//! completion in a background task; `stop` terminates early. Either way the
//! running flag ends up false and the process keeps serving.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scout_common::{Identity, LogSink};
use uuid::Uuid;

use crate::models::{DiscoveryState, PlayerRecord};
use crate::services::{DiscoveryConfig, DiscoveryEngine, ProfileSource};

pub struct DiscoverySession {
    pub id: Uuid,
    pub seed: Identity,
    pub started_at: DateTime<Utc>,
    engine: DiscoveryEngine,
    log: LogSink,
    running: AtomicBool,
}

impl DiscoverySession {
    /// Create a session; it is considered running from this point on
    pub fn create(
        seed: Identity,
        config: DiscoveryConfig,
        source: Arc<dyn ProfileSource>,
        log: LogSink,
    ) -> Arc<Self> {
        let engine = DiscoveryEngine::new(config, source, log.clone());
        Arc::new(Self {
            id: Uuid::new_v4(),
            seed,
            started_at: Utc::now(),
            engine,
            log,
            running: AtomicBool::new(true),
        })
    }

    /// Drive the engine to the end of the session.
    ///
    /// A fatal engine error is recorded in the session log, not propagated.
    pub async fn run(&self) {
        if !self.is_running() {
            return;
        }
        tracing::info!(session_id = %self.id, seed = %self.seed, "Discovery session started");

        match self.engine.discover(&self.seed).await {
            Ok(players) => {
                tracing::info!(
                    session_id = %self.id,
                    count = players.len(),
                    "Discovery session finished"
                );
            }
            Err(e) => {
                self.log.error(format!("Fatal error: {}", e));
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    /// Terminate early; no-op once the session has ended
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.engine.stop().await;
        self.log.info("Search stopped by user");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> DiscoveryState {
        self.engine.state()
    }

    pub fn timed_out(&self) -> bool {
        self.engine.timed_out()
    }

    pub fn results(&self) -> Vec<PlayerRecord> {
        self.engine.results()
    }

    pub fn result_count(&self) -> usize {
        self.engine.result_count()
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn output_path(&self) -> &Path {
        &self.engine.config().output_path
    }

    /// Output file name, as listed by the saved-results endpoints
    pub fn output_file_name(&self) -> Option<String> {
        self.output_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// `search_results_<epoch-ms>.json` inside `dir`
pub fn session_output_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!("search_results_{}.json", now.timestamp_millis()))
}
