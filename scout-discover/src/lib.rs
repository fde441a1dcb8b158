//! scout-discover library interface
//!
//! Player discovery from a single seed account: models, services, the HTTP
//! session object and router. Both binaries and the integration tests build
//! on this crate.

pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

pub use crate::error::{ApiError, ApiResult, DiscoveryError};

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use scout_common::LogEntry;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::models::Region;
use crate::services::ProfileSource;
use crate::session::DiscoverySession;

/// Default result cap for HTTP sessions
pub const DEFAULT_HTTP_MAX_RESULTS: usize = 20;

/// Builds a fresh profile source for each session
pub type SourceFactory = Arc<dyn Fn() -> Arc<dyn ProfileSource> + Send + Sync>;

/// Server-wide settings resolved at startup
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Where session result files are written and listed from
    pub output_dir: PathBuf,
    pub default_region: Region,
    pub default_max_results: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            default_region: Region::Na,
            default_max_results: DEFAULT_HTTP_MAX_RESULTS,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Most recent session, running or finished
    pub current: Arc<RwLock<Option<Arc<DiscoverySession>>>>,
    pub source_factory: SourceFactory,
    /// Log entries of every session, for SSE subscribers
    pub events: broadcast::Sender<LogEntry>,
    pub settings: ServerSettings,
    /// Cancelled when the server starts shutting down; ends SSE streams
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(settings: ServerSettings, source_factory: SourceFactory) -> Self {
        let (events, _) = broadcast::channel(scout_common::log_sink::DEFAULT_CAPACITY);
        Self {
            current: Arc::new(RwLock::new(None)),
            source_factory,
            events,
            settings,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        }
    }

    pub async fn current_session(&self) -> Option<Arc<DiscoverySession>> {
        self.current.read().await.clone()
    }

    /// Close live streams and stop a running search, saving its results
    pub async fn begin_shutdown(&self) {
        self.shutdown.cancel();
        if let Some(session) = self.current_session().await {
            session.stop().await;
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::search_routes())
        .merge(api::results_routes())
        .merge(api::saved_routes())
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        // Browser clients may be served from another origin
        .layer(CorsLayer::permissive())
}
