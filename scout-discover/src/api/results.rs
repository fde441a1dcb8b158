//! Session progress (read-only)
//!
//! GET /api/results, GET /api/logs, GET /api/status, GET /api/config

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use scout_common::{LogEntry, Tier};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DiscoveryState, GameTypeFilter, PlayerRecord, Region};
use crate::AppState;

/// GET /api/logs query
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Offset of the first entry to return; unparsable means 0
    pub since: Option<String>,
}

/// GET /api/status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_searching: bool,
    pub results_count: usize,
    pub log_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DiscoveryState>,
    pub timed_out: bool,
}

/// GET /api/config response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub ranks: Vec<&'static str>,
    pub game_types: Vec<&'static str>,
    pub regions: Vec<&'static str>,
}

/// GET /api/results
///
/// Records stored so far by the current (or last) session.
pub async fn get_results(State(state): State<AppState>) -> Json<Vec<PlayerRecord>> {
    let results = state
        .current_session()
        .await
        .map(|s| s.results())
        .unwrap_or_default();
    Json(results)
}

/// GET /api/logs?since=N
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<LogEntry>> {
    let since = query
        .since
        .as_deref()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let entries = state
        .current_session()
        .await
        .map(|s| s.log().entries_since(since))
        .unwrap_or_default();
    Json(entries)
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let response = match state.current_session().await {
        Some(session) => StatusResponse {
            is_searching: session.is_running(),
            results_count: session.result_count(),
            log_count: session.log().len(),
            session_id: Some(session.id),
            state: Some(session.state()),
            timed_out: session.timed_out(),
        },
        None => StatusResponse {
            is_searching: false,
            results_count: 0,
            log_count: 0,
            session_id: None,
            state: None,
            timed_out: false,
        },
    };
    Json(response)
}

/// GET /api/config
///
/// Choices accepted by POST /api/search.
pub async fn get_config() -> Json<ConfigResponse> {
    Json(ConfigResponse {
        ranks: Tier::ALL.iter().map(|t| t.as_str()).collect(),
        game_types: GameTypeFilter::ALL.iter().map(|g| g.as_str()).collect(),
        regions: Region::ALL.iter().map(|r| r.as_str()).collect(),
    })
}

/// Build session progress routes
pub fn results_routes() -> Router<AppState> {
    Router::new()
        .route("/api/results", get(get_results))
        .route("/api/logs", get(get_logs))
        .route("/api/status", get(get_status))
        .route("/api/config", get(get_config))
}
