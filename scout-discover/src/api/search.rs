//! Search control
//!
//! POST /api/search, POST /api/stop

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use scout_common::human_time::parse_max_age;
use scout_common::{Identity, RankBound};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{FilterOptions, GameTypeFilter, Region};
use crate::services::DiscoveryConfig;
use crate::session::{session_output_path, DiscoverySession};
use crate::AppState;

/// Count sent either as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CountField {
    Number(u64),
    Text(String),
}

impl CountField {
    fn positive(&self) -> Option<usize> {
        let n = match self {
            CountField::Number(n) => usize::try_from(*n).ok()?,
            CountField::Text(s) => s.trim().parse().ok()?,
        };
        (n > 0).then_some(n)
    }
}

/// POST /api/search request
///
/// Empty strings are treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub seed: Option<String>,
    pub region: Option<String>,
    pub game_type: Option<String>,
    pub min_rank: Option<String>,
    pub max_rank: Option<String>,
    pub max_age: Option<String>,
    pub max_time: Option<String>,
    pub max_results: Option<CountField>,
}

/// POST /api/search response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub message: String,
    pub seed: String,
    pub session_id: Uuid,
}

/// POST /api/stop response
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub message: String,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Validated search parameters
struct SearchPlan {
    seed: Identity,
    region: Region,
    filters: FilterOptions,
    max_duration: Option<Duration>,
    max_results: usize,
}

fn plan_search(request: &SearchRequest, state: &AppState) -> ApiResult<SearchPlan> {
    let seed: Identity = present(&request.seed)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Seed must be in format Name#Tag".to_string()))?;

    let region = match present(&request.region) {
        Some(r) => r.parse::<Region>()?,
        None => state.settings.default_region,
    };

    let game_type = present(&request.game_type)
        .map(GameTypeFilter::parse_or_all)
        .unwrap_or_default();

    let min_rank = present(&request.min_rank)
        .map(str::parse::<RankBound>)
        .transpose()?;
    let max_rank = present(&request.max_rank)
        .map(str::parse::<RankBound>)
        .transpose()?;

    let max_age_ms = present(&request.max_age)
        .map(|s| {
            parse_max_age(s).map_err(|_| ApiError::BadRequest("Invalid max-age format".to_string()))
        })
        .transpose()?;
    let max_duration = present(&request.max_time)
        .map(|s| {
            parse_max_age(s)
                .map(Duration::from_millis)
                .map_err(|_| ApiError::BadRequest("Invalid max-time format".to_string()))
        })
        .transpose()?;

    let max_results = request
        .max_results
        .as_ref()
        .and_then(CountField::positive)
        .unwrap_or(state.settings.default_max_results);

    Ok(SearchPlan {
        seed,
        region,
        filters: FilterOptions {
            game_type,
            min_rank,
            max_rank,
            max_age_ms,
        },
        max_duration,
        max_results,
    })
}

/// POST /api/search
///
/// Start a discovery session in the background. 400 if one is already
/// running or a field is malformed.
pub async fn start_search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(request) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid search request: {}", e.body_text())))?;

    let mut current = state.current.write().await;
    if current.as_ref().is_some_and(|s| s.is_running()) {
        return Err(ApiError::BadRequest(
            "Search already in progress".to_string(),
        ));
    }

    let plan = plan_search(&request, &state)?;
    let config = DiscoveryConfig {
        region: plan.region,
        filters: plan.filters,
        result_cap: plan.max_results,
        max_duration: plan.max_duration,
        output_path: session_output_path(&state.settings.output_dir, Utc::now()),
    };

    let session = DiscoverySession::create(
        plan.seed,
        config,
        (state.source_factory)(),
        scout_common::LogSink::with_channel(state.events.clone()),
    );
    *current = Some(session.clone());
    drop(current);

    let response = SearchResponse {
        message: "Search started".to_string(),
        seed: session.seed.to_string(),
        session_id: session.id,
    };

    tracing::info!(
        session_id = %session.id,
        seed = %session.seed,
        output = %session.output_path().display(),
        "Search session created"
    );

    tokio::spawn(async move {
        session.run().await;
    });

    Ok(Json(response))
}

/// POST /api/stop
///
/// Stop the running session, if any. Always succeeds.
pub async fn stop_search(State(state): State<AppState>) -> Json<StopResponse> {
    if let Some(session) = state.current_session().await {
        session.stop().await;
    }

    Json(StopResponse {
        message: "Search stopped".to_string(),
    })
}

/// Build search control routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", post(start_search))
        .route("/api/stop", post(stop_search))
}
