//! Saved result files
//!
//! GET /api/saved, GET /api/saved/:filename, DELETE /api/saved/:filename
//!
//! Only plain `.json` file names inside the output directory are served.

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// One entry of GET /api/saved
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub size: u64,
    pub player_count: usize,
}

/// DELETE /api/saved/:filename response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub filename: String,
}

/// A result file is a bare array or an object with a `players` array
fn players_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(players) => players,
        Value::Object(mut map) => match map.remove("players") {
            Some(Value::Array(players)) => players,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Reject anything but a plain `<name>.json` file name
fn checked_path(state: &AppState, filename: &str) -> ApiResult<PathBuf> {
    let valid = filename.ends_with(".json")
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\');
    if !valid {
        return Err(ApiError::BadRequest("Invalid filename".to_string()));
    }
    Ok(state.settings.output_dir.join(filename))
}

/// GET /api/saved
///
/// JSON files in the output directory, newest first.
pub async fn list_saved(State(state): State<AppState>) -> ApiResult<Json<Vec<SavedFile>>> {
    let dir = &state.settings.output_dir;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Cannot list output directory");
            return Ok(Json(Vec::new()));
        }
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".json") {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let player_count = tokio::fs::read_to_string(entry.path())
            .await
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .map_or(0, |value| players_of(value).len());
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        files.push(SavedFile {
            name,
            modified,
            size: metadata.len(),
            player_count,
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(Json(files))
}

/// GET /api/saved/:filename
pub async fn get_saved(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let path = checked_path(&state, &filename)?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        tracing::warn!(file = %filename, error = %e, "Saved file is not valid JSON");
        ApiError::Internal("Failed to load file".to_string())
    })?;

    Ok(Json(players_of(value)))
}

/// DELETE /api/saved/:filename
///
/// The file of a running session cannot be deleted (403).
pub async fn delete_saved(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let path = checked_path(&state, &filename)?;

    if let Some(session) = state.current_session().await {
        if session.is_running() && session.output_file_name().as_deref() == Some(filename.as_str()) {
            return Err(ApiError::Forbidden(
                "Cannot delete the results of a running search".to_string(),
            ));
        }
    }

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ApiError::NotFound("File not found".to_string()));
    }

    tokio::fs::remove_file(&path).await?;
    tracing::info!(file = %filename, "Deleted saved results");

    Ok(Json(DeleteResponse {
        message: "File deleted".to_string(),
        filename,
    }))
}

/// Build saved-results routes
pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .route("/api/saved", get(list_saved))
        .route("/api/saved/:filename", get(get_saved).delete(delete_saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_players_of_shapes() {
        assert_eq!(players_of(json!([1, 2, 3])).len(), 3);
        assert_eq!(players_of(json!({"players": [1]})).len(), 1);
        assert!(players_of(json!({"other": 1})).is_empty());
        assert!(players_of(json!("text")).is_empty());
    }
}
