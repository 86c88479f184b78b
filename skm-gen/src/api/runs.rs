//! Curriculum run inspection
//!
//! - `GET /api/runs/{id}`: run snapshot, partial skills included while generating
//! - `GET /api/runs/{id}/artifact`: completed result as a JSON download

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::runs::CurriculumRun;
use crate::AppState;

async fn find_run(state: &AppState, run_id: Uuid) -> ApiResult<CurriculumRun> {
    state
        .runs
        .get(run_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Run not found: {}", run_id)))
}

/// GET /api/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<CurriculumRun>> {
    Ok(Json(find_run(&state, run_id).await?))
}

/// GET /api/runs/{id}/artifact
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Response> {
    let run = find_run(&state, run_id).await?;
    let result = run.result.ok_or_else(|| {
        ApiError::Conflict(format!("Run {} has not completed", run_id))
    })?;

    let body = result
        .to_artifact_json()
        .map_err(|e| ApiError::Internal(format!("Failed to serialize artifact: {}", e)))?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        result.artifact_file_name()
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid artifact file name: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Build run inspection routes
pub fn run_routes() -> Router<AppState> {
    Router::new()
        .route("/api/runs/:id", get(get_run))
        .route("/api/runs/:id/artifact", get(download_artifact))
}
