//! Course player endpoints
//!
//! One [`EpisodePlayer`] per media kind for the single session; audio and
//! video courses are independent.
//!
//! - `POST /api/course/{kind}`: load lessons (replaces and tears down the previous player)
//! - `GET /api/course/{kind}`: player snapshot
//! - `POST /api/course/{kind}/goto/{index}`
//! - `POST /api/course/{kind}/retry/{index}`
//! - `DELETE /api/course/{kind}`: teardown

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::player::{EpisodeBackend, EpisodePlayer, Lesson, PlayerSnapshot, PollSettings};
use crate::services::EpisodeKind;
use crate::AppState;

/// POST /api/course/{kind} request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCourseRequest {
    pub lessons: Vec<Lesson>,
    #[serde(default, alias = "modelId")]
    pub model: Option<String>,
}

fn parse_kind(kind: &str) -> ApiResult<EpisodeKind> {
    kind.parse().map_err(ApiError::BadRequest)
}

async fn current_player(state: &AppState, kind: EpisodeKind) -> ApiResult<Arc<EpisodePlayer>> {
    state
        .players
        .read()
        .await
        .get(&kind)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No {} course is loaded", kind.as_str())))
}

/// POST /api/course/{kind}
///
/// Starts on the first lesson, which begins generating right away.
pub async fn start_course(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<StartCourseRequest>,
) -> ApiResult<Json<PlayerSnapshot>> {
    let kind = parse_kind(&kind)?;
    if request.lessons.is_empty() {
        return Err(ApiError::BadRequest("lessons must not be empty".to_string()));
    }

    let backend: Arc<dyn EpisodeBackend> = Arc::new(state.media.clone());
    let player = Arc::new(EpisodePlayer::new(
        kind,
        request.lessons,
        request.model,
        backend,
        PollSettings::from(&state.settings.video),
    ));

    let previous = state.players.write().await.insert(kind, Arc::clone(&player));
    if let Some(previous) = previous {
        previous.shutdown();
    }

    info!(kind = kind.as_str(), lessons = player.len(), "Course loaded");
    Ok(Json(player.go_to(0)?))
}

/// GET /api/course/{kind}
pub async fn get_course(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<PlayerSnapshot>> {
    let player = current_player(&state, parse_kind(&kind)?).await?;
    Ok(Json(player.snapshot()))
}

/// POST /api/course/{kind}/goto/{index}
pub async fn go_to(
    State(state): State<AppState>,
    Path((kind, index)): Path<(String, usize)>,
) -> ApiResult<Json<PlayerSnapshot>> {
    let player = current_player(&state, parse_kind(&kind)?).await?;
    Ok(Json(player.go_to(index)?))
}

/// POST /api/course/{kind}/retry/{index}
pub async fn retry(
    State(state): State<AppState>,
    Path((kind, index)): Path<(String, usize)>,
) -> ApiResult<Json<PlayerSnapshot>> {
    let player = current_player(&state, parse_kind(&kind)?).await?;
    Ok(Json(player.retry(index)?))
}

/// DELETE /api/course/{kind}
///
/// Idempotent: 204 whether or not a course was loaded.
pub async fn close_course(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    if let Some(player) = state.players.write().await.remove(&kind) {
        player.shutdown();
        info!(kind = kind.as_str(), "Course closed");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Build course player routes
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/course/:kind",
            get(get_course).post(start_course).delete(close_course),
        )
        .route("/api/course/:kind/goto/:index", post(go_to))
        .route("/api/course/:kind/retry/:index", post(retry))
}
