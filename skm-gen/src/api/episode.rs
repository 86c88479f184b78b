//! One-shot media endpoints
//!
//! - `POST /api/episode`: script + audio, or script + submitted video job
//! - `GET /api/video/status?videoId=<id>`: status of a video job
//! - `POST /api/audio`: synthesize arbitrary text

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::{CreatedEpisode, EpisodeKind, EpisodeRequest, VideoJobState};
use crate::AppState;

/// POST /api/episode request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEpisodeRequest {
    #[serde(default)]
    pub skill_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, alias = "modelId")]
    pub model: Option<String>,
}

/// GET /api/video/status query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusQuery {
    pub video_id: Option<String>,
}

/// GET /api/video/status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusResponse {
    pub status: VideoJobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/audio request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    pub audio_locator: String,
}

/// POST /api/episode
pub async fn create_episode(
    State(state): State<AppState>,
    Json(request): Json<CreateEpisodeRequest>,
) -> ApiResult<Json<CreatedEpisode>> {
    let kind: EpisodeKind = request
        .kind
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::BadRequest)?;

    let episode = state
        .media
        .create_episode(&EpisodeRequest {
            skill_name: request.skill_name,
            summary: request.summary,
            details: request.details,
            kind,
            model_id: request.model,
        })
        .await?;

    Ok(Json(episode))
}

/// GET /api/video/status
pub async fn video_status(
    State(state): State<AppState>,
    Query(query): Query<VideoStatusQuery>,
) -> ApiResult<Json<VideoStatusResponse>> {
    let video_id = query.video_id.unwrap_or_default();
    let status = state.media.video_status(&video_id).await?;

    // Provider states outside the documented set are still rendering
    let state = match status.state {
        VideoJobState::Unknown => VideoJobState::Processing,
        state => state,
    };

    Ok(Json(VideoStatusResponse {
        status: state,
        media_locator: status.media_locator,
        error: status.error,
    }))
}

/// POST /api/audio
pub async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SynthesizeRequest>,
) -> ApiResult<Json<SynthesizeResponse>> {
    let audio_locator = state.media.synthesize_text(&request.text).await?;
    Ok(Json(SynthesizeResponse { audio_locator }))
}

/// Build one-shot media routes
pub fn episode_routes() -> Router<AppState> {
    Router::new()
        .route("/api/episode", post(create_episode))
        .route("/api/video/status", get(video_status))
        .route("/api/audio", post(synthesize))
}
