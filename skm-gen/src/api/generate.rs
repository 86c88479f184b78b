//! Streamed curriculum generation
//!
//! `POST /api/generate` (multipart: `csv`, `model`, `profileName`)
//!
//! All input validation happens before the stream starts and is answered
//! with a JSON error body. Once streaming, failures arrive as a terminal
//! `error` event instead. The run id is returned in the `x-run-id` header.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use skm_common::stream::{ndjson_response, sse_response};
use tracing::info;
use uuid::Uuid;

use super::read_upload_form;
use crate::config::Credential;
use crate::error::{ApiError, ApiResult};
use crate::services::{classify, CurriculumRequest};
use crate::AppState;

/// Response header carrying the run id
pub const RUN_ID_HEADER: HeaderName = HeaderName::from_static("x-run-id");

/// True when the client asked for Server-Sent Events
fn wants_sse(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/event-stream"))
}

/// POST /api/generate
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut form = read_upload_form(&mut multipart).await?;

    let csv = form.require_csv()?;
    let model_id = form
        .text("model")
        .ok_or_else(|| ApiError::BadRequest("Model is required".to_string()))?;
    let profile_name = form
        .text("profileName")
        .ok_or_else(|| ApiError::BadRequest("Profile name is required".to_string()))?;

    let orchestrator = state
        .curriculum
        .clone()
        .ok_or(ApiError::MissingCredential(Credential::Completion))?;

    let profile_id = state.settings.generation.profile_column.clone();
    let classified = classify(&csv.bytes, &csv.file_name, &profile_id)?;

    let run_id = Uuid::new_v4();
    info!(
        run_id = %run_id,
        file = %classified.source_file,
        total_rows = classified.total_rows,
        selected_rows = classified.selected_rows,
        model = %model_id,
        "Curriculum generation requested"
    );

    let events = orchestrator.start(CurriculumRequest {
        run_id,
        rows: classified.rows,
        source_file: classified.source_file,
        profile_id,
        profile_name,
        model_id,
    })
    .await;

    let mut response = if wants_sse(&headers) {
        sse_response(events).into_response()
    } else {
        ndjson_response(events)
    };

    if let Ok(value) = HeaderValue::from_str(&run_id.to_string()) {
        response.headers_mut().insert(RUN_ID_HEADER, value);
    }
    Ok(response)
}

/// Build generation routes
pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/api/generate", post(generate))
}
