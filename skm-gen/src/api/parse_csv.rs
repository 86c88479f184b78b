//! CSV pre-parse: selected rows without any generation
//!
//! `POST /api/parse-csv` (multipart: `csv`) feeds the media-only flow.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::read_upload_form;
use crate::error::ApiResult;
use crate::services::classify;
use crate::AppState;

/// One selected row as a lesson
#[derive(Debug, Serialize)]
pub struct ParsedLesson {
    pub id: String,
    /// Skill text from the CSV
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseCsvResponse {
    pub lessons: Vec<ParsedLesson>,
    pub total_count: usize,
    pub source_file: String,
}

/// POST /api/parse-csv
pub async fn parse_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ParseCsvResponse>> {
    let csv = read_upload_form(&mut multipart).await?.require_csv()?;
    let classified = classify(
        &csv.bytes,
        &csv.file_name,
        &state.settings.generation.profile_column,
    )?;

    let lessons: Vec<ParsedLesson> = classified
        .rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| ParsedLesson {
            id: row.id,
            name: row.text,
            index,
        })
        .collect();

    info!(file = %classified.source_file, lessons = lessons.len(), "CSV parsed into lessons");

    Ok(Json(ParseCsvResponse {
        total_count: lessons.len(),
        lessons,
        source_file: classified.source_file,
    }))
}

/// Build CSV pre-parse routes
pub fn parse_csv_routes() -> Router<AppState> {
    Router::new().route("/api/parse-csv", post(parse_csv))
}
