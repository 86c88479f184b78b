//! GET /api/models: selectable completion models

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::services::catalog::{ModelOption, AVAILABLE_MODELS};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: &'static [ModelOption],
}

pub async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: AVAILABLE_MODELS,
    })
}

pub fn model_routes() -> Router<AppState> {
    Router::new().route("/api/models", get(list_models))
}
