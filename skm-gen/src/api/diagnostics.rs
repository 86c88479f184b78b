//! Credential and connectivity diagnostics
//!
//! `GET /api/diagnostics[?probe=true]`
//!
//! Reports which API keys are configured (masked) and the model catalog.
//! With `probe=true`, sends a tiny completion to the first catalog model.
//! Answers 500 when any check failed.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skm_common::time::preview;
use tracing::{info, warn};

use crate::config::{mask_key, Credential, KeySource};
use crate::services::catalog::AVAILABLE_MODELS;
use crate::services::{ChatMessage, CompletionRequest};
use crate::AppState;

const PROBE_PROMPT: &str = "Say \"OK\" in one word.";
const PROBE_MAX_TOKENS: u32 = 10;
const PROBE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct DiagnosticsQuery {
    #[serde(default)]
    pub probe: bool,
}

#[derive(Debug, Serialize)]
pub struct CredentialCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<KeySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub success: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub timestamp: DateTime<Utc>,
    /// Keyed by environment variable name
    pub credentials: BTreeMap<&'static str, CredentialCheck>,
    pub available_models: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeResult>,
    pub errors: Vec<String>,
}

/// GET /api/diagnostics
pub async fn diagnostics(
    State(state): State<AppState>,
    Query(query): Query<DiagnosticsQuery>,
) -> (StatusCode, Json<DiagnosticsResponse>) {
    let mut errors = Vec::new();

    let credentials = Credential::ALL
        .iter()
        .map(|credential| {
            let key = state.credentials.get(*credential);
            let check = CredentialCheck {
                exists: key.is_some(),
                source: key.map(|k| k.source),
                preview: key.map(|k| mask_key(&k.value)),
            };
            (credential.env_var(), check)
        })
        .collect::<BTreeMap<_, _>>();

    if state.completion.is_none() {
        errors.push(format!("{} is not configured", Credential::Completion.env_var()));
    }

    let probe = match (query.probe, state.completion.as_ref(), AVAILABLE_MODELS.first()) {
        (true, Some(client), Some(model)) => {
            let request = CompletionRequest::new(model.id, vec![ChatMessage::user(PROBE_PROMPT)])
                .with_temperature(0.0)
                .with_max_tokens(PROBE_MAX_TOKENS);

            let result = match client.generate(request).await {
                Ok(text) => {
                    info!(model = model.id, "Diagnostics probe succeeded");
                    ProbeResult {
                        success: true,
                        model: model.id.to_string(),
                        response: Some(preview(&text, PROBE_PREVIEW_CHARS)),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(model = model.id, "Diagnostics probe failed: {}", e);
                    errors.push(format!("Completion API: {}", e));
                    ProbeResult {
                        success: false,
                        model: model.id.to_string(),
                        response: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            Some(result)
        }
        _ => None,
    };

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(DiagnosticsResponse {
            timestamp: Utc::now(),
            credentials,
            available_models: AVAILABLE_MODELS.iter().map(|m| m.id).collect(),
            probe,
            errors,
        }),
    )
}

/// Build diagnostics routes
pub fn diagnostics_routes() -> Router<AppState> {
    Router::new().route("/api/diagnostics", get(diagnostics))
}
