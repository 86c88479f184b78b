//! Error types for skm-gen HTTP handlers
//!
//! Every non-stream failure is answered with `{ "error": <message>, "code": <CODE> }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::Credential;
use crate::player::PlayerError;
use crate::services::{CsvError, EpisodeError, MediaError, MediaErrorCode};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. artifact of a run that has not completed
    #[error("{0}")]
    Conflict(String),

    /// API key absent (500), reported before any network call
    #[error("{} is not configured", .0.env_var())]
    MissingCredential(Credential),

    /// Speech or video provider failure; provider status when known
    #[error(transparent)]
    Upstream(MediaError),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::MissingCredential(credential) => {
                error!("{} is not configured", credential.env_var());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MISSING_CREDENTIAL",
                    format!("{} is not configured", credential.env_var()),
                )
            }
            ApiError::Upstream(err) => {
                warn!(
                    code = err.code.as_str(),
                    status = ?err.status,
                    details = %skm_common::time::preview(err.details.as_deref().unwrap_or(""), 500),
                    "Media provider error: {}",
                    err.message
                );
                let status = err
                    .status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.code.as_str(), err.message)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<EpisodeError> for ApiError {
    fn from(err: EpisodeError) -> Self {
        match err {
            EpisodeError::MissingCredential(credential) => ApiError::MissingCredential(credential),
            EpisodeError::InvalidInput(msg) => ApiError::BadRequest(msg),
            EpisodeError::Media(media) => ApiError::Upstream(media),
            EpisodeError::Script(completion) => {
                warn!(
                    status = ?completion.status(),
                    details = %skm_common::time::preview(completion.details().unwrap_or(""), 500),
                    "Script generation failed: {}",
                    completion
                );
                let message = format!("Script generation failed: {}", completion);
                match completion.status() {
                    Some(status) => ApiError::Upstream(MediaError {
                        message,
                        code: MediaErrorCode::from_status(status),
                        status: Some(status),
                        details: completion.details().map(str::to_string),
                    }),
                    None => ApiError::Internal(message),
                }
            }
        }
    }
}

impl From<CsvError> for ApiError {
    fn from(err: CsvError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PlayerError> for ApiError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::OutOfRange { .. } => ApiError::BadRequest(err.to_string()),
            PlayerError::Closed => ApiError::Conflict(err.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
