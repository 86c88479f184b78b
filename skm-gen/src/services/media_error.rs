//! Errors shared by the speech and video clients

use serde::Serialize;
use thiserror::Error;

/// Client-facing failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaErrorCode {
    AuthError,
    RateLimit,
    InvalidRequest,
    ServerError,
    NetworkError,
}

impl MediaErrorCode {
    /// Category of a non-2xx provider status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => MediaErrorCode::AuthError,
            429 => MediaErrorCode::RateLimit,
            400..=499 => MediaErrorCode::InvalidRequest,
            _ => MediaErrorCode::ServerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaErrorCode::AuthError => "AUTH_ERROR",
            MediaErrorCode::RateLimit => "RATE_LIMIT",
            MediaErrorCode::InvalidRequest => "INVALID_REQUEST",
            MediaErrorCode::ServerError => "SERVER_ERROR",
            MediaErrorCode::NetworkError => "NETWORK_ERROR",
        }
    }
}

/// Speech or video provider failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct MediaError {
    pub message: String,
    pub code: MediaErrorCode,
    /// Provider HTTP status, when it answered
    pub status: Option<u16>,
    /// Raw provider body, for server-side logs
    pub details: Option<String>,
}

impl MediaError {
    /// Non-2xx answer from `provider`
    pub fn from_response(provider: &str, status: u16, body: String) -> Self {
        Self {
            message: format!("{} API error: {}", provider, status),
            code: MediaErrorCode::from_status(status),
            status: Some(status),
            details: Some(body),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: MediaErrorCode::NetworkError,
            status: None,
            details: None,
        }
    }

    /// Provider answered 2xx but reported a failure in its body
    pub fn server(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: MediaErrorCode::ServerError,
            status: None,
            details: None,
        }
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(err: reqwest::Error) -> Self {
        MediaError::network(err.to_string())
    }
}
