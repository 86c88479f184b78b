//! Chat-completion API client
//!
//! Thin retrying wrapper over an OpenAI-compatible `/chat/completions`
//! endpoint (OpenRouter by default). Returns the raw text of the first choice.
//!
//! Status handling:
//! - 401: fails immediately with [`CompletionError::Auth`]
//! - 429: retried with exponential backoff (`base * 2^attempt`) up to the
//!   attempt budget, then [`CompletionError::RateLimited`] with the last body
//! - any other non-2xx: fails immediately with [`CompletionError::Server`]
//! - 2xx with zero choices: [`CompletionError::EmptyResponse`]
//!
//! The client keeps no state between calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skm_common::config::CompletionConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("skills-master/", env!("CARGO_PKG_VERSION"));

/// Completion client errors
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Invalid completion API key")]
    Auth { status: u16, body: String },

    #[error("Completion API rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32, body: String },

    #[error("Completion API error {status}")]
    Server { status: u16, body: String },

    #[error("Model returned no response")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode completion response: {0}")]
    Decode(String),
}

impl CompletionError {
    /// Whether a coarser caller-level retry loop may try again
    ///
    /// Auth failures and exhausted rate-limit budgets are final: repeating
    /// the prompt cannot fix them.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CompletionError::Auth { .. } | CompletionError::RateLimited { .. }
        )
    }

    /// Upstream HTTP status, when the provider answered
    pub fn status(&self) -> Option<u16> {
        match self {
            CompletionError::Auth { status, .. } | CompletionError::Server { status, .. } => {
                Some(*status)
            }
            CompletionError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Raw upstream response body, for server-side logs
    pub fn details(&self) -> Option<&str> {
        match self {
            CompletionError::Auth { body, .. }
            | CompletionError::RateLimited { body, .. }
            | CompletionError::Server { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Completion request; unset sampling parameters use the client defaults
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text completion seam used by the generators
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Transport-level retry policy for HTTP 429
///
/// Kept separate from the generators' linear retry so an exhausted rate-limit
/// budget is reported as such instead of as a bad model answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RateLimitPolicy {
    /// Delay before retry number `attempt` (1-based): `base * 2^attempt`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Outcome of a single HTTP attempt
enum AttemptError {
    RateLimited(String),
    Fatal(CompletionError),
}

/// OpenRouter (OpenAI-compatible) chat-completion client
pub struct OpenRouterClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
    default_temperature: f32,
    default_max_tokens: u32,
    policy: RateLimitPolicy,
}

impl OpenRouterClient {
    pub fn new(api_key: String, config: &CompletionConfig) -> Result<Self, CompletionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            referer: config.referer.clone(),
            title: config.title.clone(),
            default_temperature: config.temperature,
            default_max_tokens: config.max_tokens,
            policy: RateLimitPolicy {
                max_attempts: config.max_attempts.max(1),
                backoff_base: Duration::from_millis(config.backoff_base_ms),
            },
        })
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String, AttemptError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.default_temperature),
            max_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Fatal(CompletionError::Network(e.to_string())))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => AttemptError::Fatal(CompletionError::Auth {
                    status: 401,
                    body: error_text,
                }),
                429 => AttemptError::RateLimited(error_text),
                code => AttemptError::Fatal(CompletionError::Server {
                    status: code,
                    body: error_text,
                }),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(CompletionError::Decode(e.to_string())))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AttemptError::Fatal(CompletionError::EmptyResponse))
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_rate_limit_body = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.delay_before(attempt);
                warn!(
                    model = %request.model,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Completion API rate limited, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            debug!(model = %request.model, attempt = attempt + 1, "Requesting completion");

            match self.send_once(&request).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::RateLimited(body)) => {
                    last_rate_limit_body = body;
                }
                Err(AttemptError::Fatal(e)) => {
                    warn!(
                        model = %request.model,
                        status = ?e.status(),
                        details = %skm_common::time::preview(e.details().unwrap_or(""), 500),
                        "Completion request failed: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        Err(CompletionError::RateLimited {
            attempts: max_attempts,
            body: last_rate_limit_body,
        })
    }
}
