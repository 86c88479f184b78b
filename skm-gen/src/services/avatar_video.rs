//! Avatar video rendering client (HeyGen)
//!
//! Rendering is asynchronous: `submit` returns a job id right away and the
//! finished video is discovered by polling `status`.
//!
//! # API Reference
//! - Submit: `POST {base_url}/v2/video/generate` → `data.video_id`
//! - Status: `GET {base_url}/v1/video_status.get?video_id=<id>` →
//!   `data.status`, `data.video_url`
//! - Auth: `X-Api-Key` header

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use skm_common::config::VideoConfig;
use std::time::Duration;
use tracing::{debug, warn};

use super::media_error::MediaError;

const PROVIDER: &str = "HeyGen";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Render job state reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoJobState {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Anything the provider adds later; treated as still running
    #[serde(other)]
    Unknown,
}

/// One status observation of a render job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJobStatus {
    pub state: VideoJobState,
    /// Final video locator, present once completed
    pub media_locator: Option<String>,
    /// Provider failure description, if any
    pub error: Option<String>,
}

/// Script → rendered video seam
#[async_trait]
pub trait VideoRendering: Send + Sync {
    /// Submit a render job for `script`, returning the external job id
    async fn submit(&self, script: &str) -> Result<String, MediaError>;

    /// Current status of job `job_id`
    async fn status(&self, job_id: &str) -> Result<VideoJobStatus, MediaError>;
}

#[derive(Serialize)]
struct Character<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    avatar_id: &'a str,
}

#[derive(Serialize)]
struct Voice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    input_text: &'a str,
    voice_id: &'a str,
}

#[derive(Serialize)]
struct VideoInput<'a> {
    character: Character<'a>,
    voice: Voice<'a>,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    video_inputs: Vec<VideoInput<'a>>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    error: Option<ProviderError>,
    #[serde(default)]
    data: Option<GenerateData>,
}

#[derive(Deserialize)]
struct GenerateData {
    video_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    data: StatusData,
}

#[derive(Deserialize)]
struct StatusData {
    status: VideoJobState,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

pub struct HeyGenClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    avatar_id: String,
    voice_id: String,
}

impl HeyGenClient {
    pub fn new(api_key: String, config: &VideoConfig) -> Result<Self, MediaError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            avatar_id: config.avatar_id.clone(),
            voice_id: config.voice_id.clone(),
        })
    }
}

#[async_trait]
impl VideoRendering for HeyGenClient {
    async fn submit(&self, script: &str) -> Result<String, MediaError> {
        let body = GenerateBody {
            video_inputs: vec![VideoInput {
                character: Character {
                    kind: "avatar",
                    avatar_id: &self.avatar_id,
                },
                voice: Voice {
                    kind: "text",
                    input_text: script,
                    voice_id: &self.voice_id,
                },
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/v2/video/generate", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_text, "Video submission failed");
            return Err(MediaError::from_response(PROVIDER, status.as_u16(), error_text));
        }

        let parsed: GenerateResponse = response.json().await?;

        if let Some(error) = parsed.error {
            return Err(MediaError::server(
                error
                    .message
                    .unwrap_or_else(|| format!("Unknown {} error", PROVIDER)),
            ));
        }

        let video_id = parsed
            .data
            .map(|d| d.video_id)
            .ok_or_else(|| MediaError::server(format!("{} returned no video id", PROVIDER)))?;

        debug!(job_id = %video_id, "Video job submitted");
        Ok(video_id)
    }

    async fn status(&self, job_id: &str) -> Result<VideoJobStatus, MediaError> {
        let response = self
            .http_client
            .get(format!("{}/v1/video_status.get", self.base_url))
            .query(&[("video_id", job_id)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MediaError::from_response(PROVIDER, status.as_u16(), error_text));
        }

        let parsed: StatusResponse = response.json().await?;

        Ok(VideoJobStatus {
            state: parsed.data.status,
            media_locator: parsed.data.video_url.filter(|url| !url.is_empty()),
            error: parsed.data.error.map(|e| match e {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
        })
    }
}
