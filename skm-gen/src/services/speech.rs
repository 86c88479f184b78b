//! Speech synthesis client (ElevenLabs text-to-speech)
//!
//! # API Reference
//! - Endpoint: `POST {base_url}/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key` header
//! - Response: MPEG audio bytes

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use skm_common::config::SpeechConfig;
use std::time::Duration;
use tracing::{debug, warn};

use super::media_error::MediaError;

const PROVIDER: &str = "ElevenLabs";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const AUDIO_DATA_URL_PREFIX: &str = "data:audio/mpeg;base64,";

/// Text → audio seam used by the media service
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Synthesize `text`, returning MPEG audio bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, MediaError>;
}

/// Inline locator for MPEG audio: `data:audio/mpeg;base64,<...>`
pub fn audio_data_url(audio: &[u8]) -> String {
    let mut url = String::with_capacity(AUDIO_DATA_URL_PREFIX.len() + audio.len() * 4 / 3 + 4);
    url.push_str(AUDIO_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(audio, &mut url);
    url
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabsClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsClient {
    pub fn new(api_key: String, config: &SpeechConfig) -> Result<Self, MediaError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
        })
    }
}

#[async_trait]
impl SpeechSynthesis for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, MediaError> {
        debug!(chars = text.chars().count(), voice = %self.voice_id, "Synthesizing speech");

        let body = SpeechBody {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/text-to-speech/{}", self.base_url, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_text, "Speech synthesis failed");
            return Err(MediaError::from_response(PROVIDER, status.as_u16(), error_text));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
