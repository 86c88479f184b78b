//! Media episode creation
//!
//! One request produces one episode: a narration script, then either audio
//! (synthesized in the same call) or a submitted video job that must be
//! polled. Every needed credential is checked before any network call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::avatar_video::{VideoJobStatus, VideoRendering};
use super::completion::{ChatCompletion, CompletionError};
use super::media_error::MediaError;
use super::prompts::Prompts;
use super::script_generator::ScriptGenerator;
use super::speech::{audio_data_url, SpeechSynthesis};
use crate::config::Credential;

/// Media kind of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeKind {
    Audio,
    Video,
}

impl EpisodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeKind::Audio => "audio",
            EpisodeKind::Video => "video",
        }
    }
}

impl std::str::FromStr for EpisodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(EpisodeKind::Audio),
            "video" => Ok(EpisodeKind::Video),
            other => Err(format!("type must be \"audio\" or \"video\", got \"{}\"", other)),
        }
    }
}

/// Input of one episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRequest {
    pub skill_name: String,
    pub summary: String,
    pub details: Vec<String>,
    pub kind: EpisodeKind,
    /// Script model; the configured default when absent
    pub model_id: Option<String>,
}

/// Result of episode creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CreatedEpisode {
    /// Audio is complete on return
    Audio {
        script: String,
        #[serde(rename = "audioLocator")]
        audio_locator: String,
        ready: bool,
    },
    /// Video job submitted; poll `external_job_id` for the result
    Video {
        script: String,
        #[serde(rename = "externalJobId")]
        external_job_id: String,
        ready: bool,
    },
}

impl CreatedEpisode {
    pub fn script(&self) -> &str {
        match self {
            CreatedEpisode::Audio { script, .. } | CreatedEpisode::Video { script, .. } => script,
        }
    }
}

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("{} is not configured", .0.env_var())]
    MissingCredential(Credential),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Script generation failed: {0}")]
    Script(#[from] CompletionError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Episode creation against the three external APIs
#[derive(Clone)]
pub struct MediaService {
    scripts: Option<ScriptGenerator>,
    speech: Option<Arc<dyn SpeechSynthesis>>,
    video: Option<Arc<dyn VideoRendering>>,
    default_model: String,
    max_text_chars: usize,
}

impl MediaService {
    pub fn new(
        completion: Option<Arc<dyn ChatCompletion>>,
        speech: Option<Arc<dyn SpeechSynthesis>>,
        video: Option<Arc<dyn VideoRendering>>,
        prompts: Prompts,
        default_model: impl Into<String>,
        max_text_chars: usize,
    ) -> Self {
        Self {
            scripts: completion.map(|client| ScriptGenerator::new(client, prompts)),
            speech,
            video,
            default_model: default_model.into(),
            max_text_chars,
        }
    }

    /// Create one episode
    pub async fn create_episode(
        &self,
        request: &EpisodeRequest,
    ) -> Result<CreatedEpisode, EpisodeError> {
        if request.skill_name.trim().is_empty() || request.summary.trim().is_empty() {
            return Err(EpisodeError::InvalidInput(
                "skillName and summary are required".to_string(),
            ));
        }

        let scripts = self
            .scripts
            .as_ref()
            .ok_or(EpisodeError::MissingCredential(Credential::Completion))?;

        match request.kind {
            EpisodeKind::Audio => {
                let speech = self.speech_client()?;
                let script = self.script_for(scripts, request).await?;
                let audio = speech.synthesize(&script).await?;

                info!(skill = %request.skill_name, bytes = audio.len(), "Audio episode ready");
                Ok(CreatedEpisode::Audio {
                    script,
                    audio_locator: audio_data_url(&audio),
                    ready: true,
                })
            }
            EpisodeKind::Video => {
                let video = self.video_client()?;
                let script = self.script_for(scripts, request).await?;
                let job_id = video.submit(&script).await?;

                info!(skill = %request.skill_name, job_id = %job_id, "Video episode submitted");
                Ok(CreatedEpisode::Video {
                    script,
                    external_job_id: job_id,
                    ready: false,
                })
            }
        }
    }

    /// Synthesize arbitrary text to an audio locator
    pub async fn synthesize_text(&self, text: &str) -> Result<String, EpisodeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EpisodeError::InvalidInput("text is required".to_string()));
        }
        let chars = text.chars().count();
        if chars > self.max_text_chars {
            return Err(EpisodeError::InvalidInput(format!(
                "text is too long: {} characters, at most {} allowed",
                chars, self.max_text_chars
            )));
        }

        let audio = self.speech_client()?.synthesize(text).await?;
        Ok(audio_data_url(&audio))
    }

    /// Current status of an external video job
    pub async fn video_status(&self, job_id: &str) -> Result<VideoJobStatus, EpisodeError> {
        if job_id.trim().is_empty() {
            return Err(EpisodeError::InvalidInput(
                "videoId query parameter is required".to_string(),
            ));
        }
        Ok(self.video_client()?.status(job_id).await?)
    }

    fn speech_client(&self) -> Result<&Arc<dyn SpeechSynthesis>, EpisodeError> {
        self.speech
            .as_ref()
            .ok_or(EpisodeError::MissingCredential(Credential::Speech))
    }

    fn video_client(&self) -> Result<&Arc<dyn VideoRendering>, EpisodeError> {
        self.video
            .as_ref()
            .ok_or(EpisodeError::MissingCredential(Credential::Video))
    }

    async fn script_for(
        &self,
        scripts: &ScriptGenerator,
        request: &EpisodeRequest,
    ) -> Result<String, EpisodeError> {
        let model_id = request
            .model_id
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(self.default_model.as_str());

        Ok(scripts
            .generate_script(&request.skill_name, &request.summary, &request.details, model_id)
            .await?)
    }
}
