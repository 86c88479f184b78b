//! skm-gen library interface
//!
//! Exposes the application state and router for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod player;
pub mod runs;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::{DateTime, Utc};
use skm_common::config::TomlConfig;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::{Credential, Credentials};
use crate::player::EpisodePlayer;
use crate::runs::RunRegistry;
use crate::services::{
    ChatCompletion, CurriculumOrchestrator, ElevenLabsClient, EpisodeKind, HeyGenClient,
    LinearRetry, MediaService, OpenRouterClient, ProfileBuilder, Prompts, SkillGenerator,
    SpeechSynthesis, VideoRendering,
};

/// External API clients; `None` where the key is not configured
#[derive(Clone, Default)]
pub struct Clients {
    pub completion: Option<Arc<dyn ChatCompletion>>,
    pub speech: Option<Arc<dyn SpeechSynthesis>>,
    pub video: Option<Arc<dyn VideoRendering>>,
}

impl Clients {
    /// Build a client for every configured key
    pub fn from_credentials(config: &TomlConfig, credentials: &Credentials) -> anyhow::Result<Self> {
        let completion = match credentials.get(Credential::Completion) {
            Some(key) => Some(Arc::new(OpenRouterClient::new(key.value.clone(), &config.completion)?)
                as Arc<dyn ChatCompletion>),
            None => None,
        };
        let speech = match credentials.get(Credential::Speech) {
            Some(key) => Some(Arc::new(ElevenLabsClient::new(key.value.clone(), &config.speech)?)
                as Arc<dyn SpeechSynthesis>),
            None => None,
        };
        let video = match credentials.get(Credential::Video) {
            Some(key) => Some(
                Arc::new(HeyGenClient::new(key.value.clone(), &config.video)?) as Arc<dyn VideoRendering>
            ),
            None => None,
        };

        Ok(Self {
            completion,
            speech,
            video,
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Bootstrap configuration
    pub settings: Arc<TomlConfig>,
    /// Resolved API keys (diagnostics only; clients hold their own copy)
    pub credentials: Arc<Credentials>,
    /// Completion client, for the diagnostics probe
    pub completion: Option<Arc<dyn ChatCompletion>>,
    /// `None` when the completion key is absent
    pub curriculum: Option<CurriculumOrchestrator>,
    pub media: MediaService,
    pub runs: RunRegistry,
    /// One course player per media kind
    pub players: Arc<RwLock<HashMap<EpisodeKind, Arc<EpisodePlayer>>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(settings: TomlConfig, credentials: Credentials, clients: Clients) -> Self {
        let prompts = Prompts::new(settings.generation.content_language.clone());
        let retry = LinearRetry::new(
            settings.generation.max_attempts,
            Duration::from_millis(settings.generation.retry_step_ms),
        );
        let runs = RunRegistry::new();

        let curriculum = clients.completion.clone().map(|client| {
            CurriculumOrchestrator::new(
                SkillGenerator::new(Arc::clone(&client), prompts.clone(), retry),
                ProfileBuilder::new(client, prompts.clone(), retry),
                runs.clone(),
            )
        });

        let media = MediaService::new(
            clients.completion.clone(),
            clients.speech,
            clients.video,
            prompts,
            settings.media.default_model.clone(),
            settings.speech.max_text_chars,
        );

        Self {
            settings: Arc::new(settings),
            credentials: Arc::new(credentials),
            completion: clients.completion,
            curriculum,
            media,
            runs,
            players: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
        }
    }

    /// Resolve keys and build real API clients
    pub fn from_config(settings: TomlConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::resolve(&settings);
        let clients = Clients::from_credentials(&settings, &credentials)?;
        Ok(Self::new(settings, credentials, clients))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::model_routes())
        .merge(api::diagnostics_routes())
        .merge(api::generate_routes())
        .merge(api::parse_csv_routes())
        .merge(api::episode_routes())
        .merge(api::course_routes())
        .merge(api::run_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
