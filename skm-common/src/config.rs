//! Configuration loading and config file resolution
//!
//! The TOML file is bootstrap-only: it is read once at startup. Resolution
//! order for the file location:
//! 1. Command-line argument (highest priority)
//! 2. `SKM_CONFIG` environment variable
//! 3. `<user config dir>/skills-master/config.toml`
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SKM_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub completion: CompletionConfig,
    pub generation: GenerationConfig,
    pub speech: SpeechConfig,
    pub video: VideoConfig,
    pub media: MediaConfig,
    /// Optional API keys; environment variables take priority
    pub credentials: CredentialsConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    pub level: String,
}

/// Chat-completion API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    /// Attempts per call when rate limited (HTTP 429)
    pub max_attempts: u32,
    /// Rate-limit backoff unit; delay before attempt n is `base * 2^n`
    pub backoff_base_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub referer: String,
    pub title: String,
}

/// Skill / profile generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Attempts per skill or profile (prompt → validate cycle)
    pub max_attempts: u32,
    /// Linear backoff step; delay after attempt n is `step * n`
    pub retry_step_ms: u64,
    /// Marker recorded as the source column of selected rows
    pub profile_column: String,
    /// Language the generated curriculum is written in
    pub content_language: String,
}

/// Speech-synthesis API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    /// Longest text accepted by the standalone audio endpoint
    pub max_text_chars: usize,
}

/// Avatar-video API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub base_url: String,
    pub avatar_id: String,
    pub voice_id: String,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
}

/// Episode generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Model used for scripts when the request names none
    pub default_model: String,
}

/// API keys from the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub completion_api_key: Option<String>,
    pub speech_api_key: Option<String>,
    pub video_api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            max_attempts: 3,
            backoff_base_ms: 1000,
            temperature: 0.7,
            max_tokens: 4096,
            referer: "https://skills-master.local".to_string(),
            title: "Skills-Master".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_step_ms: 1000,
            profile_column: "A".to_string(),
            content_language: "Russian".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            voice_id: "pNInz6obpgDQGcFmaJgB".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            max_text_chars: 2000,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.heygen.com".to_string(),
            avatar_id: "Eric_public_pro2_20230608".to_string(),
            voice_id: "2d5b0e6cf361460aa96d87d995c80882".to_string(),
            poll_interval_secs: 5,
            max_poll_attempts: 60,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            default_model: "google/gemini-2.0-flash-001".to_string(),
        }
    }
}

/// Resolve the config file location
///
/// Returns `None` when neither an explicit path is given nor the per-user
/// default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    default_config_path().filter(|path| path.exists())
}

/// `<user config dir>/skills-master/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("skills-master").join("config.toml"))
}

/// Load configuration from `path`, falling back to defaults
///
/// A missing file yields the built-in defaults; a file that exists but does
/// not parse is an error.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using built-in defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}
