//! Credential resolution for skm-gen
//!
//! Provides two-tier API key resolution with ENV → TOML priority. A missing
//! key is not a startup error: the endpoint that needs it reports it.

use serde::Serialize;
use skm_common::config::TomlConfig;
use tracing::{info, warn};

pub const COMPLETION_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const SPEECH_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";
pub const VIDEO_API_KEY_ENV: &str = "HEYGEN_API_KEY";

/// Characters shown at each end of a masked key
const MASK_HEAD: usize = 10;
const MASK_TAIL: usize = 4;

/// External API needing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Credential {
    Completion,
    Speech,
    Video,
}

impl Credential {
    pub const ALL: [Credential; 3] = [Credential::Completion, Credential::Speech, Credential::Video];

    pub fn env_var(&self) -> &'static str {
        match self {
            Credential::Completion => COMPLETION_API_KEY_ENV,
            Credential::Speech => SPEECH_API_KEY_ENV,
            Credential::Video => VIDEO_API_KEY_ENV,
        }
    }

    fn toml_value<'a>(&self, config: &'a TomlConfig) -> Option<&'a String> {
        match self {
            Credential::Completion => config.credentials.completion_api_key.as_ref(),
            Credential::Speech => config.credentials.speech_api_key.as_ref(),
            Credential::Video => config.credentials.video_api_key.as_ref(),
        }
    }
}

/// Where a key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Environment,
    Toml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub value: String,
    pub source: KeySource,
}

/// Keys for all three APIs, each optional
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub completion: Option<ResolvedKey>,
    pub speech: Option<ResolvedKey>,
    pub video: Option<ResolvedKey>,
}

impl Credentials {
    pub fn resolve(config: &TomlConfig) -> Self {
        Self {
            completion: resolve_api_key(Credential::Completion, config),
            speech: resolve_api_key(Credential::Speech, config),
            video: resolve_api_key(Credential::Video, config),
        }
    }

    pub fn get(&self, credential: Credential) -> Option<&ResolvedKey> {
        match credential {
            Credential::Completion => self.completion.as_ref(),
            Credential::Speech => self.speech.as_ref(),
            Credential::Video => self.video.as_ref(),
        }
    }
}

/// Resolve one API key
///
/// **Priority:** ENV → TOML. Blank values count as absent.
pub fn resolve_api_key(credential: Credential, config: &TomlConfig) -> Option<ResolvedKey> {
    let env_key = std::env::var(credential.env_var())
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = credential.toml_value(config).filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment (highest priority).",
            credential.env_var()
        );
    }

    if let Some(key) = env_key {
        info!("{} loaded from environment variable", credential.env_var());
        return Some(ResolvedKey {
            value: key.trim().to_string(),
            source: KeySource::Environment,
        });
    }

    if let Some(key) = toml_key {
        info!("{} loaded from TOML config", credential.env_var());
        return Some(ResolvedKey {
            value: key.trim().to_string(),
            source: KeySource::Toml,
        });
    }

    warn!("{} is not configured", credential.env_var());
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Preview of a key safe for diagnostics: first 10 and last 4 characters
///
/// Keys too short to hide anything are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MASK_HEAD + MASK_TAIL {
        return "*".repeat(chars.len().max(4));
    }

    let head: String = chars[..MASK_HEAD].iter().collect();
    let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-or-v1-0123456789abcdef"), "sk-or-v1-0...cdef");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key(""), "****");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    #[serial]
    fn test_env_beats_toml() {
        let mut config = TomlConfig::default();
        config.credentials.video_api_key = Some("toml-key".to_string());

        std::env::set_var(VIDEO_API_KEY_ENV, "env-key");
        let key = resolve_api_key(Credential::Video, &config).unwrap();
        std::env::remove_var(VIDEO_API_KEY_ENV);

        assert_eq!(key.value, "env-key");
        assert_eq!(key.source, KeySource::Environment);
    }

    #[test]
    #[serial]
    fn test_blank_env_falls_back_to_toml() {
        let mut config = TomlConfig::default();
        config.credentials.speech_api_key = Some("toml-key".to_string());

        std::env::set_var(SPEECH_API_KEY_ENV, "  ");
        let key = resolve_api_key(Credential::Speech, &config).unwrap();
        std::env::remove_var(SPEECH_API_KEY_ENV);

        assert_eq!(key.value, "toml-key");
        assert_eq!(key.source, KeySource::Toml);
    }

    #[test]
    #[serial]
    fn test_absent_everywhere() {
        std::env::remove_var(COMPLETION_API_KEY_ENV);
        let config = TomlConfig::default();
        assert!(resolve_api_key(Credential::Completion, &config).is_none());
    }
}
