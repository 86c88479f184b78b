//! Configuration loading tests

use serial_test::serial;
use skm_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[test]
fn test_defaults_without_file() {
    let config = load_config(None).unwrap();

    assert_eq!(config.server.port, 5780);
    assert_eq!(config.completion.max_attempts, 3);
    assert_eq!(config.completion.backoff_base_ms, 1000);
    assert_eq!(config.generation.max_attempts, 3);
    assert_eq!(config.generation.retry_step_ms, 1000);
    assert_eq!(config.generation.profile_column, "A");
    assert_eq!(config.video.poll_interval_secs, 5);
    assert_eq!(config.video.max_poll_attempts, 60);
    assert_eq!(config.speech.max_text_chars, 2000);
    assert!(config.credentials.completion_api_key.is_none());
}

#[test]
fn test_missing_file_yields_defaults() {
    let config = load_config(Some(Path::new("/nonexistent/skills-master.toml"))).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn test_partial_sections_keep_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[server]
port = 9000

[video]
max_poll_attempts = 10

[credentials]
speech_api_key = "toml-speech-key"
"#
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.video.max_poll_attempts, 10);
    assert_eq!(config.video.poll_interval_secs, 5);
    assert_eq!(
        config.credentials.speech_api_key.as_deref(),
        Some("toml-speech-key")
    );
}

#[test]
fn test_unparsable_file_is_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[server\nport = ").unwrap();

    let result = load_config(Some(file.path()));
    assert!(result.is_err());
}

#[test]
fn test_unreadable_path_is_io_error() {
    // A directory exists but cannot be read as a file
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(Some(dir.path())).unwrap_err();
    assert!(matches!(err, skm_common::Error::Io(_)), "{:?}", err);
}

#[test]
fn test_roundtrip_default_config_through_toml() {
    let text = toml::to_string(&TomlConfig::default()).unwrap();
    let parsed: TomlConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.completion.base_url, TomlConfig::default().completion.base_url);
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let resolved = resolve_config_path(Some(Path::new("/from/cli.toml")));
    assert_eq!(resolved.unwrap(), Path::new("/from/cli.toml"));

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved.unwrap(), Path::new("/from/env.toml"));

    std::env::remove_var(CONFIG_ENV_VAR);
}
