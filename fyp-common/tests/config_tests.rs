//! Configuration resolution tests
//!
//! Tests that manipulate FYP_* environment variables are marked with #[serial]
//! so they run sequentially, not in parallel.

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use fyp_common::config::{
    CliOverrides, PortalConfig, TomlConfig, DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_CONFIG,
    ENV_SESSION_FILE,
};
use fyp_common::grading::LetterGrade;
use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

fn clear_env() {
    env::remove_var(ENV_API_BASE_URL);
    env::remove_var(ENV_SESSION_FILE);
    env::remove_var(ENV_CONFIG);
}

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();
    let config = PortalConfig::from_layers(&CliOverrides::default(), &TomlConfig::default()).unwrap();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert!(config.session_file.is_none());
    assert_eq!(config.polling.notifications(), Duration::from_secs(5));
    assert_eq!(config.polling.unread_count(), Duration::from_secs(10));
    assert_eq!(config.polling.chat(), Duration::from_secs(3));
    assert_eq!(config.polling.popup_dismiss(), Duration::from_secs(2));
    assert_eq!(config.gpa_table.points(LetterGrade::AMinus), 3.7);
    assert_eq!(config.logging.level, "info");
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();
    let toml = TomlConfig::parse(
        r#"
        api_base_url = "http://toml-host:9000/api/"
        session_file = "/tmp/fyp-session.json"
        "#,
    )
    .unwrap();
    let config = PortalConfig::from_layers(&CliOverrides::default(), &toml).unwrap();

    // Trailing slash is normalised away
    assert_eq!(config.api_base_url, "http://toml-host:9000/api");
    assert_eq!(config.session_file, Some(PathBuf::from("/tmp/fyp-session.json")));
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_API_BASE_URL, "http://env-host/api");
    env::set_var(ENV_SESSION_FILE, "/tmp/env-session.json");

    let toml = TomlConfig::parse(r#"api_base_url = "http://toml-host/api""#).unwrap();
    let config = PortalConfig::from_layers(&CliOverrides::default(), &toml).unwrap();

    assert_eq!(config.api_base_url, "http://env-host/api");
    assert_eq!(config.session_file, Some(PathBuf::from("/tmp/env-session.json")));
    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var(ENV_API_BASE_URL, "http://env-host/api");

    let cli = CliOverrides {
        api_base_url: Some("https://cli-host/api".to_string()),
        ..Default::default()
    };
    let config = PortalConfig::from_layers(&cli, &TomlConfig::default()).unwrap();

    assert_eq!(config.api_base_url, "https://cli-host/api");
    clear_env();
}

#[test]
#[serial]
fn test_resolve_reads_file_from_cli_path() {
    clear_env();
    let file = write_toml(
        r#"
        request_timeout_ms = 1500
        [polling]
        notifications_ms = 250
        "#,
    );
    let cli = CliOverrides {
        config_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let config = PortalConfig::resolve(&cli).unwrap();

    assert_eq!(config.request_timeout, Duration::from_millis(1500));
    assert_eq!(config.polling.notifications_ms, 250);
    assert_eq!(config.polling.chat_ms, 3000);
}

#[test]
#[serial]
fn test_resolve_reads_file_from_env_path() {
    clear_env();
    let file = write_toml(r#"api_base_url = "http://from-env-file/api""#);
    env::set_var(ENV_CONFIG, file.path());

    let config = PortalConfig::resolve(&CliOverrides::default()).unwrap();
    assert_eq!(config.api_base_url, "http://from-env-file/api");
    clear_env();
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let cli = CliOverrides {
        config_file: Some(dir.path().join("absent.toml")),
        ..Default::default()
    };
    assert!(PortalConfig::resolve(&cli).is_err());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    clear_env();
    let file = write_toml("api_base_url = [");
    let cli = CliOverrides {
        config_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(PortalConfig::resolve(&cli).is_err());
}
