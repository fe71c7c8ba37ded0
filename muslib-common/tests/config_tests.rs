//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests that manipulate MUSLIB_CONFIG are marked with #[serial] so they run
//! sequentially, not in parallel.

use muslib_common::config::{
    load_toml_config, resolve_config_path, CompiledDefaults, ConfigOverrides, ServiceConfig,
    TomlConfig, CONFIG_ENV_VAR,
};
use muslib_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn toml_with_url(url: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.external_api.url = Some(url.to_string());
    config
}

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(defaults.host, "0.0.0.0");
    assert_eq!(defaults.port, 8080);
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.external_api_timeout_secs, 10);
    assert!(defaults.database_path.ends_with("muslib.db"));
}

#[test]
fn test_resolve_uses_defaults_when_only_url_given() {
    let config = ServiceConfig::resolve(
        ConfigOverrides::default(),
        toml_with_url("http://localhost:9000/info"),
    )
    .unwrap();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.external_api_url, "http://localhost:9000/info");
    assert_eq!(config.external_api_timeout, Duration::from_secs(10));
    assert_eq!(config.log_level, "info");
    assert_eq!(config.bind_addr(), "0.0.0.0:8080");
}

#[test]
fn test_overrides_win_over_toml() {
    let mut toml = toml_with_url("http://toml.example/info");
    toml.http.port = Some(7000);
    toml.http.host = Some("127.0.0.1".to_string());
    toml.logging.level = Some("debug".to_string());

    let overrides = ConfigOverrides {
        port: Some(9999),
        external_api_url: Some("http://cli.example/info".to_string()),
        ..Default::default()
    };

    let config = ServiceConfig::resolve(overrides, toml).unwrap();

    assert_eq!(config.port, 9999);
    assert_eq!(config.external_api_url, "http://cli.example/info");
    // Not overridden: TOML value survives
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_missing_external_api_url_is_config_error() {
    let result = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));

    let blank = ServiceConfig::resolve(ConfigOverrides::default(), toml_with_url("   "));
    assert!(matches!(blank, Err(Error::Config(_))));
}

#[test]
fn test_zero_timeout_rejected() {
    let overrides = ConfigOverrides {
        external_api_timeout_secs: Some(0),
        ..Default::default()
    };
    let result = ServiceConfig::resolve(overrides, toml_with_url("http://x/info"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_missing_toml_returns_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_load_toml_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[http]
port = 8181

[database]
path = "/tmp/songs.db"

[external_api]
url = "http://metadata.local/info"
timeout_secs = 3

[logging]
level = "warn"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();

    assert_eq!(config.http.port, Some(8181));
    assert_eq!(config.http.host, None);
    assert_eq!(config.database.path, Some(PathBuf::from("/tmp/songs.db")));
    assert_eq!(config.external_api.url.as_deref(), Some("http://metadata.local/info"));
    assert_eq!(config.external_api.timeout_secs, Some(3));
    assert_eq!(config.logging.level.as_deref(), Some("warn"));
}

#[test]
fn test_load_invalid_toml_is_config_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[http\nport = ").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_config_path_cli_arg_wins() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let path = resolve_config_path(Some(Path::new("/from/cli.toml")));
    assert_eq!(path, Some(PathBuf::from("/from/cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_config_path_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");

    let path = resolve_config_path(None);
    assert_eq!(path, Some(PathBuf::from("/from/env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_config_path_platform_default() {
    env::remove_var(CONFIG_ENV_VAR);

    if let Some(path) = resolve_config_path(None) {
        assert!(path.ends_with("muslib/config.toml"));
    }
}

#[test]
#[serial]
fn test_env_named_config_that_does_not_exist_loads_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("muslib").join("config.toml");
    env::set_var(CONFIG_ENV_VAR, &missing);

    let path = resolve_config_path(None).expect("path from env");
    let config = load_toml_config(&path);

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(config.unwrap(), TomlConfig::default());
}
