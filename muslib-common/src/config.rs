//! Configuration loading and resolution
//!
//! Every setting is resolved in this priority order:
//! 1. Command-line argument or environment variable (both surfaced by the binary's CLI parser)
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MUSLIB_CONFIG";

/// On-disk TOML configuration
///
/// Every key is optional; absent keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub external_api: ExternalApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Song metadata provider settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExternalApiConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub external_api_timeout_secs: u64,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.local/share/muslib on Linux, ~/Library/Application Support/muslib on macOS
        let database_path = dirs::data_local_dir()
            .map(|d| d.join("muslib").join("muslib.db"))
            .unwrap_or_else(|| PathBuf::from("./muslib_data/muslib.db"));

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path,
            external_api_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub external_api_url: Option<String>,
    pub external_api_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub external_api_url: String,
    pub external_api_timeout: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML values and compiled defaults
    ///
    /// The external API URL has no default: a service that cannot enrich new
    /// songs is misconfigured.
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let external_api_url = overrides
            .external_api_url
            .or(toml.external_api.url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "external API URL not configured. Use one of:\n\
                     1. Command line: --external-api-url <URL>\n\
                     2. Environment: MUSLIB_EXTERNAL_API_URL=<URL>\n\
                     3. TOML config: [external_api] url = \"<URL>\""
                        .to_string(),
                )
            })?;

        let timeout_secs = overrides
            .external_api_timeout_secs
            .or(toml.external_api.timeout_secs)
            .unwrap_or(defaults.external_api_timeout_secs);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "external API timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            host: overrides.host.or(toml.http.host).unwrap_or(defaults.host),
            port: overrides.port.or(toml.http.port).unwrap_or(defaults.port),
            database_path: overrides
                .database
                .or(toml.database.path)
                .unwrap_or(defaults.database_path),
            external_api_url,
            external_api_timeout: Duration::from_secs(timeout_secs),
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or(defaults.log_level),
        })
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the TOML config file
///
/// Priority: explicit path → `MUSLIB_CONFIG` → platform config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("muslib").join("config.toml"))
}

/// Load TOML configuration
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but cannot be read or parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found: {} (using defaults)",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}
