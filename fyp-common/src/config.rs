//! Configuration loading
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! The TOML file is looked up at `FYP_CONFIG` if set, otherwise at
//! `<config dir>/fyp-portal/config.toml` (`~/.config` on Linux).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grading::GpaTable;
use crate::{Error, Result};

pub const ENV_API_BASE_URL: &str = "FYP_API_BASE_URL";
pub const ENV_SESSION_FILE: &str = "FYP_SESSION_FILE";
pub const ENV_CONFIG: &str = "FYP_CONFIG";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Poll intervals for live views, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub notifications_ms: u64,
    pub unread_count_ms: u64,
    pub chat_ms: u64,
    /// How long a new-notification popup stays up
    pub popup_dismiss_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            notifications_ms: 5000,
            unread_count_ms: 10000,
            chat_ms: 3000,
            popup_dismiss_ms: 2000,
        }
    }
}

impl PollingConfig {
    pub fn notifications(&self) -> Duration {
        Duration::from_millis(self.notifications_ms)
    }

    pub fn unread_count(&self) -> Duration {
        Duration::from_millis(self.unread_count_ms)
    }

    pub fn chat(&self) -> Duration {
        Duration::from_millis(self.chat_ms)
    }

    pub fn popup_dismiss(&self) -> Duration {
        Duration::from_millis(self.popup_dismiss_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of the TOML file; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub gpa_table: Option<GpaTable>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_base_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved portal configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// `None` keeps the session in memory only
    pub session_file: Option<PathBuf>,
    pub polling: PollingConfig,
    pub gpa_table: GpaTable,
    pub logging: LoggingConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(30_000),
            session_file: None,
            polling: PollingConfig::default(),
            gpa_table: GpaTable::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Resolve from CLI, environment, TOML file and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml = match config_file_path(cli.config_file.as_deref()) {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                TomlConfig::load(&path)?
            }
            Some(path) => {
                if cli.config_file.is_some() || std::env::var_os(ENV_CONFIG).is_some() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                TomlConfig::default()
            }
            None => TomlConfig::default(),
        };
        Self::from_layers(cli, &toml)
    }

    /// Merge the layers without touching the filesystem
    pub fn from_layers(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let defaults = PortalConfig::default();

        let api_base_url = cli
            .api_base_url
            .clone()
            .or_else(|| std::env::var(ENV_API_BASE_URL).ok())
            .or_else(|| toml.api_base_url.clone())
            .unwrap_or(defaults.api_base_url);

        let session_file = cli
            .session_file
            .clone()
            .or_else(|| std::env::var_os(ENV_SESSION_FILE).map(PathBuf::from))
            .or_else(|| toml.session_file.clone());

        let config = Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout: toml
                .request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            session_file,
            polling: toml.polling.clone(),
            gpa_table: toml.gpa_table.clone().unwrap_or(defaults.gpa_table),
            logging: toml.logging.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            )));
        }
        let polling = &self.polling;
        if [polling.notifications_ms, polling.unread_count_ms, polling.chat_ms]
            .contains(&0)
        {
            return Err(Error::Config("Polling intervals must be non-zero".to_string()));
        }
        if !self.gpa_table.is_monotonic() {
            warn!("Configured GPA table is not monotonic; better letters score fewer points");
        }
        Ok(())
    }
}

/// Where to look for the TOML file
fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

/// `<config dir>/fyp-portal/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fyp-portal").join("config.toml"))
}
