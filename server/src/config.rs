//! # Configuration
//!
//! Application settings loaded from a YAML file, then patched from the
//! environment.
//!
//! ## YAML Format
//!
//! ```yaml
//! server:
//!   host: "127.0.0.1"
//!   port: 3000
//!   allowed_origin: "http://localhost:8080"
//! storage:
//!   mode: remote
//!   base_url: "https://project.supabase.co/rest/v1"
//!   api_key: "..."
//!   timeout_secs: 30
//! analytics:
//!   daily_window_days: 14
//!   timezone: local
//! session:
//!   inactivity_timeout_secs: 21600
//! logging:
//!   level: info
//! ```
//!
//! Every section and field is optional. A missing file means all defaults,
//! which selects local storage under the platform data directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::domain::aggregation::DEFAULT_DAILY_WINDOW_DAYS;
use crate::backend::domain::inactivity::DEFAULT_INACTIVITY_TIMEOUT;
use crate::backend::domain::{BudgetError, CalendarTimezone};
use crate::backend::storage::remote::client::DEFAULT_TIMEOUT_SECS;

pub const CONFIG_PATH_ENV: &str = "BUDGET_TRACKER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "budget-tracker.yaml";

const PORT_ENV: &str = "BUDGET_TRACKER_PORT";
const DATA_DIR_ENV: &str = "BUDGET_TRACKER_DATA_DIR";
const REMOTE_URL_ENV: &str = "BUDGET_TRACKER_REMOTE_URL";
const REMOTE_API_KEY_ENV: &str = "BUDGET_TRACKER_REMOTE_API_KEY";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub analytics: AnalyticsConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS, i.e. where the web frontend is served from
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origin: "http://localhost:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StorageConfig {
    Local {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
    },
    Remote {
        base_url: String,
        api_key: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("budget-tracker")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub daily_window_days: usize,
    pub timezone: CalendarTimezone,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            daily_window_days: DEFAULT_DAILY_WINDOW_DAYS,
            timezone: CalendarTimezone::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub inactivity_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: DEFAULT_INACTIVITY_TIMEOUT.as_secs(),
        }
    }
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where a loaded configuration came from; logged once tracing is set up
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at the looked-up path
    Defaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(path) => write!(f, "defaults (no file at {})", path.display()),
        }
    }
}

impl AppConfig {
    /// Load from `BUDGET_TRACKER_CONFIG` (or the default path), apply
    /// environment overrides and validate. Variables are read through `lookup`.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<(Self, ConfigSource), BudgetError> {
        let path = Self::config_path(&lookup);
        let (mut config, source) = Self::from_path(path)?;
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok((config, source))
    }

    pub fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        PathBuf::from(lookup(CONFIG_PATH_ENV).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()))
    }

    /// Read `path`; a missing file yields the defaults
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource), BudgetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }
        let yaml_content = fs::read_to_string(path)
            .map_err(|e| BudgetError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok((Self::from_yaml_str(&yaml_content)?, ConfigSource::File(path.to_path_buf())))
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, BudgetError> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_content).map_err(|e| BudgetError::Config(e.to_string()))
    }

    /// Apply `BUDGET_TRACKER_*` overrides read through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), BudgetError> {
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| BudgetError::Config(format!("{} is not a valid port: '{}'", PORT_ENV, port)))?;
        }

        match (lookup(REMOTE_URL_ENV), lookup(REMOTE_API_KEY_ENV)) {
            (Some(base_url), Some(api_key)) => {
                let timeout_secs = match &self.storage {
                    StorageConfig::Remote { timeout_secs, .. } => *timeout_secs,
                    StorageConfig::Local { .. } => DEFAULT_TIMEOUT_SECS,
                };
                self.storage = StorageConfig::Remote {
                    base_url,
                    api_key,
                    timeout_secs,
                };
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(BudgetError::Config(format!(
                    "{} and {} must be set together",
                    REMOTE_URL_ENV, REMOTE_API_KEY_ENV
                )));
            }
            (None, None) => {
                if let Some(data_dir) = lookup(DATA_DIR_ENV) {
                    if let StorageConfig::Local { .. } = self.storage {
                        self.storage = StorageConfig::Local {
                            data_dir: PathBuf::from(data_dir),
                        };
                    }
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.analytics.daily_window_days == 0 {
            return Err(BudgetError::Config("analytics.daily_window_days must be at least 1".to_string()));
        }
        if self.session.inactivity_timeout_secs == 0 {
            return Err(BudgetError::Config(
                "session.inactivity_timeout_secs must be at least 1".to_string(),
            ));
        }
        if let StorageConfig::Remote {
            base_url,
            api_key,
            timeout_secs,
        } = &self.storage
        {
            if base_url.trim().is_empty() {
                return Err(BudgetError::Config("storage.base_url must not be empty".to_string()));
            }
            if api_key.trim().is_empty() {
                return Err(BudgetError::Config("storage.api_key must not be empty".to_string()));
            }
            if *timeout_secs == 0 {
                return Err(BudgetError::Config("storage.timeout_secs must be at least 1".to_string()));
            }
        }
        Ok(())
    }
}
