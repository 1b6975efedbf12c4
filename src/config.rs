//! Configuration module
//!
//! Reads `config.toml` from `$ENERGYFLOW_CONFIG` or the platform config
//! directory (`~/.config/energyflow/config.toml` on Linux). Every field has
//! a default, so an empty or partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Jitter;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "ENERGYFLOW_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub assistant: AssistantConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Where the session record lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: StorageBackend,
    /// Directory for the file backend; platform data dir when unset
    pub storage_dir: Option<PathBuf>,
    /// Key of the persisted session record
    pub storage_key: String,
    /// Simulated sign-in latency
    pub login_latency_ms: u64,
}

impl SessionConfig {
    pub fn login_latency(&self) -> Duration {
        Duration::from_millis(self.login_latency_ms)
    }

    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_data_dir)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::File,
            storage_dir: None,
            storage_key: "user".to_string(),
            login_latency_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub interval_ms: u64,
    /// Full-range random-walk magnitudes; each tick moves by ±half
    pub jitter: Jitter,
}

impl TelemetryConfig {
    pub fn interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            jitter: Jitter::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub reply_delay_ms: u64,
    pub ml_run_ms: u64,
}

impl AssistantConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn ml_run(&self) -> Duration {
        Duration::from_millis(self.ml_run_ms)
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1000,
            ml_run_ms: 10_000,
        }
    }
}

/// `~/.config/energyflow/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("energyflow")
        .join("config.toml")
}

/// Config path from `$ENERGYFLOW_CONFIG`, falling back to [`default_config_path`].
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

pub fn default_data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("energyflow")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.session.storage_key, "user");
        assert_eq!(cfg.telemetry.interval(), Duration::from_secs(3));
        assert_eq!(cfg.telemetry.jitter.solar, 20.0);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [session]
            storage = "memory"
            login_latency_ms = 0

            [telemetry]
            interval_ms = 500

            [telemetry.jitter]
            wind = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.session.storage, StorageBackend::Memory);
        assert_eq!(cfg.session.login_latency(), Duration::ZERO);
        assert_eq!(cfg.session.storage_key, "user");
        assert_eq!(cfg.telemetry.interval_ms, 500);
        assert_eq!(cfg.telemetry.jitter.wind, 4.0);
        assert_eq!(cfg.telemetry.jitter.load, 15.0);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = TelemetryConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(cfg.interval(), Duration::from_millis(1));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session\nstorage=").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
