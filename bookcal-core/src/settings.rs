//! Settings at ~/.config/bookcal/config.toml, overridable with `BOOKCAL_*`
//! environment variables (`BOOKCAL_SYNC__TIMEOUT_SECS=30`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::lifecycle::{CreateFailurePolicy, LifecycleSettings};

static DEFAULT_DATA_DIR: &str = "~/.local/share/bookcal";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Which provider binary to run, and the parameters passed to it with
/// every request (e.g. `google_account`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

fn default_provider() -> String {
    "google".to_string()
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            provider: default_provider(),
            params: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub create_failure: CreateFailurePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            timeout_secs: 10,
            max_attempts: 3,
            retry_backoff_ms: 200,
            create_failure: CreateFailurePolicy::Compensate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join("bookcal");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads `path` if it exists, then applies the environment.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::build(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("BOOKCAL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn build(path: &Path, environment: Environment) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_path().join("store.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sync.timeout_secs)
    }

    pub fn lifecycle(&self) -> LifecycleSettings {
        LifecycleSettings {
            create_failure: self.sync.create_failure,
            max_sync_attempts: self.sync.max_attempts,
            retry_backoff: Duration::from_millis(self.sync.retry_backoff_ms),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: default_data_dir(),
            remote: RemoteSettings::default(),
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
