//! Planner runtime configuration.
//!
//! # Responsibility
//! - Parse the JSON config file that selects storage locations.
//! - Build the persistence strategies and connect a `TaskStore`.
//!
//! # Invariants
//! - `database_path` present means remote mode is attempted first.
//! - `storage_key` is never blank after `validate`.

use crate::backend::SqliteBackend;
use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::persist::local::DEFAULT_STORAGE_KEY;
use crate::persist::{FileBlobStorage, LocalStrategy, PersistenceStrategy, RemoteStrategy};
use crate::store::TaskStore;
use log::warn;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read config: {err}"),
            Self::Json(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Storage and logging settings for one planner process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// SQLite file backing remote mode. Absent means local mode only.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Directory holding local blobs.
    pub data_dir: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl PlannerConfig {
    /// Local-only config rooted at `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: None,
            data_dir: data_dir.into(),
            storage_key: default_storage_key(),
            log_level: None,
            log_dir: None,
        }
    }

    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read.
    /// - `Json` for malformed JSON or unknown fields.
    /// - `Invalid` when a field value is unusable.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Trims `storage_key` and rejects empty values.
    pub fn validate(&mut self) -> ConfigResult<()> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be blank"));
        }
        self.storage_key = key.to_string();
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty"));
        }
        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid("database_path must not be empty"));
        }
        Ok(())
    }

    /// Starts file logging when `log_dir` is set. No-op otherwise.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(());
        };
        let level = self.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)
    }

    /// Connects a store: remote over `database_path` when it opens and
    /// loads, local blob storage otherwise.
    pub fn open_store(&self) -> TaskStore {
        let local: Box<dyn PersistenceStrategy> = Box::new(LocalStrategy::new(
            FileBlobStorage::new(&self.data_dir),
            self.storage_key.clone(),
        ));
        let remote = self.database_path.as_ref().and_then(|path| {
            match SqliteBackend::open(path) {
                Ok(backend) => {
                    Some(Box::new(RemoteStrategy::new(backend)) as Box<dyn PersistenceStrategy>)
                }
                Err(err) => {
                    warn!(
                        "event=config_open_store module=config status=fallback path={} error={}",
                        path.display(),
                        err
                    );
                    None
                }
            }
        });
        TaskStore::connect(remote, local)
    }
}
