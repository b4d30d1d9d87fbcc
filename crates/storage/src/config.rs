use std::path::PathBuf;

use thiserror::Error;

use crate::repository::{Storage, StorageError};
use crate::sqlite::SqliteInitError;

/// Which storage adapter to run against, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Volatile store; data lives for the process only.
    InMemory,
    /// Single JSON document on disk.
    JsonFile(PathBuf),
    /// SQLite database addressed by URL (e.g. `sqlite:tracker.sqlite3`).
    Sqlite(String),
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite("sqlite:tracker.sqlite3".into())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unknown TRACKER_STORAGE backend: {0} (expected memory, json, or sqlite)")]
    UnknownBackend(String),
}

/// Errors raised while opening the configured backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageSetupError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StorageConfig {
    /// Read the backend selection from the environment.
    ///
    /// `TRACKER_STORAGE` picks the adapter (`memory`, `json`, `sqlite`;
    /// default `sqlite`); `TRACKER_DATA_FILE` and `TRACKER_DB_URL` supply
    /// the location for the file-backed adapters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownBackend` for an unrecognized
    /// `TRACKER_STORAGE` value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = std::env::var("TRACKER_STORAGE").unwrap_or_else(|_| "sqlite".into());
        match backend.as_str() {
            "memory" => Ok(Self::InMemory),
            "json" => {
                let path = std::env::var("TRACKER_DATA_FILE")
                    .unwrap_or_else(|_| "tracker.json".into());
                Ok(Self::JsonFile(path.into()))
            }
            "sqlite" => {
                let url = std::env::var("TRACKER_DB_URL")
                    .unwrap_or_else(|_| "sqlite:tracker.sqlite3".into());
                Ok(Self::Sqlite(url))
            }
            other => Err(ConfigError::UnknownBackend(other.to_owned())),
        }
    }
}

impl Storage {
    /// Open the adapter named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StorageSetupError` if the backend cannot be opened or
    /// migrated.
    pub async fn open(config: &StorageConfig) -> Result<Self, StorageSetupError> {
        match config {
            StorageConfig::InMemory => Ok(Self::in_memory()),
            StorageConfig::JsonFile(path) => Ok(Self::json_file(path.clone())?),
            StorageConfig::Sqlite(url) => Ok(Self::sqlite(url).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_round_trips() {
        let storage = Storage::open(&StorageConfig::InMemory).await.unwrap();
        assert!(storage.subjects.list_subjects().await.unwrap().is_empty());
    }

    #[test]
    fn default_config_is_sqlite() {
        assert_eq!(
            StorageConfig::default(),
            StorageConfig::Sqlite("sqlite:tracker.sqlite3".into())
        );
    }
}
