//! Shared error types for the services crate.

use thiserror::Error;

use storage::config::StorageSetupError;
use storage::repository::StorageError;
use tracker_core::model::{AttemptError, SubjectId, UserError};

/// Errors emitted by `AttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    /// The draft failed field validation; nothing was stored.
    #[error(transparent)]
    Validation(#[from] AttemptError),
    #[error("subject {0} does not exist")]
    UnknownSubject(SubjectId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AnalyticsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error("subject {0} does not exist")]
    UnknownSubject(SubjectId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BackupService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackupError {
    #[error("unsupported archive version {found}")]
    UnsupportedVersion { found: u32 },
    /// An archived record failed re-validation; the batch stops before any
    /// partial day refresh.
    #[error(transparent)]
    Record(#[from] AttemptError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Setup(#[from] StorageSetupError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),
    #[error(transparent)]
    User(#[from] UserError),
}
