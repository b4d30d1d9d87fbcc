#![forbid(unsafe_code)]

pub mod analytics_service;
pub mod app_services;
pub mod attempt_service;
pub mod backup_service;
pub mod catalog_service;
pub mod error;
pub mod progress_service;
pub mod settings_service;

pub use tracker_core::Clock;

pub use error::{
    AnalyticsError, AppServicesError, AttemptServiceError, BackupError, CatalogServiceError,
    ProgressServiceError, SettingsServiceError,
};

pub use analytics_service::{
    AnalyticsService, DifficultyStat, SubjectStat, TopicStat, UserStats, WeeklyEntry,
};
pub use app_services::AppServices;
pub use attempt_service::{AttemptService, DEFAULT_ATTEMPT_LIMIT, LoggedAttempt};
pub use backup_service::{
    ARCHIVE_VERSION, ArchivedAttempt, AttemptArchive, BackupService, ImportSummary,
};
pub use catalog_service::CatalogService;
pub use progress_service::ProgressService;
pub use settings_service::SettingsService;
