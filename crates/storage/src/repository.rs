use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use tracker_core::model::{
    DailyProgress, NewAttempt, QuestionAttempt, Subject, SubjectId, User, UserId, UserSettings,
};

pub use crate::memory::InMemoryRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted daily aggregate together with its storage-assigned row id.
///
/// Upserting the same (user, day) keeps the original id, which is what
/// makes the recomputation idempotent at the storage level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyProgressRow {
    pub id: i64,
    pub progress: DailyProgress,
}

impl DailyProgressRow {
    #[must_use]
    pub fn new(id: i64, progress: DailyProgress) -> Self {
        Self { id, progress }
    }
}

/// Repository contract for the subject catalog.
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Persist or update a subject.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another subject already uses the
    /// same code, or other storage errors.
    async fn upsert_subject(&self, subject: &Subject) -> Result<(), StorageError>;

    /// Fetch a subject by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing subject is
    /// `Ok(None)`.
    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError>;

    /// All subjects, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError>;
}

/// Repository contract for the append-only attempt log.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Insert a validated attempt, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &NewAttempt) -> Result<QuestionAttempt, StorageError>;

    /// Most recent attempts first, truncated to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuestionAttempt>, StorageError>;

    /// All attempts whose timestamp falls on the given UTC calendar day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn attempts_on_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Vec<QuestionAttempt>, StorageError>;

    /// The full attempt log for a user, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn all_attempts(&self, user_id: UserId) -> Result<Vec<QuestionAttempt>, StorageError>;

    /// Insert an attempt that already carries an id (bulk import).
    ///
    /// Returns `false` without touching anything when the id is already
    /// present — duplicate imports are merges, not errors.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn import_attempt(&self, attempt: &QuestionAttempt) -> Result<bool, StorageError>;
}

/// Repository contract for derived daily aggregates.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// The aggregate for one (user, day), if any attempts were ever logged
    /// for it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn progress_for_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Option<DailyProgressRow>, StorageError>;

    /// Aggregates with day >= `from`, ascending by day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn progress_since(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<DailyProgressRow>, StorageError>;

    /// Most recent aggregates first, truncated to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn recent_progress(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<DailyProgressRow>, StorageError>;
}

/// Atomic attempt-plus-aggregate persistence.
///
/// Logging an attempt and refreshing that day's aggregate is a single
/// read-modify-write per (user, day): the adapter must read the complete
/// current attempt set for the day — not a stale snapshot — before
/// upserting, so two quick successive writes cannot lose each other's
/// totals. The resummation itself is `DailyProgress::from_attempts`;
/// adapters never reimplement the math.
#[async_trait]
pub trait AttemptPersistence: Send + Sync {
    /// Insert the attempt and resum its day, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either write fails; on failure neither the
    /// attempt nor the aggregate is visible.
    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
    ) -> Result<(QuestionAttempt, DailyProgressRow), StorageError>;

    /// Resum one (user, day) from the current attempt log and upsert the
    /// aggregate, preserving an existing row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn refresh_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<DailyProgressRow, StorageError>;
}

/// Repository contract for per-user preferences.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch stored settings; `Ok(None)` means never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError>;

    /// Insert or replace the user's settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError>;
}

/// Repository contract for accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing user is
    /// `Ok(None)`.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Persist or update a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if another user already holds the
    /// username, or other storage errors.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;
}

/// Aggregates the entity repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub subjects: Arc<dyn SubjectRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub tracking: Arc<dyn AttemptPersistence>,
    pub settings: Arc<dyn SettingsRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    /// Build a `Storage` backed by the in-memory adapter.
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = crate::memory::InMemoryRepository::new();
        Self::from_shared(Arc::new(repo))
    }

    pub(crate) fn from_shared<R>(repo: Arc<R>) -> Self
    where
        R: SubjectRepository
            + AttemptRepository
            + ProgressRepository
            + AttemptPersistence
            + SettingsRepository
            + UserRepository
            + 'static,
    {
        Self {
            subjects: Arc::clone(&repo) as Arc<dyn SubjectRepository>,
            attempts: Arc::clone(&repo) as Arc<dyn AttemptRepository>,
            progress: Arc::clone(&repo) as Arc<dyn ProgressRepository>,
            tracking: Arc::clone(&repo) as Arc<dyn AttemptPersistence>,
            settings: Arc::clone(&repo) as Arc<dyn SettingsRepository>,
            users: repo as Arc<dyn UserRepository>,
        }
    }
}
