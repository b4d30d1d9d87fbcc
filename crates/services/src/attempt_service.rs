use chrono::NaiveDate;
use std::sync::Arc;

use storage::repository::{
    AttemptPersistence, AttemptRepository, DailyProgressRow, SubjectRepository,
};
use tracker_core::model::{AttemptDraft, QuestionAttempt, UserId};
use tracker_core::time::Clock;

use crate::error::AttemptServiceError;

/// Query limit applied when the caller does not ask for one.
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 100;

/// Result of logging an attempt: the stored record and the refreshed
/// aggregate for its day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedAttempt {
    pub attempt: QuestionAttempt,
    pub progress: DailyProgressRow,
}

/// Coordinates attempt ingestion: validation, referential checks, and the
/// atomic write that keeps the day's aggregate in step with the log.
pub struct AttemptService {
    clock: Clock,
    subjects: Arc<dyn SubjectRepository>,
    attempts: Arc<dyn AttemptRepository>,
    tracking: Arc<dyn AttemptPersistence>,
}

impl AttemptService {
    #[must_use]
    pub fn new(
        clock: Clock,
        subjects: Arc<dyn SubjectRepository>,
        attempts: Arc<dyn AttemptRepository>,
        tracking: Arc<dyn AttemptPersistence>,
    ) -> Self {
        Self {
            clock,
            subjects,
            attempts,
            tracking,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and store a practice attempt, refreshing that day's
    /// aggregate as part of the same storage operation.
    ///
    /// Validation failures surface before anything is written, so a
    /// rejected draft never mutates stored state.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Validation` for bad field values,
    /// `UnknownSubject` if the referenced subject is not in the catalog,
    /// and `Storage` if persistence fails.
    pub async fn log_attempt(
        &self,
        user_id: UserId,
        draft: AttemptDraft,
    ) -> Result<LoggedAttempt, AttemptServiceError> {
        let attempt = draft.validate(user_id, self.clock.now())?;

        if self.subjects.get_subject(attempt.subject_id()).await?.is_none() {
            return Err(AttemptServiceError::UnknownSubject(attempt.subject_id()));
        }

        let (stored, progress) = self.tracking.record_attempt(&attempt).await?;

        tracing::debug!(
            attempt = %stored.id(),
            day = %stored.day(),
            total_questions = progress.progress.total_questions(),
            "logged attempt"
        );

        Ok(LoggedAttempt {
            attempt: stored,
            progress,
        })
    }

    /// Most recent attempts first; `None` applies the default limit of 100.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` on repository failures.
    pub async fn recent_attempts(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<QuestionAttempt>, AttemptServiceError> {
        let limit = limit.unwrap_or(DEFAULT_ATTEMPT_LIMIT);
        Ok(self.attempts.attempts_for_user(user_id, limit).await?)
    }

    /// All attempts logged on one UTC calendar day.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` on repository failures.
    pub async fn attempts_on(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Vec<QuestionAttempt>, AttemptServiceError> {
        Ok(self.attempts.attempts_on_day(user_id, day).await?)
    }
}
