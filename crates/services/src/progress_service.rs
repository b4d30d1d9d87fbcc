use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use storage::repository::{AttemptPersistence, DailyProgressRow, ProgressRepository};
use tracker_core::model::UserId;
use tracker_core::streak;
use tracker_core::time::Clock;

use crate::error::ProgressServiceError;

/// Read side of the daily aggregates: day lookups, windowed history, and
/// the current streak.
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    tracking: Arc<dyn AttemptPersistence>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        tracking: Arc<dyn AttemptPersistence>,
    ) -> Self {
        Self {
            clock,
            progress,
            tracking,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The aggregate for one day, if anything was logged.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn progress_for(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Option<DailyProgressRow>, ProgressServiceError> {
        Ok(self.progress.progress_for_day(user_id, day).await?)
    }

    /// Aggregates for the window of `days` calendar days ending today,
    /// ascending by day. Days without attempts are absent, not zero-filled.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn history(
        &self,
        user_id: UserId,
        days: u32,
    ) -> Result<Vec<DailyProgressRow>, ProgressServiceError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let from = self.clock.today() - Duration::days(i64::from(days) - 1);
        Ok(self.progress.progress_since(user_id, from).await?)
    }

    /// Consecutive qualifying days ending today.
    ///
    /// Strict semantics: a day with no record, or a record below target,
    /// breaks the walk; if today itself does not qualify the streak is 0.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn current_streak(&self, user_id: UserId) -> Result<u32, ProgressServiceError> {
        let rows = self.progress.recent_progress(user_id, u32::MAX).await?;
        let records: Vec<_> = rows.into_iter().map(|row| row.progress).collect();
        Ok(streak::current_streak(self.clock.today(), &records))
    }

    /// Recompute one day's aggregate from the attempt log.
    ///
    /// Logging an attempt already does this; the explicit form exists for
    /// repair flows and for callers that bypassed the attempt service
    /// (e.g. bulk import).
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn recompute(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<DailyProgressRow, ProgressServiceError> {
        Ok(self.tracking.refresh_day(user_id, day).await?)
    }
}
