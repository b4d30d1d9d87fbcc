use async_trait::async_trait;
use chrono::NaiveDate;

use tracker_core::model::UserId;

use super::SqliteRepository;
use super::mapping::{id_i64, map_progress_row};
use crate::repository::{DailyProgressRow, ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "id, user_id, day, total_questions, total_correct, \
     total_time_min, target_achieved, streak_day";

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn progress_for_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Option<DailyProgressRow>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let row = sqlx::query(&format!(
            r"
            SELECT {PROGRESS_COLUMNS}
            FROM daily_progress
            WHERE user_id = ?1 AND day = ?2
            "
        ))
        .bind(user)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn progress_since(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<DailyProgressRow>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(&format!(
            r"
            SELECT {PROGRESS_COLUMNS}
            FROM daily_progress
            WHERE user_id = ?1 AND day >= ?2
            ORDER BY day ASC
            "
        ))
        .bind(user)
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }

    async fn recent_progress(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<DailyProgressRow>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(&format!(
            r"
            SELECT {PROGRESS_COLUMNS}
            FROM daily_progress
            WHERE user_id = ?1
            ORDER BY day DESC
            LIMIT ?2
            "
        ))
        .bind(user)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_progress_row(&row)?);
        }
        Ok(out)
    }
}
