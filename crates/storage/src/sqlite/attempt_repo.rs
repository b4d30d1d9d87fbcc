use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqliteConnection;

use tracker_core::model::{DailyProgress, NewAttempt, QuestionAttempt, UserId};

use super::SqliteRepository;
use super::mapping::{
    attempt_id_from_i64, id_i64, map_attempt_row, map_progress_row, map_sqlx_err,
};
use crate::repository::{
    AttemptPersistence, AttemptRepository, DailyProgressRow, StorageError,
};

const ATTEMPT_COLUMNS: &str = "id, user_id, subject_id, topic, questions_attempted, \
     correct_answers, difficulty, time_spent_min, attempted_at";

async fn day_attempts(
    conn: &mut SqliteConnection,
    user_id: i64,
    day: NaiveDate,
) -> Result<Vec<QuestionAttempt>, StorageError> {
    let rows = sqlx::query(&format!(
        r"
        SELECT {ATTEMPT_COLUMNS}
        FROM attempts
        WHERE user_id = ?1 AND attempt_day = ?2
        ORDER BY id ASC
        "
    ))
    .bind(user_id)
    .bind(day)
    .fetch_all(conn)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(map_attempt_row(&row)?);
    }
    Ok(out)
}

/// Resum one (user, day) inside the caller's transaction and upsert the
/// aggregate. The upsert leaves the row id untouched on conflict, which is
/// what keeps the recomputation idempotent.
async fn resum_day(
    conn: &mut SqliteConnection,
    user_id: UserId,
    day: NaiveDate,
) -> Result<DailyProgressRow, StorageError> {
    let user = id_i64("user_id", user_id.value())?;

    let attempts = day_attempts(&mut *conn, user, day).await?;
    let progress = DailyProgress::from_attempts(user_id, day, &attempts);

    sqlx::query(
        r"
        INSERT INTO daily_progress (
            user_id, day, total_questions, total_correct, total_time_min,
            target_achieved, streak_day
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(user_id, day) DO UPDATE SET
            total_questions = excluded.total_questions,
            total_correct = excluded.total_correct,
            total_time_min = excluded.total_time_min,
            target_achieved = excluded.target_achieved,
            streak_day = excluded.streak_day
        ",
    )
    .bind(user)
    .bind(day)
    .bind(i64::from(progress.total_questions()))
    .bind(i64::from(progress.total_correct()))
    .bind(i64::from(progress.total_time_min()))
    .bind(progress.target_achieved())
    .bind(progress.streak_day())
    .execute(&mut *conn)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    let row = sqlx::query(
        r"
        SELECT id, user_id, day, total_questions, total_correct, total_time_min,
               target_achieved, streak_day
        FROM daily_progress
        WHERE user_id = ?1 AND day = ?2
        ",
    )
    .bind(user)
    .bind(day)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StorageError::Connection(e.to_string()))?;

    map_progress_row(&row)
}

async fn insert_attempt(
    conn: &mut SqliteConnection,
    attempt: &NewAttempt,
) -> Result<QuestionAttempt, StorageError> {
    let res = sqlx::query(
        r"
        INSERT INTO attempts (
            user_id, subject_id, topic, questions_attempted, correct_answers,
            difficulty, time_spent_min, attempted_at, attempt_day
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
    )
    .bind(id_i64("user_id", attempt.user_id().value())?)
    .bind(id_i64("subject_id", attempt.subject_id().value())?)
    .bind(attempt.topic())
    .bind(i64::from(attempt.questions_attempted()))
    .bind(i64::from(attempt.correct_answers()))
    .bind(attempt.difficulty().as_str())
    .bind(i64::from(attempt.time_spent_min()))
    .bind(attempt.attempted_at())
    .bind(attempt.attempted_at().date_naive())
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;

    let id = attempt_id_from_i64(res.last_insert_rowid())?;
    Ok(attempt.clone().with_id(id))
}

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &NewAttempt) -> Result<QuestionAttempt, StorageError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        insert_attempt(&mut *conn, attempt).await
    }

    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuestionAttempt>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(&format!(
            r"
            SELECT {ATTEMPT_COLUMNS}
            FROM attempts
            WHERE user_id = ?1
            ORDER BY attempted_at DESC, id DESC
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
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }

    async fn attempts_on_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Vec<QuestionAttempt>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        day_attempts(&mut *conn, user, day).await
    }

    async fn all_attempts(&self, user_id: UserId) -> Result<Vec<QuestionAttempt>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let rows = sqlx::query(&format!(
            r"
            SELECT {ATTEMPT_COLUMNS}
            FROM attempts
            WHERE user_id = ?1
            ORDER BY id ASC
            "
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }

    async fn import_attempt(&self, attempt: &QuestionAttempt) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO attempts (
                id, user_id, subject_id, topic, questions_attempted,
                correct_answers, difficulty, time_spent_min, attempted_at,
                attempt_day
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(id_i64("attempt_id", attempt.id().value())?)
        .bind(id_i64("user_id", attempt.user_id().value())?)
        .bind(id_i64("subject_id", attempt.subject_id().value())?)
        .bind(attempt.topic())
        .bind(i64::from(attempt.questions_attempted()))
        .bind(i64::from(attempt.correct_answers()))
        .bind(attempt.difficulty().as_str())
        .bind(i64::from(attempt.time_spent_min()))
        .bind(attempt.attempted_at())
        .bind(attempt.day())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(res.rows_affected() == 1)
    }
}

#[async_trait]
impl AttemptPersistence for SqliteRepository {
    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
    ) -> Result<(QuestionAttempt, DailyProgressRow), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let stored = insert_attempt(&mut *tx, attempt).await?;
        let row = resum_day(&mut *tx, stored.user_id(), stored.day()).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok((stored, row))
    }

    async fn refresh_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<DailyProgressRow, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let row = resum_day(&mut *tx, user_id, day).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(row)
    }
}
