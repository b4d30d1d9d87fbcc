use sqlx::Row;

use tracker_core::model::{
    AttemptId, DailyProgress, Difficulty, QuestionAttempt, Subject, SubjectId, Theme, User,
    UserId, UserSettings,
};

use crate::repository::{DailyProgressRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Collapse a sqlx error, keeping unique-constraint violations apart from
/// plain connection failures so callers can treat them as conflicts.
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> StorageError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn subject_id_from_i64(v: i64) -> Result<SubjectId, StorageError> {
    Ok(SubjectId::new(i64_to_u64("subject_id", v)?))
}

pub(crate) fn attempt_id_from_i64(v: i64) -> Result<AttemptId, StorageError> {
    Ok(AttemptId::new(i64_to_u64("attempt_id", v)?))
}

pub(crate) fn map_subject_row(row: &sqlx::sqlite::SqliteRow) -> Result<Subject, StorageError> {
    let topics_raw: String = row.try_get("topics").map_err(ser)?;
    let topics: Vec<String> = serde_json::from_str(&topics_raw).map_err(ser)?;

    Subject::new(
        subject_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("code").map_err(ser)?,
        row.try_get::<f64, _>("weightage").map_err(ser)?,
        topics,
    )
    .map_err(ser)
}

pub(crate) fn topics_to_json(subject: &Subject) -> Result<String, StorageError> {
    serde_json::to_string(subject.topics()).map_err(ser)
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<QuestionAttempt, StorageError> {
    let difficulty_raw: String = row.try_get("difficulty").map_err(ser)?;

    QuestionAttempt::from_persisted(
        attempt_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        subject_id_from_i64(row.try_get::<i64, _>("subject_id").map_err(ser)?)?,
        row.try_get::<String, _>("topic").map_err(ser)?,
        i64_to_u32(
            "questions_attempted",
            row.try_get::<i64, _>("questions_attempted").map_err(ser)?,
        )?,
        i64_to_u32(
            "correct_answers",
            row.try_get::<i64, _>("correct_answers").map_err(ser)?,
        )?,
        Difficulty::parse(difficulty_raw.as_str()).map_err(ser)?,
        i64_to_u32(
            "time_spent_min",
            row.try_get::<i64, _>("time_spent_min").map_err(ser)?,
        )?,
        row.try_get("attempted_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<DailyProgressRow, StorageError> {
    let progress = DailyProgress::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        row.try_get("day").map_err(ser)?,
        i64_to_u32(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        i64_to_u32(
            "total_correct",
            row.try_get::<i64, _>("total_correct").map_err(ser)?,
        )?,
        i64_to_u32(
            "total_time_min",
            row.try_get::<i64, _>("total_time_min").map_err(ser)?,
        )?,
        row.try_get::<bool, _>("target_achieved").map_err(ser)?,
        row.try_get::<bool, _>("streak_day").map_err(ser)?,
    );

    Ok(DailyProgressRow::new(
        row.try_get::<i64, _>("id").map_err(ser)?,
        progress,
    ))
}

pub(crate) fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    User::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("username").map_err(ser)?,
        row.try_get::<String, _>("password").map_err(ser)?,
        i64_to_u32(
            "daily_target",
            row.try_get::<i64, _>("daily_target").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_settings_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<UserSettings, StorageError> {
    let theme_raw: String = row.try_get("theme").map_err(ser)?;

    Ok(UserSettings::from_persisted(
        Theme::parse(theme_raw.as_str()).map_err(ser)?,
        row.try_get("morning_reminder").map_err(ser)?,
        row.try_get("evening_reminder").map_err(ser)?,
        row.try_get::<bool, _>("reminder_enabled").map_err(ser)?,
    ))
}
