use async_trait::async_trait;

use tracker_core::model::{UserId, UserSettings};

use super::SqliteRepository;
use super::mapping::{id_i64, map_settings_row};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        let row = sqlx::query(
            r"
            SELECT theme, morning_reminder, evening_reminder, reminder_enabled
            FROM user_settings
            WHERE user_id = ?1
            ",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_settings_row).transpose()
    }

    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        let user = id_i64("user_id", user_id.value())?;

        sqlx::query(
            r"
            INSERT INTO user_settings (
                user_id, theme, morning_reminder, evening_reminder, reminder_enabled
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                theme = excluded.theme,
                morning_reminder = excluded.morning_reminder,
                evening_reminder = excluded.evening_reminder,
                reminder_enabled = excluded.reminder_enabled
            ",
        )
        .bind(user)
        .bind(settings.theme().as_str())
        .bind(settings.morning_reminder())
        .bind(settings.evening_reminder())
        .bind(settings.reminder_enabled())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
