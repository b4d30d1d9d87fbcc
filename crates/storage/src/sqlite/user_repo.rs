use async_trait::async_trait;

use tracker_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_sqlx_err, map_user_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let id = id_i64("user_id", id.value())?;

        let row = sqlx::query(
            r"
            SELECT id, username, password, daily_target, created_at
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let id = id_i64("user_id", user.id().value())?;

        sqlx::query(
            r"
            INSERT INTO users (id, username, password, daily_target, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                username = excluded.username,
                password = excluded.password,
                daily_target = excluded.daily_target
            ",
        )
        .bind(id)
        .bind(user.username())
        .bind(user.password())
        .bind(i64::from(user.daily_target()))
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }
}
