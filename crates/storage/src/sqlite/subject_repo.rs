use async_trait::async_trait;

use tracker_core::model::{Subject, SubjectId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_sqlx_err, map_subject_row, topics_to_json};
use crate::repository::{StorageError, SubjectRepository};

#[async_trait]
impl SubjectRepository for SqliteRepository {
    async fn upsert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let id = id_i64("subject_id", subject.id().value())?;
        let topics = topics_to_json(subject)?;

        sqlx::query(
            r"
            INSERT INTO subjects (id, name, code, weightage, topics)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                code = excluded.code,
                weightage = excluded.weightage,
                topics = excluded.topics
            ",
        )
        .bind(id)
        .bind(subject.name())
        .bind(subject.code())
        .bind(subject.weightage())
        .bind(topics)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError> {
        let id = id_i64("subject_id", id.value())?;

        let row = sqlx::query(
            r"
            SELECT id, name, code, weightage, topics
            FROM subjects
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_subject_row).transpose()
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, code, weightage, topics
            FROM subjects
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_subject_row(&row)?);
        }
        Ok(out)
    }
}
