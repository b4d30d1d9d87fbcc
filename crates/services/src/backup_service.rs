use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use storage::repository::{AttemptPersistence, AttemptRepository};
use tracker_core::model::{AttemptId, Difficulty, QuestionAttempt, SubjectId, UserId};

use crate::error::BackupError;

/// Archive format revision; bumped only on incompatible layout changes.
pub const ARCHIVE_VERSION: u32 = 1;

/// Serializable snapshot of a user's attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptArchive {
    pub version: u32,
    pub attempts: Vec<ArchivedAttempt>,
}

/// One attempt in wire form. Difficulty uses its canonical level name so
/// the archive stays readable and diffable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedAttempt {
    pub id: u64,
    pub user_id: u64,
    pub subject_id: u64,
    pub topic: String,
    pub questions_attempted: u32,
    pub correct_answers: u32,
    pub difficulty: String,
    pub time_spent_min: u32,
    pub attempted_at: DateTime<Utc>,
}

impl ArchivedAttempt {
    fn from_attempt(attempt: &QuestionAttempt) -> Self {
        Self {
            id: attempt.id().value(),
            user_id: attempt.user_id().value(),
            subject_id: attempt.subject_id().value(),
            topic: attempt.topic().to_owned(),
            questions_attempted: attempt.questions_attempted(),
            correct_answers: attempt.correct_answers(),
            difficulty: attempt.difficulty().as_str().to_owned(),
            time_spent_min: attempt.time_spent_min(),
            attempted_at: attempt.attempted_at(),
        }
    }

    fn into_attempt(self) -> Result<QuestionAttempt, BackupError> {
        Ok(QuestionAttempt::from_persisted(
            AttemptId::new(self.id),
            UserId::new(self.user_id),
            SubjectId::new(self.subject_id),
            self.topic,
            self.questions_attempted,
            self.correct_answers,
            Difficulty::parse(&self.difficulty)?,
            self.time_spent_min,
            self.attempted_at,
        )?)
    }
}

/// Outcome of a bulk import. Duplicate ids are merges, not failures, so
/// they are counted rather than surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Export/import of the attempt log for backup.
pub struct BackupService {
    attempts: Arc<dyn AttemptRepository>,
    tracking: Arc<dyn AttemptPersistence>,
}

impl BackupService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>, tracking: Arc<dyn AttemptPersistence>) -> Self {
        Self { attempts, tracking }
    }

    /// Snapshot the user's full attempt log.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Storage` on repository failures.
    pub async fn export(&self, user_id: UserId) -> Result<AttemptArchive, BackupError> {
        let attempts = self.attempts.all_attempts(user_id).await?;
        Ok(AttemptArchive {
            version: ARCHIVE_VERSION,
            attempts: attempts.iter().map(ArchivedAttempt::from_attempt).collect(),
        })
    }

    /// Export as a pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Storage` on repository failures or `Json` if
    /// serialization fails.
    pub async fn export_json(&self, user_id: UserId) -> Result<String, BackupError> {
        let archive = self.export(user_id).await?;
        Ok(serde_json::to_string_pretty(&archive)?)
    }

    /// Merge an archive into the store.
    ///
    /// Records are matched by id: existing ids are skipped untouched, new
    /// ones are inserted, and every day that actually received a record is
    /// resummed once at the end. Each record passes the same validation as
    /// a freshly logged attempt before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::UnsupportedVersion` for a foreign archive
    /// revision, `Record` if a record fails validation, and `Storage` on
    /// repository failures.
    pub async fn import(&self, archive: AttemptArchive) -> Result<ImportSummary, BackupError> {
        if archive.version != ARCHIVE_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: archive.version,
            });
        }

        // Validate the whole batch up front so a bad record cannot leave a
        // half-imported archive behind.
        let mut records = Vec::with_capacity(archive.attempts.len());
        for archived in archive.attempts {
            records.push(archived.into_attempt()?);
        }

        let mut summary = ImportSummary::default();
        let mut touched_days: BTreeSet<(UserId, NaiveDate)> = BTreeSet::new();
        for record in &records {
            if self.attempts.import_attempt(record).await? {
                summary.imported += 1;
                touched_days.insert((record.user_id(), record.day()));
            } else {
                summary.skipped += 1;
            }
        }

        for (user_id, day) in touched_days {
            self.tracking.refresh_day(user_id, day).await?;
        }

        tracing::debug!(
            imported = summary.imported,
            skipped = summary.skipped,
            "imported attempt archive"
        );

        Ok(summary)
    }

    /// Merge a JSON archive produced by `export_json`.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Json` for unparsable input, plus everything
    /// `import` can return.
    pub async fn import_json(&self, raw: &str) -> Result<ImportSummary, BackupError> {
        let archive: AttemptArchive = serde_json::from_str(raw)?;
        self.import(archive).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, ProgressRepository};
    use tracker_core::model::AttemptDraft;
    use tracker_core::time::fixed_now;

    fn service(repo: &Arc<InMemoryRepository>) -> BackupService {
        BackupService::new(
            Arc::clone(repo) as Arc<dyn AttemptRepository>,
            Arc::clone(repo) as Arc<dyn AttemptPersistence>,
        )
    }

    async fn log(repo: &InMemoryRepository, questions: u32, correct: u32) {
        let attempt = AttemptDraft {
            subject_id: SubjectId::new(2),
            topic: "Network Theorems".into(),
            questions_attempted: questions,
            correct_answers: correct,
            difficulty: Difficulty::Medium,
            time_spent_min: 20,
        }
        .validate(UserId::new(1), fixed_now())
        .unwrap();
        repo.record_attempt(&attempt).await.unwrap();
    }

    #[tokio::test]
    async fn export_import_roundtrip_reproduces_attempts() {
        let source = Arc::new(InMemoryRepository::new());
        log(&source, 10, 8).await;
        log(&source, 25, 20).await;

        let exported = service(&source).export(UserId::new(1)).await.unwrap();
        assert_eq!(exported.version, ARCHIVE_VERSION);
        assert_eq!(exported.attempts.len(), 2);

        let target = Arc::new(InMemoryRepository::new());
        let summary = service(&target).import(exported.clone()).await.unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 0 });

        let original = source.all_attempts(UserId::new(1)).await.unwrap();
        let restored = target.all_attempts(UserId::new(1)).await.unwrap();
        assert_eq!(original, restored);

        // The imported days were resummed.
        let row = target
            .progress_for_day(UserId::new(1), fixed_now().date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.progress.total_questions(), 35);
        assert!(row.progress.target_achieved());

        // Re-importing the same archive is a no-op.
        let again = service(&target).import(exported).await.unwrap();
        assert_eq!(again, ImportSummary { imported: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn import_json_roundtrip() {
        let source = Arc::new(InMemoryRepository::new());
        log(&source, 10, 8).await;

        let raw = service(&source).export_json(UserId::new(1)).await.unwrap();

        let target = Arc::new(InMemoryRepository::new());
        let summary = service(&target).import_json(&raw).await.unwrap();
        assert_eq!(summary.imported, 1);

        assert!(service(&target).import_json("{not json").await.is_err());
    }

    #[tokio::test]
    async fn import_rejects_foreign_versions_and_bad_records() {
        let target = Arc::new(InMemoryRepository::new());

        let err = service(&target)
            .import(AttemptArchive {
                version: 99,
                attempts: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::UnsupportedVersion { found: 99 }));

        let bad = AttemptArchive {
            version: ARCHIVE_VERSION,
            attempts: vec![ArchivedAttempt {
                id: 1,
                user_id: 1,
                subject_id: 2,
                topic: "Transients".into(),
                questions_attempted: 5,
                correct_answers: 9,
                difficulty: "Medium".into(),
                time_spent_min: 10,
                attempted_at: fixed_now(),
            }],
        };
        let err = service(&target).import(bad).await.unwrap_err();
        assert!(matches!(err, BackupError::Record(_)));
        assert!(target.all_attempts(UserId::new(1)).await.unwrap().is_empty());
    }
}
