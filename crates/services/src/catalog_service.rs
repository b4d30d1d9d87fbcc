use std::sync::Arc;

use storage::repository::SubjectRepository;
use tracker_core::model::{Subject, SubjectId, gate_ece_syllabus};

use crate::error::CatalogServiceError;

/// Read access to the subject catalog, plus the idempotent startup seed.
#[derive(Clone)]
pub struct CatalogService {
    subjects: Arc<dyn SubjectRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { subjects }
    }

    /// All subjects, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` on repository failures.
    pub async fn subjects(&self) -> Result<Vec<Subject>, CatalogServiceError> {
        Ok(self.subjects.list_subjects().await?)
    }

    /// One subject by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` on repository failures; a
    /// missing subject is `Ok(None)`.
    pub async fn subject(&self, id: SubjectId) -> Result<Option<Subject>, CatalogServiceError> {
        Ok(self.subjects.get_subject(id).await?)
    }

    /// Seed the GATE-ECE syllabus when the catalog is empty.
    ///
    /// Subsequent calls see a populated catalog and write nothing, so
    /// bootstrap can run this unconditionally. Returns how many subjects
    /// were written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` on repository failures.
    pub async fn ensure_seeded(&self) -> Result<usize, CatalogServiceError> {
        let existing = self.subjects.list_subjects().await?;
        if !existing.is_empty() {
            return Ok(0);
        }

        let seed = gate_ece_syllabus();
        for subject in &seed {
            self.subjects.upsert_subject(subject).await?;
        }
        tracing::info!(subjects = seed.len(), "seeded subject catalog");
        Ok(seed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn ensure_seeded_runs_once() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = CatalogService::new(Arc::clone(&repo) as Arc<dyn SubjectRepository>);

        assert_eq!(service.ensure_seeded().await.unwrap(), 8);
        assert_eq!(service.ensure_seeded().await.unwrap(), 0);

        let subjects = service.subjects().await.unwrap();
        assert_eq!(subjects.len(), 8);
        assert_eq!(subjects[0].id(), SubjectId::new(1));

        let nss = service.subject(SubjectId::new(2)).await.unwrap().unwrap();
        assert_eq!(nss.code(), "NSS");
        assert!(service.subject(SubjectId::new(42)).await.unwrap().is_none());
    }
}
