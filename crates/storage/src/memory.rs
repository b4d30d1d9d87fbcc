use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracker_core::model::{
    AttemptId, DailyProgress, NewAttempt, QuestionAttempt, Subject, SubjectId, User, UserId,
    UserSettings,
};

use crate::repository::{
    AttemptPersistence, AttemptRepository, DailyProgressRow, ProgressRepository,
    SettingsRepository, StorageError, SubjectRepository, UserRepository,
};

/// Everything the in-memory adapter holds.
///
/// One mutex guards the whole state so the attempt-insert + day-resum +
/// aggregate-upsert sequence in `record_attempt` is a single critical
/// section per store.
#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) subjects: BTreeMap<SubjectId, Subject>,
    pub(crate) attempts: BTreeMap<AttemptId, QuestionAttempt>,
    pub(crate) progress: HashMap<(UserId, NaiveDate), DailyProgressRow>,
    pub(crate) settings: HashMap<UserId, UserSettings>,
    pub(crate) next_attempt_id: u64,
    pub(crate) next_progress_id: i64,
}

impl State {
    pub(crate) fn new() -> Self {
        Self {
            next_attempt_id: 1,
            next_progress_id: 1,
            ..Self::default()
        }
    }

    pub(crate) fn append_attempt(&mut self, attempt: &NewAttempt) -> QuestionAttempt {
        let id = AttemptId::new(self.next_attempt_id);
        self.next_attempt_id += 1;
        let stored = attempt.clone().with_id(id);
        self.attempts.insert(id, stored.clone());
        stored
    }

    /// Keep id-assignment monotonic after imports so a later append cannot
    /// collide with an imported id.
    pub(crate) fn import_attempt(&mut self, attempt: &QuestionAttempt) -> bool {
        if self.attempts.contains_key(&attempt.id()) {
            return false;
        }
        self.attempts.insert(attempt.id(), attempt.clone());
        self.next_attempt_id = self.next_attempt_id.max(attempt.id().value() + 1);
        true
    }

    pub(crate) fn attempts_on_day(&self, user_id: UserId, day: NaiveDate) -> Vec<QuestionAttempt> {
        self.attempts
            .values()
            .filter(|a| a.user_id() == user_id && a.day() == day)
            .cloned()
            .collect()
    }

    pub(crate) fn refresh_day(&mut self, user_id: UserId, day: NaiveDate) -> DailyProgressRow {
        let attempts = self.attempts_on_day(user_id, day);
        let progress = DailyProgress::from_attempts(user_id, day, &attempts);
        let id = match self.progress.get(&(user_id, day)) {
            Some(existing) => existing.id,
            None => {
                let id = self.next_progress_id;
                self.next_progress_id += 1;
                id
            }
        };
        let row = DailyProgressRow::new(id, progress);
        self.progress.insert((user_id, day), row.clone());
        row
    }
}

/// Simple in-memory repository implementation for testing, prototyping,
/// and throwaway sessions.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl SubjectRepository for InMemoryRepository {
    async fn upsert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let code_taken = state
            .subjects
            .values()
            .any(|s| s.code() == subject.code() && s.id() != subject.id());
        if code_taken {
            return Err(StorageError::Conflict);
        }
        state.subjects.insert(subject.id(), subject.clone());
        Ok(())
    }

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StorageError> {
        let state = self.lock()?;
        Ok(state.subjects.get(&id).cloned())
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        let state = self.lock()?;
        Ok(state.subjects.values().cloned().collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &NewAttempt) -> Result<QuestionAttempt, StorageError> {
        let mut state = self.lock()?;
        Ok(state.append_attempt(attempt))
    }

    async fn attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuestionAttempt>, StorageError> {
        let state = self.lock()?;
        let mut attempts: Vec<_> = state
            .attempts
            .values()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| {
            b.attempted_at()
                .cmp(&a.attempted_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        attempts.truncate(limit as usize);
        Ok(attempts)
    }

    async fn attempts_on_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Vec<QuestionAttempt>, StorageError> {
        let state = self.lock()?;
        Ok(state.attempts_on_day(user_id, day))
    }

    async fn all_attempts(&self, user_id: UserId) -> Result<Vec<QuestionAttempt>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .attempts
            .values()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn import_attempt(&self, attempt: &QuestionAttempt) -> Result<bool, StorageError> {
        let mut state = self.lock()?;
        Ok(state.import_attempt(attempt))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn progress_for_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<Option<DailyProgressRow>, StorageError> {
        let state = self.lock()?;
        Ok(state.progress.get(&(user_id, day)).cloned())
    }

    async fn progress_since(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<DailyProgressRow>, StorageError> {
        let state = self.lock()?;
        let mut rows: Vec<_> = state
            .progress
            .values()
            .filter(|row| row.progress.user_id() == user_id && row.progress.day() >= from)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.progress.day());
        Ok(rows)
    }

    async fn recent_progress(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<DailyProgressRow>, StorageError> {
        let state = self.lock()?;
        let mut rows: Vec<_> = state
            .progress
            .values()
            .filter(|row| row.progress.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.progress.day().cmp(&a.progress.day()));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[async_trait]
impl AttemptPersistence for InMemoryRepository {
    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
    ) -> Result<(QuestionAttempt, DailyProgressRow), StorageError> {
        let mut state = self.lock()?;
        let stored = state.append_attempt(attempt);
        let row = state.refresh_day(stored.user_id(), stored.day());
        Ok((stored, row))
    }

    async fn refresh_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<DailyProgressRow, StorageError> {
        let mut state = self.lock()?;
        Ok(state.refresh_day(user_id, day))
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError> {
        let state = self.lock()?;
        Ok(state.settings.get(&user_id).cloned())
    }

    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.settings.insert(user_id, settings.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let username_taken = state
            .users
            .values()
            .any(|u| u.username() == user.username() && u.id() != user.id());
        if username_taken {
            return Err(StorageError::Conflict);
        }
        state.users.insert(user.id(), user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tracker_core::model::{AttemptDraft, Difficulty, gate_ece_syllabus};
    use tracker_core::time::fixed_now;

    fn new_attempt(questions: u32, correct: u32, minutes_offset: i64) -> NewAttempt {
        AttemptDraft {
            subject_id: SubjectId::new(2),
            topic: "Network Theorems".into(),
            questions_attempted: questions,
            correct_answers: correct,
            difficulty: Difficulty::Medium,
            time_spent_min: 20,
        }
        .validate(UserId::new(1), fixed_now() + Duration::minutes(minutes_offset))
        .unwrap()
    }

    #[tokio::test]
    async fn record_attempt_resums_the_day_and_keeps_row_id() {
        let repo = InMemoryRepository::new();
        let day = fixed_now().date_naive();

        let (first, row1) = repo.record_attempt(&new_attempt(10, 8, 0)).await.unwrap();
        assert_eq!(first.id(), AttemptId::new(1));
        assert_eq!(row1.progress.total_questions(), 10);
        assert!(!row1.progress.target_achieved());

        let (_, row2) = repo.record_attempt(&new_attempt(25, 20, 5)).await.unwrap();
        assert_eq!(row2.id, row1.id);
        assert_eq!(row2.progress.total_questions(), 35);
        assert!(row2.progress.target_achieved());

        // A refresh with no new attempts must not change anything.
        let row3 = repo.refresh_day(UserId::new(1), day).await.unwrap();
        assert_eq!(row3, row2);
    }

    #[tokio::test]
    async fn attempts_for_user_is_descending_and_truncated() {
        let repo = InMemoryRepository::new();
        for i in 0..5 {
            repo.record_attempt(&new_attempt(5, 3, i)).await.unwrap();
        }

        let recent = repo.attempts_for_user(UserId::new(1), 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].attempted_at() > recent[1].attempted_at());
        assert!(recent[1].attempted_at() > recent[2].attempted_at());
    }

    #[tokio::test]
    async fn import_attempt_skips_existing_ids() {
        let repo = InMemoryRepository::new();
        let (stored, _) = repo.record_attempt(&new_attempt(10, 8, 0)).await.unwrap();

        assert!(!repo.import_attempt(&stored).await.unwrap());

        let foreign = new_attempt(5, 5, 10).with_id(AttemptId::new(99));
        assert!(repo.import_attempt(&foreign).await.unwrap());
        assert!(!repo.import_attempt(&foreign).await.unwrap());

        // Appends after an import must not collide with the imported id.
        let (next, _) = repo.record_attempt(&new_attempt(1, 1, 20)).await.unwrap();
        assert_eq!(next.id(), AttemptId::new(100));
    }

    #[tokio::test]
    async fn subject_code_conflicts_are_rejected() {
        let repo = InMemoryRepository::new();
        for subject in gate_ece_syllabus() {
            repo.upsert_subject(&subject).await.unwrap();
        }

        let clash = Subject::new(
            SubjectId::new(99),
            "Another Networks",
            "NSS",
            5.0,
            vec!["T".into()],
        )
        .unwrap();
        let err = repo.upsert_subject(&clash).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        // Re-upserting the same subject is fine.
        let same = gate_ece_syllabus().into_iter().next().unwrap();
        repo.upsert_subject(&same).await.unwrap();
    }

    #[tokio::test]
    async fn progress_queries_window_and_order() {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();
        for days_ago in [0_i64, 1, 2, 9] {
            repo.refresh_day(UserId::new(1), today - Duration::days(days_ago))
                .await
                .unwrap();
        }

        let since = repo
            .progress_since(UserId::new(1), today - Duration::days(2))
            .await
            .unwrap();
        assert_eq!(since.len(), 3);
        assert!(since.windows(2).all(|w| w[0].progress.day() < w[1].progress.day()));

        let recent = repo.recent_progress(UserId::new(1), 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].progress.day(), today);
    }

    #[tokio::test]
    async fn settings_roundtrip() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_settings(UserId::new(1)).await.unwrap().is_none());

        let settings = UserSettings::default();
        repo.save_settings(UserId::new(1), &settings).await.unwrap();
        assert_eq!(
            repo.get_settings(UserId::new(1)).await.unwrap(),
            Some(settings)
        );
    }
}
