//! JSON-file adapter: the in-memory state, mirrored to a single document
//! on every mutation.
//!
//! A missing file means "not yet initialized" and starts an empty store; a
//! file that exists but cannot be parsed is a `Serialization` error and is
//! never silently replaced.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracker_core::model::{
    AttemptId, DailyProgress, Difficulty, NewAttempt, QuestionAttempt, Subject, SubjectId, Theme,
    User, UserId, UserSettings,
};

use crate::memory::State;
use crate::repository::{
    AttemptPersistence, AttemptRepository, DailyProgressRow, ProgressRepository,
    SettingsRepository, Storage, StorageError, SubjectRepository, UserRepository,
};

const DOC_VERSION: u32 = 1;

//
// ─── DOCUMENT SHAPE ────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
struct Doc {
    version: u32,
    users: Vec<UserDoc>,
    subjects: Vec<SubjectDoc>,
    attempts: Vec<AttemptDoc>,
    progress: Vec<ProgressDoc>,
    settings: Vec<SettingsDoc>,
    next_attempt_id: u64,
    next_progress_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDoc {
    id: u64,
    username: String,
    password: String,
    daily_target: u32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SubjectDoc {
    id: u64,
    name: String,
    code: String,
    weightage: f64,
    topics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AttemptDoc {
    id: u64,
    user_id: u64,
    subject_id: u64,
    topic: String,
    questions_attempted: u32,
    correct_answers: u32,
    difficulty: String,
    time_spent_min: u32,
    attempted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProgressDoc {
    id: i64,
    user_id: u64,
    day: NaiveDate,
    total_questions: u32,
    total_correct: u32,
    total_time_min: u32,
    target_achieved: bool,
    streak_day: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsDoc {
    user_id: u64,
    theme: String,
    morning_reminder: Option<NaiveTime>,
    evening_reminder: Option<NaiveTime>,
    reminder_enabled: bool,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn doc_from_state(state: &State) -> Doc {
    Doc {
        version: DOC_VERSION,
        users: state
            .users
            .values()
            .map(|u| UserDoc {
                id: u.id().value(),
                username: u.username().to_owned(),
                password: u.password().to_owned(),
                daily_target: u.daily_target(),
                created_at: u.created_at(),
            })
            .collect(),
        subjects: state
            .subjects
            .values()
            .map(|s| SubjectDoc {
                id: s.id().value(),
                name: s.name().to_owned(),
                code: s.code().to_owned(),
                weightage: s.weightage(),
                topics: s.topics().to_vec(),
            })
            .collect(),
        attempts: state
            .attempts
            .values()
            .map(|a| AttemptDoc {
                id: a.id().value(),
                user_id: a.user_id().value(),
                subject_id: a.subject_id().value(),
                topic: a.topic().to_owned(),
                questions_attempted: a.questions_attempted(),
                correct_answers: a.correct_answers(),
                difficulty: a.difficulty().as_str().to_owned(),
                time_spent_min: a.time_spent_min(),
                attempted_at: a.attempted_at(),
            })
            .collect(),
        progress: state
            .progress
            .values()
            .map(|row| ProgressDoc {
                id: row.id,
                user_id: row.progress.user_id().value(),
                day: row.progress.day(),
                total_questions: row.progress.total_questions(),
                total_correct: row.progress.total_correct(),
                total_time_min: row.progress.total_time_min(),
                target_achieved: row.progress.target_achieved(),
                streak_day: row.progress.streak_day(),
            })
            .collect(),
        settings: state
            .settings
            .iter()
            .map(|(user_id, s)| SettingsDoc {
                user_id: user_id.value(),
                theme: s.theme().as_str().to_owned(),
                morning_reminder: s.morning_reminder(),
                evening_reminder: s.evening_reminder(),
                reminder_enabled: s.reminder_enabled(),
            })
            .collect(),
        next_attempt_id: state.next_attempt_id,
        next_progress_id: state.next_progress_id,
    }
}

fn state_from_doc(doc: Doc) -> Result<State, StorageError> {
    let mut state = State::new();

    for u in doc.users {
        let user = User::from_persisted(
            UserId::new(u.id),
            u.username,
            u.password,
            u.daily_target,
            u.created_at,
        )
        .map_err(ser)?;
        state.users.insert(user.id(), user);
    }

    for s in doc.subjects {
        let subject =
            Subject::new(SubjectId::new(s.id), s.name, s.code, s.weightage, s.topics)
                .map_err(ser)?;
        state.subjects.insert(subject.id(), subject);
    }

    for a in doc.attempts {
        let attempt = QuestionAttempt::from_persisted(
            AttemptId::new(a.id),
            UserId::new(a.user_id),
            SubjectId::new(a.subject_id),
            a.topic,
            a.questions_attempted,
            a.correct_answers,
            Difficulty::parse(&a.difficulty).map_err(ser)?,
            a.time_spent_min,
            a.attempted_at,
        )
        .map_err(ser)?;
        state.attempts.insert(attempt.id(), attempt);
    }

    for p in doc.progress {
        let progress = DailyProgress::from_persisted(
            UserId::new(p.user_id),
            p.day,
            p.total_questions,
            p.total_correct,
            p.total_time_min,
            p.target_achieved,
            p.streak_day,
        );
        state.progress.insert(
            (progress.user_id(), progress.day()),
            DailyProgressRow::new(p.id, progress),
        );
    }

    for s in doc.settings {
        let settings = UserSettings::from_persisted(
            Theme::parse(&s.theme).map_err(ser)?,
            s.morning_reminder,
            s.evening_reminder,
            s.reminder_enabled,
        );
        state.settings.insert(UserId::new(s.user_id), settings);
    }

    state.next_attempt_id = doc.next_attempt_id;
    state.next_progress_id = doc.next_progress_id;
    Ok(state)
}

//
// ─── REPOSITORY ────────────────────────────────────────────────────────────────
//

/// File-backed repository holding its working state in memory and writing
/// the whole document through on every mutation.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl JsonFileRepository {
    /// Open (or create on first write) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the file cannot be read and
    /// `StorageError::Serialization` if it exists but cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let doc: Doc = serde_json::from_str(&raw).map_err(ser)?;
                state_from_doc(doc)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(e) => return Err(StorageError::Connection(e.to_string())),
        };

        tracing::debug!(
            path = %path.display(),
            attempts = state.attempts.len(),
            "opened json store"
        );

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(state)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Write the current state out, via a temp file + rename so a crashed
    /// write never leaves a truncated store behind.
    fn persist(&self, state: &State) -> Result<(), StorageError> {
        let doc = doc_from_state(state);
        let raw = serde_json::to_string_pretty(&doc).map_err(ser)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| StorageError::Connection(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Run a mutation and persist it; on a failed write the in-memory state
    /// is rolled back so memory and file stay in agreement.
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut State) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut state = self.lock()?;
        let backup = state.clone();
        let out = apply(&mut *state)?;
        if let Err(e) = self.persist(&state) {
            *state = backup;
            return Err(e);
        }
        Ok(out)
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if an existing file cannot be read or parsed.
    pub fn json_file(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let repo = JsonFileRepository::open(path)?;
        Ok(Self::from_shared(Arc::new(repo)))
    }
}

#[async_trait]
impl SubjectRepository for JsonFileRepository {
    async fn upsert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        self.mutate(|state| {
            let code_taken = state
                .subjects
                .values()
                .any(|s| s.code() == subject.code() && s.id() != subject.id());
            if code_taken {
                return Err(StorageError::Conflict);
            }
            state.subjects.insert(subject.id(), subject.clone());
            Ok(())
        })
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
impl AttemptRepository for JsonFileRepository {
    async fn append_attempt(&self, attempt: &NewAttempt) -> Result<QuestionAttempt, StorageError> {
        self.mutate(|state| Ok(state.append_attempt(attempt)))
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
        self.mutate(|state| Ok(state.import_attempt(attempt)))
    }
}

#[async_trait]
impl ProgressRepository for JsonFileRepository {
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
impl AttemptPersistence for JsonFileRepository {
    async fn record_attempt(
        &self,
        attempt: &NewAttempt,
    ) -> Result<(QuestionAttempt, DailyProgressRow), StorageError> {
        self.mutate(|state| {
            let stored = state.append_attempt(attempt);
            let row = state.refresh_day(stored.user_id(), stored.day());
            Ok((stored, row))
        })
    }

    async fn refresh_day(
        &self,
        user_id: UserId,
        day: NaiveDate,
    ) -> Result<DailyProgressRow, StorageError> {
        self.mutate(|state| Ok(state.refresh_day(user_id, day)))
    }
}

#[async_trait]
impl SettingsRepository for JsonFileRepository {
    async fn get_settings(&self, user_id: UserId) -> Result<Option<UserSettings>, StorageError> {
        let state = self.lock()?;
        Ok(state.settings.get(&user_id).cloned())
    }

    async fn save_settings(
        &self,
        user_id: UserId,
        settings: &UserSettings,
    ) -> Result<(), StorageError> {
        self.mutate(|state| {
            state.settings.insert(user_id, settings.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl UserRepository for JsonFileRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let state = self.lock()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        self.mutate(|state| {
            let username_taken = state
                .users
                .values()
                .any(|u| u.username() == user.username() && u.id() != user.id());
            if username_taken {
                return Err(StorageError::Conflict);
            }
            state.users.insert(user.id(), user.clone());
            Ok(())
        })
    }
}
