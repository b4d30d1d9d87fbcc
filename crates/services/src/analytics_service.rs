use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use storage::repository::{AttemptRepository, ProgressRepository, SubjectRepository};
use tracker_core::model::{Difficulty, QuestionAttempt, SubjectId, UserId};
use tracker_core::streak;
use tracker_core::time::Clock;

use crate::error::AnalyticsError;

//
// ─── READ MODELS ───────────────────────────────────────────────────────────────
//

/// Per-subject rollup. Every catalog subject appears, zero-filled when the
/// user has no attempts in it, so consumers never need an existence check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStat {
    pub subject_id: u64,
    pub name: String,
    pub code: String,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_time_min: u32,
    pub accuracy: u32,
    pub avg_time_min: f64,
}

/// Per-topic rollup within one subject. Declared topics come first in
/// syllabus order (zero-filled); off-catalog topics seen in attempts are
/// appended in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStat {
    pub topic: String,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_time_min: u32,
    pub accuracy: u32,
    pub avg_time_min: f64,
}

/// Per-difficulty rollup; always contains all three levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyStat {
    pub difficulty: &'static str,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_time_min: u32,
    pub accuracy: u32,
    pub avg_time_min: f64,
}

/// One day of the weekly series; `day` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyEntry {
    pub day: NaiveDate,
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_time_min: u32,
    pub target_achieved: bool,
}

/// All-time totals plus the current streak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_questions: u32,
    pub total_correct: u32,
    pub total_time_min: u32,
    pub accuracy: u32,
    pub current_streak: u32,
}

//
// ─── ROLLUP ARITHMETIC ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    questions: u32,
    correct: u32,
    time_min: u32,
}

impl Tally {
    fn add(&mut self, attempt: &QuestionAttempt) {
        self.questions = self.questions.saturating_add(attempt.questions_attempted());
        self.correct = self.correct.saturating_add(attempt.correct_answers());
        self.time_min = self.time_min.saturating_add(attempt.time_spent_min());
    }

    /// `round(100 * correct / questions)`; 0 for an empty tally, never NaN.
    fn accuracy(self) -> u32 {
        if self.questions == 0 {
            return 0;
        }
        let ratio = f64::from(self.correct) * 100.0 / f64::from(self.questions);
        // correct <= questions, so the ratio stays within 0..=100.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = ratio.round() as u32;
        rounded
    }

    /// Average minutes per question, rounded to 1 decimal; 0 when empty.
    fn avg_time(self) -> f64 {
        if self.questions == 0 {
            return 0.0;
        }
        let avg = f64::from(self.time_min) / f64::from(self.questions);
        (avg * 10.0).round() / 10.0
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Read-only analytics façade over the attempt log and daily aggregates.
pub struct AnalyticsService {
    clock: Clock,
    subjects: Arc<dyn SubjectRepository>,
    attempts: Arc<dyn AttemptRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        subjects: Arc<dyn SubjectRepository>,
        attempts: Arc<dyn AttemptRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            subjects,
            attempts,
            progress,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Rollup across all catalog subjects.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn subject_stats(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SubjectStat>, AnalyticsError> {
        let subjects = self.subjects.list_subjects().await?;
        let attempts = self.attempts.all_attempts(user_id).await?;

        let mut by_subject: HashMap<SubjectId, Tally> = HashMap::new();
        for attempt in &attempts {
            by_subject.entry(attempt.subject_id()).or_default().add(attempt);
        }

        Ok(subjects
            .into_iter()
            .map(|subject| {
                let tally = by_subject.get(&subject.id()).copied().unwrap_or_default();
                SubjectStat {
                    subject_id: subject.id().value(),
                    name: subject.name().to_owned(),
                    code: subject.code().to_owned(),
                    total_questions: tally.questions,
                    total_correct: tally.correct,
                    total_time_min: tally.time_min,
                    accuracy: tally.accuracy(),
                    avg_time_min: tally.avg_time(),
                }
            })
            .collect())
    }

    /// Rollup by topic within one subject.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::UnknownSubject` if the subject is not in
    /// the catalog, or `Storage` on repository failures.
    pub async fn topic_stats(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> Result<Vec<TopicStat>, AnalyticsError> {
        let subject = self
            .subjects
            .get_subject(subject_id)
            .await?
            .ok_or(AnalyticsError::UnknownSubject(subject_id))?;
        let attempts = self.attempts.all_attempts(user_id).await?;

        let mut by_topic: HashMap<String, Tally> = HashMap::new();
        // Off-catalog topics are kept (topic is not enforced at the model
        // level) and appended after the declared list.
        let mut extra_topics: Vec<String> = Vec::new();
        for attempt in attempts
            .iter()
            .filter(|a| a.subject_id() == subject_id)
        {
            let topic = attempt.topic().to_owned();
            if !subject.has_topic(&topic) && !extra_topics.contains(&topic) {
                extra_topics.push(topic.clone());
            }
            by_topic.entry(topic).or_default().add(attempt);
        }

        let ordered = subject
            .topics()
            .iter()
            .cloned()
            .chain(extra_topics)
            .map(|topic| {
                let tally = by_topic.get(&topic).copied().unwrap_or_default();
                TopicStat {
                    topic,
                    total_questions: tally.questions,
                    total_correct: tally.correct,
                    total_time_min: tally.time_min,
                    accuracy: tally.accuracy(),
                    avg_time_min: tally.avg_time(),
                }
            })
            .collect();

        Ok(ordered)
    }

    /// Rollup by difficulty within one subject; all three levels always
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::UnknownSubject` if the subject is not in
    /// the catalog, or `Storage` on repository failures.
    pub async fn difficulty_stats(
        &self,
        user_id: UserId,
        subject_id: SubjectId,
    ) -> Result<Vec<DifficultyStat>, AnalyticsError> {
        if self.subjects.get_subject(subject_id).await?.is_none() {
            return Err(AnalyticsError::UnknownSubject(subject_id));
        }
        let attempts = self.attempts.all_attempts(user_id).await?;

        let mut by_level: HashMap<Difficulty, Tally> = HashMap::new();
        for attempt in attempts
            .iter()
            .filter(|a| a.subject_id() == subject_id)
        {
            by_level.entry(attempt.difficulty()).or_default().add(attempt);
        }

        Ok(Difficulty::ALL
            .into_iter()
            .map(|level| {
                let tally = by_level.get(&level).copied().unwrap_or_default();
                DifficultyStat {
                    difficulty: level.as_str(),
                    total_questions: tally.questions,
                    total_correct: tally.correct,
                    total_time_min: tally.time_min,
                    accuracy: tally.accuracy(),
                    avg_time_min: tally.avg_time(),
                }
            })
            .collect())
    }

    /// The last 7 calendar days of daily progress, ascending by day.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn weekly_stats(&self, user_id: UserId) -> Result<Vec<WeeklyEntry>, AnalyticsError> {
        let from = self.clock.today() - Duration::days(6);
        let rows = self.progress.progress_since(user_id, from).await?;

        Ok(rows
            .into_iter()
            .map(|row| WeeklyEntry {
                day: row.progress.day(),
                total_questions: row.progress.total_questions(),
                total_correct: row.progress.total_correct(),
                total_time_min: row.progress.total_time_min(),
                target_achieved: row.progress.target_achieved(),
            })
            .collect())
    }

    /// All-time totals plus the current strict streak.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` on repository failures.
    pub async fn user_stats(&self, user_id: UserId) -> Result<UserStats, AnalyticsError> {
        let attempts = self.attempts.all_attempts(user_id).await?;
        let mut tally = Tally::default();
        for attempt in &attempts {
            tally.add(attempt);
        }

        let rows = self.progress.recent_progress(user_id, u32::MAX).await?;
        let records: Vec<_> = rows.into_iter().map(|row| row.progress).collect();
        let current_streak = streak::current_streak(self.clock.today(), &records);

        Ok(UserStats {
            total_questions: tally.questions,
            total_correct: tally.correct,
            total_time_min: tally.time_min,
            accuracy: tally.accuracy(),
            current_streak,
        })
    }
}
