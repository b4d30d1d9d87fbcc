use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::ids::{AttemptId, SubjectId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("questionsAttempted must be at least 1")]
    NoQuestions,

    #[error("correctAnswers ({correct}) cannot exceed questionsAttempted ({attempted})")]
    CorrectExceedsAttempted { correct: u32, attempted: u32 },

    #[error("timeSpent must be at least 1 minute")]
    NoTimeSpent,

    #[error("topic cannot be empty")]
    EmptyTopic,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Question difficulty, one of the three fixed levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All levels, in display order. Difficulty rollups iterate this so the
    /// result is total even when a level has no attempts.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Parses the canonical level name.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::UnknownDifficulty` for anything other than
    /// `Easy`, `Medium`, or `Hard`.
    pub fn parse(s: &str) -> Result<Self, AttemptError> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(AttemptError::UnknownDifficulty(other.to_owned())),
        }
    }
}

//
// ─── DRAFT / VALIDATED ATTEMPT ─────────────────────────────────────────────────
//

/// Caller-supplied fields for logging a practice attempt.
///
/// A draft is untrusted input; `validate` produces a `NewAttempt` that the
/// store can persist. Validation never touches storage.
#[derive(Debug, Clone)]
pub struct AttemptDraft {
    pub subject_id: SubjectId,
    pub topic: String,
    pub questions_attempted: u32,
    pub correct_answers: u32,
    pub difficulty: Difficulty,
    pub time_spent_min: u32,
}

impl AttemptDraft {
    /// Validate the draft into a persistable attempt.
    ///
    /// `correct <= attempted` is enforced here, at the model boundary, so
    /// the invariant holds regardless of which caller logs the attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` naming the offending field.
    pub fn validate(
        self,
        user_id: UserId,
        attempted_at: DateTime<Utc>,
    ) -> Result<NewAttempt, AttemptError> {
        if self.questions_attempted == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if self.correct_answers > self.questions_attempted {
            return Err(AttemptError::CorrectExceedsAttempted {
                correct: self.correct_answers,
                attempted: self.questions_attempted,
            });
        }
        if self.time_spent_min == 0 {
            return Err(AttemptError::NoTimeSpent);
        }
        let topic = self.topic.trim().to_owned();
        if topic.is_empty() {
            return Err(AttemptError::EmptyTopic);
        }

        Ok(NewAttempt {
            user_id,
            subject_id: self.subject_id,
            topic,
            questions_attempted: self.questions_attempted,
            correct_answers: self.correct_answers,
            difficulty: self.difficulty,
            time_spent_min: self.time_spent_min,
            attempted_at,
        })
    }
}

/// A validated attempt that has not been assigned an id yet.
///
/// The store assigns the id on insert and returns the full
/// `QuestionAttempt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    user_id: UserId,
    subject_id: SubjectId,
    topic: String,
    questions_attempted: u32,
    correct_answers: u32,
    difficulty: Difficulty,
    time_spent_min: u32,
    attempted_at: DateTime<Utc>,
}

impl NewAttempt {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn questions_attempted(&self) -> u32 {
        self.questions_attempted
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_spent_min(&self) -> u32 {
        self.time_spent_min
    }

    #[must_use]
    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }

    /// Attach the store-assigned id, producing the immutable record.
    #[must_use]
    pub fn with_id(self, id: AttemptId) -> QuestionAttempt {
        QuestionAttempt {
            id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            topic: self.topic,
            questions_attempted: self.questions_attempted,
            correct_answers: self.correct_answers,
            difficulty: self.difficulty,
            time_spent_min: self.time_spent_min,
            attempted_at: self.attempted_at,
        }
    }
}

//
// ─── QUESTION ATTEMPT ──────────────────────────────────────────────────────────
//

/// An append-only practice-session fact.
///
/// Attempts are never updated or deleted; daily aggregates are recomputed
/// from them in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    id: AttemptId,
    user_id: UserId,
    subject_id: SubjectId,
    topic: String,
    questions_attempted: u32,
    correct_answers: u32,
    difficulty: Difficulty,
    time_spent_min: u32,
    attempted_at: DateTime<Utc>,
}

impl QuestionAttempt {
    /// Rebuild an attempt from persisted fields, re-checking the field
    /// constraints so a tampered or corrupt record cannot re-enter the
    /// domain.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if any field constraint is violated.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AttemptId,
        user_id: UserId,
        subject_id: SubjectId,
        topic: impl Into<String>,
        questions_attempted: u32,
        correct_answers: u32,
        difficulty: Difficulty,
        time_spent_min: u32,
        attempted_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let draft = AttemptDraft {
            subject_id,
            topic: topic.into(),
            questions_attempted,
            correct_answers,
            difficulty,
            time_spent_min,
        };
        Ok(draft.validate(user_id, attempted_at)?.with_id(id))
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn questions_attempted(&self) -> u32 {
        self.questions_attempted
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn time_spent_min(&self) -> u32 {
        self.time_spent_min
    }

    #[must_use]
    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }

    /// The UTC calendar day this attempt counts toward.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.attempted_at.date_naive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft() -> AttemptDraft {
        AttemptDraft {
            subject_id: SubjectId::new(2),
            topic: "Network Theorems".into(),
            questions_attempted: 10,
            correct_answers: 8,
            difficulty: Difficulty::Medium,
            time_spent_min: 20,
        }
    }

    #[test]
    fn validate_happy_path_assigns_fields() {
        let attempt = draft()
            .validate(UserId::new(1), fixed_now())
            .unwrap()
            .with_id(AttemptId::new(7));

        assert_eq!(attempt.id(), AttemptId::new(7));
        assert_eq!(attempt.user_id(), UserId::new(1));
        assert_eq!(attempt.questions_attempted(), 10);
        assert_eq!(attempt.correct_answers(), 8);
        assert_eq!(attempt.day(), fixed_now().date_naive());
    }

    #[test]
    fn validate_rejects_zero_questions() {
        let mut d = draft();
        d.questions_attempted = 0;
        d.correct_answers = 0;
        let err = d.validate(UserId::new(1), fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::NoQuestions);
    }

    #[test]
    fn validate_rejects_correct_above_attempted() {
        let mut d = draft();
        d.correct_answers = 11;
        let err = d.validate(UserId::new(1), fixed_now()).unwrap_err();
        assert_eq!(
            err,
            AttemptError::CorrectExceedsAttempted {
                correct: 11,
                attempted: 10
            }
        );
    }

    #[test]
    fn validate_rejects_zero_time_and_blank_topic() {
        let mut d = draft();
        d.time_spent_min = 0;
        let err = d.validate(UserId::new(1), fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::NoTimeSpent);

        let mut d = draft();
        d.topic = "   ".into();
        let err = d.validate(UserId::new(1), fixed_now()).unwrap_err();
        assert_eq!(err, AttemptError::EmptyTopic);
    }

    #[test]
    fn validate_trims_topic() {
        let attempt = {
            let mut d = draft();
            d.topic = "  Transients  ".into();
            d.validate(UserId::new(1), fixed_now()).unwrap()
        };
        assert_eq!(attempt.topic(), "Transients");
    }

    #[test]
    fn difficulty_parse_roundtrip() {
        for level in Difficulty::ALL {
            assert_eq!(Difficulty::parse(level.as_str()).unwrap(), level);
        }
        let err = Difficulty::parse("Extreme").unwrap_err();
        assert_eq!(err, AttemptError::UnknownDifficulty("Extreme".into()));
    }

    #[test]
    fn from_persisted_recheck_rejects_corrupt_record() {
        let err = QuestionAttempt::from_persisted(
            AttemptId::new(1),
            UserId::new(1),
            SubjectId::new(2),
            "Transients",
            5,
            9,
            Difficulty::Easy,
            10,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, AttemptError::CorrectExceedsAttempted { .. }));
    }
}
