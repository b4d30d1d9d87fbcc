use chrono::NaiveDate;

use crate::model::attempt::QuestionAttempt;
use crate::model::ids::UserId;

/// The fixed daily question target.
///
/// Shared by `DailyProgress::from_attempts` (target/streak qualification)
/// and `target_percent` (progress displays); there is deliberately no
/// second copy of this number anywhere in the workspace.
pub const DAILY_TARGET: u32 = 30;

/// Derived per-day aggregate for one user.
///
/// A `DailyProgress` is never edited in place; it is recomputed from the
/// full set of same-day attempts every time one is logged, so the totals
/// always equal the sums over the attempt log. Storage keys it by
/// (user, day) — at most one record per pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyProgress {
    user_id: UserId,
    day: NaiveDate,
    total_questions: u32,
    total_correct: u32,
    total_time_min: u32,
    target_achieved: bool,
    streak_day: bool,
}

impl DailyProgress {
    /// Recompute the aggregate for (`user_id`, `day`) from scratch.
    ///
    /// Attempts belonging to other users or other days are ignored rather
    /// than rejected, so callers can pass an unfiltered slice. The result
    /// is idempotent and order-independent: any permutation of the same
    /// attempts produces the same record.
    #[must_use]
    pub fn from_attempts(user_id: UserId, day: NaiveDate, attempts: &[QuestionAttempt]) -> Self {
        let mut total_questions: u32 = 0;
        let mut total_correct: u32 = 0;
        let mut total_time_min: u32 = 0;

        for attempt in attempts {
            if attempt.user_id() != user_id || attempt.day() != day {
                continue;
            }
            total_questions = total_questions.saturating_add(attempt.questions_attempted());
            total_correct = total_correct.saturating_add(attempt.correct_answers());
            total_time_min = total_time_min.saturating_add(attempt.time_spent_min());
        }

        let target_achieved = total_questions >= DAILY_TARGET;

        Self {
            user_id,
            day,
            total_questions,
            total_correct,
            total_time_min,
            target_achieved,
            // Currently identical to target_achieved; kept as its own field
            // because streak qualification may diverge from the raw target.
            streak_day: target_achieved,
        }
    }

    /// Rebuild a record from persisted fields without resumming.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        day: NaiveDate,
        total_questions: u32,
        total_correct: u32,
        total_time_min: u32,
        target_achieved: bool,
        streak_day: bool,
    ) -> Self {
        Self {
            user_id,
            day,
            total_questions,
            total_correct,
            total_time_min,
            target_achieved,
            streak_day,
        }
    }

    // Accessors
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_time_min(&self) -> u32 {
        self.total_time_min
    }

    #[must_use]
    pub fn target_achieved(&self) -> bool {
        self.target_achieved
    }

    /// Whether this day qualifies for the streak.
    #[must_use]
    pub fn streak_day(&self) -> bool {
        self.streak_day
    }

    /// Progress toward the daily target as a percentage, capped at 100.
    #[must_use]
    pub fn target_percent(&self) -> u32 {
        (self.total_questions * 100 / DAILY_TARGET).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attempt::{AttemptDraft, Difficulty};
    use crate::model::ids::{AttemptId, SubjectId};
    use crate::time::fixed_now;

    fn attempt(id: u64, questions: u32, correct: u32, time: u32) -> QuestionAttempt {
        AttemptDraft {
            subject_id: SubjectId::new(2),
            topic: "Network Theorems".into(),
            questions_attempted: questions,
            correct_answers: correct,
            difficulty: Difficulty::Medium,
            time_spent_min: time,
        }
        .validate(UserId::new(1), fixed_now())
        .unwrap()
        .with_id(AttemptId::new(id))
    }

    #[test]
    fn single_attempt_below_target() {
        let day = fixed_now().date_naive();
        let attempts = [attempt(1, 10, 8, 20)];
        let progress = DailyProgress::from_attempts(UserId::new(1), day, &attempts);

        assert_eq!(progress.total_questions(), 10);
        assert_eq!(progress.total_correct(), 8);
        assert_eq!(progress.total_time_min(), 20);
        assert!(!progress.target_achieved());
        assert!(!progress.streak_day());
        assert_eq!(progress.target_percent(), 33);
    }

    #[test]
    fn three_attempts_reach_target() {
        let day = fixed_now().date_naive();
        let attempts = [attempt(1, 12, 9, 25), attempt(2, 13, 10, 30), attempt(3, 10, 7, 15)];
        let progress = DailyProgress::from_attempts(UserId::new(1), day, &attempts);

        assert_eq!(progress.total_questions(), 35);
        assert!(progress.target_achieved());
        assert!(progress.streak_day());
        assert_eq!(progress.target_percent(), 100);
    }

    #[test]
    fn recompute_is_order_independent() {
        let day = fixed_now().date_naive();
        let forward = [attempt(1, 12, 9, 25), attempt(2, 13, 10, 30)];
        let reversed = [attempt(2, 13, 10, 30), attempt(1, 12, 9, 25)];

        assert_eq!(
            DailyProgress::from_attempts(UserId::new(1), day, &forward),
            DailyProgress::from_attempts(UserId::new(1), day, &reversed),
        );
    }

    #[test]
    fn foreign_attempts_are_ignored() {
        let day = fixed_now().date_naive();
        let other_day = day + chrono::Duration::days(1);
        let mut attempts = vec![attempt(1, 10, 8, 20)];
        // Same user, different day.
        attempts.push(
            AttemptDraft {
                subject_id: SubjectId::new(2),
                topic: "Transients".into(),
                questions_attempted: 40,
                correct_answers: 30,
                difficulty: Difficulty::Hard,
                time_spent_min: 60,
            }
            .validate(UserId::new(1), fixed_now() + chrono::Duration::days(1))
            .unwrap()
            .with_id(AttemptId::new(2)),
        );

        let progress = DailyProgress::from_attempts(UserId::new(1), day, &attempts);
        assert_eq!(progress.total_questions(), 10);

        let next = DailyProgress::from_attempts(UserId::new(1), other_day, &attempts);
        assert_eq!(next.total_questions(), 40);
        assert!(next.target_achieved());
    }

    #[test]
    fn empty_day_is_all_zeroes() {
        let day = fixed_now().date_naive();
        let progress = DailyProgress::from_attempts(UserId::new(1), day, &[]);
        assert_eq!(progress.total_questions(), 0);
        assert_eq!(progress.target_percent(), 0);
        assert!(!progress.streak_day());
    }
}
