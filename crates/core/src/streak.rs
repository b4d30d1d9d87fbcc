//! Streak computation over daily progress records.
//!
//! The streak is the number of consecutive qualifying calendar days ending
//! at "today". The walk is strict and gap-aware: a missing day breaks the
//! streak exactly like a non-qualifying one, and a streak that does not
//! include today is worth 0.

use chrono::{Duration, NaiveDate};

use crate::model::DailyProgress;

/// Count consecutive streak days ending at `today`.
///
/// `records` may arrive in any order and may contain non-qualifying days;
/// duplicates per day are not expected (storage keys progress by day) but a
/// later duplicate would simply overwrite the earlier one in the lookup.
#[must_use]
pub fn current_streak(today: NaiveDate, records: &[DailyProgress]) -> u32 {
    let qualifying: std::collections::HashSet<NaiveDate> = records
        .iter()
        .filter(|record| record.streak_day())
        .map(DailyProgress::day)
        .collect();

    let mut streak = 0;
    let mut day = today;
    while qualifying.contains(&day) {
        streak += 1;
        match day.checked_sub_signed(Duration::days(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyProgress, UserId};

    fn record(day: NaiveDate, streak_day: bool) -> DailyProgress {
        let questions = if streak_day { 35 } else { 10 };
        DailyProgress::from_persisted(
            UserId::new(1),
            day,
            questions,
            questions / 2,
            40,
            streak_day,
            streak_day,
        )
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(current_streak(day("2024-03-10"), &[]), 0);
    }

    #[test]
    fn today_missing_is_zero_even_with_earlier_streak() {
        let records = [record(day("2024-03-08"), true), record(day("2024-03-09"), true)];
        assert_eq!(current_streak(day("2024-03-10"), &records), 0);
    }

    #[test]
    fn today_not_qualifying_is_zero() {
        let records = [record(day("2024-03-10"), false), record(day("2024-03-09"), true)];
        assert_eq!(current_streak(day("2024-03-10"), &records), 0);
    }

    #[test]
    fn counts_consecutive_days_ending_today() {
        let records = [
            record(day("2024-03-10"), true),
            record(day("2024-03-09"), true),
            record(day("2024-03-08"), true),
        ];
        assert_eq!(current_streak(day("2024-03-10"), &records), 3);
    }

    #[test]
    fn gap_day_breaks_the_walk() {
        // Qualifying today and yesterday, a gap on the 8th, qualifying on
        // the 7th: the older day must not be counted.
        let records = [
            record(day("2024-03-10"), true),
            record(day("2024-03-09"), true),
            record(day("2024-03-07"), true),
        ];
        assert_eq!(current_streak(day("2024-03-10"), &records), 2);
    }

    #[test]
    fn non_qualifying_day_breaks_like_a_gap() {
        let records = [
            record(day("2024-03-10"), true),
            record(day("2024-03-09"), false),
            record(day("2024-03-08"), true),
        ];
        assert_eq!(current_streak(day("2024-03-10"), &records), 1);
    }

    #[test]
    fn record_order_does_not_matter() {
        let sorted = [
            record(day("2024-03-10"), true),
            record(day("2024-03-09"), true),
        ];
        let shuffled = [
            record(day("2024-03-09"), true),
            record(day("2024-03-10"), true),
        ];
        assert_eq!(
            current_streak(day("2024-03-10"), &sorted),
            current_streak(day("2024-03-10"), &shuffled),
        );
    }
}
