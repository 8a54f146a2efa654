//! Activity streak derivation.
//!
//! A streak counts consecutive calendar days with at least one qualifying
//! activity, not the number of events. Multiple events on the same day
//! leave the streak unchanged.

use chrono::NaiveDate;

/// Result of advancing a streak for one activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: i32,
    pub longest: i32,
}

/// Advance a streak given the previous activity date and today's date.
///
/// Rules:
/// - a zero streak (first activity or prior reset) always starts at 1
/// - same calendar day leaves the streak unchanged
/// - the day after the last activity increments it
/// - a gap of more than one day resets to 1 (a fresh run starts today)
/// - a date before the last activity (clock skew, out-of-order event) is
///   treated as same-day; the streak never decrements
pub fn advance_streak(
    last_active: Option<NaiveDate>,
    today: NaiveDate,
    current_streak: i32,
    longest_streak: i32,
) -> StreakUpdate {
    let streak = match last_active {
        _ if current_streak <= 0 => 1,
        None => 1,
        Some(last) => match (today - last).num_days() {
            0 => current_streak,
            1 => current_streak + 1,
            d if d > 1 => 1,
            _ => current_streak,
        },
    };

    StreakUpdate {
        streak,
        longest: longest_streak.max(streak),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_activity_starts_at_one() {
        let update = advance_streak(None, date(2024, 3, 10), 0, 0);
        assert_eq!(update, StreakUpdate { streak: 1, longest: 1 });
    }

    #[test]
    fn test_zero_streak_restarts_even_with_history() {
        let update = advance_streak(Some(date(2024, 3, 1)), date(2024, 3, 10), 0, 7);
        assert_eq!(update, StreakUpdate { streak: 1, longest: 7 });
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let last = date(2024, 3, 10);
        let first = advance_streak(Some(last), last, 3, 5);
        let second = advance_streak(Some(last), last, first.streak, first.longest);
        assert_eq!(first, StreakUpdate { streak: 3, longest: 5 });
        assert_eq!(second, first);
    }

    #[test]
    fn test_consecutive_day_increments() {
        let update = advance_streak(Some(date(2024, 3, 10)), date(2024, 3, 11), 3, 5);
        assert_eq!(update, StreakUpdate { streak: 4, longest: 5 });
    }

    #[test]
    fn test_gap_resets_to_one() {
        let update = advance_streak(Some(date(2024, 3, 10)), date(2024, 3, 13), 3, 5);
        assert_eq!(update, StreakUpdate { streak: 1, longest: 5 });
    }

    #[test]
    fn test_clock_skew_never_decrements() {
        let update = advance_streak(Some(date(2024, 3, 10)), date(2024, 3, 9), 3, 5);
        assert_eq!(update, StreakUpdate { streak: 3, longest: 5 });
    }

    #[test]
    fn test_longest_follows_new_record() {
        let update = advance_streak(Some(date(2024, 3, 10)), date(2024, 3, 11), 5, 5);
        assert_eq!(update, StreakUpdate { streak: 6, longest: 6 });
    }

    #[test]
    fn test_month_boundary() {
        let update = advance_streak(Some(date(2024, 2, 29)), date(2024, 3, 1), 10, 10);
        assert_eq!(update, StreakUpdate { streak: 11, longest: 11 });
    }
}
