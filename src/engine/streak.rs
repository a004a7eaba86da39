use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::workout::WorkoutSession;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub sessions_this_week: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_sessions: u32,
    pub total_xp_earned: u64,
    pub last_workout_date: Option<NaiveDate>,
    #[serde(default)]
    pub weekly_volume_kg: f64,
}

impl SessionStats {
    /// Zero the weekly counters. Only the weekly rollover calls this.
    pub fn reset_week(&mut self) {
        self.sessions_this_week = 0;
        self.weekly_volume_kg = 0.0;
    }
}

/// Fold one completed session into the aggregate statistics.
///
/// A second session on the same day counts toward the totals but not the
/// streak. A session dated before the last workout (a backfill) also leaves
/// the streak and `last_workout_date` alone: the date only ever moves
/// forward, so it is the latest day trained rather than the date of whichever
/// session was submitted last.
pub fn apply_session(stats: &SessionStats, session: &WorkoutSession) -> SessionStats {
    let mut next = stats.clone();
    next.total_sessions = next.total_sessions.saturating_add(1);
    next.total_xp_earned = next.total_xp_earned.saturating_add(session.xp_gained());
    next.sessions_this_week = next.sessions_this_week.saturating_add(1);
    next.weekly_volume_kg += session.total_volume();

    let date = session.date();
    match stats.last_workout_date {
        Some(last) if date <= last => {}
        Some(last) if last.succ_opt() == Some(date) => {
            next.current_streak = next.current_streak.saturating_add(1);
        }
        _ => next.current_streak = 1,
    }
    next.longest_streak = next.longest_streak.max(next.current_streak);
    next.last_workout_date = Some(stats.last_workout_date.map_or(date, |last| last.max(date)));
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::workout::{LoggedExercise, LoggedSet};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn session_on(d: u32) -> WorkoutSession {
        WorkoutSession::complete(
            day(d),
            vec![LoggedExercise::new(
                "squat",
                vec![LoggedSet::new(5, 100.0, Some(7))],
            )],
        )
        .unwrap()
    }

    fn replay(days: &[u32]) -> SessionStats {
        days.iter().fold(SessionStats::default(), |stats, &d| {
            apply_session(&stats, &session_on(d))
        })
    }

    #[test]
    fn test_first_session_starts_streak() {
        let stats = replay(&[3]);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.sessions_this_week, 1);
        assert_eq!(stats.last_workout_date, Some(day(3)));
        assert_eq!(stats.total_xp_earned, session_on(3).xp_gained());
        assert!((stats.weekly_volume_kg - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_consecutive_days_then_gap() {
        let stats = replay(&[1, 2, 3]);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);

        let stats = apply_session(&stats, &session_on(5));
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_sessions, 4);
    }

    #[test]
    fn test_same_day_counts_totals_not_streak() {
        let once = replay(&[1, 2]);
        let twice = apply_session(&once, &session_on(2));
        assert_eq!(twice.current_streak, 2);
        assert_eq!(twice.longest_streak, 2);
        assert_eq!(twice.total_sessions, 3);
        assert_eq!(twice.sessions_this_week, 3);
        assert_eq!(
            twice.total_xp_earned,
            once.total_xp_earned + session_on(2).xp_gained()
        );
    }

    #[test]
    fn test_backfilled_session_keeps_streak_and_date() {
        let stats = replay(&[10, 11]);
        let stats = apply_session(&stats, &session_on(4));
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.last_workout_date, Some(day(11)));
        assert_eq!(stats.total_sessions, 3);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let jan31 = apply_session(&SessionStats::default(), &session_on(31));
        let feb1 = WorkoutSession::complete(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), vec![])
            .unwrap();
        let stats = apply_session(&jan31, &feb1);
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn test_longest_streak_survives_reset() {
        let stats = replay(&[1, 2, 3, 4, 10, 11]);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn test_reset_week_only_touches_weekly_counters() {
        let mut stats = replay(&[1, 2]);
        stats.reset_week();
        assert_eq!(stats.sessions_this_week, 0);
        assert_eq!(stats.weekly_volume_kg, 0.0);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.current_streak, 2);
    }
}
