use chrono::NaiveDate;
use proptest::prelude::*;

use ironquest::engine::leveling::{cumulative_threshold, level_for_xp};
use ironquest::engine::progression::{Role, UserProgression, apply_xp};
use ironquest::engine::streak::{SessionStats, apply_session};
use ironquest::engine::xp::{SESSION_COMPLETION_BONUS, compute_session_xp, compute_set_xp};
use ironquest::session::workout::{LoggedExercise, LoggedSet, WorkoutSession};

fn arb_set() -> impl Strategy<Value = LoggedSet> {
    (1u32..50, 0.0f64..400.0, proptest::option::of(1u8..=10))
        .prop_map(|(reps, weight, rpe)| LoggedSet::new(reps, weight, rpe))
}

fn arb_exercise() -> impl Strategy<Value = LoggedExercise> {
    proptest::collection::vec(arb_set(), 1..6)
        .prop_map(|sets| LoggedExercise::new("lift", sets))
}

proptest! {
    #[test]
    fn heavier_sets_never_earn_less(
        reps in 1u32..50,
        weight in 0.0f64..400.0,
        extra in 0.0f64..100.0,
        rpe in proptest::option::of(1u8..=10),
    ) {
        let light = compute_set_xp(&LoggedSet::new(reps, weight, rpe)).unwrap();
        let heavy = compute_set_xp(&LoggedSet::new(reps, weight + extra, rpe)).unwrap();
        prop_assert!(heavy >= light);
    }

    #[test]
    fn more_reps_never_earn_less(reps in 1u32..100, extra in 0u32..20, weight in 0.0f64..400.0) {
        let fewer = compute_set_xp(&LoggedSet::new(reps, weight, None)).unwrap();
        let more = compute_set_xp(&LoggedSet::new(reps + extra, weight, None)).unwrap();
        prop_assert!(more >= fewer);
    }

    #[test]
    fn session_xp_includes_completion_bonus(exercises in proptest::collection::vec(arb_exercise(), 0..5)) {
        let xp = compute_session_xp(&exercises).unwrap();
        prop_assert!(xp >= SESSION_COMPLETION_BONUS);
    }

    #[test]
    fn thresholds_strictly_increase(level in 1u32..5000) {
        prop_assert!(cumulative_threshold(level) < cumulative_threshold(level + 1));
    }

    #[test]
    fn level_matches_xp_after_any_gains(gains in proptest::collection::vec(0i64..5000, 0..40)) {
        let mut progression = UserProgression::new(Role::Arbiter);
        let mut total_level_ups = 0;
        for gain in gains {
            let result = apply_xp(&progression, gain).unwrap();
            prop_assert!(result.progression.level() >= progression.level());
            total_level_ups += result.level_ups;
            progression = result.progression;
            prop_assert!(progression.is_consistent());
        }
        prop_assert_eq!(progression.level(), level_for_xp(progression.xp()));
        prop_assert_eq!(progression.skill_points(), total_level_ups);
        prop_assert_eq!(progression.level(), 1 + total_level_ups);
    }

    #[test]
    fn one_big_gain_equals_many_small_ones(amounts in proptest::collection::vec(0i64..2000, 1..20)) {
        let start = UserProgression::new(Role::Warden);
        let total: i64 = amounts.iter().sum();
        let at_once = apply_xp(&start, total).unwrap().progression;
        let mut stepped = start;
        for amount in amounts {
            stepped = apply_xp(&stepped, amount).unwrap().progression;
        }
        prop_assert_eq!(at_once, stepped);
    }

    #[test]
    fn negative_xp_is_rejected(gain in i64::MIN..0) {
        prop_assert!(apply_xp(&UserProgression::default(), gain).is_err());
    }

    #[test]
    fn streak_never_exceeds_longest(offsets in proptest::collection::vec(0i64..4, 1..30)) {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut stats = SessionStats::default();
        let mut date = start;
        for offset in offsets {
            date += chrono::Duration::days(offset);
            let session = WorkoutSession::complete(
                date,
                vec![LoggedExercise::new("row", vec![LoggedSet::new(8, 60.0, Some(7))])],
            )
            .unwrap();
            let next = apply_session(&stats, &session);
            prop_assert!(next.current_streak >= 1);
            prop_assert!(next.current_streak <= next.longest_streak);
            prop_assert!(next.longest_streak >= stats.longest_streak);
            prop_assert_eq!(next.total_sessions, stats.total_sessions + 1);
            stats = next;
        }
        prop_assert_eq!(stats.last_workout_date, Some(date));
    }
}
