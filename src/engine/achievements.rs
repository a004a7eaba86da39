use crate::engine::progression::UserProgression;
use crate::engine::skill_tree::Requirement;
use crate::engine::streak::SessionStats;

#[derive(Debug, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub requirement: Requirement,
}

pub const ALL_ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_workout",
        name: "First Workout",
        requirement: Requirement::TotalSessions(1),
    },
    Achievement {
        id: "seven_day_streak",
        name: "7 Day Streak",
        requirement: Requirement::CurrentStreak(7),
    },
    Achievement {
        id: "level_five",
        name: "Level 5",
        requirement: Requirement::Level(5),
    },
    Achievement {
        id: "fifty_sessions",
        name: "50 Sessions",
        requirement: Requirement::TotalSessions(50),
    },
];

/// Achievements currently held. These are derived, never stored, so a
/// streak achievement disappears again when the streak breaks.
pub fn earned(progression: &UserProgression, stats: &SessionStats) -> Vec<&'static Achievement> {
    ALL_ACHIEVEMENTS
        .iter()
        .filter(|a| a.requirement.is_met(progression, stats))
        .collect()
}

pub fn newly_earned(
    before: (&UserProgression, &SessionStats),
    after: (&UserProgression, &SessionStats),
) -> Vec<&'static Achievement> {
    let held = earned(before.0, before.1);
    earned(after.0, after.1)
        .into_iter()
        .filter(|a| !held.contains(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progression::apply_xp;

    #[test]
    fn test_nothing_earned_initially() {
        assert!(earned(&UserProgression::default(), &SessionStats::default()).is_empty());
    }

    #[test]
    fn test_first_workout_is_newly_earned() {
        let p = UserProgression::default();
        let before = SessionStats::default();
        let after = SessionStats {
            total_sessions: 1,
            current_streak: 1,
            ..Default::default()
        };
        let new: Vec<_> = newly_earned((&p, &before), (&p, &after))
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(new, vec!["first_workout"]);
    }

    #[test]
    fn test_level_and_streak_achievements() {
        let p = apply_xp(&UserProgression::default(), 1200).unwrap().progression;
        assert!(p.level() >= 5);
        let stats = SessionStats {
            total_sessions: 60,
            current_streak: 7,
            ..Default::default()
        };
        let ids: Vec<_> = earned(&p, &stats).iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec!["first_workout", "seven_day_streak", "level_five", "fifty_sessions"]
        );
        // already held, so nothing new
        assert!(newly_earned((&p, &stats), (&p, &stats)).is_empty());
    }
}
