use crate::engine::progression::UserProgression;
use crate::engine::streak::SessionStats;

const GAUGE_MAX: u32 = 100;

/// Character-sheet gauges, each 0-100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterAttributes {
    pub strength: u32,
    pub endurance: u32,
    pub consistency: u32,
    pub growth: u32,
}

impl CharacterAttributes {
    pub fn derive(progression: &UserProgression, stats: &SessionStats) -> Self {
        let gauge = |v: u64| v.min(GAUGE_MAX as u64) as u32;
        Self {
            strength: gauge(stats.total_sessions as u64 * 5),
            endurance: gauge(stats.current_streak as u64 * 10),
            consistency: gauge(stats.sessions_this_week as u64 * 20),
            growth: gauge(progression.xp() / 10),
        }
    }

    pub fn named(&self) -> [(&'static str, u32); 4] {
        [
            ("Strength", self.strength),
            ("Endurance", self.endurance),
            ("Consistency", self.consistency),
            ("Growth", self.growth),
        ]
    }
}
