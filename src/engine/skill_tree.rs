use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::error::ProgressionError;
use crate::engine::progression::{Role, UserProgression};
use crate::engine::streak::SessionStats;

// --- Requirements ---

/// A threshold over progression counters. Skills and achievements both gate
/// on these, so new entries are catalog data rather than new branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    TotalSessions(u32),
    Level(u32),
    TotalXp(u64),
    CurrentStreak(u32),
}

impl Requirement {
    pub fn is_met(&self, progression: &UserProgression, stats: &SessionStats) -> bool {
        match *self {
            Requirement::TotalSessions(n) => stats.total_sessions >= n,
            Requirement::Level(n) => progression.level() >= n,
            Requirement::TotalXp(n) => progression.xp() >= n,
            Requirement::CurrentStreak(n) => stats.current_streak >= n,
        }
    }
}

// --- Skill Status ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillStatus {
    Locked,
    Eligible,
    Unlocked,
}

// --- Static Definitions ---

#[derive(Debug, PartialEq, Eq)]
pub struct SkillDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub criteria: &'static str,
    pub role_affinity: Option<Role>,
    pub requirement: Requirement,
}

impl SkillDefinition {
    pub fn is_eligible(&self, progression: &UserProgression, stats: &SessionStats) -> bool {
        self.requirement.is_met(progression, stats)
    }
}

/// A versioned list of skills. Changing it is a release, not a runtime edit.
pub struct SkillCatalog {
    pub version: u32,
    pub skills: &'static [SkillDefinition],
}

const BUILTIN_SKILLS: &[SkillDefinition] = &[
    SkillDefinition {
        id: "blade_instinct",
        name: "Blade Instinct",
        description: "+5% XP on HIIT sessions. Unlocks Assassin Cloak cosmetic.",
        criteria: "Complete 10 sessions",
        role_affinity: Some(Role::Assassin),
        requirement: Requirement::TotalSessions(10),
    },
    SkillDefinition {
        id: "iron_core",
        name: "Iron Core",
        description: "Unlock heavy program templates and Iron Aura cosmetic.",
        criteria: "Complete 8 sessions",
        role_affinity: Some(Role::Warden),
        requirement: Requirement::TotalSessions(8),
    },
    SkillDefinition {
        id: "second_wind",
        name: "Second Wind",
        description: "One-time revive to preserve streak.",
        criteria: "Complete 15 sessions",
        role_affinity: Some(Role::Arbiter),
        requirement: Requirement::TotalSessions(15),
    },
    SkillDefinition {
        id: "echo_shadows",
        name: "Echo of Shadows",
        description: "Unlock micro-program templates with XP bonus.",
        criteria: "Accumulate 10,000 XP",
        role_affinity: Some(Role::Shadowmancer),
        requirement: Requirement::TotalXp(10_000),
    },
    SkillDefinition {
        id: "quick_recovery",
        name: "Quick Recovery",
        description: "Reduce rest timers by 25%.",
        criteria: "Complete 25 workouts",
        role_affinity: None,
        requirement: Requirement::TotalSessions(25),
    },
    SkillDefinition {
        id: "xp_boost",
        name: "XP Multiplier",
        description: "+10% XP on all exercises.",
        criteria: "Reach Level 10",
        role_affinity: None,
        requirement: Requirement::Level(10),
    },
];

pub static BUILTIN_CATALOG: SkillCatalog = SkillCatalog {
    version: 1,
    skills: BUILTIN_SKILLS,
};

impl SkillCatalog {
    pub fn builtin() -> &'static SkillCatalog {
        &BUILTIN_CATALOG
    }

    pub fn get(&self, id: &str) -> Option<&'static SkillDefinition> {
        self.skills.iter().find(|s| s.id == id)
    }
}

// --- Persisted Progress ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillUnlockRecord {
    pub user_id: String,
    pub skill_id: String,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Unlock records keyed by skill id. Records are never removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTreeProgress {
    pub unlocks: BTreeMap<String, SkillUnlockRecord>,
}

impl SkillTreeProgress {
    pub fn is_unlocked(&self, skill_id: &str) -> bool {
        self.unlocks.get(skill_id).is_some_and(|r| r.unlocked)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocks.values().filter(|r| r.unlocked).count()
    }
}

// --- Skill Tree Engine ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillState {
    pub definition: &'static SkillDefinition,
    pub status: SkillStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    /// Already unlocked earlier; nothing was charged.
    AlreadyUnlocked,
}

pub struct SkillTree {
    pub catalog: &'static SkillCatalog,
    pub progress: SkillTreeProgress,
}

impl SkillTree {
    pub fn new(catalog: &'static SkillCatalog, progress: SkillTreeProgress) -> Self {
        Self { catalog, progress }
    }

    pub fn status(
        &self,
        skill: &SkillDefinition,
        progression: &UserProgression,
        stats: &SessionStats,
    ) -> SkillStatus {
        if self.progress.is_unlocked(skill.id) {
            SkillStatus::Unlocked
        } else if skill.is_eligible(progression, stats) {
            SkillStatus::Eligible
        } else {
            SkillStatus::Locked
        }
    }

    /// Every catalog skill with its current status, in catalog order.
    pub fn evaluate(&self, progression: &UserProgression, stats: &SessionStats) -> Vec<SkillState> {
        self.catalog
            .skills
            .iter()
            .map(|definition| SkillState {
                definition,
                status: self.status(definition, progression, stats),
            })
            .collect()
    }

    pub fn eligible_ids(
        &self,
        progression: &UserProgression,
        stats: &SessionStats,
    ) -> Vec<&'static str> {
        self.evaluate(progression, stats)
            .into_iter()
            .filter(|s| s.status == SkillStatus::Eligible)
            .map(|s| s.definition.id)
            .collect()
    }

    /// Spend one skill point on `skill_id`.
    ///
    /// All checks run before anything is touched, so on error both the tree
    /// and `progression` are unchanged. Unlocking an unlocked skill succeeds
    /// without charging again.
    pub fn unlock(
        &mut self,
        user_id: &str,
        skill_id: &str,
        progression: &mut UserProgression,
        stats: &SessionStats,
        now: DateTime<Utc>,
    ) -> Result<UnlockOutcome, ProgressionError> {
        let skill = self
            .catalog
            .get(skill_id)
            .ok_or_else(|| ProgressionError::UnknownSkill(skill_id.to_string()))?;

        if self.progress.is_unlocked(skill.id) {
            return Ok(UnlockOutcome::AlreadyUnlocked);
        }
        if progression.skill_points() == 0 {
            return Err(ProgressionError::InsufficientSkillPoints {
                skill_id: skill.id.to_string(),
                available: 0,
            });
        }
        if !skill.is_eligible(progression, stats) {
            return Err(ProgressionError::NotEligible(skill.id.to_string()));
        }

        progression.spend_skill_point();
        self.progress.unlocks.insert(
            skill.id.to_string(),
            SkillUnlockRecord {
                user_id: user_id.to_string(),
                skill_id: skill.id.to_string(),
                unlocked: true,
                unlocked_at: Some(now),
            },
        );
        Ok(UnlockOutcome::Unlocked)
    }
}

impl Default for SkillTree {
    fn default() -> Self {
        Self::new(SkillCatalog::builtin(), SkillTreeProgress::default())
    }
}
