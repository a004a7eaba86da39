use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::ProgressionError;
use crate::engine::leveling::{cumulative_threshold, level_for_xp, max_xp};

// --- Role ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Assassin,
    Warden,
    Arbiter,
    Shadowmancer,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[Role::Assassin, Role::Warden, Role::Arbiter, Role::Shadowmancer]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Assassin => "Assassin",
            Role::Warden => "Warden",
            Role::Arbiter => "Arbiter",
            Role::Shadowmancer => "Shadowmancer",
        }
    }

    pub fn tagline(self) -> &'static str {
        match self {
            Role::Assassin => "Speed, agility, explosive power",
            Role::Warden => "Raw strength, heavy compounds",
            Role::Arbiter => "Balance, consistency, longevity",
            Role::Shadowmancer => "Hypertrophy, aesthetics, volume",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Assassin => {
                "Masters of speed and explosive power. High-intensity training with focus on conditioning and athleticism."
            }
            Role::Warden => {
                "Titans of raw strength. Heavy compound movements and progressive overload for maximum power."
            }
            Role::Arbiter => {
                "Balanced warriors seeking longevity. Sustainable training with emphasis on consistency and health."
            }
            Role::Shadowmancer => {
                "Sculptors of aesthetics. High-volume hypertrophy work for maximum muscle development."
            }
        }
    }

    /// Training-goal keywords that point toward this role.
    pub fn goal_keywords(self) -> &'static [&'static str] {
        match self {
            Role::Assassin => &["conditioning", "explosive", "athletic"],
            Role::Warden => &["strength", "powerlifting"],
            Role::Arbiter => &["health", "longevity", "balanced"],
            Role::Shadowmancer => &["muscle", "bodybuilding", "aesthetics"],
        }
    }

    /// Suggest a role from free-form goals ("Muscle Building", "Strength", ...).
    /// The role with the most keyword hits wins; ties go to the earlier role
    /// and no hits at all means the default role.
    pub fn recommend<S: AsRef<str>>(goals: &[S]) -> Role {
        let goals: Vec<String> = goals.iter().map(|g| g.as_ref().to_lowercase()).collect();
        let mut best = (Role::default(), 0usize);
        for &role in Role::all() {
            let hits = goals
                .iter()
                .filter(|goal| role.goal_keywords().iter().any(|kw| goal.contains(kw)))
                .count();
            if hits > best.1 {
                best = (role, hits);
            }
        }
        best.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::all()
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProgressionError::invalid(format!("unknown role '{s}'")))
    }
}

// --- User progression ---

/// Level, XP and skill points for one user.
///
/// Fields are only changed through [`apply_xp`] and the skill tree's
/// skill-point spend, which keeps `level == level_for_xp(xp)`. Stored
/// records are deserialized through [`UserProgression::from_parts`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredProgression")]
pub struct UserProgression {
    level: u32,
    xp: u64,
    skill_points: u32,
    role: Role,
}

/// On-disk shape of [`UserProgression`], before its invariants are checked.
#[derive(Deserialize)]
struct StoredProgression {
    level: u32,
    xp: u64,
    skill_points: u32,
    role: Role,
}

impl TryFrom<StoredProgression> for UserProgression {
    type Error = ProgressionError;

    fn try_from(stored: StoredProgression) -> Result<Self, Self::Error> {
        Self::from_parts(stored.level, stored.xp, stored.skill_points, stored.role)
    }
}

impl Default for UserProgression {
    fn default() -> Self {
        Self::new(Role::default())
    }
}

impl UserProgression {
    pub fn new(role: Role) -> Self {
        Self {
            level: 1,
            xp: 0,
            skill_points: 0,
            role,
        }
    }

    /// Restore a stored progression. A level that lags behind the XP is
    /// accepted (the next [`apply_xp`] catches it up); one ahead of it is not.
    pub fn from_parts(
        level: u32,
        xp: u64,
        skill_points: u32,
        role: Role,
    ) -> Result<Self, ProgressionError> {
        if level == 0 {
            return Err(ProgressionError::invalid("level must be at least 1"));
        }
        if xp > max_xp() {
            return Err(ProgressionError::invalid(format!(
                "xp {xp} is above the maximum of {}",
                max_xp()
            )));
        }
        let supported = level_for_xp(xp);
        if level > supported {
            return Err(ProgressionError::invalid(format!(
                "level {level} needs {} xp, have {xp}",
                cumulative_threshold(level)
            )));
        }
        Ok(Self {
            level,
            xp,
            skill_points,
            role,
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn skill_points(&self) -> u32 {
        self.skill_points
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Whether the stored level is exactly the one the XP supports.
    pub fn is_consistent(&self) -> bool {
        self.level == level_for_xp(self.xp)
    }

    pub(crate) fn spend_skill_point(&mut self) {
        debug_assert!(self.skill_points > 0);
        self.skill_points -= 1;
    }
}

/// Outcome of adding XP to a progression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XpGain {
    pub progression: UserProgression,
    pub level_ups: u32,
}

/// Add `earned_xp` and advance through every threshold it crosses, granting
/// one skill point per level gained.
pub fn apply_xp(progression: &UserProgression, earned_xp: i64) -> Result<XpGain, ProgressionError> {
    if earned_xp < 0 {
        return Err(ProgressionError::invalid(format!(
            "earned xp must not be negative, got {earned_xp}"
        )));
    }
    let xp = progression
        .xp
        .checked_add(earned_xp as u64)
        .filter(|&xp| xp <= max_xp())
        .ok_or_else(|| ProgressionError::invalid("xp total overflows the level curve"))?;

    let level = level_for_xp(xp).max(progression.level);
    let level_ups = level - progression.level;
    let mut next = progression.clone();
    next.xp = xp;
    next.level = level;
    next.skill_points = next.skill_points.saturating_add(level_ups);
    Ok(XpGain {
        progression: next,
        level_ups,
    })
}
