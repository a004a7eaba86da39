use serde::{Deserialize, Serialize};

use crate::engine::progression::{Role, UserProgression};
use crate::engine::skill_tree::SkillTreeProgress;
use crate::engine::streak::SessionStats;
use crate::identity::Identity;
use crate::session::workout::WorkoutSession;

pub const SCHEMA_VERSION: u32 = 1;

/// Everything the engine reads or writes for one user. A workout or an
/// unlock commits this as a single unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub schema_version: u32,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub progression: UserProgression,
    #[serde(default)]
    pub stats: SessionStats,
    #[serde(default)]
    pub skills: SkillTreeProgress,
    #[serde(default)]
    pub history: Vec<WorkoutSession>,
}

impl UserRecord {
    /// Fresh record for a user seen for the first time.
    pub fn new(identity: &Identity, role: Role) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            progression: UserProgression::new(role),
            stats: SessionStats::default(),
            skills: SkillTreeProgress::default(),
            history: Vec::new(),
        }
    }

    /// Whether the record was written with the current schema.
    pub fn is_current_schema(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

/// A record together with the version it was read at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}
