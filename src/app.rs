use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::config::Config;
use crate::engine::achievements::{self, Achievement};
use crate::engine::attributes::CharacterAttributes;
use crate::engine::error::ProgressionError;
use crate::engine::leveling;
use crate::engine::progression::{Role, UserProgression, apply_xp};
use crate::engine::skill_tree::{SkillCatalog, SkillState, SkillTree, UnlockOutcome};
use crate::engine::streak::{SessionStats, apply_session};
use crate::identity::Identity;
use crate::session::workout::{ValidatedDraft, WorkoutDraft, WorkoutSession};
use crate::store::schema::{UserRecord, Versioned};
use crate::store::{ProgressStore, StoreError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Progression(#[from] ProgressionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no progression record for user '{0}'")]
    UnknownUser(String),

    /// The exercises before `rejected_index` were recorded and committed.
    #[error("recorded {rejected_index} exercise(s) before rejecting the next: {source}")]
    PartiallyRecorded {
        report: Box<WorkoutReport>,
        rejected_index: usize,
        source: ProgressionError,
    },
}

/// What one completed workout did to a user.
#[derive(Clone, Debug)]
pub struct WorkoutReport {
    pub session: WorkoutSession,
    pub level_ups: u32,
    pub progression: UserProgression,
    pub stats: SessionStats,
    pub eligible_skills: Vec<&'static str>,
    pub newly_eligible_skills: Vec<&'static str>,
    pub new_achievements: Vec<&'static str>,
}

pub struct StatusReport {
    pub record: UserRecord,
    pub progress_fraction: f64,
    pub xp_to_next_level: u64,
    pub attributes: CharacterAttributes,
    pub achievements: Vec<&'static Achievement>,
    pub skills: Vec<SkillState>,
}

/// Runs engine operations against a store: load the user's record, apply
/// the pure transformation, commit with the version that was read, and on a
/// version conflict start over from a fresh read.
pub struct ProgressionService<S> {
    store: S,
    catalog: &'static SkillCatalog,
    default_role: Role,
    max_commit_attempts: u32,
}

impl<S: ProgressStore> ProgressionService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            catalog: SkillCatalog::builtin(),
            default_role: config.default_role,
            max_commit_attempts: config.max_commit_attempts.max(1),
        }
    }

    pub fn with_catalog(mut self, catalog: &'static SkillCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the user's record, creating it on first contact.
    pub fn ensure_user(&self, identity: &Identity) -> Result<UserRecord, WorkflowError> {
        let user_id = identity.user_id.as_str();
        if let Some(existing) = self.store.load(user_id)? {
            return Ok(existing.record);
        }
        let record = UserRecord::new(identity, self.default_role);
        match self.store.commit(user_id, None, &record) {
            Ok(_) => {
                tracing::info!(user_id, role = %record.progression.role(), "created user record");
                Ok(record)
            }
            Err(e) if e.is_conflict() => {
                // Created by someone else in the meantime.
                self.load(user_id).map(|v| v.record)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, user_id: &str) -> Result<Versioned<UserRecord>, WorkflowError> {
        self.store
            .load(user_id)?
            .ok_or_else(|| WorkflowError::UnknownUser(user_id.to_string()))
    }

    /// Read-transform-write with retry on conflict. `apply` runs against a
    /// fresh copy on every attempt; whatever it changed is committed even when
    /// its own result is an error, and an untouched record is not rewritten.
    fn transact<T>(
        &self,
        user_id: &str,
        mut apply: impl FnMut(&mut UserRecord) -> T,
    ) -> Result<T, WorkflowError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Versioned { version, record } = self.load(user_id)?;
            let mut next = record.clone();
            let out = apply(&mut next);
            if next == record {
                return Ok(out);
            }
            match self.store.commit(user_id, Some(version), &next) {
                Ok(_) => return Ok(out),
                Err(e) if e.is_conflict() && attempt < self.max_commit_attempts => {
                    tracing::warn!(user_id, attempt, "commit conflict, retrying");
                }
                Err(e) => {
                    if e.is_conflict() {
                        tracing::error!(user_id, attempt, "giving up after repeated conflicts");
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Record a finished workout. Exercises after the first invalid one are
    /// dropped; the valid ones before it are still recorded, and the
    /// rejection comes back as [`WorkflowError::PartiallyRecorded`].
    pub fn complete_workout(
        &self,
        user_id: &str,
        draft: WorkoutDraft,
        today: NaiveDate,
    ) -> Result<WorkoutReport, WorkflowError> {
        let ValidatedDraft { draft, rejected } = draft.split_valid();
        if let Some((0, err)) = &rejected {
            return Err(err.clone().into());
        }
        let session = WorkoutSession::from_draft(draft, today)?;
        let catalog = self.catalog;
        let report = self.transact(user_id, |record| record_session(record, &session, catalog))??;

        tracing::info!(
            user_id,
            xp = report.session.xp_gained(),
            level = report.progression.level(),
            streak = report.stats.current_streak,
            "workout recorded"
        );
        if report.level_ups > 0 {
            tracing::info!(user_id, level_ups = report.level_ups, "level up");
        }

        match rejected {
            Some((rejected_index, source)) => {
                tracing::warn!(user_id, rejected_index, %source, "workout partially recorded");
                Err(WorkflowError::PartiallyRecorded {
                    report: Box::new(report),
                    rejected_index,
                    source,
                })
            }
            None => Ok(report),
        }
    }

    /// Spend a skill point on `skill_id`. The point and the unlock record are
    /// committed together.
    pub fn unlock_skill(
        &self,
        user_id: &str,
        skill_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UnlockOutcome, WorkflowError> {
        let catalog = self.catalog;
        let outcome = self.transact(user_id, |record| {
            let mut tree = SkillTree::new(catalog, std::mem::take(&mut record.skills));
            let result = tree.unlock(user_id, skill_id, &mut record.progression, &record.stats, now);
            record.skills = tree.progress;
            result
        })??;
        if outcome == UnlockOutcome::Unlocked {
            tracing::info!(user_id, skill_id, "skill unlocked");
        }
        Ok(outcome)
    }

    pub fn evaluate_skills(&self, user_id: &str) -> Result<Vec<SkillState>, WorkflowError> {
        let record = self.load(user_id)?.record;
        let tree = SkillTree::new(self.catalog, record.skills);
        Ok(tree.evaluate(&record.progression, &record.stats))
    }

    pub fn status(&self, user_id: &str) -> Result<StatusReport, WorkflowError> {
        let record = self.load(user_id)?.record;
        let p = &record.progression;
        let tree = SkillTree::new(self.catalog, record.skills.clone());
        Ok(StatusReport {
            progress_fraction: leveling::progress_fraction(p.xp(), p.level()),
            xp_to_next_level: leveling::xp_to_next_level(p.xp(), p.level()),
            attributes: CharacterAttributes::derive(p, &record.stats),
            achievements: achievements::earned(p, &record.stats),
            skills: tree.evaluate(p, &record.stats),
            record,
        })
    }

    pub fn choose_role(&self, user_id: &str, role: Role) -> Result<UserProgression, WorkflowError> {
        self.transact(user_id, |record| {
            record.progression = record.progression.clone().with_role(role);
            record.progression.clone()
        })
    }

    /// The weekly rollover trigger: zero the weekly counters.
    pub fn roll_over_week(&self, user_id: &str) -> Result<SessionStats, WorkflowError> {
        self.transact(user_id, |record| {
            record.stats.reset_week();
            record.stats.clone()
        })
    }

    /// Recompute progression and stats by replaying the stored history
    /// oldest to newest. Skill points become total level-ups minus skills
    /// already unlocked; the weekly counters are kept as they are.
    pub fn rebuild_from_history(&self, user_id: &str) -> Result<UserRecord, WorkflowError> {
        let rebuilt = self.transact(user_id, |record| {
            let (progression, stats) = replay_history(record)?;
            record.progression = progression;
            record.stats = stats;
            Ok::<_, ProgressionError>(record.clone())
        })??;
        tracing::info!(
            user_id,
            sessions = rebuilt.history.len(),
            level = rebuilt.progression.level(),
            "rebuilt from history"
        );
        Ok(rebuilt)
    }
}

fn earned_xp(session: &WorkoutSession) -> Result<i64, ProgressionError> {
    i64::try_from(session.xp_gained())
        .map_err(|_| ProgressionError::invalid("session xp out of range"))
}

/// Run one session through the engine, in order: XP, progression, stats,
/// then skill eligibility and achievements against the new state.
fn record_session(
    record: &mut UserRecord,
    session: &WorkoutSession,
    catalog: &'static SkillCatalog,
) -> Result<WorkoutReport, ProgressionError> {
    let gain = apply_xp(&record.progression, earned_xp(session)?)?;
    let stats = apply_session(&record.stats, session);

    let tree = SkillTree::new(catalog, record.skills.clone());
    let eligible_before = tree.eligible_ids(&record.progression, &record.stats);
    let eligible_skills = tree.eligible_ids(&gain.progression, &stats);
    let newly_eligible_skills = eligible_skills
        .iter()
        .copied()
        .filter(|id| !eligible_before.contains(id))
        .collect();
    let new_achievements = achievements::newly_earned(
        (&record.progression, &record.stats),
        (&gain.progression, &stats),
    )
    .into_iter()
    .map(|a| a.id)
    .collect();

    record.progression = gain.progression.clone();
    record.stats = stats.clone();
    record.history.push(session.clone());

    Ok(WorkoutReport {
        session: session.clone(),
        level_ups: gain.level_ups,
        progression: gain.progression,
        stats,
        eligible_skills,
        newly_eligible_skills,
        new_achievements,
    })
}

fn replay_history(
    record: &mut UserRecord,
) -> Result<(UserProgression, SessionStats), ProgressionError> {
    // Stable: same-day sessions keep their submission order.
    record.history.sort_by_key(WorkoutSession::date);

    let role = record.progression.role();
    let mut progression = UserProgression::new(role);
    let mut stats = SessionStats::default();
    let mut level_ups: u32 = 0;
    for session in &record.history {
        let gain = apply_xp(&progression, earned_xp(session)?)?;
        level_ups = level_ups.saturating_add(gain.level_ups);
        progression = gain.progression;
        stats = apply_session(&stats, session);
    }
    stats.sessions_this_week = record.stats.sessions_this_week;
    stats.weekly_volume_kg = record.stats.weekly_volume_kg;

    let spent = record.skills.unlocked_count() as u32;
    let progression = UserProgression::from_parts(
        progression.level(),
        progression.xp(),
        level_ups.saturating_sub(spent),
        role,
    )?;
    Ok((progression, stats))
}
