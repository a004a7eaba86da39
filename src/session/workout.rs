use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::error::ProgressionError;
use crate::engine::xp;

/// Highest RPE a set can be logged with.
pub const MAX_RPE: u8 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u8>,
}

impl LoggedSet {
    pub fn new(reps: u32, weight: f64, rpe: Option<u8>) -> Self {
        Self { reps, weight, rpe }
    }

    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.reps == 0 {
            return Err(ProgressionError::invalid("set must have at least one rep"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ProgressionError::invalid(format!(
                "set weight must be a non-negative number, got {}",
                self.weight
            )));
        }
        if let Some(rpe) = self.rpe
            && !(1..=MAX_RPE).contains(&rpe)
        {
            return Err(ProgressionError::invalid(format!(
                "rpe must be between 1 and {MAX_RPE}, got {rpe}"
            )));
        }
        Ok(())
    }

    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedExercise {
    pub exercise_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(default)]
    pub sets: Vec<LoggedSet>,
}

impl LoggedExercise {
    pub fn new(exercise_id: impl Into<String>, sets: Vec<LoggedSet>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            exercise_name: None,
            sets,
        }
    }

    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.exercise_id.trim().is_empty() {
            return Err(ProgressionError::invalid("exercise id must not be empty"));
        }
        for (i, set) in self.sets.iter().enumerate() {
            set.validate().map_err(|e| match e {
                ProgressionError::InvalidInput(msg) => ProgressionError::InvalidInput(format!(
                    "{} set {}: {msg}",
                    self.exercise_id,
                    i + 1
                )),
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(LoggedSet::volume).sum()
    }

    /// Name for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.exercise_name.as_deref().unwrap_or(&self.exercise_id)
    }
}

/// A workout as submitted, before validation and XP computation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<LoggedExercise>,
}

/// Result of splitting a draft at its first invalid exercise.
pub struct ValidatedDraft {
    pub draft: WorkoutDraft,
    /// Index of the first rejected exercise and why it was rejected.
    pub rejected: Option<(usize, ProgressionError)>,
}

impl WorkoutDraft {
    /// Keep the exercises logged before the first invalid one.
    pub fn split_valid(mut self) -> ValidatedDraft {
        let rejected = self
            .exercises
            .iter()
            .enumerate()
            .find_map(|(i, ex)| ex.validate().err().map(|e| (i, e)));
        if let Some((idx, _)) = rejected {
            self.exercises.truncate(idx);
        }
        ValidatedDraft {
            draft: self,
            rejected,
        }
    }
}

/// A completed workout. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    date: NaiveDate,
    exercises: Vec<LoggedExercise>,
    xp_gained: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl WorkoutSession {
    /// Validate the exercises and compute the session's XP.
    pub fn complete(
        date: NaiveDate,
        exercises: Vec<LoggedExercise>,
    ) -> Result<Self, ProgressionError> {
        let xp_gained = xp::compute_session_xp(&exercises)?;
        Ok(Self {
            date,
            exercises,
            xp_gained,
            duration_minutes: None,
            notes: None,
        })
    }

    /// Complete a draft, dating it `fallback_date` when it carries no date.
    pub fn from_draft(
        draft: WorkoutDraft,
        fallback_date: NaiveDate,
    ) -> Result<Self, ProgressionError> {
        let WorkoutDraft {
            date,
            duration_minutes,
            notes,
            exercises,
        } = draft;
        let mut session = Self::complete(date.unwrap_or(fallback_date), exercises)?;
        session.duration_minutes = duration_minutes;
        session.notes = notes.filter(|n| !n.trim().is_empty());
        Ok(session)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn exercises(&self) -> &[LoggedExercise] {
        &self.exercises
    }

    pub fn xp_gained(&self) -> u64 {
        self.xp_gained
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|ex| ex.sets.len()).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(LoggedExercise::volume).sum()
    }
}
