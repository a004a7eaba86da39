use crate::engine::error::ProgressionError;
use crate::session::workout::{LoggedExercise, LoggedSet};

/// Flat XP for finishing a session, regardless of its contents.
pub const SESSION_COMPLETION_BONUS: u64 = 25;

/// One XP per 50 kg of volume (0.02 XP per kg).
const VOLUME_PER_XP: f64 = 50.0;
/// RPE above this earns an intensity bonus.
const RPE_BASELINE: u64 = 6;
const XP_PER_RPE_POINT: u64 = 5;

fn overflow() -> ProgressionError {
    ProgressionError::invalid("xp overflows")
}

fn volume_xp(volume: f64) -> Result<u64, ProgressionError> {
    let xp = (volume / VOLUME_PER_XP).floor();
    // `as` saturates, so anything at or past u64::MAX has to be caught here.
    if !xp.is_finite() || xp >= u64::MAX as f64 {
        return Err(overflow());
    }
    Ok(xp as u64)
}

/// XP shown for a single set as it is logged.
pub fn compute_set_xp(set: &LoggedSet) -> Result<u64, ProgressionError> {
    set.validate()?;
    let intensity = set
        .rpe
        .map(|rpe| (rpe as u64).saturating_sub(RPE_BASELINE) * XP_PER_RPE_POINT)
        .unwrap_or(0);
    volume_xp(set.volume())?
        .checked_add(intensity)
        .ok_or_else(overflow)
}

/// XP for one exercise: volume XP over all sets plus an intensity bonus of
/// `max(0, mean_rpe - 6) * 5 * set_count`, where sets without RPE count
/// toward the mean as zero.
pub fn compute_exercise_xp(exercise: &LoggedExercise) -> Result<u64, ProgressionError> {
    exercise.validate()?;
    let set_count = exercise.sets.len() as u64;
    if set_count == 0 {
        return Ok(0);
    }
    let rpe_sum: u64 = exercise
        .sets
        .iter()
        .filter_map(|s| s.rpe)
        .map(|rpe| rpe as u64)
        .sum();
    // (rpe_sum / n - 6) * 5 * n == (rpe_sum - 6n) * 5
    let intensity = rpe_sum
        .saturating_sub(RPE_BASELINE.saturating_mul(set_count))
        .saturating_mul(XP_PER_RPE_POINT);
    volume_xp(exercise.volume())?
        .checked_add(intensity)
        .ok_or_else(overflow)
}

pub fn compute_session_xp(exercises: &[LoggedExercise]) -> Result<u64, ProgressionError> {
    let mut total = SESSION_COMPLETION_BONUS;
    for exercise in exercises {
        total = total
            .checked_add(compute_exercise_xp(exercise)?)
            .ok_or_else(overflow)?;
    }
    Ok(total)
}
