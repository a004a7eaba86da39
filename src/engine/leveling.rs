/// Cumulative XP needed to reach `level`: `ceil(100 * level^1.5)`.
///
/// Computed as `100 * level * sqrt(level)` so perfect squares come out exact
/// instead of one above (`powf` can land just past the integer).
pub fn cumulative_threshold(level: u32) -> u64 {
    let l = level as f64;
    (100.0 * l * l.sqrt()).ceil() as u64
}

/// Highest reachable level. Keeps `level + 1` representable.
pub const MAX_LEVEL: u32 = u32::MAX - 1;

/// Largest XP total a progression may hold: one short of the level after
/// [`MAX_LEVEL`].
pub fn max_xp() -> u64 {
    cumulative_threshold(MAX_LEVEL + 1) - 1
}

/// Highest level whose threshold `xp` has reached. Level 1 is the floor, so a
/// fresh profile at 0 XP is level 1.
///
/// Inverts the curve with `(xp / 100)^(2/3)` and then corrects the estimate
/// against [`cumulative_threshold`], so float error never picks a wrong level.
pub fn level_for_xp(xp: u64) -> u32 {
    let estimate = (xp as f64 / 100.0).powf(2.0 / 3.0).floor();
    let mut level = (estimate as u32).clamp(1, MAX_LEVEL);
    while level > 1 && cumulative_threshold(level) > xp {
        level -= 1;
    }
    while level < MAX_LEVEL && cumulative_threshold(level + 1) <= xp {
        level += 1;
    }
    level
}

/// Fraction of the way from `level` to `level + 1`, for progress bars.
pub fn progress_fraction(xp: u64, level: u32) -> f64 {
    let current = cumulative_threshold(level) as f64;
    let next = cumulative_threshold(level.saturating_add(1)) as f64;
    ((xp as f64 - current) / (next - current)).clamp(0.0, 1.0)
}

pub fn xp_to_next_level(xp: u64, level: u32) -> u64 {
    cumulative_threshold(level.saturating_add(1)).saturating_sub(xp)
}
