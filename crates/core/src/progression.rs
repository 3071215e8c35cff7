//! Level and experience progression.
//!
//! Levels start at 1. Reaching level 2 costs [`FIRST_LEVEL_XP`] experience and
//! every further level costs [`XP_STEP_PER_LEVEL`] more than the one before,
//! giving the cumulative thresholds 0, 10, 21, 33, 46, ... for levels 1..5.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The level every account starts at.
pub const MIN_LEVEL: u32 = 1;

/// Incremental XP needed to go from level 1 to level 2.
pub const FIRST_LEVEL_XP: i64 = 10;

/// How much more each subsequent level costs than the previous one.
pub const XP_STEP_PER_LEVEL: i64 = 1;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Incremental XP cost of reaching `level` from `level - 1`.
///
/// Levels at or below [`MIN_LEVEL`] cost nothing.
pub fn xp_for_level(level: u32) -> i64 {
    if level <= MIN_LEVEL {
        return 0;
    }
    FIRST_LEVEL_XP + i64::from(level - 2) * XP_STEP_PER_LEVEL
}

/// Cumulative XP required to reach `level`, saturating at `i64::MAX`.
///
/// This is the sum of [`xp_for_level`] over `2..=level`, evaluated as an
/// arithmetic series.
pub fn total_xp_for_level(level: u32) -> i64 {
    i64::try_from(threshold(level)).unwrap_or(i64::MAX)
}

/// Exact cumulative threshold. `i128` holds it for every `u32` level.
fn threshold(level: u32) -> i128 {
    if level <= MIN_LEVEL {
        return 0;
    }
    let steps = i128::from(level - 1);
    steps * (2 * i128::from(FIRST_LEVEL_XP) + (steps - 1) * i128::from(XP_STEP_PER_LEVEL)) / 2
}

/// The highest level whose cumulative threshold does not exceed `total_xp`.
///
/// Starts from the closed-form root of the threshold series and corrects
/// the float estimate by stepping, so the cost is constant for any input.
/// Non-positive input stays at level 1.
pub fn level(total_xp: i64) -> u32 {
    if total_xp <= 0 {
        return MIN_LEVEL;
    }
    let xp = i128::from(total_xp);
    let mut level = estimate_level(total_xp);
    while level > MIN_LEVEL && threshold(level) > xp {
        level -= 1;
    }
    while level < u32::MAX && threshold(level + 1) <= xp {
        level += 1;
    }
    level
}

/// Solve `d*s^2 + (2f - d)*s <= 2 * total_xp` for the step count `s`.
fn estimate_level(total_xp: i64) -> u32 {
    let d = XP_STEP_PER_LEVEL as f64;
    let b = (2 * FIRST_LEVEL_XP - XP_STEP_PER_LEVEL) as f64;
    let steps = (-b + (b * b + 8.0 * d * total_xp as f64).sqrt()) / (2.0 * d);
    // `as` saturates: NaN and negatives become 0, huge values u32::MAX.
    (steps.max(0.0) as u32).saturating_add(MIN_LEVEL)
}

/// XP earned since the current level's threshold was crossed.
pub fn xp_toward_next_level(total_xp: i64) -> i64 {
    total_xp - total_xp_for_level(level(total_xp))
}

/// Progress toward the next level as a floored percentage of the next
/// level's cumulative threshold.
pub fn xp_percent(total_xp: i64) -> Result<u32, CoreError> {
    xp_percent_at(total_xp, level(total_xp))
}

/// [`xp_percent`] for an explicitly supplied level.
///
/// Fails with [`CoreError::DivisionByZero`] when the threshold of
/// `level + 1` is zero, which happens for `level == 0`.
pub fn xp_percent_at(total_xp: i64, level: u32) -> Result<u32, CoreError> {
    let toward = i128::from(total_xp) - threshold(level);
    floor_percent(toward, threshold(level.saturating_add(1)), "next level threshold")
}

/// Remaining health as a floored percentage of `health_max`.
pub fn health_percent(health: i64, health_max: i64) -> Result<u32, CoreError> {
    floor_percent(i128::from(health), i128::from(health_max), "health_max")
}

/// `floor(part / whole * 100)` over integers, guarding a zero denominator.
fn floor_percent(part: i128, whole: i128, what: &'static str) -> Result<u32, CoreError> {
    if whole == 0 {
        return Err(CoreError::DivisionByZero(what));
    }
    let pct = (part * 100).div_euclid(whole);
    Ok(pct.clamp(0, i128::from(u32::MAX)) as u32)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Derived progression figures for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progression {
    pub level: u32,
    pub xp_toward_next_level: i64,
    /// Incremental XP needed to go from `level` to `level + 1`.
    pub xp_for_next_level: i64,
    pub xp_percent: u32,
}

impl Progression {
    /// Compute all progression figures from accumulated experience.
    pub fn from_total_xp(total_xp: i64) -> Result<Self, CoreError> {
        let level = level(total_xp);
        Ok(Self {
            level,
            xp_toward_next_level: total_xp - total_xp_for_level(level),
            xp_for_next_level: xp_for_level(level.saturating_add(1)),
            xp_percent: xp_percent_at(total_xp, level)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn xp_for_level_matches_table() {
        let costs: Vec<i64> = (1..=5).map(xp_for_level).collect();
        assert_eq!(costs, vec![0, 10, 11, 12, 13]);
    }

    #[test]
    fn xp_for_level_zero_is_free() {
        assert_eq!(xp_for_level(0), 0);
    }

    #[test]
    fn total_xp_for_level_matches_table() {
        let totals: Vec<i64> = (1..=5).map(total_xp_for_level).collect();
        assert_eq!(totals, vec![0, 10, 21, 33, 46]);
    }

    #[test]
    fn total_xp_is_sum_of_increments() {
        for lvl in 1..60 {
            let summed: i64 = (2..=lvl).map(xp_for_level).sum();
            assert_eq!(total_xp_for_level(lvl), summed, "level {lvl}");
        }
    }

    #[test]
    fn thresholds_are_monotonic() {
        for lvl in 1..500 {
            assert!(total_xp_for_level(lvl) <= total_xp_for_level(lvl + 1));
        }
    }

    #[test]
    fn level_at_exact_thresholds() {
        assert_eq!(level(0), 1);
        assert_eq!(level(10), 2);
        assert_eq!(level(21), 3);
        assert_eq!(level(33), 4);
        assert_eq!(level(46), 5);
    }

    #[test]
    fn level_does_not_roll_over_early() {
        assert_eq!(level(12), 2);
        assert_eq!(level(23), 3);
        assert_eq!(level(35), 4);
        assert_eq!(level(48), 5);
    }

    #[test]
    fn level_just_below_threshold() {
        assert_eq!(level(9), 1);
        assert_eq!(level(20), 2);
        assert_eq!(level(45), 4);
    }

    #[test]
    fn level_matches_forward_search() {
        let mut expected = MIN_LEVEL;
        for xp in 0..20_000 {
            while total_xp_for_level(expected + 1) <= xp {
                expected += 1;
            }
            assert_eq!(level(xp), expected, "total_xp {xp}");
        }
    }

    #[test]
    fn level_of_maximum_xp_terminates_between_thresholds() {
        let lvl = level(i64::MAX);
        assert!(threshold(lvl) <= i128::from(i64::MAX));
        assert!(threshold(lvl + 1) > i128::from(i64::MAX));
        assert_eq!(total_xp_for_level(lvl + 1), i64::MAX);
    }

    #[test]
    fn large_xp_levels_bracket_their_input() {
        for xp in [1_000_000_000_000_000, 4_611_686_018_427_387_904, i64::MAX - 1] {
            let lvl = level(xp);
            assert!(threshold(lvl) <= i128::from(xp), "total_xp {xp}");
            assert!(threshold(lvl + 1) > i128::from(xp), "total_xp {xp}");
        }
    }

    #[test]
    fn progression_of_maximum_xp_is_computed() {
        let p = Progression::from_total_xp(i64::MAX).unwrap();
        assert_eq!(p.level, level(i64::MAX));
        assert!(p.xp_percent < 100);
    }

    #[test]
    fn negative_xp_stays_at_first_level() {
        assert_eq!(level(-5), MIN_LEVEL);
    }

    #[test]
    fn account_with_33_xp_is_level_four_with_no_progress() {
        assert_eq!(level(33), 4);
        assert_eq!(xp_toward_next_level(33), 0);
        assert_eq!(xp_percent(33).unwrap(), 0);
    }

    #[test]
    fn xp_percent_is_floored_against_next_threshold() {
        // level 2, 5 xp past the threshold of 10, next threshold is 21
        assert_eq!(xp_toward_next_level(15), 5);
        assert_eq!(xp_percent(15).unwrap(), 23);
    }

    #[test]
    fn xp_percent_at_level_zero_is_division_by_zero() {
        assert_matches!(xp_percent_at(0, 0), Err(CoreError::DivisionByZero(_)));
    }

    #[test]
    fn health_percent_floors() {
        assert_eq!(health_percent(100, 100).unwrap(), 100);
        assert_eq!(health_percent(33, 100).unwrap(), 33);
        assert_eq!(health_percent(2, 3).unwrap(), 66);
    }

    #[test]
    fn health_percent_guards_zero_max() {
        assert_matches!(health_percent(10, 0), Err(CoreError::DivisionByZero(_)));
    }

    #[test]
    fn progression_summary() {
        let p = Progression::from_total_xp(25).unwrap();
        assert_eq!(p.level, 3);
        assert_eq!(p.xp_toward_next_level, 4);
        assert_eq!(p.xp_for_next_level, 12);
        assert_eq!(p.xp_percent, 12);
    }
}
