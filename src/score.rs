//! Scoring, leveling and the gravity curve

use std::time::Duration;

/// Points per clear event indexed by rows cleared, before the level multiplier
pub const LINE_SCORES: [u64; 5] = [0, 40, 100, 300, 1200];
/// Lines needed per level
pub const LINES_PER_LEVEL: u32 = 10;
/// Gravity speed-up while continuous soft drop is held
pub const SOFT_DROP_DIVISOR: u64 = 8;

/// Score tracking for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total lines cleared
    pub lines: u32,
    /// Current level, derived from lines
    pub level: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a clear of `rows` rows at the current level, then update lines and level.
    /// Returns the points awarded.
    pub fn add_clear(&mut self, rows: usize) -> u64 {
        if rows == 0 {
            return 0;
        }
        let base = LINE_SCORES.get(rows).copied().unwrap_or(0);
        let awarded = base * (self.level as u64 + 1);
        self.points += awarded;
        self.lines += rows as u32;
        self.level = self.lines / LINES_PER_LEVEL;
        awarded
    }

    /// Add score for a hard drop (2 points per cell)
    pub fn add_hard_drop(&mut self, cells: u32) {
        self.points += cells as u64 * 2;
    }

    /// Add score for a soft drop (1 point per cell)
    pub fn add_soft_drop(&mut self, cells: u32) {
        self.points += cells as u64;
    }

    /// Gravity interval for the current level
    pub fn gravity_interval(&self, soft_drop: bool) -> Duration {
        gravity_interval(self.level, soft_drop)
    }
}

/// Frames per row at 60 fps, approximating the classic NES curve
fn frames_per_row(level: u32) -> u64 {
    match level {
        0 => 48,
        1 => 43,
        2 => 38,
        3 => 33,
        4 => 28,
        5 => 23,
        6 => 18,
        7 => 13,
        8 => 8,
        9 => 6,
        10..=12 => 5,
        13..=15 => 4,
        16..=18 => 3,
        19..=28 => 2,
        _ => 1,
    }
}

/// Time between gravity ticks at `level`, optionally sped up by soft drop
pub fn gravity_interval(level: u32, soft_drop: bool) -> Duration {
    let millis = (frames_per_row(level) * 1000 / 60).max(1);
    let millis = if soft_drop {
        (millis / SOFT_DROP_DIVISOR).max(1)
    } else {
        millis
    };
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_table_at_level_zero() {
        for (rows, expected) in [(1, 40), (2, 100), (3, 300), (4, 1200)] {
            let mut score = Score::new();
            assert_eq!(score.add_clear(rows), expected);
            assert_eq!(score.points, expected);
            assert_eq!(score.lines, rows as u32);
        }
    }

    #[test]
    fn test_level_multiplier() {
        let mut score = Score {
            points: 0,
            lines: 30,
            level: 3,
        };
        assert_eq!(score.add_clear(4), 1200 * 4);
        assert_eq!(score.lines, 34);
    }

    #[test]
    fn test_multiplier_uses_level_before_the_clear() {
        let mut score = Score {
            points: 0,
            lines: 9,
            level: 0,
        };
        // Crossing into level 1 still pays out at level 0
        assert_eq!(score.add_clear(1), 40);
        assert_eq!(score.level, 1);
    }

    #[test]
    fn test_level_up() {
        let mut score = Score::new();
        for _ in 0..10 {
            score.add_clear(1);
        }
        assert_eq!(score.lines, 10);
        assert_eq!(score.level, 1);
    }

    #[test]
    fn test_zero_rows_is_free() {
        let mut score = Score::new();
        assert_eq!(score.add_clear(0), 0);
        assert_eq!(score, Score::new());
    }

    #[test]
    fn test_drop_bonuses() {
        let mut score = Score::new();
        score.add_hard_drop(17);
        assert_eq!(score.points, 34);
        score.add_soft_drop(1);
        assert_eq!(score.points, 35);
    }

    #[test]
    fn test_gravity_curve() {
        assert_eq!(gravity_interval(0, false), Duration::from_millis(800));
        assert_eq!(gravity_interval(1, false), Duration::from_millis(716));
        assert_eq!(gravity_interval(9, false), Duration::from_millis(100));
        assert_eq!(gravity_interval(12, false), Duration::from_millis(83));
        assert_eq!(gravity_interval(15, false), Duration::from_millis(66));
        assert_eq!(gravity_interval(18, false), Duration::from_millis(50));
        assert_eq!(gravity_interval(28, false), Duration::from_millis(33));
        assert_eq!(gravity_interval(29, false), Duration::from_millis(16));
        assert_eq!(gravity_interval(500, false), Duration::from_millis(16));
    }

    #[test]
    fn test_soft_drop_divides_interval() {
        assert_eq!(gravity_interval(0, true), Duration::from_millis(100));
        assert_eq!(gravity_interval(29, true), Duration::from_millis(2));
        // Never below a millisecond
        for level in 0..40 {
            assert!(gravity_interval(level, true) >= Duration::from_millis(1));
        }
    }
}
