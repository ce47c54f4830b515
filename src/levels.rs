//! Difficulty levels and their engine settings.

use std::fmt;
use std::time::Duration;

/// Stockfish `Skill Level` for each difficulty, indexed by level - 1.
const SKILL_LEVELS: [u8; 8] = [1, 4, 7, 10, 12, 14, 17, 20];

/// Difficulty level from 1 (weakest) to 8 (strongest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const ONE: Level = Level(1);
    pub const TWO: Level = Level(2);
    pub const THREE: Level = Level(3);
    pub const FOUR: Level = Level(4);
    pub const FIVE: Level = Level(5);
    pub const SIX: Level = Level(6);
    pub const SEVEN: Level = Level(7);
    pub const EIGHT: Level = Level(8);

    pub const MIN: Level = Level::ONE;
    pub const MAX: Level = Level::EIGHT;

    /// Clamp any integer into the valid range.
    pub fn of_int(n: i64) -> Self {
        Level(n.clamp(1, 8) as u8)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Engine skill parameter in 0..=20.
    pub fn skill_level(self) -> u8 {
        SKILL_LEVELS[(self.0 - 1) as usize]
    }

    /// Time the engine may think per move at this level.
    pub fn time_budget(self) -> Duration {
        match self.0 {
            1..=4 => Duration::from_millis(1000),
            5..=7 => Duration::from_millis(1500),
            _ => Duration::from_millis(2000),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::ONE
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
