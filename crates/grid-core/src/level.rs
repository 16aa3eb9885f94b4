use crate::config::GRID_SIZE;
use crate::rng::SimpleRng;
use serde::{Deserialize, Serialize};

/// Lowest start value at any level
pub const START_MIN: i64 = 100;
/// Cap on the start value upper bound
pub const START_MAX_CAP: i64 = 999;
/// Cap on the grid cell upper bound
pub const CELL_MAX_CAP: i64 = 12;
/// Levels above this may contain zero cells
pub const ZERO_CELLS_AFTER_LEVEL: u32 = 5;
/// Inclusive target range
pub const TARGET_RANGE: (i64, i64) = (1, 9);

/// Value ranges used when generating one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelConfig {
    /// Inclusive start value range
    pub start_min: i64,
    pub start_max: i64,
    /// Inclusive grid cell range
    pub cell_min: i64,
    pub cell_max: i64,
    /// Inclusive target range
    pub target_min: i64,
    pub target_max: i64,
}

impl LevelConfig {
    /// Ranges for a level. Ranges widen with the level up to fixed caps;
    /// levels below 1 scale like level 1.
    pub fn for_level(level_index: u32) -> Self {
        let steps = i64::from(level_index.max(1) - 1);
        Self {
            start_min: START_MIN,
            start_max: (299 + steps * 120).min(START_MAX_CAP),
            cell_min: if level_index > ZERO_CELLS_AFTER_LEVEL { 0 } else { 1 },
            cell_max: (9 + steps).min(CELL_MAX_CAP),
            target_min: TARGET_RANGE.0,
            target_max: TARGET_RANGE.1,
        }
    }
}

/// A generated puzzle: grid, start value and target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    pub day_index: u32,
    pub level_index: u32,
    pub grid: Vec<i64>,
    pub target: i64,
    pub start_value: i64,
}

impl Level {
    /// Value of a grid cell
    pub fn cell(&self, index: usize) -> Option<i64> {
        self.grid.get(index).copied()
    }
}

/// Seed for a day/level pair: the day in the high word, the level in the low word
pub fn level_seed(day_index: u32, level_index: u32) -> u64 {
    (u64::from(day_index) << 32).wrapping_add(u64::from(level_index))
}

/// Generate the level for a day.
///
/// Identical inputs always produce an identical level. Values are drawn in a
/// fixed order: start value, the grid cells row by row, then the target.
pub fn generate(day_index: u32, level_index: u32) -> Level {
    let config = LevelConfig::for_level(level_index);
    let mut rng = SimpleRng::with_seed(level_seed(day_index, level_index));

    let start_value = rng.next_in_range(config.start_min, config.start_max);
    let grid = (0..GRID_SIZE)
        .map(|_| rng.next_in_range(config.cell_min, config.cell_max))
        .collect();
    let target = rng.next_in_range(config.target_min, config.target_max);

    Level {
        day_index,
        level_index,
        grid,
        target,
        start_value,
    }
}
