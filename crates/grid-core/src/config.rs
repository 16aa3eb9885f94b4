use serde::{Deserialize, Serialize};

/// Number of cells in every generated grid (6x6)
pub const GRID_SIZE: usize = 36;
/// Operations allowed per attempt
pub const DEFAULT_MAX_MOVES: u8 = 4;
/// Attempts allowed per day
pub const DEFAULT_DAILY_TRIES: u8 = 5;

/// Rules governing attempts and the daily budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Operations per attempt before it is lost
    pub max_moves: u8,
    /// Tries granted at every new-day rollover
    pub daily_tries: u8,
    /// Whether a win closes the day
    pub complete_on_win: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_moves: DEFAULT_MAX_MOVES,
            daily_tries: DEFAULT_DAILY_TRIES,
            complete_on_win: true,
        }
    }
}

impl GameRules {
    /// Rules where winning keeps the day open; only running out of tries completes it
    pub fn practice() -> Self {
        Self {
            complete_on_win: false,
            ..Self::default()
        }
    }
}
