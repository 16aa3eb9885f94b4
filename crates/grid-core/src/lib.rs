//! Beat the Grid engine.
//!
//! Each calendar day has a seeded puzzle: a 6x6 grid of numbers, a start
//! value and a target. A player picks cells and applies `+ - × ÷` to a
//! running value, winning when it equals the target within four moves. Losses
//! cost one of the day's five tries; progress survives restarts through a
//! [`PreferenceStore`].

pub mod config;
pub mod day;
pub mod engine;
pub mod error;
pub mod level;
pub mod progress;
pub mod rng;
pub mod share;
pub mod store;

pub use config::{GameRules, GRID_SIZE};
pub use engine::{
    AttemptOutcome, AttemptResult, AttemptState, GameEngine, GameState, Operation, TileState,
};
pub use error::{Error, Result};
pub use level::{generate, Level, LevelConfig};
pub use progress::DailyProgress;
pub use share::share_text;
pub use store::{JsonFileStore, MemoryStore, PreferenceStore, StoredValue};
