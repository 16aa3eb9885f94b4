use grid_core::{
    engine, store::StoredValue, GameEngine, GameRules, GameState, JsonFileStore, PreferenceStore,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

uniffi::setup_scaffolding!();

/// Errors surfaced to the host app
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum GameError {
    /// The preference store did not accept a progress write
    #[error("storage error: {message}")]
    Storage { message: String },
    /// Snapshot could not be encoded
    #[error("encoding error: {message}")]
    Encoding { message: String },
}

impl From<grid_core::Error> for GameError {
    fn from(err: grid_core::Error) -> Self {
        GameError::Storage {
            message: err.to_string(),
        }
    }
}

/// Arithmetic operation applied with the selected cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl From<Operation> for engine::Operation {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Add => engine::Operation::Add,
            Operation::Subtract => engine::Operation::Subtract,
            Operation::Multiply => engine::Operation::Multiply,
            Operation::Divide => engine::Operation::Divide,
        }
    }
}

/// Outcome of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum AttemptOutcome {
    InProgress,
    Won,
    Lost,
}

impl From<engine::AttemptOutcome> for AttemptOutcome {
    fn from(outcome: engine::AttemptOutcome) -> Self {
        match outcome {
            engine::AttemptOutcome::InProgress => AttemptOutcome::InProgress,
            engine::AttemptOutcome::Won => AttemptOutcome::Won,
            engine::AttemptOutcome::Lost => AttemptOutcome::Lost,
        }
    }
}

/// Result of applying an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum AttemptResult {
    /// Keep playing (also returned when the operation was ignored)
    Continue,
    /// The attempt ended; show the results screen
    Finished { outcome: AttemptOutcome },
}

impl From<engine::AttemptResult> for AttemptResult {
    fn from(result: engine::AttemptResult) -> Self {
        match result {
            engine::AttemptResult::Continue => AttemptResult::Continue,
            engine::AttemptResult::Finished(outcome) => AttemptResult::Finished {
                outcome: outcome.into(),
            },
        }
    }
}

/// Display state of a grid tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum TileState {
    Available,
    Used,
    Selected,
}

impl From<engine::TileState> for TileState {
    fn from(state: engine::TileState) -> Self {
        match state {
            engine::TileState::Available => TileState::Available,
            engine::TileState::Used => TileState::Used,
            engine::TileState::Selected => TileState::Selected,
        }
    }
}

/// Cell state for UI rendering
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct CellState {
    /// Position in the grid (0-35, row-major)
    pub index: u32,
    pub value: i64,
    pub state: TileState,
}

/// Everything the game screens render
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct GameSnapshot {
    pub day_index: u32,
    pub level_index: u32,
    pub cells: Vec<CellState>,
    pub target: i64,
    pub start_value: i64,
    pub running_value: i64,
    pub move_index: u8,
    pub max_moves: u8,
    pub selected_index: Option<u32>,
    pub tries_remaining: u8,
    pub daily_tries: u8,
    pub completed: bool,
    pub outcome: AttemptOutcome,
    /// Text for the share sheet
    pub share_text: String,
}

/// A generated level
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct LevelInfo {
    pub day_index: u32,
    pub level_index: u32,
    pub grid: Vec<i64>,
    pub target: i64,
    pub start_value: i64,
}

impl From<grid_core::Level> for LevelInfo {
    fn from(level: grid_core::Level) -> Self {
        LevelInfo {
            day_index: level.day_index,
            level_index: level.level_index,
            grid: level.grid,
            target: level.target,
            start_value: level.start_value,
        }
    }
}

/// Rule overrides chosen by the host app
#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct RulesConfig {
    pub max_moves: u8,
    pub daily_tries: u8,
    pub complete_on_win: bool,
}

impl From<RulesConfig> for GameRules {
    fn from(config: RulesConfig) -> Self {
        GameRules {
            max_moves: config.max_moves,
            daily_tries: config.daily_tries,
            complete_on_win: config.complete_on_win,
        }
    }
}

/// Default rules, for hosts that only override some fields
#[uniffi::export]
pub fn default_rules() -> RulesConfig {
    let rules = GameRules::default();
    RulesConfig {
        max_moves: rules.max_moves,
        daily_tries: rules.daily_tries,
        complete_on_win: rules.complete_on_win,
    }
}

// MARK: - Platform preferences

/// A stored preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PreferenceValue {
    Int { value: i64 },
    Bool { value: bool },
}

impl From<StoredValue> for PreferenceValue {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Int(value) => PreferenceValue::Int { value },
            StoredValue::Bool(value) => PreferenceValue::Bool { value },
        }
    }
}

impl From<PreferenceValue> for StoredValue {
    fn from(value: PreferenceValue) -> Self {
        match value {
            PreferenceValue::Int { value } => StoredValue::Int(value),
            PreferenceValue::Bool { value } => StoredValue::Bool(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PreferenceEntry {
    pub key: String,
    pub value: PreferenceValue,
}

/// Preference storage implemented by the host (DataStore, UserDefaults, ...)
#[uniffi::export(callback_interface)]
pub trait PreferenceBackend: Send + Sync {
    /// Read a value, `None` if absent
    fn get(&self, key: String) -> Option<PreferenceValue>;
    /// Write all entries in one transaction. Returns false if nothing was written.
    fn commit(&self, entries: Vec<PreferenceEntry>) -> bool;
}

/// Receives a snapshot after every state change
#[uniffi::export(callback_interface)]
pub trait GameObserver: Send + Sync {
    fn on_state_changed(&self, snapshot: GameSnapshot);
}

struct ForeignStore(Box<dyn PreferenceBackend>);

impl PreferenceStore for ForeignStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.0.get(key.to_string()).map(StoredValue::from)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> grid_core::Result<()> {
        self.set_all(&[(key, value)])
    }

    fn set_all(&mut self, entries: &[(&str, StoredValue)]) -> grid_core::Result<()> {
        let entries = entries
            .iter()
            .map(|(key, value)| PreferenceEntry {
                key: (*key).to_string(),
                value: (*value).into(),
            })
            .collect();
        if self.0.commit(entries) {
            Ok(())
        } else {
            Err(grid_core::Error::Rejected(
                "platform preference store refused the commit".to_string(),
            ))
        }
    }
}

type Store = Box<dyn PreferenceStore + Send>;

// MARK: - Game object

/// Snapshots waiting to be handed to observers, oldest first
#[derive(Default)]
struct Outbox {
    queue: VecDeque<GameSnapshot>,
    delivering: bool,
}

/// The daily game for mobile platforms.
///
/// Safe to share between threads. Observers see every change exactly once and
/// in the order the changes were made, but a call may return before its own
/// snapshot was delivered when another thread (or an observer calling back
/// into the game) is already delivering.
#[derive(uniffi::Object)]
pub struct DailyGame {
    engine: Mutex<GameEngine<Store>>,
    observers: Mutex<Vec<Arc<dyn GameObserver>>>,
    outbox: Mutex<Outbox>,
}

#[uniffi::export]
impl DailyGame {
    /// Open today's game over the host's preference store
    #[uniffi::constructor]
    pub fn new(backend: Box<dyn PreferenceBackend>) -> Arc<Self> {
        Self::build(
            Box::new(ForeignStore(backend)),
            grid_core::day::today(),
            GameRules::default(),
        )
    }

    /// Open the game for a specific day index (tests, time-travel debugging)
    #[uniffi::constructor]
    pub fn for_day(backend: Box<dyn PreferenceBackend>, day_index: u32) -> Arc<Self> {
        Self::build(Box::new(ForeignStore(backend)), day_index, GameRules::default())
    }

    /// Open the game with custom rules; `day_index` defaults to today
    #[uniffi::constructor]
    pub fn with_rules(
        backend: Box<dyn PreferenceBackend>,
        day_index: Option<u32>,
        rules: RulesConfig,
    ) -> Arc<Self> {
        Self::build(
            Box::new(ForeignStore(backend)),
            day_index.unwrap_or_else(grid_core::day::today),
            rules.into(),
        )
    }

    /// Open today's game with progress kept in a JSON file.
    ///
    /// Fails if the file exists but cannot be read, rather than starting the
    /// day over.
    #[uniffi::constructor]
    pub fn with_file(path: String) -> Result<Arc<Self>, GameError> {
        let store = JsonFileStore::open(path)?;
        Ok(Self::build(
            Box::new(store),
            grid_core::day::today(),
            GameRules::default(),
        ))
    }

    /// Current state
    pub fn snapshot(&self) -> GameSnapshot {
        snapshot(&self.engine())
    }

    /// Current state as JSON
    pub fn snapshot_json(&self) -> Result<String, GameError> {
        let state = self.engine().state();
        serde_json::to_string(&state).map_err(|err| GameError::Encoding {
            message: err.to_string(),
        })
    }

    /// The level being played
    pub fn level(&self) -> LevelInfo {
        self.engine().level().clone().into()
    }

    /// Begin a new attempt; false once the day is completed or out of tries
    pub fn start_attempt(&self) -> bool {
        self.update(|engine| engine.start_attempt())
    }

    /// Clear the board of the current attempt
    pub fn reset_attempt(&self) {
        self.update(|engine| engine.reset_attempt())
    }

    /// Select a tile; false if it is used, out of range or the attempt is over
    pub fn select_cell(&self, index: u32) -> bool {
        self.update(|engine| engine.select_cell(index as usize))
    }

    /// Apply an operation with the selected tile
    pub fn apply_operation(&self, operation: Operation) -> AttemptResult {
        self.update(|engine| engine.apply_operation(operation.into()))
            .into()
    }

    /// Continue with the next level of the day
    pub fn advance_level(&self) {
        self.update(|engine| engine.advance_level())
    }

    pub fn tile_state(&self, index: u32) -> Option<TileState> {
        self.engine().tile_state(index as usize).map(TileState::from)
    }

    pub fn share_text(&self) -> String {
        self.engine().share_text()
    }

    pub fn tries_remaining(&self) -> u8 {
        self.engine().progress().tries_remaining
    }

    pub fn is_completed(&self) -> bool {
        self.engine().progress().completed
    }

    pub fn has_pending_write(&self) -> bool {
        self.engine().has_pending_write()
    }

    /// Retry a progress write the store refused earlier
    pub fn flush(&self) -> Result<(), GameError> {
        self.engine().flush().map_err(GameError::from)
    }

    pub fn add_observer(&self, observer: Box<dyn GameObserver>) {
        self.observers().push(Arc::from(observer));
    }

    pub fn clear_observers(&self) {
        self.observers().clear();
    }
}

impl DailyGame {
    fn build(store: Store, day_index: u32, rules: GameRules) -> Arc<Self> {
        let engine = GameEngine::with_rules(store, day_index, rules);
        if engine.has_pending_write() {
            log::warn!("day {day_index}: rollover write deferred");
        }
        Arc::new(Self {
            engine: Mutex::new(engine),
            observers: Mutex::new(Vec::new()),
            outbox: Mutex::new(Outbox::default()),
        })
    }

    fn engine(&self) -> MutexGuard<'_, GameEngine<Store>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> MutexGuard<'_, Vec<Arc<dyn GameObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a mutation, then notify observers with the engine lock released so
    /// an observer may call straight back into the game
    fn update<T>(&self, action: impl FnOnce(&mut GameEngine<Store>) -> T) -> T {
        let result = {
            let mut engine = self.engine();
            let before = engine.state();
            let result = action(&mut engine);
            // Queued under the engine lock so the queue follows mutation order
            if engine.state() != before {
                self.outbox().queue.push_back(snapshot(&engine));
            }
            result
        };
        self.deliver();
        result
    }

    /// Drain the outbox unless someone else is already draining it
    fn deliver(&self) {
        {
            let mut outbox = self.outbox();
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }
        loop {
            let next = {
                let mut outbox = self.outbox();
                match outbox.queue.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        outbox.delivering = false;
                        return;
                    }
                }
            };
            let observers = self.observers().clone();
            for observer in observers {
                observer.on_state_changed(next.clone());
            }
        }
    }
}

fn snapshot(engine: &GameEngine<Store>) -> GameSnapshot {
    let state: GameState = engine.state();
    let cells = state
        .grid
        .iter()
        .zip(engine.tile_states())
        .enumerate()
        .map(|(index, (&value, tile))| CellState {
            index: index as u32,
            value,
            state: tile.into(),
        })
        .collect();

    GameSnapshot {
        day_index: state.day_index,
        level_index: state.level_index,
        cells,
        target: state.target,
        start_value: state.start_value,
        running_value: state.running_value,
        move_index: state.move_index,
        max_moves: state.max_moves,
        selected_index: state.selected_index.map(|i| i as u32),
        tries_remaining: state.tries_remaining,
        daily_tries: state.daily_tries,
        completed: state.completed,
        outcome: state.outcome.into(),
        share_text: grid_core::share_text(&state),
    }
}

// MARK: - Free functions

/// Generate the level for a day (same result on every device)
#[uniffi::export]
pub fn generate_level(day_index: u32, level_index: u32) -> LevelInfo {
    grid_core::generate(day_index, level_index).into()
}

/// Day index of a calendar date, `None` for an invalid date
#[uniffi::export]
pub fn day_index_for_date(year: i32, month: u32, day: u32) -> Option<u32> {
    chrono_date(year, month, day).map(grid_core::day::day_index_for)
}

/// Day index of the device's local date
#[uniffi::export]
pub fn today_day_index() -> u32 {
    grid_core::day::today()
}

fn chrono_date(year: i32, month: u32, day: u32) -> Option<grid_core::day::NaiveDate> {
    grid_core::day::NaiveDate::from_ymd_opt(year, month, day)
}
