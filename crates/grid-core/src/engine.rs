use crate::config::GameRules;
use crate::day;
use crate::error::Result;
use crate::level::{self, Level};
use crate::progress::DailyProgress;
use crate::share;
use crate::store::PreferenceStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Arithmetic applied to the running value with the selected cell as operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    /// Result of `running <op> operand`, or `None` if the move is not allowed.
    ///
    /// Division requires a non-zero operand that divides the running value
    /// exactly. Results that overflow are refused as well.
    pub fn apply(self, running: i64, operand: i64) -> Option<i64> {
        match self {
            Operation::Add => running.checked_add(operand),
            Operation::Subtract => running.checked_sub(operand),
            Operation::Multiply => running.checked_mul(operand),
            Operation::Divide => {
                if operand == 0 || running.checked_rem(operand)? != 0 {
                    return None;
                }
                running.checked_div(operand)
            }
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
            Operation::Multiply => '×',
            Operation::Divide => '÷',
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Outcome of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptOutcome {
    InProgress,
    Won,
    Lost,
}

impl AttemptOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttemptOutcome::InProgress)
    }
}

/// What an applied operation meant for the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    /// Attempt still running (or the operation was ignored)
    Continue,
    /// Attempt reached a terminal outcome and the day's progress was updated
    Finished(AttemptOutcome),
}

/// Display state of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    Available,
    Used,
    Selected,
}

/// Mutable record of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    selected: Option<usize>,
    used: BTreeSet<usize>,
    moves: u8,
    running_value: i64,
    outcome: AttemptOutcome,
}

impl AttemptState {
    fn new(start_value: i64) -> Self {
        Self {
            selected: None,
            used: BTreeSet::new(),
            moves: 0,
            running_value: start_value,
            outcome: AttemptOutcome::InProgress,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn used(&self) -> &BTreeSet<usize> {
        &self.used
    }

    pub fn moves(&self) -> u8 {
        self.moves
    }

    pub fn running_value(&self) -> i64 {
        self.running_value
    }

    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }
}

/// Read-only snapshot of everything the UI renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub day_index: u32,
    pub level_index: u32,
    pub grid: Vec<i64>,
    pub target: i64,
    pub start_value: i64,
    pub running_value: i64,
    pub move_index: u8,
    pub max_moves: u8,
    pub used_indices: Vec<usize>,
    pub selected_index: Option<usize>,
    pub tries_remaining: u8,
    pub daily_tries: u8,
    pub completed: bool,
    pub outcome: AttemptOutcome,
}

type Listener = Box<dyn FnMut(&GameState) + Send>;

/// The daily game: current level, the running attempt and the day's progress.
///
/// Every action is a guarded reducer step: actions that are not allowed in
/// the current state leave it untouched. Listeners registered with
/// [`GameEngine::subscribe`] receive a snapshot after each effective change.
pub struct GameEngine<S: PreferenceStore> {
    store: S,
    rules: GameRules,
    level: Level,
    attempt: AttemptState,
    progress: DailyProgress,
    /// Progress record not yet accepted by the store
    pending_write: Option<DailyProgress>,
    listeners: Vec<Listener>,
}

impl<S: PreferenceStore> GameEngine<S> {
    /// Open the game for the local calendar day
    pub fn open_today(store: S) -> Self {
        Self::new(store, day::today())
    }

    /// Open the game for a given day index with default rules
    pub fn new(store: S, today: u32) -> Self {
        Self::with_rules(store, today, GameRules::default())
    }

    /// Open the game for a given day index.
    ///
    /// Performs the day rollover: progress stored for another day is replaced
    /// by a fresh budget, which is written back immediately.
    pub fn with_rules(store: S, today: u32, rules: GameRules) -> Self {
        let (progress, rolled_over) = DailyProgress::load(&store, today, &rules);
        let level = level::generate(today, 1);
        let attempt = AttemptState::new(level.start_value);

        let mut engine = Self {
            store,
            rules,
            level,
            attempt,
            progress,
            pending_write: None,
            listeners: Vec::new(),
        };
        if rolled_over {
            engine.persist();
        }
        engine
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    pub fn progress(&self) -> DailyProgress {
        self.progress
    }

    pub fn day_index(&self) -> u32 {
        self.progress.day_index
    }

    pub fn level_index(&self) -> u32 {
        self.level.level_index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Whether a progress write is still waiting for the store
    pub fn has_pending_write(&self) -> bool {
        self.pending_write.is_some()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> GameState {
        GameState {
            day_index: self.progress.day_index,
            level_index: self.level.level_index,
            grid: self.level.grid.clone(),
            target: self.level.target,
            start_value: self.level.start_value,
            running_value: self.attempt.running_value,
            move_index: self.attempt.moves,
            max_moves: self.rules.max_moves,
            used_indices: self.attempt.used.iter().copied().collect(),
            selected_index: self.attempt.selected,
            tries_remaining: self.progress.tries_remaining,
            daily_tries: self.rules.daily_tries,
            completed: self.progress.completed,
            outcome: self.attempt.outcome,
        }
    }

    /// Register a callback invoked with a fresh snapshot after every change
    pub fn subscribe(&mut self, listener: impl FnMut(&GameState) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Start a new attempt on the current level.
    ///
    /// Refused once the day is completed or out of tries.
    pub fn start_attempt(&mut self) -> bool {
        if !self.progress.can_start() {
            log::debug!(
                "start refused: completed={}, tries={}",
                self.progress.completed,
                self.progress.tries_remaining
            );
            return false;
        }
        self.attempt = AttemptState::new(self.level.start_value);
        self.notify();
        true
    }

    /// Clear the board back to the start value without checking the budget
    pub fn reset_attempt(&mut self) {
        self.attempt = AttemptState::new(self.level.start_value);
        self.notify();
    }

    /// Select a cell as the next operand
    pub fn select_cell(&mut self, index: usize) -> bool {
        if index >= self.level.grid.len()
            || self.attempt.used.contains(&index)
            || self.attempt.outcome != AttemptOutcome::InProgress
        {
            return false;
        }
        self.attempt.selected = Some(index);
        self.notify();
        true
    }

    /// Apply an operation with the selected cell.
    ///
    /// Ignored (returns [`AttemptResult::Continue`] without changes) when no
    /// cell is selected or the operation is not allowed. On a terminal outcome
    /// the day's progress is updated and written before returning.
    pub fn apply_operation(&mut self, op: Operation) -> AttemptResult {
        if self.attempt.outcome.is_terminal() {
            return AttemptResult::Continue;
        }
        let Some(index) = self.attempt.selected else {
            return AttemptResult::Continue;
        };
        let Some(operand) = self.level.cell(index) else {
            return AttemptResult::Continue;
        };
        let Some(value) = op.apply(self.attempt.running_value, operand) else {
            log::debug!(
                "rejected {} {op} {operand}",
                self.attempt.running_value
            );
            return AttemptResult::Continue;
        };

        self.attempt.running_value = value;
        self.attempt.moves = self.attempt.moves.saturating_add(1);
        self.attempt.used.insert(index);
        self.attempt.selected = None;

        let outcome = if value == self.level.target {
            AttemptOutcome::Won
        } else if self.attempt.moves >= self.rules.max_moves {
            AttemptOutcome::Lost
        } else {
            AttemptOutcome::InProgress
        };
        self.attempt.outcome = outcome;

        if !outcome.is_terminal() {
            self.notify();
            return AttemptResult::Continue;
        }

        self.progress.record_outcome(outcome, &self.rules);
        log::info!(
            "day {} level {} finished: {outcome:?} at {value}, {} tries left",
            self.progress.day_index,
            self.level.level_index,
            self.progress.tries_remaining
        );
        self.persist();
        self.notify();
        AttemptResult::Finished(outcome)
    }

    /// Move on to the next level of the same day, keeping the daily budget
    pub fn advance_level(&mut self) {
        let next = self.level.level_index.saturating_add(1);
        self.level = level::generate(self.progress.day_index, next);
        self.attempt = AttemptState::new(self.level.start_value);
        log::info!("advanced to level {next} on day {}", self.progress.day_index);
        self.notify();
    }

    /// Display state of a cell, `None` if out of range
    pub fn tile_state(&self, index: usize) -> Option<TileState> {
        if index >= self.level.grid.len() {
            return None;
        }
        let state = if self.attempt.selected == Some(index) {
            TileState::Selected
        } else if self.attempt.used.contains(&index) {
            TileState::Used
        } else {
            TileState::Available
        };
        Some(state)
    }

    pub fn tile_states(&self) -> Vec<TileState> {
        (0..self.level.grid.len())
            .filter_map(|i| self.tile_state(i))
            .collect()
    }

    /// Shareable one-line summary of the attempt
    pub fn share_text(&self) -> String {
        share::share_text(&self.state())
    }

    /// Write any progress record the store has not accepted yet
    pub fn flush(&mut self) -> Result<()> {
        if let Some(progress) = self.pending_write {
            progress.save(&mut self.store)?;
            self.pending_write = None;
        }
        Ok(())
    }

    /// Queue the current progress and try to write it. Each record carries
    /// all keys, so a newer record supersedes any older pending one.
    fn persist(&mut self) {
        self.pending_write = Some(self.progress);
        if let Err(err) = self.flush() {
            log::warn!("progress write for day {} deferred: {err}", self.progress.day_index);
        }
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let state = self.state();
        for listener in &mut self.listeners {
            listener(&state);
        }
    }
}

impl<S: PreferenceStore> Drop for GameEngine<S> {
    /// Last chance for a deferred progress write before the app goes away
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            log::error!(
                "progress for day {} was never written: {err}",
                self.progress.day_index
            );
        }
    }
}
