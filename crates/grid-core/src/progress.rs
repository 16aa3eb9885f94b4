use crate::config::GameRules;
use crate::engine::AttemptOutcome;
use crate::error::Result;
use crate::store::{PreferenceStore, StoredValue, COMPLETED_KEY, DAY_KEY, TRIES_KEY};
use serde::{Deserialize, Serialize};

/// Persisted per-day bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub day_index: u32,
    pub tries_remaining: u8,
    pub completed: bool,
}

impl DailyProgress {
    /// Full budget for a new day
    pub fn fresh(day_index: u32, rules: &GameRules) -> Self {
        Self {
            day_index,
            tries_remaining: rules.daily_tries,
            completed: false,
        }
    }

    /// Load progress for `today`, resetting it when the stored day differs.
    ///
    /// A store that has never been written counts as holding today with
    /// default values. The returned flag is true when a rollover happened and
    /// the fresh record still needs to be written.
    pub fn load<S: PreferenceStore + ?Sized>(
        store: &S,
        today: u32,
        rules: &GameRules,
    ) -> (Self, bool) {
        let stored_day = store
            .get_int(DAY_KEY)
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(today);

        if stored_day != today {
            log::info!("new day {today} (stored day {stored_day}), resetting tries");
            return (Self::fresh(today, rules), true);
        }

        let tries_remaining = store
            .get_int(TRIES_KEY)
            .and_then(|t| u8::try_from(t).ok())
            .unwrap_or(rules.daily_tries)
            .min(rules.daily_tries);
        let completed = store.get_bool(COMPLETED_KEY).unwrap_or(false);

        (
            Self {
                day_index: today,
                tries_remaining,
                completed,
            },
            false,
        )
    }

    /// Whether another attempt may be started today
    pub fn can_start(&self) -> bool {
        !self.completed && self.tries_remaining > 0
    }

    /// Charge a finished attempt against the day.
    ///
    /// A loss costs one try (never below zero). The day completes on a win
    /// when the rules say so, or when no tries remain.
    pub fn record_outcome(&mut self, outcome: AttemptOutcome, rules: &GameRules) {
        match outcome {
            AttemptOutcome::Lost => {
                self.tries_remaining = self.tries_remaining.saturating_sub(1);
            }
            AttemptOutcome::Won => {
                if rules.complete_on_win {
                    self.completed = true;
                }
            }
            AttemptOutcome::InProgress => return,
        }
        if self.tries_remaining == 0 {
            self.completed = true;
        }
    }

    /// Key/value entries written for this record
    pub fn entries(&self) -> [(&'static str, StoredValue); 3] {
        [
            (DAY_KEY, StoredValue::Int(i64::from(self.day_index))),
            (TRIES_KEY, StoredValue::Int(i64::from(self.tries_remaining))),
            (COMPLETED_KEY, StoredValue::Bool(self.completed)),
        ]
    }

    /// Write all three keys as one batch
    pub fn save<S: PreferenceStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.set_all(&self.entries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn stored(day: i64, tries: i64, completed: bool) -> MemoryStore {
        MemoryStore::with_entries(&[
            (DAY_KEY, StoredValue::Int(day)),
            (TRIES_KEY, StoredValue::Int(tries)),
            (COMPLETED_KEY, StoredValue::Bool(completed)),
        ])
    }

    #[test]
    fn test_empty_store_defaults_to_today() {
        let rules = GameRules::default();
        let (progress, rolled) = DailyProgress::load(&MemoryStore::new(), 20, &rules);
        assert_eq!(progress, DailyProgress::fresh(20, &rules));
        assert!(!rolled);
    }

    #[test]
    fn test_same_day_keeps_stored_values() {
        let rules = GameRules::default();
        let (progress, rolled) = DailyProgress::load(&stored(20, 2, true), 20, &rules);
        assert_eq!(progress.tries_remaining, 2);
        assert!(progress.completed);
        assert!(!rolled);
    }

    #[test]
    fn test_new_day_resets() {
        let rules = GameRules::default();
        let (progress, rolled) = DailyProgress::load(&stored(19, 0, true), 20, &rules);
        assert_eq!(progress.day_index, 20);
        assert_eq!(progress.tries_remaining, 5);
        assert!(!progress.completed);
        assert!(rolled);
    }

    #[test]
    fn test_out_of_range_tries_use_default_or_cap() {
        let rules = GameRules::default();
        let (progress, _) = DailyProgress::load(&stored(3, -2, false), 3, &rules);
        assert_eq!(progress.tries_remaining, 5);
        let (progress, _) = DailyProgress::load(&stored(3, 9, false), 3, &rules);
        assert_eq!(progress.tries_remaining, 5);
    }

    #[test]
    fn test_loss_charges_a_try() {
        let rules = GameRules::default();
        let mut progress = DailyProgress::fresh(1, &rules);
        progress.record_outcome(AttemptOutcome::Lost, &rules);
        assert_eq!(progress.tries_remaining, 4);
        assert!(!progress.completed);
    }

    #[test]
    fn test_last_loss_completes_day() {
        let rules = GameRules::default();
        let mut progress = DailyProgress {
            day_index: 1,
            tries_remaining: 1,
            completed: false,
        };
        progress.record_outcome(AttemptOutcome::Lost, &rules);
        assert_eq!(progress.tries_remaining, 0);
        assert!(progress.completed);

        progress.record_outcome(AttemptOutcome::Lost, &rules);
        assert_eq!(progress.tries_remaining, 0);
    }

    #[test]
    fn test_win_completion_follows_rules() {
        let mut progress = DailyProgress::fresh(1, &GameRules::default());
        progress.record_outcome(AttemptOutcome::Won, &GameRules::default());
        assert!(progress.completed);
        assert_eq!(progress.tries_remaining, 5);

        let mut progress = DailyProgress::fresh(1, &GameRules::practice());
        progress.record_outcome(AttemptOutcome::Won, &GameRules::practice());
        assert!(!progress.completed);
        assert!(progress.can_start());
    }

    #[test]
    fn test_save_writes_one_batch() {
        let mut store = MemoryStore::new();
        let progress = DailyProgress {
            day_index: 7,
            tries_remaining: 3,
            completed: false,
        };
        progress.save(&mut store).unwrap();
        assert_eq!(store.commits(), 1);
        assert_eq!(store.get_int(DAY_KEY), Some(7));
        assert_eq!(store.get_int(TRIES_KEY), Some(3));
        assert_eq!(store.get_bool(COMPLETED_KEY), Some(false));
    }
}
