use crate::engine::{AttemptOutcome, GameState};

/// One-line result summary for sharing, e.g.
/// `Beat the Grid Day 12: WIN. Target 7, final 7. Moves 3/4.`
///
/// Days are shown 1-based. Anything but a win reads as a loss.
pub fn share_text(state: &GameState) -> String {
    let status = if state.outcome == AttemptOutcome::Won {
        "WIN"
    } else {
        "LOSE"
    };
    format!(
        "Beat the Grid Day {}: {}. Target {}, final {}. Moves {}/{}.",
        u64::from(state.day_index) + 1,
        status,
        state.target,
        state.running_value,
        state.move_index,
        state.max_moves
    )
}
