//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves until the game ends and
//! scores the final position. The random generator is always passed in, so a
//! seeded [`fastrand::Rng`] gives reproducible simulations.

use fastrand::Rng;

use crate::state::State;

/// Pick a uniformly random legal column, or `None` if every column is full.
pub fn random_move(state: &State, rng: &mut Rng) -> Option<usize> {
    let moves = state.legal_moves();
    if moves.is_empty() {
        return None;
    }
    Some(moves[rng.usize(..moves.len())])
}

/// Play random moves until the game is over.
///
/// Returns the value from the perspective of the player to move at the start:
/// 1.0 for a win, 0.0 for a loss, 0.5 for a draw.
pub fn playout(state: &mut State, rng: &mut Rng) -> f64 {
    let mut plies = 0u32;

    let value = loop {
        if let Some(value) = state.outcome().value() {
            break value;
        }
        match random_move(state, rng) {
            Some(col) => state.advance(col),
            // Unreachable while the outcome is tracked correctly: a full board is a draw.
            None => break 0.5,
        }
        plies += 1;
    };

    // Each ply hands the position to the other side.
    if plies % 2 == 0 { value } else { 1.0 - value }
}
