//! Bitboard game state and move execution.
//!
//! A position is two bit patterns in the layout described in
//! [`crate::constants`]: `own` holds the stones of the player about to move,
//! `all` holds every stone on the board. Playing a move first swaps the
//! perspective (`own ^= all`), then drops the new stone into `all`. After the
//! swap, the mover's stones are `own ^ all`, and the outcome is recorded from
//! the point of view of the side now to move: a completed four by the mover
//! is a [`Outcome::Loss`].

use std::fmt;

use thiserror::Error;

use crate::constants::{FULL_BOARD, LINE_SHIFTS, W, bottom_mask, top_mask};
use crate::grid::Grid;

/// Result of the game as seen by the player about to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    InProgress,
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Value of a finished game for the side to move (1 win, 0 loss, 0.5 draw).
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Outcome::Win => Some(1.0),
            Outcome::Loss => Some(0.0),
            Outcome::Draw => Some(0.5),
            Outcome::InProgress => None,
        }
    }
}

/// Reasons a move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: column {0} is out of range")]
    OutOfRange(usize),
    #[error("illegal move: column {0} is full")]
    ColumnFull(usize),
    #[error("illegal move: the game is over")]
    GameOver,
}

/// A Connect Four position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    own: u64,
    all: u64,
    is_first: bool,
    outcome: Outcome,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Empty board, first player to move.
    pub fn new() -> Self {
        Self {
            own: 0,
            all: 0,
            is_first: true,
            outcome: Outcome::InProgress,
        }
    }

    /// Stones of the player about to move.
    #[inline]
    pub fn own_stones(&self) -> u64 {
        self.own
    }

    /// Stones of both players.
    #[inline]
    pub fn all_stones(&self) -> u64 {
        self.all
    }

    /// Stones of the player who moved last.
    #[inline]
    pub fn opponent_stones(&self) -> u64 {
        self.own ^ self.all
    }

    /// Whether the first player is to move.
    #[inline]
    pub fn is_first(&self) -> bool {
        self.is_first
    }

    #[inline]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Number of stones on the board.
    #[inline]
    pub fn moves_played(&self) -> u32 {
        self.all.count_ones()
    }

    /// Whether `col` exists and still has room. Ignores whether the game is over.
    #[inline]
    pub fn is_legal(&self, col: usize) -> bool {
        col < W && self.all & top_mask(col) == 0
    }

    /// Columns that still have room, in ascending order.
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..W).filter(|&col| self.all & top_mask(col) == 0).collect()
    }

    /// Play a stone into `col`.
    pub fn apply_move(&mut self, col: usize) -> Result<(), MoveError> {
        if self.is_done() {
            return Err(MoveError::GameOver);
        }
        if col >= W {
            return Err(MoveError::OutOfRange(col));
        }
        if !self.is_legal(col) {
            return Err(MoveError::ColumnFull(col));
        }
        self.advance(col);
        Ok(())
    }

    /// Play a stone into `col` without validation.
    ///
    /// The caller guarantees the game is in progress and `col` is legal.
    pub(crate) fn advance(&mut self, col: usize) {
        debug_assert!(!self.is_done() && self.is_legal(col));

        self.own ^= self.all;
        self.is_first = !self.is_first;
        self.all |= self.all + bottom_mask(col);

        self.outcome = if has_four(self.own ^ self.all) {
            Outcome::Loss
        } else if self.all == FULL_BOARD {
            Outcome::Draw
        } else {
            Outcome::InProgress
        };
    }
}

/// Whether `pattern` contains four consecutive bits along any board line.
///
/// `t = p & (p >> s)` marks runs of two; `t & (t >> 2s)` marks runs of four.
#[inline]
pub fn has_four(pattern: u64) -> bool {
    LINE_SHIFTS.iter().any(|&shift| {
        let pairs = pattern & (pattern >> shift);
        pairs & (pairs >> (2 * shift)) != 0
    })
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Grid::from_state(self))
    }
}
