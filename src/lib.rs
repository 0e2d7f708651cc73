//! Connect-MCTS: a Connect Four engine built on Monte Carlo Tree Search.
//!
//! The board is a pair of 64-bit patterns (the stones of the side to move and
//! all stones), which makes move application and four-in-a-row detection a
//! handful of bit operations. On top of it sits a time-bounded MCTS that uses
//! UCB1 selection and uniformly random playouts.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, bit layout and search parameters
//! - [`state`] - Bitboard position, move execution and outcomes
//! - [`grid`] - 2D view of a position for display and cross-checking
//! - [`playout`] - Random game simulation for position evaluation
//! - [`mcts`] - Monte Carlo Tree Search with UCB1
//! - [`shell`] - Text protocol for driving the engine
//!
//! ## Example
//!
//! ```
//! use connect_mcts::mcts::choose_move;
//! use connect_mcts::state::State;
//!
//! let mut state = State::new();
//! state.apply_move(3).unwrap();
//!
//! // Think for 50 ms and answer.
//! let reply = choose_move(&state, 50).unwrap();
//! state.apply_move(reply).unwrap();
//! println!("{state}");
//! ```

pub mod constants;
pub mod grid;
pub mod mcts;
pub mod playout;
pub mod shell;
pub mod state;
