//! A game-state engine and search subsystem for the board game 'Connect 4'
//!
//! Positions are packed into one `u64` per player so that win and overflow
//! checks are a handful of word operations. Two searches run on top of the
//! board: a depth-bounded alpha-beta solver with a bitwise heuristic and a
//! transposition table, and a Monte-Carlo tree search driven by random rollouts.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{bitboard::BitBoard, solver::{Solver, SolverConfig}};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // three in column 4, the second player has to block it
//! let mut board = BitBoard::from_moves("41414")?;
//! let mut solver = Solver::with_config(SolverConfig::default().with_depth(4));
//!
//! assert_eq!(solver.best_move(&mut board), Some(3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod bitboard;

pub mod transposition_table;

pub mod heuristic;

pub mod solver;

pub mod mcts;

pub mod engine;


pub use bitboard::{BitBoard, Moves};
pub use engine::{Engine, Strategy};
pub use error::BoardError;
pub use heuristic::{EvalWeights, HeuristicEvaluator};
pub use mcts::{MctsConfig, MctsEngine, WinRates};
pub use solver::{Solver, SolverConfig};
pub use transposition_table::TranspositionTable;

/// The default width of the game board in tiles
pub const DEFAULT_WIDTH: usize = 7;

/// The default height of the game board in tiles
pub const DEFAULT_HEIGHT: usize = 6;

// ensure that the default dimensions fit in a u64 for the bitboard representation
const_assert!(DEFAULT_WIDTH * (DEFAULT_HEIGHT + 1) <= 64);

/// The player who is not to move after `move_count` stones, i.e. the last mover
pub const fn other_player(move_count: usize) -> usize {
    (move_count + 1) & 1
}
