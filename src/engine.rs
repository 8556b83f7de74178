//! Move requests from outside collaborators
//!
//! A front end (GUI, web handler, console) hands over a position and gets back
//! the column the engine wants to play, or `None` when the game is already over.

use anyhow::Result;
use log::debug;

use crate::{
    bitboard::BitBoard,
    mcts::{MctsConfig, MctsEngine},
    solver::{Solver, SolverConfig},
};

/// Which search answers move requests
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Strategy {
    AlphaBeta(SolverConfig),
    Mcts(MctsConfig),
}

enum Searcher {
    AlphaBeta(Box<Solver>),
    Mcts(MctsEngine),
}

pub struct Engine {
    searcher: Searcher,
}

impl Engine {
    pub fn new(strategy: Strategy) -> Self {
        let searcher = match strategy {
            Strategy::AlphaBeta(config) => Searcher::AlphaBeta(Box::new(Solver::with_config(config))),
            Strategy::Mcts(config) => Searcher::Mcts(MctsEngine::new(config)),
        };
        Self { searcher }
    }

    /// The column to play in `board`, `None` if the board is full or already won
    pub fn request_move(&mut self, board: &BitBoard) -> Option<usize> {
        if board.is_winning_state() || board.is_full() {
            return None;
        }
        let column = match &mut self.searcher {
            Searcher::AlphaBeta(solver) => {
                let mut scratch = *board;
                solver.best_move(&mut scratch)
            }
            Searcher::Mcts(mcts) => mcts.search(board).best_column(),
        };
        debug!("answered move request after {} moves with {:?}", board.move_count(), column);
        column
    }

    /// Like [`Engine::request_move`] for a row-major grid, see [`BitBoard::from_grid`]
    pub fn request_move_from_grid<R: AsRef<[u8]>>(&mut self, rows: &[R]) -> Result<Option<usize>> {
        let board = BitBoard::from_grid(rows)?;
        Ok(self.request_move(&board))
    }

    /// Drops any state kept from earlier requests, for use between games
    pub fn reset(&mut self) {
        if let Searcher::AlphaBeta(solver) = &mut self.searcher {
            solver.reset();
        }
    }
}
