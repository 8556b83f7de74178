//! An alpha-beta agent for Connect 4

use log::{debug, trace};

use crate::{
    bitboard::BitBoard,
    heuristic::{EvalWeights, HeuristicEvaluator},
    transposition_table::{TranspositionTable, DEFAULT_CAPACITY},
};

/// The smallest score of a decided game, a win with the final stone of the board
pub const WIN_SCORE: i32 = 10_000;

/// Bound of every search window, beyond any reachable score
pub const INFINITY: i32 = 1_000_000;

/// How a stored score relates to the true value of its position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

/// Search result cached in the transposition table, scored for the player to move
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchEntry {
    pub score: i32,
    pub depth: u8,
    pub bound: Bound,
    pub best_move: Option<u8>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Plies searched by [`Solver::best_move`]
    pub depth: u32,
    /// Slots in the transposition table
    pub table_capacity: usize,
    pub weights: EvalWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            depth: 8,
            table_capacity: DEFAULT_CAPACITY,
            weights: EvalWeights::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }

    pub fn with_weights(mut self, weights: EvalWeights) -> Self {
        self.weights = weights;
        self
    }
}

/// An agent to search Connect 4 positions
///
/// # Position Scoring
/// Scores are seen from the maximizing player. A won game is worth
/// `WIN_SCORE + terminal_score()` to the winner, so quicker wins are worth more
/// and every decided result lies outside the heuristic range. A draw scores 0,
/// and positions at the search horizon get the [`HeuristicEvaluator`] score.
///
/// The board is searched in place: every `play` made while descending is
/// taken back before the call returns.
#[derive(Clone)]
pub struct Solver {
    config: SolverConfig,
    evaluator: HeuristicEvaluator,
    transposition_table: TranspositionTable<SearchEntry>,

    /// The number of nodes searched by this `Solver` so far (for diagnostics only)
    pub node_count: usize,
    maximizer: usize,
    // (width, height, maximizer) the table entries were computed for
    table_owner: Option<(usize, usize, usize)>,
}

impl Solver {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            evaluator: HeuristicEvaluator::new(config.weights),
            transposition_table: TranspositionTable::with_capacity(config.table_capacity),
            node_count: 0,
            maximizer: 0,
            table_owner: None,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Forgets every cached result, for use between unrelated games
    pub fn reset(&mut self) {
        trace!("clearing {} table slots", self.transposition_table.capacity());
        self.transposition_table.reset();
        self.table_owner = None;
    }

    /// Searches `depth` plies below `board` inside the window `[alpha, beta]`
    ///
    /// `maximizing` tells whether the player to move is the maximizer. Returns the
    /// score from the maximizer's point of view and the best column for the player
    /// to move, or `None` when the board is already decided or `depth` is 0.
    ///
    /// # Panics
    /// If an unfinished board has no legal move.
    pub fn solve(
        &mut self,
        board: &mut BitBoard,
        depth: u32,
        alpha: i32,
        beta: i32,
        maximizing: bool,
    ) -> (i32, Option<usize>) {
        let mover = board.current_player();
        let maximizer = if maximizing { mover } else { mover ^ 1 };
        self.claim_table(board, maximizer);

        let alpha = alpha.clamp(-INFINITY, INFINITY);
        let beta = beta.clamp(-INFINITY, INFINITY);
        if maximizing {
            self.negamax(board, depth, alpha, beta)
        } else {
            // the window is flipped for the minimizer
            let (score, column) = self.negamax(board, depth, -beta, -alpha);
            (-score, column)
        }
    }

    /// The column to play at the configured depth, `None` if the game is over
    pub fn best_move(&mut self, board: &mut BitBoard) -> Option<usize> {
        if board.is_winning_state() || board.is_full() {
            return None;
        }
        let nodes_before = self.node_count;
        let (score, column) = self.solve(board, self.config.depth, -INFINITY, INFINITY, true);
        debug!(
            "depth {} search after {} moves: score {}, column {:?}, {} nodes",
            self.config.depth,
            board.move_count(),
            score,
            column,
            self.node_count - nodes_before
        );
        column
    }

    // entries are keyed by position only, so they are only reused for the same
    // board size and the same maximizing player
    fn claim_table(&mut self, board: &BitBoard, maximizer: usize) {
        let owner = (board.width(), board.height(), maximizer);
        if self.table_owner != Some(owner) {
            if self.table_owner.is_some() {
                self.reset();
            }
            self.table_owner = Some(owner);
        }
        self.maximizer = maximizer;
    }

    // heuristic score of the horizon, for the player to move
    fn leaf_score(&self, board: &BitBoard) -> i32 {
        let score = self.evaluator.evaluate(board, self.maximizer);
        if board.current_player() == self.maximizer {
            score
        } else {
            -score
        }
    }

    /// Performs game tree search
    ///
    /// Returns the score for the player to move and the column that achieves it
    fn negamax(
        &mut self,
        board: &mut BitBoard,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
    ) -> (i32, Option<usize>) {
        self.node_count += 1;

        // the previous player completed an alignment
        if board.is_winning_state() {
            return (-(WIN_SCORE + board.terminal_score()), None);
        }
        if depth == 0 {
            let score = if board.is_full() { 0 } else { self.leaf_score(board) };
            return (score, None);
        }
        // check for draw
        if board.is_full() {
            return (0, None);
        }

        let key = board.key();
        let alpha_before = alpha;
        if let Some(entry) = self.transposition_table.get(key) {
            if u32::from(entry.depth) >= depth {
                let column = entry.best_move.map(usize::from);
                match entry.bound {
                    Bound::Exact => return (entry.score, column),
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    // prune the exploration
                    return (entry.score, column);
                }
            }
        }

        let moves = board.legal_moves();
        assert!(
            !moves.is_empty(),
            "no legal move in an unfinished position:\n{}",
            board
        );

        let mut best_score = -INFINITY;
        let mut best_move = None;
        for column in moves {
            board.push_move(column);
            // the search window is flipped for the other player
            let (score, _) = self.negamax(board, depth - 1, -beta, -alpha);
            board.pop_move();
            let score = -score;

            if score > best_score {
                best_score = score;
                best_move = Some(column);
            }
            alpha = alpha.max(score);
            // a perfect opponent will not let the game reach this branch
            if beta <= alpha {
                break;
            }
        }

        let bound = if best_score <= alpha_before {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.transposition_table.put(
            key,
            SearchEntry {
                score: best_score,
                depth: u8::try_from(depth).unwrap_or(u8::MAX),
                bound,
                best_move: best_move.map(|c| c as u8),
            },
        );
        (best_score, best_move)
    }

    /// Does a score announce a won or lost game rather than an estimate
    pub fn is_win_score(score: i32) -> bool {
        score.abs() >= WIN_SCORE
    }

    /// Converts a score returned by [`Solver::solve`] with `maximizing = true`,
    /// i.e. from the side to move in `board`, into the number of plies until the
    /// forced result, `None` for an estimate
    pub fn win_distance(score: i32, board: &BitBoard) -> Option<usize> {
        if !Self::is_win_score(score) {
            return None;
        }
        let magnitude = (score.abs() - WIN_SCORE) as usize;
        let winner = if score > 0 {
            board.current_player()
        } else {
            board.current_player() ^ 1
        };
        // terminal_score() rounds down, the winner's parity picks the final move count
        let mut final_count = (board.width() * board.height() + 1).checked_sub(2 * magnitude)?;
        if (final_count + 1) & 1 != winner {
            final_count = final_count.checked_sub(1)?;
        }
        final_count.checked_sub(board.move_count())
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
