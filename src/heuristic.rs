//! Static evaluation of unfinished positions
//!
//! Everything is computed on the two player bitboards directly. A position is
//! worth, for the evaluated player:
//!
//! * `center` for each of their stones in the middle column,
//! * `three` for each empty cell that would complete one of their 3-alignments
//!   (a run of three or a split `O O _ O`), counted once per direction,
//! * `two` for each run of two that still has two empty cells on one side,
//!
//! minus `opponent_three` and `opponent_two` for the same patterns of the
//! opponent. The opponent weights are the heavier ones, so a position with an
//! unanswered threat against the player is rated below one where the player
//! holds the same threat. Scores are clamped to [`MAX_HEURISTIC`] so they never
//! reach the range used for decided games.

use crate::bitboard::{shift_down, shift_up, BitBoard};
use crate::solver::WIN_SCORE;

/// Largest magnitude a heuristic score may take
pub const MAX_HEURISTIC: i32 = WIN_SCORE - 1;

/// Weights of the evaluation terms, see the [module docs](self)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalWeights {
    pub center: i32,
    pub three: i32,
    pub opponent_three: i32,
    pub two: i32,
    pub opponent_two: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            center: 3,
            three: 5,
            opponent_three: 8,
            two: 2,
            opponent_two: 3,
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HeuristicEvaluator {
    weights: EvalWeights,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Scores an unfinished board for `player`, positive when `player` is better off
    ///
    /// # Panics
    /// If the board is won or full; decided positions are scored by the solver.
    pub fn evaluate(&self, board: &BitBoard, player: usize) -> i32 {
        assert!(
            !board.is_winning_state() && !board.is_full(),
            "heuristic evaluation of a finished position"
        );
        let own = board.player_bitboard(player);
        let opponent = board.player_bitboard(player ^ 1);
        let empty = board.empty_mask();
        let w = &self.weights;

        let center = board.column_mask(board.width() / 2);
        let mut score = w.center * (own & center).count_ones() as i32;

        for shift in board.direction_shifts() {
            score += w.three * open_threes(own, empty, shift) as i32;
            score -= w.opponent_three * open_threes(opponent, empty, shift) as i32;
            score += w.two * open_twos(own, empty, shift) as i32;
            score -= w.opponent_two * open_twos(opponent, empty, shift) as i32;
        }
        score.clamp(-MAX_HEURISTIC, MAX_HEURISTIC)
    }

    /// Empty cells that would give `player` four in a row
    pub fn threats(board: &BitBoard, player: usize) -> u64 {
        let bits = board.player_bitboard(player);
        board
            .direction_shifts()
            .iter()
            .fold(0, |cells, &shift| cells | threat_cells(bits, shift))
            & board.empty_mask()
    }
}

// cells completing a 3-alignment along `shift`, occupied cells included
fn threat_cells(bits: u64, shift: usize) -> u64 {
    // find the upper ends of 3-alignments
    let mut p = shift_up(bits, shift) & shift_up(bits, 2 * shift);
    let mut r = p & shift_up(bits, 3 * shift);
    // find holes of the type ...O O _ O...
    r |= p & shift_down(bits, shift);

    p = shift_down(bits, shift) & shift_down(bits, 2 * shift);
    // find the lower ends of 3-alignments
    r |= p & shift_down(bits, 3 * shift);
    // find holes of the type ...O _ O O...
    r |= p & shift_up(bits, shift);
    r
}

fn open_threes(bits: u64, empty: u64, shift: usize) -> u32 {
    (threat_cells(bits, shift) & empty).count_ones()
}

fn open_twos(bits: u64, empty: u64, shift: usize) -> u32 {
    let pairs = bits & shift_down(bits, shift);
    // both of the next two cells along the line are empty
    let open = empty & shift_down(empty, shift);
    (shift_up(pairs, 2 * shift) & open).count_ones()
        + (shift_down(pairs, 2 * shift) & open).count_ones()
}
