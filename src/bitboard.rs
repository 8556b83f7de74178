use std::collections::HashSet;
use std::fmt;

use crate::{error::BoardError, other_player, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Widest board that still fits a one-row-padded grid in a `u64`
pub const MAX_WIDTH: usize = 32;

/// Most cells any supported board can hold
pub const MAX_CELLS: usize = 64;

/// Returns the column searched at position `index` of the center-first order
/// for a board `width` columns wide: center first, then alternating left and right
pub const fn move_order(width: usize, index: usize) -> usize {
    let center = width / 2;
    if index % 2 == 1 {
        center - (index / 2 + 1)
    } else {
        center + index / 2
    }
}

/// `bits << n`, empty once every bit is shifted out
pub fn shift_up(bits: u64, n: usize) -> u64 {
    bits.checked_shl(n as u32).unwrap_or(0)
}

/// `bits >> n`, empty once every bit is shifted out
pub fn shift_down(bits: u64, n: usize) -> u64 {
    bits.checked_shr(n as u32).unwrap_or(0)
}

/// An ordered, allocation-free list of columns
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Moves {
    len: usize,
    columns: [u8; MAX_WIDTH],
}

impl Moves {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.as_slice().get(index).map(|&c| c as usize)
    }

    pub fn contains(&self, column: usize) -> bool {
        self.iter().any(|c| c == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.as_slice().iter().map(|&c| c as usize)
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Removes the column at `index`, keeping the order of the rest
    pub fn remove(&mut self, index: usize) -> usize {
        assert!(index < self.len, "move index {} out of range", index);
        let column = self.columns[index];
        self.columns.copy_within(index + 1..self.len, index);
        self.len -= 1;
        self.columns[self.len] = 0;
        column as usize
    }

    fn as_slice(&self) -> &[u8] {
        &self.columns[..self.len]
    }
}

impl IntoIterator for Moves {
    type Item = usize;
    type IntoIter = MovesIter;

    fn into_iter(self) -> Self::IntoIter {
        MovesIter { moves: self, next: 0 }
    }
}

pub struct MovesIter {
    moves: Moves,
    next: usize,
}

impl Iterator for MovesIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let column = self.moves.get(self.next)?;
        self.next += 1;
        Some(column)
    }
}

/// A Connect 4 position packed into one `u64` per player
///
/// Cell `(column, row)` lives at bit `column * (height + 1) + row`, with row 0
/// at the bottom. The spare bit on top of every column keeps alignment shifts
/// from wrapping into the neighbouring column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitBoard {
    width: usize,
    height: usize,
    bitboards: [u64; 2],
    // next free bit index of every column
    column_heights: [u8; MAX_WIDTH],
    move_count: usize,
    history: [u8; MAX_CELLS],
}

impl BitBoard {
    /// Creates an empty board of the default 7x6 size
    pub fn new() -> Self {
        Self::empty(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Creates an empty board, checking that it fits the bitboard layout
    pub fn with_dimensions(width: usize, height: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 || width * (height + 1) > MAX_CELLS {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        Ok(Self::empty(width, height))
    }

    fn empty(width: usize, height: usize) -> Self {
        let mut column_heights = [0; MAX_WIDTH];
        for (column, next_free) in column_heights.iter_mut().enumerate().take(width) {
            *next_free = (column * (height + 1)) as u8;
        }
        Self {
            width,
            height,
            bitboards: [0, 0],
            column_heights,
            move_count: 0,
            history: [0; MAX_CELLS],
        }
    }

    /// Parses a default-size game written as 1-indexed column digits, e.g. `"4453"`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self, BoardError> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            // only play available moves
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=DEFAULT_WIDTH) => board.replay(column - 1)?,
                _ => return Err(BoardError::InvalidMoveString(column_char)),
            }
        }
        Ok(board)
    }

    /// Builds a default-size board from 0-indexed columns
    pub fn from_slice(moves: &[usize]) -> Result<Self, BoardError> {
        let mut board = Self::new();
        for &column in moves {
            board.replay(column)?;
        }
        Ok(board)
    }

    fn replay(&mut self, column: usize) -> Result<(), BoardError> {
        // abort if the position is already won
        if self.is_winning_state() {
            return Err(BoardError::GameOver);
        }
        self.play(column)
    }

    /// Converts a row-major grid (top row first, `0` empty, `1` first player,
    /// `2` second player) into a board with a move history that reproduces it
    pub fn from_grid<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows
            .first()
            .map(|row| row.as_ref().len())
            .ok_or_else(|| BoardError::InvalidGrid("grid has no rows".into()))?;
        let mut board = Self::with_dimensions(width, height)?;

        let mut targets = [0u64; 2];
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(BoardError::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    width
                )));
            }
            let bit_row = height - 1 - index;
            for (column, &cell) in row.iter().enumerate() {
                let bit = 1u64 << (column * (height + 1) + bit_row);
                match cell {
                    0 => {}
                    1 => targets[0] |= bit,
                    2 => targets[1] |= bit,
                    other => {
                        return Err(BoardError::InvalidGrid(format!(
                            "unknown cell value {} in row {}",
                            other, index
                        )))
                    }
                }
            }
        }

        let occupied = targets[0] | targets[1];
        for column in 0..width {
            let stack = (occupied & board.column_mask(column)) >> (column * (height + 1));
            // set bits must run contiguously up from the bottom
            if stack & (stack + 1) != 0 {
                return Err(BoardError::InvalidGrid(format!(
                    "floating piece in column {}",
                    column
                )));
            }
        }

        let (first, second) = (targets[0].count_ones(), targets[1].count_ones());
        if first != second && first != second + 1 {
            return Err(BoardError::InvalidGrid(format!(
                "{} first-player and {} second-player pieces cannot alternate",
                first, second
            )));
        }

        let mut dead_ends = HashSet::new();
        if !board.reconstruct_history(&targets, &mut dead_ends) {
            return Err(BoardError::InvalidGrid(
                "no move order reaches this position".into(),
            ));
        }
        Ok(board)
    }

    // depth-first search for an alternating move order that nobody wins before
    // the last stone; the occupancy mask alone identifies a partial replay, so
    // failed masks are never revisited
    fn reconstruct_history(&mut self, targets: &[u64; 2], dead_ends: &mut HashSet<u64>) -> bool {
        let mask = self.mask();
        if mask == targets[0] | targets[1] {
            return true;
        }
        if dead_ends.contains(&mask) {
            return false;
        }
        let player = self.current_player();
        let target_mask = targets[0] | targets[1];
        for column in 0..self.width {
            if targets[player] & (1u64 << self.column_heights[column]) != 0 {
                self.push_move(column);
                // only the final stone may complete an alignment
                let cut_short = self.is_winning_state() && self.mask() != target_mask;
                if !cut_short && self.reconstruct_history(targets, dead_ends) {
                    return true;
                }
                self.pop_move();
            }
        }
        dead_ends.insert(mask);
        false
    }

    /// Inverse of [`BitBoard::from_grid`]
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        (0..self.height)
            .rev()
            .map(|row| {
                (0..self.width)
                    .map(|column| match self.cell(column, row) {
                        Some(0) => 1,
                        Some(_) => 2,
                        None => 0,
                    })
                    .collect()
            })
            .collect()
    }

    /// Owner of a cell, `None` if empty
    pub fn cell(&self, column: usize, row: usize) -> Option<usize> {
        let bit = 1u64 << (column * (self.height + 1) + row);
        (0..2).find(|&player| self.bitboards[player] & bit != 0)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }

    /// Columns played so far, oldest first
    pub fn history(&self) -> &[u8] {
        &self.history[..self.move_count]
    }

    pub fn current_player(&self) -> usize {
        self.move_count & 1
    }

    pub fn last_mover(&self) -> usize {
        other_player(self.move_count)
    }

    pub fn player_bitboard(&self, player: usize) -> u64 {
        self.bitboards[player]
    }

    /// mask of all tiles
    pub fn mask(&self) -> u64 {
        self.bitboards[0] | self.bitboards[1]
    }

    /// Number of stones in a column
    pub fn column_height(&self, column: usize) -> usize {
        self.column_heights[column] as usize - column * (self.height + 1)
    }

    /// Shifts between neighbouring cells: vertical, `\` diagonal, horizontal, `/` diagonal
    pub fn direction_shifts(&self) -> [usize; 4] {
        [1, self.height, self.height + 1, self.height + 2]
    }

    pub fn top_mask(&self, column: usize) -> u64 {
        1 << (column * (self.height + 1) + (self.height - 1))
    }

    pub fn bottom_mask(&self, column: usize) -> u64 {
        1 << (column * (self.height + 1))
    }

    pub fn column_mask(&self, column: usize) -> u64 {
        ((1 << self.height) - 1) << (column * (self.height + 1))
    }

    /// Every playable cell of the board, padding bits excluded
    pub fn full_board_mask(&self) -> u64 {
        (0..self.width).fold(0, |mask, column| mask | self.column_mask(column))
    }

    /// Empty in-bounds cells
    pub fn empty_mask(&self) -> u64 {
        self.full_board_mask() & !self.mask()
    }

    /// The next playable cell of every open column
    pub fn can_play(&self, column: usize) -> bool {
        column < self.width && self.top_mask(column) & self.mask() == 0
    }

    /// Drops a stone for the player to move
    pub fn play(&mut self, column: usize) -> Result<(), BoardError> {
        if column >= self.width {
            return Err(BoardError::ColumnOutOfRange {
                column,
                width: self.width,
            });
        }
        if !self.can_play(column) {
            return Err(BoardError::IllegalMove { column });
        }
        self.push_move(column);
        Ok(())
    }

    /// Takes back the last move, returning its column
    pub fn undo(&mut self) -> Result<usize, BoardError> {
        if self.move_count == 0 {
            return Err(BoardError::EmptyHistory);
        }
        Ok(self.pop_move())
    }

    // caller guarantees `can_play(column)`
    pub(crate) fn push_move(&mut self, column: usize) {
        debug_assert!(self.can_play(column));
        let player = self.current_player();
        self.bitboards[player] |= 1 << self.column_heights[column];
        self.column_heights[column] += 1;
        self.history[self.move_count] = column as u8;
        self.move_count += 1;
    }

    // caller guarantees a non-empty history
    pub(crate) fn pop_move(&mut self) -> usize {
        debug_assert!(self.move_count > 0);
        // the stone belongs to whoever moved last, read before the count drops
        let mover = self.last_mover();
        self.move_count -= 1;
        let column = self.history[self.move_count] as usize;
        self.history[self.move_count] = 0;
        self.column_heights[column] -= 1;
        self.bitboards[mover] ^= 1 << self.column_heights[column];
        column
    }

    fn has_alignment(&self, pos: u64) -> bool {
        for shift in self.direction_shifts() {
            // mark all runs of 2
            let pairs = pos & shift_down(pos, shift);
            // check for runs of 2 * (runs of 2)
            if pairs & shift_down(pairs, 2 * shift) != 0 {
                return true;
            }
        }
        false
    }

    /// Does the player who just moved own four in a row
    pub fn is_winning_state(&self) -> bool {
        self.has_alignment(self.bitboards[self.last_mover()])
    }

    /// Would playing `column` win for the player to move
    pub fn is_winning_move(&self, column: usize) -> bool {
        if !self.can_play(column) {
            return false;
        }
        // play the move on a copy of the mask, keeping the current player
        let pos = self.bitboards[self.current_player()]
            | ((self.mask() + self.bottom_mask(column)) & self.column_mask(column));
        self.has_alignment(pos)
    }

    pub fn is_full(&self) -> bool {
        self.move_count == self.width * self.height
    }

    /// Playable columns, nearest the center first, taller stacks first among equals
    pub fn legal_moves(&self) -> Moves {
        let mut moves = Moves::default();
        for index in 0..self.width {
            let column = move_order(self.width, index);
            if !self.can_play(column) {
                continue;
            }
            let height = self.column_height(column);
            let distance = self.center_distance(column);
            let mut pos = moves.len;
            // columns arrive in distance order, so only equal distances are reordered
            while pos != 0 {
                let previous = moves.columns[pos - 1] as usize;
                if self.center_distance(previous) != distance
                    || self.column_height(previous) >= height
                {
                    break;
                }
                moves.columns[pos] = moves.columns[pos - 1];
                pos -= 1;
            }
            moves.columns[pos] = column as u8;
            moves.len += 1;
        }
        moves
    }

    fn center_distance(&self, column: usize) -> usize {
        let center = self.width / 2;
        if column > center {
            column - center
        } else {
            center - column
        }
    }

    /// Score of a won position for the player who just won: earlier wins score higher
    pub fn terminal_score(&self) -> i32 {
        ((self.width * self.height + 1 - self.move_count) / 2) as i32
    }

    /// [`BitBoard::terminal_score`] signed from `player`'s point of view
    pub fn terminal_score_for(&self, player: usize) -> i32 {
        if player == self.last_mover() {
            self.terminal_score()
        } else {
            -self.terminal_score()
        }
    }

    /// key for transposition table
    pub fn key(&self) -> u64 {
        self.bitboards[self.current_player()] + self.mask()
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.height).rev() {
            let line = (0..self.width)
                .map(|column| match self.cell(column, row) {
                    Some(0) => "x",
                    Some(_) => "o",
                    None => ".",
                })
                .collect::<Vec<_>>()
                .join(" ");
            f.write_str(&line)?;
            if row != 0 {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}
