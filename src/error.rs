use thiserror::Error;

/// Errors produced while building or mutating a [`BitBoard`](crate::bitboard::BitBoard)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Invalid move, column {column} full")]
    IllegalMove { column: usize },

    #[error("Invalid move, column {column} out of range. Columns must be between 0 and {}", .width - 1)]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("No moves to undo")]
    EmptyHistory,

    #[error("Board of {width}x{height} does not fit in a 64-bit bitboard")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("could not parse '{0}' as a valid move")]
    InvalidMoveString(char),

    #[error("Invalid position, game is over")]
    GameOver,
}
