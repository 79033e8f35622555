//! Error types for the chess core
//!
//! Every fallible operation in the crate reports through [`ChessError`]:
//! FEN import, move application and square construction.

use thiserror::Error;

/// Errors that can occur while building or mutating a position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// The FEN string failed structural validation
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    /// The move cannot be applied to the current position
    #[error("Illegal move {uci}: {reason}")]
    IllegalMove { uci: String, reason: String },

    /// A square index outside 0..=63
    #[error("Square index {index} out of range (must be 0-63)")]
    IndexOutOfRange { index: usize },
}

impl ChessError {
    pub(crate) fn invalid_fen(fen: &str, reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn illegal_move(uci: impl Into<String>, reason: impl Into<String>) -> Self {
        ChessError::IllegalMove {
            uci: uci.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for chess core operations
pub type ChessResult<T> = Result<T, ChessError>;
