//! Bitboard chess core
//!
//! Position representation and legal move generation:
//! - `core`: bitboards, squares, moves and the [`ChessBoard`] state machine
//! - `engine`: attack tables (magic bitboards), move generation, perft
//!
//! ```
//! use bitchess::ChessBoard;
//!
//! let mut board = ChessBoard::new();
//! assert_eq!(board.legal_moves().len(), 20);
//! board.push_uci("e2e4").unwrap();
//! assert!(!board.white_to_move());
//! ```

pub mod core;
pub mod engine;
pub mod error;

pub use crate::core::{
    Bitboard, BoardInfo, CastlingRights, ChessBoard, Color, Direction, Move, MoveList, MoveType,
    Piece, PieceType, Rays, Square,
};
pub use engine::{divide, perft, AttackTables, MoveGen};
pub use error::{ChessError, ChessResult};

/// FEN of the standard starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Build the shared attack tables now instead of on first use
pub fn init() -> &'static AttackTables {
    AttackTables::instance()
}
