//! Core chess types and representations
//!
//! This module contains the building blocks the engine works on:
//! - Bitboard representation and rays
//! - Squares, colors and pieces
//! - Move encoding
//! - Board state with make/unmake

pub mod bitboard;
pub mod board;
pub mod moves;
pub mod rays;
pub mod types;

pub use bitboard::{Bitboard, BitboardIter};
pub use board::{BoardInfo, CastlingRights, ChessBoard};
pub use moves::{Move, MoveList, MoveType};
pub use rays::{Direction, Rays};
pub use types::{Color, Piece, PieceType, Square};
