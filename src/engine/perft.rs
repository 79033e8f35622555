//! Perft: count leaf nodes of the legal move tree
//!
//! Used to check move generation against published node counts.

use crate::core::board::ChessBoard;
use crate::core::moves::Move;

/// Number of legal move sequences of length `depth` from `board`
pub fn perft(board: &mut ChessBoard, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = board.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for &mv in moves.iter() {
        if board.push_move(mv).is_ok() {
            nodes += perft(board, depth - 1);
            board.pop_move();
        }
    }
    nodes
}

/// Perft split by root move, in generation order
pub fn divide(board: &mut ChessBoard, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    let moves = board.legal_moves();
    let mut counts = Vec::with_capacity(moves.len());
    for &mv in moves.iter() {
        if board.push_move(mv).is_ok() {
            counts.push((mv, perft(board, depth - 1)));
            board.pop_move();
        }
    }
    counts
}
