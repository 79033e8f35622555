//! Move generation
//!
//! Moves are generated pseudo-legally per piece class, then filtered:
//! - Pawn single pushes (promotions first), double pushes, captures
//! - Knights and kings from the leaper tables
//! - Rooks, bishops and queens from the magic tables
//! - Castling, checked for empty and unattacked squares up front
//!
//! The legality filter plays each candidate on a copy of the state and
//! drops it if the mover's king is left in check.

use crate::core::bitboard::Bitboard;
use crate::core::board::{CastleSide, ChessBoard};
use crate::core::moves::{Move, MoveList};
use crate::core::types::{Color, PieceType};

/// Move generator over a [`ChessBoard`]
pub struct MoveGen;

impl MoveGen {
    /// Every legal move for the side to move, in generation order
    pub fn generate_legal_moves(board: &ChessBoard) -> MoveList {
        let mut moves = Self::generate_pseudo_legal_moves(board);
        let tables = board.tables();
        let us = board.side_to_move();
        moves.retain(|mv| {
            let mut scratch = *board.info();
            scratch.apply(mv);
            !scratch.king_in_check(tables, us)
        });
        moves
    }

    /// Every move that follows piece movement rules, ignoring own-king safety
    /// (castling excepted: its squares are checked for attacks here)
    pub fn generate_pseudo_legal_moves(board: &ChessBoard) -> MoveList {
        let mut moves = MoveList::new();
        Self::generate_pawn_pushes(board, &mut moves);
        Self::generate_pawn_double_pushes(board, &mut moves);
        Self::generate_pawn_captures(board, &mut moves);
        Self::generate_leaper_moves(board, PieceType::Knight, &mut moves);
        Self::generate_leaper_moves(board, PieceType::King, &mut moves);
        Self::generate_slider_moves(board, PieceType::Rook, &mut moves);
        Self::generate_slider_moves(board, PieceType::Bishop, &mut moves);
        Self::generate_slider_moves(board, PieceType::Queen, &mut moves);
        Self::generate_castling_moves(board, &mut moves);
        moves
    }

    /// One-square pawn pushes; pushes onto the last rank become four promotions
    pub fn generate_pawn_pushes(board: &ChessBoard, moves: &mut MoveList) {
        let us = board.side_to_move();
        let empty = !board.blockers();
        let pawns = board.board(us, PieceType::Pawn);
        let targets = forward(pawns, us) & empty;
        let last_rank = Bitboard::rank_mask(us.promotion_rank());

        for to in targets & last_rank {
            if let Some(from) = to.offset(-us.pawn_direction()) {
                for piece in PieceType::PROMOTIONS {
                    moves.push(Move::new_promotion(from, to, piece));
                }
            }
        }
        for to in targets & !last_rank {
            if let Some(from) = to.offset(-us.pawn_direction()) {
                moves.push(Move::new(from, to));
            }
        }
    }

    /// Two-square pushes from the home rank over an empty square
    pub fn generate_pawn_double_pushes(board: &ChessBoard, moves: &mut MoveList) {
        let us = board.side_to_move();
        let empty = !board.blockers();
        let home = board.board(us, PieceType::Pawn) & Bitboard::rank_mask(us.pawn_start_rank());
        let targets = forward(forward(home, us) & empty, us) & empty;

        for to in targets {
            if let Some(from) = to.offset(-2 * us.pawn_direction()) {
                moves.push(Move::new(from, to));
            }
        }
    }

    /// En-passant captures, then capture-promotions and plain captures
    pub fn generate_pawn_captures(board: &ChessBoard, moves: &mut MoveList) {
        let tables = board.tables();
        let us = board.side_to_move();
        let them = board.color_board(us.opposite());
        let pawns = board.board(us, PieceType::Pawn);

        if let Some(target) = board.en_passant_target(us) {
            // Our pawns that attack the target are the squares an enemy pawn
            // on the target would attack
            for from in tables.pawn_attacks(us.opposite(), target) & pawns {
                moves.push(Move::new_en_passant(from, target));
            }
        }

        for from in pawns {
            for to in tables.pawn_attacks(us, from) & them {
                if to.rank() == us.promotion_rank() {
                    for piece in PieceType::PROMOTIONS {
                        moves.push(Move::new_promotion(from, to, piece));
                    }
                } else {
                    moves.push(Move::new(from, to));
                }
            }
        }
    }

    /// Knight or king moves onto empty or enemy squares
    pub fn generate_leaper_moves(board: &ChessBoard, piece: PieceType, moves: &mut MoveList) {
        let tables = board.tables();
        let us = board.side_to_move();
        let own = board.color_board(us);

        for from in board.board(us, piece) {
            for to in tables.non_sliding_attacks(us, piece, from) & !own {
                moves.push(Move::new(from, to));
            }
        }
    }

    /// Rook, bishop or queen moves up to and including the first blocker
    pub fn generate_slider_moves(board: &ChessBoard, piece: PieceType, moves: &mut MoveList) {
        let tables = board.tables();
        let us = board.side_to_move();
        let own = board.color_board(us);
        let blockers = board.blockers();

        for from in board.board(us, piece) {
            for to in tables.sliding_attacks(piece, from, blockers) & !own {
                moves.push(Move::new(from, to));
            }
        }
    }

    /// Castling: right held, king and rook at home, squares between them
    /// empty and the king's start, transit and end squares not attacked
    pub fn generate_castling_moves(board: &ChessBoard, moves: &mut MoveList) {
        let us = board.side_to_move();
        let rights = board.castling_rights();

        for side in CastleSide::for_color(us) {
            let ready = rights.has(side.right)
                && board.board(us, PieceType::King).contains(side.king_from)
                && board.board(us, PieceType::Rook).contains(side.rook_from)
                && (board.blockers() & side.must_be_empty).is_empty();
            if ready && !side.king_path.iter().any(|&sq| board.square_attacked(sq, us)) {
                moves.push(Move::new_castling(side.king_from, side.king_to));
            }
        }
    }
}

/// Shift one rank towards the opponent
#[inline]
fn forward(bb: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => bb.north(),
        Color::Black => bb.south(),
    }
}
