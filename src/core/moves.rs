//! Move representation
//!
//! Moves are encoded in 16 bits:
//! - bits 0-5: to square (0-63)
//! - bits 6-11: from square (0-63)
//! - bits 12-13: promotion piece offset from Knight (0=Knight, 1=Bishop, 2=Rook, 3=Queen)
//! - bits 14-15: move type (0=Normal, 1=Promotion, 2=En Passant, 3=Castling)
//!
//! Every 16-bit value decodes to some move, so a `Move` carries no validity
//! guarantee on its own; the board decides whether it can be played.

use super::types::{PieceType, Square};
use std::fmt;

/// Move category
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum MoveType {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

/// A chess move encoded in 16 bits
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    const TO_MASK: u16 = 0x003F;
    const FROM_MASK: u16 = 0x0FC0;
    const FROM_SHIFT: u16 = 6;
    const PROMO_MASK: u16 = 0x3000;
    const PROMO_SHIFT: u16 = 12;
    const TYPE_MASK: u16 = 0xC000;
    const TYPE_SHIFT: u16 = 14;

    #[inline]
    pub const fn with_type(from: Square, to: Square, move_type: MoveType) -> Self {
        Move(
            (to.raw() as u16)
                | ((from.raw() as u16) << Self::FROM_SHIFT)
                | ((move_type as u16) << Self::TYPE_SHIFT),
        )
    }

    /// Normal move (quiet or capture)
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self::with_type(from, to, MoveType::Normal)
    }

    /// Promotion to `piece`. Anything other than N/B/R/Q encodes as a knight.
    #[inline]
    pub const fn new_promotion(from: Square, to: Square, piece: PieceType) -> Self {
        let promo_bits: u16 = match piece {
            PieceType::Bishop => 1,
            PieceType::Rook => 2,
            PieceType::Queen => 3,
            _ => 0,
        };
        Move(Self::with_type(from, to, MoveType::Promotion).0 | (promo_bits << Self::PROMO_SHIFT))
    }

    #[inline]
    pub const fn new_en_passant(from: Square, to: Square) -> Self {
        Self::with_type(from, to, MoveType::EnPassant)
    }

    /// Castling, encoded as the king's move
    #[inline]
    pub const fn new_castling(from: Square, to: Square) -> Self {
        Self::with_type(from, to, MoveType::Castling)
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index(((self.0 & Self::FROM_MASK) >> Self::FROM_SHIFT) as u8)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index((self.0 & Self::TO_MASK) as u8)
    }

    #[inline]
    pub const fn move_type(self) -> MoveType {
        match (self.0 & Self::TYPE_MASK) >> Self::TYPE_SHIFT {
            1 => MoveType::Promotion,
            2 => MoveType::EnPassant,
            3 => MoveType::Castling,
            _ => MoveType::Normal,
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        matches!(self.move_type(), MoveType::Promotion)
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        matches!(self.move_type(), MoveType::EnPassant)
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self.move_type(), MoveType::Castling)
    }

    /// Promotion piece, only for promotion moves
    #[inline]
    pub const fn promotion_piece(self) -> Option<PieceType> {
        if !self.is_promotion() {
            return None;
        }
        Some(match (self.0 & Self::PROMO_MASK) >> Self::PROMO_SHIFT {
            0 => PieceType::Knight,
            1 => PieceType::Bishop,
            2 => PieceType::Rook,
            _ => PieceType::Queen,
        })
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Move(raw)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// UCI notation (e.g., "e2e4", "e7e8q")
    pub fn to_uci(self) -> String {
        let mut uci = format!("{}{}", self.from(), self.to());
        if let Some(piece) = self.promotion_piece() {
            uci.push(piece.to_char());
        }
        uci
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.to_uci(), self.move_type())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// Upper bound on moves in any reachable position is 218
const MAX_MOVES: usize = 256;

/// A list of moves in generation order (stack-allocated)
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub fn new() -> Self {
        MoveList {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES, "move list overflow");
        if self.len < MAX_MOVES {
            self.moves[self.len] = mv;
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Move> {
        self.as_slice().get(index).copied()
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.as_slice().iter()
    }

    /// Keep only the moves matching `keep`, preserving order
    pub fn retain(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut write = 0;
        for read in 0..self.len {
            let mv = self.moves[read];
            if keep(mv) {
                self.moves[write] = mv;
                write += 1;
            }
        }
        self.len = write;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_bit_layout() {
        let mv = Move::new(Square::E2, Square::E4);
        assert_eq!(mv.raw() & 0x3F, Square::E4.raw() as u16);
        assert_eq!((mv.raw() >> 6) & 0x3F, Square::E2.raw() as u16);
        assert_eq!(mv.raw() >> 14, 0);
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.move_type(), MoveType::Normal);
        assert_eq!(mv.promotion_piece(), None);
    }

    #[test]
    fn test_promotion_encoding() {
        for (piece, bits) in [
            (PieceType::Knight, 0),
            (PieceType::Bishop, 1),
            (PieceType::Rook, 2),
            (PieceType::Queen, 3),
        ] {
            let mv = Move::new_promotion(Square::B7, Square::B8, piece);
            assert_eq!((mv.raw() >> 12) & 0b11, bits);
            assert_eq!(mv.raw() >> 14, MoveType::Promotion as u16);
            assert_eq!(mv.promotion_piece(), Some(piece));
        }
        assert_eq!(
            Move::new_promotion(Square::B7, Square::A8, PieceType::Queen).to_uci(),
            "b7a8q"
        );
    }

    #[test]
    fn test_special_move_types() {
        let ep = Move::new_en_passant(Square::E4, Square::D3);
        assert!(ep.is_en_passant());
        assert_eq!(ep.to_uci(), "e4d3");

        let castle = Move::new_castling(Square::E8, Square::G8);
        assert!(castle.is_castling());
        assert!(!castle.is_promotion());
        assert_eq!(Move::from_raw(castle.raw()), castle);
    }

    #[test]
    fn test_move_list() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        list.push(Move::new(Square::A2, Square::A3));
        list.push(Move::new(Square::B2, Square::B3));
        list.push(Move::new(Square::C2, Square::C3));
        assert_eq!(list.len(), 3);
        assert!(list.contains(Move::new(Square::B2, Square::B3)));
        assert_eq!(list[2], Move::new(Square::C2, Square::C3));

        list.retain(|mv| mv.from() != Square::B2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1), Some(Move::new(Square::C2, Square::C3)));
        assert_eq!(list.get(2), None);
    }
}
