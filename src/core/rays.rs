//! Empty-board rays
//!
//! `Rays` holds, for each of the 8 directions and 64 squares, every square
//! strictly beyond the origin in that direction. The attack tables use them to
//! build relevant-occupancy masks and to trace sliding attacks for magic
//! table construction.

use super::bitboard::Bitboard;
use super::types::Square;

/// Ray direction
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True when the ray runs towards higher square indices, so the nearest
    /// blocker on it is the least significant bit.
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest
        )
    }
}

/// Ray table, `[direction][square]`
#[derive(Clone)]
pub struct Rays {
    table: [[Bitboard; 64]; 8],
}

// Rays from a1 (for N/NE), h1 (NW), a8 (SE) and h8 (SW) in their own direction,
// origin excluded
const NORTH_FROM_A1: u64 = 0x0101010101010100;
const SOUTH_FROM_H8: u64 = 0x0080808080808080;
const NORTH_EAST_FROM_A1: u64 = 0x8040201008040200;
const NORTH_WEST_FROM_H1: u64 = 0x0102040810204000;
const SOUTH_WEST_FROM_H8: u64 = 0x0040201008040201;
const SOUTH_EAST_FROM_A8: u64 = 0x0002040810204080;

impl Rays {
    pub fn new() -> Self {
        let mut table = [[Bitboard::EMPTY; 64]; 8];

        for sq in Square::ALL {
            let i = sq.raw();
            let file = sq.file();
            let rank = sq.rank();

            table[Direction::North.index()][sq.index()] = Bitboard(NORTH_FROM_A1 << i);
            table[Direction::South.index()][sq.index()] = Bitboard(SOUTH_FROM_H8 >> (63 - i));
            table[Direction::East.index()][sq.index()] =
                Bitboard(((1u64 << (i | 7)) - (1u64 << i)) << 1);
            table[Direction::West.index()][sq.index()] =
                Bitboard((1u64 << i) - (1u64 << (i & 56)));

            table[Direction::NorthEast.index()][sq.index()] =
                shift_east(Bitboard(NORTH_EAST_FROM_A1), file) << (rank * 8);
            table[Direction::NorthWest.index()][sq.index()] =
                shift_west(Bitboard(NORTH_WEST_FROM_H1), 7 - file) << (rank * 8);
            table[Direction::SouthWest.index()][sq.index()] =
                shift_west(Bitboard(SOUTH_WEST_FROM_H8), 7 - file) >> ((7 - rank) * 8);
            table[Direction::SouthEast.index()][sq.index()] =
                shift_east(Bitboard(SOUTH_EAST_FROM_A8), file) >> ((7 - rank) * 8);
        }

        Rays { table }
    }

    #[inline]
    pub fn ray(&self, direction: Direction, sq: Square) -> Bitboard {
        self.table[direction.index()][sq.index()]
    }
}

impl Default for Rays {
    fn default() -> Self {
        Self::new()
    }
}

/// Shift east `n` files, dropping whatever wraps onto file A
fn shift_east(mut bb: Bitboard, n: u8) -> Bitboard {
    for _ in 0..n {
        bb = bb.east();
    }
    bb
}

/// Shift west `n` files, dropping whatever wraps onto file H
fn shift_west(mut bb: Bitboard, n: u8) -> Bitboard {
    for _ in 0..n {
        bb = bb.west();
    }
    bb
}
