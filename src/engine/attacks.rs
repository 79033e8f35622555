//! Precomputed attack tables
//!
//! This module owns every lookup the rest of the crate needs to answer
//! "which squares does this piece attack":
//! - Rays for the 8 directions on an empty board
//! - Leaper tables for pawns, knights and kings, indexed `[color][piece][square]`
//! - Magic bitboards for rooks and bishops (queens are the union of both)
//!
//! Tables are built once and never mutated. Use [`AttackTables::shared`]
//! for the process-wide copy or wrap [`AttackTables::new`] in an `Arc` for
//! an independent one.

use crate::core::bitboard::Bitboard;
use crate::core::rays::{Direction, Rays};
use crate::core::types::{Color, PieceType, Square};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Rook magic multipliers, one per square
const ROOK_MAGICS: [u64; 64] = [
    0x0080001020400080, 0x0040001000200040, 0x0080081000200080, 0x0080040800100080,
    0x0080020400080080, 0x0080010200040080, 0x0080008001000200, 0x0080002040800100,
    0x0000800020400080, 0x0000400020005000, 0x0000801000200080, 0x0000800800100080,
    0x0000800400080080, 0x0000800200040080, 0x0000800100020080, 0x0000800040800100,
    0x0000208000400080, 0x0000404000201000, 0x0000808010002000, 0x0000808008001000,
    0x0000808004000800, 0x0000808002000400, 0x0000010100020004, 0x0000020000408104,
    0x0000208080004000, 0x0000200040005000, 0x0000100080200080, 0x0000080080100080,
    0x0000040080080080, 0x0000020080040080, 0x0000010080800200, 0x0000800080004100,
    0x0000204000800080, 0x0000200040401000, 0x0000100080802000, 0x0000080080801000,
    0x0000040080800800, 0x0000020080800400, 0x0000020001010004, 0x0000800040800100,
    0x0000204000808000, 0x0000200040008080, 0x0000100020008080, 0x0000080010008080,
    0x0000040008008080, 0x0000020004008080, 0x0000010002008080, 0x0000004081020004,
    0x0000204000800080, 0x0000200040008080, 0x0000100020008080, 0x0000080010008080,
    0x0000040008008080, 0x0000020004008080, 0x0000800100020080, 0x0000800041000080,
    0x00FFFCDDFCED714A, 0x007FFCDDFCED714A, 0x003FFFCDFFD88096, 0x0000040810002101,
    0x0001000204080011, 0x0001000204000801, 0x0001000082000401, 0x0001FFFAABFAD1A2,
];

/// Bishop magic multipliers, one per square
const BISHOP_MAGICS: [u64; 64] = [
    0x0002020202020200, 0x0002020202020000, 0x0004010202000000, 0x0004040080000000,
    0x0001104000000000, 0x0000821040000000, 0x0000410410400000, 0x0000104104104000,
    0x0000040404040400, 0x0000020202020200, 0x0000040102020000, 0x0000040400800000,
    0x0000011040000000, 0x0000008210400000, 0x0000004104104000, 0x0000002082082000,
    0x0004000808080800, 0x0002000404040400, 0x0001000202020200, 0x0000800802004000,
    0x0000800400A00000, 0x0000200100884000, 0x0000400082082000, 0x0000200041041000,
    0x0002080010101000, 0x0001040008080800, 0x0000208004010400, 0x0000404004010200,
    0x0000840000802000, 0x0000404002011000, 0x0000808001041000, 0x0000404000820800,
    0x0001041000202000, 0x0000820800101000, 0x0000104400080800, 0x0000020080080080,
    0x0000404040040100, 0x0000808100020100, 0x0001010100020800, 0x0000808080010400,
    0x0000820820004000, 0x0000410410002000, 0x0000082088001000, 0x0000002011000800,
    0x0000080100400400, 0x0001010101000200, 0x0002020202000400, 0x0001010101000200,
    0x0000410410400000, 0x0000208208200000, 0x0000002084100000, 0x0000000020880000,
    0x0000001002020000, 0x0000040408020000, 0x0004040404040000, 0x0002020202020000,
    0x0000104104104000, 0x0000002082082000, 0x0000000020841000, 0x0000000000208800,
    0x0000000010020200, 0x0000000404080200, 0x0000040404040400, 0x0002020202020200,
];

/// Per-square magic hash parameters. `offset` locates the square's slice in
/// the packed attack table.
#[derive(Clone, Copy, Debug, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        let relevant = (occupied & self.mask).0;
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Immutable attack lookups for every piece type
pub struct AttackTables {
    rays: Rays,
    rook_magics: [Magic; 64],
    bishop_magics: [Magic; 64],
    rook_table: Box<[Bitboard]>,
    bishop_table: Box<[Bitboard]>,
    // [color][piece type][square], slider entries stay empty
    non_sliding: [[[Bitboard; 64]; 6]; 2],
}

static ATTACK_TABLES: OnceLock<Arc<AttackTables>> = OnceLock::new();

impl AttackTables {
    /// Shared tables, built on first use
    pub fn instance() -> &'static AttackTables {
        ATTACK_TABLES.get_or_init(|| Arc::new(AttackTables::new()))
    }

    /// Handle to the shared tables, for positions to hold on to
    pub fn shared() -> Arc<AttackTables> {
        Arc::clone(ATTACK_TABLES.get_or_init(|| Arc::new(AttackTables::new())))
    }

    /// Build a fresh set of tables
    pub fn new() -> Self {
        let started = Instant::now();
        let rays = Rays::new();

        let (rook_magics, rook_table) = build_magics(
            &ROOK_MAGICS,
            |sq| rook_mask(&rays, sq),
            |sq, blockers| rook_attacks_on_the_fly(&rays, sq, blockers),
        );
        let (bishop_magics, bishop_table) = build_magics(
            &BISHOP_MAGICS,
            |sq| bishop_mask(&rays, sq),
            |sq, blockers| bishop_attacks_on_the_fly(&rays, sq, blockers),
        );

        let tables = AttackTables {
            rays,
            rook_magics,
            bishop_magics,
            rook_table,
            bishop_table,
            non_sliding: build_non_sliding(),
        };

        log::debug!(
            "attack tables built in {:?} ({} rook slots, {} bishop slots)",
            started.elapsed(),
            tables.rook_table.len(),
            tables.bishop_table.len()
        );
        tables
    }

    #[inline]
    pub fn rays(&self) -> &Rays {
        &self.rays
    }

    /// Relevant blockers for a rook on `sq` (edges trimmed per direction)
    #[inline]
    pub fn rook_mask(&self, sq: Square) -> Bitboard {
        self.rook_magics[sq.index()].mask
    }

    /// Relevant blockers for a bishop on `sq` (board edges trimmed)
    #[inline]
    pub fn bishop_mask(&self, sq: Square) -> Bitboard {
        self.bishop_magics[sq.index()].mask
    }

    #[inline]
    pub fn rook_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook_table[self.rook_magics[sq.index()].index(occupied)]
    }

    #[inline]
    pub fn bishop_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.bishop_table[self.bishop_magics[sq.index()].index(occupied)]
    }

    #[inline]
    pub fn queen_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }

    /// Squares a pawn of `color` on `sq` captures onto
    #[inline]
    pub fn pawn_attacks(&self, color: Color, sq: Square) -> Bitboard {
        self.non_sliding[color.index()][PieceType::Pawn.index()][sq.index()]
    }

    #[inline]
    pub fn knight_attacks(&self, sq: Square) -> Bitboard {
        self.non_sliding[Color::White.index()][PieceType::Knight.index()][sq.index()]
    }

    #[inline]
    pub fn king_attacks(&self, sq: Square) -> Bitboard {
        self.non_sliding[Color::White.index()][PieceType::King.index()][sq.index()]
    }

    /// Leaper lookup; empty for sliding piece types
    #[inline]
    pub fn non_sliding_attacks(&self, color: Color, piece: PieceType, sq: Square) -> Bitboard {
        self.non_sliding[color.index()][piece.index()][sq.index()]
    }

    /// Magic lookup; empty for non-sliding piece types
    #[inline]
    pub fn sliding_attacks(&self, piece: PieceType, sq: Square, occupied: Bitboard) -> Bitboard {
        match piece {
            PieceType::Rook => self.rook_attacks(sq, occupied),
            PieceType::Bishop => self.bishop_attacks(sq, occupied),
            PieceType::Queen => self.queen_attacks(sq, occupied),
            _ => Bitboard::EMPTY,
        }
    }

    /// Attacks of any piece
    pub fn attacks(&self, piece: PieceType, color: Color, sq: Square, occupied: Bitboard) -> Bitboard {
        if piece.is_slider() {
            self.sliding_attacks(piece, sq, occupied)
        } else {
            self.non_sliding_attacks(color, piece, sq)
        }
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

fn rook_mask(rays: &Rays, sq: Square) -> Bitboard {
    (rays.ray(Direction::North, sq) & !Bitboard::RANK_8)
        | (rays.ray(Direction::South, sq) & !Bitboard::RANK_1)
        | (rays.ray(Direction::East, sq) & !Bitboard::FILE_H)
        | (rays.ray(Direction::West, sq) & !Bitboard::FILE_A)
}

fn bishop_mask(rays: &Rays, sq: Square) -> Bitboard {
    let diagonals = Direction::DIAGONAL
        .iter()
        .fold(Bitboard::EMPTY, |acc, &dir| acc | rays.ray(dir, sq));
    diagonals & !Bitboard::EDGES
}

fn build_magics(
    magics: &[u64; 64],
    mask_of: impl Fn(Square) -> Bitboard,
    attacks_of: impl Fn(Square, Bitboard) -> Bitboard,
) -> ([Magic; 64], Box<[Bitboard]>) {
    let mut entries = [Magic::default(); 64];
    let mut offset = 0;
    for sq in Square::ALL {
        let mask = mask_of(sq);
        let bits = mask.count();
        entries[sq.index()] = Magic {
            mask,
            magic: magics[sq.index()],
            shift: 64 - bits,
            offset,
        };
        offset += 1usize << bits;
    }

    let mut table = vec![Bitboard::EMPTY; offset].into_boxed_slice();
    for sq in Square::ALL {
        let entry = entries[sq.index()];
        for index in 0..(1usize << entry.mask.count()) {
            let blockers = blockers_from_index(index, entry.mask);
            let attacks = attacks_of(sq, blockers);
            let slot = entry.index(blockers);
            debug_assert!(
                table[slot].is_empty() || table[slot] == attacks,
                "magic collision on {}",
                sq
            );
            table[slot] = attacks;
        }
    }
    (entries, table)
}

fn build_non_sliding() -> [[[Bitboard; 64]; 6]; 2] {
    let mut table = [[[Bitboard::EMPTY; 64]; 6]; 2];
    let not_ab = !(Bitboard::FILE_A | Bitboard::FILE_B);
    let not_gh = !(Bitboard::FILE_G | Bitboard::FILE_H);

    for sq in Square::ALL {
        let bb = sq.bitboard();

        let knight = ((bb << 17) & !Bitboard::FILE_A)
            | ((bb << 15) & !Bitboard::FILE_H)
            | ((bb << 10) & not_ab)
            | ((bb << 6) & not_gh)
            | ((bb >> 17) & !Bitboard::FILE_H)
            | ((bb >> 15) & !Bitboard::FILE_A)
            | ((bb >> 10) & not_gh)
            | ((bb >> 6) & not_ab);

        let king = bb.north()
            | bb.south()
            | bb.east()
            | bb.west()
            | bb.north_east()
            | bb.north_west()
            | bb.south_east()
            | bb.south_west();

        for color in Color::ALL {
            let pawn = match color {
                Color::White => bb.north_east() | bb.north_west(),
                Color::Black => bb.south_east() | bb.south_west(),
            };
            let row = &mut table[color.index()];
            row[PieceType::Pawn.index()][sq.index()] = pawn;
            row[PieceType::Knight.index()][sq.index()] = knight;
            row[PieceType::King.index()][sq.index()] = king;
        }
    }
    table
}

/// Map the bits of `index` onto the set squares of `mask`: bit `k` of the
/// index decides whether the `k`-th lowest square of the mask is occupied.
pub fn blockers_from_index(index: usize, mask: Bitboard) -> Bitboard {
    let mut blockers = Bitboard::EMPTY;
    for (k, sq) in mask.iter().enumerate() {
        if (index >> k) & 1 != 0 {
            blockers.set(sq, true);
        }
    }
    blockers
}

/// Trace each ray from `sq`, cutting it after the first blocker
fn slide(rays: &Rays, directions: &[Direction], sq: Square, blockers: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &dir in directions {
        let ray = rays.ray(dir, sq);
        let hits = ray & blockers;
        let nearest = if dir.is_positive() { hits.lsb() } else { hits.msb() };
        attacks |= match nearest {
            Some(blocker) => ray ^ rays.ray(dir, blocker),
            None => ray,
        };
    }
    attacks
}

/// Rook attacks computed from rays, without the magic tables
pub fn rook_attacks_on_the_fly(rays: &Rays, sq: Square, blockers: Bitboard) -> Bitboard {
    slide(rays, &Direction::ORTHOGONAL, sq, blockers)
}

/// Bishop attacks computed from rays, without the magic tables
pub fn bishop_attacks_on_the_fly(rays: &Rays, sq: Square, blockers: Bitboard) -> Bitboard {
    slide(rays, &Direction::DIAGONAL, sq, blockers)
}
