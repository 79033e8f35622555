//! Chess position representation
//!
//! [`BoardInfo`] is the complete, copyable game state: eight bitboards (two
//! color boards and six piece-type boards) plus side to move, castling rights,
//! en-passant targets and move counters. [`ChessBoard`] wraps it with the
//! shared attack tables and a stack of snapshots for make/unmake.
//!
//! Invariants maintained by every push:
//! - each occupied square is in exactly one piece board and one color board
//! - each side has exactly one king
//! - at most one en-passant target exists, and only right after a double push
//! - castling rights only ever go from held to lost

use super::bitboard::Bitboard;
use super::moves::{Move, MoveList, MoveType};
use super::types::{Color, Piece, PieceType, Square};
use crate::engine::attacks::AttackTables;
use crate::engine::movegen::MoveGen;
use crate::error::{ChessError, ChessResult};
use crate::STARTING_FEN;
use std::fmt;
use std::sync::Arc;

/// Castling rights
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(0xF);

    // FEN letters in export order
    const LETTERS: [(char, u8); 4] = [
        ('K', Self::WHITE_KINGSIDE),
        ('Q', Self::WHITE_QUEENSIDE),
        ('k', Self::BLACK_KINGSIDE),
        ('q', Self::BLACK_QUEENSIDE),
    ];

    #[inline]
    pub const fn new(rights: u8) -> Self {
        CastlingRights(rights & 0xF)
    }

    #[inline]
    pub const fn has(self, right: u8) -> bool {
        (self.0 & right) != 0
    }

    #[inline]
    pub fn remove(&mut self, right: u8) {
        self.0 &= !right;
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn can_castle_kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_KINGSIDE),
            Color::Black => self.has(Self::BLACK_KINGSIDE),
        }
    }

    pub fn can_castle_queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_QUEENSIDE),
            Color::Black => self.has(Self::BLACK_QUEENSIDE),
        }
    }

    /// Parse the FEN castling field. Letters must be a non-empty ordered
    /// subset of "KQkq", or the field must be "-".
    pub fn from_fen_field(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(Self::NONE);
        }
        let mut rights = 0u8;
        let mut letters = Self::LETTERS.iter();
        for c in field.chars() {
            // Each letter must appear after the previous one in KQkq order
            let (_, bit) = letters.by_ref().find(|(letter, _)| *letter == c)?;
            rights |= bit;
        }
        if rights == 0 { None } else { Some(CastlingRights(rights)) }
    }

    pub fn to_fen_field(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        Self::LETTERS
            .iter()
            .filter(|(_, bit)| self.has(*bit))
            .map(|(letter, _)| *letter)
            .collect()
    }
}

/// Home squares of one castle: king from/to, rook from/to, the squares that
/// must be empty and the squares the king may not be attacked on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CastleSide {
    pub color: Color,
    pub right: u8,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    pub must_be_empty: Bitboard,
    pub king_path: [Square; 3],
}

pub(crate) const CASTLE_SIDES: [CastleSide; 4] = [
    CastleSide {
        color: Color::White,
        right: CastlingRights::WHITE_KINGSIDE,
        king_from: Square::E1,
        king_to: Square::G1,
        rook_from: Square::H1,
        rook_to: Square::F1,
        must_be_empty: Bitboard(0x0000000000000060),
        king_path: [Square::E1, Square::F1, Square::G1],
    },
    CastleSide {
        color: Color::White,
        right: CastlingRights::WHITE_QUEENSIDE,
        king_from: Square::E1,
        king_to: Square::C1,
        rook_from: Square::A1,
        rook_to: Square::D1,
        must_be_empty: Bitboard(0x000000000000000E),
        king_path: [Square::C1, Square::D1, Square::E1],
    },
    CastleSide {
        color: Color::Black,
        right: CastlingRights::BLACK_KINGSIDE,
        king_from: Square::E8,
        king_to: Square::G8,
        rook_from: Square::H8,
        rook_to: Square::F8,
        must_be_empty: Bitboard(0x6000000000000000),
        king_path: [Square::E8, Square::F8, Square::G8],
    },
    CastleSide {
        color: Color::Black,
        right: CastlingRights::BLACK_QUEENSIDE,
        king_from: Square::E8,
        king_to: Square::C8,
        rook_from: Square::A8,
        rook_to: Square::D8,
        must_be_empty: Bitboard(0x0E00000000000000),
        king_path: [Square::C8, Square::D8, Square::E8],
    },
];

impl CastleSide {
    pub(crate) fn for_color(color: Color) -> [CastleSide; 2] {
        match color {
            Color::White => [CASTLE_SIDES[0], CASTLE_SIDES[1]],
            Color::Black => [CASTLE_SIDES[2], CASTLE_SIDES[3]],
        }
    }

    pub(crate) fn for_king_move(from: Square, to: Square) -> Option<CastleSide> {
        CASTLE_SIDES
            .iter()
            .copied()
            .find(|side| side.king_from == from && side.king_to == to)
    }
}

/// Complete game state, cheap to copy
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoardInfo {
    colors: [Bitboard; 2],
    pieces: [Bitboard; 6],
    side_to_move: Color,
    castling: CastlingRights,
    fifty_move_rule: u32,
    ply_count: u32,
    // [color]: square that color's pawns may capture onto en passant
    en_passant: [Bitboard; 2],
}

impl BoardInfo {
    /// Standard starting position
    pub const fn startpos() -> Self {
        BoardInfo {
            colors: [Bitboard(0x000000000000FFFF), Bitboard(0xFFFF000000000000)],
            pieces: [
                Bitboard(0x00FF00000000FF00),
                Bitboard(0x4200000000000042),
                Bitboard(0x2400000000000024),
                Bitboard(0x8100000000000081),
                Bitboard(0x0800000000000008),
                Bitboard(0x1000000000000010),
            ],
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            fifty_move_rule: 0,
            ply_count: 1,
            en_passant: [Bitboard::EMPTY; 2],
        }
    }

    /// Validate a FEN string and build the state it describes
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let invalid = |reason: &str| ChessError::invalid_fen(fen, reason);
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(invalid("expected at least placement and side to move"));
        }
        if fields.len() > 6 {
            return Err(invalid("too many fields"));
        }
        let placement = fields[0];

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(&format!("side to move must be 'w' or 'b', got '{}'", other))),
        };

        let castling_field = fields.get(2).copied().unwrap_or("-");
        let castling = CastlingRights::from_fen_field(castling_field)
            .ok_or_else(|| invalid(&format!("bad castling field '{}'", castling_field)))?;

        let ep_field = fields.get(3).copied().unwrap_or("-");
        let bad_en_passant = || invalid(&format!("bad en passant square '{}'", ep_field));
        let ep_target = if ep_field == "-" {
            None
        } else {
            let expected_rank = match side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            let sq = Square::from_algebraic(ep_field)
                .filter(|sq| sq.rank() == expected_rank)
                .ok_or_else(bad_en_passant)?;
            Some(sq)
        };

        let fifty_move_rule = match fields.get(4) {
            Some(field) => field
                .parse::<u32>()
                .map_err(|_| invalid(&format!("bad halfmove clock '{}'", field)))?,
            None => 0,
        };
        let ply_count = match fields.get(5) {
            Some(field) => field
                .parse::<u32>()
                .map_err(|_| invalid(&format!("bad fullmove number '{}'", field)))?,
            None => 1,
        };

        validate_placement(placement).map_err(|reason| invalid(&reason))?;

        // Filling in reading order puts a8 at bit 0, so every board is built
        // mirrored and flipped once at the end.
        let mut colors = [Bitboard::EMPTY; 2];
        let mut pieces = [Bitboard::EMPTY; 6];
        let mut index = 0u8;
        for c in placement.chars().filter(|&c| c != '/') {
            if let Some(run) = c.to_digit(10) {
                index += run as u8;
            } else if let Some(piece) = Piece::from_char(c) {
                let sq = Square::from_index(index);
                colors[piece.color.index()].set(sq, true);
                pieces[piece.piece_type.index()].set(sq, true);
                index += 1;
            }
        }

        let mut info = BoardInfo {
            colors: colors.map(Bitboard::flip_vertical),
            pieces: pieces.map(Bitboard::flip_vertical),
            side_to_move,
            castling,
            fifty_move_rule,
            ply_count,
            en_passant: [Bitboard::EMPTY; 2],
        };
        if let Some(target) = ep_target {
            if !info.double_push_behind(target) {
                return Err(bad_en_passant());
            }
            info.en_passant[side_to_move.index()] = target.bitboard();
        }
        Ok(info)
    }

    /// Could the opponent's last move have been a double push over `target`:
    /// target and origin empty, an enemy pawn on the landing square
    fn double_push_behind(&self, target: Square) -> bool {
        let them = self.side_to_move.opposite();
        let landed = target.offset(them.pawn_direction());
        let origin = target.offset(-them.pawn_direction());
        match (landed, origin) {
            (Some(landed), Some(origin)) => {
                self.piece_at(target).is_none()
                    && self.piece_at(origin).is_none()
                    && self.board(them, PieceType::Pawn).contains(landed)
            }
            _ => false,
        }
    }

    /// FEN of this state. The en-passant field is always "-".
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match Square::from_file_rank(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        format!(
            "{} {} {} - {} {}",
            fen,
            side,
            self.castling.to_fen_field(),
            self.fifty_move_rule,
            self.ply_count
        )
    }

    /// All pieces of one type, both colors
    #[inline]
    pub fn pieces(&self, piece: PieceType) -> Bitboard {
        self.pieces[piece.index()]
    }

    #[inline]
    pub fn color_board(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Pieces of one type and color
    #[inline]
    pub fn board(&self, color: Color, piece: PieceType) -> Bitboard {
        self.pieces[piece.index()] & self.colors[color.index()]
    }

    /// Every occupied square
    #[inline]
    pub fn blockers(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn fifty_move_rule(&self) -> u32 {
        self.fifty_move_rule
    }

    #[inline]
    pub fn ply_count(&self) -> u32 {
        self.ply_count
    }

    /// Square `color` may capture onto en passant
    #[inline]
    pub fn en_passant_target(&self, color: Color) -> Option<Square> {
        self.en_passant[color.index()].lsb()
    }

    pub fn piece_on_square(&self, sq: Square) -> Option<PieceType> {
        PieceType::ALL
            .into_iter()
            .find(|piece| self.pieces[piece.index()].contains(sq))
    }

    pub fn color_on_square(&self, sq: Square) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|color| self.colors[color.index()].contains(sq))
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        Some(Piece::new(self.piece_on_square(sq)?, self.color_on_square(sq)?))
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board(color, PieceType::King).lsb()
    }

    /// Is `sq` attacked by the side opposite to `color`
    pub fn square_attacked(&self, tables: &AttackTables, sq: Square, color: Color) -> bool {
        let them = self.colors[color.opposite().index()];
        let blockers = self.blockers();
        let diagonal = self.pieces(PieceType::Bishop) | self.pieces(PieceType::Queen);
        let orthogonal = self.pieces(PieceType::Rook) | self.pieces(PieceType::Queen);

        // A pawn of `color` on sq attacks exactly the squares enemy pawns attack sq from
        (tables.pawn_attacks(color, sq) & self.pieces(PieceType::Pawn) & them).is_not_empty()
            || (tables.knight_attacks(sq) & self.pieces(PieceType::Knight) & them).is_not_empty()
            || (tables.king_attacks(sq) & self.pieces(PieceType::King) & them).is_not_empty()
            || (tables.bishop_attacks(sq, blockers) & diagonal & them).is_not_empty()
            || (tables.rook_attacks(sq, blockers) & orthogonal & them).is_not_empty()
    }

    pub fn king_in_check(&self, tables: &AttackTables, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.square_attacked(tables, king, color))
    }

    #[inline]
    fn clear(&mut self, sq: Square) {
        for board in self.pieces.iter_mut().chain(self.colors.iter_mut()) {
            board.set(sq, false);
        }
    }

    #[inline]
    fn put(&mut self, piece: PieceType, color: Color, sq: Square) {
        self.pieces[piece.index()].set(sq, true);
        self.colors[color.index()].set(sq, true);
    }

    /// Play `mv` without any validation. The move must come from the move
    /// generator or have passed [`ChessBoard::push_move`]'s checks.
    pub(crate) fn apply(&mut self, mv: Move) {
        let us = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        let Some(moving) = self.piece_on_square(from) else {
            return;
        };

        let mut resets_clock = moving == PieceType::Pawn;
        match mv.move_type() {
            MoveType::Castling => {
                if let Some(side) = CastleSide::for_king_move(from, to) {
                    self.clear(side.king_from);
                    self.clear(side.rook_from);
                    self.put(PieceType::King, us, side.king_to);
                    self.put(PieceType::Rook, us, side.rook_to);
                }
            }
            MoveType::Promotion => {
                resets_clock = true;
                let promoted = mv.promotion_piece().unwrap_or(PieceType::Queen);
                self.clear(to);
                self.clear(from);
                self.put(promoted, us, to);
            }
            MoveType::EnPassant => {
                resets_clock = true;
                if let Some(captured) = to.offset(-us.pawn_direction()) {
                    self.clear(captured);
                }
                self.clear(from);
                self.put(PieceType::Pawn, us, to);
            }
            MoveType::Normal => {
                if self.blockers().contains(to) {
                    resets_clock = true;
                    self.clear(to);
                }
                self.clear(from);
                self.put(moving, us, to);
            }
        }

        if resets_clock {
            self.fifty_move_rule = 0;
        } else {
            self.fifty_move_rule = self.fifty_move_rule.saturating_add(1);
        }

        self.en_passant = [Bitboard::EMPTY; 2];
        if mv.move_type() == MoveType::Normal
            && moving == PieceType::Pawn
            && from.rank() == us.pawn_start_rank()
            && to.rank() == us.double_push_rank()
        {
            if let Some(skipped) = from.offset(us.pawn_direction()) {
                self.en_passant[us.opposite().index()] = skipped.bitboard();
            }
        }

        self.update_castling_rights();

        self.side_to_move = us.opposite();
        if self.side_to_move == Color::White {
            self.ply_count = self.ply_count.saturating_add(1);
        }
    }

    /// Drop every right whose king or rook has left its home square
    fn update_castling_rights(&mut self) {
        for side in CASTLE_SIDES {
            let king_home = self.board(side.color, PieceType::King).contains(side.king_from);
            let rook_home = self.board(side.color, PieceType::Rook).contains(side.rook_from);
            if !king_home || !rook_home {
                self.castling.remove(side.right);
            }
        }
    }
}

impl Default for BoardInfo {
    fn default() -> Self {
        Self::startpos()
    }
}

/// Structural checks on the piece placement field
fn validate_placement(placement: &str) -> Result<(), String> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(format!("expected 7 rank separators, found {}", ranks.len() - 1));
    }
    if let Some(c) = placement
        .chars()
        .find(|&c| !(c == '/' || ('1'..='8').contains(&c) || Piece::from_char(c).is_some()))
    {
        return Err(format!("illegal character '{}'", c));
    }
    for (i, rank) in ranks.iter().enumerate() {
        let width: u32 = rank
            .chars()
            .map(|c| c.to_digit(10).unwrap_or(1))
            .sum();
        if width != 8 {
            return Err(format!("rank {} covers {} squares", 8 - i, width));
        }
    }

    let count = |letter: char| placement.chars().filter(|&c| c == letter).count();
    if count('K') != 1 || count('k') != 1 {
        return Err("each side needs exactly one king".to_string());
    }
    for (pawn, knight, bishop, rook, queen) in
        [('P', 'N', 'B', 'R', 'Q'), ('p', 'n', 'b', 'r', 'q')]
    {
        let (p, n, b, r, q) = (count(pawn), count(knight), count(bishop), count(rook), count(queen));
        if p > 8 || n > 10 || b > 10 || r > 10 || q > 9 {
            return Err(format!("too many pieces of one kind for side '{}'", pawn));
        }
        if p + n + b + r + q > 15 {
            return Err(format!("more than 15 non-king pieces for side '{}'", pawn));
        }
    }
    Ok(())
}

/// A position with make/unmake history
#[derive(Clone)]
pub struct ChessBoard {
    tables: Arc<AttackTables>,
    info: BoardInfo,
    history: Vec<BoardInfo>,
}

impl ChessBoard {
    /// Standard starting position
    pub fn new() -> Self {
        ChessBoard {
            tables: AttackTables::shared(),
            info: BoardInfo::startpos(),
            history: Vec::new(),
        }
    }

    /// Parse a position from FEN, rejecting anything malformed
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        Self::with_tables(AttackTables::shared(), fen)
    }

    /// Parse a position from FEN against a specific set of attack tables,
    /// e.g. `Arc::new(AttackTables::new())`
    pub fn with_tables(tables: Arc<AttackTables>, fen: &str) -> ChessResult<Self> {
        Ok(ChessBoard {
            tables,
            info: BoardInfo::from_fen(fen)?,
            history: Vec::new(),
        })
    }

    /// Parse a position from FEN, substituting the starting position when the
    /// string is malformed
    pub fn from_fen_or_startpos(fen: &str) -> Self {
        match Self::from_fen(fen) {
            Ok(board) => board,
            Err(e) => {
                log::warn!("{}; using starting position {}", e, STARTING_FEN);
                Self::new()
            }
        }
    }

    /// Structural FEN check without building a board
    pub fn validate_fen(fen: &str) -> ChessResult<()> {
        BoardInfo::from_fen(fen).map(|_| ())
    }

    #[inline]
    pub fn info(&self) -> &BoardInfo {
        &self.info
    }

    #[inline]
    pub fn tables(&self) -> &AttackTables {
        &self.tables
    }

    #[inline]
    pub fn board(&self, color: Color, piece: PieceType) -> Bitboard {
        self.info.board(color, piece)
    }

    #[inline]
    pub fn pieces(&self, piece: PieceType) -> Bitboard {
        self.info.pieces(piece)
    }

    #[inline]
    pub fn color_board(&self, color: Color) -> Bitboard {
        self.info.color_board(color)
    }

    #[inline]
    pub fn blockers(&self) -> Bitboard {
        self.info.blockers()
    }

    #[inline]
    pub fn white_to_move(&self) -> bool {
        self.info.side_to_move == Color::White
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.info.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.info.castling
    }

    #[inline]
    pub fn fifty_move_rule(&self) -> u32 {
        self.info.fifty_move_rule
    }

    /// Full-move number: starts at 1, grows when white is to move again
    #[inline]
    pub fn ply_count(&self) -> u32 {
        self.info.ply_count
    }

    #[inline]
    pub fn en_passant_target(&self, color: Color) -> Option<Square> {
        self.info.en_passant_target(color)
    }

    pub fn piece_on_square(&self, sq: Square) -> Option<PieceType> {
        self.info.piece_on_square(sq)
    }

    pub fn color_on_square(&self, sq: Square) -> Option<Color> {
        self.info.color_on_square(sq)
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.info.piece_at(sq)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.info.king_square(color)
    }

    /// Is `sq` attacked by the side opposite to `color`
    pub fn square_attacked(&self, sq: Square, color: Color) -> bool {
        self.info.square_attacked(&self.tables, sq, color)
    }

    pub fn king_in_check(&self, color: Color) -> bool {
        self.info.king_in_check(&self.tables, color)
    }

    /// Is the side to move in check
    pub fn in_check(&self) -> bool {
        self.king_in_check(self.info.side_to_move)
    }

    /// Apply a move, saving the current state for [`pop_move`](Self::pop_move).
    ///
    /// Only structural checks are made; a move that leaves the own king in
    /// check is accepted. On error the position is unchanged.
    pub fn push_move(&mut self, mv: Move) -> ChessResult<()> {
        self.check_playable(mv)?;
        log::trace!("push {} on {}", mv, self.to_fen());
        self.history.push(self.info);
        self.info.apply(mv);
        Ok(())
    }

    /// Undo the last pushed move. Returns false when there is nothing to undo.
    pub fn pop_move(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.info = previous;
                true
            }
            None => false,
        }
    }

    /// Number of moves that can be popped
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn check_playable(&self, mv: Move) -> ChessResult<()> {
        let us = self.info.side_to_move;
        let reject = |reason: &str| Err(ChessError::illegal_move(mv.to_uci(), reason));

        let Some(piece) = self.piece_at(mv.from()) else {
            return reject("no piece on the from square");
        };
        if piece.color != us {
            return reject("piece belongs to the side not to move");
        }

        match mv.move_type() {
            MoveType::Castling => {
                let Some(side) = CastleSide::for_king_move(mv.from(), mv.to()) else {
                    return reject("not a castling king move");
                };
                if !self.info.castling.has(side.right) {
                    log::warn!("castling {} rejected: right already lost", mv);
                    return reject("castling right not held");
                }
                if piece.piece_type != PieceType::King
                    || !self.board(us, PieceType::Rook).contains(side.rook_from)
                {
                    return reject("king or rook not on its home square");
                }
                if (self.blockers() & side.must_be_empty).is_not_empty() {
                    return reject("pieces between king and rook");
                }
            }
            MoveType::Promotion => {
                if piece.piece_type != PieceType::Pawn {
                    return reject("only pawns promote");
                }
                if mv.to().rank() != us.promotion_rank() {
                    return reject("promotion off the last rank");
                }
                if self.color_board(us).contains(mv.to()) {
                    return reject("destination holds an own piece");
                }
            }
            MoveType::EnPassant => {
                if piece.piece_type != PieceType::Pawn {
                    return reject("only pawns capture en passant");
                }
                if self.en_passant_target(us) != Some(mv.to()) {
                    return reject("no en passant target on that square");
                }
            }
            MoveType::Normal => {
                if self.color_board(us).contains(mv.to()) {
                    return reject("destination holds an own piece");
                }
                if piece.piece_type == PieceType::Pawn && mv.to().rank() == us.promotion_rank() {
                    return reject("pawn reaching the last rank must promote");
                }
            }
        }
        Ok(())
    }

    /// FEN of the current position (en-passant field always "-")
    pub fn to_fen(&self) -> String {
        self.info.to_fen()
    }

    /// Decode a UCI move string, inferring castling and en passant from the
    /// position
    pub fn move_from_uci(&self, uci: &str) -> ChessResult<Move> {
        let malformed = || ChessError::illegal_move(uci, "malformed UCI move");
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            return Err(malformed());
        }
        let from = Square::from_algebraic(&uci[0..2]).ok_or_else(malformed)?;
        let to = Square::from_algebraic(&uci[2..4]).ok_or_else(malformed)?;

        if let Some(letter) = uci[4..].chars().next() {
            let promoted = match letter {
                'q' => PieceType::Queen,
                'r' => PieceType::Rook,
                'b' => PieceType::Bishop,
                'n' => PieceType::Knight,
                _ => return Err(malformed()),
            };
            return Ok(Move::new_promotion(from, to, promoted));
        }

        let moving = self.piece_at(from);
        if moving.is_some_and(|p| p.piece_type == PieceType::King)
            && CastleSide::for_king_move(from, to).is_some()
        {
            return Ok(Move::new_castling(from, to));
        }
        if let Some(Piece { piece_type: PieceType::Pawn, color }) = moving {
            if self.en_passant_target(color) == Some(to) {
                return Ok(Move::new_en_passant(from, to));
            }
        }
        Ok(Move::new(from, to))
    }

    /// Parse and push a UCI move
    pub fn push_uci(&mut self, uci: &str) -> ChessResult<Move> {
        let mv = self.move_from_uci(uci)?;
        self.push_move(mv)?;
        Ok(mv)
    }

    pub fn legal_moves(&self) -> MoveList {
        MoveGen::generate_legal_moves(self)
    }

    pub fn legal_uci_moves(&self) -> Vec<String> {
        self.legal_moves().iter().map(|mv| mv.to_uci()).collect()
    }

    pub fn has_legal_moves(&self) -> bool {
        !self.legal_moves().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check() && !self.has_legal_moves()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && !self.has_legal_moves()
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChessBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for rank in (0..8).rev() {
            write!(f, "  {} ", rank + 1)?;
            for file in 0..8 {
                match Square::from_file_rank(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => write!(f, "{} ", piece.to_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "    a b c d e f g h")?;
        writeln!(f)?;
        writeln!(f, "  FEN: {}", self.to_fen())
    }
}

impl fmt::Debug for ChessBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChessBoard")
            .field("fen", &self.to_fen())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_matches_fen() {
        let parsed = BoardInfo::from_fen(STARTING_FEN).unwrap();
        assert_eq!(parsed, BoardInfo::startpos());
        assert_eq!(ChessBoard::new().to_fen(), STARTING_FEN);
    }

    #[test]
    fn test_castling_field() {
        assert_eq!(CastlingRights::from_fen_field("KQkq"), Some(CastlingRights::ALL));
        assert_eq!(CastlingRights::from_fen_field("-"), Some(CastlingRights::NONE));
        assert_eq!(
            CastlingRights::from_fen_field("Qk"),
            Some(CastlingRights::new(
                CastlingRights::WHITE_QUEENSIDE | CastlingRights::BLACK_KINGSIDE
            ))
        );
        assert_eq!(CastlingRights::from_fen_field("kQ"), None);
        assert_eq!(CastlingRights::from_fen_field("KK"), None);
        assert_eq!(CastlingRights::from_fen_field(""), None);
        assert_eq!(CastlingRights::from_fen_field("KQx"), None);
        assert_eq!(CastlingRights::new(0b0101).to_fen_field(), "Kk");
    }

    #[test]
    fn test_piece_lookup() {
        let board = ChessBoard::new();
        assert_eq!(board.piece_on_square(Square::D1), Some(PieceType::Queen));
        assert_eq!(board.color_on_square(Square::D8), Some(Color::Black));
        assert_eq!(board.piece_on_square(Square::E4), None);
        assert_eq!(board.color_on_square(Square::E4), None);
        assert_eq!(board.king_square(Color::Black), Some(Square::E8));
    }

    #[test]
    fn test_double_push_sets_opponent_target() {
        let mut board = ChessBoard::new();
        board.push_move(Move::new(Square::E2, Square::E4)).unwrap();
        assert_eq!(board.en_passant_target(Color::Black), Some(Square::E3));
        assert_eq!(board.en_passant_target(Color::White), None);

        board.push_move(Move::new(Square::G8, Square::F6)).unwrap();
        assert_eq!(board.en_passant_target(Color::Black), None);
    }

    #[test]
    fn test_counters() {
        let mut board = ChessBoard::new();
        board.push_uci("g1f3").unwrap();
        assert_eq!(board.fifty_move_rule(), 1);
        assert_eq!(board.ply_count(), 1);
        board.push_uci("g8f6").unwrap();
        assert_eq!(board.fifty_move_rule(), 2);
        assert_eq!(board.ply_count(), 2);
        board.push_uci("e2e4").unwrap();
        assert_eq!(board.fifty_move_rule(), 0);
    }

    #[test]
    fn test_pop_on_empty_history() {
        let mut board = ChessBoard::new();
        assert!(!board.pop_move());
        board.push_uci("d2d4").unwrap();
        assert!(board.pop_move());
        assert!(!board.pop_move());
        assert_eq!(board.info(), &BoardInfo::startpos());
    }

    #[test]
    fn test_rejected_push_leaves_state() {
        let mut board = ChessBoard::new();
        let before = *board.info();
        assert!(board.push_move(Move::new(Square::E4, Square::E5)).is_err());
        assert!(board.push_move(Move::new(Square::E7, Square::E5)).is_err());
        assert!(board.push_move(Move::new(Square::A1, Square::A2)).is_err());
        assert!(board.push_move(Move::new_castling(Square::E1, Square::G1)).is_err());
        assert!(board.push_move(Move::new_en_passant(Square::E2, Square::D3)).is_err());
        assert_eq!(board.info(), &before);
        assert_eq!(board.history_len(), 0);
    }
}
