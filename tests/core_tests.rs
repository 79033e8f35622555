//! Core Module Tests
//!
//! Tests for squares, moves and the board state machine.

use bitchess::{
    AttackTables, Bitboard, BoardInfo, CastlingRights, ChessBoard, ChessError, Color, Move,
    MoveType, Piece, PieceType, Square, STARTING_FEN,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Every occupied square sits in exactly one piece board and one color board,
/// and each side has one king
fn assert_consistent(board: &ChessBoard) {
    let white = board.color_board(Color::White);
    let black = board.color_board(Color::Black);
    assert!((white & black).is_empty(), "color boards overlap in {}", board.to_fen());

    let mut union = Bitboard::EMPTY;
    for piece in PieceType::ALL {
        let bb = board.pieces(piece);
        assert!((union & bb).is_empty(), "piece boards overlap in {}", board.to_fen());
        union |= bb;
    }
    assert_eq!(union, white | black, "piece and color boards disagree in {}", board.to_fen());

    assert_eq!(board.board(Color::White, PieceType::King).count(), 1);
    assert_eq!(board.board(Color::Black, PieceType::King).count(), 1);

    let targets = Color::ALL
        .iter()
        .filter(|&&c| board.en_passant_target(c).is_some())
        .count();
    assert!(targets <= 1);
}

// ============================================================================
// Square and Move Tests
// ============================================================================

#[test]
fn test_square_validation() {
    assert_eq!(Square::new(28), Ok(Square::E4));
    assert_eq!(Square::new(64), Err(ChessError::IndexOutOfRange { index: 64 }));
    assert_eq!(Square::try_from(255u8), Err(ChessError::IndexOutOfRange { index: 255 }));
    assert_eq!(Square::from_file_rank(8, 0), None);
    assert_eq!(Square::ALL.len(), 64);
    assert_eq!(Square::ALL[63], Square::H8);
}

#[test]
fn test_move_to_uci() {
    assert_eq!(Move::new(Square::E2, Square::E4).to_uci(), "e2e4");
    assert_eq!(
        Move::new_promotion(Square::E7, Square::E8, PieceType::Knight).to_uci(),
        "e7e8n"
    );
    assert_eq!(Move::new_castling(Square::E1, Square::C1).to_uci(), "e1c1");
}

// ============================================================================
// Board Construction Tests
// ============================================================================

#[test]
fn test_new_board_is_startpos() {
    let board = ChessBoard::new();
    assert!(board.white_to_move());
    assert_eq!(board.castling_rights(), CastlingRights::ALL);
    assert_eq!(board.fifty_move_rule(), 0);
    assert_eq!(board.ply_count(), 1);
    assert_eq!(board.to_fen(), STARTING_FEN);
    assert_eq!(board.blockers().count(), 32);
    assert_eq!(board.board(Color::White, PieceType::Pawn), Bitboard::RANK_2);
    assert_eq!(board.board(Color::Black, PieceType::Pawn), Bitboard::RANK_7);
    assert_eq!(board.info(), &BoardInfo::default());
    assert_consistent(&board);
}

#[test]
fn test_piece_at() {
    let board = ChessBoard::new();
    assert_eq!(
        board.piece_at(Square::G8),
        Some(Piece::new(PieceType::Knight, Color::Black))
    );
    assert_eq!(
        board.piece_at(Square::E1),
        Some(Piece::new(PieceType::King, Color::White))
    );
    assert_eq!(board.piece_at(Square::E5), None);
}

#[test]
fn test_display_contains_fen() {
    let board = ChessBoard::new();
    let text = board.to_string();
    assert!(text.contains(STARTING_FEN));
    assert!(text.contains("r n b q k b n r"));
    assert!(format!("{:?}", board).contains("ChessBoard"));
}

// ============================================================================
// Push / Pop Tests
// ============================================================================

#[test]
fn test_push_and_pop_restore_every_field() {
    let mut board =
        ChessBoard::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let before = *board.info();
    for mv in board.legal_moves().iter() {
        board.push_move(*mv).unwrap();
        assert_ne!(board.info(), &before);
        assert!(board.pop_move());
        assert_eq!(board.info(), &before, "pop after {} did not restore", mv);
    }
}

#[test]
fn test_pop_walks_back_a_whole_game() {
    let mut board = ChessBoard::new();
    let mut states = vec![*board.info()];
    for uci in ["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6"] {
        board.push_uci(uci).unwrap();
        states.push(*board.info());
    }
    assert_eq!(board.history_len(), 8);

    while let Some(expected) = states.pop() {
        assert_eq!(board.info(), &expected);
        board.pop_move();
    }
    assert!(!board.pop_move());
    assert_eq!(board.to_fen(), STARTING_FEN);
}

#[test]
fn test_capture_removes_piece() {
    let mut board = ChessBoard::new();
    for uci in ["e2e4", "d7d5", "e4d5"] {
        board.push_uci(uci).unwrap();
    }
    assert_eq!(board.piece_on_square(Square::D5), Some(PieceType::Pawn));
    assert_eq!(board.color_on_square(Square::D5), Some(Color::White));
    assert_eq!(board.color_board(Color::Black).count(), 15);
    assert_eq!(board.fifty_move_rule(), 0);
    assert_consistent(&board);
}

#[test]
fn test_en_passant_push() {
    let mut board =
        ChessBoard::from_fen("rnbqkbnr/pppp1ppp/8/8/3Pp3/4P2P/PPP2PP1/RNBQKBNR b KQkq d3 0 3")
            .unwrap();
    assert_eq!(board.en_passant_target(Color::Black), Some(Square::D3));

    let mv = board.push_uci("e4d3").unwrap();
    assert_eq!(mv.move_type(), MoveType::EnPassant);
    assert_eq!(board.piece_on_square(Square::D4), None);
    assert_eq!(board.piece_on_square(Square::D3), Some(PieceType::Pawn));
    assert_eq!(board.color_on_square(Square::D3), Some(Color::Black));
    assert_eq!(board.en_passant_target(Color::Black), None);
    assert_eq!(board.ply_count(), 4);
    assert_consistent(&board);
}

#[test]
fn test_promotion_push() {
    let mut board = ChessBoard::from_fen("1r2k3/P7/8/8/8/8/8/4K3 w - - 5 40").unwrap();

    let mv = board.push_uci("a7b8n").unwrap();
    assert_eq!(mv.promotion_piece(), Some(PieceType::Knight));
    assert_eq!(
        board.piece_at(Square::B8),
        Some(Piece::new(PieceType::Knight, Color::White))
    );
    assert!(board.board(Color::Black, PieceType::Rook).is_empty());
    assert!(board.pieces(PieceType::Pawn).is_empty());
    assert_eq!(board.fifty_move_rule(), 0);
    assert_consistent(&board);
}

#[test]
fn test_castling_push_moves_rook() {
    let mut board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 3 20").unwrap();
    let mv = board.push_uci("e8c8").unwrap();
    assert!(mv.is_castling());
    assert_eq!(board.piece_on_square(Square::C8), Some(PieceType::King));
    assert_eq!(board.piece_on_square(Square::D8), Some(PieceType::Rook));
    assert_eq!(board.piece_on_square(Square::A8), None);
    assert_eq!(board.piece_on_square(Square::E8), None);
    assert_eq!(
        board.castling_rights(),
        CastlingRights::new(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE)
    );
    assert_eq!(board.fifty_move_rule(), 4);
    assert_eq!(board.ply_count(), 21);
    assert_consistent(&board);
}

#[test]
fn test_castling_rights_revoked_by_rook_and_king_moves() {
    let mut board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    board.push_uci("h1h5").unwrap();
    assert_eq!(board.castling_rights().to_fen_field(), "Qkq");

    board.push_uci("e8e7").unwrap();
    assert_eq!(board.castling_rights().to_fen_field(), "Q");

    // Going back home does not restore anything
    board.push_uci("h5h1").unwrap();
    board.push_uci("e7e8").unwrap();
    assert_eq!(board.castling_rights().to_fen_field(), "Q");
}

#[test]
fn test_capturing_a_rook_revokes_its_right() {
    let mut board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    board.push_uci("a1a8").unwrap();
    assert_eq!(board.castling_rights().to_fen_field(), "Kk");
}

#[test]
fn test_castling_without_right_is_rejected() {
    let mut board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1").unwrap();
    let before = *board.info();
    let err = board.push_uci("e1g1").unwrap_err();
    assert!(matches!(err, ChessError::IllegalMove { .. }));
    assert_eq!(board.info(), &before);
    assert_eq!(board.history_len(), 0);
}

#[test]
fn test_pawn_on_last_rank_must_promote() {
    let mut board = ChessBoard::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let before = *board.info();
    assert!(matches!(
        board.push_uci("a7a8"),
        Err(ChessError::IllegalMove { .. })
    ));
    assert_eq!(board.info(), &before);

    board.push_uci("a7a8q").unwrap();
    assert_eq!(board.piece_on_square(Square::A8), Some(PieceType::Queen));
}

#[test]
fn test_counters_saturate() {
    let mut board =
        ChessBoard::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 4294967295 4294967295").unwrap();
    board.push_uci("e8d8").unwrap();
    assert_eq!(board.fifty_move_rule(), u32::MAX);
    assert_eq!(board.ply_count(), u32::MAX);
    assert!(board.pop_move());
    assert_eq!(board.fifty_move_rule(), u32::MAX);
}

#[test]
fn test_push_rejects_wrong_side_and_empty_square() {
    let mut board = ChessBoard::new();
    assert!(matches!(
        board.push_uci("e7e5"),
        Err(ChessError::IllegalMove { .. })
    ));
    assert!(matches!(
        board.push_uci("e3e4"),
        Err(ChessError::IllegalMove { .. })
    ));
    assert!(board.push_uci("e2").is_err());
    assert!(board.push_uci("e2e4x").is_err());
    assert!(board.push_uci("z2e4").is_err());
    assert_eq!(board.to_fen(), STARTING_FEN);
}

#[test]
fn test_board_with_owned_tables() {
    let tables = Arc::new(AttackTables::new());
    let mut board = ChessBoard::with_tables(Arc::clone(&tables), STARTING_FEN).unwrap();
    assert_eq!(board.legal_moves().len(), 20);
    board.push_uci("e2e4").unwrap();
    assert_eq!(board.legal_moves().len(), 20);

    let copy = board.clone();
    drop(board);
    assert_eq!(Arc::strong_count(&tables), 2);
    assert!(std::ptr::eq(copy.tables(), tables.as_ref()));
}

// ============================================================================
// UCI Parsing Tests
// ============================================================================

#[test]
fn test_move_from_uci_infers_type() {
    let board = ChessBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert_eq!(board.move_from_uci("e1g1").unwrap().move_type(), MoveType::Castling);
    assert_eq!(board.move_from_uci("a1a8").unwrap().move_type(), MoveType::Normal);

    // Same squares but a rook on e1 is not castling
    let board = ChessBoard::from_fen("4k3/8/8/8/8/8/8/K3R3 w - - 0 1").unwrap();
    assert_eq!(board.move_from_uci("e1g1").unwrap().move_type(), MoveType::Normal);

    let board =
        ChessBoard::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
            .unwrap();
    assert_eq!(board.move_from_uci("e5d6").unwrap().move_type(), MoveType::EnPassant);
    assert_eq!(board.move_from_uci("e5e6").unwrap().move_type(), MoveType::Normal);

    let promo = board.move_from_uci("a7a8q").unwrap();
    assert_eq!(promo.promotion_piece(), Some(PieceType::Queen));
}

// ============================================================================
// Check and Game End Tests
// ============================================================================

#[test]
fn test_square_attacked() {
    let board = ChessBoard::new();
    // f3 is covered by white's g2 pawn and g1 knight
    assert!(board.square_attacked(Square::F3, Color::Black));
    assert!(!board.square_attacked(Square::F3, Color::White));
    assert!(board.square_attacked(Square::F6, Color::White));
    assert!(!board.square_attacked(Square::E4, Color::White));
    assert!(!board.in_check());
}

#[test]
fn test_checkmate_and_stalemate() {
    let mate =
        ChessBoard::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
    assert!(mate.in_check());
    assert!(mate.king_in_check(Color::White));
    assert!(!mate.king_in_check(Color::Black));
    assert!(mate.is_checkmate());
    assert!(!mate.is_stalemate());
    assert!(!mate.has_legal_moves());

    let stalemate = ChessBoard::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!stalemate.in_check());
    assert!(stalemate.is_stalemate());
    assert!(!stalemate.is_checkmate());
    assert!(stalemate.legal_uci_moves().is_empty());
}

// ============================================================================
// Random Playout Properties
// ============================================================================

#[test]
fn test_random_playouts_keep_invariants_and_undo() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..40 {
        let mut board = ChessBoard::new();
        let mut previous_rights = board.castling_rights();
        for _ in 0..120 {
            let moves = board.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.random_range(0..moves.len())];

            let before = *board.info();
            board.push_move(mv).unwrap();
            assert_consistent(&board);
            assert!(!board.king_in_check(board.side_to_move().opposite()));

            // Rights never come back
            let rights = board.castling_rights();
            assert_eq!(rights.raw() & !previous_rights.raw(), 0);
            previous_rights = rights;

            board.pop_move();
            assert_eq!(board.info(), &before);
            board.push_move(mv).unwrap();
        }
    }
}
