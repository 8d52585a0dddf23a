/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    attacks, Bitboard, Color, Move, MoveKind, MoveList, PieceKind, Position, Rank, Square,
};

/// Appends all pseudo-legal moves for the side to move onto `moves`.
///
/// Pseudo-legal moves are geometrically valid for the current board, but may
/// leave the mover's King in check after being made. Callers (the search,
/// perft) filter those by testing the King's square after [`Position::make_move`].
pub fn generate_moves(position: &Position, moves: &mut MoveList) {
    let us = position.side_to_move();
    let them_occ = position.color(us.opponent());
    let blockers = position.occupied();

    pawn_moves(position, us, moves);

    // Knights, sliders, and the King share a capture/quiet split
    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        for from in position.piece_parts(us, kind) {
            let attacks = attacks_for(kind, from, blockers) & !position.color(us);

            for to in attacks & them_occ {
                moves.push(Move::new(from, to, MoveKind::Capture));
            }
            for to in attacks & !them_occ {
                moves.push(Move::new(from, to, MoveKind::Quiet));
            }
        }
    }

    castling_moves(position, us, moves);
}

/// Appends the pseudo-legal capture-only subset onto `moves`, for quiescence:
/// captures by any piece, en passant, and Queen promotions with or without
/// capture.
pub fn generate_captures(position: &Position, moves: &mut MoveList) {
    let us = position.side_to_move();
    let them_occ = position.color(us.opponent());
    let blockers = position.occupied();

    let pawns = position.pawns(us);
    let promo_rank = Bitboard::from_rank(Rank::eighth(us));
    let ep_bitboard = Bitboard::from_option(position.ep_square());

    for from in pawns {
        let attacks = attacks::pawn_attacks(us, from);

        for to in attacks & them_occ & promo_rank {
            moves.push(Move::new(from, to, MoveKind::CaptureAndPromoteQueen));
        }
        for to in attacks & them_occ & !promo_rank {
            moves.push(Move::new(from, to, MoveKind::Capture));
        }
        for to in attacks & ep_bitboard {
            moves.push(Move::new(from, to, MoveKind::EnPassantCapture));
        }
    }

    // A pawn one step from promotion is never "quiet" in the search's eyes
    let pushes = pawns.forward_by(us, 1) & !blockers & promo_rank;
    for to in pushes {
        // Safety: the promotion rank always has a square behind it
        let from = unsafe { to.backward_by(us, 1).unwrap_unchecked() };
        moves.push(Move::new(from, to, MoveKind::PromoteQueen));
    }

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        for from in position.piece_parts(us, kind) {
            let attacks = attacks_for(kind, from, blockers);

            for to in attacks & them_occ {
                moves.push(Move::new(from, to, MoveKind::Capture));
            }
        }
    }
}

/// Returns `true` if the side to move has at least one legal move.
pub fn has_legal_move(position: &mut Position) -> bool {
    let mut moves = MoveList::new();
    generate_moves(position, &mut moves);

    let us = position.side_to_move();
    for mv in moves {
        position.make_move(mv);
        let legal = !position.is_in_check(us);
        position.undo_move(mv);

        if legal {
            return true;
        }
    }

    false
}

/// Fetch the pseudo-legal attacks for a non-pawn piece of `kind` at `square`,
/// given `blockers`.
#[inline(always)]
fn attacks_for(kind: PieceKind, square: Square, blockers: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Knight => attacks::knight_attacks(square),
        PieceKind::Bishop => attacks::bishop_attacks(square, blockers),
        PieceKind::Rook => attacks::rook_attacks(square, blockers),
        PieceKind::Queen => attacks::queen_attacks(square, blockers),
        PieceKind::King => attacks::king_attacks(square),
        // Pawns push and capture asymmetrically; see `pawn_moves`
        PieceKind::Pawn => unreachable!(),
    }
}

/// Generates all pseudo-legal pawn moves: pushes, double pushes, captures,
/// promotions, and en passant.
fn pawn_moves(position: &Position, us: Color, moves: &mut MoveList) {
    let pawns = position.pawns(us);
    let empty = !position.occupied();
    let them_occ = position.color(us.opponent());
    let promo_rank = Bitboard::from_rank(Rank::eighth(us));
    let ep_bitboard = Bitboard::from_option(position.ep_square());

    // Pushes are generated by shifting the whole pawn set forward.
    // Pawns never stand on their own back rank, so the shift cannot wrap.
    let single = pawns.forward_by(us, 1) & empty;

    for to in single & promo_rank {
        // Safety: every push destination has a square behind it
        let from = unsafe { to.backward_by(us, 1).unwrap_unchecked() };
        for kind in PieceKind::promotions() {
            moves.push(Move::new(from, to, MoveKind::promotion(kind)));
        }
    }

    for to in single & !promo_rank {
        let from = unsafe { to.backward_by(us, 1).unwrap_unchecked() };
        moves.push(Move::new(from, to, MoveKind::Quiet));
    }

    // Only pawns whose single push landed on their third rank may push again
    let double = (single & Bitboard::from_rank(Rank::third(us))).forward_by(us, 1) & empty;
    for to in double {
        let from = unsafe { to.backward_by(us, 2).unwrap_unchecked() };
        moves.push(Move::new(from, to, MoveKind::PawnDoublePush));
    }

    // Captures are resolved per pawn through the attack tables
    for from in pawns {
        let attacks = attacks::pawn_attacks(us, from);

        for to in attacks & them_occ & promo_rank {
            for kind in PieceKind::promotions() {
                moves.push(Move::new(from, to, MoveKind::promotion_capture(kind)));
            }
        }

        for to in attacks & them_occ & !promo_rank {
            moves.push(Move::new(from, to, MoveKind::Capture));
        }

        // A pawn attacking the en passant square captures onto an empty square
        for to in attacks & ep_bitboard {
            moves.push(Move::new(from, to, MoveKind::EnPassantCapture));
        }
    }
}

/// Generates pseudo-legal castling moves for `us`.
///
/// Requires the right to castle, empty squares between King and Rook, and
/// that the King's start, pass-through, and destination squares are not
/// attacked. On the queenside, the B-file square must be empty but is allowed
/// to be attacked, since only the Rook crosses it.
fn castling_moves(position: &Position, us: Color, moves: &mut MoveList) {
    let rights = position.castle_rights();
    if !rights.has_any(us) {
        return;
    }

    let them = us.opponent();
    let blockers = position.occupied();

    // Rights imply the King is still on its home square
    let king = Square::E1.rank_relative_to(us);

    if rights.has_short(us) {
        let f = Square::F1.rank_relative_to(us);
        let g = Square::G1.rank_relative_to(us);

        let path_is_empty = (blockers & (f.bitboard() | g)).is_empty();

        if path_is_empty
            && !position.is_square_attacked(king, them)
            && !position.is_square_attacked(f, them)
            && !position.is_square_attacked(g, them)
        {
            moves.push(Move::new(king, g, MoveKind::ShortCastle));
        }
    }

    if rights.has_long(us) {
        let d = Square::D1.rank_relative_to(us);
        let c = Square::C1.rank_relative_to(us);
        let b = Square::B1.rank_relative_to(us);

        let path_is_empty = (blockers & (d.bitboard() | c | b)).is_empty();

        if path_is_empty
            && !position.is_square_attacked(king, them)
            && !position.is_square_attacked(d, them)
            && !position.is_square_attacked(c, them)
        {
            moves.push(Move::new(king, c, MoveKind::LongCastle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_for(fen: &str) -> MoveList {
        let position = Position::from_fen(fen).unwrap();
        let mut moves = MoveList::new();
        generate_moves(&position, &mut moves);
        moves
    }

    fn contains(moves: &MoveList, uci: &str, kind: MoveKind) -> bool {
        moves.iter().any(|mv| *mv == uci && mv.kind() == kind)
    }

    #[test]
    fn test_startpos_has_twenty_moves() {
        let moves = moves_for("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(moves.len(), 20);
        assert!(contains(&moves, "e2e4", MoveKind::PawnDoublePush));
        assert!(contains(&moves, "e2e3", MoveKind::Quiet));
        assert!(contains(&moves, "g1f3", MoveKind::Quiet));
    }

    #[test]
    fn test_blocked_pawns_cannot_push() {
        // A pawn directly blocked cannot advance at all
        let moves = moves_for("4k3/8/8/8/4p3/4P3/8/4K3 w - - 0 1");
        assert!(!moves.iter().any(|mv| mv.from() == Square::E3));

        // A pawn blocked on its fourth rank can single-push only
        let moves = moves_for("4k3/8/8/8/4p3/8/4P3/4K3 w - - 0 1");
        assert!(contains(&moves, "e2e3", MoveKind::Quiet));
        assert!(!contains(&moves, "e2e4", MoveKind::PawnDoublePush));
    }

    #[test]
    fn test_en_passant_is_generated() {
        let moves = moves_for("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert!(contains(&moves, "e5d6", MoveKind::EnPassantCapture));

        // Without the en passant square, only the push remains
        let moves = moves_for("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert!(!contains(&moves, "e5d6", MoveKind::EnPassantCapture));
    }

    #[test]
    fn test_promotions_generate_all_four_kinds() {
        let moves = moves_for("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<_> = moves.iter().filter(|mv| mv.is_promotion()).collect();
        assert_eq!(promotions.len(), 4);
        assert!(contains(&moves, "a7a8q", MoveKind::PromoteQueen));
        assert!(contains(&moves, "a7a8n", MoveKind::PromoteKnight));
        assert!(contains(&moves, "a7a8r", MoveKind::PromoteRook));
        assert!(contains(&moves, "a7a8b", MoveKind::PromoteBishop));

        // With a victim on B8, four capturing promotions appear as well
        let moves = moves_for("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<_> = moves.iter().filter(|mv| mv.is_promotion()).collect();
        assert_eq!(promotions.len(), 8);
        assert!(contains(&moves, "a7b8q", MoveKind::CaptureAndPromoteQueen));
        assert!(contains(&moves, "a7b8n", MoveKind::CaptureAndPromoteKnight));
    }

    #[test]
    fn test_castling_preconditions() {
        // All clear: both castles available
        let moves = moves_for("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(contains(&moves, "e1g1", MoveKind::ShortCastle));
        assert!(contains(&moves, "e1c1", MoveKind::LongCastle));

        // No rights, no castling, even with the path clear
        let moves = moves_for("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1");
        assert!(!contains(&moves, "e1g1", MoveKind::ShortCastle));
        assert!(!contains(&moves, "e1c1", MoveKind::LongCastle));

        // A blocked path prevents castling
        let moves = moves_for("4k3/8/8/8/8/8/8/R2QK2R w KQ - 0 1");
        assert!(contains(&moves, "e1g1", MoveKind::ShortCastle));
        assert!(!contains(&moves, "e1c1", MoveKind::LongCastle));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // Black's rook on F8 attacks F1, so kingside castling must not appear
        let moves = moves_for("5rk1/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(!contains(&moves, "e1g1", MoveKind::ShortCastle));

        // An attack on B1 does NOT prevent queenside castling, since only
        // the rook crosses B1
        let moves = moves_for("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(contains(&moves, "e1c1", MoveKind::LongCastle));

        // But an attack on D1 or C1 does
        let moves = moves_for("2r1k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(!contains(&moves, "e1c1", MoveKind::LongCastle));
    }

    #[test]
    fn test_castling_while_in_check_is_not_generated() {
        let moves = moves_for("4k3/8/8/8/8/8/4r3/4K2R w K - 0 1");
        assert!(!contains(&moves, "e1g1", MoveKind::ShortCastle));
    }

    #[test]
    fn test_captures_subset() {
        let position = Position::from_fen(crate::FEN_KIWIPETE).unwrap();
        let mut captures = MoveList::new();
        generate_captures(&position, &mut captures);

        // Every generated move is a capture or a queen promotion
        assert!(captures
            .iter()
            .all(|mv| mv.is_capture() || mv.promotion() == Some(PieceKind::Queen)));

        // And it agrees with filtering the full move list
        let mut all = MoveList::new();
        generate_moves(&position, &mut all);
        let expected = all.iter().filter(|mv| mv.is_capture()).count();
        assert_eq!(captures.iter().filter(|mv| mv.is_capture()).count(), expected);
    }

    #[test]
    fn test_sliders_respect_blockers() {
        let moves = moves_for("4k3/8/8/8/3p4/8/8/3R1K2 w - - 0 1");
        // The rook can capture the pawn on D4 but not pass through it
        assert!(contains(&moves, "d1d4", MoveKind::Capture));
        assert!(!moves.iter().any(|mv| *mv == "d1d5"));
        assert!(!moves.iter().any(|mv| *mv == "d1d8"));
    }
}
