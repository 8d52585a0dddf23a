/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use newt::{perft::perft, Position, FEN_KIWIPETE, FEN_STARTPOS};

fn test_perft_fen_nodes(depth: usize, fen: &str, expected: u64) {
    let mut position = Position::from_fen(fen).unwrap();
    let nodes = perft(&mut position, depth);
    assert_eq!(nodes, expected, "PERFT({depth}) failed on {fen}");
}

#[test]
fn test_startpos_perft() {
    test_perft_fen_nodes(1, FEN_STARTPOS, 20);
    test_perft_fen_nodes(2, FEN_STARTPOS, 400);
    test_perft_fen_nodes(3, FEN_STARTPOS, 8_902);
    test_perft_fen_nodes(4, FEN_STARTPOS, 197_281);
    test_perft_fen_nodes(5, FEN_STARTPOS, 4_865_609);
}

#[test]
fn test_kiwipete_perft() {
    test_perft_fen_nodes(1, FEN_KIWIPETE, 48);
    test_perft_fen_nodes(2, FEN_KIWIPETE, 2_039);
    test_perft_fen_nodes(3, FEN_KIWIPETE, 97_862);
    test_perft_fen_nodes(4, FEN_KIWIPETE, 4_085_603);
}

/// <https://www.chessprogramming.org/Perft_Results#Position_3>
#[test]
fn test_position_3_perft() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    test_perft_fen_nodes(1, fen, 14);
    test_perft_fen_nodes(2, fen, 191);
    test_perft_fen_nodes(3, fen, 2_812);
    test_perft_fen_nodes(4, fen, 43_238);
    test_perft_fen_nodes(5, fen, 674_624);
}

/// <https://www.chessprogramming.org/Perft_Results#Position_4>
#[test]
fn test_position_4_perft() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    test_perft_fen_nodes(1, fen, 6);
    test_perft_fen_nodes(2, fen, 264);
    test_perft_fen_nodes(3, fen, 9_467);
    test_perft_fen_nodes(4, fen, 422_333);
}

/// <https://www.chessprogramming.org/Perft_Results#Position_5>
#[test]
fn test_position_5_perft() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    test_perft_fen_nodes(1, fen, 44);
    test_perft_fen_nodes(2, fen, 1_486);
    test_perft_fen_nodes(3, fen, 62_379);
    test_perft_fen_nodes(4, fen, 2_103_487);
}

/// A sample test position for discovering promotion bugs.
#[test]
fn test_promotion_perft() {
    let fen = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";
    test_perft_fen_nodes(1, fen, 24);
    test_perft_fen_nodes(2, fen, 496);
    test_perft_fen_nodes(3, fen, 9_483);
    test_perft_fen_nodes(4, fen, 182_838);
    test_perft_fen_nodes(5, fen, 3_605_103);
}

/// Positions from <https://www.chessprogramming.net/perfect-perft/> that
/// stress specific rules.
#[test]
fn test_special_perfts() {
    // Illegal en passant moves
    test_perft_fen_nodes(6, "3k4/3p4/8/K1P4r/8/8/8/8 b - - 0 1", 1_134_888);
    test_perft_fen_nodes(6, "8/8/4k3/8/2p5/8/B2P2K1/8 w - - 0 1", 1_015_133);

    // En passant capture checks the opponent
    test_perft_fen_nodes(6, "8/8/1k6/2b5/2pP4/8/5K2/8 b - d3 0 1", 1_440_467);

    // Castling gives check
    test_perft_fen_nodes(6, "5k2/8/8/8/8/8/8/4K2R w K - 0 1", 661_072);
    test_perft_fen_nodes(6, "3k4/8/8/8/8/8/8/R3K3 w Q - 0 1", 803_711);

    // Castling rights and prevented castling
    test_perft_fen_nodes(4, "r3k2r/1b4bq/8/8/8/8/7B/R3K2R w KQkq - 0 1", 1_274_206);
    test_perft_fen_nodes(4, "r3k2r/8/3Q4/8/8/5q2/8/R3K2R b KQkq - 0 1", 1_720_476);

    // Promote out of check / to give check
    test_perft_fen_nodes(6, "2K2r2/4P3/8/8/8/8/8/3k4 w - - 0 1", 3_821_001);
    test_perft_fen_nodes(6, "4k3/1P6/8/8/8/8/K7/8 w - - 0 1", 217_342);
    test_perft_fen_nodes(6, "8/P1k5/K7/8/8/8/8/8 w - - 0 1", 92_683);

    // Discovered check
    test_perft_fen_nodes(5, "8/8/1P2K3/8/2n5/1q6/8/5k2 b - - 0 1", 1_004_658);

    // Self stalemate, and stalemate/checkmate endings
    test_perft_fen_nodes(6, "K1k5/8/P7/8/8/8/8/8 w - - 0 1", 2_217);
    test_perft_fen_nodes(7, "8/k1P5/8/1K6/8/8/8/8 w - - 0 1", 567_584);
    test_perft_fen_nodes(4, "8/8/2k5/5q2/5n2/8/5K2/8 b - - 0 1", 23_527);
}
