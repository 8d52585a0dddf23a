/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use super::{
    movegen::generate_moves,
    MoveList, Position,
};

/// Counts the leaf nodes of the move-generation tree from `position` at the
/// given `depth`.
///
/// This is the canonical correctness benchmark for move generation and
/// make/undo: counts for well-known positions are published and must match
/// exactly.
pub fn perft(position: &mut Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generate_moves(position, &mut moves);

    let us = position.side_to_move();
    let mut nodes = 0;

    for mv in moves {
        position.make_move(mv);

        // The move was legal iff the mover's King is not attacked afterwards
        if !position.is_in_check(us) {
            nodes += perft(position, depth - 1);
        }

        position.undo_move(mv);
    }

    nodes
}

/// Performs a splitperft: prints the node count beneath each root move, then
/// the total, along with timing information.
pub fn print_perft(position: &mut Position, depth: usize) -> u64 {
    let now = Instant::now();

    let mut moves = MoveList::new();
    generate_moves(position, &mut moves);

    let us = position.side_to_move();
    let mut total = 0;

    for mv in moves {
        position.make_move(mv);

        if !position.is_in_check(us) {
            let nodes = if depth > 0 { perft(position, depth - 1) } else { 1 };
            println!("{mv}: {nodes}");
            total += nodes;
        }

        position.undo_move(mv);
    }

    let elapsed = now.elapsed();
    let nps = total as f64 / elapsed.as_secs_f64();
    println!("\n{total} nodes in {elapsed:.2?} ({nps:.0} nps)");

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_perft(fen: &str, depth: usize, expected: u64) {
        let mut position = Position::from_fen(fen).unwrap();
        assert_eq!(
            perft(&mut position, depth),
            expected,
            "perft({depth}) failed on {fen}"
        );
    }

    #[test]
    fn test_startpos_shallow() {
        assert_perft(crate::FEN_STARTPOS, 1, 20);
        assert_perft(crate::FEN_STARTPOS, 2, 400);
        assert_perft(crate::FEN_STARTPOS, 3, 8_902);
    }

    #[test]
    fn test_kiwipete_shallow() {
        assert_perft(crate::FEN_KIWIPETE, 1, 48);
        assert_perft(crate::FEN_KIWIPETE, 2, 2_039);
        assert_perft(crate::FEN_KIWIPETE, 3, 97_862);
    }

    #[test]
    fn test_promotion_position() {
        let fen = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";
        assert_perft(fen, 1, 24);
        assert_perft(fen, 2, 496);
        assert_perft(fen, 3, 9_483);
    }

    #[test]
    fn test_en_passant_pins() {
        // The EP capture would expose the king along the fifth rank
        assert_perft("8/8/8/8/1k1Pp2R/8/8/4K3 b - d3 0 1", 1, 8);
        assert_perft("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 1", 1, 6);
    }
}
