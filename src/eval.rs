/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Piece, PieceKind, Position, Score};

/// The signature of a host-supplied evaluation function.
///
/// Called at leaf and quiescence nodes with the 12 piece bitboards in
/// canonical order (`color * 6 + kind`), the 3 occupancy bitboards (White,
/// Black, all), and the side to move (`0` = White, `1` = Black).
///
/// The returned score must be from the *side-to-move's* perspective: positive
/// means the player whose turn it is stands better. The engine does not
/// interpret units, but centipawns are conventional; magnitudes at or above
/// 90,000 are reserved for mate scores and must not be returned.
///
/// The callback must not hold onto the borrows beyond the call, and must not
/// attempt to mutate engine state.
pub type EvalCallback = fn(pieces: &[u64; 12], occupancy: &[u64; 3], side_to_move: u32) -> i32;

/// Invokes a host evaluation callback on the provided [`Position`].
#[inline(always)]
pub fn evaluate(position: &Position, eval: EvalCallback) -> Score {
    let pieces: [u64; Piece::COUNT] = std::array::from_fn(|i| position.pieces()[i].inner());
    let occupancy: [u64; 3] = std::array::from_fn(|i| position.occupancy()[i].inner());

    Score::new(eval(
        &pieces,
        &occupancy,
        position.side_to_move().bits() as u32,
    ))
}

/// A bare material counter, usable as a default [`EvalCallback`].
///
/// Sums piece values (P=100, N=300, B=320, R=500, Q=900) for each side and
/// returns the difference from the side-to-move's perspective. Deliberately
/// ignorant of position; hosts that want a stronger engine supply their own
/// callback.
pub fn material_eval(pieces: &[u64; 12], _occupancy: &[u64; 3], side_to_move: u32) -> i32 {
    let mut score = 0;

    for kind in PieceKind::all() {
        let value = kind.value();
        score += pieces[kind.index()].count_ones() as i32 * value;
        score -= pieces[PieceKind::COUNT + kind.index()].count_ones() as i32 * value;
    }

    if side_to_move == 0 {
        score
    } else {
        -score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_eval_is_symmetric() {
        let pos = Position::default();
        assert_eq!(evaluate(&pos, material_eval), Score::DRAW);
    }

    #[test]
    fn test_material_eval_is_side_relative() {
        // White is up a queen
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&pos, material_eval), Score::new(900));

        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&pos, material_eval), Score::new(-900));
    }
}
