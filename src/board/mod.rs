/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Pre-computed attack tables and the square-attacked predicate.
pub mod attacks;

/// A wrapper around a `u64`, plus many utility functions for taking advantage of bitwise operations.
mod bitboard;

/// Pseudo-legal move generation.
pub mod movegen;

/// A compact 16-bit move representation.
mod moves;

/// Perft (performance test) for validating move generation.
pub mod perft;

/// All code related to pieces (including Color) on a chess board.
mod piece;

/// The board representation itself: piece placement, game state, make/undo.
mod position;

/// A pseudo-random number generator with fixed seeds, for reproducible keys and magics.
mod prng;

/// Squares on a chess board, and their files and ranks.
mod square;

/// Zobrist hashing for positions.
mod zobrist;

pub use bitboard::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use zobrist::*;
