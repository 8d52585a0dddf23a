/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! An embeddable bitboard chess-engine core.
//!
//! The board is represented with magic bitboards, positions are mutated
//! through make/undo with incremental Zobrist hashing, and the search is a
//! fixed-depth negamax with alpha-beta pruning, principal variation search,
//! quiescence, and the classic ordering heuristics. Evaluation is *not*
//! included: the host supplies an [`EvalCallback`] and the engine calls it at
//! leaf nodes, so the same core can drive arbitrarily different players.

/// The board representation: bitboards, squares, pieces, moves, attack
/// tables, Zobrist hashing, move generation, and perft.
pub mod board;

/// Commands to be sent to the engine, and how to parse them.
mod cli;

/// The interactive engine loop and headless self-play.
mod engine;

/// The evaluation-callback contract, plus a built-in material evaluator.
mod eval;

/// Killer-move and history-heuristic tables.
mod history;

/// Incremental best-first move selection for the search.
mod movepicker;

/// Types and utilities for rating how good/bad a position is.
mod score;

/// Main engine logic; all search related code.
mod search;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use history::*;
pub use movepicker::*;
pub use score::*;
pub use search::*;

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// One-time initialization of the process-wide attack tables.
///
/// The leaper tables and Zobrist keys are compile-time constants, but the
/// slider tables are discovered at runtime; calling this up front keeps that
/// cost out of the first search. Idempotent, and safe to skip: everything
/// initializes lazily on first use.
pub fn init() {
    board::attacks::init();
}
