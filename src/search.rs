/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    board::movegen::{generate_captures, generate_moves},
    evaluate, EvalCallback, HistoryTable, KillerTable, Move, MoveList, MovePicker, PieceKind,
    Position, Score,
};

/// Maximum ply depth the search can reach, including quiescence.
pub const MAX_PLY: usize = 128;

/// Maximum depth that can be requested for a search.
pub const MAX_DEPTH: u8 = 64;

/// Recursion cap for quiescence search.
const QS_MAX_DEPTH: u8 = 8;

/// Margin for delta pruning in quiescence: captures are skipped when even
/// this large a material swing cannot lift the stand-pat back above alpha.
const DELTA_MARGIN: i32 = 900;

/// Base ordering score for captures; MVV-LVA differentiates within them.
const CAPTURE_SCORE: i32 = 10_000;

/// Ordering score for quiet promotions.
const PROMOTION_SCORE: i32 = 9_000;

/// Ordering scores for the two killer-move slots at each ply.
const KILLER_FIRST_SCORE: i32 = 8_000;
const KILLER_SECOND_SCORE: i32 = 7_000;

/// This table represents values for [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) move ordering.
///
/// It is indexed by `[victim][attacker]`, and yields a "score" that is added
/// onto [`CAPTURE_SCORE`] when sorting moves: capturing the most valuable
/// victim with the least valuable attacker scores highest.
const MVV_LVA: [[i32; PieceKind::COUNT]; PieceKind::COUNT] = {
    let mut matrix = [[0; PieceKind::COUNT]; PieceKind::COUNT];

    let mut victim = 0;
    while victim < PieceKind::COUNT {
        let mut attacker = 0;
        while attacker < PieceKind::COUNT {
            let v = PieceKind::from_bits_unchecked(victim as u8).value();
            let a = PieceKind::from_bits_unchecked(attacker as u8).value();

            // Weighting the victim 10x keeps every victim tier above the next
            matrix[victim][attacker] = 10 * v - a;
            attacker += 1;
        }
        victim += 1;
    }

    matrix
};

/// Configuration for a [`Search`].
#[derive(Clone, Copy)]
pub struct SearchParams {
    /// Depth, in plies, to search to.
    pub depth: u8,

    /// Evaluation callback invoked at leaf and quiescence nodes.
    pub eval: EvalCallback,
}

/// The result of a search: the best move found, its score, the depth of the
/// deepest completed iteration, and the total nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move found during the search, if any legal move exists.
    pub bestmove: Option<Move>,

    /// Evaluation of the position after `bestmove` is made.
    pub score: Score,

    /// The depth of the deepest completed iteration.
    pub depth: u8,

    /// Number of nodes searched.
    pub nodes: u64,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            bestmove: None,
            score: -Score::INF,
            depth: 0,
            nodes: 0,
        }
    }
}

/// Executes a fixed-depth search on a [`Position`].
///
/// Negamax with alpha-beta pruning in a fail-hard framework, principal
/// variation search, quiescence, MVV-LVA/killer/history move ordering, and
/// iterative deepening at the top level.
///
/// A search owns its killer and history tables; their lifetime is the
/// top-level [`Search::start`] call. It requires exclusive use of the
/// [`Position`] for its duration, and always restores it before returning.
pub struct Search {
    /// Configuration for this search.
    params: SearchParams,

    /// Quiet moves that caused beta cutoffs, by ply.
    killers: KillerTable,

    /// Cutoff counters for quiet moves, by (side, from, to).
    history: HistoryTable,

    /// Number of nodes searched so far.
    nodes: u64,

    /// Cooperative stop flag. When cleared, the search unwinds as soon as
    /// possible and reports the deepest fully-completed iteration.
    is_searching: Arc<AtomicBool>,
}

impl Search {
    /// Constructs a new [`Search`] that will run to its configured depth.
    pub fn new(params: SearchParams) -> Self {
        Self::with_stop_flag(params, Arc::new(AtomicBool::new(true)))
    }

    /// Constructs a new [`Search`] whose progress is gated on `is_searching`.
    ///
    /// A host may clear the flag from another thread to interrupt the search.
    pub fn with_stop_flag(params: SearchParams, is_searching: Arc<AtomicBool>) -> Self {
        Self {
            params,
            killers: KillerTable::default(),
            history: HistoryTable::default(),
            nodes: 0,
            is_searching,
        }
    }

    /// Runs the search on `position` and returns the result of the deepest
    /// completed iteration.
    ///
    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening):
    /// searches at depth 1, 2, ... up to the configured depth, seeding each
    /// iteration's root ordering with the previous iteration's best move.
    pub fn start(mut self, position: &mut Position) -> SearchResult {
        // Attack tables may not have been touched yet; this is free afterwards
        crate::init();

        // The heuristic tables start fresh for every top-level search
        self.killers.clear();
        self.history.clear();

        let max_depth = self.params.depth.clamp(1, MAX_DEPTH);
        let mut result = SearchResult::default();

        for depth in 1..=max_depth {
            let (bestmove, score) = self.search_root(position, depth, result.bestmove);

            // A cancelled iteration cannot be trusted; fall back to the last
            // completed one. Depth 1 is always kept so a move is available.
            if !self.is_searching.load(Ordering::Relaxed) && depth > 1 {
                break;
            }

            result = SearchResult {
                bestmove,
                score,
                depth,
                nodes: self.nodes,
            };

            // Terminal position: no legal moves now, so no deeper answers
            if bestmove.is_none() {
                break;
            }
        }

        result
    }

    /// Searches the root node: like [`Search::negamax`], but tracks which
    /// move produced the best score, and prioritizes `prev_best` (the best
    /// move of the previous iteration) above all others.
    fn search_root(
        &mut self,
        position: &mut Position,
        depth: u8,
        prev_best: Option<Move>,
    ) -> (Option<Move>, Score) {
        let mut moves = MoveList::new();
        generate_moves(position, &mut moves);

        let us = position.side_to_move();
        let picker = MovePicker::new(moves, |mv| {
            if prev_best.is_some_and(|best| best == *mv) {
                i32::MAX
            } else {
                self.score_move(position, mv, 0)
            }
        });

        let mut alpha = -Score::INF;
        let beta = Score::INF;
        let mut bestmove = None;
        let mut legal = 0;

        for (mv, _) in picker {
            position.make_move(mv);

            // Skip moves that leave our own King attacked
            if position.is_in_check(us) {
                position.undo_move(mv);
                continue;
            }
            legal += 1;

            let score = if legal == 1 {
                -self.negamax(position, depth - 1, -beta, -alpha, 1)
            } else {
                // Null-window probe first; re-search on improvement
                let null = -self.negamax(position, depth - 1, -(alpha + 1), -alpha, 1);
                if null > alpha && null < beta {
                    -self.negamax(position, depth - 1, -beta, -alpha, 1)
                } else {
                    null
                }
            };

            position.undo_move(mv);

            // Alpha starts at -INF, so the first legal move always lands here
            if score > alpha {
                alpha = score;
                bestmove = Some(mv);
            }
        }

        if legal == 0 {
            // Checkmate or stalemate at the root
            let score = if position.in_check() {
                -Score::MATE
            } else {
                Score::DRAW
            };
            return (None, score);
        }

        (bestmove, alpha)
    }

    /// Primary location of search logic: fail-hard negamax with alpha-beta
    /// pruning and [principal variation search](https://www.chessprogramming.org/Principal_Variation_Search).
    fn negamax(
        &mut self,
        position: &mut Position,
        depth: u8,
        mut alpha: Score,
        beta: Score,
        ply: i32,
    ) -> Score {
        self.nodes += 1;

        // Cooperative cancellation; the discarded bound never escapes an
        // iteration, since `start` drops cancelled iterations entirely.
        if !self.is_searching.load(Ordering::Relaxed) {
            return alpha;
        }

        // Draw by rule is scored from the node itself, not the leaves
        if position.is_draw() {
            return Score::DRAW;
        }

        // At the horizon, resolve captures before trusting the evaluation
        if depth == 0 {
            return self.quiescence(position, alpha, beta, 0);
        }

        let mut moves = MoveList::new();
        generate_moves(position, &mut moves);

        let us = position.side_to_move();
        let ply_index = (ply as usize).min(MAX_PLY - 1);
        let picker = MovePicker::new(moves, |mv| self.score_move(position, mv, ply_index));

        let mut legal = 0;

        for (mv, _) in picker {
            position.make_move(mv);

            if position.is_in_check(us) {
                position.undo_move(mv);
                continue;
            }
            legal += 1;

            let score = if legal == 1 {
                // The first move is assumed to be best, thanks to ordering:
                // it gets the full window
                -self.negamax(position, depth - 1, -beta, -alpha, ply + 1)
            } else {
                // Everything else gets a null window, which prunes much
                // faster; only an improvement forces the costly re-search
                let null = -self.negamax(position, depth - 1, -(alpha + 1), -alpha, ply + 1);
                if null > alpha && null < beta {
                    -self.negamax(position, depth - 1, -beta, -alpha, ply + 1)
                } else {
                    null
                }
            };

            position.undo_move(mv);

            if score >= beta {
                // A quiet refutation is worth remembering for its siblings
                if mv.is_quiet() {
                    self.killers.store(ply_index, mv);
                    self.history.update(us, mv, depth);
                }
                return beta; // fail-hard
            }

            if score > alpha {
                alpha = score;
            }
        }

        if legal == 0 {
            // The ply offset prefers shorter mates for the winner and
            // longer mates for the loser
            return if position.in_check() {
                -Score::MATE + ply
            } else {
                Score::DRAW
            };
        }

        alpha
    }

    /// [Quiescence search](https://www.chessprogramming.org/Quiescence_Search):
    /// extends the search at the horizon across captures and promotions, so
    /// the evaluation is only ever trusted on a quiet position.
    fn quiescence(
        &mut self,
        position: &mut Position,
        mut alpha: Score,
        beta: Score,
        qdepth: u8,
    ) -> Score {
        self.nodes += 1;

        // The side to move can usually do at least as well as standing pat
        let stand_pat = evaluate(position, self.params.eval);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        if qdepth >= QS_MAX_DEPTH {
            return alpha;
        }

        let mut captures = MoveList::new();
        generate_captures(position, &mut captures);

        let us = position.side_to_move();
        let picker = MovePicker::new(captures, |mv| self.capture_score(position, mv));

        for (mv, _) in picker {
            // Delta pruning: when far enough below alpha, no capture short of
            // a promotion can catch up
            if stand_pat + DELTA_MARGIN < alpha && !mv.is_promotion() {
                continue;
            }

            position.make_move(mv);

            if position.is_in_check(us) {
                position.undo_move(mv);
                continue;
            }

            let score = -self.quiescence(position, -beta, -alpha, qdepth + 1);
            position.undo_move(mv);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// Applies an ordering score to the provided move.
    ///
    /// Captures rank above everything, ordered by MVV-LVA; then promotions,
    /// then the two killers at this ply, then quiet moves by their history.
    fn score_move(&self, position: &Position, mv: &Move, ply: usize) -> i32 {
        if mv.is_capture() {
            return self.capture_score(position, mv);
        }

        if mv.is_promotion() {
            return PROMOTION_SCORE;
        }

        let killers = self.killers.at(ply);
        if killers[0] == *mv {
            return KILLER_FIRST_SCORE;
        }
        if killers[1] == *mv {
            return KILLER_SECOND_SCORE;
        }

        self.history.bonus(position.side_to_move(), *mv)
    }

    /// Scores a move from the capture-only generator: MVV-LVA for captures,
    /// the promotion bonus for quiet promotions.
    fn capture_score(&self, position: &Position, mv: &Move) -> i32 {
        if !mv.is_capture() {
            return PROMOTION_SCORE;
        }

        let us = position.side_to_move();

        // The mover always exists; the fallbacks only appease the type checker
        let attacker = position.kind_at(mv.from(), us).unwrap_or(PieceKind::Pawn);
        let victim = if mv.is_en_passant() {
            PieceKind::Pawn
        } else {
            position
                .kind_at(mv.to(), us.opponent())
                .unwrap_or(PieceKind::Pawn)
        };

        CAPTURE_SCORE + MVV_LVA[victim.index()][attacker.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material_eval;

    fn run_search(fen: &str, depth: u8) -> SearchResult {
        let mut position = Position::from_fen(fen).unwrap();
        Search::new(SearchParams {
            depth,
            eval: material_eval,
        })
        .start(&mut position)
    }

    #[test]
    fn test_mvv_lva_prefers_valuable_victims() {
        // For any capture pair where C1 takes a higher-value victim with a
        // lower-value attacker than C2, C1 must be scored strictly higher.
        let kinds = [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ];

        for v1 in kinds {
            for a1 in PieceKind::all() {
                for v2 in kinds {
                    for a2 in PieceKind::all() {
                        if v1.value() > v2.value() && a1.value() < a2.value() {
                            assert!(
                                MVV_LVA[v1.index()][a1.index()] > MVV_LVA[v2.index()][a2.index()],
                                "{a1:?}x{v1:?} must outrank {a2:?}x{v2:?}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_finds_mate_in_one() {
        // The rook mates along the back rank; the pawns box in their own king
        let res = run_search("k7/ppp5/ppp5/8/8/8/8/K6R w - - 0 1", 3);

        assert_eq!(res.bestmove.unwrap(), "h1h8");
        assert!(res.score > Score::MATE - 10, "got {:?}", res.score);
        assert_eq!(res.depth, 3);
    }

    #[test]
    fn test_stalemate_scores_zero() {
        let res = run_search("k7/8/KQ6/8/8/8/8/8 b - - 0 1", 3);
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_checkmated_root_scores_mate() {
        // Back-rank mate already delivered; Black has no moves
        let res = run_search("1R4k1/5ppp/8/8/8/8/8/4K3 b - - 0 1", 3);
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, -Score::MATE);
    }

    #[test]
    fn test_prefers_capture_promotion() {
        // The pawn should take the queen and promote to a queen itself
        let res = run_search("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1", 1);
        assert_eq!(res.bestmove.unwrap(), "e7d8q");
    }

    #[test]
    fn test_wins_hanging_queen() {
        // The knight on E3 takes the undefended queen on D5
        let res = run_search("4k3/8/8/3q4/8/4N3/8/4K3 w - - 0 1", 2);
        assert_eq!(res.bestmove.unwrap(), "e3d5");
    }

    #[test]
    fn test_avoids_capturing_defended_pawn() {
        // The pawn on C5 is defended by its neighbor on B6; at depth 2 the
        // recapture is visible, so the queen must not take it
        let res = run_search("4k3/8/1p6/2p5/8/2Q5/8/4K3 w - - 0 1", 2);
        assert_ne!(res.bestmove.unwrap(), "c3c5");
    }

    #[test]
    fn test_search_takes_repetition_when_losing() {
        // White is down a rook; both sides have shuffled through the same
        // positions twice already. Repeating a third time is a draw, which
        // beats every losing alternative, so the search must head back in.
        let mut position = Position::from_fen("4k2r/8/8/8/8/8/8/N3K3 w - - 0 1").unwrap();
        let cycle = ["a1b3", "h8h4", "b3a1", "h4h8"];
        for uci in cycle.iter().chain(cycle.iter()) {
            let mv = Move::from_uci(&position, uci).unwrap();
            position.make_move(mv);
        }

        let res = Search::new(SearchParams {
            depth: 3,
            eval: material_eval,
        })
        .start(&mut position);

        assert_eq!(res.bestmove.unwrap(), "a1b3");
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_cancelled_search_still_reports_depth_one() {
        let flag = Arc::new(AtomicBool::new(true));
        flag.store(false, Ordering::Relaxed);

        let mut position = Position::default();
        let res = Search::with_stop_flag(
            SearchParams {
                depth: 6,
                eval: material_eval,
            },
            Arc::clone(&flag),
        )
        .start(&mut position);

        assert!(res.bestmove.is_some());
        assert_eq!(res.depth, 1);
    }

    #[test]
    fn test_deeper_search_does_not_lose_material() {
        // From the start position, a depth-4 search should never produce a
        // move that immediately hangs material to the material evaluator
        let res = run_search(crate::FEN_STARTPOS, 4);
        assert!(res.bestmove.is_some());
        assert_eq!(res.score, Score::DRAW);
        assert_eq!(res.depth, 4);
    }
}
