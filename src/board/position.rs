/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};

use super::{
    attacks::is_attacked, Bitboard, Color, File, Move, Piece, PieceKind, Rank, Square, ZobristKey,
};
use crate::FEN_STARTPOS;

/// Number of plies worth of undo records to reserve up front, so that making
/// moves during a search never allocates.
const HISTORY_CAPACITY: usize = 256;

/// Represents the castling rights of both players as a 4-bit mask.
///
/// ```text
///     0000
///     ||||
///     |||+- White kingside  (K)
///     ||+-- White queenside (Q)
///     |+--- Black kingside  (k)
///     +---- Black queenside (q)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
#[repr(transparent)]
pub struct CastleRights(u8);

impl CastleRights {
    /// Number of possible combinations of castling rights.
    ///
    /// Used for Zobrist hashing.
    pub const COUNT: usize = 16;

    /// No castling rights for either player.
    pub const NONE: Self = Self(0b0000);

    /// All four castling rights.
    pub const ALL: Self = Self(0b1111);

    /// Creates a new [`CastleRights`] from the provided 4-bit mask.
    #[inline(always)]
    pub const fn new(bits: u8) -> Self {
        debug_assert!(bits <= 0b1111, "CastleRights must be a 4-bit mask");
        Self(bits)
    }

    /// Returns the inner 4-bit mask.
    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Creates a `usize` for indexing into lists of 16 elements.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if `color` may castle kingside.
    #[inline(always)]
    pub const fn has_short(&self, color: Color) -> bool {
        self.0 & (0b0001 << (2 * color.index())) != 0
    }

    /// Returns `true` if `color` may castle queenside.
    #[inline(always)]
    pub const fn has_long(&self, color: Color) -> bool {
        self.0 & (0b0010 << (2 * color.index())) != 0
    }

    /// Returns `true` if `color` retains any castling rights.
    #[inline(always)]
    pub const fn has_any(&self, color: Color) -> bool {
        self.0 & (0b0011 << (2 * color.index())) != 0
    }

    /// Returns a copy of `self` with only the bits in `kept` remaining.
    #[inline(always)]
    pub const fn masked(self, kept: u8) -> Self {
        Self(self.0 & kept)
    }

    /// Parses the castling field of a FEN string: a subset of `KQkq`, or `-`.
    pub fn from_uci(castling: &str) -> Result<Self> {
        if castling.is_empty() {
            bail!("Castling rights must be `-` or a subset of `KQkq`");
        }

        if castling == "-" {
            return Ok(Self::NONE);
        }

        let mut rights = 0;
        for c in castling.chars() {
            rights |= match c {
                'K' => 0b0001,
                'Q' => 0b0010,
                'k' => 0b0100,
                'q' => 0b1000,
                _ => bail!("Invalid char for CastleRights: Got {c:?}"),
            };
        }

        Ok(Self(rights))
    }
}

impl fmt::Display for CastleRights {
    /// Displays these rights in FEN notation: a subset of `KQkq`, or `-`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        for (bit, c) in [(0b0001, 'K'), (0b0010, 'Q'), (0b0100, 'k'), (0b1000, 'q')] {
            if self.0 & bit != 0 {
                write!(f, "{c}")?;
            }
        }

        Ok(())
    }
}

/// Castling rights that survive a move touching each square.
///
/// A move's rights update is `rights & KEPT[from] & KEPT[to]`, which handles
/// king moves, rook moves, rook captures, and castling itself uniformly.
const CASTLE_RIGHTS_KEPT: [u8; Square::COUNT] = {
    let mut kept = [0b1111u8; Square::COUNT];
    kept[Square::A1.index()] = 0b1101; // White queenside rook
    kept[Square::E1.index()] = 0b1100; // White king
    kept[Square::H1.index()] = 0b1110; // White kingside rook
    kept[Square::A8.index()] = 0b0111; // Black queenside rook
    kept[Square::E8.index()] = 0b0011; // Black king
    kept[Square::H8.index()] = 0b1011; // Black kingside rook
    kept
};

/// Everything needed to reverse one [`Position::make_move`] call.
///
/// Records are purely value snapshots; there is no cross-referencing between
/// entries, so the undo stack is a plain LIFO buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UndoRecord {
    /// Castling rights before the move.
    castle_rights: CastleRights,

    /// En passant target square before the move.
    ep_square: Option<Square>,

    /// Halfmove clock before the move.
    halfmove: u32,

    /// Zobrist key before the move, also consulted for repetition detection.
    key: ZobristKey,

    /// The kind of piece captured by the move, if any.
    captured: Option<PieceKind>,
}

/// Represents the current state of a game of chess.
///
/// Holds one [`Bitboard`] per (color, piece kind) pair in canonical order,
/// materialized occupancy boards, the game-state fields of a FEN string, an
/// incrementally-maintained Zobrist key, and the undo stack.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// Bitboards for each piece, indexed by `color * 6 + kind`.
    pieces: [Bitboard; Piece::COUNT],

    /// Occupancy bitboards: all White pieces, all Black pieces, and their union.
    ///
    /// Redundant with `pieces`, but kept in sync incrementally for speed.
    occupancy: [Bitboard; 3],

    /// The [`Color`] of the current player.
    side_to_move: Color,

    /// Castling rights for both players.
    castle_rights: CastleRights,

    /// Optional attack square for en passant.
    ep_square: Option<Square>,

    /// Half-moves since the last capture or pawn move. Enforces the fifty-move rule.
    halfmove: u32,

    /// Number of full moves since the beginning of the game. Incremented after Black's move.
    fullmove: u32,

    /// Zobrist hash key of this position.
    key: ZobristKey,

    /// LIFO stack of undo records, one per move made and not yet undone.
    history: Vec<UndoRecord>,
}

/// Index of the "all pieces" board within `occupancy`.
const ALL: usize = 2;

impl Position {
    /// Creates a new, empty [`Position`] with White to move and no castling rights.
    ///
    /// # Example
    /// ```
    /// # use newt::Position;
    /// let pos = Position::new();
    /// assert_eq!(pos.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    /// ```
    pub fn new() -> Self {
        let mut pos = Self {
            pieces: [Bitboard::EMPTY_BOARD; Piece::COUNT],
            occupancy: [Bitboard::EMPTY_BOARD; 3],
            side_to_move: Color::White,
            castle_rights: CastleRights::NONE,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            key: ZobristKey::default(),
            history: Vec::with_capacity(HISTORY_CAPACITY),
        };
        pos.key = ZobristKey::new(&pos);
        pos
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// All six fields are parsed when present; a missing halfmove clock or
    /// fullmove number defaults to `0` and `1`, respectively. Occupancy and
    /// the Zobrist key are rebuilt from scratch after parsing.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let mut split = fen.trim().split_ascii_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;

        if placements.matches('/').count() != 7 {
            bail!("FEN must have piece placements for all 8 ranks");
        }

        // Placement is listed rank 8 first, so reverse to keep White at the "bottom"
        for (rank, placements) in placements.split('/').rev().enumerate() {
            let mut file: u8 = 0;

            for piece_char in placements.chars() {
                if let Some(empty) = piece_char.to_digit(10) {
                    file += empty as u8;

                    if file > 8 {
                        bail!("FEN rank {placements:?} describes more than 8 squares");
                    }
                } else {
                    let piece = Piece::from_uci(piece_char)?;

                    if file >= 8 {
                        bail!("FEN rank {placements:?} describes more than 8 squares");
                    }

                    let square =
                        Square::new(File::new_unchecked(file), Rank::new_unchecked(rank as u8));
                    pos.pieces[piece.index()].set(square);
                    file += 1;
                }
            }

            // Each rank must account for all 8 of its squares, no more, no less
            if file != 8 {
                bail!("FEN rank {placements:?} describes {file} squares, not 8");
            }
        }

        pos.side_to_move = split.next().unwrap_or("w").parse()?;
        pos.castle_rights = CastleRights::from_uci(split.next().unwrap_or("-"))?;

        pos.ep_square = match split.next().unwrap_or("-") {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        pos.halfmove = split.next().unwrap_or("0").parse().unwrap_or(0);
        pos.fullmove = split.next().unwrap_or("1").parse().unwrap_or(1);

        // Occupancy and hash are rebuilt from scratch after a FEN load
        pos.rebuild_occupancy();
        pos.key = ZobristKey::new(&pos);

        Ok(pos)
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// # Example
    /// ```
    /// # use newt::Position;
    /// let pos = Position::default();
    /// assert_eq!(pos.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    /// ```
    pub fn to_fen(&self) -> String {
        format!("{self}")
    }

    /// Returns the current player as a [`Color`].
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// If en passant can be performed, returns the en passant [`Square`].
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Returns the [`CastleRights`] of the current position.
    #[inline(always)]
    pub const fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    /// Returns the half-move counter of the current position.
    #[inline(always)]
    pub const fn halfmove(&self) -> u32 {
        self.halfmove
    }

    /// Returns the full-move counter of the current position.
    #[inline(always)]
    pub const fn fullmove(&self) -> u32 {
        self.fullmove
    }

    /// Fetch the Zobrist hash key of this position.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Returns the number of moves made on this position that have not been undone.
    #[inline(always)]
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Fetches the [`Bitboard`] corresponding to the supplied [`Piece`].
    #[inline(always)]
    pub const fn piece(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    /// Analogous to [`Position::piece`] with a [`Piece`]'s individual components.
    #[inline(always)]
    pub const fn piece_parts(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index() * PieceKind::COUNT + kind.index()]
    }

    /// Fetches all 12 piece [`Bitboard`]s in canonical order.
    ///
    /// This is the layout handed to evaluation callbacks.
    #[inline(always)]
    pub const fn pieces(&self) -> &[Bitboard; Piece::COUNT] {
        &self.pieces
    }

    /// Fetches the three occupancy [`Bitboard`]s: White, Black, and all.
    #[inline(always)]
    pub const fn occupancy(&self) -> &[Bitboard; 3] {
        &self.occupancy
    }

    /// Fetches the [`Bitboard`] of all squares occupied by `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    /// Fetches a [`Bitboard`] of all occupied squares on the board.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.occupancy[ALL]
    }

    /// Fetches the [`Bitboard`] for the Pawns of the provided color.
    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Pawn)
    }

    /// Fetches the [`Bitboard`] for the King of the provided color.
    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::King)
    }

    /// Fetches the [`Square`] of `color`'s King.
    ///
    /// Every legal position has exactly one King per side, so this is total.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.king(color).lsb_unchecked()
    }

    /// Fetches the [`PieceKind`] of `color`'s piece at the provided [`Square`], if there is one.
    #[inline(always)]
    pub fn kind_at(&self, square: Square, color: Color) -> Option<PieceKind> {
        if !self.color(color).intersects(square) {
            return None;
        }

        PieceKind::all()
            .into_iter()
            .find(|&kind| self.piece_parts(color, kind).intersects(square))
    }

    /// Fetches the [`Piece`] at the provided [`Square`], if there is one.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let color = if self.color(Color::White).intersects(square) {
            Color::White
        } else if self.color(Color::Black).intersects(square) {
            Color::Black
        } else {
            return None;
        };

        self.kind_at(square, color)
            .map(|kind| Piece::new(color, kind))
    }

    /// Returns `true` if any piece of `attacker` color attacks the provided [`Square`].
    #[inline(always)]
    pub fn is_square_attacked(&self, square: Square, attacker: Color) -> bool {
        is_attacked(square, attacker, &self.pieces, self.occupied())
    }

    /// Returns `true` if `color`'s King is attacked by the opponent.
    #[inline(always)]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.is_in_check(self.side_to_move)
    }

    /// Returns `true` if the half-move counter is 100 or greater.
    ///
    /// Since "half-move" increases with ply, the fifty-move rule takes effect at 100 ply.
    #[inline(always)]
    pub const fn can_draw_by_fifty(&self) -> bool {
        self.halfmove >= 100
    }

    /// Returns `true` if this position is drawn by rule: either the fifty-move
    /// rule, or threefold repetition.
    ///
    /// Repetition detection scans the undo stack backwards for earlier
    /// occurrences of the current key. Positions with the same side to move
    /// recur every two plies, and no repetition can span a capture or pawn
    /// move, so the scan steps by 2 and is bounded by the halfmove clock.
    pub fn is_draw(&self) -> bool {
        if self.can_draw_by_fifty() {
            return true;
        }

        let window = self.halfmove as usize;
        let mut repetitions = 0;

        for record in self.history.iter().rev().take(window).skip(1).step_by(2) {
            if record.key == self.key {
                repetitions += 1;
                // The current occurrence is the third
                if repetitions >= 2 {
                    return true;
                }
            }
        }

        false
    }

    /// Applies the provided [`Move`] to this position.
    ///
    /// No enforcement of legality: the move is assumed to be at least
    /// pseudo-legal for the side to move. Pushes an [`UndoRecord`] so the
    /// move can be reversed with [`Position::undo_move`].
    pub fn make_move(&mut self, mv: Move) {
        let (from, to, _) = mv.parts();
        let us = self.side_to_move;
        let them = us.opponent();

        // Identify the moving piece, exiting early if the square is empty
        let Some(kind) = self.kind_at(from, us) else {
            return;
        };
        let piece = Piece::new(us, kind);

        // Snapshot everything needed to reverse this move
        let mut undo = UndoRecord {
            castle_rights: self.castle_rights,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
            captured: None,
        };

        // Un-hash the outgoing en passant square and castling rights
        self.key.hash_ep(self.ep_square);
        self.key.hash_castling(self.castle_rights);

        // Lift the mover off its origin square
        self.remove(piece, from);

        self.halfmove += 1;
        if kind == PieceKind::Pawn {
            self.halfmove = 0;
        }

        if mv.is_en_passant() {
            // The captured pawn isn't on `to`; it sits one rank behind it.
            // Safety: en passant destinations are on ranks 3/6, which always
            // have a square behind them.
            let victim_square = unsafe { to.backward_by(us, 1).unwrap_unchecked() };
            self.remove(Piece::new(them, PieceKind::Pawn), victim_square);
            undo.captured = Some(PieceKind::Pawn);
            self.halfmove = 0;
        } else if mv.is_capture() {
            if let Some(victim) = self.kind_at(to, them) {
                self.remove(Piece::new(them, victim), to);
                undo.captured = Some(victim);
                self.halfmove = 0;
            }
        }

        // The piece that lands may be a promotion rather than the pawn itself
        let landed = match mv.promotion() {
            Some(promotion) => piece.promoted(promotion),
            None => piece,
        };
        self.place(landed, to);

        // Castling also moves the rook: H->F on the kingside, A->D on the queenside
        if mv.is_short_castle() {
            let rook = Piece::new(us, PieceKind::Rook);
            self.remove(rook, Square::H1.rank_relative_to(us));
            self.place(rook, Square::F1.rank_relative_to(us));
        } else if mv.is_long_castle() {
            let rook = Piece::new(us, PieceKind::Rook);
            self.remove(rook, Square::A1.rank_relative_to(us));
            self.place(rook, Square::D1.rank_relative_to(us));
        }

        // Shed castling rights for any move touching a king or rook home square
        self.castle_rights = self
            .castle_rights
            .masked(CASTLE_RIGHTS_KEPT[from.index()] & CASTLE_RIGHTS_KEPT[to.index()]);

        // A double push exposes the square behind the pawn to en passant
        self.ep_square = if mv.is_pawn_double_push() {
            from.forward_by(us, 1)
        } else {
            None
        };

        // Hash in the new castling rights, en passant square, and side to move
        self.key.hash_castling(self.castle_rights);
        self.key.hash_ep(self.ep_square);
        self.key.hash_side_to_move();

        self.history.push(undo);
        self.side_to_move = them;
        if them.is_white() {
            self.fullmove += 1;
        }
    }

    /// Reverses the most recent [`Position::make_move`] call, which must have
    /// applied the provided [`Move`].
    pub fn undo_move(&mut self, mv: Move) {
        let Some(undo) = self.history.pop() else {
            return;
        };

        if self.side_to_move.is_white() {
            self.fullmove -= 1;
        }

        // The side that made the move being retracted
        let us = self.side_to_move.opponent();
        let them = self.side_to_move;
        self.side_to_move = us;

        let (from, to, _) = mv.parts();

        // Pull the mover back, reverting any promotion to the original pawn
        if let Some(promotion) = mv.promotion() {
            self.remove(Piece::new(us, promotion), to);
            self.place(Piece::new(us, PieceKind::Pawn), from);
        } else if let Some(kind) = self.kind_at(to, us) {
            let piece = Piece::new(us, kind);
            self.remove(piece, to);
            self.place(piece, from);
        }

        // Restore any captured piece
        if let Some(victim) = undo.captured {
            let victim_square = if mv.is_en_passant() {
                // Safety: see `make_move`
                unsafe { to.backward_by(us, 1).unwrap_unchecked() }
            } else {
                to
            };
            self.place(Piece::new(them, victim), victim_square);
        }

        // Walk the rook back from a castle
        if mv.is_short_castle() {
            let rook = Piece::new(us, PieceKind::Rook);
            self.remove(rook, Square::F1.rank_relative_to(us));
            self.place(rook, Square::H1.rank_relative_to(us));
        } else if mv.is_long_castle() {
            let rook = Piece::new(us, PieceKind::Rook);
            self.remove(rook, Square::D1.rank_relative_to(us));
            self.place(rook, Square::A1.rank_relative_to(us));
        }

        self.castle_rights = undo.castle_rights;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;

        // The record's key makes any hashing done above irrelevant; restoring
        // it directly is faster than recomputing and never drifts.
        self.key = undo.key;
    }

    /// Places a piece on the provided square, updating occupancy and hash.
    #[inline(always)]
    fn place(&mut self, piece: Piece, square: Square) {
        self.pieces[piece.index()].set(square);
        self.occupancy[piece.color().index()].set(square);
        self.occupancy[ALL].set(square);
        self.key.hash_piece(piece, square);
    }

    /// Removes a piece from the provided square, updating occupancy and hash.
    #[inline(always)]
    fn remove(&mut self, piece: Piece, square: Square) {
        self.pieces[piece.index()].clear(square);
        self.occupancy[piece.color().index()].clear(square);
        self.occupancy[ALL].clear(square);
        self.key.hash_piece(piece, square);
    }

    /// Rebuilds the three occupancy boards from the piece boards.
    ///
    /// Only appropriate outside the hot path, such as after a FEN load.
    fn rebuild_occupancy(&mut self) {
        self.occupancy = [Bitboard::EMPTY_BOARD; 3];

        for color in Color::all() {
            for kind in PieceKind::all() {
                self.occupancy[color.index()] |= self.piece_parts(color, kind);
            }
        }

        self.occupancy[ALL] = self.occupancy[Color::White.index()]
            | self.occupancy[Color::Black.index()];
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

impl Default for Position {
    fn default() -> Self {
        // The FEN for startpos is always valid
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl fmt::Display for Position {
    /// Display this position's FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty_spaces = 0;

            for file in File::iter() {
                if let Some(piece) = self.piece_at(Square::new(file, rank)) {
                    if empty_spaces != 0 {
                        write!(f, "{empty_spaces}")?;
                        empty_spaces = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty_spaces += 1;
                }
            }

            if empty_spaces != 0 {
                write!(f, "{empty_spaces}")?;
            }

            if rank != Rank::ONE {
                write!(f, "/")?;
            }
        }

        let ep = self
            .ep_square
            .map(|square| square.to_uci())
            .unwrap_or(String::from("-"));

        write!(
            f,
            " {} {} {ep} {} {}",
            self.side_to_move, self.castle_rights, self.halfmove, self.fullmove
        )
    }
}

impl fmt::Debug for Position {
    /// Display an ASCII grid of the board, along with game-state metadata.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let piece = self.piece_at(Square::new(file, rank));
                let piece_char = piece.map(|p| p.char()).unwrap_or('.');
                write!(f, " {piece_char}")?;
            }

            match rank {
                Rank::SEVEN => write!(f, "           FEN: {self}")?,
                Rank::SIX => write!(f, "          Side: {}", self.side_to_move)?,
                Rank::FIVE => write!(f, "      Castling: {}", self.castle_rights)?,
                Rank::FOUR => {
                    let ep = self
                        .ep_square
                        .map(|sq| sq.to_uci())
                        .unwrap_or(String::from("-"));
                    write!(f, "            EP: {ep}")?;
                }
                Rank::THREE => write!(f, "     Half-move: {}", self.halfmove)?,
                Rank::TWO => write!(f, "     Full-move: {}", self.fullmove)?,
                Rank::ONE => write!(f, "           Key: {:?}", self.key)?,
                _ => {}
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n  ")?;
        for file in File::iter() {
            write!(f, " {file}")?;
        }

        Ok(())
    }
}
