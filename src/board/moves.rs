/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Result};

use super::{PieceKind, Position, Rank, Square};

/// Maximum possible number of moves in a given chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Represents the different kinds of moves that can be made during a chess game.
///
/// Internally, these are represented by bit flags, which allows a compact
/// representation of the [`Move`] struct. The flag values are fetched from the
/// [chess programming wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum MoveKind {
    /// Involves only a single piece moving from one location to another, and does not change the quantity or kind of any pieces on the board.
    Quiet = 0 << Move::FLG_BITS,

    /// A special case on a Pawn's first move, wherein it can advance two squares forward.
    PawnDoublePush = 1 << Move::FLG_BITS,

    /// Involves the King moving two squares toward the H file, with the Rook landing beside him.
    ShortCastle = 2 << Move::FLG_BITS,

    /// Involves the King moving two squares toward the A file, with the Rook landing beside him.
    LongCastle = 3 << Move::FLG_BITS,

    /// Involves a piece moving onto a square occupied by an opponent's piece, removing it from the board.
    Capture = 4 << Move::FLG_BITS,

    /// A special variant of capturing that occurs when a Pawn executes En Passant.
    EnPassantCapture = 5 << Move::FLG_BITS,

    /// Involves a Pawn reaching the opponent's side of the board and becoming a [`PieceKind::Knight`].
    PromoteKnight = 8 << Move::FLG_BITS,

    /// Involves a Pawn reaching the opponent's side of the board and becoming a [`PieceKind::Bishop`].
    PromoteBishop = 9 << Move::FLG_BITS,

    /// Involves a Pawn reaching the opponent's side of the board and becoming a [`PieceKind::Rook`].
    PromoteRook = 10 << Move::FLG_BITS,

    /// Involves a Pawn reaching the opponent's side of the board and becoming a [`PieceKind::Queen`].
    PromoteQueen = 11 << Move::FLG_BITS,

    /// A capture that also promotes the capturing Pawn to a [`PieceKind::Knight`].
    CaptureAndPromoteKnight = 12 << Move::FLG_BITS,

    /// A capture that also promotes the capturing Pawn to a [`PieceKind::Bishop`].
    CaptureAndPromoteBishop = 13 << Move::FLG_BITS,

    /// A capture that also promotes the capturing Pawn to a [`PieceKind::Rook`].
    CaptureAndPromoteRook = 14 << Move::FLG_BITS,

    /// A capture that also promotes the capturing Pawn to a [`PieceKind::Queen`].
    CaptureAndPromoteQueen = 15 << Move::FLG_BITS,
}

impl MoveKind {
    /// Creates a new [`MoveKind`] that is a promotion to the provided [`PieceKind`].
    ///
    /// # Panics
    /// This function will panic if `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::PromoteKnight,
            PieceKind::Bishop => Self::PromoteBishop,
            PieceKind::Rook => Self::PromoteRook,
            PieceKind::Queen => Self::PromoteQueen,
            _ => unreachable!(),
        }
    }

    /// Creates a new [`MoveKind`] that is a capture and promotion to the provided [`PieceKind`].
    ///
    /// # Panics
    /// This function will panic if `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion_capture(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Knight => Self::CaptureAndPromoteKnight,
            PieceKind::Bishop => Self::CaptureAndPromoteBishop,
            PieceKind::Rook => Self::CaptureAndPromoteRook,
            PieceKind::Queen => Self::CaptureAndPromoteQueen,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for MoveKind {
    /// Displays a human-readable description for this [`MoveKind`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quiet => "Quiet",
            Self::PawnDoublePush => "Pawn Double Push",
            Self::ShortCastle => "Short Castle",
            Self::LongCastle => "Long Castle",
            Self::Capture => "Capture",
            Self::EnPassantCapture => "En Passant Capture",
            Self::PromoteKnight => "Promotion (Knight)",
            Self::PromoteBishop => "Promotion (Bishop)",
            Self::PromoteRook => "Promotion (Rook)",
            Self::PromoteQueen => "Promotion (Queen)",
            Self::CaptureAndPromoteKnight => "Capture and Promotion (Knight)",
            Self::CaptureAndPromoteBishop => "Capture and Promotion (Bishop)",
            Self::CaptureAndPromoteRook => "Capture and Promotion (Rook)",
            Self::CaptureAndPromoteQueen => "Capture and Promotion (Queen)",
        };

        write!(f, "{s}")
    }
}

/// Represents a move made on a chess board, including whether a piece is to be promoted.
///
/// Internally encoded using the following bit pattern:
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square of the move.
///      |     +- Target square of the move.
///      +- Special flags for promotion, castling, etc.
/// ```
///
/// Castling moves store the King's destination square (G1/C1 for White,
/// G8/C8 for Black).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    /// Mask for the source ("from") bits.
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    /// Mask for the destination ("to") bits.
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    /// Mask for the flag (promotions, captures, etc.) bits.
    const FLG_MASK: u16 = 0b1111_0000_0000_0000;
    /// Start index of destination bits.
    const DST_BITS: u16 = 6;
    /// Start index of flag bits.
    const FLG_BITS: u16 = 12;

    const FLAG_PAWN_DOUBLE: u16 = 1 << Self::FLG_BITS;
    const FLAG_CASTLE_SHORT: u16 = 2 << Self::FLG_BITS;
    const FLAG_CASTLE_LONG: u16 = 3 << Self::FLG_BITS;
    const FLAG_CAPTURE: u16 = 4 << Self::FLG_BITS;
    const FLAG_EP_CAPTURE: u16 = 5 << Self::FLG_BITS;
    const FLAG_PROMO_KNIGHT: u16 = 8 << Self::FLG_BITS;
    const FLAG_PROMO_BISHOP: u16 = 9 << Self::FLG_BITS;
    const FLAG_PROMO_ROOK: u16 = 10 << Self::FLG_BITS;
    const FLAG_PROMO_QUEEN: u16 = 11 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_KNIGHT: u16 = 12 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_BISHOP: u16 = 13 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_ROOK: u16 = 14 << Self::FLG_BITS;
    const FLAG_CAPTURE_PROMO_QUEEN: u16 = 15 << Self::FLG_BITS;

    /// Creates a new [`Move`] from the given [`Square`]s and a [`MoveKind`].
    ///
    /// # Example
    /// ```
    /// # use newt::{Move, Square, MoveKind};
    /// let e2e4 = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
    /// assert_eq!(e2e4.to_string(), "e2e4");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self(kind as u16 | (to.inner() as u16) << Self::DST_BITS | from.inner() as u16)
    }

    /// Creates an "illegal" [`Move`], representing moving a piece to and from the same [`Square`].
    ///
    /// Used as a sentinel for empty killer-move slots and uninitialized best moves.
    #[inline(always)]
    pub const fn illegal() -> Self {
        Self(0)
    }

    /// Fetches the source (or "from") part of this [`Move`], as a [`Square`].
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_bits_unchecked((self.0 & Self::SRC_MASK) as u8)
    }

    /// Fetches the destination (or "to") part of this [`Move`], as a [`Square`].
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_bits_unchecked(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as u8)
    }

    /// Fetches the [`MoveKind`] part of this [`Move`].
    #[inline(always)]
    pub fn kind(&self) -> MoveKind {
        // Safety: Since a `Move` can ONLY be constructed through the public API,
        // any instance of a `Move` is guaranteed to have a valid bit pattern for its `MoveKind`.
        unsafe { std::mem::transmute(self.0 & Self::FLG_MASK) }
    }

    /// Fetches the `from`, `to`, and `kind` fields of this [`Move`].
    #[inline(always)]
    pub fn parts(&self) -> (Square, Square, MoveKind) {
        (self.from(), self.to(), self.kind())
    }

    /// Returns `true` if this [`Move`] is a capture of any kind
    /// (capture, promotion-capture, en passant capture).
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE != 0
    }

    /// Returns `true` if this [`Move`] is a non-capture (quiet) move.
    ///
    /// Note that castling, double pushes, and quiet promotions count as quiet moves.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE == 0
    }

    /// Returns `true` if this [`Move`] is a promotion of any kind.
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        // The "promotion" flag bit is the most-significant bit,
        // so FLAG_PROMO_KNIGHT doubles as a mask for all promotions.
        self.0 & Self::FLAG_PROMO_KNIGHT != 0
    }

    /// Returns `true` if this [`Move`] is en passant.
    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_EP_CAPTURE == 0
    }

    /// Returns `true` if this [`Move`] is a short (kingside) castle.
    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_CASTLE_SHORT == 0
    }

    /// Returns `true` if this [`Move`] is a long (queenside) castle.
    #[inline(always)]
    pub const fn is_long_castle(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_CASTLE_LONG == 0
    }

    /// Returns `true` if this [`Move`] is a pawn's two-square advance.
    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        (self.0 & Self::FLG_MASK) ^ Self::FLAG_PAWN_DOUBLE == 0
    }

    /// If this [`Move`] is a promotion, yields the promoted [`PieceKind`].
    #[inline(always)]
    pub fn promotion(&self) -> Option<PieceKind> {
        match self.0 & Self::FLG_MASK {
            Self::FLAG_PROMO_QUEEN | Self::FLAG_CAPTURE_PROMO_QUEEN => Some(PieceKind::Queen),
            Self::FLAG_PROMO_KNIGHT | Self::FLAG_CAPTURE_PROMO_KNIGHT => Some(PieceKind::Knight),
            Self::FLAG_PROMO_ROOK | Self::FLAG_CAPTURE_PROMO_ROOK => Some(PieceKind::Rook),
            Self::FLAG_PROMO_BISHOP | Self::FLAG_CAPTURE_PROMO_BISHOP => Some(PieceKind::Bishop),
            _ => None,
        }
    }

    /// Creates a [`Move`] from a string, according to the [Universal Chess Interface](https://en.wikipedia.org//wiki/Universal_Chess_Interface)
    /// notation, extracting extra info from the provided [`Position`].
    ///
    /// Will return a [`anyhow::Error`] if the string is invalid in any way.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let pos = Position::default();
    /// let e2e4 = Move::from_uci(&pos, "e2e4").unwrap();
    /// assert_eq!(e2e4, Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush));
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        // Extract the to/from squares
        let from = uci.get(0..2).ok_or(anyhow!(
            "Move str must contain a `from` square. Got {uci:?}"
        ))?;
        let to = uci
            .get(2..4)
            .ok_or(anyhow!("Move str must contain a `to` square. Got {uci:?}"))?;

        let from = Square::from_uci(from)?;
        let to = Square::from_uci(to)?;

        // Extract information about the piece being moved
        let piece = position
            .piece_at(from)
            .ok_or(anyhow!("No piece found at {from} when parsing {uci:?}"))?;

        // If there is a promotion char, attempt to convert it to a PieceKind
        let promotion = uci.get(4..5).map(PieceKind::from_str).transpose()?;

        let color = piece.color();
        let victim = position.piece_at(to);

        let kind = if piece.is_king() && from.distance_files(to) == 2 {
            if to.file() > from.file() {
                MoveKind::ShortCastle
            } else {
                MoveKind::LongCastle
            }
        } else if piece.is_pawn() {
            if let Some(promotion) = promotion {
                if victim.is_some() {
                    MoveKind::promotion_capture(promotion)
                } else {
                    MoveKind::promotion(promotion)
                }
            } else if position.ep_square() == Some(to) && from.file() != to.file() {
                MoveKind::EnPassantCapture
            } else if from.distance_ranks(to) == 2 {
                MoveKind::PawnDoublePush
            } else if victim.is_some() {
                MoveKind::Capture
            } else {
                MoveKind::Quiet
            }
        } else if victim.is_some() {
            MoveKind::Capture
        } else {
            MoveKind::Quiet
        };

        // A promotion char on a non-promoting move is nonsense
        if promotion.is_some() && to.rank() != Rank::eighth(color) {
            bail!("Move {uci:?} has a promotion char, but does not reach the final rank");
        }

        Ok(Self::new(from, to, kind))
    }

    /// Converts this [`Move`] to a string, according to the [Universal Chess Interface](https://en.wikipedia.org//wiki/Universal_Chess_Interface) notation.
    ///
    /// Castling is displayed in the standard `e1g1` / `e1c1` notation.
    #[inline(always)]
    pub fn to_uci(&self) -> String {
        if let Some(promote) = self.promotion() {
            format!("{}{}{}", self.from(), self.to(), promote)
        } else {
            format!("{}{}", self.from(), self.to())
        }
    }
}

impl fmt::Display for Move {
    /// A [`Move`] is displayed in its UCI format.
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Move {
    /// Debug formatting also displays the [`MoveKind`] in a human-readable format.
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({})", self.kind())
    }
}

impl Default for Move {
    /// A "default" move is an illegal move. See [`Move::illegal`].
    #[inline(always)]
    fn default() -> Self {
        Self::illegal()
    }
}

impl<T: AsRef<str>> PartialEq<T> for Move {
    #[inline(always)]
    fn eq(&self, other: &T) -> bool {
        self.to_uci().eq(other.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    #[test]
    fn test_move_packing() {
        let mv = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::E4);
        assert_eq!(mv.kind(), MoveKind::PawnDoublePush);
    }

    #[test]
    fn test_move_is_capture() {
        let (from, to) = (Square::A1, Square::H8);
        assert!(!Move::new(from, to, MoveKind::Quiet).is_capture());
        assert!(!Move::new(from, to, MoveKind::ShortCastle).is_capture());
        assert!(!Move::new(from, to, MoveKind::PawnDoublePush).is_capture());
        assert!(Move::new(from, to, MoveKind::Capture).is_capture());
        assert!(Move::new(from, to, MoveKind::EnPassantCapture).is_capture());
        assert!(!Move::new(from, to, MoveKind::promotion(PieceKind::Queen)).is_capture());
        assert!(Move::new(from, to, MoveKind::promotion_capture(PieceKind::Queen)).is_capture());
    }

    #[test]
    fn test_move_is_promotion() {
        let (from, to) = (Square::A7, Square::A8);
        for kind in PieceKind::promotions() {
            assert!(Move::new(from, to, MoveKind::promotion(kind)).is_promotion());
            assert!(Move::new(from, to, MoveKind::promotion_capture(kind)).is_promotion());
            assert_eq!(
                Move::new(from, to, MoveKind::promotion(kind)).promotion(),
                Some(kind)
            );
        }
        assert!(!Move::new(from, to, MoveKind::Quiet).is_promotion());
        assert!(!Move::new(from, to, MoveKind::Capture).is_promotion());
    }

    #[test]
    fn test_move_parsing() {
        let pos = Position::default();

        let mv = Move::from_uci(&pos, "b1c3").unwrap();
        assert_eq!(mv, Move::new(Square::B1, Square::C3, MoveKind::Quiet));

        let mv = Move::from_uci(&pos, "d2d4").unwrap();
        assert_eq!(mv, Move::new(Square::D2, Square::D4, MoveKind::PawnDoublePush));

        // No piece on E4
        assert!(Move::from_uci(&pos, "e4e5").is_err());

        let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mv = Move::from_uci(&pos, "e1g1").unwrap();
        assert_eq!(mv.kind(), MoveKind::ShortCastle);
        let mv = Move::from_uci(&pos, "e1c1").unwrap();
        assert_eq!(mv.kind(), MoveKind::LongCastle);
        let mv = Move::from_uci(&pos, "e2a6").unwrap();
        assert_eq!(mv.kind(), MoveKind::Capture);

        // Promotions, with and without capture
        let pos = Position::from_fen("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1").unwrap();
        let mv = Move::from_uci(&pos, "g2g1q").unwrap();
        assert_eq!(mv.kind(), MoveKind::PromoteQueen);
        let mv = Move::from_uci(&pos, "g2h1n").unwrap();
        assert_eq!(mv.kind(), MoveKind::CaptureAndPromoteKnight);
    }
}
