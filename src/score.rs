/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

/// A numerical representation of the evaluation of a position / move.
///
/// The engine does not interpret units, but host evaluation callbacks
/// conventionally return [centipawns](https://www.chessprogramming.org/Score).
/// Magnitudes at or above [`Score::LOWEST_MATE`] are reserved for mate scores.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub(crate) i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(1_000_000);

    /// Score of mate in the current position.
    ///
    /// Actual mate scores returned by the search are `MATE - ply`, which
    /// prefers shorter mates for the winner and longer mates for the loser.
    pub const MATE: Self = Self(100_000);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Lowest possible magnitude of a mate score.
    ///
    /// Evaluation callbacks must keep their scores strictly below this bound.
    pub const LOWEST_MATE: Self = Self(90_000);

    /// Constructs a new [`Score`] instance.
    #[inline(always)]
    pub const fn new(score: i32) -> Self {
        Self(score)
    }

    /// Returns the inner value of this [`Score`].
    #[inline(always)]
    pub const fn inner(self) -> i32 {
        self.0
    }

    /// Returns the absolute value of this [`Score`].
    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Returns `true` if the score is a mate score (for either side).
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.abs().0 >= Self::LOWEST_MATE.0
    }

    /// Returns the number of plies (half moves) this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::MATE.0 - self.0.abs()
    }

    /// Returns the larger of `self` and `other`.
    #[inline(always)]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl From<i32> for Score {
    #[inline(always)]
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl PartialEq<i32> for Score {
    #[inline(always)]
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    #[inline(always)]
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(f, "{} (mate in {} plies)", self.0, self.plies_to_mate())
        } else {
            write!(f, "{} cp", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        let mate_in_3 = Score::MATE - 3;
        assert!(mate_in_3.is_mate());
        assert_eq!(mate_in_3.plies_to_mate(), 3);

        let mated_in_3 = -(Score::MATE - 3);
        assert!(mated_in_3.is_mate());
        assert_eq!(mated_in_3.plies_to_mate(), 3);

        assert!(!Score::new(89_999).is_mate());
        assert!(!Score::DRAW.is_mate());
    }

    #[test]
    fn test_negation_symmetry() {
        let score = Score::new(245);
        assert_eq!(-(-score), score);
        assert_eq!((-score).inner(), -245);
    }
}
