#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Dense literal encoding used by the clausal engine.
//!
//! Variables are 1-based (0 is reserved), matching DIMACS. A literal packs its
//! variable and polarity into one `u32`: `2 * var` for the positive literal and
//! `2 * var + 1` for the negative one, so negation is a single bit flip and a
//! literal doubles as an index into per-literal tables such as watch lists.

use core::ops::Not;
use std::fmt::{Display, Formatter};

pub type Variable = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(u32);

impl Literal {
    #[must_use]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        if polarity {
            Self(var * 2)
        } else {
            Self(var * 2 + 1)
        }
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0 / 2
    }

    /// `true` for the positive literal of its variable.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 % 2 == 0
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Position of this literal in a table sized `2 * (num_vars + 1)`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self::new(value.unsigned_abs(), value.is_positive())
    }

    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i32(self) -> i32 {
        let var = self.variable() as i32;
        if self.polarity() { var } else { -var }
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_i32())
    }
}
