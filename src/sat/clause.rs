#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::Literal;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// A disjunction of literals.
///
/// Repeated literals are dropped on construction, so the first two positions
/// always hold distinct literals when the clause has two or more of them; the
/// watched-literal scheme relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    pub literals: SmallVec<[Literal; 8]>,
}

impl Clause {
    pub fn new<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        let mut stored: SmallVec<[Literal; 8]> = SmallVec::new();
        for lit in literals {
            if !stored.contains(&lit) {
                stored.push(lit);
            }
        }
        Self { literals: stored }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// A clause holding both polarities of some variable is always satisfied.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|lit| self.literals.contains(&lit.negated()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    pub fn variables(&self) -> impl Iterator<Item = u32> + '_ {
        self.literals.iter().map(|lit| lit.variable())
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

impl From<Vec<i32>> for Clause {
    fn from(literals: Vec<i32>) -> Self {
        Self::new(literals.into_iter().map(Literal::from_i32))
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        Self::new(literals.iter().copied().map(Literal::from_i32))
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self::new(literals)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for lit in &self.literals {
            write!(f, "{lit} ")?;
        }
        write!(f, "0")
    }
}
