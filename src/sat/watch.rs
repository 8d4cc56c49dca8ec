#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

pub type WatchList = SmallVec<[usize; 6]>;

/// Per-literal lists of clause indices watching that literal.
///
/// A clause with two or more literals watches its first two positions. The
/// list of a literal is visited when that literal becomes false.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals(Vec<WatchList>);

impl WatchedLiterals {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![WatchList::new(); 2 * (num_vars + 1)])
    }

    pub fn watch(&mut self, lit: Literal, clause_idx: usize) {
        self[lit].push(clause_idx);
    }

    /// Takes the list out so the caller can rebuild it while moving watches.
    pub fn take(&mut self, lit: Literal) -> WatchList {
        std::mem::take(&mut self[lit])
    }
}

impl Index<Literal> for WatchedLiterals {
    type Output = WatchList;

    fn index(&self, index: Literal) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<Literal> for WatchedLiterals {
    fn index_mut(&mut self, index: Literal) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_and_take() {
        let mut wl = WatchedLiterals::new(2);
        wl.watch(Literal::from(-2), 0);
        wl.watch(Literal::from(-2), 3);
        wl.watch(Literal::from(2), 1);

        assert_eq!(wl[Literal::from(-2)].as_slice(), &[0, 3]);
        let taken = wl.take(Literal::from(-2));
        assert_eq!(taken.len(), 2);
        assert!(wl[Literal::from(-2)].is_empty());
        assert_eq!(wl[Literal::from(2)].as_slice(), &[1]);
    }
}
