#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Literal, Variable};
use core::ops::{Index, IndexMut};
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }
}

/// Partial assignment indexed by variable; slot 0 is unused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl IndexMut<Variable> for Assignment {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    pub fn assign(&mut self, lit: Literal) {
        self[lit.variable()] = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        self[var] = VarState::Unassigned;
    }

    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self[var].is_assigned()
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.0.get(var as usize) {
            Some(VarState::Assigned(b)) => Some(*b),
            _ => None,
        }
    }

    /// `Some(true)` when the literal is satisfied, `Some(false)` when it is
    /// falsified, `None` while its variable is open.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|value| value == lit.polarity())
    }

    /// Signed DIMACS literals for every assigned variable.
    #[must_use]
    pub fn get_solutions(&self) -> Solutions {
        Solutions::new(
            self.0
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(i, s)| match s {
                    VarState::Assigned(b) => {
                        let var = i32::try_from(i).ok()?;
                        Some(if *b { var } else { -var })
                    }
                    VarState::Unassigned => None,
                })
                .collect_vec(),
        )
    }
}

/// A model as signed DIMACS literals, ordered by variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Solutions {
    pub assignments: Vec<i32>,
}

impl Solutions {
    #[must_use]
    pub fn new(mut assignments: Vec<i32>) -> Self {
        assignments.sort_by_key(|l| l.unsigned_abs());
        Self { assignments }
    }

    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.assignments
            .binary_search_by_key(&var, |l| l.unsigned_abs())
            .ok()
            .map(|i| self.assignments[i].is_positive())
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.assignments.iter().copied().map(Literal::from_i32)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_query() {
        let mut a = Assignment::new(3);
        a.assign(Literal::new(2, false));
        assert_eq!(a.var_value(2), Some(false));
        assert_eq!(a.literal_value(Literal::new(2, false)), Some(true));
        assert_eq!(a.literal_value(Literal::new(2, true)), Some(false));
        assert_eq!(a.literal_value(Literal::new(1, true)), None);
    }

    #[test]
    fn test_get_solutions() {
        let mut a = Assignment::new(3);
        a.assign(Literal::new(3, true));
        a.assign(Literal::new(1, false));
        a.assign(Literal::new(2, true));
        assert_eq!(a.get_solutions(), Solutions::new(vec![-1, 2, 3]));
    }

    #[test]
    fn test_solutions_value() {
        let s = Solutions::new(vec![3, -1]);
        assert_eq!(s.assignments, vec![-1, 3]);
        assert_eq!(s.value(1), Some(false));
        assert_eq!(s.value(3), Some(true));
        assert_eq!(s.value(2), None);
    }
}
