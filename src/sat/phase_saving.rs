use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;
use std::fmt::Debug;

pub trait PhaseSelector: Debug + Clone {
    fn new(n: usize) -> Self;
    fn save(&mut self, lit: Literal);
    fn get_next(&self, var: Variable) -> bool;
}

/// Remembers the last value each variable held before it was unassigned and
/// branches on that value first. Starts out all `false`, so runs are
/// reproducible.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases(BitVec);

impl PhaseSelector for SavedPhases {
    fn new(n: usize) -> Self {
        Self(BitVec::from_elem(n + 1, false))
    }

    fn save(&mut self, lit: Literal) {
        let var = lit.variable() as usize;
        if var < self.0.len() {
            self.0.set(var, lit.polarity());
        }
    }

    fn get_next(&self, var: Variable) -> bool {
        self.0.get(var as usize).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_phase_roundtrip() {
        let mut phases = SavedPhases::new(3);
        assert!(!phases.get_next(2));
        phases.save(Literal::new(2, true));
        assert!(phases.get_next(2));
        phases.save(Literal::new(2, false));
        assert!(!phases.get_next(2));
        assert!(!phases.get_next(7));
    }
}
