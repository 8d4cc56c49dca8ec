#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::assignment::Assignment;
use crate::sat::cnf::Cnf;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::fmt::Debug;

/// Branching heuristic. Every implementation must be deterministic so the
/// same CNF always yields the same model.
pub trait VariableSelection: Debug + Clone {
    fn new(cnf: &Cnf) -> Self;
    fn pick(&self, assignment: &Assignment) -> Option<Variable>;

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T);
    fn decay(&mut self, decay: f64);
}

/// Lowest-numbered open variable first, i.e. registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedOrder(usize);

impl VariableSelection for FixedOrder {
    fn new(cnf: &Cnf) -> Self {
        Self(cnf.num_vars)
    }

    fn pick(&self, assignment: &Assignment) -> Option<Variable> {
        (1..=self.0)
            .filter_map(|i| Variable::try_from(i).ok())
            .find(|&v| assignment[v].is_unassigned())
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self, _: f64) {}
}

pub const DEFAULT_DECAY: f64 = 0.95;

/// Activity-based selection seeded with occurrence counts and bumped by the
/// variables of each conflicting clause. Ties go to the lowest index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vsids(Vec<f64>);

impl Vsids {
    pub fn bump(&mut self, i: Variable) {
        if let Some(activity) = self.0.get_mut(i as usize) {
            *activity += 1.0;
        }
    }

    #[must_use]
    pub fn get(&self, i: Variable) -> f64 {
        self.0.get(i as usize).copied().unwrap_or_default()
    }
}

impl VariableSelection for Vsids {
    fn new(cnf: &Cnf) -> Self {
        let mut vsids = Self(vec![0.0; cnf.num_vars + 1]);
        vsids.bumps(cnf.iter().flat_map(|c| c.variables()));
        vsids
    }

    fn pick(&self, assignment: &Assignment) -> Option<Variable> {
        self.0
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, &a)| Variable::try_from(i).ok().map(|v| (v, a)))
            .filter(|&(v, _)| assignment[v].is_unassigned())
            .min_by_key(|&(v, a)| (Reverse(OrderedFloat(a)), v))
            .map(|(v, _)| v)
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for i in vars {
            self.bump(i);
        }
    }

    fn decay(&mut self, decay: f64) {
        for v in &mut self.0 {
            *v *= decay;
        }
    }
}
