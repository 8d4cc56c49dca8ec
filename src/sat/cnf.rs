#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::assignment::Solutions;
use crate::sat::clause::Clause;
use crate::sat::literal::Variable;
use core::ops::Index;
use std::fmt::{Display, Formatter};

pub type DecisionLevel = usize;

/// A conjunction of clauses over the variables `1..=num_vars`.
///
/// `num_vars` may exceed the highest variable mentioned by a clause: a
/// variable that no clause constrains is still part of the problem and gets a
/// value in every model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Cnf {
    pub clauses: Vec<Clause>,
    pub num_vars: usize,
}

impl Cnf {
    #[must_use]
    pub fn new(clauses: Vec<Vec<i32>>) -> Self {
        let mut cnf = Self::default();
        for clause in clauses {
            cnf.add_clause(Clause::from(clause));
        }
        cnf
    }

    #[must_use]
    pub const fn with_vars(num_vars: usize) -> Self {
        Self {
            clauses: Vec::new(),
            num_vars,
        }
    }

    /// Appends a clause, widening `num_vars` if needed. Tautologies are
    /// dropped since they constrain nothing.
    pub fn add_clause(&mut self, clause: Clause) {
        if clause.is_tautology() {
            return;
        }
        if let Some(max) = clause.variables().max() {
            self.num_vars = self.num_vars.max(max as usize);
        }
        self.clauses.push(clause);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    #[must_use]
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }

    /// Checks that every clause holds at least one literal made true by
    /// `solutions`.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|&lit| solutions.value(lit.variable()) == Some(lit.polarity()))
        })
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        (1..=self.num_vars).filter_map(|v| Variable::try_from(v).ok())
    }
}

impl Index<usize> for Cnf {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl From<Vec<Clause>> for Cnf {
    fn from(clauses: Vec<Clause>) -> Self {
        let mut cnf = Self::default();
        for clause in clauses {
            cnf.add_clause(clause);
        }
        cnf
    }
}

/// DIMACS rendering.
impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
