#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Model enumeration, counting and likelihood.
//!
//! Models are enumerated with blocking clauses: after each model the solver
//! receives a clause ruling out that exact valuation of the vocabulary, then
//! searches again. The blocking clause only mentions vocabulary variables, so
//! two solver models that differ on auxiliaries alone are counted once.
//!
//! Enumeration is exponential in the worst case. That is the accepted limit
//! for the theories this crate is meant for, which have tens of variables.

use crate::error::{Error, Result};
use crate::logic::assignment::Assignment;
use crate::logic::formula::Formula;
use crate::logic::theory::Theory;
use crate::sat::clause::Clause;
use crate::sat::dpll::Dpll;
use crate::sat::literal::Literal;
use crate::sat::solver::{DefaultConfig, Interrupt, Solver, SolverConfig};

/// Iterator over the models of a [`Theory`], see [`Theory::models`].
#[derive(Debug)]
pub struct Models<'a, C: SolverConfig = DefaultConfig> {
    theory: &'a Theory,
    solver: Dpll<C>,
    done: bool,
}

impl<'a, C: SolverConfig> Models<'a, C> {
    #[must_use]
    pub fn new(theory: &'a Theory) -> Self {
        Self {
            theory,
            solver: Dpll::new(theory.cnf().clone()),
            done: false,
        }
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.solver.set_interrupt(Some(interrupt));
        self
    }

    /// Whether enumeration ended because the interrupt fired rather than
    /// because the models ran out.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.solver.interrupted()
    }
}

impl<C: SolverConfig> Iterator for Models<'_, C> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(solutions) = self.solver.solve() else {
            self.done = true;
            return None;
        };

        let vocabulary = self.theory.vocabulary();
        let blocking = vocabulary.vars().iter().filter_map(|&var| {
            let cnf_var = vocabulary.cnf_variable(var)?;
            let value = solutions.value(cnf_var)?;
            Some(Literal::new(cnf_var, !value))
        });
        // Over an empty vocabulary this is the empty clause, which ends
        // enumeration after the single model.
        self.solver.add_clause(Clause::new(blocking));

        Some(self.theory.project(&solutions))
    }
}

/// Number of models of `theory` over its vocabulary.
#[must_use]
pub fn count_solutions(theory: &Theory) -> u64 {
    let mut count = 0u64;
    for _ in Models::<DefaultConfig>::new(theory) {
        count += 1;
        if count % 10_000 == 0 {
            log::debug!("{count} models so far");
        }
    }
    log::debug!("counted {count} models");
    count
}

/// As [`count_solutions`], stopping when `interrupt` fires.
///
/// # Errors
///
/// [`Error::Interrupted`] if counting was stopped before it finished.
pub fn try_count(theory: &Theory, interrupt: &Interrupt) -> Result<u64> {
    let mut models = Models::<DefaultConfig>::new(theory).with_interrupt(interrupt.clone());
    let count = models.by_ref().count() as u64;
    if models.interrupted() {
        return Err(Error::Interrupted);
    }
    Ok(count)
}

/// Fraction of the models of `theory` in which `formula` holds:
/// `count(theory & formula) / count(theory)`.
///
/// Variables of `formula` outside the vocabulary are added to it on both
/// sides of the ratio, so they do not skew the result.
///
/// # Errors
///
/// [`Error::UndefinedLikelihood`] when `theory` has no models, since the
/// ratio has a zero denominator.
#[allow(clippy::cast_precision_loss)]
pub fn likelihood(theory: &Theory, formula: impl Into<Formula>) -> Result<f64> {
    let formula = formula.into();
    let base = theory.widen(formula.variables())?;

    let total = count_solutions(&base);
    if total == 0 {
        return Err(Error::UndefinedLikelihood);
    }

    let hits = count_solutions(&base.conjoin(formula)?);
    Ok(hits as f64 / total as f64)
}
