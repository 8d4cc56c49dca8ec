#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver abstractions shared by every search procedure: the [`Solver`] trait,
//! compile-time [`SolverConfig`] bundles and the runtime [`Interrupt`] handle.

pub use crate::sat::assignment::Solutions;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::phase_saving::{PhaseSelector, SavedPhases};
use crate::sat::variable_selection::{FixedOrder, VariableSelection, Vsids};
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Compile-time choice of the heuristics a solver runs with.
pub trait SolverConfig: Debug + Clone {
    type VariableSelector: VariableSelection;
    type PhaseSelector: PhaseSelector;

    /// Whether pure-literal elimination runs before each decision.
    const PURE_LITERALS: bool = true;
}

/// Registration-order branching with saved phases. Fully deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultConfig;

impl SolverConfig for DefaultConfig {
    type VariableSelector = FixedOrder;
    type PhaseSelector = SavedPhases;
}

/// Activity-driven branching. Still deterministic, but the model it returns
/// generally differs from the one [`DefaultConfig`] finds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VsidsConfig;

impl SolverConfig for VsidsConfig {
    type VariableSelector = Vsids;
    type PhaseSelector = SavedPhases;
}

/// Plain backtracking with unit propagation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPureLiteralsConfig;

impl SolverConfig for NoPureLiteralsConfig {
    type VariableSelector = FixedOrder;
    type PhaseSelector = SavedPhases;

    const PURE_LITERALS: bool = false;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolutionStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub pure_literals: usize,
}

impl Display for SolutionStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "decisions: {}, conflicts: {}, propagations: {}, pure literals: {}",
            self.decisions, self.conflicts, self.propagations, self.pure_literals
        )
    }
}

/// Cooperative cancellation flag. The search checks it once per decision,
/// so triggering it from another thread stops a long run promptly.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub trait Solver<Config: SolverConfig = DefaultConfig> {
    fn new(cnf: Cnf) -> Self;

    /// Searches for a model. `None` means the clauses are unsatisfiable, or
    /// that the search was interrupted; [`Solver::interrupted`] tells the two
    /// apart.
    fn solve(&mut self) -> Option<Solutions>;

    fn solutions(&self) -> Solutions;

    fn stats(&self) -> SolutionStats;

    /// Adds a clause between two calls to [`Solver::solve`].
    fn add_clause(&mut self, clause: Clause);

    fn interrupted(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        assert!(!interrupt.is_triggered());
        handle.trigger();
        assert!(interrupt.is_triggered());
        interrupt.reset();
        assert!(!handle.is_triggered());
    }
}
