//! Defines the DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! The solver works on a [`Cnf`] over dense variables `1..=num_vars` and
//! decides whether it is satisfiable, producing a total model when it is.
//!
//! The search is iterative rather than recursive:
//! 1.  **Unit propagation** over two watched literals per clause. Literals on
//!     the trail past the propagation head have their watch lists visited;
//!     a clause whose other watch cannot move is either unit (its remaining
//!     literal is forced) or falsified (a conflict).
//! 2.  **Pure-literal elimination** (when the [`SolverConfig`] enables it):
//!     an open variable occurring with one polarity only among the clauses not
//!     yet satisfied is set to satisfy those occurrences.
//! 3.  **Decision**: the configured [`VariableSelection`] picks an open
//!     variable and the [`PhaseSelector`] its first value.
//! 4.  **Chronological backtracking**: on a conflict the most recent decision
//!     whose second branch is untried is flipped; if none is left the formula
//!     is unsatisfiable.
//!
//! The interrupt flag is checked once per decision. Clauses can be added
//! between calls to [`Solver::solve`], which is how models are enumerated
//! with blocking clauses.

use crate::sat::assignment::{Assignment, Solutions};
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use crate::sat::phase_saving::PhaseSelector;
use crate::sat::solver::{DefaultConfig, Interrupt, SolutionStats, Solver, SolverConfig};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::{VariableSelection, DEFAULT_DECAY};
use crate::sat::watch::{WatchList, WatchedLiterals};
use bit_vec::BitVec;
use itertools::Itertools;

enum Visit {
    Keep,
    Moved,
    Conflict,
}

/// A DPLL solver, generic over the heuristics in `Config`.
#[derive(Debug, Clone)]
pub struct Dpll<Config: SolverConfig = DefaultConfig> {
    /// The clauses being solved. Literal order inside a clause changes as
    /// watches move.
    pub cnf: Cnf,
    pub assignment: Assignment,
    pub trail: Trail,
    watches: WatchedLiterals,
    /// Literals of unit clauses, asserted at the start of every search.
    units: Vec<Literal>,
    /// Set once an empty clause is added.
    inconsistent: bool,
    selector: Config::VariableSelector,
    phases: Config::PhaseSelector,
    interrupt: Option<Interrupt>,
    interrupted: bool,
    stats: SolutionStats,
}

impl<Config: SolverConfig> Solver<Config> for Dpll<Config> {
    fn new(cnf: Cnf) -> Self {
        let num_vars = cnf.num_vars;
        let mut solver = Self {
            assignment: Assignment::new(num_vars),
            trail: Trail::new(num_vars),
            watches: WatchedLiterals::new(num_vars),
            units: Vec::new(),
            inconsistent: false,
            selector: Config::VariableSelector::new(&cnf),
            phases: Config::PhaseSelector::new(num_vars),
            interrupt: None,
            interrupted: false,
            stats: SolutionStats::default(),
            cnf,
        };

        for idx in 0..solver.cnf.len() {
            solver.attach(idx);
        }

        solver
    }

    fn solve(&mut self) -> Option<Solutions> {
        self.interrupted = false;
        self.reset();

        if self.inconsistent {
            return None;
        }

        for i in 0..self.units.len() {
            let lit = self.units[i];
            if !self.enqueue(lit, Reason::Root) {
                log::trace!("conflicting unit clauses on variable {}", lit.variable());
                return None;
            }
        }

        loop {
            if let Some(conflict) = self.propagate() {
                self.stats.conflicts += 1;
                log::trace!(
                    "conflict in clause {conflict} at level {}",
                    self.decision_level()
                );
                self.selector.bumps(self.cnf[conflict].variables());
                self.selector.decay(DEFAULT_DECAY);

                if !self.backtrack() {
                    return None;
                }
                continue;
            }

            if Config::PURE_LITERALS && self.assign_pure_literals() {
                continue;
            }

            if self.interrupt.as_ref().is_some_and(Interrupt::is_triggered) {
                log::debug!("search interrupted after {} decisions", self.stats.decisions);
                self.interrupted = true;
                return None;
            }

            let Some(var) = self.selector.pick(&self.assignment) else {
                return Some(self.solutions());
            };

            let lit = Literal::new(var, self.phases.get_next(var));
            self.stats.decisions += 1;
            log::trace!("decide {lit} at level {}", self.decision_level() + 1);
            self.assign(lit, Reason::Decision);
        }
    }

    /// Returns the current (total, after a successful `solve`) assignment as
    /// signed DIMACS literals.
    fn solutions(&self) -> Solutions {
        self.assignment.get_solutions()
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }

    fn add_clause(&mut self, clause: Clause) {
        if clause.is_tautology() {
            return;
        }

        self.reset();

        let num_vars = self.cnf.num_vars;
        self.cnf.add_clause(clause);

        if self.cnf.num_vars > num_vars {
            self.rebuild();
        } else {
            self.attach(self.cnf.len() - 1);
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupted
    }
}

impl<Config: SolverConfig> Dpll<Config> {
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn set_interrupt(&mut self, interrupt: Option<Interrupt>) {
        self.interrupt = interrupt;
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.cnf.num_vars
    }

    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.trail.decision_level()
    }

    fn attach(&mut self, idx: usize) {
        let clause = &self.cnf[idx];
        match clause.len() {
            0 => self.inconsistent = true,
            1 => self.units.push(clause[0]),
            _ => {
                let (a, b) = (clause[0], clause[1]);
                self.watches.watch(a, idx);
                self.watches.watch(b, idx);
            }
        }
    }

    /// Re-derives every per-variable table after the variable count grew.
    fn rebuild(&mut self) {
        let num_vars = self.cnf.num_vars;
        self.assignment = Assignment::new(num_vars);
        self.trail = Trail::new(num_vars);
        self.watches = WatchedLiterals::new(num_vars);
        self.selector = Config::VariableSelector::new(&self.cnf);
        self.phases = Config::PhaseSelector::new(num_vars);
        self.units.clear();
        self.inconsistent = false;
        for idx in 0..self.cnf.len() {
            self.attach(idx);
        }
    }

    fn reset(&mut self) {
        self.undo(0);
    }

    /// Decisions and flipped decisions open a new level; everything else
    /// joins the current one.
    fn assign(&mut self, lit: Literal, reason: Reason) {
        let level = match reason {
            Reason::Decision | Reason::Flipped => self.decision_level() + 1,
            Reason::Root | Reason::Long(_) | Reason::Pure => self.decision_level(),
        };
        self.assignment.assign(lit);
        self.trail.push(lit, level, reason);
    }

    /// Assigns `lit` unless its variable already has a value. Returns `false`
    /// when that value falsifies `lit`.
    fn enqueue(&mut self, lit: Literal, reason: Reason) -> bool {
        match self.assignment.literal_value(lit) {
            Some(value) => value,
            None => {
                self.assign(lit, reason);
                true
            }
        }
    }

    fn undo(&mut self, trail_len: usize) {
        let assignment = &mut self.assignment;
        let phases = &mut self.phases;
        self.trail.truncate_with(trail_len, |lit| {
            assignment.unassign(lit.variable());
            phases.save(lit);
        });
    }

    /// Drains the pending part of the trail. Returns the index of a falsified
    /// clause if one is found.
    fn propagate(&mut self) -> Option<usize> {
        while let Some(lit) = self.trail.next_pending() {
            self.stats.propagations += 1;

            let false_lit = !lit;
            let watchers = self.watches.take(false_lit);
            let mut kept = WatchList::new();
            let mut conflict = None;

            let mut pending = watchers.into_iter();
            for clause_idx in pending.by_ref() {
                match self.visit(clause_idx, false_lit) {
                    Visit::Keep => kept.push(clause_idx),
                    Visit::Moved => {}
                    Visit::Conflict => {
                        kept.push(clause_idx);
                        conflict = Some(clause_idx);
                        break;
                    }
                }
            }
            kept.extend(pending);
            self.watches[false_lit] = kept;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }

    /// Handles a clause whose watched literal `false_lit` just became false.
    fn visit(&mut self, clause_idx: usize, false_lit: Literal) -> Visit {
        let clause = &mut self.cnf.clauses[clause_idx];

        if clause[0] == false_lit {
            clause.swap(0, 1);
        }
        let first = clause[0];

        if self.assignment.literal_value(first) == Some(true) {
            return Visit::Keep;
        }

        if let Some(k) =
            (2..clause.len()).find(|&k| self.assignment.literal_value(clause[k]) != Some(false))
        {
            clause.swap(1, k);
            let new_watch = clause[1];
            self.watches.watch(new_watch, clause_idx);
            return Visit::Moved;
        }

        if self.assignment.literal_value(first) == Some(false) {
            return Visit::Conflict;
        }

        self.assign(first, Reason::Long(clause_idx));
        Visit::Keep
    }

    /// Flips the most recent untried decision, undoing everything assigned
    /// after it. Returns `false` when every decision has had both branches
    /// explored.
    fn backtrack(&mut self) -> bool {
        let Some(position) = self.trail.last_decision() else {
            self.undo(0);
            return false;
        };
        let lit = !self.trail[position].lit;
        log::trace!(
            "backtrack to level {}, flipping {lit}",
            self.trail[position].decision_level
        );
        self.undo(position);
        self.assign(lit, Reason::Flipped);
        true
    }

    /// Assigns every open pure literal. Returns whether any was found.
    fn assign_pure_literals(&mut self) -> bool {
        let num_vars = self.cnf.num_vars;
        let mut occurs = BitVec::from_elem(2 * (num_vars + 1), false);

        for clause in &self.cnf.clauses {
            if clause
                .iter()
                .any(|&lit| self.assignment.literal_value(lit) == Some(true))
            {
                continue;
            }
            for &lit in clause.iter() {
                if self.assignment.literal_value(lit).is_none() {
                    occurs.set(lit.index(), true);
                }
            }
        }

        let open: Vec<Variable> = self
            .cnf
            .variables()
            .filter(|&v| !self.assignment.is_assigned(v))
            .collect_vec();

        let mut found = false;
        for var in open {
            let pos = Literal::new(var, true);
            let lit = match (occurs[pos.index()], occurs[pos.negated().index()]) {
                (true, false) => pos,
                (false, true) => pos.negated(),
                _ => continue,
            };
            self.assign(lit, Reason::Pure);
            self.stats.pure_literals += 1;
            found = true;
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::solver::{NoPureLiteralsConfig, VsidsConfig};

    fn solve<C: SolverConfig>(clauses: Vec<Vec<i32>>) -> Option<Solutions> {
        let mut solver: Dpll<C> = Dpll::new(Cnf::new(clauses));
        solver.solve()
    }

    /// Truth-table satisfiability for cross-checking.
    fn brute_force(cnf: &Cnf) -> usize {
        let n = cnf.num_vars;
        (0u32..(1 << n))
            .filter(|bits| {
                cnf.iter().all(|clause| {
                    clause.iter().any(|lit| {
                        let value = bits >> (lit.variable() - 1) & 1 == 1;
                        value == lit.polarity()
                    })
                })
            })
            .count()
    }

    fn random_cnf(rng: &mut fastrand::Rng, num_vars: i32, num_clauses: usize) -> Vec<Vec<i32>> {
        (0..num_clauses)
            .map(|_| {
                let width = rng.usize(1..=3);
                (0..width)
                    .map(|_| {
                        let var = rng.i32(1..=num_vars);
                        if rng.bool() { var } else { -var }
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_solve_sat() {
        let clauses = vec![vec![1, 2], vec![-1, 3], vec![-3, -2]];
        let cnf = Cnf::new(clauses.clone());
        let solutions = solve::<DefaultConfig>(clauses).expect("satisfiable");
        assert!(cnf.verify(&solutions));
        assert_eq!(solutions.len(), 3);
    }

    #[test]
    fn test_solve_unsat() {
        assert_eq!(solve::<DefaultConfig>(vec![vec![1], vec![-1]]), None);
        assert_eq!(
            solve::<DefaultConfig>(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]),
            None
        );
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        let mut cnf = Cnf::with_vars(2);
        cnf.add_clause(Clause::default());
        let mut solver: Dpll = Dpll::new(cnf);
        assert_eq!(solver.solve(), None);
        assert!(!solver.interrupted());
    }

    #[test]
    fn test_empty_cnf_assigns_every_variable() {
        let mut solver: Dpll = Dpll::new(Cnf::with_vars(3));
        let solutions = solver.solve().expect("satisfiable");
        assert_eq!(solutions, Solutions::new(vec![-1, -2, -3]));
    }

    #[test]
    fn test_pigeonhole_three_into_two() {
        // p_ij: pigeon i in hole j, variable 2 * (i - 1) + j
        let p = |i: i32, j: i32| 2 * (i - 1) + j;
        let mut clauses = vec![];
        for i in 1..=3 {
            clauses.push(vec![p(i, 1), p(i, 2)]);
        }
        for j in 1..=2 {
            for i in 1..=3 {
                for k in (i + 1)..=3 {
                    clauses.push(vec![-p(i, j), -p(k, j)]);
                }
            }
        }
        assert_eq!(solve::<DefaultConfig>(clauses.clone()), None);
        assert_eq!(solve::<VsidsConfig>(clauses.clone()), None);
        assert_eq!(solve::<NoPureLiteralsConfig>(clauses), None);
    }

    #[test]
    fn test_solve_is_reproducible() {
        let clauses = vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3], vec![-1, -3]];
        let first = solve::<DefaultConfig>(clauses.clone());
        for _ in 0..5 {
            assert_eq!(solve::<DefaultConfig>(clauses.clone()), first);
        }
    }

    #[test]
    fn test_blocking_clauses_enumerate_models() {
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1, 2]]));
        let mut count = 0;
        while let Some(solutions) = solver.solve() {
            count += 1;
            let blocking = Clause::new(solutions.iter().map(Literal::negated));
            solver.add_clause(blocking);
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_add_clause_with_new_variable() {
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1]]));
        solver.add_clause(Clause::from(vec![-1, 4]));
        assert_eq!(solver.num_vars(), 4);
        let solutions = solver.solve().expect("satisfiable");
        assert_eq!(solutions.value(1), Some(true));
        assert_eq!(solutions.value(4), Some(true));
    }

    #[test]
    fn test_interrupt_stops_search() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1, 2], vec![-1, 2]]));
        solver.set_interrupt(Some(interrupt));
        // variable 1 stays open after propagation and pure literals
        assert_eq!(solver.solve(), None);
        assert!(solver.interrupted());
    }

    #[test]
    fn test_pure_literals_are_counted() {
        let mut solver: Dpll = Dpll::new(Cnf::new(vec![vec![1, 2], vec![1, -2]]));
        let solutions = solver.solve().expect("satisfiable");
        assert_eq!(solutions.value(1), Some(true));
        assert!(solver.stats().pure_literals >= 1);
    }

    #[test]
    fn test_random_formulas_agree_with_truth_table() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..200 {
            let num_clauses = rng.usize(1..=14);
            let clauses = random_cnf(&mut rng, 6, num_clauses);
            let cnf = Cnf::new(clauses.clone());
            let expected = brute_force(&cnf) > 0;

            for result in [
                solve::<DefaultConfig>(clauses.clone()),
                solve::<VsidsConfig>(clauses.clone()),
                solve::<NoPureLiteralsConfig>(clauses.clone()),
            ] {
                assert_eq!(result.is_some(), expected, "clauses: {clauses:?}");
                if let Some(solutions) = result {
                    assert!(cnf.verify(&solutions));
                }
            }
        }
    }

    #[test]
    fn test_random_model_counts_agree_with_truth_table() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..100 {
            let num_clauses = rng.usize(1..=8);
            let clauses = random_cnf(&mut rng, 5, num_clauses);
            let cnf = Cnf::new(clauses);
            let mut solver: Dpll = Dpll::new(cnf.clone());
            let mut count = 0;
            while let Some(solutions) = solver.solve() {
                count += 1;
                solver.add_clause(Clause::new(solutions.iter().map(Literal::negated)));
            }
            assert_eq!(count, brute_force(&cnf));
        }
    }
}
