#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Compiled theories.
//!
//! A [`Theory`] is the read-only result of [`crate::Encoding::compile`]: the
//! conjunction of all constraints, its vocabulary, and the clauses the
//! formula lowers to. Every query runs a fresh solver over a copy of those
//! clauses, so a theory can be queried any number of times.
//!
//! Operations that build a new theory (`negate`, `conjoin`) start again from
//! the formula, never from the clauses: the auxiliary variables of one
//! lowering mean nothing in another.

use crate::error::{Error, Result};
use crate::logic::assignment::Assignment;
use crate::logic::count::Models;
use crate::logic::formula::Formula;
use crate::logic::registry::{Var, Vocabulary};
use crate::logic::tseitin;
use crate::sat::cnf::Cnf;
use crate::sat::dpll::Dpll;
use crate::sat::solver::{
    DefaultConfig, Interrupt, SolutionStats, Solutions, Solver, SolverConfig,
};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theory {
    formula: Formula,
    vocabulary: Arc<Vocabulary>,
    cnf: Cnf,
    num_aux: usize,
}

impl Theory {
    /// Lowers `formula` over `vocabulary`, first adding any variable of the
    /// formula the vocabulary lacks. Variables are matched by number, see
    /// [`Var`].
    ///
    /// # Errors
    ///
    /// [`Error::VariableLimit`] if the variables cannot be numbered.
    pub fn compile(formula: Formula, mut vocabulary: Vocabulary) -> Result<Self> {
        vocabulary.extend(formula.variables())?;
        let lowered = tseitin::lower(&formula, &vocabulary)?;
        Ok(Self {
            formula,
            vocabulary: Arc::new(vocabulary),
            cnf: lowered.cnf,
            num_aux: lowered.num_aux,
        })
    }

    /// The conjunction of the constraints this theory was compiled from.
    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub(crate) fn shared_vocabulary(&self) -> Arc<Vocabulary> {
        Arc::clone(&self.vocabulary)
    }

    #[must_use]
    pub const fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    #[must_use]
    pub const fn num_aux(&self) -> usize {
        self.num_aux
    }

    #[must_use]
    pub fn satisfiable(&self) -> bool {
        self.solve().is_some()
    }

    /// One model, or `None` if the theory is unsatisfiable. The same theory
    /// always yields the same model.
    #[must_use]
    pub fn solve(&self) -> Option<Assignment> {
        self.solve_with::<DefaultConfig>()
    }

    #[must_use]
    pub fn solve_with<C: SolverConfig>(&self) -> Option<Assignment> {
        self.solve_with_stats::<C>().0
    }

    /// [`Theory::solve_with`] along with the search counters of the run.
    #[must_use]
    pub fn solve_with_stats<C: SolverConfig>(&self) -> (Option<Assignment>, SolutionStats) {
        let mut solver: Dpll<C> = Dpll::new(self.cnf.clone());
        let solutions = solver.solve();
        let stats = solver.stats();
        log::debug!("solved: {stats}");
        (solutions.map(|s| self.project(&s)), stats)
    }

    /// Like [`Theory::solve`], but gives up once `interrupt` is triggered.
    ///
    /// # Errors
    ///
    /// [`Error::Interrupted`] if the search was stopped before it finished.
    pub fn try_solve(&self, interrupt: &Interrupt) -> Result<Option<Assignment>> {
        let mut solver: Dpll = Dpll::new(self.cnf.clone()).with_interrupt(interrupt.clone());
        let solutions = solver.solve();
        if solver.interrupted() {
            return Err(Error::Interrupted);
        }
        Ok(solutions.map(|s| self.project(&s)))
    }

    /// The complement of this theory over the same vocabulary, compiled from
    /// the negation normal form of its formula.
    ///
    /// # Errors
    ///
    /// Only the numbering errors of [`Theory::compile`].
    pub fn negate(&self) -> Result<Self> {
        Self::compile(self.formula.negate(), (*self.vocabulary).clone())
    }

    /// This theory with `formula` added as a further constraint. Variables
    /// of `formula` outside the vocabulary join it.
    ///
    /// # Errors
    ///
    /// Only the numbering errors of [`Theory::compile`].
    pub fn conjoin(&self, formula: impl Into<Formula>) -> Result<Self> {
        let formula = self.formula.clone() & formula.into();
        Self::compile(formula, (*self.vocabulary).clone())
    }

    /// This theory over a vocabulary widened with `vars`. Returns a plain
    /// clone when nothing is missing.
    ///
    /// # Errors
    ///
    /// Only the numbering errors of [`Theory::compile`].
    pub fn widen<I: IntoIterator<Item = Var>>(&self, vars: I) -> Result<Self> {
        let mut vocabulary = (*self.vocabulary).clone();
        if vocabulary.extend(vars)? == 0 {
            return Ok(self.clone());
        }
        Self::compile(self.formula.clone(), vocabulary)
    }

    /// Whether every assignment of the vocabulary is a model.
    ///
    /// # Errors
    ///
    /// As for [`Theory::negate`].
    pub fn valid(&self) -> Result<bool> {
        Ok(!self.negate()?.satisfiable())
    }

    /// Iterates over all models.
    #[must_use]
    pub fn models(&self) -> Models<'_> {
        Models::new(self)
    }

    #[must_use]
    pub fn count_solutions(&self) -> u64 {
        crate::logic::count::count_solutions(self)
    }

    /// Counts models, giving up once `interrupt` is triggered.
    ///
    /// # Errors
    ///
    /// [`Error::Interrupted`] if counting was stopped before it finished.
    pub fn try_count(&self, interrupt: &Interrupt) -> Result<u64> {
        crate::logic::count::try_count(self, interrupt)
    }

    /// See [`crate::logic::count::likelihood`].
    ///
    /// # Errors
    ///
    /// [`Error::UndefinedLikelihood`] if the theory is unsatisfiable.
    pub fn likelihood(&self, formula: impl Into<Formula>) -> Result<f64> {
        crate::logic::count::likelihood(self, formula)
    }

    /// The clauses in DIMACS format, preceded by comment lines naming the
    /// vocabulary variables.
    #[must_use]
    pub fn to_dimacs(&self) -> String {
        let mut out = String::new();
        for (i, var) in self.vocabulary.vars().iter().enumerate() {
            let label = self.vocabulary.label(*var).unwrap_or_default();
            out.push_str(&format!("c {} {label}\n", i + 1));
        }
        out.push_str(&self.cnf.to_string());
        out
    }

    /// Restricts a solver model to the vocabulary.
    pub(crate) fn project(&self, solutions: &Solutions) -> Assignment {
        let values: BTreeMap<Var, bool> = self
            .vocabulary
            .vars()
            .iter()
            .filter_map(|&var| {
                let cnf_var = self.vocabulary.cnf_variable(var)?;
                Some((var, solutions.value(cnf_var)?))
            })
            .collect();
        Assignment::new(values, self.shared_vocabulary())
    }

    fn literal_label(&self, cnf_var: u32, polarity: bool) -> String {
        let name = self.vocabulary.var_of(cnf_var).map_or_else(
            || format!("_aux{cnf_var}"),
            |var| {
                self.vocabulary
                    .label(var)
                    .map_or_else(|| var.to_string(), str::to_string)
            },
        );
        if polarity { name } else { format!("~{name}") }
    }
}

/// One clause per line, literals joined with `|`, auxiliaries shown as
/// `_auxN`.
impl Display for Theory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "theory over {} variables ({} auxiliary), {} clauses",
            self.vocabulary.len(),
            self.num_aux,
            self.cnf.len()
        )?;
        for clause in self.cnf.iter() {
            let literals = clause
                .iter()
                .map(|lit| self.literal_label(lit.variable(), lit.polarity()))
                .collect::<Vec<_>>();
            if literals.is_empty() {
                writeln!(f, "false")?;
            } else {
                writeln!(f, "{}", literals.join(" | "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::registry::Registry;

    fn setup(n: usize) -> (Vec<Var>, Vocabulary) {
        let mut registry = Registry::new();
        let vars = (0..n)
            .map(|i| registry.intern(format!("p{i}")).unwrap())
            .collect();
        (vars, registry.vocabulary().unwrap())
    }

    #[test]
    fn test_solve_projects_auxiliaries_away() {
        let (v, vocabulary) = setup(3);
        let theory = Theory::compile((v[0] & v[1]) >> v[2], vocabulary).unwrap();
        assert_eq!(theory.num_aux(), 1);
        let model = theory.solve().unwrap();
        assert_eq!(model.len(), 3);
        assert!(theory.formula().eval(&model));
    }

    #[test]
    fn test_solve_is_reproducible() {
        let (v, vocabulary) = setup(4);
        let f = Formula::or([v[0] & v[1], v[2] & !v[3], !v[0] & v[3]]).unwrap();
        let theory = Theory::compile(f, vocabulary).unwrap();
        let first = theory.solve();
        for _ in 0..5 {
            assert_eq!(theory.solve(), first);
        }
    }

    #[test]
    fn test_unsatisfiable() {
        let (v, vocabulary) = setup(1);
        let theory = Theory::compile(v[0] & !v[0], vocabulary).unwrap();
        assert!(!theory.satisfiable());
        assert_eq!(theory.solve(), None);
        assert_eq!(theory.solve_with::<crate::sat::solver::VsidsConfig>(), None);
    }

    #[test]
    fn test_negate_uses_the_formula() {
        let (v, vocabulary) = setup(2);
        let theory = Theory::compile(v[0] | v[1], vocabulary).unwrap();
        let negation = theory.negate().unwrap();
        assert_eq!(negation.formula(), &(Formula::lit(v[0], false) & Formula::lit(v[1], false)));
        assert_eq!(negation.vocabulary(), theory.vocabulary());
    }

    #[test]
    fn test_valid() {
        let (v, vocabulary) = setup(1);
        let tautology = Theory::compile(v[0] | !v[0], vocabulary.clone()).unwrap();
        assert!(tautology.valid().unwrap());
        let contingent = Theory::compile(Formula::var(v[0]), vocabulary).unwrap();
        assert!(!contingent.valid().unwrap());
    }

    #[test]
    fn test_conjoin_widens_vocabulary() {
        let mut registry = Registry::new();
        let a = registry.intern("a".to_string()).unwrap();
        let theory = Theory::compile(Formula::var(a), registry.vocabulary().unwrap()).unwrap();
        let w = registry.intern("w".to_string()).unwrap();

        let both = theory.conjoin(w).unwrap();
        assert_eq!(both.vocabulary().len(), 2);
        let model = both.solve().unwrap();
        assert!(model.is_true(a) && model.is_true(w));
    }

    #[test]
    fn test_try_solve_reports_interrupt() {
        let (v, vocabulary) = setup(3);
        let theory = Theory::compile(v[0] | v[1] | v[2], vocabulary).unwrap();
        let interrupt = Interrupt::new();
        assert!(theory.try_solve(&interrupt).unwrap().is_some());
        interrupt.trigger();
        assert_eq!(theory.try_solve(&interrupt), Err(Error::Interrupted));
    }

    #[test]
    fn test_display_and_dimacs() {
        let (v, vocabulary) = setup(2);
        let theory = Theory::compile(v[0] & (!v[0] | v[1]), vocabulary).unwrap();
        assert_eq!(
            theory.to_string(),
            "theory over 2 variables (0 auxiliary), 2 clauses\np0\n~p0 | p1\n"
        );
        assert_eq!(theory.to_dimacs(), "c 1 p0\nc 2 p1\np cnf 2 2\n1 0\n-1 2 0\n");
    }
}
