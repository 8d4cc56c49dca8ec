#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The mutable side of a theory: propositions are interned and constraints
//! accumulated here until [`Encoding::compile`] turns them into a [`Theory`].
//!
//! An encoding compiles exactly once. Afterwards every attempt to add a
//! constraint, and every further `compile`, fails with
//! [`Error::AlreadyCompiled`]. Interning new propositions stays possible so
//! that a compiled theory can still be queried about them.

use crate::error::{Error, Result};
use crate::logic::assignment::Assignment;
use crate::logic::formula::Formula;
use crate::logic::registry::{Proposition, Registry, Var};
use crate::logic::theory::Theory;
use itertools::Itertools;
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct Encoding<K> {
    registry: Registry<K>,
    constraints: Vec<Formula>,
    compiled: bool,
}

impl<K: Proposition> Default for Encoding<K> {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            constraints: Vec::new(),
            compiled: false,
        }
    }
}

impl<K: Proposition> Encoding<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `key`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateDefinition`] as for [`Registry::intern`].
    pub fn var(&mut self, key: K) -> Result<Var> {
        self.registry.intern(key)
    }

    /// Interns `key` and returns it as a positive literal.
    ///
    /// # Errors
    ///
    /// As for [`Encoding::var`].
    pub fn lit(&mut self, key: K) -> Result<Formula> {
        self.var(key).map(Formula::var)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<Var> {
        self.registry.get(key)
    }

    #[must_use]
    pub fn key(&self, var: Var) -> Option<&K> {
        self.registry.key(var)
    }

    #[must_use]
    pub fn label(&self, var: Var) -> Option<&str> {
        self.registry.label(var)
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry<K> {
        &self.registry
    }

    #[must_use]
    pub fn constraints(&self) -> &[Formula] {
        &self.constraints
    }

    #[must_use]
    pub const fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Every registered variable whose key satisfies `pred`, in registration
    /// order.
    pub fn variables_matching<P: Fn(&K) -> bool>(&self, pred: P) -> Vec<Var> {
        self.registry
            .iter()
            .filter(|(_, key)| pred(key))
            .map(|(var, _)| var)
            .collect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.compiled {
            Err(Error::AlreadyCompiled)
        } else {
            Ok(())
        }
    }

    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`] once the encoding has been compiled.
    pub fn add_constraint(&mut self, constraint: impl Into<Formula>) -> Result<()> {
        self.ensure_open()?;
        self.constraints.push(constraint.into());
        Ok(())
    }

    /// At least one of `items` holds.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`], or [`Error::MalformedFormula`] when
    /// `items` is empty.
    pub fn add_at_least_one<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Formula>,
    {
        self.ensure_open()?;
        let clause = Formula::or(items)?;
        self.add_constraint(clause)
    }

    /// No two of `items` hold together: one `~(a & b)` per pair.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`].
    pub fn add_at_most_one<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Formula>,
    {
        self.add_at_most_k(1, items)
    }

    /// Exactly one of `items` holds.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`], or [`Error::MalformedFormula`] when
    /// `items` is empty.
    pub fn add_exactly_one<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Formula>,
    {
        self.ensure_open()?;
        let items = items.into_iter().map(Into::into).collect_vec();
        self.add_at_least_one(items.iter())?;
        self.add_at_most_one(items)
    }

    /// At most `k` of `items` hold: every subset of `k + 1` items has a false
    /// member. Produces `C(n, k + 1)` constraints, which is fine for the small
    /// groups this is meant for.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`].
    pub fn add_at_most_k<I>(&mut self, k: usize, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Formula>,
    {
        self.ensure_open()?;
        let items = items.into_iter().map(Into::into).collect_vec();
        for subset in items.into_iter().combinations(k + 1) {
            let both = Formula::and(subset)?;
            self.constraints.push(!both);
        }
        Ok(())
    }

    /// `premise` implies each of `conclusions`.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`].
    pub fn add_implies_all<I>(&mut self, premise: impl Into<Formula>, conclusions: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Formula>,
    {
        self.ensure_open()?;
        let premise = premise.into();
        for conclusion in conclusions {
            self.constraints
                .push(Formula::implies(premise.clone(), conclusion));
        }
        Ok(())
    }

    /// Conjoins the constraints into a [`Theory`] over every proposition
    /// registered so far, and closes the encoding. A failed compilation
    /// leaves the encoding open.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyCompiled`] on every call after the first successful
    /// one, [`Error::VariableLimit`] if the variables cannot be numbered.
    pub fn compile(&mut self) -> Result<Theory> {
        self.ensure_open()?;
        let theory = self.build()?;
        self.compiled = true;
        log::debug!(
            "compiled {} constraints over {} propositions into {} clauses",
            self.constraints.len(),
            self.registry.len(),
            theory.cnf().len()
        );
        Ok(theory)
    }

    fn build(&self) -> Result<Theory> {
        let formula = match self.constraints.len() {
            0 => Formula::TRUE,
            1 => self.constraints[0].clone(),
            _ => Formula::and(self.constraints.iter().cloned())?,
        };
        Theory::compile(formula, self.registry.vocabulary()?)
    }

    /// Renders a constraint with proposition labels.
    #[must_use]
    pub fn render(&self, formula: &Formula) -> String {
        let label = |var: Var| {
            self.registry
                .label(var)
                .map_or_else(|| var.to_string(), str::to_string)
        };
        formula.display_with(&label).to_string()
    }

    /// Human-readable listing of the constraints. With a `solution`, each
    /// constraint is marked with its truth value under it and the true
    /// propositions are listed at the end.
    #[must_use]
    pub fn pprint(&self, theory: &Theory, solution: Option<&Assignment>) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} constraints, {} propositions, {} clauses ({} auxiliary variables)",
            self.constraints.len(),
            theory.vocabulary().len(),
            theory.cnf().len(),
            theory.num_aux()
        );

        for constraint in &self.constraints {
            let text = self.render(constraint);
            match solution {
                Some(s) => {
                    let mark = if constraint.eval(s) { '+' } else { '-' };
                    let _ = writeln!(out, "  {mark} {text}");
                }
                None => {
                    let _ = writeln!(out, "  {text}");
                }
            }
        }

        if let Some(s) = solution {
            let _ = writeln!(out, "true propositions:");
            for line in s.to_string().lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::{Display, Formatter};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum P {
        A,
        B,
        C,
        D,
    }

    impl Display for P {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn abc(e: &mut Encoding<P>) -> Vec<Var> {
        [P::A, P::B, P::C].into_iter().map(|k| e.var(k).unwrap()).collect()
    }

    #[test]
    fn test_encoding_stays_open_until_compile_succeeds() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_constraint(v[0] | v[1]).unwrap();
        assert_eq!(e.build().unwrap().count_solutions(), 6);
        assert!(!e.is_compiled());

        e.add_constraint(!v[2]).unwrap();
        let theory = e.compile().unwrap();
        assert!(e.is_compiled());
        assert_eq!(theory.count_solutions(), 3);
    }

    #[test]
    fn test_compile_once() {
        let mut e = Encoding::new();
        let a = e.var(P::A).unwrap();
        e.add_constraint(a).unwrap();
        assert!(e.compile().is_ok());
        assert!(e.is_compiled());
        assert_eq!(e.compile().unwrap_err(), Error::AlreadyCompiled);
        assert_eq!(e.add_constraint(a).unwrap_err(), Error::AlreadyCompiled);
        assert_eq!(e.add_exactly_one([a]).unwrap_err(), Error::AlreadyCompiled);
        assert_eq!(e.add_at_most_one([a]).unwrap_err(), Error::AlreadyCompiled);
        assert_eq!(
            e.add_implies_all(a, Vec::<Var>::new()).unwrap_err(),
            Error::AlreadyCompiled
        );
    }

    #[test]
    fn test_exactly_one() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_exactly_one(v.clone()).unwrap();
        assert_eq!(e.constraints().len(), 4);
        let t = e.compile().unwrap();
        assert!(t.satisfiable());
        assert_eq!(t.count_solutions(), 3);
        for m in t.models() {
            assert_eq!(m.true_vars().count(), 1);
        }
    }

    #[test]
    fn test_at_most_and_at_least_one() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_at_most_one(v.clone()).unwrap();
        assert_eq!(e.constraints().len(), 3);
        let t = e.compile().unwrap();
        assert_eq!(t.count_solutions(), 4);

        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_at_least_one(v).unwrap();
        assert_eq!(e.compile().unwrap().count_solutions(), 7);
    }

    #[test]
    fn test_empty_groups() {
        let mut e: Encoding<P> = Encoding::new();
        assert!(matches!(
            e.add_exactly_one(Vec::<Var>::new()),
            Err(Error::MalformedFormula(_))
        ));
        e.add_at_most_one(Vec::<Var>::new()).unwrap();
        assert!(e.constraints().is_empty());
    }

    #[test]
    fn test_at_most_k() {
        let mut e = Encoding::new();
        let mut v = abc(&mut e);
        v.push(e.var(P::D).unwrap());
        e.add_at_most_k(2, v).unwrap();
        assert_eq!(e.constraints().len(), 4);
        // 1 + 4 + 6 subsets of size <= 2
        assert_eq!(e.compile().unwrap().count_solutions(), 11);
    }

    #[test]
    fn test_implies_all() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_implies_all(v[0], [v[1], v[2]]).unwrap();
        e.add_constraint(v[0]).unwrap();
        let t = e.compile().unwrap();
        assert_eq!(t.count_solutions(), 1);
        let m = t.solve().unwrap();
        assert!(v.iter().all(|&x| m.is_true(x)));
    }

    #[test]
    fn test_unconstrained_propositions_are_free() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_constraint(v[0]).unwrap();
        assert_eq!(e.compile().unwrap().count_solutions(), 4);
    }

    #[test]
    fn test_variables_matching() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        let picked = e.variables_matching(|k| *k != P::B);
        assert_eq!(picked, vec![v[0], v[2]]);
        assert_eq!(e.key(v[1]), Some(&P::B));
    }

    #[test]
    fn test_pprint() {
        let mut e = Encoding::new();
        let v = abc(&mut e);
        e.add_constraint((v[0] & v[1]) >> v[2]).unwrap();
        e.add_constraint(v[0]).unwrap();
        let t = e.compile().unwrap();
        let s = t.solve().unwrap();
        let text = e.pprint(&t, Some(&s));
        assert!(text.contains("  + (~(A & B) | C)\n"));
        assert!(text.contains("  + A\n"));
        assert!(text.ends_with("true propositions:\n  A\n  C\n"));
    }
}
