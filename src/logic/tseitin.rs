#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Tseitin lowering of a [`Formula`] to clauses.
//!
//! Vocabulary variables keep the CNF numbers the [`Vocabulary`] gives them
//! (`1..=n`). Each distinct `And`/`Or` node below the top level gets a fresh
//! auxiliary variable `n + 1, n + 2, ...`, allocated in post-order, together
//! with the clauses making it equivalent to the node. Structurally equal
//! nodes share their auxiliary, and the numbering only depends on the
//! formula, so lowering the same input twice yields the same clauses.
//!
//! The top level is handled without auxiliaries: a conjunction contributes
//! each conjunct separately, a disjunction becomes one clause, and a literal
//! becomes a unit clause.

use crate::error::{Error, Result};
use crate::logic::formula::Formula;
use crate::logic::registry::Vocabulary;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    pub cnf: Cnf,
    pub num_aux: usize,
}

struct Tseitin<'a> {
    vocabulary: &'a Vocabulary,
    cnf: Cnf,
    cache: FxHashMap<Formula, Literal>,
    next_var: Variable,
}

/// Lowers `root` to an equisatisfiable CNF whose models, projected onto the
/// vocabulary, are exactly the models of `root`.
///
/// # Errors
///
/// [`Error::MalformedFormula`] if `root` mentions a variable outside
/// `vocabulary`, [`Error::VariableLimit`] if auxiliaries run out of numbers.
pub fn lower(root: &Formula, vocabulary: &Vocabulary) -> Result<Lowered> {
    let first_aux = Variable::try_from(vocabulary.len() + 1).map_err(|_| Error::VariableLimit)?;
    let mut tseitin = Tseitin {
        vocabulary,
        cnf: Cnf::with_vars(vocabulary.len()),
        cache: FxHashMap::default(),
        next_var: first_aux,
    };

    match root.simplify() {
        Formula::Const(true) => {}
        Formula::Const(false) => tseitin.cnf.add_clause(Clause::default()),
        f => tseitin.assert(&f)?,
    }

    let num_aux = (tseitin.next_var - first_aux) as usize;
    log::debug!(
        "lowered formula of size {} to {} clauses ({} vocabulary, {num_aux} auxiliary variables)",
        root.size(),
        tseitin.cnf.len(),
        vocabulary.len()
    );

    Ok(Lowered {
        cnf: tseitin.cnf,
        num_aux,
    })
}

impl Tseitin<'_> {
    fn assert(&mut self, root: &Formula) -> Result<()> {
        let mut stack = vec![root];
        while let Some(f) = stack.pop() {
            match f {
                Formula::And(cs) => stack.extend(cs.iter().rev()),
                Formula::Or(cs) => {
                    let lits = cs.iter().map(|c| self.literal(c)).collect::<Result<Vec<_>>>()?;
                    self.cnf.add_clause(Clause::new(lits));
                }
                other => {
                    let lit = self.literal(other)?;
                    self.cnf.add_clause(Clause::new([lit]));
                }
            }
        }
        Ok(())
    }

    /// A literal equivalent to `root`, defining auxiliaries as needed.
    ///
    /// The walk is a post-order over an explicit stack. Each entry carries
    /// the parity of the `Not` nodes above it, so negations cost nothing.
    fn literal(&mut self, root: &Formula) -> Result<Literal> {
        let mut stack = vec![(root, false, false)];
        let mut lits: Vec<Literal> = Vec::new();

        while let Some((f, negated, expanded)) = stack.pop() {
            let lit = match f {
                Formula::Lit(v, polarity) => self
                    .vocabulary
                    .cnf_variable(*v)
                    .map(|var| Literal::new(var, *polarity))
                    .ok_or(Error::MalformedFormula("variable outside the theory vocabulary"))?,
                Formula::Not(g) => {
                    stack.push((&**g, !negated, false));
                    continue;
                }
                Formula::Const(b) => match self.cache.get(f) {
                    Some(&lit) => lit,
                    None => {
                        let x = self.fresh()?;
                        self.cnf.add_clause(Clause::new([Literal::new(x, *b)]));
                        self.define(f, Literal::new(x, true))
                    }
                },
                Formula::And(cs) | Formula::Or(cs) => {
                    if !expanded {
                        if let Some(&lit) = self.cache.get(f) {
                            lits.push(if negated { !lit } else { lit });
                        } else {
                            stack.push((f, negated, true));
                            stack.extend(cs.iter().rev().map(|c| (c, false, false)));
                        }
                        continue;
                    }
                    let children = lits.split_off(lits.len() - cs.len());
                    let x = Literal::new(self.fresh()?, true);
                    self.equate(x, &children, matches!(f, Formula::And(_)));
                    self.define(f, x)
                }
            };
            lits.push(if negated { !lit } else { lit });
        }

        Ok(lits
            .pop()
            .unwrap_or_else(|| unreachable!("a post-order traversal yields its root")))
    }

    /// Clauses making `x` equivalent to the conjunction (or disjunction) of
    /// `lits`.
    fn equate(&mut self, x: Literal, lits: &[Literal], conjunction: bool) {
        if conjunction {
            // x -> l_i, and (l_1 & ... & l_n) -> x
            for &l in lits {
                self.cnf.add_clause(Clause::new([!x, l]));
            }
            self.cnf
                .add_clause(Clause::new(std::iter::once(x).chain(lits.iter().map(|&l| !l))));
        } else {
            // x -> (l_1 | ... | l_n), and l_i -> x
            self.cnf
                .add_clause(Clause::new(std::iter::once(!x).chain(lits.iter().copied())));
            for &l in lits {
                self.cnf.add_clause(Clause::new([x, !l]));
            }
        }
    }

    fn fresh(&mut self) -> Result<Variable> {
        let var = self.next_var;
        self.next_var = var.checked_add(1).ok_or(Error::VariableLimit)?;
        Ok(var)
    }

    fn define(&mut self, f: &Formula, lit: Literal) -> Literal {
        self.cache.insert(f.clone(), lit);
        lit
    }
}
