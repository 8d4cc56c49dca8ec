//! Small propositional theories: declare propositions, state constraints,
//! compile once, then ask whether the theory is satisfiable, for a model, how
//! many models it has and how likely a literal is across them.
//!
//! ```
//! use prop_theory::{Encoding, Formula};
//!
//! let mut e = Encoding::new();
//! let a = e.var("a".to_string()).unwrap();
//! let b = e.var("b".to_string()).unwrap();
//! let c = e.var("c".to_string()).unwrap();
//! e.add_exactly_one([a, b, c]).unwrap();
//! e.add_constraint(a >> Formula::not(b)).unwrap();
//!
//! let theory = e.compile().unwrap();
//! assert!(theory.satisfiable());
//! assert_eq!(theory.count_solutions(), 3);
//! assert_eq!(theory.likelihood(a).unwrap(), 1.0 / 3.0);
//! ```

/// Coin ordering, a client theory over pairwise value comparisons.
pub mod coins;

/// The crate's error type.
pub mod error;

/// Propositions, formulas, encodings and compiled theories.
pub mod logic;

/// The clausal engine: CNF, and a DPLL solver with unit propagation and
/// pure-literal elimination.
pub mod sat;

/// Task scheduling, a client theory over dependencies between tasks.
pub mod tasks;

pub use error::{Error, Result};
pub use logic::assignment::Assignment;
pub use logic::count::{count_solutions, likelihood, Models};
pub use logic::encoding::Encoding;
pub use logic::formula::Formula;
pub use logic::registry::{Proposition, Registry, Var, Vocabulary};
pub use logic::theory::Theory;
pub use sat::solver::Interrupt;
