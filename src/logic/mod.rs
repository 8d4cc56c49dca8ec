//! Propositional theories on top of the clausal engine in [`crate::sat`].
//!
//! The flow is: intern propositions and add constraints on an
//! [`encoding::Encoding`], compile it once into a [`theory::Theory`], then
//! query the theory (satisfiability, a model, model count, likelihood,
//! negation).

pub mod assignment;
pub mod count;
pub mod encoding;
pub mod formula;
pub mod registry;
pub mod theory;
pub mod tseitin;
