#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Ordering coins by value from pairwise comparisons.

/// The propositions and constraints of the coin-ordering theory.
pub mod ordering;
