#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Placing tasks in a sequence of slots so that dependencies run first.

/// The propositions and constraints of the task-scheduling theory.
pub mod schedule;
