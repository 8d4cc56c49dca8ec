#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::cnf::DecisionLevel;
use crate::sat::literal::Literal;
use std::ops::Index;

/// Why a literal sits on the trail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    #[default]
    Decision,
    /// Second branch of a decision whose first branch failed.
    Flipped,
    /// Unit clause of the input, asserted before any decision.
    Root,
    /// Forced by the clause at this index.
    Long(usize),
    /// Pure literal: its negation occurs in no open clause.
    Pure,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    pub lit: Literal,
    pub decision_level: DecisionLevel,
    pub reason: Reason,
}

/// Assignment order plus the propagation head.
///
/// Literals in `t[curr_idx..]` are assigned but their watch lists have not
/// been visited yet; unit propagation drains that suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    t: Vec<Step>,
    pub curr_idx: usize,
}

impl Index<usize> for Trail {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl Trail {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            curr_idx: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn push(&mut self, lit: Literal, decision_level: DecisionLevel, reason: Reason) {
        self.t.push(Step {
            lit,
            decision_level,
            reason,
        });
    }

    /// Next literal whose consequences are still to be propagated.
    pub fn next_pending(&mut self) -> Option<Literal> {
        let step = self.t.get(self.curr_idx)?;
        self.curr_idx += 1;
        Some(step.lit)
    }

    /// Drops every step at or after `len`, handing each removed literal to
    /// `undo` newest first.
    pub fn truncate_with<F: FnMut(Literal)>(&mut self, len: usize, mut undo: F) {
        while self.t.len() > len {
            if let Some(step) = self.t.pop() {
                undo(step.lit);
            }
        }
        self.curr_idx = self.curr_idx.min(len);
    }

    /// Level of the newest step, 0 on an empty trail.
    #[must_use]
    pub fn decision_level(&self) -> DecisionLevel {
        self.t.last().map_or(0, |step| step.decision_level)
    }

    /// Position of the newest decision whose other branch is still
    /// untried.
    #[must_use]
    pub fn last_decision(&self) -> Option<usize> {
        self.t.iter().rposition(|step| step.reason == Reason::Decision)
    }
}
