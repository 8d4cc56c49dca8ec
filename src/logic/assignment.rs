#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::logic::registry::{Var, Vocabulary};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A model of a theory, restricted to its vocabulary.
///
/// Auxiliary variables introduced while compiling never appear here. The
/// assignment keeps a handle on the vocabulary so it can name its variables.
///
/// `Display` lists the labels of the true variables, sorted by label, one per
/// line. The alternate form (`{:#}`) lists every variable with its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<Var, bool>,
    vocabulary: Arc<Vocabulary>,
}

impl Assignment {
    pub(crate) fn new(values: BTreeMap<Var, bool>, vocabulary: Arc<Vocabulary>) -> Self {
        Self { values, vocabulary }
    }

    #[must_use]
    pub fn get(&self, var: Var) -> Option<bool> {
        self.values.get(&var).copied()
    }

    /// Whether `var` is assigned true. Unknown variables are false.
    #[must_use]
    pub fn is_true(&self, var: Var) -> bool {
        self.get(var).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.values.iter().map(|(&v, &b)| (v, b))
    }

    pub fn true_vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.iter().filter_map(|(v, b)| b.then_some(v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn label(&self, var: Var) -> String {
        self.vocabulary
            .label(var)
            .map_or_else(|| var.to_string(), str::to_string)
    }

    fn sorted_by_label(&self) -> Vec<(String, bool)> {
        let mut entries: Vec<_> = self.iter().map(|(v, b)| (self.label(v), b)).collect();
        entries.sort();
        entries
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = self.sorted_by_label();
        if f.alternate() {
            for (label, value) in entries {
                writeln!(f, "{label}: {value}")?;
            }
        } else {
            for (label, _) in entries.into_iter().filter(|(_, value)| *value) {
                writeln!(f, "{label}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::registry::Registry;

    #[test]
    fn test_display_is_sorted_by_label() {
        let mut registry = Registry::new();
        let b = registry.intern("b".to_string()).unwrap();
        let a = registry.intern("a".to_string()).unwrap();
        let c = registry.intern("c".to_string()).unwrap();
        let vocabulary = Arc::new(registry.vocabulary().unwrap());

        let assignment = Assignment::new(
            BTreeMap::from([(a, true), (b, true), (c, false)]),
            vocabulary,
        );

        assert_eq!(assignment.to_string(), "a\nb\n");
        assert_eq!(format!("{assignment:#}"), "a: true\nb: true\nc: false\n");
        assert_eq!(assignment.true_vars().collect::<Vec<_>>(), vec![b, a]);
        assert!(!assignment.is_true(c));
        assert_eq!(assignment.get(c), Some(false));
    }
}
