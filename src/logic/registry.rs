#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Interning of atomic propositions.
//!
//! A client describes its propositions with a key type, usually an enum with
//! one variant per kind of proposition:
//!
//! ```
//! use std::fmt;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! enum Prop {
//!     Lt(u8, u8),
//! }
//!
//! impl fmt::Display for Prop {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         match self {
//!             Self::Lt(a, b) => write!(f, "c{a}<c{b}"),
//!         }
//!     }
//! }
//!
//! let mut registry = prop_theory::Registry::new();
//! let a = registry.intern(Prop::Lt(1, 2)).unwrap();
//! let b = registry.intern(Prop::Lt(1, 2)).unwrap();
//! assert_eq!(a, b);
//! ```
//!
//! Equal keys always resolve to the same [`Var`]. The `Display` rendering of a
//! key is its label; two unequal keys sharing a label are rejected with
//! [`Error::DuplicateDefinition`].

use crate::error::{Error, Result};
use crate::sat::literal::Variable;
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

/// Anything usable as a proposition key.
pub trait Proposition: Clone + Eq + Hash + Display + Debug {}

impl<T: Clone + Eq + Hash + Display + Debug> Proposition for T {}

/// Handle of an interned proposition. Handles are issued densely from 1 in
/// registration order.
///
/// A handle is only its number and does not record which registry issued
/// it: the first proposition of every registry is `x1`. Handles from two
/// registries compare equal by number, and a formula built with another
/// registry's handles means whatever propositions carry those numbers in
/// the vocabulary it is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Zero-based registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    fn from_index(index: usize) -> Result<Self> {
        index
            .checked_add(1)
            .and_then(|id| u32::try_from(id).ok())
            .map(Self)
            .ok_or(Error::VariableLimit)
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Registry<K> {
    keys: Vec<K>,
    labels: Vec<String>,
    by_key: FxHashMap<K, Var>,
    by_label: FxHashMap<String, Var>,
}

impl<K: Proposition> Default for Registry<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            labels: Vec::new(),
            by_key: FxHashMap::default(),
            by_label: FxHashMap::default(),
        }
    }
}

impl<K: Proposition> Registry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the variable of `key`, registering it on first sight.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateDefinition`] if a different key already owns the
    /// label `key` renders to.
    pub fn intern(&mut self, key: K) -> Result<Var> {
        if let Some(&var) = self.by_key.get(&key) {
            return Ok(var);
        }

        let label = key.to_string();
        if self.by_label.contains_key(&label) {
            return Err(Error::DuplicateDefinition { label });
        }

        let var = Var::from_index(self.keys.len())?;
        log::trace!("interned {label} as {var}");
        self.keys.push(key.clone());
        self.labels.push(label.clone());
        self.by_key.insert(key, var);
        self.by_label.insert(label, var);
        Ok(var)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<Var> {
        self.by_key.get(key).copied()
    }

    #[must_use]
    pub fn key(&self, var: Var) -> Option<&K> {
        self.keys.get(var.index())
    }

    #[must_use]
    pub fn label(&self, var: Var) -> Option<&str> {
        self.labels.get(var.index()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All registered propositions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, &K)> {
        self.keys.iter().zip(1u32..).map(|(key, id)| (Var(id), key))
    }

    /// Snapshot of every registered variable with its label.
    ///
    /// # Errors
    ///
    /// [`Error::VariableLimit`] if the vocabulary cannot be numbered.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        let mut vocabulary = Vocabulary::default();
        for ((var, _), label) in self.iter().zip(&self.labels) {
            vocabulary.insert(var, label.clone())?;
        }
        Ok(vocabulary)
    }
}

/// The variables a theory is stated over, numbered densely for the clausal
/// engine: the `i`-th vocabulary variable is CNF variable `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    vars: Vec<Var>,
    labels: Vec<String>,
    index: FxHashMap<Var, Variable>,
}

impl Vocabulary {
    /// Adds `var` at the end unless it is already present.
    ///
    /// # Errors
    ///
    /// [`Error::VariableLimit`] if the next CNF variable does not fit.
    pub fn insert(&mut self, var: Var, label: String) -> Result<()> {
        if self.index.contains_key(&var) {
            return Ok(());
        }
        let cnf_var = self
            .vars
            .len()
            .checked_add(1)
            .and_then(|v| Variable::try_from(v).ok())
            .ok_or(Error::VariableLimit)?;
        self.vars.push(var);
        self.labels.push(label);
        self.index.insert(var, cnf_var);
        Ok(())
    }

    /// Adds the variables missing from the vocabulary, labelled by their
    /// handle. Returns how many were added.
    ///
    /// # Errors
    ///
    /// [`Error::VariableLimit`] as for [`Vocabulary::insert`].
    pub fn extend<I: IntoIterator<Item = Var>>(&mut self, vars: I) -> Result<usize> {
        let before = self.len();
        for var in vars {
            if !self.contains(var) {
                self.insert(var, var.to_string())?;
            }
        }
        Ok(self.len() - before)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    #[must_use]
    pub fn contains(&self, var: Var) -> bool {
        self.index.contains_key(&var)
    }

    #[must_use]
    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    #[must_use]
    pub fn label(&self, var: Var) -> Option<&str> {
        let position = self.index.get(&var)?;
        self.labels
            .get(*position as usize - 1)
            .map(String::as_str)
    }

    #[must_use]
    pub fn cnf_variable(&self, var: Var) -> Option<Variable> {
        self.index.get(&var).copied()
    }

    /// Inverse of [`Vocabulary::cnf_variable`]; `None` for auxiliaries.
    #[must_use]
    pub fn var_of(&self, cnf_var: Variable) -> Option<Var> {
        (cnf_var as usize)
            .checked_sub(1)
            .and_then(|i| self.vars.get(i))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Prop {
        Lt(u8, u8),
        At(u8, u8),
        Raw(&'static str),
    }

    impl Display for Prop {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Lt(a, b) => write!(f, "c{a}<c{b}"),
                Self::At(c, p) => write!(f, "c{c}@p{p}"),
                Self::Raw(s) => write!(f, "{s}"),
            }
        }
    }

    #[test]
    fn test_equal_keys_share_a_variable() {
        let mut registry = Registry::new();
        let a = registry.intern(Prop::Lt(1, 2)).unwrap();
        let b = registry.intern(Prop::At(1, 2)).unwrap();
        let c = registry.intern(Prop::Lt(1, 2)).unwrap();

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
    }

    #[test]
    fn test_conflicting_label_is_rejected() {
        let mut registry = Registry::new();
        registry.intern(Prop::Lt(1, 2)).unwrap();
        let err = registry.intern(Prop::Raw("c1<c2")).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateDefinition {
                label: "c1<c2".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_by_var() {
        let mut registry = Registry::new();
        let v = registry.intern(Prop::At(3, 1)).unwrap();
        assert_eq!(registry.key(v), Some(&Prop::At(3, 1)));
        assert_eq!(registry.label(v), Some("c3@p1"));
        assert_eq!(registry.get(&Prop::At(3, 1)), Some(v));
        assert_eq!(registry.get(&Prop::At(1, 3)), None);
    }

    #[test]
    fn test_vocabulary_numbering() {
        let mut registry = Registry::new();
        let a = registry.intern(Prop::Lt(1, 2)).unwrap();
        let b = registry.intern(Prop::Lt(2, 1)).unwrap();

        let mut vocabulary = registry.vocabulary().unwrap();
        assert_eq!(vocabulary.cnf_variable(a), Some(1));
        assert_eq!(vocabulary.cnf_variable(b), Some(2));
        assert_eq!(vocabulary.var_of(2), Some(b));
        assert_eq!(vocabulary.var_of(3), None);
        assert_eq!(vocabulary.label(b), Some("c2<c1"));

        let c = registry.intern(Prop::At(1, 1)).unwrap();
        assert_eq!(vocabulary.extend([a, c]).unwrap(), 1);
        assert_eq!(vocabulary.cnf_variable(c), Some(3));
        assert_eq!(vocabulary.label(c), Some("x3"));
    }
}
