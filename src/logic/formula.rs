#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Immutable propositional formulas.
//!
//! Children are reference counted, so a sub-formula can be shared between any
//! number of constraints without copying; cycles cannot be built because a
//! node can only point at formulas that already exist. A formula is therefore
//! a DAG, and every traversal below visits each shared node once and keeps
//! its own stack on the heap, so neither sharing nor nesting depth is bounded
//! by the thread stack.
//!
//! Each inner node caches a structural hash computed when it is built.
//! Hashing a formula is constant time, and equality first compares node
//! identity and hashes before walking the two DAGs.
//!
//! Besides the named constructors, the usual operators are available on both
//! [`Formula`] and [`Var`]: `!a`, `a & b`, `a | b` and `a >> b` (implication).

use crate::error::{Error, Result};
use crate::logic::assignment::Assignment;
use crate::logic::registry::Var;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{BitAnd, BitOr, Deref, Not, Shr};
use std::sync::Arc;

const CONST_TAG: u8 = 0;
const LIT_TAG: u8 = 1;
const NOT_TAG: u8 = 2;
const AND_TAG: u8 = 3;
const OR_TAG: u8 = 4;

fn digest(tag: u8, parts: impl IntoIterator<Item = u64>) -> u64 {
    let mut hasher = FxHasher::default();
    tag.hash(&mut hasher);
    for part in parts {
        part.hash(&mut hasher);
    }
    hasher.finish()
}

/// A reference-counted node of a [`Formula`], together with the structural
/// hash of its contents.
pub struct Shared<T>(Arc<Hashed<T>>);

struct Hashed<T> {
    hash: u64,
    value: T,
}

impl<T> Shared<T> {
    fn new(value: T, hash: u64) -> Self {
        Self(Arc::new(Hashed { hash, value }))
    }

    fn digest(&self) -> u64 {
        self.0.hash
    }

    /// Address of the node, stable for as long as any handle to it lives.
    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.0).map(|node| &mut node.value)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0.value
    }
}

impl<T: Debug> Debug for Shared<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.value.fmt(f)
    }
}

#[derive(Clone)]
pub enum Formula {
    Const(bool),
    /// A variable with its polarity; `true` is the positive literal.
    Lit(Var, bool),
    Not(Shared<Formula>),
    And(Shared<Box<[Formula]>>),
    Or(Shared<Box<[Formula]>>),
}

impl Formula {
    pub const TRUE: Self = Self::Const(true);
    pub const FALSE: Self = Self::Const(false);

    #[must_use]
    pub const fn var(var: Var) -> Self {
        Self::Lit(var, true)
    }

    #[must_use]
    pub const fn lit(var: Var, polarity: bool) -> Self {
        Self::Lit(var, polarity)
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(f: impl Into<Self>) -> Self {
        let f = f.into();
        let hash = digest(NOT_TAG, [f.digest()]);
        Self::Not(Shared::new(f, hash))
    }

    /// Conjunction of `children`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedFormula`] if `children` is empty.
    pub fn and<I>(children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        let children: Vec<Self> = children.into_iter().map(Into::into).collect();
        if children.is_empty() {
            return Err(Error::MalformedFormula("conjunction without operands"));
        }
        Ok(Self::connective(true, children))
    }

    /// Disjunction of `children`.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedFormula`] if `children` is empty.
    pub fn or<I>(children: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        let children: Vec<Self> = children.into_iter().map(Into::into).collect();
        if children.is_empty() {
            return Err(Error::MalformedFormula("disjunction without operands"));
        }
        Ok(Self::connective(false, children))
    }

    /// `premise >> conclusion`, i.e. `Or(Not(premise), conclusion)`.
    #[must_use]
    pub fn implies(premise: impl Into<Self>, conclusion: impl Into<Self>) -> Self {
        Self::connective(false, vec![Self::not(premise), conclusion.into()])
    }

    #[must_use]
    pub fn iff(a: impl Into<Self>, b: impl Into<Self>) -> Self {
        let (a, b) = (a.into(), b.into());
        Self::connective(
            true,
            vec![Self::implies(a.clone(), b.clone()), Self::implies(b, a)],
        )
    }

    /// `And` when `conjunction`, `Or` otherwise. `children` is non-empty.
    fn connective(conjunction: bool, children: Vec<Self>) -> Self {
        let tag = if conjunction { AND_TAG } else { OR_TAG };
        let hash = digest(tag, children.iter().map(Self::digest));
        let node = Shared::new(children.into_boxed_slice(), hash);
        if conjunction {
            Self::And(node)
        } else {
            Self::Or(node)
        }
    }

    /// Structural hash, constant time.
    fn digest(&self) -> u64 {
        match self {
            Self::Const(b) => digest(CONST_TAG, [u64::from(*b)]),
            Self::Lit(v, p) => digest(LIT_TAG, [u64::from(v.id()), u64::from(*p)]),
            Self::Not(g) => g.digest(),
            Self::And(cs) | Self::Or(cs) => cs.digest(),
        }
    }

    /// Identity of an inner node; leaves have none.
    fn id(&self) -> Option<usize> {
        match self {
            Self::Const(_) | Self::Lit(..) => None,
            Self::Not(g) => Some(g.id()),
            Self::And(cs) | Self::Or(cs) => Some(cs.id()),
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Const(_) | Self::Lit(..) => &[],
            Self::Not(g) => std::slice::from_ref(&**g),
            Self::And(cs) | Self::Or(cs) => &cs[..],
        }
    }

    /// Post-order fold over the DAG: `combine` sees a node and the results of
    /// its children, and runs once per distinct inner node.
    fn fold_dag<R: Clone>(&self, mut combine: impl FnMut(&Self, &[R]) -> R) -> R {
        let mut memo: FxHashMap<usize, R> = FxHashMap::default();
        let mut stack = vec![(self, false)];
        let mut results: Vec<R> = Vec::new();

        while let Some((f, expanded)) = stack.pop() {
            let children = f.children();
            if !expanded {
                if let Some(r) = f.id().and_then(|id| memo.get(&id)) {
                    results.push(r.clone());
                    continue;
                }
                if !children.is_empty() {
                    stack.push((f, true));
                    stack.extend(children.iter().rev().map(|c| (c, false)));
                    continue;
                }
            }
            let start = results.len() - children.len();
            let r = combine(f, &results[start..]);
            results.truncate(start);
            if let Some(id) = f.id() {
                memo.insert(id, r.clone());
            }
            results.push(r);
        }

        results
            .pop()
            .unwrap_or_else(|| unreachable!("a post-order traversal yields its root"))
    }

    /// The complement of `self`, pushed down to the literals with De Morgan's
    /// laws. The result contains no `Not` nodes.
    #[must_use]
    pub fn negate(&self) -> Self {
        self.nnf(false)
    }

    /// Negation normal form: an equivalent formula whose only negations are
    /// negative literals.
    #[must_use]
    pub fn to_nnf(&self) -> Self {
        self.nnf(true)
    }

    fn nnf(&self, positive: bool) -> Self {
        // a node reached under both polarities is rewritten once per polarity
        let mut memo: FxHashMap<(usize, bool), Self> = FxHashMap::default();
        let mut stack = vec![(self, positive, false)];
        let mut results: Vec<Self> = Vec::new();

        while let Some((f, positive, expanded)) = stack.pop() {
            match f {
                Self::Const(b) => results.push(Self::Const(*b == positive)),
                Self::Lit(v, p) => results.push(Self::Lit(*v, *p == positive)),
                Self::Not(g) => stack.push((&**g, !positive, false)),
                Self::And(cs) | Self::Or(cs) => {
                    let key = (cs.id(), positive);
                    if expanded {
                        let children = results.split_off(results.len() - cs.len());
                        let g = Self::connective(matches!(f, Self::And(_)) == positive, children);
                        memo.insert(key, g.clone());
                        results.push(g);
                    } else if let Some(g) = memo.get(&key) {
                        results.push(g.clone());
                    } else {
                        stack.push((f, positive, true));
                        stack.extend(cs.iter().rev().map(|c| (c, positive, false)));
                    }
                }
            }
        }

        results
            .pop()
            .unwrap_or_else(|| unreachable!("a post-order traversal yields its root"))
    }

    /// Folds constants away. The result is either a constant or contains no
    /// constant at all; single-child connectives collapse to their child.
    #[must_use]
    pub fn simplify(&self) -> Self {
        self.fold_dag(|f, children: &[Self]| match f {
            Self::Const(_) | Self::Lit(..) => f.clone(),
            Self::Not(_) => match &children[0] {
                Self::Const(b) => Self::Const(!b),
                Self::Lit(v, p) => Self::Lit(*v, !p),
                Self::Not(g) => (**g).clone(),
                g => Self::not(g.clone()),
            },
            Self::And(_) => Self::fold(children, true),
            Self::Or(_) => Self::fold(children, false),
        })
    }

    /// Simplifies a connective over already simplified `children` whose
    /// neutral element is `Const(neutral)`.
    fn fold(children: &[Self], neutral: bool) -> Self {
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Self::Const(b) if *b == neutral => {}
                Self::Const(b) => return Self::Const(*b),
                g => kept.push(g.clone()),
            }
        }
        match kept.len() {
            0 => Self::Const(neutral),
            1 => kept.swap_remove(0),
            _ => Self::connective(neutral, kept),
        }
    }

    /// Truth value under `value`.
    pub fn eval_with<F: Fn(Var) -> bool>(&self, value: &F) -> bool {
        self.fold_dag(|f, children: &[bool]| match f {
            Self::Const(b) => *b,
            Self::Lit(v, p) => value(*v) == *p,
            Self::Not(_) => !children[0],
            Self::And(_) => children.iter().all(|&c| c),
            Self::Or(_) => children.iter().any(|&c| c),
        })
    }

    /// Truth value under `assignment`. Variables the assignment does not
    /// mention count as false.
    #[must_use]
    pub fn eval(&self, assignment: &Assignment) -> bool {
        self.eval_with(&|v| assignment.is_true(v))
    }

    #[must_use]
    pub fn variables(&self) -> BTreeSet<Var> {
        let mut vars = BTreeSet::new();
        let mut seen = FxHashSet::default();
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            if let Self::Lit(v, _) = f {
                vars.insert(*v);
            } else if f.id().is_some_and(|id| seen.insert(id)) {
                stack.extend(f.children());
            }
        }
        vars
    }

    /// Number of nodes of the formula read as a tree, so a shared
    /// sub-formula counts once per occurrence. Saturates at `usize::MAX`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.fold_dag(|_, children: &[usize]| {
            children.iter().fold(1usize, |n, &c| n.saturating_add(c))
        })
    }

    /// Renders the formula with `label` naming each variable.
    pub fn display_with<'a, F: Fn(Var) -> String>(&'a self, label: &'a F) -> impl Display + 'a {
        Labelled { formula: self, label }
    }

    fn write_with<F: Fn(Var) -> String>(&self, f: &mut Formatter<'_>, label: &F) -> std::fmt::Result {
        enum Piece<'a> {
            Node(&'a Formula),
            Text(&'static str),
        }

        let mut stack = vec![Piece::Node(self)];
        while let Some(piece) = stack.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                Self::Const(b) => write!(f, "{b}")?,
                Self::Lit(v, true) => write!(f, "{}", label(*v))?,
                Self::Lit(v, false) => write!(f, "~{}", label(*v))?,
                Self::Not(g) => {
                    if matches!(&**g, Self::Lit(_, false) | Self::Not(_)) {
                        f.write_str("~(")?;
                        stack.push(Piece::Text(")"));
                    } else {
                        f.write_str("~")?;
                    }
                    stack.push(Piece::Node(&**g));
                }
                Self::And(cs) | Self::Or(cs) => {
                    let sep = if matches!(node, Self::And(_)) { " & " } else { " | " };
                    f.write_str("(")?;
                    stack.push(Piece::Text(")"));
                    for (i, c) in cs.iter().enumerate().rev() {
                        stack.push(Piece::Node(c));
                        if i > 0 {
                            stack.push(Piece::Text(sep));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Moves the children out of `self` when it is their only owner, so
    /// that dropping it does not recurse.
    fn detach_children(&mut self, into: &mut Vec<Self>) {
        match self {
            Self::Const(_) | Self::Lit(..) => {}
            Self::Not(g) => {
                if let Some(child) = g.get_mut() {
                    into.push(mem::replace(child, Self::TRUE));
                }
            }
            Self::And(cs) | Self::Or(cs) => {
                if let Some(children) = cs.get_mut() {
                    into.extend(mem::take(children).into_vec());
                }
            }
        }
    }
}

impl Drop for Formula {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut f) = pending.pop() {
            f.detach_children(&mut pending);
        }
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();

        while let Some((a, b)) = stack.pop() {
            match (a, b) {
                (Self::Const(x), Self::Const(y)) if x == y => {}
                (Self::Lit(v, p), Self::Lit(w, q)) if v == w && p == q => {}
                (Self::Not(x), Self::Not(y)) => {
                    if x.ptr_eq(y) {
                        continue;
                    }
                    if x.digest() != y.digest() {
                        return false;
                    }
                    if seen.insert((x.id(), y.id())) {
                        stack.push((&**x, &**y));
                    }
                }
                (Self::And(xs), Self::And(ys)) | (Self::Or(xs), Self::Or(ys)) => {
                    if xs.ptr_eq(ys) {
                        continue;
                    }
                    if xs.digest() != ys.digest() || xs.len() != ys.len() {
                        return false;
                    }
                    if seen.insert((xs.id(), ys.id())) {
                        stack.extend(xs.iter().zip(ys.iter()));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Formula({self})")
    }
}

struct Labelled<'a, F> {
    formula: &'a Formula,
    label: &'a F,
}

impl<F: Fn(Var) -> String> Display for Labelled<'_, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.formula.write_with(f, self.label)
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_with(f, &|v: Var| v.to_string())
    }
}

impl From<Var> for Formula {
    fn from(var: Var) -> Self {
        Self::var(var)
    }
}

impl From<&Var> for Formula {
    fn from(var: &Var) -> Self {
        Self::var(*var)
    }
}

impl From<&Self> for Formula {
    fn from(f: &Self) -> Self {
        f.clone()
    }
}

impl From<bool> for Formula {
    fn from(b: bool) -> Self {
        Self::Const(b)
    }
}

/// Binary `&`/`|`, flattening operands of the same connective so that
/// `a & b & c` is a single three-way conjunction.
fn flatten_binary(lhs: Formula, rhs: Formula, conjunction: bool) -> Formula {
    let mut children = Vec::new();
    for side in [lhs, rhs] {
        let same = match &side {
            Formula::And(_) => conjunction,
            Formula::Or(_) => !conjunction,
            _ => false,
        };
        if same {
            children.extend(side.children().iter().cloned());
        } else {
            children.push(side);
        }
    }
    Formula::connective(conjunction, children)
}
macro_rules! impl_operators {
    ($($t:ty),*) => {
        $(
            impl Not for $t {
                type Output = Formula;

                fn not(self) -> Formula {
                    Formula::not(self)
                }
            }

            impl<R: Into<Formula>> BitAnd<R> for $t {
                type Output = Formula;

                fn bitand(self, rhs: R) -> Formula {
                    flatten_binary(self.into(), rhs.into(), true)
                }
            }

            impl<R: Into<Formula>> BitOr<R> for $t {
                type Output = Formula;

                fn bitor(self, rhs: R) -> Formula {
                    flatten_binary(self.into(), rhs.into(), false)
                }
            }

            impl<R: Into<Formula>> Shr<R> for $t {
                type Output = Formula;

                fn shr(self, rhs: R) -> Formula {
                    Formula::implies(self, rhs)
                }
            }
        )*
    };
}

impl_operators!(Formula, Var);
