//! The structural term representation kept by the logging solver.

use super::{Constant, Op, Rc, Sort};
use crate::backend::BackendTerm;
use std::{fmt, hash::Hash};

/// Identifies the solver (and the reset epoch within it) that created a
/// term. A term may only be used with the solver instance it came from, and
/// becomes stale when that solver is fully reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverTag {
    pub(crate) solver: u64,
    pub(crate) epoch: u64,
}

/// A term, as recorded by the logging solver.
///
/// Every term carries the opaque handle of the backend term it wraps, plus
/// the structural information the backend may have discarded: the operator
/// it was built with, its children, and the sort computed by sort inference.
/// Leaves (values, symbols, and constant-array bases) have no operator; a
/// constant array is the one exception that has no operator but a single
/// child, the array's constant value.
///
/// Terms are immutable and shared by identity after hash-consing, so they
/// are compared and hashed through [`Rc`] in constant time. The structural
/// equality implemented here is only used by the term storage when
/// interning.
pub struct Term {
    pub(crate) backend: BackendTerm,
    pub(crate) sort: Sort,
    pub(crate) op: Option<Op>,
    pub(crate) children: Vec<Rc<Term>>,
    pub(crate) symbol: Option<String>,
    pub(crate) value: Option<Constant>,
    pub(crate) is_value: bool,
    pub(crate) tag: SolverTag,
}

impl Term {
    /// The sort of the term, in the logging view. This may be richer than
    /// the sort the backend reports (e.g. `Bool` where an engine only has
    /// `(_ BitVec 1)`).
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// The operator of the term, if it is an applied term.
    pub fn op(&self) -> Option<&Op> {
        self.op.as_ref()
    }

    /// The children of the term, in order. Empty for leaves; for constant
    /// arrays this is the single base value.
    pub fn children(&self) -> &[Rc<Term>] {
        &self.children
    }

    /// The name of the term, if it is a declared symbol.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// The canonical constant this term denotes, if it is a value the
    /// logging layer could parse.
    pub fn value(&self) -> Option<&Constant> {
        self.value.as_ref()
    }

    /// Returns `true` if the backend considers this term a value.
    pub fn is_value(&self) -> bool {
        self.is_value
    }

    pub fn is_symbol(&self) -> bool {
        self.symbol.is_some()
    }

    /// Returns `true` if the term is a constant array: no operator, with
    /// the base value as its only child.
    pub fn is_const_array(&self) -> bool {
        self.op.is_none() && self.children.len() == 1
    }

    pub(crate) fn backend_term(&self) -> &BackendTerm {
        &self.backend
    }
}

// The backend handle and the solver tag are deliberately excluded: equality
// is structural, and values compare through their canonical constant.
impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
            && self.sort == other.sort
            && self.children == other.children
            && self.symbol == other.symbol
            && self.value == other.value
            && self.is_value == other.is_value
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.op.hash(state);
        self.sort.hash(state);
        self.children.hash(state);
        self.symbol.hash(state);
        self.value.hash(state);
        self.is_value.hash(state);
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(op) = &self.op {
            write!(f, "({}", op)?;
            for c in &self.children {
                write!(f, " {}", c)?;
            }
            write!(f, ")")
        } else if let Some(name) = &self.symbol {
            write!(f, "{}", name)
        } else if let Some(value) = &self.value {
            write!(f, "{}", value)
        } else if let [base] = self.children.as_slice() {
            write!(f, "((as const {}) {})", self.sort, base)
        } else {
            write!(f, "<opaque value of sort {}>", self.sort)
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} : {}", self, self.sort)
    }
}
