//* A hash map from `Term` to `Rc<Term>` would describe the storage's
//* behaviour, but it would keep two copies of every interned term: one in
//* the map key and one inside the `Rc`. A hash set of `Rc<Term>`s merges
//* key and value into a single allocation. Lookups go through a `&Term`;
//* on a hit the existing `Rc` is cloned, on a miss a new one is allocated.

use super::{Rc, Term};
use indexmap::IndexSet;
use std::{borrow::Borrow, hash::Hash};

/// [`Rc`] hashes and compares by reference, so `Borrow<Term>` cannot be
/// implemented for `Rc<Term>`, and a `HashSet<Rc<Term>>` cannot be accessed
/// with a `&Term` key. This wrapper re-implements hashing and equality by
/// value, which makes the `Borrow<Term>` implementation legal and lets the
/// set be indexed by the term itself.
#[derive(Debug, Clone, Eq)]
struct ByValue(Rc<Term>);

impl PartialEq for ByValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Hash for ByValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl Borrow<Term> for ByValue {
    fn borrow(&self) -> &Term {
        self.0.as_ref()
    }
}

/// The structural hash-consing index of a logging solver.
///
/// Holds at most one canonical `Rc<Term>` per structural equivalence class.
/// Candidates are interned with [`TermStorage::lookup_or_insert`], which
/// either returns the existing canonical term (discarding the candidate) or
/// installs the candidate as canonical.
#[derive(Debug, Default)]
pub struct TermStorage(IndexSet<ByValue>);

impl TermStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or inserts the canonical term equal to `term`. The candidate's
    /// children are assumed to already be canonical.
    pub fn lookup_or_insert(&mut self, term: Term) -> Rc<Term> {
        match self.0.get(&term) {
            Some(t) => t.0.clone(),
            None => {
                // SAFETY: the new allocation is interned immediately below,
                // and we just checked that no equal term is present
                let result = unsafe { Rc::new_raw(term) };
                self.0.insert(ByValue(result.clone()));
                result
            }
        }
    }

    /// The number of canonical terms currently interned.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empties the storage. Existing `Rc`s stay alive but are no longer
    /// canonical.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}
