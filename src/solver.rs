//! The logging solver: a wrapper that intercepts every sort and term
//! creation, records the compositional structure, and hash-conses the
//! resulting terms.

use crate::{
    ast::{Constant, Op, Rc, Sort, SortKind, SolverTag, Term, TermStorage},
    backend::{Backend, BackendSort, BackendTerm, SatResult},
    sort_inference, Error, SmtResult,
};
use ahash::AHashMap;
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SOLVER_ID: AtomicU64 = AtomicU64::new(0);

/// A solver that re-exports the backend interface while keeping a faithful
/// structural copy of every term it builds.
///
/// For each term-creating call, the solver forwards to the inner backend,
/// wraps the opaque handle in a [`Term`] carrying operator, children and the
/// sort computed by [`sort_inference`], and interns the result: no two
/// distinct live terms of one solver are structurally equal. Some engines
/// rewrite or simplify the terms they are given; the structure recorded here
/// is what the caller actually built.
///
/// A solver instance is single-threaded; terms may only be used with the
/// solver that created them, and become stale after [`LoggingSolver::reset`].
pub struct LoggingSolver {
    backend: Box<dyn Backend>,
    storage: TermStorage,
    sort_handles: AHashMap<Sort, BackendSort>,
    symbols: AHashMap<String, Rc<Term>>,
    id: u64,
    epoch: u64,
}

impl LoggingSolver {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let id = NEXT_SOLVER_ID.fetch_add(1, Ordering::Relaxed);
        debug!("logging solver {} wraps backend '{}'", id, backend.name());
        LoggingSolver {
            backend,
            storage: TermStorage::new(),
            sort_handles: AHashMap::new(),
            symbols: AHashMap::new(),
            id,
            epoch: 0,
        }
    }

    /// The name of the wrapped engine.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The number of distinct terms currently interned.
    pub fn term_count(&self) -> usize {
        self.storage.len()
    }

    /// Looks up a previously declared symbol by name.
    pub fn get_symbol(&self, name: &str) -> Option<Rc<Term>> {
        self.symbols.get(name).cloned()
    }

    fn tag(&self) -> SolverTag {
        SolverTag { solver: self.id, epoch: self.epoch }
    }

    /// Checks that `t` was created by this solver instance since its last
    /// full reset, and unwraps it to the backend handle.
    fn unwrap_term(&self, t: &Rc<Term>) -> SmtResult<BackendTerm> {
        if t.tag.solver != self.id {
            return Err(Error::IncorrectUsage(
                "term belongs to a different solver; use a translator to move it".to_owned(),
            ));
        }
        if t.tag.epoch != self.epoch {
            return Err(Error::IncorrectUsage(
                "term is stale: the solver was reset after it was created".to_owned(),
            ));
        }
        Ok(t.backend_term().clone())
    }

    /// Returns the backend handle for a structural sort, creating it in the
    /// backend on first use. The handle is cached per structure, so a sort
    /// is declared at most once.
    fn lower_sort(&mut self, sort: &Sort) -> SmtResult<BackendSort> {
        if let Some(handle) = self.sort_handles.get(sort) {
            return Ok(handle.clone());
        }
        let handle = match sort {
            Sort::Bool => self.backend.make_bool_sort()?,
            Sort::Int => self.backend.make_int_sort()?,
            Sort::Real => self.backend.make_real_sort()?,
            Sort::BitVec(0) => {
                return Err(Error::IncorrectUsage(
                    "bit-vector widths must be strictly positive".to_owned(),
                ));
            }
            Sort::BitVec(width) => self.backend.make_bv_sort(*width)?,
            Sort::Array(index, element) => {
                let index = self.lower_sort(index)?;
                let element = self.lower_sort(element)?;
                self.backend.make_array_sort(&index, &element)?
            }
            Sort::Function { domain, codomain } => {
                if domain.is_empty() {
                    return Err(Error::IncorrectUsage(
                        "function sorts need a non-empty domain".to_owned(),
                    ));
                }
                let mut lowered = Vec::with_capacity(domain.len());
                for d in domain {
                    lowered.push(self.lower_sort(d)?);
                }
                let codomain = self.lower_sort(codomain)?;
                self.backend.make_function_sort(&lowered, &codomain)?
            }
            Sort::Uninterpreted(name) => self.backend.make_uninterpreted_sort(name, 0)?,
            Sort::UninterpretedCons(name, arity) => {
                if *arity == 0 {
                    return Err(Error::IncorrectUsage(
                        "sort constructors must have non-zero arity".to_owned(),
                    ));
                }
                self.backend.make_uninterpreted_sort(name, *arity)?
            }
            Sort::UninterpretedApplied(cons, params) => {
                let arity = match cons.as_ref() {
                    Sort::UninterpretedCons(_, arity) => *arity,
                    _ => {
                        return Err(Error::IncorrectUsage(format!(
                            "'{}' is not an uninterpreted sort constructor",
                            cons
                        )));
                    }
                };
                if arity as usize != params.len() {
                    return Err(Error::IncorrectUsage(format!(
                        "sort constructor '{}' expects {} parameters, got {}",
                        cons,
                        arity,
                        params.len()
                    )));
                }
                let cons = self.lower_sort(cons)?;
                let mut lowered = Vec::with_capacity(params.len());
                for p in params {
                    lowered.push(self.lower_sort(p)?);
                }
                self.backend.apply_sort_constructor(&cons, &lowered)?
            }
        };
        self.sort_handles.insert(sort.clone(), handle.clone());
        Ok(handle)
    }

    /// Validates a structural sort and declares it in the backend. Used by
    /// the translator to make sure destination declarations exist.
    pub(crate) fn ensure_sort(&mut self, sort: &Sort) -> SmtResult<()> {
        self.lower_sort(sort).map(|_| ())
    }

    // sort constructors

    pub fn bool_sort(&mut self) -> SmtResult<Sort> {
        self.make_sort(Sort::Bool)
    }

    pub fn int_sort(&mut self) -> SmtResult<Sort> {
        self.make_sort(Sort::Int)
    }

    pub fn real_sort(&mut self) -> SmtResult<Sort> {
        self.make_sort(Sort::Real)
    }

    pub fn bv_sort(&mut self, width: u64) -> SmtResult<Sort> {
        self.make_sort(Sort::BitVec(width))
    }

    pub fn array_sort(&mut self, index: Sort, element: Sort) -> SmtResult<Sort> {
        self.make_sort(Sort::Array(Box::new(index), Box::new(element)))
    }

    pub fn function_sort(&mut self, domain: Vec<Sort>, codomain: Sort) -> SmtResult<Sort> {
        self.make_sort(Sort::Function { domain, codomain: Box::new(codomain) })
    }

    /// Declares an uninterpreted sort. A non-zero arity declares a sort
    /// constructor, to be applied with
    /// [`LoggingSolver::apply_sort_constructor`].
    pub fn uninterpreted_sort(&mut self, name: &str, arity: u64) -> SmtResult<Sort> {
        let sort = if arity == 0 {
            Sort::Uninterpreted(name.to_owned())
        } else {
            Sort::UninterpretedCons(name.to_owned(), arity)
        };
        self.make_sort(sort)
    }

    /// Applies a sort constructor to a full list of parameter sorts.
    pub fn apply_sort_constructor(&mut self, cons: &Sort, params: Vec<Sort>) -> SmtResult<Sort> {
        self.make_sort(Sort::UninterpretedApplied(Box::new(cons.clone()), params))
    }

    fn make_sort(&mut self, sort: Sort) -> SmtResult<Sort> {
        self.lower_sort(&sort)?;
        Ok(sort)
    }

    // term constructors

    /// Builds a constant term. Bit-vector payloads are truncated to their
    /// width, so equal values always produce the same term.
    pub fn make_value(&mut self, value: Constant) -> SmtResult<Rc<Term>> {
        let value = match value {
            Constant::BitVec(_, 0) => {
                return Err(Error::IncorrectUsage(
                    "bit-vector widths must be strictly positive".to_owned(),
                ));
            }
            Constant::BitVec(v, w) => Constant::new_bitvec(v, w),
            other => other,
        };
        let sort = value.sort();
        let backend = self.backend.make_value(&value)?;
        let term = Term {
            backend,
            sort,
            op: None,
            children: Vec::new(),
            symbol: None,
            value: Some(value),
            is_value: true,
            tag: self.tag(),
        };
        Ok(self.storage.lookup_or_insert(term))
    }

    /// Builds a constant array of the given array sort whose every index
    /// maps to `base`. The base value is recorded as the term's only child.
    pub fn make_const_array(&mut self, sort: &Sort, base: &Rc<Term>) -> SmtResult<Rc<Term>> {
        let base_handle = self.unwrap_term(base)?;
        let element = match sort.elem_sort() {
            Some(element) => element,
            None => {
                return Err(Error::IncorrectUsage(format!(
                    "constant arrays require an array sort, got: '{}'",
                    sort
                )));
            }
        };
        if base.sort() != element {
            return Err(Error::IncorrectUsage(format!(
                "constant array base has sort '{}', expected element sort '{}'",
                base.sort(),
                element
            )));
        }
        let sort_handle = self.lower_sort(sort)?;
        let backend = self.backend.make_const_array(&sort_handle, &base_handle)?;
        let is_value = self.backend.is_value(&backend)?;
        let term = Term {
            backend,
            sort: sort.clone(),
            op: None,
            children: vec![base.clone()],
            symbol: None,
            value: None,
            is_value,
            tag: self.tag(),
        };
        Ok(self.storage.lookup_or_insert(term))
    }

    /// Declares a fresh symbol. Symbol names are process-wide within one
    /// solver: redeclaring a name fails.
    pub fn make_symbol(&mut self, name: &str, sort: &Sort) -> SmtResult<Rc<Term>> {
        if self.symbols.contains_key(name) {
            return Err(Error::IncorrectUsage(format!(
                "symbol '{}' has already been declared",
                name
            )));
        }
        let sort_handle = self.lower_sort(sort)?;
        let backend = self.backend.make_symbol(name, &sort_handle)?;
        debug!("declared symbol '{}' of sort '{}'", name, sort);
        let term = Term {
            backend,
            sort: sort.clone(),
            op: None,
            children: Vec::new(),
            symbol: Some(name.to_owned()),
            value: None,
            is_value: false,
            tag: self.tag(),
        };
        let term = self.storage.lookup_or_insert(term);
        self.symbols.insert(name.to_owned(), term.clone());
        Ok(term)
    }

    /// Builds an applied term, checking well-sortedness and computing the
    /// result sort through sort inference.
    pub fn make_term(&mut self, op: impl Into<Op>, args: Vec<Rc<Term>>) -> SmtResult<Rc<Term>> {
        let op = op.into();
        let mut handles = Vec::with_capacity(args.len());
        for a in &args {
            handles.push(self.unwrap_term(a)?);
        }
        let sorts: Vec<Sort> = args.iter().map(|a| a.sort().clone()).collect();
        if !sort_inference::check_sortedness(&op, &sorts)? {
            return Err(Error::WellSortedness(op, sorts));
        }
        let sort = sort_inference::compute_sort(&op, &sorts)?;
        let backend = self.backend.make_term(&op, &handles)?;
        trace!("built ({} ...) : {}", op, sort);
        let term = Term {
            backend,
            sort,
            op: Some(op),
            children: args,
            symbol: None,
            value: None,
            is_value: false,
            tag: self.tag(),
        };
        Ok(self.storage.lookup_or_insert(term))
    }

    // forwarded operations

    pub fn set_opt(&mut self, option: &str, value: &str) -> SmtResult<()> {
        self.backend.set_opt(option, value)
    }

    pub fn set_logic(&mut self, logic: &str) -> SmtResult<()> {
        self.backend.set_logic(logic)
    }

    /// Asserts a formula. The term must have sort `Bool`.
    pub fn assert_formula(&mut self, t: &Rc<Term>) -> SmtResult<()> {
        let handle = self.unwrap_term(t)?;
        if *t.sort() != Sort::Bool {
            return Err(Error::IncorrectUsage(format!(
                "asserted formulas must have sort Bool, got '{}'",
                t.sort()
            )));
        }
        self.backend.assert_formula(&handle)
    }

    pub fn check_sat(&mut self) -> SmtResult<SatResult> {
        let result = self.backend.check_sat()?;
        debug!("check-sat: {}", result);
        Ok(result)
    }

    pub fn check_sat_assuming(&mut self, assumptions: &[Rc<Term>]) -> SmtResult<SatResult> {
        let mut handles = Vec::with_capacity(assumptions.len());
        for a in assumptions {
            handles.push(self.unwrap_term(a)?);
        }
        let result = self.backend.check_sat_assuming(&handles)?;
        debug!("check-sat-assuming: {}", result);
        Ok(result)
    }

    pub fn push(&mut self, levels: u64) -> SmtResult<()> {
        self.backend.push(levels)
    }

    pub fn pop(&mut self, levels: u64) -> SmtResult<()> {
        self.backend.pop(levels)
    }

    /// Retrieves a model value for `t`. Must follow a `Sat` result.
    pub fn get_value(&mut self, t: &Rc<Term>) -> SmtResult<Rc<Term>> {
        let handle = self.unwrap_term(t)?;
        let value = self.backend.get_value(&handle)?;
        self.wrap_model_value(value, t.sort().clone())
    }

    /// Returns the finite explicit mapping of an array model value, plus the
    /// optional constant base element. Multidimensional constant bases are
    /// not supported.
    #[allow(clippy::type_complexity)]
    pub fn get_array_values(
        &mut self,
        arr: &Rc<Term>,
    ) -> SmtResult<(Vec<(Rc<Term>, Rc<Term>)>, Option<Rc<Term>>)> {
        let handle = self.unwrap_term(arr)?;
        let (index_sort, elem_sort) = match arr.sort() {
            Sort::Array(index, element) => (index.as_ref().clone(), element.as_ref().clone()),
            other => {
                return Err(Error::IncorrectUsage(format!(
                    "get_array_values requires an array term, got sort '{}'",
                    other
                )));
            }
        };
        let (assignments, const_base) = self.backend.get_array_values(&handle)?;
        let const_base = match const_base {
            Some(base) => {
                if elem_sort.kind() == SortKind::Array {
                    return Err(Error::NotImplemented(
                        "constant base for a multidimensional array".to_owned(),
                    ));
                }
                Some(self.wrap_model_value(base, elem_sort.clone())?)
            }
            None => None,
        };
        let mut wrapped = Vec::with_capacity(assignments.len());
        for (index, value) in assignments {
            let index = self.wrap_model_value(index, index_sort.clone())?;
            let value = self.wrap_model_value(value, elem_sort.clone())?;
            wrapped.push((index, value));
        }
        Ok((wrapped, const_base))
    }

    /// Wraps a backend model value as a leaf term. Values of first-order
    /// sorts are parsed into canonical constants and interned; anything
    /// else stays opaque and is not interned, since two distinct opaque
    /// values must not be merged.
    fn wrap_model_value(&mut self, backend: BackendTerm, sort: Sort) -> SmtResult<Rc<Term>> {
        let is_value = self.backend.is_value(&backend)?;
        let value = match sort.kind() {
            SortKind::Bool | SortKind::Int | SortKind::Real | SortKind::BitVec if is_value => {
                let printed = self.backend.value_to_smt2(&backend)?;
                Some(Constant::from_smt2(&printed, &sort)?)
            }
            _ => None,
        };
        let term = Term {
            backend,
            sort,
            op: None,
            children: Vec::new(),
            symbol: None,
            value,
            is_value,
            tag: self.tag(),
        };
        if term.value().is_some() {
            Ok(self.storage.lookup_or_insert(term))
        } else {
            // SAFETY: opaque model values are never interned. Every
            // interned leaf carries either a parsed constant, a symbol
            // name, or a constant-array child, so this allocation cannot be
            // structurally equal to a canonical one
            Ok(unsafe { Rc::new_raw(term) })
        }
    }

    /// Resets the full engine. All previously created terms become stale,
    /// and the hash-consing storage is cleared.
    pub fn reset(&mut self) -> SmtResult<()> {
        self.backend.reset()?;
        self.storage.clear();
        self.sort_handles.clear();
        self.symbols.clear();
        self.epoch += 1;
        debug!("solver {} reset (epoch {})", self.id, self.epoch);
        Ok(())
    }

    /// Clears only the assertion stack. Declarations stay in place, and the
    /// terms built so far remain usable.
    pub fn reset_assertions(&mut self) -> SmtResult<()> {
        self.backend.reset_assertions()
    }
}
