//! The narrow polymorphic contract every SMT engine must implement.

use crate::{
    ast::{Constant, Op},
    Error, SmtResult,
};
use std::{any::Any, fmt, rc::Rc};

/// The result of a satisfiability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown,
}

impl SatResult {
    pub fn is_sat(self) -> bool {
        self == SatResult::Sat
    }

    pub fn is_unsat(self) -> bool {
        self == SatResult::Unsat
    }

    pub fn is_unknown(self) -> bool {
        self == SatResult::Unknown
    }
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SatResult::Sat => "sat",
            SatResult::Unsat => "unsat",
            SatResult::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// An opaque handle to a backend's internal term representation.
///
/// The core never looks inside a backend term; handles only flow from the
/// backend back into the same backend. Backends recover their concrete type
/// with [`BackendTerm::downcast`], and a failed downcast means the handle
/// came from a different engine.
#[derive(Clone)]
pub struct BackendTerm(Rc<dyn Any>);

impl BackendTerm {
    pub fn new<T: Any>(value: T) -> Self {
        BackendTerm(Rc::new(value))
    }

    pub fn downcast<T: Any>(&self) -> SmtResult<&T> {
        self.0.downcast_ref().ok_or_else(|| {
            Error::IncorrectUsage("term does not belong to this solver".to_owned())
        })
    }
}

impl fmt::Debug for BackendTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BackendTerm(..)")
    }
}

/// An opaque handle to a backend's internal sort representation.
#[derive(Clone)]
pub struct BackendSort(Rc<dyn Any>);

impl BackendSort {
    pub fn new<T: Any>(value: T) -> Self {
        BackendSort(Rc::new(value))
    }

    pub fn downcast<T: Any>(&self) -> SmtResult<&T> {
        self.0.downcast_ref().ok_or_else(|| {
            Error::IncorrectUsage("sort does not belong to this solver".to_owned())
        })
    }
}

impl fmt::Debug for BackendSort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BackendSort(..)")
    }
}

/// The capability object a concrete SMT engine exposes to the core.
///
/// Implementations are thin adapters: they create sorts and symbols, build
/// applied terms, assert, push/pop, query satisfiability, and fetch model
/// values. They may assume term applications are well-sorted, since the logging
/// layer validates every application through sort inference before
/// forwarding it. All operations are synchronous, and a single instance is
/// not safe for concurrent access.
pub trait Backend {
    /// A short human-readable engine name, for diagnostics.
    fn name(&self) -> &str;

    /// Forwards an option to the engine. Fails if the engine rejects it.
    fn set_opt(&mut self, option: &str, value: &str) -> SmtResult<()>;

    /// Selects an SMT-LIB logic. Fails on an unsupported logic.
    fn set_logic(&mut self, logic: &str) -> SmtResult<()>;

    fn make_bool_sort(&mut self) -> SmtResult<BackendSort>;
    fn make_int_sort(&mut self) -> SmtResult<BackendSort>;
    fn make_real_sort(&mut self) -> SmtResult<BackendSort>;
    fn make_bv_sort(&mut self, width: u64) -> SmtResult<BackendSort>;
    fn make_array_sort(
        &mut self,
        index: &BackendSort,
        element: &BackendSort,
    ) -> SmtResult<BackendSort>;
    fn make_function_sort(
        &mut self,
        domain: &[BackendSort],
        codomain: &BackendSort,
    ) -> SmtResult<BackendSort>;
    /// Declares an uninterpreted sort; a non-zero arity declares a sort
    /// constructor.
    fn make_uninterpreted_sort(&mut self, name: &str, arity: u64) -> SmtResult<BackendSort>;
    /// Applies a sort constructor to a full list of parameter sorts.
    fn apply_sort_constructor(
        &mut self,
        cons: &BackendSort,
        params: &[BackendSort],
    ) -> SmtResult<BackendSort>;

    /// Builds a constant term from a canonical value.
    fn make_value(&mut self, value: &Constant) -> SmtResult<BackendTerm>;

    /// Builds a constant array of the given array sort, with every index
    /// mapped to `base`.
    fn make_const_array(
        &mut self,
        sort: &BackendSort,
        base: &BackendTerm,
    ) -> SmtResult<BackendTerm>;

    /// Declares a fresh symbol. Fails if `name` is already declared.
    fn make_symbol(&mut self, name: &str, sort: &BackendSort) -> SmtResult<BackendTerm>;

    /// Builds an applied term.
    fn make_term(&mut self, op: &Op, args: &[BackendTerm]) -> SmtResult<BackendTerm>;

    fn assert_formula(&mut self, t: &BackendTerm) -> SmtResult<()>;

    fn check_sat(&mut self) -> SmtResult<SatResult>;
    fn check_sat_assuming(&mut self, assumptions: &[BackendTerm]) -> SmtResult<SatResult>;

    fn push(&mut self, levels: u64) -> SmtResult<()>;
    fn pop(&mut self, levels: u64) -> SmtResult<()>;

    /// Retrieves a model value for `t`. Must follow a `Sat` result.
    fn get_value(&mut self, t: &BackendTerm) -> SmtResult<BackendTerm>;

    /// Returns the finite explicit mapping of an array model value, plus the
    /// optional default element.
    fn get_array_values(
        &mut self,
        arr: &BackendTerm,
    ) -> SmtResult<(Vec<(BackendTerm, BackendTerm)>, Option<BackendTerm>)>;

    /// Returns `true` if the engine considers `t` a value.
    fn is_value(&self, t: &BackendTerm) -> SmtResult<bool>;

    /// Prints a value term in SMT-LIB2 surface syntax.
    fn value_to_smt2(&self, t: &BackendTerm) -> SmtResult<String>;

    /// Resets the full engine, including declarations.
    fn reset(&mut self) -> SmtResult<()>;

    /// Resets only the assertion stack, preserving declarations.
    fn reset_assertions(&mut self) -> SmtResult<()>;
}
