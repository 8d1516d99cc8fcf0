#![deny(clippy::self_named_module_files)]
#![deny(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::branches_sharing_code)]
#![warn(clippy::cloned_instead_of_copied)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::equatable_if_let)]
#![warn(clippy::explicit_into_iter_loop)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::from_iter_instead_of_collect)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::if_not_else)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::inconsistent_struct_constructor)]
#![warn(clippy::index_refutable_slice)]
#![warn(clippy::inefficient_to_string)]
#![warn(clippy::items_after_statements)]
#![warn(clippy::manual_assert)]
#![warn(clippy::manual_ok_or)]
#![warn(clippy::map_unwrap_or)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::str_to_string)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unnested_or_patterns)]

//! A solver-agnostic abstraction layer over SMT solvers.
//!
//! This crate presents a uniform, strongly-sorted term-building API that can
//! be backed by any engine implementing the [`backend::Backend`] trait. On
//! top of that uniform API it provides:
//!
//! - a *logging* solver ([`solver::LoggingSolver`]) that intercepts every
//!   sort and term construction and materialises a hash-consed structural
//!   representation, independent of whatever the engine itself retains;
//! - a *term translator* ([`translate::TermTranslator`]) that rebuilds terms
//!   recorded by the logging layer inside a different backend, caching
//!   results and inserting a small set of documented coercions
//!   (`Bool` ↔ `BitVec(1)`, `Int` ↔ `Real`) when sort systems differ.
//!
//! Both are coupled through a shared sort-inference engine
//! ([`sort_inference`]) which validates well-sortedness and computes result
//! sorts, so that structure survives even backends that aggressively rewrite
//! the terms they are given.

pub mod ast;
pub mod backend;
pub mod backends;
pub mod solver;
pub mod sort_inference;
pub mod translate;
mod utils;

use ast::{Op, Sort};
use thiserror::Error;

pub use utils::Range;

pub type SmtResult<T> = Result<T, Error>;

fn format_sorts(sorts: &[Sort]) -> String {
    let mut s = String::new();
    for (i, sort) in sorts.iter().enumerate() {
        if i > 0 {
            s.push_str(", ");
        }
        s.push_str(&format!("'{}'", sort));
    }
    s
}

/// The error type shared by every layer of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller violated a documented precondition of the API.
    #[error("incorrect usage: {0}")]
    IncorrectUsage(String),

    /// The operation is part of the abstract API but is not supported in the
    /// current path.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The underlying engine reported an error.
    #[error("backend error: {0}")]
    Backend(String),

    /// An operator application failed sort inference.
    #[error("operator '{}' is not well-sorted for arguments of sorts [{}]", .0, format_sorts(.1))]
    WellSortedness(Op, Vec<Sort>),
}
