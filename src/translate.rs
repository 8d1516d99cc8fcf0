//! Translation of terms recorded by one logging solver into another
//! backend's world.
//!
//! A translator is tied to *one* destination solver. It only needs the
//! solver being transferred *to*: the source structure is fully described by
//! the logging terms themselves. Because symbols can only be declared once,
//! transferring a term whose symbols already exist in the destination will
//! fail. To avoid this, pre-populate the cache with a mapping from the
//! source solver's symbols to the destination solver's symbols.

use crate::{
    ast::{Constant, Op, PrimOp, Rc, Sort, SortKind, Term},
    solver::LoggingSolver,
    Error, SmtResult,
};
use ahash::AHashMap;
use log::{debug, trace};

/// Rebuilds terms in a destination solver, recursing over the structure
/// captured by the logging layer.
///
/// Both sorts and terms are memoised: each distinct source subterm is
/// rebuilt exactly once, and each source symbol is declared exactly once.
/// When the destination's sort system differs from the source's (engines
/// disagree, for instance, on whether `Bool` and `(_ BitVec 1)` are the same
/// sort), a small set of documented coercions is inserted; anything outside
/// that set fails with [`Error::NotImplemented`].
pub struct TermTranslator<'a> {
    solver: &'a mut LoggingSolver,
    cache: AHashMap<Rc<Term>, Rc<Term>>,
}

impl<'a> TermTranslator<'a> {
    pub fn new(solver: &'a mut LoggingSolver) -> Self {
        TermTranslator { solver, cache: AHashMap::new() }
    }

    /// The translation cache, mapping source terms to destination terms.
    /// Can be used to pre-populate symbol mappings for symbols that already
    /// exist in the destination.
    pub fn cache_mut(&mut self) -> &mut AHashMap<Rc<Term>, Rc<Term>> {
        &mut self.cache
    }

    /// The destination solver this translator builds terms in.
    pub fn solver(&mut self) -> &mut LoggingSolver {
        self.solver
    }

    /// Transfers a sort into the destination solver. Sorts are structural,
    /// so the sort itself is unchanged; this makes sure any uninterpreted
    /// sorts it mentions are declared in the destination backend.
    pub fn transfer_sort(&mut self, sort: &Sort) -> SmtResult<Sort> {
        self.solver.ensure_sort(sort)?;
        Ok(sort.clone())
    }

    /// Transfers a term into the destination solver.
    pub fn transfer_term(&mut self, term: &Rc<Term>) -> SmtResult<Rc<Term>> {
        if let Some(cached) = self.cache.get(term) {
            return Ok(cached.clone());
        }
        trace!("transferring term into backend '{}'", self.solver.backend_name());

        // iterative post-order traversal; deep terms are common, and
        // call-stack recursion would not survive them
        let mut stack: Vec<(Rc<Term>, bool)> = vec![(term.clone(), false)];
        while let Some((t, children_done)) = stack.pop() {
            if self.cache.contains_key(&t) {
                continue;
            }
            if children_done {
                let built = self.rebuild(&t)?;
                self.cache.insert(t, built);
            } else {
                stack.push((t.clone(), true));
                for c in t.children() {
                    stack.push((c.clone(), false));
                }
            }
        }
        Ok(self.cache[term].clone())
    }

    /// Transfers a term and coerces the result to the given sort kind.
    /// Only `Bool` ↔ `BV(1)` and `Int` ↔ `Real` coercions are supported.
    pub fn transfer_term_as(&mut self, term: &Rc<Term>, kind: SortKind) -> SmtResult<Rc<Term>> {
        let result = self.transfer_term(term)?;
        if result.sort().kind() == kind {
            return Ok(result);
        }
        let target = match (result.sort(), kind) {
            (Sort::Bool, SortKind::BitVec) => Sort::BitVec(1),
            (Sort::BitVec(1), SortKind::Bool) => Sort::Bool,
            (Sort::Int, SortKind::Real) => Sort::Real,
            (Sort::Real, SortKind::Int) => Sort::Int,
            (sort, kind) => {
                return Err(Error::NotImplemented(format!(
                    "casting a term of sort '{}' to kind {}",
                    sort, kind
                )));
            }
        };
        self.cast_term(&result, &target)
    }

    /// Rebuilds a single node whose children (if any) are already in the
    /// cache.
    fn rebuild(&mut self, t: &Rc<Term>) -> SmtResult<Rc<Term>> {
        let cached_children = |translator: &Self| -> Vec<Rc<Term>> {
            t.children()
                .iter()
                .map(|c| match translator.cache.get(c) {
                    Some(c) => c.clone(),
                    None => unreachable!("children are translated before their parents"),
                })
                .collect()
        };

        if let Some(op) = t.op() {
            let children = cached_children(self);
            match self.solver.make_term(op.clone(), children.clone()) {
                Ok(built) => Ok(built),
                Err(Error::WellSortedness(_, _)) => {
                    debug!("destination rejected '{}'; trying casts", op);
                    self.cast_op(op, &children)
                }
                Err(e) => Err(e),
            }
        } else if let Some(name) = t.symbol() {
            // If this symbol already exists in the destination the
            // declaration will fail; callers are expected to pre-populate
            // the cache for such symbols.
            let sort = self.transfer_sort(t.sort())?;
            self.solver.make_symbol(name, &sort)
        } else if t.is_const_array() {
            let children = cached_children(self);
            let sort = self.transfer_sort(t.sort())?;
            self.solver.make_const_array(&sort, &children[0])
        } else if let Some(value) = t.value() {
            self.solver.make_value(value.clone())
        } else {
            Err(Error::NotImplemented(
                "translating an opaque model value".to_owned(),
            ))
        }
    }

    /// Repairs an operator application the destination rejected as not
    /// well-sorted. Either the operator is replaced with its sibling in the
    /// other theory, or individual arguments are cast so the original
    /// operator applies. The destination's preferred theory wins: `Bool`
    /// over `BV(1)` where both would work, and `Real` over `Int` when the
    /// two are mixed.
    fn cast_op(&mut self, op: &Op, args: &[Rc<Term>]) -> SmtResult<Rc<Term>> {
        let boolish =
            |t: &Rc<Term>| *t.sort() == Sort::Bool || *t.sort() == Sort::BitVec(1);
        let all_boolish = args.iter().all(boolish);

        // a bit-vector operator whose arguments landed in the boolean
        // world: switch to the boolean sibling
        if let Some(sibling) = bool_sibling(op.prim) {
            if all_boolish {
                let args = self.cast_all(args, &Sort::Bool)?;
                return self.solver.make_term(sibling, args);
            }
        }

        // a boolean connective over width-one bit-vectors: keep the
        // operator and lift the arguments
        if is_bool_connective(op.prim) && all_boolish {
            let args = self.cast_all(args, &Sort::Bool)?;
            return self.solver.make_term(op.clone(), args);
        }

        if matches!(op.prim, PrimOp::Equals | PrimOp::Distinct) && all_boolish {
            let args = self.cast_all(args, &Sort::Bool)?;
            return self.solver.make_term(op.clone(), args);
        }

        if op.prim == PrimOp::Ite {
            if let [cond, then, els] = args {
                if boolish(cond) {
                    let cond = self.cast_term(cond, &Sort::Bool)?;
                    let (then, els) = if boolish(then) && boolish(els) {
                        (
                            self.cast_term(then, &Sort::Bool)?,
                            self.cast_term(els, &Sort::Bool)?,
                        )
                    } else if then.sort().is_arithmetic() && els.sort().is_arithmetic() {
                        (
                            self.cast_term(then, &Sort::Real)?,
                            self.cast_term(els, &Sort::Real)?,
                        )
                    } else {
                        (then.clone(), els.clone())
                    };
                    return self.solver.make_term(PrimOp::Ite, vec![cond, then, els]);
                }
            }
        }

        // mixed Int/Real arguments: lift the integers
        if args.iter().all(|a| a.sort().is_arithmetic())
            && args.iter().any(|a| *a.sort() == Sort::Real)
        {
            let args = self.cast_all(args, &Sort::Real)?;
            return self.solver.make_term(op.clone(), args);
        }

        Err(Error::NotImplemented(format!(
            "no cast repairs the application of '{}' to the translated arguments",
            op
        )))
    }

    fn cast_all(&mut self, args: &[Rc<Term>], sort: &Sort) -> SmtResult<Vec<Rc<Term>>> {
        args.iter().map(|a| self.cast_term(a, sort)).collect()
    }

    /// Casts a term to a different sort. Only the documented coercions are
    /// supported; the term and the target sort must belong to the
    /// destination solver.
    fn cast_term(&mut self, term: &Rc<Term>, sort: &Sort) -> SmtResult<Rc<Term>> {
        if term.sort() == sort {
            return Ok(term.clone());
        }
        // values whose target has an exact constant form convert directly;
        // everything else is wrapped in a conversion operator
        if let Some(converted) = term.value().and_then(|v| convert_value(v, sort)) {
            return self.solver.make_value(converted);
        }
        match (term.sort(), sort) {
            (Sort::Bool, Sort::BitVec(1)) => {
                let one = self.solver.make_value(Constant::new_bitvec(1, 1))?;
                let zero = self.solver.make_value(Constant::new_bitvec(0, 1))?;
                self.solver
                    .make_term(PrimOp::Ite, vec![term.clone(), one, zero])
            }
            (Sort::BitVec(1), Sort::Bool) => {
                let one = self.solver.make_value(Constant::new_bitvec(1, 1))?;
                self.solver.make_term(PrimOp::Equals, vec![term.clone(), one])
            }
            (Sort::Int, Sort::Real) => self.solver.make_term(PrimOp::ToReal, vec![term.clone()]),
            (Sort::Real, Sort::Int) => self.solver.make_term(PrimOp::ToInt, vec![term.clone()]),
            (from, to) => Err(Error::NotImplemented(format!(
                "casting from sort '{}' to sort '{}'",
                from, to
            ))),
        }
    }
}

/// The exact constant form of `value` at the target sort, where one exists.
/// Fractional reals have no exact `Int` form and fall back to `to_int`.
fn convert_value(value: &Constant, sort: &Sort) -> Option<Constant> {
    match (value, sort) {
        (Constant::Bool(b), Sort::BitVec(1)) => Some(Constant::new_bitvec(*b as u64, 1)),
        (Constant::BitVec(v, 1), Sort::Bool) => Some(Constant::Bool(*v == 1)),
        (Constant::Integer(i), Sort::Real) => Some(Constant::Real(i.clone().into())),
        (Constant::Real(r), Sort::Int) if r.is_integer() => {
            Some(Constant::Integer(r.numer().clone()))
        }
        _ => None,
    }
}

/// The boolean sibling of a bit-vector operator, where one exists.
fn bool_sibling(prim: PrimOp) -> Option<PrimOp> {
    match prim {
        PrimOp::BvAnd => Some(PrimOp::And),
        PrimOp::BvOr => Some(PrimOp::Or),
        PrimOp::BvXor => Some(PrimOp::Xor),
        PrimOp::BvNot => Some(PrimOp::Not),
        _ => None,
    }
}

fn is_bool_connective(prim: PrimOp) -> bool {
    matches!(
        prim,
        PrimOp::And | PrimOp::Or | PrimOp::Xor | PrimOp::Not | PrimOp::Implies | PrimOp::Iff
    )
}
