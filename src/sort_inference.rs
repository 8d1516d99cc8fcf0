//! Well-sortedness checking and result-sort computation.
//!
//! This is the algebraic glue between the logging solver and the term
//! translator: the logging layer uses it to assign a sort to every term it
//! creates (trusting its own inference over whatever the backend reports),
//! and the translator uses a well-sortedness failure in the destination as
//! the signal that a coercion is required.

use crate::{
    ast::{Op, PrimOp, Sort, SortKind},
    Error, SmtResult,
};
use ahash::AHashMap;
use std::sync::LazyLock;

type SortCheck = fn(&[Sort]) -> bool;

// A map used to look up the sortedness check functions in
// `check_sortedness`. Maps primitive operators to a predicate over the
// argument sorts. Initialised once, immutable afterwards.
static SORT_CHECK_DISPATCH: LazyLock<AHashMap<PrimOp, SortCheck>> = LazyLock::new(|| {
    use PrimOp::*;

    let mut m: AHashMap<PrimOp, SortCheck> = AHashMap::new();
    let mut add = |ops: &[PrimOp], f: SortCheck| {
        for &op in ops {
            m.insert(op, f);
        }
    };

    add(&[And, Or, Xor, Not, Implies, Iff], bool_sorts);
    add(&[Ite], check_ite_sorts);
    add(&[Equals, Distinct], equal_sorts);
    add(&[Apply], check_apply_sorts);
    add(&[Add, Sub, Neg, Mult, Div], arithmetic_sorts);
    add(&[LessThan, LessEq, GreaterThan, GreaterEq], arithmetic_sorts);
    add(&[Mod, Abs, Pow, IntDiv, IsInt], int_sorts);
    add(&[ToReal], int_sorts);
    add(&[ToInt], real_sorts);
    add(
        &[
            BvNot, BvNeg, Concat, Extract, ZeroExtend, SignExtend, Repeat, RotateLeft,
            RotateRight, BvToNat,
        ],
        bv_sorts,
    );
    add(
        &[
            BvAnd, BvOr, BvXor, BvNand, BvNor, BvXnor, BvAdd, BvSub, BvMul, BvUDiv, BvSDiv,
            BvURem, BvSRem, BvSMod, BvShl, BvAShr, BvLShr, BvComp, BvULt, BvULe, BvUGt, BvUGe,
            BvSLt, BvSLe, BvSGt, BvSGe,
        ],
        eq_bv_sorts,
    );
    add(&[IntToBv], int_sorts);
    add(&[Select], check_select_sorts);
    add(&[Store], check_store_sorts);
    m
});

/// Checks that an application of `op` to arguments of the given sorts is
/// well-sorted. Returns `Ok(false)` on an arity mismatch or a failed
/// predicate, and an error only if sort checking for the operator is not
/// implemented at all.
pub fn check_sortedness(op: &Op, sorts: &[Sort]) -> SmtResult<bool> {
    if !op.prim.arity().contains(sorts.len()) {
        return Ok(false);
    }
    match SORT_CHECK_DISPATCH.get(&op.prim) {
        Some(f) => Ok(f(sorts) && check_indices(op, sorts)),
        None => Err(Error::NotImplemented(format!(
            "sort checking for operator '{}'",
            op
        ))),
    }
}

// Index constraints for the indexed bit-vector operators. The sort
// predicates have already run at this point.
fn check_indices(op: &Op, sorts: &[Sort]) -> bool {
    if op.indices.len() != op.prim.num_indices() {
        return false;
    }
    match op.prim {
        PrimOp::Extract => {
            let (hi, lo) = (op.indices[0], op.indices[1]);
            lo <= hi && sorts[0].width().is_some_and(|w| hi < w)
        }
        PrimOp::Repeat | PrimOp::IntToBv => op.indices[0] >= 1,
        _ => true,
    }
}

/// Computes the sort of an application of `op` to arguments of the given
/// sorts, assuming the application is well-sorted.
pub fn compute_sort(op: &Op, sorts: &[Sort]) -> SmtResult<Sort> {
    use PrimOp::*;

    let ill_sorted = || Error::WellSortedness(op.clone(), sorts.to_vec());

    Ok(match op.prim {
        Not | Implies | And | Or | Xor | Iff | Equals | Distinct | LessThan | LessEq
        | GreaterThan | GreaterEq | IsInt | BvULt | BvULe | BvUGt | BvUGe | BvSLt | BvSLe
        | BvSGt | BvSGe | BvComp => Sort::Bool,

        Ite => sorts.get(1).ok_or_else(ill_sorted)?.clone(),

        // the arguments all share one arithmetic sort
        Add | Sub | Neg | Mult | Div => sorts.first().ok_or_else(ill_sorted)?.clone(),

        Mod | Abs | Pow | IntDiv | ToInt | BvToNat => Sort::Int,
        ToReal => Sort::Real,

        BvNot | BvNeg | BvAnd | BvOr | BvXor | BvNand | BvNor | BvXnor | BvAdd | BvSub
        | BvMul | BvUDiv | BvSDiv | BvURem | BvSRem | BvSMod | BvShl | BvAShr | BvLShr
        | RotateLeft | RotateRight => sorts.first().ok_or_else(ill_sorted)?.clone(),

        Concat => {
            let mut width = 0;
            for s in sorts {
                width += s.width().ok_or_else(ill_sorted)?;
            }
            Sort::BitVec(width)
        }

        Extract => Sort::BitVec(op.indices[0] - op.indices[1] + 1),

        ZeroExtend | SignExtend => {
            let w = sorts.first().and_then(Sort::width).ok_or_else(ill_sorted)?;
            Sort::BitVec(w + op.indices[0])
        }

        Repeat => {
            let w = sorts.first().and_then(Sort::width).ok_or_else(ill_sorted)?;
            Sort::BitVec(w * op.indices[0])
        }

        IntToBv => Sort::BitVec(op.indices[0]),

        Select => sorts
            .first()
            .and_then(Sort::elem_sort)
            .ok_or_else(ill_sorted)?
            .clone(),

        Store => sorts.first().ok_or_else(ill_sorted)?.clone(),

        Apply => sorts
            .first()
            .and_then(Sort::codomain)
            .ok_or_else(ill_sorted)?
            .clone(),
    })
}

// helper predicates, each a pure function of the argument sort vector

fn bool_sorts(sorts: &[Sort]) -> bool {
    sorts.iter().all(|s| *s == Sort::Bool)
}

fn int_sorts(sorts: &[Sort]) -> bool {
    sorts.iter().all(|s| *s == Sort::Int)
}

fn real_sorts(sorts: &[Sort]) -> bool {
    sorts.iter().all(|s| *s == Sort::Real)
}

fn bv_sorts(sorts: &[Sort]) -> bool {
    sorts.iter().all(|s| s.kind() == SortKind::BitVec)
}

fn equal_sorts(sorts: &[Sort]) -> bool {
    sorts.windows(2).all(|w| w[0] == w[1])
}

fn eq_bv_sorts(sorts: &[Sort]) -> bool {
    bv_sorts(sorts) && equal_sorts(sorts)
}

/// All arguments share a single arithmetic sort (all `Int` or all `Real`,
/// consistently within one call).
fn arithmetic_sorts(sorts: &[Sort]) -> bool {
    sorts.iter().all(Sort::is_arithmetic) && equal_sorts(sorts)
}

fn check_ite_sorts(sorts: &[Sort]) -> bool {
    matches!(sorts, [cond, then, els] if *cond == Sort::Bool && then == els)
}

fn check_apply_sorts(sorts: &[Sort]) -> bool {
    let [fun, args @ ..] = sorts else {
        return false;
    };
    match fun {
        Sort::Function { domain, .. } => {
            domain.len() == args.len() && domain.iter().zip(args).all(|(d, a)| d == a)
        }
        _ => false,
    }
}

fn check_select_sorts(sorts: &[Sort]) -> bool {
    matches!(sorts, [arr, idx] if arr.index_sort() == Some(idx))
}

fn check_store_sorts(sorts: &[Sort]) -> bool {
    matches!(
        sorts,
        [arr, idx, val] if arr.index_sort() == Some(idx) && arr.elem_sort() == Some(val)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(prim: PrimOp) -> Op {
        Op::new(prim)
    }

    fn bv(w: u64) -> Sort {
        Sort::BitVec(w)
    }

    #[test]
    fn boolean_connectives() {
        let sorts = [Sort::Bool, Sort::Bool, Sort::Bool];
        assert!(check_sortedness(&op(PrimOp::And), &sorts).unwrap());
        assert!(!check_sortedness(&op(PrimOp::And), &[Sort::Bool, Sort::Int]).unwrap());
        // `not` is unary
        assert!(!check_sortedness(&op(PrimOp::Not), &sorts).unwrap());
        assert_eq!(compute_sort(&op(PrimOp::And), &sorts).unwrap(), Sort::Bool);
    }

    #[test]
    fn ite_requires_equal_branches() {
        let ok = [Sort::Bool, bv(8), bv(8)];
        let bad = [Sort::Bool, bv(8), bv(4)];
        assert!(check_sortedness(&op(PrimOp::Ite), &ok).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Ite), &bad).unwrap());
        assert_eq!(compute_sort(&op(PrimOp::Ite), &ok).unwrap(), bv(8));
    }

    #[test]
    fn arithmetic_does_not_mix_int_and_real() {
        assert!(check_sortedness(&op(PrimOp::Add), &[Sort::Int, Sort::Int]).unwrap());
        assert!(check_sortedness(&op(PrimOp::Add), &[Sort::Real, Sort::Real]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Add), &[Sort::Int, Sort::Real]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::LessThan), &[Sort::Int, Sort::Real]).unwrap());
        assert_eq!(
            compute_sort(&op(PrimOp::Add), &[Sort::Real, Sort::Real]).unwrap(),
            Sort::Real
        );
        assert_eq!(
            compute_sort(&op(PrimOp::LessThan), &[Sort::Int, Sort::Int]).unwrap(),
            Sort::Bool
        );
    }

    #[test]
    fn bv_widths_must_agree() {
        assert!(check_sortedness(&op(PrimOp::BvAdd), &[bv(4), bv(4)]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::BvAdd), &[bv(4), bv(8)]).unwrap());
        // concat takes mixed widths and sums them
        assert!(check_sortedness(&op(PrimOp::Concat), &[bv(4), bv(8)]).unwrap());
        assert_eq!(
            compute_sort(&op(PrimOp::Concat), &[bv(4), bv(8)]).unwrap(),
            bv(12)
        );
    }

    #[test]
    fn indexed_operators() {
        assert!(check_sortedness(&Op::extract(3, 1), &[bv(8)]).unwrap());
        assert!(!check_sortedness(&Op::extract(1, 3), &[bv(8)]).unwrap());
        assert!(!check_sortedness(&Op::extract(8, 0), &[bv(8)]).unwrap());
        assert_eq!(compute_sort(&Op::extract(3, 1), &[bv(8)]).unwrap(), bv(3));
        assert_eq!(compute_sort(&Op::zero_extend(8), &[bv(4)]).unwrap(), bv(12));
        assert_eq!(compute_sort(&Op::sign_extend(4), &[bv(4)]).unwrap(), bv(8));
        assert_eq!(compute_sort(&Op::repeat(3), &[bv(4)]).unwrap(), bv(12));
        assert_eq!(compute_sort(&Op::rotate_left(2), &[bv(4)]).unwrap(), bv(4));
        assert_eq!(compute_sort(&Op::int_to_bv(5), &[Sort::Int]).unwrap(), bv(5));
    }

    #[test]
    fn arrays() {
        let arr = Sort::Array(Box::new(bv(4)), Box::new(bv(8)));
        assert!(check_sortedness(&op(PrimOp::Select), &[arr.clone(), bv(4)]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Select), &[arr.clone(), bv(8)]).unwrap());
        assert_eq!(
            compute_sort(&op(PrimOp::Select), &[arr.clone(), bv(4)]).unwrap(),
            bv(8)
        );
        assert!(check_sortedness(&op(PrimOp::Store), &[arr.clone(), bv(4), bv(8)]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Store), &[arr.clone(), bv(4), bv(4)]).unwrap());
        assert_eq!(
            compute_sort(&op(PrimOp::Store), &[arr.clone(), bv(4), bv(8)]).unwrap(),
            arr
        );
    }

    #[test]
    fn uninterpreted_functions() {
        let fun = Sort::Function {
            domain: vec![bv(4), Sort::Bool],
            codomain: Box::new(Sort::Int),
        };
        assert!(check_sortedness(&op(PrimOp::Apply), &[fun.clone(), bv(4), Sort::Bool]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Apply), &[fun.clone(), bv(4)]).unwrap());
        assert!(
            !check_sortedness(&op(PrimOp::Apply), &[fun.clone(), Sort::Bool, bv(4)]).unwrap()
        );
        assert_eq!(
            compute_sort(&op(PrimOp::Apply), &[fun, bv(4), Sort::Bool]).unwrap(),
            Sort::Int
        );
    }

    #[test]
    fn equality_requires_one_shared_sort() {
        assert!(check_sortedness(&op(PrimOp::Equals), &[bv(4), bv(4)]).unwrap());
        assert!(!check_sortedness(&op(PrimOp::Equals), &[bv(4), Sort::Bool]).unwrap());
        assert_eq!(
            compute_sort(&op(PrimOp::Equals), &[bv(4), bv(4)]).unwrap(),
            Sort::Bool
        );
    }
}
