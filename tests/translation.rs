//! Translator round-trips, caching, and cross-sort coercions.

use rug::{Integer, Rational};
use smt_bridge::{
    ast::{Constant, PrimOp, Rc, Sort, SortKind, Term},
    backends::reference::ReferenceBackend,
    solver::LoggingSolver,
    translate::TermTranslator,
    Error,
};

fn solver() -> LoggingSolver {
    LoggingSolver::new(Box::new(ReferenceBackend::new()))
}

/// Compares two terms from different solvers by structure: operator,
/// sort, symbol names, values, and children, recursively.
fn structurally_equal(a: &Rc<Term>, b: &Rc<Term>) -> bool {
    a.op() == b.op()
        && a.sort() == b.sort()
        && a.symbol() == b.symbol()
        && a.value() == b.value()
        && a.children().len() == b.children().len()
        && a.children()
            .iter()
            .zip(b.children())
            .all(|(x, y)| structurally_equal(x, y))
}

#[test]
fn round_trip_into_the_same_solver() {
    let mut s = solver();
    let bv4 = s.bv_sort(4).unwrap();
    let x = s.make_symbol("x", &bv4).unwrap();
    let p = s.make_symbol("p", &Sort::Bool).unwrap();
    let f_sort = s.function_sort(vec![bv4.clone()], Sort::BitVec(4)).unwrap();
    let f = s.make_symbol("f", &f_sort).unwrap();

    let fx = s.make_term(PrimOp::Apply, vec![f.clone(), x.clone()]).unwrap();
    let sum = s.make_term(PrimOp::BvAdd, vec![x.clone(), fx]).unwrap();
    let ite = s.make_term(PrimOp::Ite, vec![p.clone(), sum, x.clone()]).unwrap();

    let mut translator = TermTranslator::new(&mut s);
    for symbol in [&x, &p, &f] {
        translator
            .cache_mut()
            .insert(Rc::clone(symbol), Rc::clone(symbol));
    }
    let transferred = translator.transfer_term(&ite).unwrap();

    // hash-consing makes the identity round-trip literal: the transferred
    // term is the original
    assert_eq!(transferred, ite);
}

#[test]
fn translation_into_a_fresh_solver() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::BitVec(4)).unwrap();
    let v = a.make_value(Constant::new_bitvec(3, 4)).unwrap();
    let sum = a.make_term(PrimOp::BvAdd, vec![x, v]).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term(&sum).unwrap();
    assert!(structurally_equal(&transferred, &sum));
    drop(translator);

    // the symbol was declared exactly once in the destination
    assert!(b.get_symbol("x").is_some());
    let err = b.make_symbol("x", &Sort::BitVec(4)).unwrap_err();
    assert!(matches!(err, Error::IncorrectUsage(_)));
}

#[test]
fn translation_is_cached() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::Int).unwrap();
    let sum = a.make_term(PrimOp::Add, vec![x.clone(), x]).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let first = translator.transfer_term(&sum).unwrap();
    let count = translator.solver().term_count();
    let second = translator.transfer_term(&sum).unwrap();

    // identical destination terms, and no new destination terms were built
    assert_eq!(first, second);
    assert_eq!(translator.solver().term_count(), count);
}

#[test]
fn pre_populated_symbols_are_not_redeclared() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::BitVec(8)).unwrap();
    let not_x = a.make_term(PrimOp::BvNot, vec![x.clone()]).unwrap();

    let mut b = solver();
    let y = b.make_symbol("y", &Sort::BitVec(8)).unwrap();
    let mut translator = TermTranslator::new(&mut b);
    translator.cache_mut().insert(x, y);
    let transferred = translator.transfer_term(&not_x).unwrap();
    assert_eq!(transferred.children()[0].symbol(), Some("y"));
}

#[test]
fn bool_connective_over_bv1_symbols_casts_the_arguments() {
    // the source world has boolean symbols; in the destination the same
    // names are width-one bit-vectors
    let mut a = solver();
    let p = a.make_symbol("p", &Sort::Bool).unwrap();
    let q = a.make_symbol("q", &Sort::Bool).unwrap();
    let conj = a.make_term(PrimOp::And, vec![p.clone(), q.clone()]).unwrap();

    let mut b = solver();
    let p_bv = b.make_symbol("p", &Sort::BitVec(1)).unwrap();
    let q_bv = b.make_symbol("q", &Sort::BitVec(1)).unwrap();
    let mut translator = TermTranslator::new(&mut b);
    translator.cache_mut().insert(p, p_bv);
    translator.cache_mut().insert(q, q_bv);

    let transferred = translator.transfer_term(&conj).unwrap();
    assert_eq!(*transferred.sort(), Sort::Bool);
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::And));
    for child in transferred.children() {
        // each argument was lifted to Bool with an equality against #b1
        assert_eq!(child.op().map(|op| op.prim), Some(PrimOp::Equals));
        assert_eq!(*child.sort(), Sort::Bool);
    }
}

#[test]
fn bv_operator_over_booleans_switches_to_the_sibling() {
    let mut a = solver();
    let p = a.make_symbol("p", &Sort::BitVec(1)).unwrap();
    let q = a.make_symbol("q", &Sort::BitVec(1)).unwrap();
    let conj = a.make_term(PrimOp::BvAnd, vec![p.clone(), q.clone()]).unwrap();

    let mut b = solver();
    let p_bool = b.make_symbol("p", &Sort::Bool).unwrap();
    let q_bool = b.make_symbol("q", &Sort::Bool).unwrap();
    let mut translator = TermTranslator::new(&mut b);
    translator.cache_mut().insert(p, p_bool);
    translator.cache_mut().insert(q, q_bool);

    let transferred = translator.transfer_term(&conj).unwrap();
    // `bvand` over booleans becomes `and`, with the arguments untouched
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::And));
    assert_eq!(*transferred.sort(), Sort::Bool);
    assert_eq!(transferred.children()[0].symbol(), Some("p"));
}

#[test]
fn transfer_with_a_requested_kind_casts_the_result() {
    let mut a = solver();
    let p = a.make_symbol("p", &Sort::Bool).unwrap();
    let q = a.make_symbol("q", &Sort::Bool).unwrap();
    let conj = a.make_term(PrimOp::And, vec![p, q]).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term_as(&conj, SortKind::BitVec).unwrap();

    // a non-value boolean is cast with `ite` over the two width-one values
    assert_eq!(*transferred.sort(), Sort::BitVec(1));
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::Ite));
    assert_eq!(
        transferred.children()[1].value(),
        Some(&Constant::new_bitvec(1, 1))
    );
    assert_eq!(
        transferred.children()[2].value(),
        Some(&Constant::new_bitvec(0, 1))
    );
}

#[test]
fn boolean_values_cast_directly() {
    let mut a = solver();
    let t = a.make_value(Constant::Bool(true)).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term_as(&t, SortKind::BitVec).unwrap();
    assert_eq!(transferred.value(), Some(&Constant::new_bitvec(1, 1)));

    let f = a.make_value(Constant::Bool(false)).unwrap();
    let transferred = translator.transfer_term_as(&f, SortKind::BitVec).unwrap();
    assert_eq!(transferred.value(), Some(&Constant::new_bitvec(0, 1)));
}

#[test]
fn mixed_arithmetic_lifts_integers_to_real() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::Int).unwrap();
    let one = a.make_value(Constant::Integer(Integer::from(1))).unwrap();
    let sum = a.make_term(PrimOp::Add, vec![x.clone(), one]).unwrap();

    let mut b = solver();
    let x_real = b.make_symbol("x", &Sort::Real).unwrap();
    let mut translator = TermTranslator::new(&mut b);
    translator.cache_mut().insert(x, x_real);

    let transferred = translator.transfer_term(&sum).unwrap();
    assert_eq!(*transferred.sort(), Sort::Real);
    assert_eq!(transferred.children()[0].symbol(), Some("x"));
    // the integer literal was converted, not wrapped
    assert_eq!(
        transferred.children()[1].value(),
        Some(&Constant::Real(Rational::from(1)))
    );
}

#[test]
fn int_terms_cast_to_real_with_to_real() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::Int).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term_as(&x, SortKind::Real).unwrap();
    assert_eq!(*transferred.sort(), Sort::Real);
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::ToReal));
}

#[test]
fn deep_terms_translate_iteratively() {
    // the translator walks a worklist instead of the call stack, so a chain
    // of a few thousand nested applications must go through
    let mut a = solver();
    let mut t = a.make_symbol("p", &Sort::Bool).unwrap();
    for _ in 0..5_000 {
        t = a.make_term(PrimOp::Not, vec![t]).unwrap();
    }

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term(&t).unwrap();
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::Not));
    assert_eq!(translator.solver().term_count(), 5_001);
}

#[test]
fn fractional_real_values_cast_to_int_with_to_int() {
    let mut a = solver();
    let half = a
        .make_value(Constant::Real(Rational::from((3, 2))))
        .unwrap();

    // 3/2 has no exact integer form, so it is wrapped instead of converted
    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term_as(&half, SortKind::Int).unwrap();
    assert_eq!(*transferred.sort(), Sort::Int);
    assert_eq!(transferred.op().map(|op| op.prim), Some(PrimOp::ToInt));
}

#[test]
fn transfer_sort_declares_uninterpreted_sorts() {
    let mut a = solver();
    let u = a.uninterpreted_sort("U", 0).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_sort(&u).unwrap();
    assert_eq!(transferred, u);
    drop(translator);

    // the destination can now declare symbols of that sort
    b.make_symbol("u0", &transferred).unwrap();
}

#[test]
fn const_arrays_transfer_through_their_base() {
    let mut a = solver();
    let arr_sort = a.array_sort(Sort::BitVec(4), Sort::BitVec(8)).unwrap();
    let base = a.make_value(Constant::new_bitvec(9, 8)).unwrap();
    let arr = a.make_const_array(&arr_sort, &base).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    let transferred = translator.transfer_term(&arr).unwrap();
    assert!(transferred.is_const_array());
    assert_eq!(transferred.sort(), arr.sort());
    assert_eq!(
        transferred.children()[0].value(),
        Some(&Constant::new_bitvec(9, 8))
    );
}

#[test]
fn unsupported_casts_fail_as_not_implemented() {
    let mut a = solver();
    let x = a.make_symbol("x", &Sort::BitVec(4)).unwrap();
    let arr_sort = a.array_sort(Sort::BitVec(4), Sort::BitVec(8)).unwrap();
    let arr = a.make_symbol("a", &arr_sort).unwrap();

    let mut b = solver();
    let mut translator = TermTranslator::new(&mut b);
    // only width-one bit-vectors convert to Bool
    let err = translator.transfer_term_as(&x, SortKind::Bool).unwrap_err();
    assert!(matches!(err, Error::NotImplemented(_)));
    let err = translator.transfer_term_as(&arr, SortKind::Int).unwrap_err();
    assert!(matches!(err, Error::NotImplemented(_)));
}
