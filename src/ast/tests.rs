use super::*;
use crate::backend::BackendTerm;
use rug::{Integer, Rational};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn value_leaf(value: Constant) -> Term {
    Term {
        backend: BackendTerm::new(()),
        sort: value.sort(),
        op: None,
        children: Vec::new(),
        symbol: None,
        value: Some(value),
        is_value: true,
        tag: SolverTag { solver: 0, epoch: 0 },
    }
}

#[test]
fn sorts_are_structural() {
    let a = Sort::BitVec(4);
    let b = Sort::BitVec(4);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(Sort::BitVec(4), Sort::BitVec(8));

    let arr_1 = Sort::Array(Box::new(Sort::BitVec(4)), Box::new(Sort::Bool));
    let arr_2 = Sort::Array(Box::new(Sort::BitVec(4)), Box::new(Sort::Bool));
    assert_eq!(arr_1, arr_2);
    assert_eq!(hash_of(&arr_1), hash_of(&arr_2));

    let fun_1 = Sort::Function {
        domain: vec![Sort::Int, Sort::Int],
        codomain: Box::new(Sort::Bool),
    };
    let fun_2 = Sort::Function {
        domain: vec![Sort::Int, Sort::Int],
        codomain: Box::new(Sort::Bool),
    };
    assert_eq!(fun_1, fun_2);
    assert_eq!(hash_of(&fun_1), hash_of(&fun_2));
    assert_eq!(fun_1.domain(), Some(&[Sort::Int, Sort::Int][..]));
    assert_eq!(fun_1.codomain(), Some(&Sort::Bool));

    assert_eq!(arr_1.kind(), SortKind::Array);
    assert_eq!(arr_1.index_sort(), Some(&Sort::BitVec(4)));
    assert_eq!(arr_1.elem_sort(), Some(&Sort::Bool));
    assert_eq!(Sort::BitVec(7).width(), Some(7));
}

#[test]
fn sort_kind_to_string() {
    assert_eq!(SortKind::Array.to_string(), "ARRAY");
    assert_eq!(SortKind::Bool.to_string(), "BOOL");
    assert_eq!(SortKind::BitVec.to_string(), "BV");
    assert_eq!(SortKind::Int.to_string(), "INT");
    assert_eq!(SortKind::Real.to_string(), "REAL");
    assert_eq!(SortKind::Function.to_string(), "FUNCTION");
    assert_eq!(SortKind::Uninterpreted.to_string(), "UNINTERPRETED");
}

#[test]
fn op_display() {
    assert_eq!(Op::new(PrimOp::BvAdd).to_string(), "bvadd");
    assert_eq!(Op::extract(3, 1).to_string(), "(_ extract 3 1)");
    assert_eq!(Op::zero_extend(8).to_string(), "(_ zero_extend 8)");
    assert_eq!(Op::new(PrimOp::Implies).to_string(), "=>");
}

#[test]
fn op_arities() {
    assert!(PrimOp::Not.arity().contains(1));
    assert!(!PrimOp::Not.arity().contains(2));
    assert!(PrimOp::And.arity().contains(17));
    assert!(!PrimOp::And.arity().contains(1));
    assert!(PrimOp::Ite.arity().contains(3));
    assert!(!PrimOp::Ite.arity().contains(2));
}

#[test]
fn constants_canonicalise_across_radices() {
    let sort = Sort::BitVec(8);
    let binary = Constant::from_smt2("#b00101010", &sort).unwrap();
    let hex = Constant::from_smt2("#x2a", &sort).unwrap();
    let decimal = Constant::from_smt2("(_ bv42 8)", &sort).unwrap();
    assert_eq!(binary, hex);
    assert_eq!(binary, decimal);
    assert_eq!(hash_of(&binary), hash_of(&hex));
    assert_eq!(binary.to_string(), "#b00101010");

    // the payload is truncated to the width
    assert_eq!(
        Constant::new_bitvec(Integer::from(256 + 42), 8),
        Constant::new_bitvec(42, 8)
    );
    // negative payloads wrap to their two's complement bits
    assert_eq!(
        Constant::new_bitvec(Integer::from(-1), 4),
        Constant::new_bitvec(15, 4)
    );
}

#[test]
fn parsing_values() {
    assert_eq!(
        Constant::from_smt2("true", &Sort::Bool).unwrap(),
        Constant::Bool(true)
    );
    assert_eq!(
        Constant::from_smt2("-5", &Sort::Int).unwrap(),
        Constant::Integer(Integer::from(-5))
    );
    assert_eq!(
        Constant::from_smt2("(- 5)", &Sort::Int).unwrap(),
        Constant::Integer(Integer::from(-5))
    );
    assert_eq!(
        Constant::from_smt2("5.25", &Sort::Real).unwrap(),
        Constant::Real(Rational::from((21, 4)))
    );
    assert_eq!(
        Constant::from_smt2("(/ 1 3)", &Sort::Real).unwrap(),
        Constant::Real(Rational::from((1, 3)))
    );
    assert_eq!(
        Constant::from_smt2("(- (/ 1 3))", &Sort::Real).unwrap(),
        Constant::Real(Rational::from((-1, 3)))
    );
    assert_eq!(
        Constant::from_smt2("(/ (- 1) 3)", &Sort::Real).unwrap(),
        Constant::Real(Rational::from((-1, 3)))
    );
    assert_eq!(
        Constant::from_smt2("7", &Sort::Real).unwrap(),
        Constant::Real(Rational::from(7))
    );

    assert!(Constant::from_smt2("maybe", &Sort::Bool).is_err());
    assert!(Constant::from_smt2("#b101", &Sort::BitVec(4)).is_err());
    assert!(Constant::from_smt2("(_ bv5 8)", &Sort::BitVec(4)).is_err());
}

#[test]
fn printing_values() {
    assert_eq!(Constant::Bool(false).to_string(), "false");
    assert_eq!(Constant::Integer(Integer::from(17)).to_string(), "17");
    assert_eq!(Constant::Integer(Integer::from(-17)).to_string(), "(- 17)");
    assert_eq!(Constant::Real(Rational::from(2)).to_string(), "2.0");
    assert_eq!(Constant::Real(Rational::from((1, 3))).to_string(), "(/ 1 3)");
    assert_eq!(
        Constant::Real(Rational::from((-1, 3))).to_string(),
        "(- (/ 1 3))"
    );
    assert_eq!(Constant::new_bitvec(5, 4).to_string(), "#b0101");

    // printing and parsing are inverses on the canonical forms
    for c in [
        Constant::Bool(true),
        Constant::Integer(Integer::from(-42)),
        Constant::Real(Rational::from((7, 2))),
        Constant::new_bitvec(0b1011, 6),
    ] {
        assert_eq!(Constant::from_smt2(&c.to_string(), &c.sort()).unwrap(), c);
    }
}

#[test]
fn storage_interns_structurally_equal_terms() {
    let mut storage = TermStorage::new();
    let a = storage.lookup_or_insert(value_leaf(Constant::new_bitvec(3, 4)));
    let b = storage.lookup_or_insert(value_leaf(Constant::new_bitvec(3, 4)));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(storage.len(), 1);

    // a different value is a different term
    let c = storage.lookup_or_insert(value_leaf(Constant::new_bitvec(7, 4)));
    assert_ne!(a, c);
    assert_eq!(storage.len(), 2);

    storage.clear();
    assert!(storage.is_empty());
    // the old references stay alive after a clear
    assert_eq!(a.value(), Some(&Constant::new_bitvec(3, 4)));
}

#[test]
fn terms_compare_by_reference() {
    let mut storage = TermStorage::new();
    let a = storage.lookup_or_insert(value_leaf(Constant::Bool(true)));

    // an equal term allocated outside the storage is a different reference
    // SAFETY: the term is only used to demonstrate reference equality
    let rogue = unsafe { Rc::new_raw(value_leaf(Constant::Bool(true))) };
    assert_eq!(a.as_ref(), rogue.as_ref());
    assert_ne!(a, rogue);
}
