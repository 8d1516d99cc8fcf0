//! Primitive operators and the indexed operators built from them.

use crate::utils::Range;
use std::fmt;

/// A primitive operator, drawn from a closed enumeration.
///
/// Operators that take extra integer parameters (`extract`, `zero_extend`,
/// ...) are applied through an [`Op`], which carries the indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimOp {
    // Logic
    /// The `not` operator.
    Not,

    /// The `=>` operator.
    Implies,

    /// The `and` operator.
    And,

    /// The `or` operator.
    Or,

    /// The `xor` operator.
    Xor,

    /// The `iff` operator. On booleans this is the same as `=`, but some
    /// engines keep it as a distinct primitive.
    Iff,

    /// The `=` operator.
    Equals,

    /// The `distinct` operator.
    Distinct,

    /// The `ite` operator.
    Ite,

    /// Application of an uninterpreted function to one or more terms.
    Apply,

    // Arithmetic
    /// The `+` operator.
    Add,

    /// The binary `-` operator.
    Sub,

    /// The unary `-` operator.
    Neg,

    /// The `*` operator.
    Mult,

    /// The `/` operator, over two integers or two reals.
    Div,

    /// The `div` operator (integer division).
    IntDiv,

    /// The `mod` operator.
    Mod,

    /// The `abs` operator.
    Abs,

    /// The `^` operator.
    Pow,

    /// The `<` operator.
    LessThan,

    /// The `<=` operator.
    LessEq,

    /// The `>` operator.
    GreaterThan,

    /// The `>=` operator.
    GreaterEq,

    /// The `to_real` operator.
    ToReal,

    /// The `to_int` operator.
    ToInt,

    /// The `is_int` operator.
    IsInt,

    // Arrays
    /// The `select` operator.
    Select,

    /// The `store` operator.
    Store,

    // Bit-vectors (unary)
    BvNot,
    BvNeg,
    // Bit-vectors (n-ary, left-assoc)
    BvAnd,
    BvOr,
    BvXor,
    BvAdd,
    BvMul,
    Concat,
    // Bit-vectors (binary)
    BvNand,
    BvNor,
    BvXnor,
    BvSub,
    BvUDiv,
    BvSDiv,
    BvURem,
    BvSRem,
    BvSMod,
    BvShl,
    BvAShr,
    BvLShr,
    BvComp,
    BvULt,
    BvULe,
    BvUGt,
    BvUGe,
    BvSLt,
    BvSLe,
    BvSGt,
    BvSGe,
    // Bit-vectors (indexed)
    Extract,
    ZeroExtend,
    SignExtend,
    Repeat,
    RotateLeft,
    RotateRight,
    // Conversions
    BvToNat,
    IntToBv,
}

impl PrimOp {
    /// The SMT-LIB surface name of the operator.
    pub fn smtlib_name(self) -> &'static str {
        match self {
            PrimOp::Not => "not",
            PrimOp::Implies => "=>",
            PrimOp::And => "and",
            PrimOp::Or => "or",
            PrimOp::Xor => "xor",
            PrimOp::Iff => "iff",
            PrimOp::Equals => "=",
            PrimOp::Distinct => "distinct",
            PrimOp::Ite => "ite",
            PrimOp::Apply => "apply",
            PrimOp::Add => "+",
            PrimOp::Sub | PrimOp::Neg => "-",
            PrimOp::Mult => "*",
            PrimOp::Div => "/",
            PrimOp::IntDiv => "div",
            PrimOp::Mod => "mod",
            PrimOp::Abs => "abs",
            PrimOp::Pow => "^",
            PrimOp::LessThan => "<",
            PrimOp::LessEq => "<=",
            PrimOp::GreaterThan => ">",
            PrimOp::GreaterEq => ">=",
            PrimOp::ToReal => "to_real",
            PrimOp::ToInt => "to_int",
            PrimOp::IsInt => "is_int",
            PrimOp::Select => "select",
            PrimOp::Store => "store",
            PrimOp::BvNot => "bvnot",
            PrimOp::BvNeg => "bvneg",
            PrimOp::BvAnd => "bvand",
            PrimOp::BvOr => "bvor",
            PrimOp::BvXor => "bvxor",
            PrimOp::BvAdd => "bvadd",
            PrimOp::BvMul => "bvmul",
            PrimOp::Concat => "concat",
            PrimOp::BvNand => "bvnand",
            PrimOp::BvNor => "bvnor",
            PrimOp::BvXnor => "bvxnor",
            PrimOp::BvSub => "bvsub",
            PrimOp::BvUDiv => "bvudiv",
            PrimOp::BvSDiv => "bvsdiv",
            PrimOp::BvURem => "bvurem",
            PrimOp::BvSRem => "bvsrem",
            PrimOp::BvSMod => "bvsmod",
            PrimOp::BvShl => "bvshl",
            PrimOp::BvAShr => "bvashr",
            PrimOp::BvLShr => "bvlshr",
            PrimOp::BvComp => "bvcomp",
            PrimOp::BvULt => "bvult",
            PrimOp::BvULe => "bvule",
            PrimOp::BvUGt => "bvugt",
            PrimOp::BvUGe => "bvuge",
            PrimOp::BvSLt => "bvslt",
            PrimOp::BvSLe => "bvsle",
            PrimOp::BvSGt => "bvsgt",
            PrimOp::BvSGe => "bvsge",
            PrimOp::Extract => "extract",
            PrimOp::ZeroExtend => "zero_extend",
            PrimOp::SignExtend => "sign_extend",
            PrimOp::Repeat => "repeat",
            PrimOp::RotateLeft => "rotate_left",
            PrimOp::RotateRight => "rotate_right",
            PrimOp::BvToNat => "bv2nat",
            PrimOp::IntToBv => "int2bv",
        }
    }

    /// The number of integer indices this operator expects.
    pub fn num_indices(self) -> usize {
        match self {
            PrimOp::Extract => 2,
            PrimOp::ZeroExtend
            | PrimOp::SignExtend
            | PrimOp::Repeat
            | PrimOp::RotateLeft
            | PrimOp::RotateRight
            | PrimOp::IntToBv => 1,
            _ => 0,
        }
    }

    /// The closed arity bounds of the operator. The maximum is absent for
    /// the associative operators and for `Apply`, whose arity is bounded
    /// only by the function sort it is applied to.
    pub fn arity(self) -> Range {
        match self {
            PrimOp::Not
            | PrimOp::Neg
            | PrimOp::Abs
            | PrimOp::ToReal
            | PrimOp::ToInt
            | PrimOp::IsInt
            | PrimOp::BvNot
            | PrimOp::BvNeg
            | PrimOp::Extract
            | PrimOp::ZeroExtend
            | PrimOp::SignExtend
            | PrimOp::Repeat
            | PrimOp::RotateLeft
            | PrimOp::RotateRight
            | PrimOp::BvToNat
            | PrimOp::IntToBv => 1.into(),

            PrimOp::Ite | PrimOp::Store => 3.into(),

            PrimOp::And
            | PrimOp::Or
            | PrimOp::Add
            | PrimOp::Mult
            | PrimOp::BvAnd
            | PrimOp::BvOr
            | PrimOp::BvXor
            | PrimOp::BvAdd
            | PrimOp::BvMul
            | PrimOp::Concat
            | PrimOp::Apply => (2..).into(),

            _ => 2.into(),
        }
    }
}

impl fmt::Display for PrimOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.smtlib_name())
    }
}

/// An operator: a primitive together with zero or more integer indices.
///
/// Most operators carry no indices. The exceptions are the indexed
/// bit-vector operators, written `(_ name i ...)` in SMT-LIB, e.g.
/// `(_ extract 3 1)` or `(_ zero_extend 8)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Op {
    pub prim: PrimOp,
    pub indices: Vec<u64>,
}

impl Op {
    pub fn new(prim: PrimOp) -> Self {
        Op { prim, indices: Vec::new() }
    }

    pub fn indexed(prim: PrimOp, indices: impl Into<Vec<u64>>) -> Self {
        Op { prim, indices: indices.into() }
    }

    /// The `(_ extract hi lo)` operator.
    pub fn extract(hi: u64, lo: u64) -> Self {
        Self::indexed(PrimOp::Extract, [hi, lo])
    }

    /// The `(_ zero_extend n)` operator.
    pub fn zero_extend(n: u64) -> Self {
        Self::indexed(PrimOp::ZeroExtend, [n])
    }

    /// The `(_ sign_extend n)` operator.
    pub fn sign_extend(n: u64) -> Self {
        Self::indexed(PrimOp::SignExtend, [n])
    }

    /// The `(_ repeat n)` operator.
    pub fn repeat(n: u64) -> Self {
        Self::indexed(PrimOp::Repeat, [n])
    }

    /// The `(_ rotate_left n)` operator.
    pub fn rotate_left(n: u64) -> Self {
        Self::indexed(PrimOp::RotateLeft, [n])
    }

    /// The `(_ rotate_right n)` operator.
    pub fn rotate_right(n: u64) -> Self {
        Self::indexed(PrimOp::RotateRight, [n])
    }

    /// The `(_ int2bv n)` operator.
    pub fn int_to_bv(n: u64) -> Self {
        Self::indexed(PrimOp::IntToBv, [n])
    }
}

impl From<PrimOp> for Op {
    fn from(prim: PrimOp) -> Self {
        Op::new(prim)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.indices.is_empty() {
            write!(f, "{}", self.prim)
        } else {
            write!(f, "(_ {}", self.prim)?;
            for i in &self.indices {
                write!(f, " {}", i)?;
            }
            write!(f, ")")
        }
    }
}
