//! A reference backend: structural terms, no simplification, and a ground
//! evaluator that decides satisfiability only when the asserted formulas
//! evaluate to `true` under the all-default model.

use crate::{
    ast::{Constant, Op, PrimOp, Sort},
    backend::{Backend, BackendSort, BackendTerm, SatResult},
    Error, SmtResult,
};
use ahash::AHashMap;
use num_traits::Zero;
use rug::{ops::Pow, Integer, Rational};
use std::rc::Rc;

/// The backend's private term representation. Deliberately different from
/// the logging layer's [`crate::ast::Term`], so the core's opacity
/// assumptions are exercised for real.
#[derive(Debug)]
enum Node {
    Value(Value),
    Symbol(String, Sort),
    ConstArray(Sort, Rc<Node>),
    App(Op, Vec<Rc<Node>>),
}

/// A ground value computed by the evaluator.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Bool(bool),
    Integer(Integer),
    Real(Rational),
    BitVec(Integer, u64),
    Array(ArrayValue),
}

/// An array value: a default element plus a finite set of writes.
#[derive(Debug, Clone, PartialEq)]
struct ArrayValue {
    default: Box<Value>,
    writes: Vec<(Value, Value)>,
}

impl Value {
    fn from_constant(c: &Constant) -> Self {
        match c {
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Integer(i) => Value::Integer(i.clone()),
            Constant::Real(r) => Value::Real(r.clone()),
            Constant::BitVec(v, w) => Value::BitVec(v.clone(), *w),
        }
    }

    fn to_constant(&self) -> Option<Constant> {
        match self {
            Value::Bool(b) => Some(Constant::Bool(*b)),
            Value::Integer(i) => Some(Constant::Integer(i.clone())),
            Value::Real(r) => Some(Constant::Real(r.clone())),
            Value::BitVec(v, w) => Some(Constant::new_bitvec(v.clone(), *w)),
            Value::Array(_) => None,
        }
    }

    /// Constructs a bit-vector value, truncating `value` to `width` bits
    /// and ensuring it is non-negative.
    fn new_bitvec(value: Integer, width: u64) -> Self {
        Value::BitVec(value.keep_bits(width as u32), width)
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<&Integer> {
        match self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    fn as_real(&self) -> Option<Rational> {
        match self {
            Value::Real(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// The bits of a bit-vector value, as an unsigned integer.
    fn as_bitvec(&self) -> Option<(&Integer, u64)> {
        match self {
            Value::BitVec(v, w) => Some((v, *w)),
            _ => None,
        }
    }

    /// The bits of a bit-vector value, interpreted as a two's complement
    /// signed integer.
    fn as_signed_bitvec(&self) -> Option<(Integer, u64)> {
        let (v, w) = self.as_bitvec()?;
        let value = if v.get_bit((w - 1) as u32) {
            v.clone() - (Integer::from(1) << w as u32)
        } else {
            v.clone()
        };
        Some((value, w))
    }
}

/// An in-process backend over [`Node`] terms.
///
/// Construction is structural and simplification-free. `check_sat`
/// evaluates the asserted frames under the model that maps every symbol to
/// its sort's default value (`false`, zero, or a zero-filled array): if all
/// assertions evaluate to `true` that model is a witness and the result is
/// `Sat`; in every other case the backend answers `Unknown`. It is not a
/// solver, and never claims `Unsat`.
pub struct ReferenceBackend {
    symbols: AHashMap<String, Rc<Node>>,
    frames: Vec<Vec<Rc<Node>>>,
    options: AHashMap<String, String>,
    logic: Option<String>,
    model_ready: bool,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        ReferenceBackend {
            symbols: AHashMap::new(),
            frames: vec![Vec::new()],
            options: AHashMap::new(),
            logic: None,
            model_ready: false,
        }
    }

    /// The logic selected with `set_logic`, if any.
    pub fn logic(&self) -> Option<&str> {
        self.logic.as_deref()
    }

    /// The value of an option previously forwarded with `set_opt`.
    pub fn get_opt(&self, option: &str) -> Option<&str> {
        self.options.get(option).map(String::as_str)
    }

    fn node(t: &BackendTerm) -> SmtResult<&Rc<Node>> {
        t.downcast::<Rc<Node>>()
    }

    fn sort(s: &BackendSort) -> SmtResult<&Sort> {
        s.downcast::<Sort>()
    }

    fn wrap(node: Node) -> BackendTerm {
        BackendTerm::new(Rc::new(node))
    }

    fn assertions(&self) -> impl Iterator<Item = &Rc<Node>> {
        self.frames.iter().flatten()
    }
}

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ReferenceBackend {
    fn name(&self) -> &str {
        "reference"
    }

    fn set_opt(&mut self, option: &str, value: &str) -> SmtResult<()> {
        self.options.insert(option.to_owned(), value.to_owned());
        Ok(())
    }

    fn set_logic(&mut self, logic: &str) -> SmtResult<()> {
        self.logic = Some(logic.to_owned());
        Ok(())
    }

    fn make_bool_sort(&mut self) -> SmtResult<BackendSort> {
        Ok(BackendSort::new(Sort::Bool))
    }

    fn make_int_sort(&mut self) -> SmtResult<BackendSort> {
        Ok(BackendSort::new(Sort::Int))
    }

    fn make_real_sort(&mut self) -> SmtResult<BackendSort> {
        Ok(BackendSort::new(Sort::Real))
    }

    fn make_bv_sort(&mut self, width: u64) -> SmtResult<BackendSort> {
        Ok(BackendSort::new(Sort::BitVec(width)))
    }

    fn make_array_sort(
        &mut self,
        index: &BackendSort,
        element: &BackendSort,
    ) -> SmtResult<BackendSort> {
        let index = Self::sort(index)?.clone();
        let element = Self::sort(element)?.clone();
        Ok(BackendSort::new(Sort::Array(
            Box::new(index),
            Box::new(element),
        )))
    }

    fn make_function_sort(
        &mut self,
        domain: &[BackendSort],
        codomain: &BackendSort,
    ) -> SmtResult<BackendSort> {
        let domain = domain
            .iter()
            .map(|s| Self::sort(s).cloned())
            .collect::<SmtResult<Vec<_>>>()?;
        let codomain = Self::sort(codomain)?.clone();
        Ok(BackendSort::new(Sort::Function {
            domain,
            codomain: Box::new(codomain),
        }))
    }

    fn make_uninterpreted_sort(&mut self, name: &str, arity: u64) -> SmtResult<BackendSort> {
        let sort = if arity == 0 {
            Sort::Uninterpreted(name.to_owned())
        } else {
            Sort::UninterpretedCons(name.to_owned(), arity)
        };
        Ok(BackendSort::new(sort))
    }

    fn apply_sort_constructor(
        &mut self,
        cons: &BackendSort,
        params: &[BackendSort],
    ) -> SmtResult<BackendSort> {
        let cons = Self::sort(cons)?;
        if !matches!(cons, Sort::UninterpretedCons(_, _)) {
            return Err(Error::Backend(format!(
                "'{}' is not a sort constructor",
                cons
            )));
        }
        let params = params
            .iter()
            .map(|s| Self::sort(s).cloned())
            .collect::<SmtResult<Vec<_>>>()?;
        Ok(BackendSort::new(Sort::UninterpretedApplied(
            Box::new(cons.clone()),
            params,
        )))
    }

    fn make_value(&mut self, value: &Constant) -> SmtResult<BackendTerm> {
        Ok(Self::wrap(Node::Value(Value::from_constant(value))))
    }

    fn make_const_array(
        &mut self,
        sort: &BackendSort,
        base: &BackendTerm,
    ) -> SmtResult<BackendTerm> {
        let sort = Self::sort(sort)?;
        if sort.elem_sort().is_none() {
            return Err(Error::Backend(format!(
                "constant arrays require an array sort, got '{}'",
                sort
            )));
        }
        let base = Self::node(base)?;
        let node = match base.as_ref() {
            // a constant array over a known value is itself a value
            Node::Value(v) => Node::Value(Value::Array(ArrayValue {
                default: Box::new(v.clone()),
                writes: Vec::new(),
            })),
            _ => Node::ConstArray(sort.clone(), base.clone()),
        };
        Ok(Self::wrap(node))
    }

    fn make_symbol(&mut self, name: &str, sort: &BackendSort) -> SmtResult<BackendTerm> {
        if self.symbols.contains_key(name) {
            return Err(Error::Backend(format!(
                "symbol '{}' is already declared",
                name
            )));
        }
        let sort = Self::sort(sort)?.clone();
        let node = Rc::new(Node::Symbol(name.to_owned(), sort));
        self.symbols.insert(name.to_owned(), node.clone());
        Ok(BackendTerm::new(node))
    }

    fn make_term(&mut self, op: &Op, args: &[BackendTerm]) -> SmtResult<BackendTerm> {
        let args = args
            .iter()
            .map(|t| Self::node(t).cloned())
            .collect::<SmtResult<Vec<_>>>()?;
        Ok(Self::wrap(Node::App(op.clone(), args)))
    }

    fn assert_formula(&mut self, t: &BackendTerm) -> SmtResult<()> {
        let node = Self::node(t)?.clone();
        self.model_ready = false;
        self.frames
            .last_mut()
            .expect("the frame stack is never empty")
            .push(node);
        Ok(())
    }

    fn check_sat(&mut self) -> SmtResult<SatResult> {
        self.check_with_assumptions(&[])
    }

    fn check_sat_assuming(&mut self, assumptions: &[BackendTerm]) -> SmtResult<SatResult> {
        let assumptions = assumptions
            .iter()
            .map(|t| Self::node(t).cloned())
            .collect::<SmtResult<Vec<_>>>()?;
        self.check_with_assumptions(&assumptions)
    }

    fn push(&mut self, levels: u64) -> SmtResult<()> {
        self.model_ready = false;
        for _ in 0..levels {
            self.frames.push(Vec::new());
        }
        Ok(())
    }

    fn pop(&mut self, levels: u64) -> SmtResult<()> {
        if levels as usize >= self.frames.len() {
            return Err(Error::Backend(format!(
                "cannot pop {} levels, only {} were pushed",
                levels,
                self.frames.len() - 1
            )));
        }
        self.model_ready = false;
        for _ in 0..levels {
            self.frames.pop();
        }
        Ok(())
    }

    fn get_value(&mut self, t: &BackendTerm) -> SmtResult<BackendTerm> {
        if !self.model_ready {
            return Err(Error::Backend(
                "no model is available; get-value must follow a sat result".to_owned(),
            ));
        }
        let node = Self::node(t)?;
        match eval(node) {
            Some(value) => Ok(Self::wrap(Node::Value(value))),
            None => Err(Error::Backend(
                "the term cannot be evaluated under the current model".to_owned(),
            )),
        }
    }

    fn get_array_values(
        &mut self,
        arr: &BackendTerm,
    ) -> SmtResult<(Vec<(BackendTerm, BackendTerm)>, Option<BackendTerm>)> {
        if !self.model_ready {
            return Err(Error::Backend(
                "no model is available; get-value must follow a sat result".to_owned(),
            ));
        }
        let node = Self::node(arr)?;
        let Some(Value::Array(array)) = eval(node) else {
            return Err(Error::Backend(
                "the term does not evaluate to an array value".to_owned(),
            ));
        };
        let pairs = array
            .writes
            .into_iter()
            .map(|(k, v)| (Self::wrap(Node::Value(k)), Self::wrap(Node::Value(v))))
            .collect();
        let base = Self::wrap(Node::Value(*array.default));
        Ok((pairs, Some(base)))
    }

    fn is_value(&self, t: &BackendTerm) -> SmtResult<bool> {
        Ok(matches!(Self::node(t)?.as_ref(), Node::Value(_)))
    }

    fn value_to_smt2(&self, t: &BackendTerm) -> SmtResult<String> {
        match Self::node(t)?.as_ref() {
            Node::Value(v) => match v.to_constant() {
                Some(c) => Ok(c.to_string()),
                None => Err(Error::NotImplemented(
                    "printing an array value".to_owned(),
                )),
            },
            _ => Err(Error::IncorrectUsage(
                "value_to_smt2 requires a value term".to_owned(),
            )),
        }
    }

    fn reset(&mut self) -> SmtResult<()> {
        *self = ReferenceBackend::new();
        Ok(())
    }

    fn reset_assertions(&mut self) -> SmtResult<()> {
        self.frames = vec![Vec::new()];
        self.model_ready = false;
        Ok(())
    }
}

impl ReferenceBackend {
    fn check_with_assumptions(&mut self, assumptions: &[Rc<Node>]) -> SmtResult<SatResult> {
        let all_true = self
            .assertions()
            .chain(assumptions)
            .all(|node| eval(node).and_then(|v| v.as_bool()) == Some(true));
        if all_true {
            // the default model is a witness
            self.model_ready = true;
            Ok(SatResult::Sat)
        } else {
            // the assertions may or may not be satisfiable by some other
            // assignment; this backend does not search
            self.model_ready = false;
            Ok(SatResult::Unknown)
        }
    }
}

/// The default model assigns every symbol the "zero" of its sort.
fn default_value(sort: &Sort) -> Option<Value> {
    match sort {
        Sort::Bool => Some(Value::Bool(false)),
        Sort::Int => Some(Value::Integer(Integer::new())),
        Sort::Real => Some(Value::Real(Rational::new())),
        Sort::BitVec(w) => Some(Value::BitVec(Integer::new(), *w)),
        Sort::Array(_, element) => Some(Value::Array(ArrayValue {
            default: Box::new(default_value(element)?),
            writes: Vec::new(),
        })),
        _ => None,
    }
}

fn eval(node: &Node) -> Option<Value> {
    match node {
        Node::Value(v) => Some(v.clone()),
        Node::Symbol(_, sort) => default_value(sort),
        Node::ConstArray(_, base) => Some(Value::Array(ArrayValue {
            default: Box::new(eval(base)?),
            writes: Vec::new(),
        })),
        Node::App(op, args) => {
            let values = args.iter().map(|a| eval(a)).collect::<Option<Vec<_>>>()?;
            eval_op(op, &values)
        }
    }
}

macro_rules! arith_op {
    ($op:tt, $args:expr) => {{
        let args = $args;
        match args[0].clone() {
            Value::Integer(first) => Value::Integer(
                args[1..]
                    .iter()
                    .try_fold(first, |acc, arg| Some(acc $op arg.as_int()?))?,
            ),
            Value::Real(first) => Value::Real(
                args[1..]
                    .iter()
                    .try_fold(first, |acc, arg| Some(acc $op arg.as_real()?))?,
            ),
            _ => return None,
        }
    }};
}

macro_rules! comparison_op {
    ($op:tt, $args:expr) => {{
        let args = $args;
        match (&args[0], &args[1]) {
            (Value::Integer(l), Value::Integer(r)) => Value::Bool(l $op r),
            (Value::Real(l), Value::Real(r)) => Value::Bool(l $op r),
            _ => return None,
        }
    }};
}

macro_rules! bitvec_op {
    ($op:tt, $args:expr) => {{
        let args = $args;
        let Value::BitVec(first, w) = args[0].clone() else {
            return None;
        };
        let result = args[1..].iter().try_fold(first, |acc, arg| {
            let (arg, _) = arg.as_bitvec()?;
            Some((acc $op arg).keep_bits(w as u32))
        })?;
        Value::new_bitvec(result, w)
    }};
}

macro_rules! bitvec_comparison_op {
    ($op:tt, $args:expr, signed) => {{
        let args = $args;
        let ((a, _), (b, _)) = (args[0].as_signed_bitvec()?, args[1].as_signed_bitvec()?);
        Value::Bool(a $op b)
    }};
    ($op:tt, $args:expr) => {{
        let args = $args;
        let ((a, _), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
        Value::Bool(a $op b)
    }};
}

fn eval_op(op: &Op, args: &[Value]) -> Option<Value> {
    Some(match op.prim {
        PrimOp::Not => Value::Bool(!args[0].as_bool()?),
        PrimOp::Implies => Value::Bool(!args[0].as_bool()? || args[1].as_bool()?),
        PrimOp::And => Value::Bool(
            args.iter()
                .try_fold(true, |acc, arg| Some(acc && arg.as_bool()?))?,
        ),
        PrimOp::Or => Value::Bool(
            args.iter()
                .try_fold(false, |acc, arg| Some(acc || arg.as_bool()?))?,
        ),
        PrimOp::Xor => Value::Bool(
            args.iter()
                .try_fold(false, |acc, arg| Some(acc != arg.as_bool()?))?,
        ),
        PrimOp::Iff => Value::Bool(args[0].as_bool()? == args[1].as_bool()?),
        PrimOp::Equals => {
            if args.iter().any(|a| matches!(a, Value::Array(_))) {
                return None;
            }
            Value::Bool(args.windows(2).all(|w| w[0] == w[1]))
        }
        PrimOp::Distinct => {
            if args.iter().any(|a| matches!(a, Value::Array(_))) {
                return None;
            }
            let mut distinct = true;
            for i in 0..args.len() {
                for j in i + 1..args.len() {
                    distinct &= args[i] != args[j];
                }
            }
            Value::Bool(distinct)
        }
        PrimOp::Ite => {
            if args[0].as_bool()? {
                args[1].clone()
            } else {
                args[2].clone()
            }
        }
        PrimOp::Apply => return None,

        PrimOp::Add => arith_op!(+, args),
        PrimOp::Sub => arith_op!(-, args),
        PrimOp::Neg => match &args[0] {
            Value::Integer(i) => Value::Integer(-i.clone()),
            Value::Real(r) => Value::Real(-r.clone()),
            _ => return None,
        },
        PrimOp::Mult => arith_op!(*, args),
        PrimOp::Div => match (&args[0], &args[1]) {
            (Value::Integer(l), Value::Integer(r)) if !r.is_zero() => {
                Value::Integer(Integer::from(l / r))
            }
            (Value::Real(l), Value::Real(r)) if *r != 0 => Value::Real(Rational::from(l / r)),
            _ => return None,
        },
        PrimOp::IntDiv => {
            let (l, r) = (args[0].as_int()?, args[1].as_int()?);
            if r.is_zero() {
                return None;
            }
            Value::Integer(Integer::from(l / r))
        }
        PrimOp::Mod => {
            let (l, r) = (args[0].as_int()?, args[1].as_int()?);
            if r.is_zero() {
                return None;
            }
            Value::Integer(Integer::from(l % r))
        }
        PrimOp::Abs => Value::Integer(args[0].as_int()?.clone().abs()),
        PrimOp::Pow => {
            let (l, r) = (args[0].as_int()?, args[1].as_int()?);
            Value::Integer(l.clone().pow(r.to_u32()?))
        }
        PrimOp::LessThan => comparison_op!(<, args),
        PrimOp::LessEq => comparison_op!(<=, args),
        PrimOp::GreaterThan => comparison_op!(>, args),
        PrimOp::GreaterEq => comparison_op!(>=, args),
        PrimOp::ToReal => Value::Real(args[0].as_int()?.clone().into()),
        PrimOp::ToInt => Value::Integer(args[0].as_real()?.floor().into_numer_denom().0),
        PrimOp::IsInt => match &args[0] {
            Value::Integer(_) => Value::Bool(true),
            Value::Real(r) => Value::Bool(r.is_integer()),
            _ => return None,
        },

        PrimOp::Select => {
            let Value::Array(array) = &args[0] else {
                return None;
            };
            array
                .writes
                .iter()
                .find(|(k, _)| *k == args[1])
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| (*array.default).clone())
        }
        PrimOp::Store => {
            let Value::Array(mut array) = args[0].clone() else {
                return None;
            };
            array.writes.retain(|(k, _)| *k != args[1]);
            array.writes.push((args[1].clone(), args[2].clone()));
            Value::Array(array)
        }

        PrimOp::BvNot => {
            let (v, w) = args[0].as_bitvec()?;
            Value::new_bitvec(!v.clone(), w)
        }
        PrimOp::BvNeg => {
            let (v, w) = args[0].as_bitvec()?;
            Value::new_bitvec(-v.clone(), w)
        }
        PrimOp::BvAnd => bitvec_op!(&, args),
        PrimOp::BvOr => bitvec_op!(|, args),
        PrimOp::BvXor => bitvec_op!(^, args),
        PrimOp::BvAdd => bitvec_op!(+, args),
        PrimOp::BvMul => bitvec_op!(*, args),
        PrimOp::BvNand => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(!(a.clone() & b), w)
        }
        PrimOp::BvNor => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(!(a.clone() | b), w)
        }
        PrimOp::BvXnor => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(!(a.clone() ^ b), w)
        }
        PrimOp::BvSub => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(a.clone() - b, w)
        }
        PrimOp::BvUDiv => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            let value = if b.is_zero() {
                (Integer::from(1) << w as u32) - 1
            } else {
                Integer::from(a / b)
            };
            Value::new_bitvec(value, w)
        }
        PrimOp::BvURem => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            let value = if b.is_zero() {
                a.clone()
            } else {
                Integer::from(a % b)
            };
            Value::new_bitvec(value, w)
        }
        PrimOp::BvSDiv => {
            let ((a, w), (b, _)) = (args[0].as_signed_bitvec()?, args[1].as_signed_bitvec()?);
            if b.is_zero() {
                return None;
            }
            Value::new_bitvec(a / b, w)
        }
        PrimOp::BvSRem | PrimOp::BvSMod => {
            let ((a, w), (b, _)) = (args[0].as_signed_bitvec()?, args[1].as_signed_bitvec()?);
            if b.is_zero() {
                return None;
            }
            let signum: Integer = if op.prim == PrimOp::BvSRem { &a } else { &b }
                .signum_ref()
                .into();
            let value = a.abs() % b.abs();
            Value::new_bitvec(value * signum, w)
        }
        PrimOp::BvShl => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(a.clone() << b.to_u32()?, w)
        }
        PrimOp::BvLShr => {
            let ((a, w), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(a.clone() >> b.to_u32()?, w)
        }
        PrimOp::BvAShr => {
            let ((a, w), (b, _)) = (args[0].as_signed_bitvec()?, args[1].as_bitvec()?);
            Value::new_bitvec(a >> b.to_u32()?, w)
        }
        PrimOp::BvULt => bitvec_comparison_op!(<, args),
        PrimOp::BvULe => bitvec_comparison_op!(<=, args),
        PrimOp::BvUGt => bitvec_comparison_op!(>, args),
        PrimOp::BvUGe => bitvec_comparison_op!(>=, args),
        PrimOp::BvSLt => bitvec_comparison_op!(<, args, signed),
        PrimOp::BvSLe => bitvec_comparison_op!(<=, args, signed),
        PrimOp::BvSGt => bitvec_comparison_op!(>, args, signed),
        PrimOp::BvSGe => bitvec_comparison_op!(>=, args, signed),
        PrimOp::BvComp => {
            let ((a, _), (b, _)) = (args[0].as_bitvec()?, args[1].as_bitvec()?);
            Value::Bool(a == b)
        }
        PrimOp::Concat => {
            let (value, width) = args.iter().try_fold((Integer::new(), 0), |acc, arg| {
                let (a, i) = acc;
                let (b, j) = arg.as_bitvec()?;
                Some(((a << j as u32) + b, i + j))
            })?;
            Value::new_bitvec(value, width)
        }
        PrimOp::Extract => {
            let (hi, lo) = (op.indices[0], op.indices[1]);
            let (bits, _) = args[0].as_bitvec()?;
            let bits = bits.clone().keep_bits(hi as u32 + 1) >> lo as u32;
            Value::new_bitvec(bits, hi - lo + 1)
        }
        PrimOp::ZeroExtend => {
            let (v, w) = args[0].as_bitvec()?;
            Value::new_bitvec(v.clone(), w + op.indices[0])
        }
        PrimOp::SignExtend => {
            let (v, w) = args[0].as_signed_bitvec()?;
            Value::new_bitvec(v, w + op.indices[0])
        }
        PrimOp::RotateLeft => {
            let (v, w) = args[0].as_bitvec()?;
            // a left rotation by i bits is a right rotation by w - i bits
            let i = op.indices[0] % w;
            Value::new_bitvec(rotate_right(v, w, w - i), w)
        }
        PrimOp::RotateRight => {
            let (v, w) = args[0].as_bitvec()?;
            Value::new_bitvec(rotate_right(v, w, op.indices[0]), w)
        }
        PrimOp::Repeat => {
            let (v, w) = args[0].as_bitvec()?;
            let mut result = Integer::new();
            for _ in 0..op.indices[0] {
                result <<= w as u32;
                result += v;
            }
            Value::new_bitvec(result, w * op.indices[0])
        }
        PrimOp::BvToNat => Value::Integer(args[0].as_bitvec()?.0.clone()),
        PrimOp::IntToBv => Value::new_bitvec(args[0].as_int()?.clone(), op.indices[0]),
    })
}

/// Rotates a `w`-sized bit-vector `r` bits to the right.
fn rotate_right(value: &Integer, w: u64, r: u64) -> Integer {
    let r = r % w;
    // the least significant bits, which get rotated around
    let rotated = value.clone().keep_bits(r as u32) << (w - r) as u32;
    // the most significant bits, which only get shifted right
    let shifted = value.clone() >> r as u32;
    rotated + shifted
}
