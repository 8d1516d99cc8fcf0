//! Canonical constant values and their SMT-LIB2 surface forms.

use super::Sort;
use crate::{Error, SmtResult};
use num_traits::Zero;
use rug::{ops::Pow, Integer, Rational};
use std::fmt;

/// A constant value, in canonical form.
///
/// Backends print values in whatever radix or surface syntax they prefer;
/// the logging layer parses those forms into a `Constant` so that equal
/// values always compare and hash equal. Bit-vector payloads are kept
/// non-negative and truncated to their width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// A boolean constant.
    Bool(bool),

    /// An integer constant.
    Integer(Integer),

    /// A real constant.
    Real(Rational),

    /// A bit-vector constant: value and width.
    BitVec(Integer, u64),
}

impl Constant {
    /// Constructs a new bit-vector constant, truncating `value` to `width`
    /// bits and ensuring it is non-negative.
    pub fn new_bitvec(value: impl Into<Integer>, width: u64) -> Self {
        Constant::BitVec(value.into().keep_bits(width as u32), width)
    }

    /// Returns the sort of the constant.
    pub fn sort(&self) -> Sort {
        match self {
            Constant::Bool(_) => Sort::Bool,
            Constant::Integer(_) => Sort::Int,
            Constant::Real(_) => Sort::Real,
            Constant::BitVec(_, width) => Sort::BitVec(*width),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Constant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<Integer> {
        match self {
            Constant::Integer(i) => Some(i.clone()),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            Constant::Real(r) => Some(r.clone()),
            Constant::Integer(i) => Some(i.clone().into()),
            _ => None,
        }
    }

    pub fn as_bitvec(&self) -> Option<(&Integer, u64)> {
        match self {
            Constant::BitVec(value, width) => Some((value, *width)),
            _ => None,
        }
    }

    /// Parses the canonical SMT-LIB2 textual form of a value of the given
    /// sort. Accepts every form a conforming backend may print:
    ///
    /// - `Bool`: `true` or `false`
    /// - `BitVec`: `#b...`, `#x...` or `(_ bvK w)`
    /// - `Int`: a decimal numeral, optionally negated as `-5` or `(- 5)`
    /// - `Real`: a decimal fraction (`1.5`), a division form (`(/ 1 2)`), a
    ///   plain numeral, or any of those negated with `-`
    pub fn from_smt2(val: &str, sort: &Sort) -> SmtResult<Self> {
        let val = val.trim();
        match sort {
            Sort::Bool => match val {
                "true" => Ok(Constant::Bool(true)),
                "false" => Ok(Constant::Bool(false)),
                _ => Err(bad_value(val, sort)),
            },
            Sort::Int => {
                let (negated, body) = strip_negation(val);
                let i = body
                    .parse::<Integer>()
                    .map_err(|_| bad_value(val, sort))?;
                Ok(Constant::Integer(if negated { -i } else { i }))
            }
            Sort::Real => {
                let (negated, body) = strip_negation(val);
                let r = parse_rational(body).ok_or_else(|| bad_value(val, sort))?;
                Ok(Constant::Real(if negated { -r } else { r }))
            }
            Sort::BitVec(width) => {
                let value = parse_bitvec(val, *width).ok_or_else(|| bad_value(val, sort))?;
                Ok(Constant::new_bitvec(value, *width))
            }
            _ => Err(Error::NotImplemented(format!(
                "parsing a value of sort '{}'",
                sort
            ))),
        }
    }
}

fn bad_value(val: &str, sort: &Sort) -> Error {
    Error::Backend(format!(
        "backend printed '{}', which is not a valid value of sort '{}'",
        val, sort
    ))
}

/// Strips a leading negation, either `-5` or the wrapped `(- 5)` form.
fn strip_negation(val: &str) -> (bool, &str) {
    if let Some(inner) = val.strip_prefix("(-").and_then(|s| s.strip_suffix(')')) {
        (true, inner.trim())
    } else if let Some(inner) = val.strip_prefix('-') {
        // a lone `-` is not a number; let the numeral parser reject it
        (true, inner.trim())
    } else {
        (false, val)
    }
}

fn parse_rational(body: &str) -> Option<Rational> {
    if let Some(inner) = body.strip_prefix("(/").and_then(|s| s.strip_suffix(')')) {
        // either operand may itself be negated, as in `(/ (- 1) 2)`
        let (numer, denom) = split_two_atoms(inner.trim())?;
        let (n_neg, numer) = strip_negation(numer);
        let numer = numer.parse::<Integer>().ok()?;
        let denom = denom.parse::<Integer>().ok()?;
        if denom.is_zero() {
            return None;
        }
        let r = Rational::from((numer, denom));
        Some(if n_neg { -r } else { r })
    } else if let Some((int_part, frac_part)) = body.split_once('.') {
        // decimal fraction, e.g. `5.25`: the denominator is a power of ten
        if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let denom = Integer::from(10u32).pow(frac_part.len() as u32);
        let numer = format!("{}{}", int_part, frac_part).parse::<Integer>().ok()?;
        Some(Rational::from((numer, denom)))
    } else {
        let i = body.parse::<Integer>().ok()?;
        Some(i.into())
    }
}

/// Splits a string into exactly two whitespace-separated atoms, where an
/// atom is either a bare token or a parenthesised group.
fn split_two_atoms(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            c if c.is_whitespace() && depth == 0 => {
                let first = &s[..i];
                let second = s[i..].trim();
                if first.is_empty() || second.is_empty() {
                    return None;
                }
                return Some((first, second));
            }
            _ => {}
        }
    }
    None
}

fn parse_bitvec(val: &str, width: u64) -> Option<Integer> {
    if let Some(digits) = val.strip_prefix("#b") {
        if digits.is_empty() || digits.len() as u64 != width {
            return None;
        }
        Integer::from_str_radix(digits, 2).ok()
    } else if let Some(digits) = val.strip_prefix("#x") {
        if digits.is_empty() || digits.len() as u64 * 4 != width {
            return None;
        }
        Integer::from_str_radix(digits, 16).ok()
    } else if let Some(inner) = val.strip_prefix("(_").and_then(|s| s.strip_suffix(')')) {
        // the `(_ bvK w)` form
        let mut parts = inner.split_whitespace();
        let value = parts.next()?.strip_prefix("bv")?;
        let declared = parts.next()?.parse::<u64>().ok()?;
        if parts.next().is_some() || declared != width {
            return None;
        }
        value.parse::<Integer>().ok()
    } else {
        None
    }
}

impl fmt::Display for Constant {
    /// Writes the canonical SMT-LIB2 form: `true`/`false` for booleans,
    /// decimal numerals with `(- n)` negation for integers, `n.0` or
    /// `(/ n d)` for reals, and zero-padded `#b` literals for bit-vectors.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Integer(i) => {
                if *i < 0 {
                    write!(f, "(- {})", *i.as_neg())
                } else {
                    write!(f, "{}", i)
                }
            }
            Constant::Real(r) => {
                if *r < 0 {
                    write!(f, "(- ")?;
                    write_positive_rational(f, &(-r.clone()))?;
                    write!(f, ")")
                } else {
                    write_positive_rational(f, r)
                }
            }
            Constant::BitVec(value, width) => {
                let digits = value.to_string_radix(2);
                write!(f, "#b{:0>width$}", digits, width = *width as usize)
            }
        }
    }
}

fn write_positive_rational(f: &mut fmt::Formatter, r: &Rational) -> fmt::Result {
    if r.is_integer() {
        write!(f, "{}.0", r.numer())
    } else {
        write!(f, "(/ {} {})", r.numer(), r.denom())
    }
}
