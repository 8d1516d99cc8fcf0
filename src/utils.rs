use std::{fmt, ops};

/// An inclusive range of argument counts, where either bound may be absent.
#[derive(Debug, Clone, Copy)]
pub struct Range(pub Option<usize>, pub Option<usize>);

impl Range {
    pub fn contains(&self, n: usize) -> bool {
        self.0.map_or(true, |bound| n >= bound) && self.1.map_or(true, |bound| n <= bound)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Range(Some(a), Some(b)) if a == b => write!(f, "{}", a),
            Range(Some(a), Some(b)) => write!(f, "between {} and {}", a, b),
            Range(Some(a), None) => write!(f, "at least {}", a),
            Range(None, Some(b)) => write!(f, "up to {}", b),
            Range(None, None) => write!(f, "any number of"),
        }
    }
}

impl From<usize> for Range {
    fn from(n: usize) -> Self {
        Self(Some(n), Some(n))
    }
}

impl From<ops::RangeFrom<usize>> for Range {
    fn from(r: ops::RangeFrom<usize>) -> Self {
        Self(Some(r.start), None)
    }
}

impl From<ops::RangeInclusive<usize>> for Range {
    fn from(r: ops::RangeInclusive<usize>) -> Self {
        Self(Some(*r.start()), Some(*r.end()))
    }
}
