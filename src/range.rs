//! Ranges and the interval relations between points and ranges.
//!
//! Every relation is defined in terms of [`compare`] on the four endpoints and
//! their openness flags. Relations that take a point or a range on either side
//! accept both; the others require ranges and fail with a type mismatch.

use std::cmp::Ordering;
use std::fmt;

use crate::compare::compare;
use crate::{EvalError, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RangeValue {
    pub start: Value,
    pub start_open: bool,
    pub end: Value,
    pub end_open: bool,
}

impl RangeValue {
    /// Builds a range, rejecting bounds that cannot be compared with each other.
    pub fn new(start: Value, start_open: bool, end: Value, end_open: bool) -> Result<Self, EvalError> {
        compare(&start, &end)?;
        Ok(RangeValue {
            start,
            start_open,
            end,
            end_open,
        })
    }

    /// Where `point` lies relative to the range: `Less` before it, `Equal` inside,
    /// `Greater` after it.
    pub fn position(&self, point: &Value) -> Result<Ordering, EvalError> {
        match compare(point, &self.start)? {
            Ordering::Less => return Ok(Ordering::Less),
            Ordering::Equal if self.start_open => return Ok(Ordering::Less),
            Ordering::Equal => return Ok(Ordering::Equal),
            Ordering::Greater => {}
        }
        match compare(point, &self.end)? {
            Ordering::Greater => Ok(Ordering::Greater),
            Ordering::Equal if self.end_open => Ok(Ordering::Greater),
            _ => Ok(Ordering::Equal),
        }
    }

    pub fn contains(&self, point: &Value) -> Result<bool, EvalError> {
        Ok(self.position(point)? == Ordering::Equal)
    }

    /// True when every point of `other` is inside this range.
    pub fn includes(&self, other: &RangeValue) -> Result<bool, EvalError> {
        let starts = compare(&self.start, &other.start)?;
        let ends = compare(&self.end, &other.end)?;
        if starts == Ordering::Greater || ends == Ordering::Less {
            return Ok(false);
        }
        let start_ok = starts == Ordering::Less || !self.start_open || other.start_open;
        let end_ok = ends == Ordering::Greater || !self.end_open || other.end_open;
        Ok(start_ok && end_ok)
    }

    fn overlaps_before(&self, other: &RangeValue) -> Result<bool, EvalError> {
        if other.position(&self.end)? != Ordering::Equal {
            return Ok(false);
        }
        Ok(!(self.end_open && compare(&self.end, &other.start)? == Ordering::Equal))
    }

    fn overlaps_after(&self, other: &RangeValue) -> Result<bool, EvalError> {
        if other.position(&self.start)? != Ordering::Equal {
            return Ok(false);
        }
        Ok(!(self.start_open && compare(&self.start, &other.end)? == Ordering::Equal))
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.start_open { '(' } else { '[' };
        let close = if self.end_open { ')' } else { ']' };
        write!(f, "{open}{}..{}{close}", self.start, self.end)
    }
}

fn as_range(value: &Value) -> Option<&RangeValue> {
    match value {
        Value::Range(range) => Some(range),
        _ => None,
    }
}

fn require_range(value: &Value) -> Result<&RangeValue, EvalError> {
    as_range(value).ok_or_else(|| EvalError::type_mismatch("range"))
}

fn is_equal(a: &Value, b: &Value) -> Result<bool, EvalError> {
    Ok(compare(a, b)? == Ordering::Equal)
}

pub fn before(a: &Value, b: &Value) -> Result<bool, EvalError> {
    match (as_range(a), as_range(b)) {
        (Some(a), Some(b)) => {
            let order = compare(&a.end, &b.start)?;
            if !a.end_open && !b.start_open {
                Ok(order == Ordering::Less)
            } else {
                Ok(order != Ordering::Greater)
            }
        }
        (Some(range), None) => Ok(range.position(b)? == Ordering::Greater),
        (None, Some(range)) => Ok(range.position(a)? == Ordering::Less),
        (None, None) => Ok(compare(a, b)? == Ordering::Less),
    }
}

pub fn after(a: &Value, b: &Value) -> Result<bool, EvalError> {
    match (as_range(a), as_range(b)) {
        (Some(a), Some(b)) => {
            let order = compare(&a.start, &b.end)?;
            if !a.start_open && !b.end_open {
                Ok(order == Ordering::Greater)
            } else {
                Ok(order != Ordering::Less)
            }
        }
        (Some(range), None) => Ok(range.position(b)? == Ordering::Less),
        (None, Some(range)) => Ok(range.position(a)? == Ordering::Greater),
        (None, None) => Ok(compare(a, b)? == Ordering::Greater),
    }
}

/// `a` ends exactly where `b` starts, both ends closed.
pub fn meets(a: &Value, b: &Value) -> Result<bool, EvalError> {
    let (a, b) = (require_range(a)?, require_range(b)?);
    Ok(!a.end_open && !b.start_open && is_equal(&a.end, &b.start)?)
}

pub fn met_by(a: &Value, b: &Value) -> Result<bool, EvalError> {
    meets(b, a)
}

pub fn overlaps(a: &Value, b: &Value) -> Result<bool, EvalError> {
    let (a, b) = (require_range(a)?, require_range(b)?);
    Ok(a.overlaps_before(b)? || a.overlaps_after(b)?)
}

pub fn overlaps_before(a: &Value, b: &Value) -> Result<bool, EvalError> {
    require_range(a)?.overlaps_before(require_range(b)?)
}

pub fn overlaps_after(a: &Value, b: &Value) -> Result<bool, EvalError> {
    require_range(a)?.overlaps_after(require_range(b)?)
}

/// `a` (a point or a range) ends at the closed end of range `b`.
pub fn finishes(a: &Value, b: &Value) -> Result<bool, EvalError> {
    let b = require_range(b)?;
    let end = as_range(a).map_or(a, |a| &a.end);
    Ok(!b.end_open && is_equal(end, &b.end)?)
}

pub fn finished_by(a: &Value, b: &Value) -> Result<bool, EvalError> {
    require_range(a)?;
    finishes(b, a)
}

/// `a` (a point or a range) starts where range `b` starts.
pub fn starts(a: &Value, b: &Value) -> Result<bool, EvalError> {
    let b = require_range(b)?;
    match as_range(a) {
        Some(a) => Ok(a.start_open == b.start_open && is_equal(&a.start, &b.start)?),
        None => Ok(!b.start_open && is_equal(a, &b.start)?),
    }
}

pub fn started_by(a: &Value, b: &Value) -> Result<bool, EvalError> {
    require_range(a)?;
    starts(b, a)
}

/// Range `a` contains `b`, a point or a whole range.
pub fn includes(a: &Value, b: &Value) -> Result<bool, EvalError> {
    let a = require_range(a)?;
    match as_range(b) {
        Some(b) => a.includes(b),
        None => a.contains(b),
    }
}

pub fn during(a: &Value, b: &Value) -> Result<bool, EvalError> {
    require_range(b)?;
    includes(b, a)
}

/// Equal points, or ranges with equal endpoints and equal openness.
pub fn coincides(a: &Value, b: &Value) -> Result<bool, EvalError> {
    match (as_range(a), as_range(b)) {
        (Some(a), Some(b)) => {
            if a.start_open != b.start_open || a.end_open != b.end_open {
                return Ok(false);
            }
            Ok(is_equal(&a.start, &b.start)? && is_equal(&a.end, &b.end)?)
        }
        (None, None) => is_equal(a, b),
        _ => Err(EvalError::type_mismatch("range")),
    }
}
