//! Ordering between values.
//!
//! Values are ordered only within a family: strings, numbers, booleans, temporal
//! instants, durations of one kind, lists and contexts. Anything else is a
//! [`EvalError::TypeMismatch`] naming the left operand's type.

use std::cmp::Ordering;

use crate::temporal;
use crate::{EvalError, Value};

fn is_instant(value: &Value) -> bool {
    matches!(value, Value::Date(_) | Value::Time(_) | Value::DateTime(_))
}

pub fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Null, Value::Null) => Ok(Ordering::Equal),
        (a, b) if is_instant(a) && is_instant(b) => {
            match (temporal::instant(a), temporal::instant(b)) {
                (Some(a), Some(b)) => Ok(a.cmp(&b)),
                _ => Err(EvalError::value("datetime out of range")),
            }
        }
        (Value::Duration(a), Value::Duration(b)) => match a.cmp_key(b) {
            Some((a, b)) => Ok(a.cmp(&b)),
            None => Err(EvalError::type_mismatch("duration")),
        },
        (Value::List(a), Value::List(b)) => compare_lists(a, b),
        (Value::Context(a), Value::Context(b)) => {
            match a.len().cmp(&b.len()) {
                Ordering::Equal => {}
                unequal => return Ok(unequal),
            }
            for (key, value) in a {
                let Some(other) = b.get(key) else {
                    return Ok(Ordering::Greater);
                };
                match compare(value, other)? {
                    Ordering::Equal => {}
                    unequal => return Ok(unequal),
                }
            }
            Ok(Ordering::Equal)
        }
        (a, _) => Err(EvalError::type_mismatch(a.type_name())),
    }
}

/// Element-wise over the shared prefix. When one list is a prefix of the other the
/// shorter one orders after the longer one.
fn compare_lists(a: &[Value], b: &[Value]) -> Result<Ordering, EvalError> {
    for (x, y) in a.iter().zip(b) {
        match compare(x, y)? {
            Ordering::Equal => {}
            unequal => return Ok(unequal),
        }
    }
    Ok(b.len().cmp(&a.len()))
}

/// Equality through [`compare`]; incomparable values are simply unequal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    matches!(compare(left, right), Ok(Ordering::Equal))
}
