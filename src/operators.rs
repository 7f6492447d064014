//! Binary operators over evaluated operands.
//!
//! `and`/`or` are short-circuited by the evaluator before reaching here; applying them
//! to two values just combines their truthiness.

use std::cmp::Ordering;

use crate::ast::BinOp;
use crate::builtinops::contains_value;
use crate::compare::compare;
use crate::number::Number;
use crate::temporal::{self, DateTime, Duration};
use crate::{EvalError, Value};

pub fn apply(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mul => mul(left, right),
        BinOp::Div => numeric(op, left, right, Number::int_div),
        BinOp::Mod => numeric(op, left, right, Number::int_mod),
        BinOp::Lt => Ok(Value::Bool(compare(left, right)? == Ordering::Less)),
        BinOp::Le => Ok(Value::Bool(compare(left, right)? != Ordering::Greater)),
        BinOp::Gt => Ok(Value::Bool(compare(left, right)? == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(compare(left, right)? != Ordering::Less)),
        BinOp::Eq => equality(left, right, |ord| ord == Ordering::Equal),
        BinOp::Ne => equality(left, right, |ord| ord != Ordering::Equal),
        BinOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinOp::Index => index(left, right),
        BinOp::In => member(left, right),
    }
}

fn bad_operator(left: &Value, op: BinOp, right: &Value) -> EvalError {
    EvalError::BadOperator {
        left: left.type_name(),
        op: op.as_str(),
        right: right.type_name(),
    }
}

/// Operands of different families are simply unequal.
fn equality(left: &Value, right: &Value, test: fn(Ordering) -> bool) -> Result<Value, EvalError> {
    match compare(left, right) {
        Ok(ord) => Ok(Value::Bool(test(ord))),
        Err(EvalError::TypeMismatch(_)) => Ok(Value::Bool(false)),
        Err(err) => Err(err),
    }
}

fn numeric(
    op: BinOp,
    left: &Value,
    right: &Value,
    f: fn(&Number, &Number) -> Result<Number, EvalError>,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b)?)),
        _ => Err(bad_operator(left, op, right)),
    }
}

fn shifted(point: &Value, duration: &Duration, subtract: bool) -> Result<Option<Value>, EvalError> {
    Ok(match point {
        Value::DateTime(dt) => Some(Value::DateTime(DateTime {
            datetime: temporal::shift(dt.datetime, duration, subtract)?,
            zone: dt.zone.clone(),
        })),
        Value::Date(date) => Some(Value::Date(temporal::shift_date(*date, duration, subtract)?)),
        _ => None,
    })
}

fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let result = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(Value::String(format!("{a}{b}"))),
        (Value::Number(a), Value::Number(b)) => Some(Value::Number(a.add(b))),
        (Value::Duration(a), Value::Duration(b)) => a.checked_add(b)?.map(Value::Duration),
        (point, Value::Duration(d)) | (Value::Duration(d), point) => shifted(point, d, false)?,
        _ => None,
    };
    result.ok_or_else(|| bad_operator(left, BinOp::Add, right))
}

fn sub(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let result = match (left, right) {
        (Value::Number(a), Value::Number(b)) => Some(Value::Number(a.sub(b))),
        (Value::Duration(a), Value::Duration(b)) => a.checked_add(&b.negated())?.map(Value::Duration),
        (point, Value::Duration(d)) => shifted(point, d, true)?,
        (Value::Date(_) | Value::DateTime(_), Value::Date(_) | Value::DateTime(_)) => {
            let elapsed = temporal::between(left, right).ok_or_else(|| EvalError::value("datetime out of range"))?;
            Some(Value::Duration(elapsed))
        }
        _ => None,
    };
    result.ok_or_else(|| bad_operator(left, BinOp::Sub, right))
}

fn mul(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(b))),
        (Value::Duration(d), Value::Number(n)) | (Value::Number(n), Value::Duration(d)) => {
            Ok(Value::Duration(d.scaled(n)?))
        }
        _ => Err(bad_operator(left, BinOp::Mul, right)),
    }
}

/// `list[n]` with a 1-based position, or `context[key]`.
pub fn index(container: &Value, at: &Value) -> Result<Value, EvalError> {
    match container {
        Value::List(items) => {
            let position = match at {
                Value::Number(n) if n.is_integer() => n.to_i64(),
                _ => return Err(EvalError::index("non-int index")),
            };
            position
                .filter(|&p| p >= 1)
                .and_then(|p| usize::try_from(p - 1).ok())
                .and_then(|p| items.get(p))
                .cloned()
                .ok_or_else(|| EvalError::index("index out of range"))
        }
        Value::Context(entries) => match at {
            Value::String(key) => entries
                .get(key)
                .cloned()
                .ok_or_else(|| EvalError::KeyNotFound(key.clone())),
            _ => Err(EvalError::index("non-string index")),
        },
        _ => Err(EvalError::index("non-indexable value")),
    }
}

fn member(item: &Value, collection: &Value) -> Result<Value, EvalError> {
    match collection {
        Value::Range(range) => Ok(Value::Bool(range.contains(item)?)),
        Value::List(items) => Ok(Value::Bool(contains_value(items, item))),
        _ => Err(bad_operator(item, BinOp::In, collection)),
    }
}
