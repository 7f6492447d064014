//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! JSON has no decimal, temporal or range types, so the trip out is lossy in
//! form but not in content: decimals that `f64` cannot hold exactly become
//! strings, temporals become their ISO text and ranges become small objects.

use serde_json::{Map, Number as JsonNumber, json};

use crate::environment::Scope;
use crate::number::Number;
use crate::{EvalError, Value};

impl Value {
    /// The JSON rendering of a result.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => number_to_json(n),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Context(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Value::Range(range) => json!({
                "start": range.start.to_json(),
                "end": range.end.to_json(),
                "start_open": range.start_open,
                "end_open": range.end_open,
            }),
            Value::Date(date) => serde_json::Value::String(date.format("%Y-%m-%d").to_string()),
            Value::Time(time) => serde_json::Value::String(time.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_string()),
            Value::Duration(d) => serde_json::Value::String(d.to_string()),
            Value::Function(_) => serde_json::Value::String("<function>".into()),
        }
    }
}

fn number_to_json(n: &Number) -> serde_json::Value {
    if let Some(i) = n.to_i64() {
        return serde_json::Value::Number(i.into());
    }
    let float = n.to_f64();
    if Number::from_f64(float).as_ref() == Some(n) {
        if let Some(number) = JsonNumber::from_f64(float) {
            return serde_json::Value::Number(number);
        }
    }
    serde_json::Value::String(n.to_string())
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else {
                    n.as_f64().map_or(Value::Null, Value::from)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(entries) => {
                Value::Context(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Parse a JSON object into a scope of host variables.
pub fn parse_scope(input: &str) -> Result<Scope, EvalError> {
    let json: serde_json::Value =
        serde_json::from_str(input).map_err(|e| EvalError::value(format!("invalid JSON: {e}")))?;
    match json {
        serde_json::Value::Object(entries) => Ok(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        _ => Err(EvalError::type_mismatch("context")),
    }
}
