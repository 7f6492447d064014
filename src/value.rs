//! The runtime value model.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::callable::Callable;
use crate::number::Number;
use crate::range::RangeValue;
use crate::temporal::{DateTime, Duration, Time};

/// Every value an expression can produce.
///
/// Values are immutable; list and context builtins return new values instead of
/// updating their arguments. Host numbers always arrive as [`Number`], so evaluation
/// only ever sees one numeric representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    Number(Number),
    List(Vec<Value>),
    /// Keys are kept sorted; contexts are unordered, so this only stabilises display
    /// and comparison order.
    Context(BTreeMap<String, Value>),
    Range(Box<RangeValue>),
    Date(NaiveDate),
    Time(Time),
    DateTime(DateTime),
    Duration(Duration),
    Function(Callable),
}

impl Value {
    /// The type tag used in error messages and by `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::List(_) => "list",
            Value::Context(_) => "context",
            Value::Range(_) => "range",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Duration(_) => "duration",
            Value::Function(_) => "function",
        }
    }

    /// Numbers are true when non-zero; strings, lists and contexts when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => !n.is_zero(),
            Value::List(items) => !items.is_empty(),
            Value::Context(entries) => !entries.is_empty(),
            Value::Range(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_)
            | Value::Duration(_)
            | Value::Function(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text form without string quotes, as produced by the `string` builtin.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Builds a context from key/value pairs.
    pub fn context<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Context(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write_quoted(f, s),
            Value::Number(n) => write!(f, "{n}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Context(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
            Value::Range(range) => write!(f, "{range}"),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Value::Time(time) => write!(f, "{time}"),
            Value::DateTime(datetime) => write!(f, "{datetime}"),
            Value::Duration(duration) => write!(f, "{duration}"),
            Value::Function(callable) => write!(f, "{callable}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Number(Number::from(value))
            }
        })*
    };
}

value_from_int!(i32, i64, u32, u64, usize);

/// Non-finite floats have no decimal value and become null.
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Context(entries)
    }
}

impl From<RangeValue> for Value {
    fn from(range: RangeValue) -> Self {
        Value::Range(Box::new(range))
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<Time> for Value {
    fn from(time: Time) -> Self {
        Value::Time(time)
    }
}

impl From<DateTime> for Value {
    fn from(datetime: DateTime) -> Self {
        Value::DateTime(datetime)
    }
}

impl From<Duration> for Value {
    fn from(duration: Duration) -> Self {
        Value::Duration(duration)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Function(callable)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from(-1).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from(vec![Value::Null]).is_truthy());
        assert!(!Value::context::<&str>([]).is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }

    #[test]
    fn test_host_numbers_are_normalised() {
        assert_eq!(Value::from(3), Value::from(3.0));
        assert_eq!(Value::from(0.1), Value::Number("0.1".parse().unwrap()));
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display() {
        let v = Value::from(vec![Value::from(1), Value::from("a\"b"), Value::Null]);
        assert_eq!(v.to_string(), r#"[1, "a\"b", null]"#);

        let ctx = Value::context([("b", Value::from(2)), ("a", Value::from(true))]);
        assert_eq!(ctx.to_string(), r#"{"a": true, "b": 2}"#);

        assert_eq!(Value::from("plain").to_text(), "plain");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(1).type_name(), "number");
        assert_eq!(Value::from(vec![1, 2]).type_name(), "list");
        assert_eq!(Value::context([("k", Value::Null)]).type_name(), "context");
    }
}
