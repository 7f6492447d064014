use std::collections::BTreeMap;

use super::{Prelude, list_arg};
use crate::callable::{NativeArgs, NativeFunction};
use crate::environment::Environment;
use crate::{EvalError, Value};

pub(super) fn install(prelude: &mut Prelude) {
    prelude
        .bind(
            "get value",
            NativeFunction::new(builtin_get_value)
                .required(["context", "key"])
                .help("the value at a key or a list of keys, or null"),
        )
        .bind(
            "get entries",
            NativeFunction::new(builtin_get_entries)
                .required(["context"])
                .help("a list of {key, value} contexts"),
        )
        .bind(
            "context put",
            NativeFunction::new(builtin_context_put)
                .required(["context", "key", "value"])
                .help("a copy of context with value stored at a key or a list of keys"),
        )
        .bind(
            "context merge",
            NativeFunction::new(builtin_context_merge)
                .required(["contexts"])
                .help("merge a list of contexts; later entries win"),
        );
}

fn context_arg<'a>(args: &'a NativeArgs, name: &str) -> Result<&'a BTreeMap<String, Value>, EvalError> {
    match args.required(name)? {
        Value::Context(entries) => Ok(entries),
        _ => Err(EvalError::type_mismatch("context")),
    }
}

/// A key argument as a path: one string, or a list of strings.
fn key_path(args: &NativeArgs) -> Result<Vec<&str>, EvalError> {
    match args.required("key")? {
        Value::String(key) => Ok(vec![key.as_str()]),
        Value::List(keys) => keys
            .iter()
            .map(|key| key.as_str().ok_or_else(|| EvalError::type_mismatch("string")))
            .collect(),
        _ => Err(EvalError::type_mismatch("string")),
    }
}

fn builtin_get_value(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut current = args.required("context")?;
    for key in key_path(args)? {
        current = match current {
            Value::Context(entries) => match entries.get(key) {
                Some(value) => value,
                None => return Ok(Value::Null),
            },
            _ => return Ok(Value::Null),
        };
    }
    Ok(current.clone())
}

fn builtin_get_entries(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(context_arg(args, "context")?
        .iter()
        .map(|(key, value)| Value::context([("key", Value::from(key.as_str())), ("value", value.clone())]))
        .collect())
}

fn put(entries: &mut BTreeMap<String, Value>, path: &[&str], value: Value) -> Result<(), EvalError> {
    match path {
        [] => Ok(()),
        [key] => {
            entries.insert(key.to_string(), value);
            Ok(())
        }
        [key, rest @ ..] => {
            let child = entries
                .entry(key.to_string())
                .or_insert_with(|| Value::Context(BTreeMap::new()));
            match child {
                Value::Context(inner) => put(inner, rest, value),
                _ => Err(EvalError::type_mismatch("context")),
            }
        }
    }
}

fn builtin_context_put(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut entries = context_arg(args, "context")?.clone();
    put(&mut entries, &key_path(args)?, args.required("value")?.clone())?;
    Ok(Value::Context(entries))
}

fn builtin_context_merge(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut merged = BTreeMap::new();
    for context in list_arg(args, "contexts")? {
        match context {
            Value::Context(entries) => merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone()))),
            _ => return Err(EvalError::type_mismatch("context")),
        }
    }
    Ok(Value::Context(merged))
}

#[cfg(test)]
mod tests {
    use crate::{EvalError, Value, evaluate};

    fn eval_ok(source: &str) -> Value {
        evaluate(source).unwrap()
    }

    #[test]
    fn test_get_value() {
        assert_eq!(eval_ok("get value({a: 1}, \"a\")"), Value::from(1));
        assert_eq!(eval_ok("get value({a: 1}, \"b\")"), Value::Null);
        assert_eq!(eval_ok("get value({a: {b: 2}}, [\"a\", \"b\"])"), Value::from(2));
        assert_eq!(eval_ok("get value({a: 1}, [\"a\", \"b\"])"), Value::Null);
        assert_eq!(
            evaluate("get value({a: 1}, 1)"),
            Err(crate::Error::Eval(EvalError::type_mismatch("string")))
        );
    }

    #[test]
    fn test_get_entries() {
        assert_eq!(
            eval_ok("get entries({b: 2, a: 1})"),
            Value::from(vec![
                Value::context([("key", Value::from("a")), ("value", Value::from(1))]),
                Value::context([("key", Value::from("b")), ("value", Value::from(2))]),
            ])
        );
    }

    #[test]
    fn test_context_put_and_merge() {
        assert_eq!(eval_ok("context put({a: 1}, \"b\", 2)"), eval_ok("{a: 1, b: 2}"));
        assert_eq!(eval_ok("context put({a: 1}, \"a\", 3)"), eval_ok("{a: 3}"));
        assert_eq!(
            eval_ok("context put({a: {x: 1}}, [\"a\", \"y\"], 2)"),
            eval_ok("{a: {x: 1, y: 2}}")
        );
        assert_eq!(eval_ok("context put({}, [\"p\", \"q\"], 1)"), eval_ok("{p: {q: 1}}"));
        assert!(evaluate("context put({a: 1}, [\"a\", \"b\"], 2)").is_err());
        assert_eq!(
            eval_ok("context merge([{a: 1, b: 1}, {b: 2}])"),
            eval_ok("{a: 1, b: 2}")
        );
    }
}
