//! The prelude: built-in functions and macros every environment can see.
//!
//! The standard prelude is built once, on first use, and shared read-only through an
//! [`Arc`] by every [`Environment`]. Hosts that need extra functions build their own
//! with [`Prelude::standard`], [`Prelude::bind`] more names, and hand it to
//! [`Environment::with_prelude`].
//!
//! ## Functions vs Macros
//!
//! - **Native functions** receive evaluated arguments bound to parameter names
//!   (e.g. `count`, `substring`, `date`).
//! - **Macros** receive the unevaluated argument nodes and decide what to evaluate
//!   (e.g. `block`, `is defined`, `bind`).
//!
//! Both declare required, optional and vararg parameter names, so any builtin can be
//! called positionally or with keyword arguments:
//!
//! ```text
//! substring("foobar", 2, 2)
//! substring(string: "foobar", start position: 2)
//! ```
//!
//! ## Adding New Operations
//!
//! 1. **Implement the handler** following `fn(&NativeArgs, &mut Environment) -> Result<Value, EvalError>`
//!    (or the [`MacroArgs`] form for macros)
//! 2. **Bind it** in the `install` function of the matching submodule, declaring its
//!    parameter names and help text
//! 3. **Add tests** covering positional and keyword calls and the error cases

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use tracing::debug;

use crate::ast::Expr;
use crate::callable::{Macro, MacroArgs, NativeArgs, NativeFunction};
use crate::compare::values_equal;
use crate::environment::Environment;
use crate::evaluator::eval;
use crate::number::Number;
use crate::{EvalError, Value};

mod contexts;
mod dates;
mod lists;
mod numbers;
mod ranges;
mod strings;

/// A read-only table of names visible beneath every scope.
#[derive(Debug, Default)]
pub struct Prelude {
    vars: HashMap<String, Value>,
}

static GLOBAL: LazyLock<Arc<Prelude>> = LazyLock::new(|| Arc::new(Prelude::standard()));

impl Prelude {
    /// A prelude with no names at all.
    pub fn empty() -> Self {
        Prelude::default()
    }

    /// A freshly built copy of the standard library.
    pub fn standard() -> Self {
        let mut prelude = Prelude::empty();
        install_core(&mut prelude);
        numbers::install(&mut prelude);
        strings::install(&mut prelude);
        lists::install(&mut prelude);
        contexts::install(&mut prelude);
        dates::install(&mut prelude);
        ranges::install(&mut prelude);
        debug!(names = prelude.vars.len(), "prelude loaded");
        prelude
    }

    /// The shared standard prelude.
    pub fn global() -> Arc<Prelude> {
        Arc::clone(&GLOBAL)
    }

    /// Registers `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already bound; preludes are assembled once at start-up.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        if self.vars.contains_key(name) {
            panic!("prelude name '{name}' already bound");
        }
        self.vars.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// All bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn install_core(prelude: &mut Prelude) {
    prelude
        .bind(
            "block",
            Macro::new(builtin_block)
                .vararg("expression list")
                .help("evaluate a sequence of expressions and return the last result"),
        )
        .bind(
            "help",
            Macro::new(builtin_help)
                .required(["value"])
                .help("the help text of a builtin, or the type of any other value"),
        )
        .bind(
            "typeof",
            Macro::new(builtin_typeof)
                .required(["value"])
                .help("the type name of a value"),
        )
        .bind(
            "is defined",
            Macro::new(builtin_is_defined)
                .required(["value"])
                .help("whether a name resolves, or an expression evaluates without a missing key or index"),
        )
        .bind(
            "bind",
            Macro::new(builtin_bind)
                .required(["name", "value"])
                .help("bind value to name in the innermost scope"),
        )
        .bind(
            "set",
            Macro::new(builtin_set)
                .required(["name", "value"])
                .help("update name in the scope that defines it, or bind it in the innermost scope"),
        )
        .bind(
            "string",
            NativeFunction::new(builtin_string)
                .required(["from"])
                .help("the text form of a value"),
        )
        .bind(
            "number",
            NativeFunction::new(builtin_number)
                .required(["from"])
                .help("parse a decimal number from a string"),
        )
        .bind(
            "not",
            NativeFunction::new(builtin_not)
                .required(["negand"])
                .help("logical negation of a value's truthiness"),
        )
        .bind(
            "is",
            NativeFunction::new(builtin_is)
                .required(["value1", "value2"])
                .help("whether two values have the same type and are equal"),
        );
}

fn builtin_block(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let mut last = Value::Null;
    for node in args.rest() {
        last = eval(node, env)?;
    }
    Ok(last)
}

fn builtin_help(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let value = eval(args.required("value")?, env)?;
    let text = match &value {
        Value::Function(function) => function.help().unwrap_or(value.type_name()),
        other => other.type_name(),
    };
    Ok(Value::from(text))
}

fn builtin_typeof(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let value = eval(args.required("value")?, env)?;
    Ok(Value::from(value.type_name()))
}

fn builtin_is_defined(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let node = args.required("value")?;
    if let Expr::Var(name) = &node.expr {
        return Ok(Value::Bool(env.resolve(name).is_some()));
    }
    match eval(node, env) {
        Ok(_) => Ok(Value::Bool(true)),
        Err(EvalError::KeyNotFound(_) | EvalError::Index(_)) => Ok(Value::Bool(false)),
        Err(err) => Err(err),
    }
}

fn name_and_value(args: &MacroArgs<'_>, env: &mut Environment) -> Result<(String, Value), EvalError> {
    let name = match eval(args.required("name")?, env)? {
        Value::String(name) => name,
        _ => return Err(EvalError::type_mismatch("string")),
    };
    let value = eval(args.required("value")?, env)?;
    Ok((name, value))
}

fn builtin_bind(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let (name, value) = name_and_value(args, env)?;
    env.bind(name, value.clone());
    Ok(value)
}

fn builtin_set(args: &MacroArgs<'_>, env: &mut Environment) -> Result<Value, EvalError> {
    let (name, value) = name_and_value(args, env)?;
    env.set(name, value.clone());
    Ok(value)
}

fn builtin_string(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::String(args.required("from")?.to_text()))
}

fn builtin_number(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    match args.required("from")? {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        Value::String(s) => Ok(Value::Number(s.trim().parse()?)),
        _ => Err(EvalError::type_mismatch("string")),
    }
}

fn builtin_not(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Bool(!args.required("negand")?.is_truthy()))
}

fn builtin_is(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let a = args.required("value1")?;
    let b = args.required("value2")?;
    Ok(Value::Bool(a.type_name() == b.type_name() && a == b))
}

// Argument accessors shared by the builtin submodules.

pub(crate) fn number_arg<'a>(args: &'a NativeArgs, name: &str) -> Result<&'a Number, EvalError> {
    match args.required(name)? {
        Value::Number(n) => Ok(n),
        _ => Err(EvalError::type_mismatch("number")),
    }
}

/// An integral number argument, such as a position or a length.
pub(crate) fn integer_arg(args: &NativeArgs, name: &str) -> Result<i64, EvalError> {
    let n = number_arg(args, name)?;
    match n.to_i64() {
        Some(i) if n.is_integer() => Ok(i),
        _ => Err(EvalError::value(format!("{name} must be an integer, got {n}"))),
    }
}

/// An optional integral argument; absent and null are both `None`.
pub(crate) fn optional_integer_arg(args: &NativeArgs, name: &str) -> Result<Option<i64>, EvalError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => integer_arg(args, name).map(Some),
    }
}

pub(crate) fn string_arg<'a>(args: &'a NativeArgs, name: &str) -> Result<&'a str, EvalError> {
    match args.required(name)? {
        Value::String(s) => Ok(s),
        _ => Err(EvalError::type_mismatch("string")),
    }
}

pub(crate) fn optional_string_arg<'a>(args: &'a NativeArgs, name: &str) -> Result<Option<&'a str>, EvalError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(EvalError::type_mismatch("string")),
    }
}

pub(crate) fn list_arg<'a>(args: &'a NativeArgs, name: &str) -> Result<&'a [Value], EvalError> {
    match args.required(name)? {
        Value::List(items) => Ok(items),
        _ => Err(EvalError::type_mismatch("list")),
    }
}

/// The items of a variadic aggregate: `f([1, 2, 3])` and `f(1, 2, 3)` both
/// yield three items.
pub(crate) fn vararg_items(args: &NativeArgs) -> &[Value] {
    match args.rest() {
        [Value::List(items)] => items.as_slice(),
        items => items,
    }
}

/// Turns a 1-based position (negative counts from the end) into an index into a
/// sequence of `len` items.
pub(crate) fn position_index(position: i64, len: usize) -> Result<usize, EvalError> {
    let len = i64::try_from(len).map_err(|_| EvalError::index("index out of range"))?;
    let index = match position {
        p if p >= 1 && p <= len => p - 1,
        p if p <= -1 && -p <= len => len + p,
        _ => return Err(EvalError::index("index out of range")),
    };
    usize::try_from(index).map_err(|_| EvalError::index("index out of range"))
}

/// Index bounds for `substring` and `sublist`: a 1-based start (negative counts from
/// the end) and an optional length, clamped to a sequence of `len` items.
pub(crate) fn slice_bounds(start: i64, length: Option<i64>, len: usize) -> (usize, usize) {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = match start {
        p if p > 0 => p - 1,
        p if p < 0 => len.saturating_add(p).max(0),
        _ => 0,
    }
    .min(len);
    let end = match length {
        Some(length) => start.saturating_add(length.max(0)).min(len),
        None => len,
    };
    let start = usize::try_from(start).unwrap_or(0);
    let end = usize::try_from(end).unwrap_or(start);
    (start, end.max(start))
}

/// Membership by value equality, as `list contains` and `distinct values` use it.
pub(crate) fn contains_value(items: &[Value], item: &Value) -> bool {
    items.iter().any(|entry| values_equal(entry, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate;

    #[test]
    fn test_standard_names() {
        let prelude = Prelude::standard();
        for name in ["block", "typeof", "count", "substring", "date and time", "met by"] {
            assert!(prelude.get(name).is_some(), "{name} is not bound");
        }
        let names = prelude.names();
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_duplicate_binding_panics() {
        let mut prelude = Prelude::standard();
        prelude.bind("count", Value::Null);
    }

    #[test]
    fn test_custom_prelude() {
        fn answer(_args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
            Ok(Value::from(42))
        }
        let mut prelude = Prelude::empty();
        prelude.bind("answer", NativeFunction::new(answer));
        let mut env = Environment::with_prelude(Arc::new(prelude));
        let node = crate::parser::parse("answer()").unwrap();
        assert_eq!(eval(&node, &mut env).unwrap(), Value::from(42));
        assert_eq!(env.resolve("count"), None);
    }

    #[test]
    fn test_core_macros() {
        assert_eq!(evaluate("block(1, 2, 3)").unwrap(), Value::from(3));
        assert_eq!(evaluate("block()").unwrap(), Value::Null);
        assert_eq!(evaluate("typeof([1])").unwrap(), Value::from("list"));
        assert_eq!(evaluate("typeof(@\"P1D\")").unwrap(), Value::from("duration"));
        assert_eq!(
            evaluate("help(block)").unwrap(),
            Value::from("evaluate a sequence of expressions and return the last result")
        );
        assert_eq!(evaluate("help(3)").unwrap(), Value::from("number"));
        assert_eq!(evaluate("help(function(x) x)").unwrap(), Value::from("function"));
    }

    #[test]
    fn test_is_defined() {
        assert_eq!(evaluate("is defined(count)").unwrap(), Value::Bool(true));
        assert_eq!(evaluate("is defined(nothing here)").unwrap(), Value::Bool(false));
        assert_eq!(evaluate("is defined({a: 1}.b)").unwrap(), Value::Bool(false));
        assert_eq!(evaluate("is defined([1, 2][5])").unwrap(), Value::Bool(false));
        assert_eq!(evaluate("is defined({a: 1}.a)").unwrap(), Value::Bool(true));
        assert!(evaluate("is defined(1 / 0)").is_err());
    }

    #[test]
    fn test_bind_and_set() {
        assert_eq!(evaluate("block(bind(\"x\", 5), x * 2)").unwrap(), Value::from(10));
        assert_eq!(evaluate("block(set(\"y\", 1), set(\"y\", y + 1), y)").unwrap(), Value::from(2));
        assert_eq!(
            evaluate("bind(1, 2)"),
            Err(crate::Error::Eval(EvalError::type_mismatch("string")))
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(evaluate("string(123)").unwrap(), Value::from("123"));
        assert_eq!(evaluate("string(\"abc\")").unwrap(), Value::from("abc"));
        assert_eq!(evaluate("string([1, \"a\"])").unwrap(), Value::from("[1, \"a\"]"));
        assert_eq!(evaluate("number(\"1.50\")").unwrap(), Value::Number("1.5".parse().unwrap()));
        assert!(matches!(evaluate("number(\"abc\")"), Err(crate::Error::Eval(EvalError::Value(_)))));
        assert!(matches!(
            evaluate("number(\"1e999999999\")"),
            Err(crate::Error::Eval(EvalError::Value(_)))
        ));
        assert_eq!(evaluate("number(\"2.5e2\")").unwrap(), Value::from(250));
        assert_eq!(evaluate("not(true)").unwrap(), Value::Bool(false));
        assert_eq!(evaluate("not(1 > 5)").unwrap(), Value::Bool(true));
        assert_eq!(evaluate("is(1, 1.0)").unwrap(), Value::Bool(true));
        assert_eq!(evaluate("is(1, \"1\")").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(2, Some(2), 6), (1, 3));
        assert_eq!(slice_bounds(-2, None, 6), (4, 6));
        assert_eq!(slice_bounds(10, None, 6), (6, 6));
        assert_eq!(slice_bounds(1, Some(-1), 6), (0, 0));
        assert_eq!(slice_bounds(-10, Some(2), 6), (0, 2));
    }

    #[test]
    fn test_position_index() {
        assert_eq!(position_index(1, 3), Ok(0));
        assert_eq!(position_index(3, 3), Ok(2));
        assert_eq!(position_index(-1, 3), Ok(2));
        assert_eq!(position_index(-3, 3), Ok(0));
        assert!(position_index(0, 3).is_err());
        assert!(position_index(4, 3).is_err());
        assert!(position_index(-4, 3).is_err());
    }
}
