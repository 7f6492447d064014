//! A FEEL-style decision expression evaluator.
//!
//! Expressions are parsed into an [`ast::Node`] tree and evaluated by a tree-walking
//! interpreter against an [`Environment`] (a stack of scopes backed by a shared,
//! read-only [`Prelude`] of built-in functions).
//!
//! ```
//! use feelxp::{evaluate, evaluate_with_scope, Value};
//!
//! assert_eq!(evaluate("5 in [5..8)").unwrap(), Value::Bool(true));
//! assert_eq!(
//!     evaluate_with_scope("if a > 3 then \"big\" else \"small\"", [("a", 4)]).unwrap(),
//!     Value::from("big"),
//! );
//! ```
//!
//! Evaluation is recursive; deeply nested expressions or unbounded user recursion are
//! limited only by the host thread's stack.

use thiserror::Error;

pub mod ast;
pub mod builtinops;
pub mod callable;
pub mod compare;
pub mod environment;
pub mod evaluator;
#[cfg(feature = "json")]
pub mod json;
pub mod number;
pub mod operators;
pub mod parser;
pub mod range;
pub mod temporal;
pub mod value;

pub use builtinops::Prelude;
pub use environment::{Environment, Scope};
pub use number::Number;
pub use value::Value;

/// Errors raised while evaluating a parsed expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("index error: {0}")]
    Index(String),
    #[error("type mismatch, expect {0}")]
    TypeMismatch(String),
    #[error("value error: {0}")]
    Value(String),
    #[error("missing keyword argument: {0}")]
    MissingKeywordArgument(String),
    #[error("too few arguments, missing {}", .0.join(", "))]
    TooFewArguments(Vec<String>),
    #[error("too many arguments")]
    TooManyArguments,
    #[error("bad operator: {left} {op} {right}")]
    BadOperator {
        left: &'static str,
        op: &'static str,
        right: &'static str,
    },
}

impl EvalError {
    pub(crate) fn type_mismatch(expected: &str) -> Self {
        EvalError::TypeMismatch(expected.to_string())
    }

    pub(crate) fn value(msg: impl Into<String>) -> Self {
        EvalError::Value(msg.into())
    }

    pub(crate) fn index(msg: &str) -> Self {
        EvalError::Index(msg.to_string())
    }
}

/// Errors raised while turning source text into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// `trace` lists the grammar rules that were active, innermost first.
    #[error("unexpected {found} at {line}:{column}, expect {}", expected_list(.expected))]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
        expected: Vec<String>,
        trace: Vec<String>,
    },
    #[error("unexpected trailing input at {line}:{column}")]
    TrailingInput { line: usize, column: usize },
}

fn expected_list(expected: &[String]) -> String {
    if expected.is_empty() {
        "expression".to_string()
    } else {
        expected.join(" or ")
    }
}

/// Any failure of [`evaluate`]: either the source did not parse, or evaluation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parse and evaluate `source` in a fresh environment.
pub fn evaluate(source: &str) -> Result<Value, Error> {
    evaluate_with_scope(source, Scope::new())
}

/// Parse and evaluate `source` with `scope` pushed on top of a fresh environment.
///
/// Host values are converted with [`Into<Value>`], so plain integers and floats arrive
/// as [`Number`]s.
#[tracing::instrument(level = "trace", skip_all, fields(len = source.len()))]
pub fn evaluate_with_scope<K, V, I>(source: &str, scope: I) -> Result<Value, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let node = parser::parse(source)?;
    let mut env = Environment::new();
    env.push(
        scope
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect(),
    );
    Ok(evaluator::eval(&node, &mut env)?)
}
