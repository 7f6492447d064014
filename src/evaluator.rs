use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ast::{BinOp, Expr, Literal, Node};
use crate::callable::UserFunction;
use crate::environment::{Environment, Scope};
use crate::operators;
use crate::range::RangeValue;
use crate::{EvalError, Value, temporal};

/// Evaluate a node in the given environment
pub fn eval(node: &Node, env: &mut Environment) -> Result<Value, EvalError> {
    match &node.expr {
        Expr::Literal(literal) => eval_literal(literal),

        // Unbound names evaluate to null
        Expr::Var(name) => Ok(env.resolve(name).cloned().unwrap_or(Value::Null)),

        Expr::Binop {
            op: BinOp::And,
            left,
            right,
        } => Ok(Value::Bool(eval(left, env)?.is_truthy() && eval(right, env)?.is_truthy())),
        Expr::Binop {
            op: BinOp::Or,
            left,
            right,
        } => Ok(Value::Bool(eval(left, env)?.is_truthy() || eval(right, env)?.is_truthy())),
        Expr::Binop { op, left, right } => {
            let left = eval(left, env)?;
            let right = eval(right, env)?;
            operators::apply(*op, &left, &right)
        }

        Expr::Dot { left, attr } => {
            let target = eval(left, env)?;
            get_attr(&target, attr)
        }

        Expr::Call { callee, args } => match eval(callee, env)? {
            Value::Function(function) => function.call(args, env),
            _ => Err(EvalError::type_mismatch("function")),
        },

        Expr::FunDef { params, body } => Ok(Value::from(UserFunction {
            params: params.clone(),
            body: Arc::clone(body),
        })),

        Expr::If {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, env)?.is_truthy() {
                eval(then, env)
            } else {
                eval(otherwise, env)
            }
        }

        Expr::For { var, list, body } => {
            let items = eval_list(list, env)?;
            env.scoped(Scope::new(), |env| {
                items
                    .into_iter()
                    .map(|item| {
                        env.bind(var.as_str(), item);
                        eval(body, env)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            })
        }

        Expr::Some { var, list, filter } => {
            let items = eval_list(list, env)?;
            env.scoped(Scope::new(), |env| {
                for item in items {
                    env.bind(var.as_str(), item.clone());
                    if eval(filter, env)?.is_truthy() {
                        return Ok(item);
                    }
                }
                Ok(Value::Null)
            })
        }

        Expr::Every { var, list, filter } => {
            let items = eval_list(list, env)?;
            env.scoped(Scope::new(), |env| {
                let mut chosen = Vec::new();
                for item in items {
                    env.bind(var.as_str(), item.clone());
                    if eval(filter, env)?.is_truthy() {
                        chosen.push(item);
                    }
                }
                Ok(Value::List(chosen))
            })
        }

        Expr::Range {
            start,
            start_open,
            end,
            end_open,
        } => {
            let start = eval(start, env)?;
            let end = eval(end, env)?;
            Ok(Value::from(RangeValue::new(start, *start_open, end, *end_open)?))
        }

        Expr::Array(items) => Ok(Value::List(eval_args(items, env)?)),

        Expr::Context(entries) => {
            let mut context = BTreeMap::new();
            for (key, value) in entries {
                context.insert(key.clone(), eval(value, env)?);
            }
            Ok(Value::Context(context))
        }

        Expr::ExprList(nodes) => {
            let mut last = Value::Null;
            for node in nodes {
                last = eval(node, env)?;
            }
            Ok(last)
        }

        Expr::MultiTests(nodes) => {
            for node in nodes {
                if eval(node, env)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
    }
}

fn eval_literal(literal: &Literal) -> Result<Value, EvalError> {
    Ok(match literal {
        Literal::Number(n) => Value::Number(n.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::String(s) => Value::String(s.clone()),
        Literal::Temporal(text) => temporal::parse_literal(text)?,
    })
}

/// Helper function to evaluate a list of argument expressions
pub(crate) fn eval_args(args: &[Node], env: &mut Environment) -> Result<Vec<Value>, EvalError> {
    let mut evaluated = Vec::with_capacity(args.len());
    for arg in args {
        evaluated.push(eval(arg, env)?);
    }
    Ok(evaluated)
}

/// The iteration domain of `for`, `some` and `every`.
fn eval_list(node: &Node, env: &mut Environment) -> Result<Vec<Value>, EvalError> {
    match eval(node, env)? {
        Value::List(items) => Ok(items),
        _ => Err(EvalError::type_mismatch("list")),
    }
}

/// `value.attr` for contexts, ranges and temporal values.
pub fn get_attr(value: &Value, attr: &str) -> Result<Value, EvalError> {
    let found = match value {
        Value::Context(entries) => entries.get(attr).cloned(),
        Value::Range(range) => match attr {
            "start" => Some(range.start.clone()),
            "end" => Some(range.end.clone()),
            "start included" => Some(Value::Bool(!range.start_open)),
            "end included" => Some(Value::Bool(!range.end_open)),
            _ => None,
        },
        Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::Duration(_) => temporal::attr(value, attr),
        _ => return Err(EvalError::type_mismatch("context")),
    };
    found.ok_or_else(|| EvalError::KeyNotFound(attr.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval_string(input: &str) -> Result<Value, EvalError> {
        let node = parse(input).unwrap();
        let mut env = Environment::new();
        eval(&node, &mut env)
    }

    fn num(text: &str) -> Value {
        Value::Number(text.parse().unwrap())
    }

    #[test]
    fn test_literals_and_names() {
        assert_eq!(eval_string("42").unwrap(), Value::from(42));
        assert_eq!(eval_string("\"hi\"").unwrap(), Value::from("hi"));
        assert_eq!(eval_string("null").unwrap(), Value::Null);
        assert_eq!(eval_string("unbound name").unwrap(), Value::Null);
        assert!(matches!(eval_string("@\"2021-13-45\""), Err(EvalError::Value(_))));
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(eval_string("false and (1 / 0)").unwrap(), Value::Bool(false));
        assert_eq!(eval_string("true or (1 / 0)").unwrap(), Value::Bool(true));
        assert_eq!(eval_string("1 and \"x\"").unwrap(), Value::Bool(true));
        assert_eq!(eval_string("0 or \"\"").unwrap(), Value::Bool(false));
        assert!(eval_string("true and (1 / 0)").is_err());
    }

    #[test]
    fn test_if() {
        assert_eq!(eval_string("if 1 > 2 then \"a\" else \"b\"").unwrap(), Value::from("b"));
        assert_eq!(eval_string("if [1] then 1 else 2").unwrap(), Value::from(1));
        assert_eq!(eval_string("if null then 1 else 2").unwrap(), Value::from(2));
    }

    #[test]
    fn test_iteration() {
        assert_eq!(
            eval_string("for x in [1, 2, 3] return x * 2").unwrap(),
            Value::from(vec![2, 4, 6])
        );
        assert_eq!(
            eval_string("for a in [1, 2], b in [10, 20] return a + b").unwrap(),
            Value::from(vec![Value::from(vec![11, 21]), Value::from(vec![12, 22])])
        );
        assert_eq!(eval_string("some x in [1, 5, 7] satisfies x > 3").unwrap(), Value::from(5));
        assert_eq!(eval_string("some x in [1, 2] satisfies x > 3").unwrap(), Value::Null);
        assert_eq!(
            eval_string("every x in [1, 5, 7] satisfies x > 3").unwrap(),
            Value::from(vec![5, 7])
        );
        assert_eq!(
            eval_string("for x in 5 return x"),
            Err(EvalError::TypeMismatch("list".into()))
        );
    }

    #[test]
    fn test_iteration_restores_scope() {
        for source in [
            "for x in [1, 0] return 1 / x",
            "some x in [1, 0] satisfies 1 / x > 5",
            "every x in [1, 0] satisfies 1 / x > 5",
        ] {
            let node = parse(source).unwrap();
            let mut env = Environment::new();
            let depth = env.depth();
            assert!(eval(&node, &mut env).is_err());
            assert_eq!(env.depth(), depth, "{source}");
        }

        let node = parse("some x in [1, 5] satisfies x > 3").unwrap();
        let mut env = Environment::new();
        eval(&node, &mut env).unwrap();
        assert_eq!(env.depth(), 1);
        assert_eq!(env.resolve("x"), None);
    }

    #[test]
    fn test_dot_access() {
        assert_eq!(eval_string("{a: {b: 3}}.a.b").unwrap(), Value::from(3));
        assert_eq!(eval_string("{a: 1}.b"), Err(EvalError::KeyNotFound("b".into())));
        assert_eq!(eval_string("[1..5).end").unwrap(), Value::from(5));
        assert_eq!(eval_string("[1..5).end included").unwrap(), Value::Bool(false));
        assert_eq!(eval_string("@\"2021-03-04\".month").unwrap(), Value::from(3));
        assert_eq!(eval_string("@\"P1Y2M\".months").unwrap(), Value::from(2));
        assert_eq!(eval_string("5.x"), Err(EvalError::TypeMismatch("context".into())));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval_string("(function(a, b) a * b)(3, 4)").unwrap(), Value::from(12));
        assert_eq!(eval_string("((x) => x + 1)(1)").unwrap(), Value::from(2));
        assert_eq!(eval_string("(function(a, b) b)(b: 2, a: 1)").unwrap(), Value::from(2));
        assert_eq!(eval_string("(function(a, b) b)(a: 1, c: 2)").unwrap(), Value::Null);
        assert_eq!(
            eval_string("(function(a, b) b)(a: 1)"),
            Err(EvalError::TooFewArguments(vec!["b".into()]))
        );
        assert_eq!(
            eval_string("(function(a, b) a)(1)"),
            Err(EvalError::TooFewArguments(vec!["b".into()]))
        );
        assert_eq!(eval_string("(function(a) a)(1, 2)"), Err(EvalError::TooManyArguments));
        assert_eq!(eval_string("5(1)"), Err(EvalError::TypeMismatch("function".into())));
    }

    #[test]
    fn test_dynamic_scoping() {
        let node = parse("f(1)").unwrap();
        let mut env = Environment::new();
        env.bind("f", eval_string("function(a) a + offset").unwrap());
        env.bind("offset", Value::from(100));
        assert_eq!(eval(&node, &mut env).unwrap(), Value::from(101));
    }

    #[test]
    fn test_ranges_and_tests() {
        assert_eq!(eval_string("5 in [5..8)").unwrap(), Value::Bool(true));
        assert_eq!(eval_string("8 in [5..8)").unwrap(), Value::Bool(false));
        assert!(matches!(eval_string("[1..\"a\"]"), Err(EvalError::TypeMismatch(_))));

        let node = parse("< 3, > 10").unwrap();
        let mut env = Environment::new();
        env.bind("?", Value::from(12));
        assert_eq!(eval(&node, &mut env).unwrap(), Value::Bool(true));
        env.bind("?", Value::from(5));
        assert_eq!(eval(&node, &mut env).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_expression_list_and_context() {
        assert_eq!(eval_string("1; 2; 3").unwrap(), Value::from(3));
        assert_eq!(
            eval_string("{a: 1 + 1, \"b c\": [1.50]}").unwrap(),
            Value::context([("a", num("2")), ("b c", Value::from(vec![num("1.5")]))])
        );
    }
}
