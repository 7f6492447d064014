use std::sync::Arc;
use std::thread;

use feelxp::callable::{NativeArgs, NativeFunction};
use feelxp::{Environment, Error, EvalError, Number, Prelude, Value, evaluate, evaluate_with_scope, evaluator, parser};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Helper function to parse and evaluate a string expression
fn eval_string(input: &str, env: &mut Environment) -> Result<Value, Error> {
    let node = parser::parse(input)?;
    Ok(evaluator::eval(&node, env)?)
}

/// Helper function to parse and evaluate with fresh environment
fn eval_fresh(input: &str) -> Value {
    evaluate(input).unwrap_or_else(|e| panic!("{input}: {e}"))
}

fn eval_err(input: &str) -> EvalError {
    match evaluate(input) {
        Err(Error::Eval(err)) => err,
        other => panic!("{input}: expected an evaluation error, got {other:?}"),
    }
}

fn num(text: &str) -> Value {
    Value::Number(text.parse().unwrap())
}

#[test]
fn test_scenarios() {
    assert_eq!(eval_fresh("5 in (5..8]"), Value::Bool(false));
    assert_eq!(eval_fresh("5 in [5..8)"), Value::Bool(true));
    assert_eq!(
        eval_fresh(r#"append(["hello"], " ", "world")"#),
        Value::from(vec!["hello", " ", "world"])
    );
    assert_eq!(eval_fresh(r#"median([3, 5, 9, 1, "hello", -2])"#), Value::from(3));
    assert_eq!(eval_fresh("sort([8, -1, 3], (x, y) => x > y)"), Value::from(vec![8, 3, -1]));
    assert_eq!(
        eval_fresh(r#"insert before(["a", "c"], 1, "b")"#),
        Value::from(vec!["b", "a", "c"])
    );
}

#[test]
fn test_exact_decimals() {
    assert_eq!(eval_fresh("0.1 + 0.2"), num("0.3"));
    assert_eq!(eval_fresh("0.1 + 0.2 = 0.3"), Value::Bool(true));
    assert_eq!(eval_fresh("1.10 * 3"), num("3.3"));
    assert_eq!(eval_fresh("7 / 2"), Value::from(3));
    assert_eq!(eval_fresh("-7 % 3"), Value::from(-1));
    assert_eq!(eval_fresh("modulo(-7, 3)"), Value::from(2));
    assert_eq!(eval_err("1 / 0"), EvalError::Value("division by zero".into()));
}

#[test]
fn test_one_based_indexing() {
    assert_eq!(eval_fresh("[10, 20, 30][1]"), Value::from(10));
    assert_eq!(eval_fresh("[10, 20, 30][3]"), Value::from(30));
    assert!(matches!(eval_err("[10, 20, 30][0]"), EvalError::Index(_)));
    assert!(matches!(eval_err("[10, 20, 30][4]"), EvalError::Index(_)));
    assert_eq!(eval_fresh(r#"{a: 1}["a"]"#), Value::from(1));
    assert_eq!(eval_err(r#"{a: 1}["b"]"#), EvalError::KeyNotFound("b".into()));
    assert!(matches!(eval_err("5[1]"), EvalError::Index(_)));
}

#[test]
fn test_range_boundaries() {
    assert_eq!(eval_fresh("1 in [1..5)"), Value::Bool(true));
    assert_eq!(eval_fresh("5 in [1..5)"), Value::Bool(false));
    assert_eq!(eval_fresh("1 in (1..5]"), Value::Bool(false));
    assert_eq!(eval_fresh("5 in (1..5]"), Value::Bool(true));
    assert_eq!(eval_fresh(r#""b" in ["a".."c"]"#), Value::Bool(true));
    assert_eq!(
        eval_fresh(r#"date("2024-02-10") in [date("2024-01-01")..date("2024-12-31")]"#),
        Value::Bool(true)
    );
}

#[test]
fn test_meets_excludes_overlaps() {
    assert_eq!(eval_fresh("meets([1..5], [5..9])"), Value::Bool(true));
    assert_eq!(eval_fresh("overlaps([1..5], [5..9])"), Value::Bool(false));
    assert_eq!(eval_fresh("meets((1..5), [5..9])"), Value::Bool(false));
}

#[test]
fn test_keyword_and_positional_agree() {
    let pairs = [
        (r#"substring("foobar", 2, 3)"#, r#"substring(string: "foobar", start position: 2, length: 3)"#),
        ("decimal(1.2345, 2)", "decimal(n: 1.2345, scale: 2)"),
        ("before(1, [2..3])", "before(b: [2..3], a: 1)"),
        ("sublist([4, 5, 6], 1, 2)", "sublist(list: [4, 5, 6], start position: 1, length: 2)"),
    ];
    for (positional, keyword) in pairs {
        assert_eq!(eval_fresh(positional), eval_fresh(keyword), "{keyword}");
    }
    assert_eq!(
        eval_err(r#"substring(start position: 2)"#),
        EvalError::MissingKeywordArgument("string".into())
    );
}

#[test]
fn test_scope_restored_after_errors() {
    let mut env = Environment::new();
    eval_string("bind(\"boom\", function(x) x / 0)", &mut env).unwrap();
    let depth = env.depth();
    for source in ["boom(1)", "boom(x: 1)", "for i in [1, 2] return boom(i)", "sort([2, 1], (a, b) => a / 0)"] {
        assert!(eval_string(source, &mut env).is_err(), "{source}");
        assert_eq!(env.depth(), depth, "{source}");
        assert_eq!(env.resolve("x"), None, "{source}");
    }
}

#[test]
fn test_equality_is_lenient() {
    assert_eq!(eval_fresh(r#"1 = "1""#), Value::Bool(false));
    assert_eq!(eval_fresh(r#"1 != "1""#), Value::Bool(true));
    assert!(matches!(eval_err(r#"1 < "1""#), EvalError::TypeMismatch(_)));
    assert_eq!(
        eval_err(r#"1 + "1""#),
        EvalError::BadOperator {
            left: "number",
            op: "+",
            right: "string"
        }
    );
}

#[test]
fn test_list_order_quirk() {
    // A list that is a prefix of another sorts after it.
    assert_eq!(eval_fresh("[1, 2] > [1, 2, 3]"), Value::Bool(true));
    assert_eq!(eval_fresh("[1, 3] > [1, 2, 3]"), Value::Bool(true));
    assert_eq!(eval_fresh("[1, 2] = [1, 2]"), Value::Bool(true));
}

#[test]
fn test_temporal_arithmetic() {
    assert_eq!(
        eval_fresh(r#"date("2024-01-31") + duration("P1M")"#),
        eval_fresh(r#"date("2024-02-29")"#)
    );
    assert_eq!(
        eval_fresh(r#"date and time("2024-03-01T10:00:00") - duration("PT12H")"#),
        eval_fresh(r#"date and time("2024-02-29T22:00:00")"#)
    );
    assert_eq!(
        eval_fresh(r#"date and time("2024-03-02T00:00:00") - date and time("2024-03-01T12:00:00")"#),
        eval_fresh(r#"duration("PT12H")"#)
    );
    assert_eq!(eval_fresh(r#"duration("P1D") > duration("PT23H")"#), Value::Bool(true));
    assert_eq!(eval_fresh(r#"date("2024-05-17").year"#), Value::from(2024));
}

#[test]
fn test_membership_uses_value_equality() {
    assert_eq!(eval_fresh(r#"@"10:00:00+02:00" in [@"08:00:00Z"]"#), Value::Bool(true));
    assert_eq!(eval_fresh(r#"@"10:00:00+02:00" in [@"10:00:00Z"]"#), Value::Bool(false));
    assert_eq!(eval_fresh("1.0 in [2, 1]"), Value::Bool(true));
    assert_eq!(eval_fresh(r#"duration("PT24H") in [duration("P1D")]"#), Value::Bool(true));
}

#[test]
fn test_duration_overflow_is_an_error() {
    assert!(matches!(eval_err(r#"@"P999999999999999D" = @"P1D""#), EvalError::Value(_)));
    assert!(matches!(
        eval_err(r#"date and time("2021-01-01T00:00:00") + duration("P106751991167300D")"#),
        EvalError::Value(_)
    ));
}

#[test]
fn test_host_scope_and_functions() {
    let result = evaluate_with_scope(
        "if applicant.age >= 18 and applicant.score > 0.7 then \"approve\" else \"refer\"",
        [(
            "applicant",
            Value::context([("age", Value::from(30)), ("score", Value::from(0.82))]),
        )],
    );
    assert_eq!(result.unwrap(), Value::from("approve"));

    let result = evaluate_with_scope("for r in rates return r * 100", [("rates", vec![0.05, 0.125])]);
    assert_eq!(result.unwrap(), Value::from(vec![num("5"), num("12.5")]));
}

fn builtin_double(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    match args.required("n")? {
        Value::Number(n) => Ok(Value::Number(n.add(n))),
        _ => Err(EvalError::TypeMismatch("number".into())),
    }
}

#[test]
fn test_custom_prelude() {
    let mut prelude = Prelude::standard();
    prelude.bind("double", NativeFunction::new(builtin_double).required(["n"]).help("n twice"));
    let mut env = Environment::with_prelude(Arc::new(prelude));
    assert_eq!(eval_string("double(21)", &mut env).unwrap(), Value::from(42));
    assert_eq!(eval_string("double(n: 1.5)", &mut env).unwrap(), num("3"));
    assert_eq!(eval_string("help(double)", &mut env).unwrap(), Value::from("n twice"));
    assert_eq!(eval_err("double(1)"), EvalError::TypeMismatch("function".into()));
}

#[test]
fn test_shared_prelude_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                evaluate_with_scope("sum(for x in [1, 2, 3] return x * k)", [("k", i)]).unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Value::from(0), Value::from(6), Value::from(12), Value::from(18)]);
}

#[test]
fn test_parse_errors() {
    assert!(matches!(evaluate("1 +"), Err(Error::Parse(_))));
    assert!(matches!(evaluate("[1, 2"), Err(Error::Parse(_))));
    assert!(matches!(evaluate("f(a: 1, 2)"), Err(Error::Parse(_))));
    assert_eq!(evaluate("").unwrap(), Value::Null);
}

fn decimal_text() -> impl Strategy<Value = String> {
    (-1_000_000i64..1_000_000, 0u32..6).prop_map(|(mantissa, scale)| Number::new(mantissa, scale).to_string())
}

proptest! {
    #[test]
    fn prop_add_then_subtract_is_identity(a in decimal_text(), b in decimal_text()) {
        let a: Number = a.parse().unwrap();
        let b: Number = b.parse().unwrap();
        let result = evaluate_with_scope("a + b - b", [("a", a.clone()), ("b", b)]).unwrap();
        prop_assert_eq!(result, Value::Number(a));
    }

    #[test]
    fn prop_number_text_round_trips(a in decimal_text()) {
        let parsed: Number = a.parse().unwrap();
        let reparsed: Number = parsed.to_string().parse().unwrap();
        prop_assert_eq!(parsed, reparsed);
    }
}
