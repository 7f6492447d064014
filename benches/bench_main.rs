#![allow(clippy::unwrap_used)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use feelxp::{Environment, evaluator, parser};

const SIMPLE: &str = "1 + 2";
const NESTED: &str = "if 5 * 2 > 8 then max(10, 5, 20) else 0";
const DECISION: &str = r#"{
    base: if applicant.age < 25 then 0.08 else 0.05,
    surcharge: sum(for c in applicant.claims return c.amount) / 1000,
    band: if count(applicant.claims) in [0..3) then "low" else "high"
}"#;

// Recursive factorial through a bound user function
const FACTORIAL: &str =
    r#"bind("fact", function(n) if n <= 1 then 1 else n * fact(n - 1)); fact(20)"#;

const TEMPORAL: &str = r#"for d in [date("2024-01-31"), date("2024-02-29")] return d + duration("P1M")"#;

fn applicant_env() -> Environment {
    let mut env = Environment::new();
    let applicant = feelxp::evaluate(
        r#"{age: 31, claims: [{amount: 1200}, {amount: 350.5}, {amount: 90}]}"#,
    )
    .unwrap();
    env.bind("applicant", applicant);
    env
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parsing");

    group.bench_function("Simple", |b| b.iter(|| parser::parse(black_box(SIMPLE))));
    group.bench_function("Nested", |b| b.iter(|| parser::parse(black_box(NESTED))));
    group.bench_function("Decision", |b| b.iter(|| parser::parse(black_box(DECISION))));
    group.bench_function("Factorial", |b| b.iter(|| parser::parse(black_box(FACTORIAL))));

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Evaluation");

    let env = applicant_env();
    let simple = parser::parse(SIMPLE).unwrap();
    let nested = parser::parse(NESTED).unwrap();
    let decision = parser::parse(DECISION).unwrap();
    let factorial = parser::parse(FACTORIAL).unwrap();
    let temporal = parser::parse(TEMPORAL).unwrap();

    group.bench_function("Eval Simple", |b| {
        b.iter(|| evaluator::eval(black_box(&simple), &mut env.clone()))
    });

    group.bench_function("Eval Nested", |b| {
        b.iter(|| evaluator::eval(black_box(&nested), &mut env.clone()))
    });

    group.bench_function("Eval Decision", |b| {
        b.iter(|| evaluator::eval(black_box(&decision), &mut env.clone()))
    });

    group.bench_function("Eval Factorial", |b| {
        b.iter(|| evaluator::eval(black_box(&factorial), &mut env.clone()))
    });

    group.bench_function("Eval Temporal", |b| {
        b.iter(|| evaluator::eval(black_box(&temporal), &mut env.clone()))
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_evaluation);
criterion_main!(benches);
