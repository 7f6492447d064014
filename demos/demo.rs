use feelxp::{Environment, Value, evaluator, parser};

fn main() {
    println!("=== FEEL expression demo ===\n");

    let mut env = Environment::new();
    env.bind(
        "order",
        Value::context([
            ("total", Value::from(249.99)),
            ("items", Value::from(vec!["book", "lamp", "pen"])),
            ("placed", Value::Date(chrono_date(2024, 1, 31))),
        ]),
    );

    let cases = vec![
        // Arithmetic is decimal, not binary floating point
        ("0.1 + 0.2", "Exact decimals"),
        ("order.total * 1.2", "Tax on the order total"),
        // Ranges and unary tests
        ("order.total in [100..250)", "Range membership"),
        ("overlaps([1..5], [3..8])", "Interval relation"),
        // Lists and higher-order builtins
        ("for item in order.items return upper case(item)", "Iteration"),
        ("sort(order.items, (a, b) => string length(a) < string length(b))", "Sort with a comparator"),
        ("some x in [3, 8, 12] satisfies x > 5", "Quantifier"),
        // Temporal values
        ("order.placed + duration(\"P1M\")", "Calendar arithmetic"),
        ("day of week(order.placed)", "Calendar helper"),
        // Functions and contexts
        ("{rate: 0.05, apply: function(x) x * (1 + 0.05)}.apply(100)", "Function in a context"),
        ("get value({a: {b: 42}}, [\"a\", \"b\"])", "Context path"),
        // Errors are values, not crashes
        ("[1, 2, 3][4]", "Index out of range"),
        ("1 + \"one\"", "Bad operator"),
    ];

    for (source, description) in cases {
        println!("--- {description} ---");
        println!("FEEL:   {source}");

        let result = match parser::parse(source) {
            Ok(node) => match evaluator::eval(&node, &mut env) {
                Ok(value) => format!("{value}"),
                Err(e) => format!("Error: {e}"),
            },
            Err(e) => format!("Parse Error: {e}"),
        };
        println!("Result: {result}");
        println!();
    }

    println!("=== Demo Complete ===");
}

fn chrono_date(year: i32, month: u32, day: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
