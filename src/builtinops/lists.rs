//! List builtins.
//!
//! Aggregates (`count`, `sum`, `median`, ...) take either one list or the items as
//! separate arguments, and skip entries that are not numbers. Positions are 1-based;
//! negative positions count from the end.

use std::cmp::Ordering;

use super::{
    Prelude, contains_value, integer_arg, list_arg, optional_integer_arg, position_index, slice_bounds,
    vararg_items,
};
use crate::callable::{NativeArgs, NativeFunction};
use crate::compare::{compare, values_equal};
use crate::environment::Environment;
use crate::number::Number;
use crate::{EvalError, Value};

pub(super) fn install(prelude: &mut Prelude) {
    prelude
        .bind(
            "list contains",
            NativeFunction::new(builtin_list_contains)
                .required(["list", "element"])
                .help("whether element is equal to an item of list"),
        )
        .bind(
            "count",
            NativeFunction::new(builtin_count)
                .vararg("list")
                .help("number of items"),
        )
        .bind(
            "min",
            NativeFunction::new(builtin_min)
                .vararg("list")
                .help("the least item, or null for no items"),
        )
        .bind(
            "max",
            NativeFunction::new(builtin_max)
                .vararg("list")
                .help("the greatest item, or null for no items"),
        )
        .bind("sum", NativeFunction::new(builtin_sum).vararg("list"))
        .bind("product", NativeFunction::new(builtin_product).vararg("list"))
        .bind(
            "mean",
            NativeFunction::new(builtin_mean)
                .vararg("list")
                .help("arithmetic mean of the numbers, or null for none"),
        )
        .bind(
            "median",
            NativeFunction::new(builtin_median)
                .vararg("list")
                .help("middle number, or the mean of the two middle numbers"),
        )
        .bind(
            "stddev",
            NativeFunction::new(builtin_stddev)
                .vararg("list")
                .help("sample standard deviation, or null for fewer than two numbers"),
        )
        .bind(
            "mode",
            NativeFunction::new(builtin_mode)
                .vararg("list")
                .help("the most frequent numbers, ascending"),
        )
        .bind(
            "all",
            NativeFunction::new(builtin_all)
                .vararg("list")
                .help("false if any item is false, null if any is not a boolean, else true"),
        )
        .bind("and", NativeFunction::new(builtin_all).vararg("list"))
        .bind(
            "any",
            NativeFunction::new(builtin_any)
                .vararg("list")
                .help("true if any item is true, null if any is not a boolean, else false"),
        )
        .bind("or", NativeFunction::new(builtin_any).vararg("list"))
        .bind(
            "sublist",
            NativeFunction::new(builtin_sublist)
                .required(["list", "start position"])
                .optional(["length"]),
        )
        .bind(
            "append",
            NativeFunction::new(builtin_append)
                .required(["list"])
                .vararg("items"),
        )
        .bind(
            "concatenate",
            NativeFunction::new(builtin_concatenate).vararg("lists"),
        )
        .bind(
            "insert before",
            NativeFunction::new(builtin_insert_before).required(["list", "position", "newItem"]),
        )
        .bind(
            "remove",
            NativeFunction::new(builtin_remove).required(["list", "position"]),
        )
        .bind("reverse", NativeFunction::new(builtin_reverse).required(["list"]))
        .bind(
            "index of",
            NativeFunction::new(builtin_index_of)
                .required(["list", "match"])
                .help("positions of the items equal to match"),
        )
        .bind(
            "union",
            NativeFunction::new(builtin_union)
                .vararg("lists")
                .help("concatenation of lists without duplicates"),
        )
        .bind(
            "distinct values",
            NativeFunction::new(builtin_distinct_values).required(["list"]),
        )
        .bind("flatten", NativeFunction::new(builtin_flatten).required(["list"]))
        .bind(
            "sort",
            NativeFunction::new(builtin_sort)
                .required(["list"])
                .optional(["precedes"])
                .help("sort ascending, or by a function(x, y) that is true when x goes before y"),
        )
        .bind(
            "list replace",
            NativeFunction::new(builtin_list_replace)
                .required(["list", "position", "newItem"])
                .help("replace the item at a position, or every item for which function(item, newItem) is true"),
        );
}

fn numbers(items: &[Value]) -> Vec<&Number> {
    items.iter().filter_map(Value::as_number).collect()
}

fn builtin_list_contains(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let list = list_arg(args, "list")?;
    Ok(Value::Bool(contains_value(list, args.required("element")?)))
}

fn builtin_count(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::from(vararg_items(args).len()))
}

/// The item ordered `wanted` against all others; incomparable items are skipped.
fn extreme(items: &[Value], wanted: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for item in items {
        match best {
            None => best = Some(item),
            Some(current) => {
                if compare(item, current) == Ok(wanted) {
                    best = Some(item);
                }
            }
        }
    }
    best.cloned().unwrap_or(Value::Null)
}

fn builtin_min(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(extreme(vararg_items(args), Ordering::Less))
}

fn builtin_max(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(extreme(vararg_items(args), Ordering::Greater))
}

fn sum(numbers: &[&Number]) -> Number {
    numbers.iter().fold(Number::zero(), |acc, n| acc.add(n))
}

fn mean(numbers: &[&Number]) -> Result<Number, EvalError> {
    sum(numbers).float_div(&Number::from(numbers.len()))
}

fn builtin_sum(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Number(sum(&numbers(vararg_items(args)))))
}

fn builtin_product(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let product = numbers(vararg_items(args))
        .into_iter()
        .fold(Number::one(), |acc, n| acc.mul(n));
    Ok(Value::Number(product))
}

fn builtin_mean(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let numbers = numbers(vararg_items(args));
    if numbers.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Number(mean(&numbers)?))
}

fn builtin_median(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut numbers = numbers(vararg_items(args));
    numbers.sort();
    let mid = numbers.len() / 2;
    Ok(match numbers.len() {
        0 => Value::Null,
        n if n % 2 == 1 => Value::Number(numbers[mid].clone()),
        _ => Value::Number(numbers[mid - 1].add(numbers[mid]).float_div(&Number::from(2))?),
    })
}

fn builtin_stddev(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let numbers = numbers(vararg_items(args));
    if numbers.len() < 2 {
        return Ok(Value::Null);
    }
    let mean = mean(&numbers)?;
    let squares = numbers.iter().fold(Number::zero(), |acc, n| {
        let deviation = n.sub(&mean);
        acc.add(&deviation.mul(&deviation))
    });
    let variance = squares.float_div(&Number::from(numbers.len() - 1))?;
    Ok(Value::Number(variance.sqrt()?))
}

fn builtin_mode(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut numbers = numbers(vararg_items(args));
    numbers.sort();
    let mut runs: Vec<(&Number, usize)> = Vec::new();
    for n in numbers {
        match runs.last_mut() {
            Some((last, count)) if *last == n => *count += 1,
            _ => runs.push((n, 1)),
        }
    }
    let top = runs.iter().map(|(_, count)| *count).max().unwrap_or(0);
    Ok(runs
        .into_iter()
        .filter(|(_, count)| *count == top)
        .map(|(n, _)| Value::Number(n.clone()))
        .collect())
}

fn builtin_all(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let items = vararg_items(args);
    if items.contains(&Value::Bool(false)) {
        return Ok(Value::Bool(false));
    }
    if items.iter().all(|item| item == &Value::Bool(true)) {
        Ok(Value::Bool(true))
    } else {
        Ok(Value::Null)
    }
}

fn builtin_any(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let items = vararg_items(args);
    if items.contains(&Value::Bool(true)) {
        return Ok(Value::Bool(true));
    }
    if items.iter().all(|item| item == &Value::Bool(false)) {
        Ok(Value::Bool(false))
    } else {
        Ok(Value::Null)
    }
}

fn builtin_sublist(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let list = list_arg(args, "list")?;
    let (start, end) = slice_bounds(
        integer_arg(args, "start position")?,
        optional_integer_arg(args, "length")?,
        list.len(),
    );
    Ok(Value::List(list[start..end].to_vec()))
}

fn builtin_append(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut list = list_arg(args, "list")?.to_vec();
    list.extend(args.rest().iter().cloned());
    Ok(Value::List(list))
}

/// Each argument of a variadic list builtin, required to be a list.
fn lists(args: &NativeArgs) -> Result<Vec<&[Value]>, EvalError> {
    args.rest()
        .iter()
        .map(|arg| arg.as_list().ok_or_else(|| EvalError::type_mismatch("list")))
        .collect()
}

fn builtin_concatenate(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::List(lists(args)?.concat()))
}

fn builtin_insert_before(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut list = list_arg(args, "list")?.to_vec();
    let at = position_index(integer_arg(args, "position")?, list.len())?;
    list.insert(at, args.required("newItem")?.clone());
    Ok(Value::List(list))
}

fn builtin_remove(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut list = list_arg(args, "list")?.to_vec();
    let at = position_index(integer_arg(args, "position")?, list.len())?;
    list.remove(at);
    Ok(Value::List(list))
}

fn builtin_reverse(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(list_arg(args, "list")?.iter().rev().cloned().collect())
}

fn builtin_index_of(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let wanted = args.required("match")?;
    Ok(list_arg(args, "list")?
        .iter()
        .enumerate()
        .filter(|(_, item)| values_equal(item, wanted))
        .map(|(i, _)| Value::from(i + 1))
        .collect())
}

fn distinct<'a>(items: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = Vec::new();
    for item in items {
        if !contains_value(&seen, item) {
            seen.push(item.clone());
        }
    }
    seen
}

fn builtin_union(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::List(distinct(lists(args)?.into_iter().flatten())))
}

fn builtin_distinct_values(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::List(distinct(list_arg(args, "list")?)))
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

fn builtin_flatten(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut flat = Vec::new();
    flatten_into(list_arg(args, "list")?, &mut flat);
    Ok(Value::List(flat))
}

/// Stable merge sort with a fallible `precedes` test. A right-hand item moves
/// ahead of a left-hand one only when it strictly precedes it, so a `precedes`
/// that is not a strict order still yields some permutation of the input.
fn sort_by(
    items: &[Value],
    mut precedes: impl FnMut(&Value, &Value) -> Result<bool, EvalError>,
) -> Result<Vec<Value>, EvalError> {
    let mut sorted = items.to_vec();
    let mut buffer = Vec::with_capacity(sorted.len());
    let mut width = 1;
    while width < sorted.len() {
        let mut start = 0;
        while start < sorted.len() {
            let mid = (start + width).min(sorted.len());
            let end = (start + 2 * width).min(sorted.len());
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if precedes(&sorted[j], &sorted[i])? {
                    buffer.push(sorted[j].clone());
                    j += 1;
                } else {
                    buffer.push(sorted[i].clone());
                    i += 1;
                }
            }
            buffer.extend_from_slice(&sorted[i..mid]);
            buffer.extend_from_slice(&sorted[j..end]);
            start = end;
        }
        std::mem::swap(&mut sorted, &mut buffer);
        buffer.clear();
        width *= 2;
    }
    Ok(sorted)
}

fn builtin_sort(args: &NativeArgs, env: &mut Environment) -> Result<Value, EvalError> {
    let list = list_arg(args, "list")?;
    let sorted = match args.get("precedes") {
        None | Some(Value::Null) => sort_by(list, |a, b| Ok(compare(a, b)? == Ordering::Less))?,
        Some(Value::Function(precedes)) => sort_by(list, |a, b| {
            Ok(precedes
                .call_with_values(vec![a.clone(), b.clone()], env)?
                .is_truthy())
        })?,
        Some(_) => return Err(EvalError::type_mismatch("function")),
    };
    Ok(Value::List(sorted))
}

fn builtin_list_replace(args: &NativeArgs, env: &mut Environment) -> Result<Value, EvalError> {
    let mut list = list_arg(args, "list")?.to_vec();
    let new_item = args.required("newItem")?;
    match args.required("position")? {
        Value::Function(matcher) => {
            for item in list.iter_mut() {
                let hit = matcher
                    .call_with_values(vec![item.clone(), new_item.clone()], env)?
                    .is_truthy();
                if hit {
                    *item = new_item.clone();
                }
            }
        }
        Value::Number(_) => {
            let at = position_index(integer_arg(args, "position")?, list.len())?;
            list[at] = new_item.clone();
        }
        _ => return Err(EvalError::type_mismatch("number")),
    }
    Ok(Value::List(list))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{EvalError, Value, evaluate};

    fn eval_ok(source: &str) -> Value {
        evaluate(source).unwrap()
    }

    fn num(text: &str) -> Value {
        Value::Number(text.parse().unwrap())
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval_ok("count([1, 2, 3])"), num("3"));
        assert_eq!(eval_ok("count(1, 2)"), num("2"));
        assert_eq!(eval_ok("count()"), num("0"));
        assert_eq!(eval_ok("min([1, 2, 3])"), num("1"));
        assert_eq!(eval_ok("min([\"a\", \"b\", \"c\"])"), Value::from("a"));
        assert_eq!(eval_ok("min([])"), Value::Null);
        assert_eq!(eval_ok("max(1, 3, 2)"), num("3"));
        assert_eq!(eval_ok("max([])"), Value::Null);
        assert_eq!(eval_ok("sum([1, 2, 3])"), num("6"));
        assert_eq!(eval_ok("sum([1, \"x\", 2.5])"), num("3.5"));
        assert_eq!(eval_ok("product([2, 3, 4])"), num("24"));
        assert_eq!(eval_ok("mean([1, 2, 3])"), num("2"));
        assert_eq!(eval_ok("mean([])"), Value::Null);
    }

    #[test]
    fn test_statistics() {
        assert_eq!(eval_ok("median(8, 2, 5, 3, 4)"), num("4"));
        assert_eq!(eval_ok("median([3, 5, 9, 1, \"hello\", -2])"), num("3"));
        assert_eq!(eval_ok("median([6, 1, 2, 3])"), num("2.5"));
        assert_eq!(eval_ok("median([])"), Value::Null);
        assert_eq!(eval_ok("decimal(stddev(2, 4, 7, 5), 10)"), num("2.0816659995"));
        assert_eq!(eval_ok("stddev([1])"), Value::Null);
        assert_eq!(eval_ok("mode(6, 3, 9, 6, 6)"), Value::from(vec![6]));
        assert_eq!(eval_ok("mode(6, 1, 9, 6, 1)"), Value::from(vec![1, 6]));
        assert_eq!(eval_ok("mode([])"), Value::List(vec![]));
    }

    #[test]
    fn test_boolean_aggregates() {
        assert_eq!(eval_ok("all([false, null, true])"), Value::Bool(false));
        assert_eq!(eval_ok("all([true, true])"), Value::Bool(true));
        assert_eq!(eval_ok("all([true, 1])"), Value::Null);
        assert_eq!(eval_ok("all([])"), Value::Bool(true));
        assert_eq!(eval_ok("any([false, null, true])"), Value::Bool(true));
        assert_eq!(eval_ok("any([false])"), Value::Bool(false));
        assert_eq!(eval_ok("any([])"), Value::Bool(false));
        assert_eq!(eval_ok("and([true, false])"), Value::Bool(false));
        assert_eq!(eval_ok("or(false, true)"), Value::Bool(true));
    }

    #[test]
    fn test_list_editing() {
        assert_eq!(eval_ok("list contains([1, 2, 3], 2)"), Value::Bool(true));
        assert_eq!(eval_ok("list contains([1, 2, 3], \"2\")"), Value::Bool(false));
        assert_eq!(eval_ok("sublist([4, 5, 6], 1, 2)"), Value::from(vec![4, 5]));
        assert_eq!(eval_ok("sublist([4, 5, 6], -1)"), Value::from(vec![6]));
        assert_eq!(eval_ok("append([1], 2, 3)"), Value::from(vec![1, 2, 3]));
        assert_eq!(
            eval_ok("append([\"hello\"], \" \", \"world\")"),
            Value::from(vec!["hello", " ", "world"])
        );
        assert_eq!(
            eval_ok("concatenate([\"a\", \"b\"], [\"c\"])"),
            Value::from(vec!["a", "b", "c"])
        );
        assert_eq!(
            eval_ok("insert before([\"a\", \"c\"], 1, \"b\")"),
            Value::from(vec!["b", "a", "c"])
        );
        assert_eq!(
            eval_ok("remove([\"a\", \"b\", \"c\"], 2)"),
            Value::from(vec!["a", "c"])
        );
        assert_eq!(
            eval_ok("reverse([\"a\", \"b\", \"c\"])"),
            Value::from(vec!["c", "b", "a"])
        );
        assert_eq!(eval_ok("index of([1, 2, 3, 2], 2)"), Value::from(vec![2, 4]));
        assert_eq!(eval_ok("union([1, 2], [2, 3])"), Value::from(vec![1, 2, 3]));
        assert_eq!(eval_ok("distinct values([1, 2, 3, 2, 1])"), Value::from(vec![1, 2, 3]));
        assert_eq!(eval_ok("flatten([[1, 2], [[3]], 4])"), Value::from(vec![1, 2, 3, 4]));
        assert_eq!(
            evaluate("remove([1], 2)"),
            Err(crate::Error::Eval(EvalError::Index("index out of range".into())))
        );
        assert_eq!(
            evaluate("concatenate([1], 2)"),
            Err(crate::Error::Eval(EvalError::TypeMismatch("list".into())))
        );
    }

    #[test]
    fn test_sort() {
        assert_eq!(eval_ok("sort([3, 1, 2])"), Value::from(vec![1, 2, 3]));
        assert_eq!(eval_ok("sort([8, -1, 3], (x, y) => x > y)"), Value::from(vec![8, 3, -1]));
        assert_eq!(
            eval_ok("sort(list: [\"b\", \"a\"], precedes: function(x, y) x < y)"),
            Value::from(vec!["a", "b"])
        );
        assert!(matches!(
            evaluate("sort([1, \"a\"])"),
            Err(crate::Error::Eval(EvalError::TypeMismatch(_)))
        ));
    }

    #[test]
    fn test_sort_long_lists() {
        let reversed: Vec<Value> = (1..=500).rev().map(Value::from).collect();
        let ascending: Vec<Value> = (1..=500).map(Value::from).collect();
        let sorted = super::sort_by(&reversed, |a, b| Ok(crate::compare::compare(a, b)?.is_lt())).unwrap();
        assert_eq!(sorted, ascending);

        let pairs: Vec<Value> = (0..40).map(|i| Value::from(vec![i % 3, i])).collect();
        let by_first = super::sort_by(&pairs, |a, b| match (a, b) {
            (Value::List(a), Value::List(b)) => Ok(crate::compare::compare(&a[0], &b[0])?.is_lt()),
            _ => Err(EvalError::type_mismatch("list")),
        })
        .unwrap();
        let expected: Vec<Value> = (0..3)
            .flat_map(|k| (0..40).filter(move |i| i % 3 == k).map(move |i| Value::from(vec![k, i])))
            .collect();
        assert_eq!(by_first, expected);

        assert_eq!(eval_ok("sort([2, 1, 2, 1], (x, y) => x >= y)"), Value::from(vec![2, 2, 1, 1]));
        assert!(matches!(
            evaluate("sort([3, 2, 1], (x, y) => x / 0 > y)"),
            Err(crate::Error::Eval(EvalError::Value(_)))
        ));
    }

    #[test]
    fn test_list_replace() {
        assert_eq!(eval_ok("list replace([2, 4, 7, 8], 3, 6)"), Value::from(vec![2, 4, 6, 8]));
        assert_eq!(
            eval_ok("list replace([2, 4, 7, 8], function(item, newItem) item < newItem, 5)"),
            Value::from(vec![5, 5, 7, 8])
        );
        assert!(evaluate("list replace([1], 5, 0)").is_err());
    }
}
