//! String builtins. Positions and lengths count characters, not bytes.

use regex::{Regex, RegexBuilder};

use super::{
    Prelude, integer_arg, list_arg, optional_integer_arg, optional_string_arg, slice_bounds, string_arg,
};
use crate::callable::{NativeArgs, NativeFunction};
use crate::environment::Environment;
use crate::{EvalError, Value};

pub(super) fn install(prelude: &mut Prelude) {
    prelude
        .bind(
            "string length",
            NativeFunction::new(builtin_string_length)
                .required(["string"])
                .help("number of characters in string"),
        )
        .bind(
            "substring",
            NativeFunction::new(builtin_substring)
                .required(["string", "start position"])
                .optional(["length"])
                .help("characters of string from a 1-based start position, negative counts from the end"),
        )
        .bind(
            "upper case",
            NativeFunction::new(builtin_upper_case).required(["string"]),
        )
        .bind(
            "lower case",
            NativeFunction::new(builtin_lower_case).required(["string"]),
        )
        .bind(
            "contains",
            NativeFunction::new(builtin_contains)
                .required(["string", "match"])
                .help("whether match occurs in string"),
        )
        .bind(
            "starts with",
            NativeFunction::new(builtin_starts_with).required(["string", "match"]),
        )
        .bind(
            "ends with",
            NativeFunction::new(builtin_ends_with).required(["string", "match"]),
        )
        .bind(
            "substring before",
            NativeFunction::new(builtin_substring_before)
                .required(["string", "match"])
                .help("the part of string before the first match, or an empty string"),
        )
        .bind(
            "substring after",
            NativeFunction::new(builtin_substring_after)
                .required(["string", "match"])
                .help("the part of string after the first match, or an empty string"),
        )
        .bind(
            "replace",
            NativeFunction::new(builtin_replace)
                .required(["input", "pattern", "replacement"])
                .help("replace every literal occurrence of pattern"),
        )
        .bind(
            "split",
            NativeFunction::new(builtin_split)
                .required(["string", "delimiter"])
                .help("split string on a regular expression delimiter"),
        )
        .bind(
            "matches",
            NativeFunction::new(builtin_matches)
                .required(["input", "pattern"])
                .optional(["flags"])
                .help("whether input matches a regular expression; flags may contain i, s, m and x"),
        )
        .bind(
            "string join",
            NativeFunction::new(builtin_string_join)
                .required(["list"])
                .optional(["delimiter", "prefix", "suffix"])
                .help("join a list of strings, skipping nulls"),
        );
}

fn builtin_string_length(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::from(string_arg(args, "string")?.chars().count()))
}

fn builtin_substring(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let chars: Vec<char> = string_arg(args, "string")?.chars().collect();
    let (start, end) = slice_bounds(
        integer_arg(args, "start position")?,
        optional_integer_arg(args, "length")?,
        chars.len(),
    );
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn builtin_upper_case(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(args, "string")?.to_uppercase()))
}

fn builtin_lower_case(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(args, "string")?.to_lowercase()))
}

fn string_and_match<'a>(args: &'a NativeArgs) -> Result<(&'a str, &'a str), EvalError> {
    Ok((string_arg(args, "string")?, string_arg(args, "match")?))
}

fn builtin_contains(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let (s, m) = string_and_match(args)?;
    Ok(Value::Bool(s.contains(m)))
}

fn builtin_starts_with(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let (s, m) = string_and_match(args)?;
    Ok(Value::Bool(s.starts_with(m)))
}

fn builtin_ends_with(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let (s, m) = string_and_match(args)?;
    Ok(Value::Bool(s.ends_with(m)))
}

fn builtin_substring_before(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let (s, m) = string_and_match(args)?;
    Ok(Value::from(s.split_once(m).map_or("", |(before, _)| before)))
}

fn builtin_substring_after(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let (s, m) = string_and_match(args)?;
    Ok(Value::from(s.split_once(m).map_or("", |(_, after)| after)))
}

fn builtin_replace(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let input = string_arg(args, "input")?;
    let pattern = string_arg(args, "pattern")?;
    if pattern.is_empty() {
        return Ok(Value::from(input));
    }
    Ok(Value::String(input.replace(pattern, string_arg(args, "replacement")?)))
}

fn compile(pattern: &str, flags: &str) -> Result<Regex, EvalError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            's' => builder.dot_matches_new_line(true),
            'm' => builder.multi_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(EvalError::value(format!("unknown regex flag {other:?}"))),
        };
    }
    builder
        .build()
        .map_err(|err| EvalError::value(format!("invalid pattern: {err}")))
}

fn builtin_split(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let s = string_arg(args, "string")?;
    let delimiter = compile(string_arg(args, "delimiter")?, "")?;
    Ok(delimiter.split(s).map(Value::from).collect())
}

fn builtin_matches(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let input = string_arg(args, "input")?;
    let flags = optional_string_arg(args, "flags")?.unwrap_or("");
    let pattern = compile(string_arg(args, "pattern")?, flags)?;
    Ok(Value::Bool(pattern.is_match(input)))
}

fn builtin_string_join(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let mut parts = Vec::new();
    for item in list_arg(args, "list")? {
        match item {
            Value::String(s) => parts.push(s.as_str()),
            Value::Null => {}
            _ => return Err(EvalError::type_mismatch("string")),
        }
    }
    let delimiter = optional_string_arg(args, "delimiter")?.unwrap_or("");
    let prefix = optional_string_arg(args, "prefix")?.unwrap_or("");
    let suffix = optional_string_arg(args, "suffix")?.unwrap_or("");
    Ok(Value::String(format!("{prefix}{}{suffix}", parts.join(delimiter))))
}

#[cfg(test)]
mod tests {
    use crate::{EvalError, Value, evaluate};

    #[test]
    fn test_string_functions() {
        let cases: &[(&str, Value)] = &[
            (r#"substring("foobar", 2, 2)"#, Value::from("oo")),
            (r#"substring("foobar", 3)"#, Value::from("obar")),
            (r#"substring("foobar", -2, 1)"#, Value::from("a")),
            (r#"substring("foobar", 10)"#, Value::from("")),
            (r#"substring(string: "foobar", start position: 2, length: 100)"#, Value::from("oobar")),
            (r#"string length("foobar")"#, Value::from(6)),
            (r#"string length("héllo")"#, Value::from(5)),
            (r#"upper case("foobar")"#, Value::from("FOOBAR")),
            (r#"lower case("FOOBAR")"#, Value::from("foobar")),
            (r#"substring before("foobar", "b")"#, Value::from("foo")),
            (r#"substring before("foobar", "z")"#, Value::from("")),
            (r#"substring after("foobar", "b")"#, Value::from("ar")),
            (r#"replace("fooXXbar", "XX", "")"#, Value::from("foobar")),
            (r#"contains("foobar", "oo")"#, Value::Bool(true)),
            (r#"starts with("foobar", "foo")"#, Value::Bool(true)),
            (r#"ends with("foobar", "bar")"#, Value::Bool(true)),
            (r#"matches("foobar", "^foo")"#, Value::Bool(true)),
            (r#"matches("FOOBAR", "^foo")"#, Value::Bool(false)),
            (r#"matches("FOOBAR", "^foo", "i")"#, Value::Bool(true)),
            (r#"split("foo,bar", ",")"#, Value::from(vec!["foo", "bar"])),
            (r#"split("a1b22c", "[0-9]+")"#, Value::from(vec!["a", "b", "c"])),
            (r#"string join(["foo", "bar"], "-")"#, Value::from("foo-bar")),
            (r#"string join(["foo", null, "bar"])"#, Value::from("foobar")),
            (r#"string join(["a", "b"], ", ", "[", "]")"#, Value::from("[a, b]")),
            (r#""foo" + "bar""#, Value::from("foobar")),
        ];
        for (source, expected) in cases {
            assert_eq!(&evaluate(source).unwrap(), expected, "{source}");
        }
    }

    #[test]
    fn test_string_errors() {
        assert!(matches!(
            evaluate(r#"matches("a", "(")"#),
            Err(crate::Error::Eval(EvalError::Value(_)))
        ));
        assert_eq!(
            evaluate("upper case(1)"),
            Err(crate::Error::Eval(EvalError::type_mismatch("string")))
        );
        assert_eq!(
            evaluate(r#"string join(["a", 1])"#),
            Err(crate::Error::Eval(EvalError::type_mismatch("string")))
        );
        assert_eq!(
            evaluate("contains(\"abc\")"),
            Err(crate::Error::Eval(EvalError::TooFewArguments(vec!["match".into()])))
        );
    }
}
