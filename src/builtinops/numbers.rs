use super::{Prelude, integer_arg, number_arg};
use crate::callable::{NativeArgs, NativeFunction};
use crate::environment::Environment;
use crate::number::Number;
use crate::{EvalError, Value};

pub(super) fn install(prelude: &mut Prelude) {
    prelude
        .bind(
            "decimal",
            NativeFunction::new(builtin_decimal)
                .required(["n", "scale"])
                .help("round n to scale fractional digits, half to even"),
        )
        .bind(
            "floor",
            NativeFunction::new(builtin_floor)
                .required(["n"])
                .help("the greatest integer not above n"),
        )
        .bind(
            "ceiling",
            NativeFunction::new(builtin_ceiling)
                .required(["n"])
                .help("the least integer not below n"),
        )
        .bind(
            "abs",
            NativeFunction::new(builtin_abs)
                .required(["n"])
                .help("absolute value of a number or duration"),
        )
        .bind(
            "modulo",
            NativeFunction::new(builtin_modulo)
                .required(["dividend", "divisor"])
                .help("remainder of floored division, with the sign of the divisor"),
        )
        .bind(
            "sqrt",
            NativeFunction::new(builtin_sqrt)
                .required(["number"])
                .help("square root of a non-negative number"),
        )
        .bind(
            "odd",
            NativeFunction::new(builtin_odd)
                .required(["number"])
                .help("whether number is an odd integer"),
        )
        .bind(
            "even",
            NativeFunction::new(builtin_even)
                .required(["number"])
                .help("whether number is an even integer"),
        );
}

fn builtin_decimal(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let n = number_arg(args, "n")?;
    Ok(Value::Number(n.round(integer_arg(args, "scale")?)))
}

fn builtin_floor(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Number(number_arg(args, "n")?.floor()))
}

fn builtin_ceiling(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Number(number_arg(args, "n")?.ceiling()))
}

fn builtin_abs(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    match args.required("n")? {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        Value::Duration(d) => {
            let mut magnitude = d.clone();
            magnitude.negative = false;
            Ok(Value::Duration(magnitude))
        }
        _ => Err(EvalError::type_mismatch("number")),
    }
}

fn builtin_modulo(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    let dividend = number_arg(args, "dividend")?;
    Ok(Value::Number(dividend.modulo(number_arg(args, "divisor")?)?))
}

fn builtin_sqrt(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Number(number_arg(args, "number")?.sqrt()?))
}

fn parity(args: &NativeArgs) -> Result<Option<bool>, EvalError> {
    let n = number_arg(args, "number")?;
    if !n.is_integer() {
        return Ok(None);
    }
    Ok(Some(n.int_mod(&Number::from(2))?.is_zero()))
}

fn builtin_odd(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Bool(parity(args)? == Some(false)))
}

fn builtin_even(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
    Ok(Value::Bool(parity(args)? == Some(true)))
}

#[cfg(test)]
mod tests {
    use crate::{EvalError, Value, evaluate};

    fn eval_ok(source: &str) -> Value {
        evaluate(source).unwrap()
    }

    fn num(text: &str) -> Value {
        Value::Number(text.parse().unwrap())
    }

    #[test]
    fn test_rounding() {
        assert_eq!(eval_ok("decimal(1/3, 2)"), num("0"));
        assert_eq!(eval_ok("decimal(0.125, 2)"), num("0.12"));
        assert_eq!(eval_ok("decimal(0.135, 2)"), num("0.14"));
        assert_eq!(eval_ok("decimal(-2.5, 0)"), num("-2"));
        assert_eq!(eval_ok("decimal(1.5, -999999999)"), num("0"));
        assert_eq!(eval_ok("decimal(1.5, 999999999)"), num("1.5"));
        assert_eq!(eval_ok("floor(-1.5)"), num("-2"));
        assert_eq!(eval_ok("ceiling(-1.5)"), num("-1"));
        assert_eq!(eval_ok("ceiling(n: 1.2)"), num("2"));
    }

    #[test]
    fn test_modulo_and_abs() {
        assert_eq!(eval_ok("modulo(12, 5)"), num("2"));
        assert_eq!(eval_ok("modulo(-12, 5)"), num("3"));
        assert_eq!(eval_ok("modulo(12, -5)"), num("-3"));
        assert_eq!(eval_ok("-12 % 5"), num("-2"));
        assert_eq!(eval_ok("abs(-3.5)"), num("3.5"));
        assert_eq!(eval_ok("abs(@\"-P2D\")"), eval_ok("@\"P2D\""));
        assert!(matches!(
            evaluate("modulo(1, 0)"),
            Err(crate::Error::Eval(EvalError::Value(_)))
        ));
    }

    #[test]
    fn test_sqrt_and_parity() {
        assert_eq!(eval_ok("sqrt(16)"), num("4"));
        assert_eq!(eval_ok("decimal(sqrt(2), 5)"), num("1.41421"));
        assert!(evaluate("sqrt(-1)").is_err());
        assert_eq!(eval_ok("odd(5)"), Value::Bool(true));
        assert_eq!(eval_ok("odd(-3)"), Value::Bool(true));
        assert_eq!(eval_ok("even(5)"), Value::Bool(false));
        assert_eq!(eval_ok("even(0)"), Value::Bool(true));
        assert_eq!(eval_ok("odd(2.5)"), Value::Bool(false));
        assert_eq!(
            evaluate("floor(\"1\")"),
            Err(crate::Error::Eval(EvalError::type_mismatch("number")))
        );
    }
}
