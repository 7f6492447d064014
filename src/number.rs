//! Arbitrary-precision decimal numbers.
//!
//! A [`Number`] is a [`BigInt`] significand scaled by a power of ten. Values are kept
//! normalised (no trailing zeros after the decimal point), so two numbers compare equal
//! exactly when their decimal values are equal, whichever way they were built.
//!
//! Addition, subtraction and multiplication are exact. Inexact operations
//! ([`Number::float_div`], [`Number::sqrt`]) keep [`WORKING_DIGITS`] fractional digits,
//! which is a little over 272 bits of precision.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::EvalError;

/// Fractional decimal digits kept by inexact operations.
pub const WORKING_DIGITS: u32 = 82;

/// Largest exponent magnitude accepted in number text such as `1e6144`.
pub const MAX_EXPONENT: i64 = 6144;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    mantissa: BigInt,
    scale: u32,
}

fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exp as usize)
}

impl Number {
    /// `mantissa * 10^-scale`
    pub fn new(mantissa: impl Into<BigInt>, scale: u32) -> Self {
        Self::normalized(mantissa.into(), scale)
    }

    fn normalized(mut mantissa: BigInt, mut scale: u32) -> Self {
        if mantissa.is_zero() {
            return Number { mantissa, scale: 0 };
        }
        let ten = BigInt::from(10u8);
        while scale > 0 {
            let (quotient, remainder) = mantissa.div_rem(&ten);
            if !remainder.is_zero() {
                break;
            }
            mantissa = quotient;
            scale -= 1;
        }
        Number { mantissa, scale }
    }

    pub fn zero() -> Self {
        Number {
            mantissa: BigInt::zero(),
            scale: 0,
        }
    }

    pub fn one() -> Self {
        Number {
            mantissa: BigInt::one(),
            scale: 0,
        }
    }

    /// Builds a number from the shortest decimal rendering of `value`, so `0.1` stays
    /// `0.1` rather than its binary approximation. Non-finite floats have no
    /// decimal value.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value}").parse().ok()
    }

    /// Both significands rescaled to the larger of the two scales.
    fn aligned(&self, other: &Number) -> (BigInt, BigInt, u32) {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => (self.mantissa.clone(), other.mantissa.clone(), self.scale),
            Ordering::Less => (
                &self.mantissa * pow10(other.scale - self.scale),
                other.mantissa.clone(),
                other.scale,
            ),
            Ordering::Greater => (
                self.mantissa.clone(),
                &other.mantissa * pow10(self.scale - other.scale),
                self.scale,
            ),
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        let (a, b, scale) = self.aligned(other);
        Number::normalized(a + b, scale)
    }

    pub fn sub(&self, other: &Number) -> Number {
        let (a, b, scale) = self.aligned(other);
        Number::normalized(a - b, scale)
    }

    pub fn mul(&self, other: &Number) -> Number {
        Number::normalized(&self.mantissa * &other.mantissa, self.scale + other.scale)
    }

    fn check_divisor(other: &Number) -> Result<(), EvalError> {
        if other.is_zero() {
            Err(EvalError::value("division by zero"))
        } else {
            Ok(())
        }
    }

    /// Exact quotient truncated toward zero.
    pub fn int_div(&self, other: &Number) -> Result<Number, EvalError> {
        Self::check_divisor(other)?;
        let (a, b, _) = self.aligned(other);
        // BigInt division truncates toward zero
        Ok(Number::normalized(a / b, 0))
    }

    /// Remainder of [`Number::int_div`]; takes the sign of the dividend.
    pub fn int_mod(&self, other: &Number) -> Result<Number, EvalError> {
        let quotient = self.int_div(other)?;
        Ok(self.sub(&other.mul(&quotient)))
    }

    /// Remainder taking the sign of the divisor, `a - b * floor(a / b)`.
    pub fn modulo(&self, other: &Number) -> Result<Number, EvalError> {
        Self::check_divisor(other)?;
        let (a, b, scale) = self.aligned(other);
        Ok(Number::normalized(a.mod_floor(&b), scale))
    }

    /// Quotient carried to [`WORKING_DIGITS`] fractional digits, truncated.
    pub fn float_div(&self, other: &Number) -> Result<Number, EvalError> {
        Self::check_divisor(other)?;
        // a/10^sa / (b/10^sb) = a * 10^(sb + P) / (b * 10^sa) / 10^P
        let numerator = &self.mantissa * pow10(other.scale + WORKING_DIGITS);
        let denominator = &other.mantissa * pow10(self.scale);
        Ok(Number::normalized(numerator / denominator, WORKING_DIGITS))
    }

    pub fn neg(&self) -> Number {
        Number {
            mantissa: -&self.mantissa,
            scale: self.scale,
        }
    }

    pub fn abs(&self) -> Number {
        Number {
            mantissa: self.mantissa.abs(),
            scale: self.scale,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.sign() == Sign::Minus
    }

    pub fn is_integer(&self) -> bool {
        self.scale == 0
    }

    pub fn floor(&self) -> Number {
        Number::normalized(self.mantissa.div_floor(&pow10(self.scale)), 0)
    }

    pub fn ceiling(&self) -> Number {
        let divisor = pow10(self.scale);
        let (quotient, remainder) = self.mantissa.div_mod_floor(&divisor);
        if remainder.is_zero() {
            Number::normalized(quotient, 0)
        } else {
            Number::normalized(quotient + 1, 0)
        }
    }

    /// Rounds half to even at `digits` places after the decimal point; a negative
    /// `digits` rounds to tens, hundreds and so on.
    pub fn round(&self, digits: i64) -> Number {
        if digits >= i64::from(self.scale) {
            return self.clone();
        }
        // Dropping more digits than the significand holds always rounds to zero.
        let width = self.mantissa.magnitude().to_string().len();
        let drop = match i64::from(self.scale).checked_sub(digits).and_then(|d| u32::try_from(d).ok()) {
            Some(drop) if usize::try_from(drop).is_ok_and(|d| d <= width) => drop,
            _ => return Number::zero(),
        };
        let divisor = pow10(drop);
        let (quotient, remainder) = self.mantissa.div_mod_floor(&divisor);
        let twice: BigInt = &remainder * BigInt::from(2u8);
        let rounded = match twice.cmp(&divisor) {
            Ordering::Less => quotient,
            Ordering::Greater => quotient + 1,
            Ordering::Equal if quotient.is_even() => quotient,
            Ordering::Equal => quotient + 1,
        };
        if digits >= 0 {
            Number::normalized(rounded, u32::try_from(digits).unwrap_or(0))
        } else {
            let shift = u32::try_from(digits.unsigned_abs()).unwrap_or(drop);
            Number::normalized(rounded * pow10(shift), 0)
        }
    }

    /// Square root carried to [`WORKING_DIGITS`] fractional digits.
    pub fn sqrt(&self) -> Result<Number, EvalError> {
        if self.is_negative() {
            return Err(EvalError::value("square root of a negative number"));
        }
        let (mantissa, scale) = if self.scale % 2 == 1 {
            (&self.mantissa * 10, self.scale + 1)
        } else {
            (self.mantissa.clone(), self.scale)
        };
        let root = (mantissa * pow10(2 * WORKING_DIGITS)).sqrt();
        Ok(Number::normalized(root, WORKING_DIGITS + scale / 2))
    }

    /// The integer value, when this number is integral and fits.
    pub fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.mantissa.to_i64()
        } else {
            None
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Number {
    type Err = EvalError;

    /// Accepts `[+-]digits[.digits][e[+-]digits]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EvalError::value(format!("invalid number {s:?}"));
        let text = s.trim();
        let (negative, text) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (decimal, exponent) = match text.find(['e', 'E']) {
            Some(at) => (
                &text[..at],
                text[at + 1..].parse::<i64>().map_err(|_| invalid())?,
            ),
            None => (text, 0),
        };
        if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(EvalError::value(format!("number exponent out of range in {s:?}")));
        }
        let (int_part, frac_part) = decimal.split_once('.').unwrap_or((decimal, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }
        let digits = format!("{int_part}{frac_part}");
        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
        if negative {
            mantissa = -mantissa;
        }
        let scale = i64::try_from(frac_part.len()).map_err(|_| invalid())? - exponent;
        if scale >= 0 {
            let scale = u32::try_from(scale).map_err(|_| invalid())?;
            Ok(Number::normalized(mantissa, scale))
        } else {
            let shift = u32::try_from(-scale).map_err(|_| invalid())?;
            Ok(Number::normalized(mantissa * pow10(shift), 0))
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.is_negative() { "-" } else { "" };
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

macro_rules! number_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Number {
            fn from(value: $ty) -> Self {
                Number { mantissa: BigInt::from(value), scale: 0 }
            }
        })*
    };
}

number_from_int!(i32, i64, u32, u64, usize);

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number {
            mantissa: value,
            scale: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(s: &str) -> Number {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(n("3").to_string(), "3");
        assert_eq!(n("-2.50").to_string(), "-2.5");
        assert_eq!(n("0.125").to_string(), "0.125");
        assert_eq!(n("-0.05").to_string(), "-0.05");
        assert_eq!(n("1.5e3").to_string(), "1500");
        assert_eq!(n("15e-3").to_string(), "0.015");
        assert_eq!(n("007").to_string(), "7");
        assert_eq!(n("-0").to_string(), "0");

        assert!("".parse::<Number>().is_err());
        assert!("1.2.3".parse::<Number>().is_err());
        assert!(matches!("1e999999999".parse::<Number>(), Err(EvalError::Value(_))));
        assert!("1e-999999999".parse::<Number>().is_err());
        assert_eq!(n("1e3"), n("1000"));
        assert!("abc".parse::<Number>().is_err());
        assert!(".".parse::<Number>().is_err());
    }

    #[test]
    fn test_equality_across_construction() {
        assert_eq!(Number::from(2), n("2.000"));
        assert_eq!(Number::from_f64(0.1).unwrap(), n("0.1"));
        assert_eq!(Number::from_f64(2.0).unwrap(), Number::from(2));
        assert_eq!(Number::from_f64(f64::NAN), None);
        assert_eq!(Number::from_f64(1e21).unwrap(), n("1e21"));
    }

    #[test]
    fn test_exact_arithmetic() {
        assert_eq!(n("0.1").add(&n("0.2")), n("0.3"));
        assert_eq!(n("1.5").sub(&n("2")), n("-0.5"));
        assert_eq!(n("1.5").mul(&n("-4")), n("-6"));
        assert_eq!(
            n("123456789012345678901234567890").mul(&n("10")),
            n("1234567890123456789012345678900")
        );
    }

    #[test]
    fn test_truncating_division() {
        assert_eq!(n("7").int_div(&n("2")).unwrap(), n("3"));
        assert_eq!(n("-7").int_div(&n("2")).unwrap(), n("-3"));
        assert_eq!(n("7.5").int_div(&n("2.5")).unwrap(), n("3"));
        assert_eq!(n("-7").int_mod(&n("2")).unwrap(), n("-1"));
        assert_eq!(n("7").int_mod(&n("-2")).unwrap(), n("1"));
        assert_eq!(n("-7").modulo(&n("2")).unwrap(), n("1"));
        assert_eq!(n("7").modulo(&n("-2")).unwrap(), n("-1"));
        assert!(n("1").int_div(&Number::zero()).is_err());
        assert!(n("1").int_mod(&Number::zero()).is_err());
    }

    #[test]
    fn test_float_division() {
        assert_eq!(n("1").float_div(&n("4")).unwrap(), n("0.25"));
        assert_eq!(n("6").float_div(&n("3")).unwrap(), n("2"));
        let third = n("1").float_div(&n("3")).unwrap();
        assert_eq!(third.to_string().len(), 2 + WORKING_DIGITS as usize);
        assert!(n("1").float_div(&Number::zero()).is_err());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(n("2.5").round(0), n("2"));
        assert_eq!(n("3.5").round(0), n("4"));
        assert_eq!(n("-2.5").round(0), n("-2"));
        assert_eq!(n("1.2345").round(2), n("1.23"));
        assert_eq!(n("1.235").round(2), n("1.24"));
        assert_eq!(n("1250").round(-2), n("1200"));
        assert_eq!(n("1250").round(-4), n("0"));
        assert_eq!(n("9999").round(-4), n("10000"));
        assert_eq!(n("-1.5").round(-999_999_999), Number::zero());
        assert_eq!(n("1.5").round(i64::MIN), Number::zero());
        assert_eq!(n("1.5").round(999_999_999), n("1.5"));
        assert_eq!(n("1.5").floor(), n("1"));
        assert_eq!(n("-1.5").floor(), n("-2"));
        assert_eq!(n("1.5").ceiling(), n("2"));
        assert_eq!(n("-1.5").ceiling(), n("-1"));
        assert_eq!(n("4").ceiling(), n("4"));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(n("16").sqrt().unwrap(), n("4"));
        assert_eq!(n("0.25").sqrt().unwrap(), n("0.5"));
        let root2 = n("2").sqrt().unwrap();
        assert!((root2.to_f64() - std::f64::consts::SQRT_2).abs() < 1e-15);
        assert!(n("-1").sqrt().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(n("1.5") < n("2"));
        assert!(n("-1") < n("0.001"));
        assert_eq!(n("2.0").cmp(&n("2")), Ordering::Equal);
        assert_eq!(n("10").to_i64(), Some(10));
        assert_eq!(n("10.5").to_i64(), None);
    }

    proptest! {
        #[test]
        fn prop_display_round_trips(int in any::<i64>(), frac in 0u32..1_000_000, scale in 0u32..12) {
            let value = Number::new(BigInt::from(int) * 1_000_000 + frac, scale);
            prop_assert_eq!(value.to_string().parse::<Number>().unwrap(), value);
        }

        #[test]
        fn prop_add_then_sub_is_identity(a in any::<i64>(), b in any::<i64>(), sa in 0u32..20, sb in 0u32..20) {
            let a = Number::new(a, sa);
            let b = Number::new(b, sb);
            prop_assert_eq!(a.add(&b).sub(&b), a);
        }

        #[test]
        fn prop_f64_round_trips(x in -1.0e12f64..1.0e12) {
            let value = Number::from_f64(x).unwrap();
            prop_assert_eq!(value.to_f64(), x);
        }
    }
}
