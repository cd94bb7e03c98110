//! Exact rational arithmetic over JSON numbers.
//!
//! Numeric keywords compare values as arbitrary-precision rationals, never
//! through binary floating point. A JSON number is converted by reading its
//! decimal text form, so `0.1` really is 1/10 and `0.3 / 0.1` is exactly 3.

use fraction::{BigFraction, BigUint};
use serde_json::Number;

/// 10^exp by square-and-multiply.
fn pow10(mut exp: u64) -> BigUint {
    let mut base = BigUint::from(10_u8);
    let mut acc = BigUint::from(1_u8);
    while exp > 0 {
        if exp & 1 == 1 {
            acc = &acc * &base;
        }
        base = &base * &base;
        exp >>= 1;
    }
    acc
}

/// Parse the decimal text of a JSON number into an exact fraction.
///
/// The grammar is the JSON number grammar, already enforced by the decoder;
/// out-of-grammar input degrades to zero rather than panicking. Exponents
/// beyond `i64` saturate, which only matters for numbers too large to hold
/// in memory anyway.
fn parse_decimal(text: &str) -> BigFraction {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos += 1;
    }
    let mut digits = String::with_capacity(text.len());
    let mut exponent = 0_i64;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        digits.push(bytes[pos] as char);
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            digits.push(bytes[pos] as char);
            exponent -= 1;
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        let mut exp_negative = false;
        match bytes.get(pos) {
            Some(b'+') => pos += 1,
            Some(b'-') => {
                exp_negative = true;
                pos += 1;
            }
            _ => {}
        }
        let mut exp = 0_i64;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            exp = exp
                .saturating_mul(10)
                .saturating_add(i64::from(bytes[pos] - b'0'));
            pos += 1;
        }
        exponent = if exp_negative {
            exponent.saturating_sub(exp)
        } else {
            exponent.saturating_add(exp)
        };
    }
    let mantissa = digits.parse::<BigUint>().unwrap_or_default();
    if mantissa == BigUint::from(0_u8) {
        return BigFraction::new(0_u8, 1_u8);
    }
    let (numer, denom) = if exponent >= 0 {
        (
            mantissa * pow10(exponent.unsigned_abs()),
            BigUint::from(1_u8),
        )
    } else {
        (mantissa, pow10(exponent.unsigned_abs()))
    };
    if negative {
        BigFraction::new_neg(numer, denom)
    } else {
        BigFraction::new(numer, denom)
    }
}

/// Exact rational value of a JSON number.
///
/// This is the conversion every numeric keyword uses, exposed so the
/// compiler can parse bounds such as `multipleOf` the same way.
pub fn to_fraction(number: &Number) -> BigFraction {
    parse_decimal(&number.to_string())
}

/// Whether the fraction is a mathematical integer.
pub(crate) fn is_integer(fraction: &BigFraction) -> bool {
    fraction
        .denom()
        .map_or(false, |denom| denom == &BigUint::from(1_u8))
}

/// Whether the number is mathematically integral (`3`, `3.0` and `3e0` all
/// are).
pub(crate) fn is_integral(number: &Number) -> bool {
    number.is_u64() || number.is_i64() || is_integer(&to_fraction(number))
}

/// A JSON number converted to a rational at most once, on first use.
pub(crate) struct LazyFraction<'a> {
    number: &'a Number,
    value: Option<BigFraction>,
}

impl<'a> LazyFraction<'a> {
    pub(crate) fn new(number: &'a Number) -> Self {
        LazyFraction {
            number,
            value: None,
        }
    }

    pub(crate) fn get(&mut self) -> &BigFraction {
        self.value.get_or_insert_with(|| to_fraction(self.number))
    }
}

#[cfg(test)]
mod tests {
    use super::{is_integer, is_integral, parse_decimal, to_fraction};
    use serde_json::{Number, Value};
    use std::str::FromStr;
    use test_case::test_case;

    fn number(text: &str) -> Number {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Number(n)) => n,
            _ => panic!("not a number: {text}"),
        }
    }

    #[test_case("0.1", "1", "10")]
    #[test_case("0.3", "3", "10")]
    #[test_case("-2.5", "-5", "2")]
    #[test_case("1e2", "100", "1")]
    #[test_case("120e-1", "12", "1")]
    #[test_case("1.5e-3", "3", "2000")]
    #[test_case("0.0", "0", "1")]
    #[test_case("-0", "0", "1")]
    fn parses_exactly(text: &str, numer: &str, denom: &str) {
        let expected = if let Some(numer) = numer.strip_prefix('-') {
            fraction::BigFraction::new_neg(
                fraction::BigUint::from_str(numer).unwrap(),
                fraction::BigUint::from_str(denom).unwrap(),
            )
        } else {
            fraction::BigFraction::new(
                fraction::BigUint::from_str(numer).unwrap(),
                fraction::BigUint::from_str(denom).unwrap(),
            )
        };
        assert_eq!(parse_decimal(text), expected);
    }

    #[test]
    fn division_is_exact() {
        let quotient = to_fraction(&number("0.3")) / to_fraction(&number("0.1"));
        assert!(is_integer(&quotient));
        let quotient = to_fraction(&number("0.2")) / to_fraction(&number("0.3"));
        assert!(!is_integer(&quotient));
    }

    #[test_case("3", true)]
    #[test_case("3.0", true)]
    #[test_case("3e0", true)]
    #[test_case("1e2", true)]
    #[test_case("3.5", false)]
    #[test_case("-7.0", true)]
    fn integral_numbers(text: &str, expected: bool) {
        assert_eq!(is_integral(&number(text)), expected);
    }

    #[test]
    fn huge_integers_stay_exact() {
        let big = "123456789012345678901234567890";
        assert!(is_integral(&number(big)));
        assert_eq!(
            to_fraction(&number(big)),
            to_fraction(&number("123456789012345678901234567890.0"))
        );
    }
}
