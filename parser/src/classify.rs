//! Classifies one maximal-munch [`crate::Rule::scalar_token`] capture
//! into a numeric atom, or reports that it isn't one at all so the
//! caller can fall back to treating it as a function/operator name.
//!
//! Deliberately conservative about which tokens are "number-shaped":
//! only tokens built from digits (plus the punctuation each literal
//! form needs) are ever attempted as a number. A token containing a
//! letter outside an explicit `0x`/duration-suffix/`i`/`j` position is
//! always a word, even at a hexadecimal display base -- typing raw
//! `a`-`f` digits without the `0x` prefix would make ordinary function
//! names like `dead` or `face` ambiguous with hex literals, which this
//! crate resolves in favor of the word.

use rug::{Complex, Float, Integer, Rational};

use smrtclcltr_core::numeric::{NumericAtom, Time};
use smrtclcltr_core::{CalcError, CalcResult};

/// The pieces of parse state a numeric literal's construction depends
/// on: the display base for prefix-less integers, and the working
/// precision (in bits) float/complex literals are built at.
#[derive(Clone, Copy, Debug)]
pub struct NumberContext {
    pub base: u32,
    pub precision_bits: u32,
}

fn parse_error(token: &str, detail: impl std::fmt::Display) -> CalcError {
    CalcError::Parse { message: format!("invalid numeric literal '{token}': {detail}") }
}

/// Attempts every literal form in turn. `Ok(None)` means `token` isn't
/// number-shaped at all (try it as a function/operator name); `Err`
/// means it looked like a number but didn't parse.
pub fn classify_number(token: &str, ctx: &NumberContext) -> CalcResult<Option<NumericAtom>> {
    if let Some(result) = try_absolute_time(token) {
        return result.map(Some);
    }
    if let Some(result) = try_duration(token) {
        return result.map(Some);
    }
    if let Some(result) = try_complex(token, ctx.precision_bits) {
        return result.map(Some);
    }
    if let Some(result) = try_rational(token) {
        return result.map(Some);
    }
    if let Some(result) = try_prefixed_int(token) {
        return result.map(Some);
    }
    if let Some(result) = try_plain_int(token, ctx.base) {
        return result.map(Some);
    }
    if let Some(result) = try_float(token, ctx.precision_bits) {
        return result.map(Some);
    }
    Ok(None)
}

fn looks_like_date(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

fn try_absolute_time(token: &str) -> Option<CalcResult<NumericAtom>> {
    if !looks_like_date(token) {
        return None;
    }
    if token.len() == 10 {
        use chrono::NaiveDate;
        let result = NaiveDate::parse_from_str(token, "%Y-%m-%d")
            .map_err(|e| parse_error(token, e))
            .map(|d| {
                let midnight = d.and_hms_opt(0, 0, 0).expect("midnight is always valid");
                NumericAtom::Time(Time::absolute(Rational::from(midnight.and_utc().timestamp())))
            });
        Some(result)
    } else {
        Some(Time::parse_absolute(token).map(NumericAtom::Time))
    }
}

/// Mirrors `Time::parse_duration`'s own split point so the pre-check
/// and the real parse never disagree on what counts as a duration.
fn try_duration(token: &str) -> Option<CalcResult<NumericAtom>> {
    let split_at = token.find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))?;
    if split_at == 0 {
        return None;
    }
    match &token[split_at..] {
        "ns" | "us" | "ms" | "s" | "m" | "h" | "d" | "w" => {
            Some(Time::parse_duration(token).map(NumericAtom::Time))
        }
        _ => None,
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-')) {
        return None;
    }
    s.parse::<f64>().ok()
}

/// `(real,imag)`, `(mag,<angle)`, `uNi`/`uNj`, or `real±uN(i|j)`.
fn try_complex(token: &str, prec_bits: u32) -> Option<CalcResult<NumericAtom>> {
    if token.starts_with('(') && token.ends_with(')') {
        let inner = &token[1..token.len() - 1];
        let comma = inner.find(',')?;
        let (left, right) = (&inner[..comma], &inner[comma + 1..]);
        let first = parse_f64(left)?;
        return Some(if let Some(angle) = right.strip_prefix('<') {
            let angle = parse_f64(angle).ok_or_else(|| parse_error(token, "invalid polar angle"))?;
            let (re, im) = (first * angle.cos(), first * angle.sin());
            Ok(NumericAtom::Cmp(Complex::with_val(prec_bits, (re, im))))
        } else {
            let imag = parse_f64(right).ok_or_else(|| parse_error(token, "invalid imaginary part"))?;
            Ok(NumericAtom::Cmp(Complex::with_val(prec_bits, (first, imag))))
        });
    }

    let body = token.strip_suffix('i').or_else(|| token.strip_suffix('j'))?;
    if body.is_empty() || !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    // A trailing `+`/`-` run inside `body` (not at index 0) splits a
    // rectangular `real±imag` pair; otherwise the whole thing is a
    // bare imaginary magnitude.
    let split = body
        .char_indices()
        .skip(1)
        .rev()
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i);
    Some(match split {
        Some(idx) => {
            let (real_str, imag_str) = (&body[..idx], &body[idx..]);
            let real = parse_f64(real_str).ok_or_else(|| parse_error(token, "invalid real part"))?;
            let imag = parse_f64(imag_str).ok_or_else(|| parse_error(token, "invalid imaginary part"))?;
            Ok(NumericAtom::Cmp(Complex::with_val(prec_bits, (real, imag))))
        }
        None => {
            let imag = parse_f64(body).ok_or_else(|| parse_error(token, "invalid imaginary magnitude"))?;
            Ok(NumericAtom::Cmp(Complex::with_val(prec_bits, (0.0, imag))))
        }
    })
}

/// `float-or-int '/' ufloat-or-uint`.
fn try_rational(token: &str) -> Option<CalcResult<NumericAtom>> {
    let slash = token.find('/')?;
    let (num, den) = (&token[..slash], &token[slash + 1..]);
    if num.is_empty() || den.is_empty() {
        return None;
    }
    Some((|| {
        let n = side_to_rational(num).ok_or_else(|| parse_error(token, "invalid numerator"))?;
        let d = side_to_rational(den).ok_or_else(|| parse_error(token, "invalid denominator"))?;
        if d == Rational::from(0) {
            return Err(CalcError::Domain(format!("division by zero in rational literal '{token}'")));
        }
        Ok(NumericAtom::Rat(n / d).reduce())
    })())
}

fn side_to_rational(s: &str) -> Option<Rational> {
    if s.contains('.') {
        Rational::try_from(s.parse::<f64>().ok()?).ok()
    } else {
        Integer::parse(s).ok().map(|incomplete| Rational::from(Integer::from(incomplete)))
    }
}

fn try_prefixed_int(token: &str) -> Option<CalcResult<NumericAtom>> {
    let (neg, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (radix, digits) = if let Some(d) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, d)
    } else if rest.len() > 1 && rest.starts_with('0') && rest[1..].bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        (8, rest)
    } else {
        return None;
    };
    if digits.is_empty() {
        return Some(Err(parse_error(token, "missing digits after base prefix")));
    }
    Some(
        Integer::parse_radix(digits, radix)
            .map_err(|e| parse_error(token, e))
            .map(|incomplete| {
                let mut value = Integer::from(incomplete);
                if neg {
                    value = -value;
                }
                NumericAtom::Int(value)
            }),
    )
}

/// A plain, prefix-less digit run (optionally comma-grouped),
/// interpreted in the currently configured display base.
fn try_plain_int(token: &str, base: u32) -> Option<CalcResult<NumericAtom>> {
    let (_, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b',') {
        return None;
    }
    let cleaned: String = token.chars().filter(|&c| c != ',').collect();
    Some(
        Integer::parse_radix(&cleaned, base as i32)
            .map_err(|e| parse_error(token, e))
            .map(|incomplete| NumericAtom::Int(Integer::from(incomplete))),
    )
}

fn try_float(token: &str, prec_bits: u32) -> Option<CalcResult<NumericAtom>> {
    let rest = token.strip_prefix('-').unwrap_or(token);
    let starts_numeric = rest.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.');
    if !starts_numeric || (!rest.contains('.') && !rest.contains(['e', 'E'])) {
        return None;
    }
    let valid = rest.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !valid {
        return None;
    }
    Some(
        token
            .parse::<f64>()
            .map_err(|e| parse_error(token, e))
            .map(|f| NumericAtom::Flt(Float::with_val(prec_bits, f))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> NumberContext {
        NumberContext { base: 10, precision_bits: 200 }
    }

    #[test]
    fn plain_integer_uses_configured_base() {
        let atom = classify_number("17", &NumberContext { base: 8, precision_bits: 200 }).unwrap().unwrap();
        assert_eq!(atom.to_string(), "15");
    }

    #[test]
    fn hex_prefix_wins_regardless_of_base() {
        let atom = classify_number("0xff", &ctx()).unwrap().unwrap();
        assert_eq!(atom.to_string(), "255");
    }

    #[test]
    fn word_shaped_token_is_not_a_number() {
        assert!(classify_number("dead", &ctx()).unwrap().is_none());
        assert!(classify_number("sin", &ctx()).unwrap().is_none());
    }

    #[test]
    fn float_literal_parses() {
        let atom = classify_number("3.14", &ctx()).unwrap().unwrap();
        assert_eq!(atom.to_string(), "3.14");
    }

    #[test]
    fn rational_literal_reduces() {
        let atom = classify_number("22/7", &ctx()).unwrap().unwrap();
        assert!(matches!(atom, NumericAtom::Rat(_)));
    }

    #[test]
    fn duration_literal_parses_as_time() {
        let atom = classify_number("250ms", &ctx()).unwrap().unwrap();
        assert!(matches!(atom, NumericAtom::Time(_)));
    }

    #[test]
    fn rectangular_complex_literal_parses() {
        let atom = classify_number("3+4i", &ctx()).unwrap().unwrap();
        match atom {
            NumericAtom::Cmp(c) => {
                assert_eq!(c.real().to_f64(), 3.0);
                assert_eq!(c.imag().to_f64(), 4.0);
            }
            other => panic!("expected a complex atom, found {other:?}"),
        }
    }
}
