use std::cmp::Ordering;
use std::fmt;

use rug::ops::{DivRounding, Pow};
use rug::{Complex, Float, Integer, Rational};

use crate::error::{CalcError, CalcResult};
use crate::numeric::digits_to_bits;
use crate::numeric::time::Time;

/// One of the five arithmetic atoms in the value domain.
///
/// `Int`/`Rat` are exact; `Flt`/`Cmp` carry a working precision (in bits,
/// derived from the calculator's configured decimal `precision` via
/// [`digits_to_bits`]) that round-trips through every operation that
/// touches them.
#[derive(Clone, Debug)]
pub enum NumericAtom {
    Int(Integer),
    Rat(Rational),
    Flt(Float),
    Cmp(Complex),
    Time(Time),
}

impl NumericAtom {
    pub fn zero_int() -> NumericAtom {
        NumericAtom::Int(Integer::new())
    }

    /// Rung of the widening ladder `Int < Rat < Flt < Cmp`. `Time` is not
    /// part of the ladder; it has its own combination rules.
    fn rung(&self) -> u8 {
        match self {
            NumericAtom::Int(_) => 0,
            NumericAtom::Rat(_) => 1,
            NumericAtom::Flt(_) => 2,
            NumericAtom::Cmp(_) => 3,
            NumericAtom::Time(_) => 255,
        }
    }

    pub fn precision_bits(&self) -> u32 {
        match self {
            NumericAtom::Flt(f) => f.prec(),
            NumericAtom::Cmp(c) => c.prec().0,
            _ => digits_to_bits(50),
        }
    }

    /// Widen `self` up to `prec_bits` of working precision, producing an
    /// atom at rung `target`. `target` must be `>= self.rung()`.
    pub fn widen_to(&self, target: u8, prec_bits: u32) -> NumericAtom {
        match (self, target) {
            (NumericAtom::Int(i), 0) => NumericAtom::Int(i.clone()),
            (NumericAtom::Int(i), 1) => NumericAtom::Rat(Rational::from(i.clone())),
            (NumericAtom::Int(i), 2) => {
                NumericAtom::Flt(Float::with_val(prec_bits, i))
            }
            (NumericAtom::Int(i), 3) => {
                NumericAtom::Cmp(Complex::with_val(prec_bits, (i, 0)))
            }
            (NumericAtom::Rat(r), 1) => NumericAtom::Rat(r.clone()),
            (NumericAtom::Rat(r), 2) => NumericAtom::Flt(Float::with_val(prec_bits, r)),
            (NumericAtom::Rat(r), 3) => {
                NumericAtom::Cmp(Complex::with_val(prec_bits, (r, 0)))
            }
            (NumericAtom::Flt(f), 2) => NumericAtom::Flt(f.clone()),
            (NumericAtom::Flt(f), 3) => NumericAtom::Cmp(Complex::with_val(prec_bits, (f, 0))),
            (NumericAtom::Cmp(c), 3) => NumericAtom::Cmp(c.clone()),
            _ => unreachable!("widen_to called with a target below self's rung"),
        }
    }

    /// Post-op normalization ("reduce"): `Cmp` with zero imaginary part
    /// becomes `Flt`; `Rat` with denominator 1 becomes `Int`; `Flt` equal
    /// to zero becomes `Int`.
    pub fn reduce(self) -> NumericAtom {
        match self {
            NumericAtom::Cmp(c) => {
                if c.imag().is_zero() {
                    NumericAtom::Flt(c.real().clone()).reduce()
                } else {
                    NumericAtom::Cmp(c)
                }
            }
            NumericAtom::Flt(f) => {
                if f.is_zero() {
                    NumericAtom::zero_int()
                } else {
                    NumericAtom::Flt(f)
                }
            }
            NumericAtom::Rat(r) => {
                if r.denom() == &Integer::from(1) {
                    NumericAtom::Int(r.numer().clone())
                } else {
                    NumericAtom::Rat(r)
                }
            }
            other => other,
        }
    }

    /// `Flt -> Rat` via continued-fraction approximation: searches the
    /// convergents of `f`'s exact binary value for the best rational with
    /// denominator bounded by `10^precision_digits`, kept only if the
    /// residual error against `f` is within `10^-precision_digits`.
    pub fn float_to_rational(f: &Float, precision_digits: u32) -> CalcResult<Rational> {
        let exact = Rational::from(f.clone());
        let max_denominator = Integer::from(10).pow(precision_digits);
        let approx = best_rational_approximation(&exact, &max_denominator);
        let back = Float::with_val(f.prec(), &approx);
        let residual = Float::with_val(f.prec(), f - &back).abs();
        let tolerance = Float::with_val(f.prec(), 10).pow(-(precision_digits as i32));
        if residual <= tolerance {
            Ok(approx)
        } else {
            Err(CalcError::ConversionLoss(format!(
                "{f} cannot be represented as a rational within {precision_digits} digits of precision"
            )))
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            NumericAtom::Int(i) => i.cmp0() == Ordering::Equal,
            NumericAtom::Rat(r) => r.cmp0() == Ordering::Equal,
            NumericAtom::Flt(f) => f.is_zero(),
            NumericAtom::Cmp(c) => c.real().is_zero() && c.imag().is_zero(),
            NumericAtom::Time(t) => t.value.cmp0() == Ordering::Equal,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            NumericAtom::Int(i) => i.cmp0() == Ordering::Less,
            NumericAtom::Rat(r) => r.cmp0() == Ordering::Less,
            NumericAtom::Flt(f) => f.is_sign_negative() && !f.is_zero(),
            NumericAtom::Cmp(_) => false,
            NumericAtom::Time(t) => t.value.cmp0() == Ordering::Less,
        }
    }

    /// `abs` (§4.1's `{+, -, *, /, mod, ^, unary -, cmp}` set plus its
    /// sibling unary ops): every other atom's magnitude is just its sign
    /// flipped away, but a `Cmp`'s magnitude is `hypot(re, im)`, a real
    /// value even when the operand has a nonzero imaginary part.
    pub fn magnitude(&self) -> NumericAtom {
        match self {
            NumericAtom::Cmp(c) => {
                let prec = c.prec().0;
                NumericAtom::Flt(Float::with_val(prec, c.real().hypot_ref(c.imag())))
            }
            other if other.is_negative() => match other {
                NumericAtom::Int(i) => NumericAtom::Int(-i.clone()),
                NumericAtom::Rat(r) => NumericAtom::Rat(-r.clone()),
                NumericAtom::Flt(f) => NumericAtom::Flt(-f.clone()),
                NumericAtom::Time(t) => NumericAtom::Time(Time::new(-t.value.clone(), t.absolute)),
                NumericAtom::Cmp(_) => unreachable!("handled above"),
            },
            other => other.clone(),
        }
    }
}

/// Continued-fraction convergent search for the rational closest to
/// `value` whose denominator doesn't exceed `max_denominator`, mirroring
/// `calculate_quotient`'s matrix recurrence: convergents `h_n/k_n` satisfy
/// `h_n = a_n*h_{n-1} + h_{n-2}`, `k_n = a_n*k_{n-1} + k_{n-2}`, where the
/// `a_n` are `value`'s own continued-fraction terms. Walks those terms
/// until the next convergent's denominator would cross the bound, then
/// tries one semiconvergent step short of it in case that lands closer.
fn best_rational_approximation(value: &Rational, max_denominator: &Integer) -> Rational {
    if value.denom() <= max_denominator {
        return value.clone();
    }

    let (mut h_prev2, mut h_prev1) = (Integer::from(0), Integer::from(1));
    let (mut k_prev2, mut k_prev1) = (Integer::from(1), Integer::from(0));
    let (mut p, mut q) = (value.numer().clone(), value.denom().clone());

    loop {
        let a = p.clone().div_floor(q.clone());
        let h = a.clone() * &h_prev1 + &h_prev2;
        let k = a.clone() * &k_prev1 + &k_prev2;
        if k > *max_denominator {
            let headroom = max_denominator.clone() - &k_prev2;
            let capped_a = if k_prev1.cmp0() == Ordering::Greater { headroom / &k_prev1 } else { Integer::from(0) };
            if capped_a.cmp0() == Ordering::Greater {
                let h_semi = capped_a.clone() * &h_prev1 + &h_prev2;
                let k_semi = capped_a * &k_prev1 + &k_prev2;
                let semi = Rational::from((h_semi, k_semi));
                let primary = Rational::from((h_prev1, k_prev1));
                let semi_error = Rational::from(&semi - value).abs();
                let primary_error = Rational::from(&primary - value).abs();
                return if semi_error < primary_error { semi } else { primary };
            }
            return Rational::from((h_prev1, k_prev1));
        }
        let r = p - a * &q;
        h_prev2 = h_prev1;
        k_prev2 = k_prev1;
        h_prev1 = h;
        k_prev1 = k;
        if r.cmp0() == Ordering::Equal {
            return Rational::from((h_prev1, k_prev1));
        }
        p = q;
        q = r;
    }
}

impl fmt::Display for NumericAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericAtom::Int(i) => write!(f, "{i}"),
            NumericAtom::Rat(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            NumericAtom::Flt(x) => write!(f, "{x}"),
            NumericAtom::Cmp(c) => write!(f, "({}, {})", c.real(), c.imag()),
            NumericAtom::Time(t) => write!(f, "{t}"),
        }
    }
}

impl PartialEq for NumericAtom {
    fn eq(&self, other: &Self) -> bool {
        crate::numeric::compare(self, other)
            .map(|o| o == Ordering::Equal)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_to_rational_recovers_an_exact_dyadic_value() {
        let f = Float::with_val(53, 0.25);
        let rat = NumericAtom::float_to_rational(&f, 6).unwrap();
        assert_eq!(rat, Rational::from((1, 4)));
    }

    #[test]
    fn float_to_rational_bounds_the_denominator_to_the_requested_precision() {
        let f = Float::with_val(200, rug::float::Constant::Pi);
        let rat = NumericAtom::float_to_rational(&f, 4).unwrap();
        assert!(*rat.denom() <= Integer::from(10_000));
        let back = Float::with_val(200, &rat);
        let residual = Float::with_val(200, &f - &back).abs();
        assert!(residual < Float::with_val(200, 0.001));
    }

    #[test]
    fn best_rational_approximation_returns_the_value_unchanged_when_already_within_bound() {
        let value = Rational::from((3, 8));
        let approx = best_rational_approximation(&value, &Integer::from(100));
        assert_eq!(approx, value);
    }

    #[test]
    fn best_rational_approximation_never_exceeds_the_denominator_bound() {
        let value = Rational::from(std::f64::consts::PI);
        let bound = Integer::from(1000);
        let approx = best_rational_approximation(&value, &bound);
        assert!(*approx.denom() <= bound);
    }
}
