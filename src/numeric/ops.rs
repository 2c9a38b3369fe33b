use std::cmp::Ordering;

use rug::ops::Pow;
use rug::{Float, Rational};

use crate::error::{CalcError, CalcResult};
use crate::numeric::atom::NumericAtom;
use crate::numeric::time::Time;

/// The closed operation set `{+, -, *, /, mod, ^}`. `cmp` is handled
/// separately by [`compare`] since it doesn't return a `NumericAtom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

fn common_rung(a: &NumericAtom, b: &NumericAtom) -> u8 {
    let ra = match a {
        NumericAtom::Int(_) => 0,
        NumericAtom::Rat(_) => 1,
        NumericAtom::Flt(_) => 2,
        NumericAtom::Cmp(_) => 3,
        NumericAtom::Time(_) => 255,
    };
    let rb = match b {
        NumericAtom::Int(_) => 0,
        NumericAtom::Rat(_) => 1,
        NumericAtom::Flt(_) => 2,
        NumericAtom::Cmp(_) => 3,
        NumericAtom::Time(_) => 255,
    };
    ra.max(rb)
}

fn common_prec(a: &NumericAtom, b: &NumericAtom) -> u32 {
    a.precision_bits().max(b.precision_bits())
}

/// Apply `op` to two atoms of the *same* widened kind. Panics on a kind it
/// doesn't recognize — callers only ever hand it same-kind pairs produced
/// by [`binary_op`]'s widening step.
fn same_kind_op(op: BinOp, a: NumericAtom, b: NumericAtom) -> CalcResult<NumericAtom> {
    use NumericAtom::*;
    Ok(match (a, b) {
        (Int(x), Int(y)) => match op {
            BinOp::Add => Int(x + y),
            BinOp::Sub => Int(x - y),
            BinOp::Mul => Int(x * y),
            BinOp::Div => {
                if y.cmp0() == Ordering::Equal {
                    return Err(CalcError::Domain("division by zero".into()));
                }
                let (q, r) = x.div_rem_euc(y);
                if r.cmp0() == Ordering::Equal {
                    Int(q)
                } else {
                    Rat(Rational::from(q) + Rational::from(r) / Rational::from(y))
                        .reduce_checked()?
                }
            }
            BinOp::Mod => {
                if y.cmp0() == Ordering::Equal {
                    return Err(CalcError::Domain("modulo by zero".into()));
                }
                Int(x % y)
            }
            BinOp::Pow => {
                if y.cmp0() == Ordering::Less {
                    let exp = y.to_i32().ok_or_else(|| {
                        CalcError::Domain("negative exponent too large".into())
                    })?;
                    Rat(Rational::from(x).pow(exp))
                } else {
                    let exp = y
                        .to_u32()
                        .ok_or_else(|| CalcError::Domain("exponent too large".into()))?;
                    Int(x.pow(exp))
                }
            }
        },
        (Rat(x), Rat(y)) => match op {
            BinOp::Add => Rat(x + y),
            BinOp::Sub => Rat(x - y),
            BinOp::Mul => Rat(x * y),
            BinOp::Div => {
                if y.cmp0() == Ordering::Equal {
                    return Err(CalcError::Domain("division by zero".into()));
                }
                Rat(x / y)
            }
            BinOp::Mod => {
                // Residue after the largest integral multiple of y.
                if y.cmp0() == Ordering::Equal {
                    return Err(CalcError::Domain("modulo by zero".into()));
                }
                let quotient = Rational::from(&x / &y);
                let floor = quotient.trunc();
                Rat(x - floor * y)
            }
            BinOp::Pow => {
                let exp = y
                    .to_i32()
                    .ok_or_else(|| CalcError::Domain("exponent must be an integer".into()))?;
                Rat(x.pow(exp))
            }
        },
        (Flt(x), Flt(y)) => {
            let prec = x.prec().max(y.prec());
            match op {
                BinOp::Add => Flt(x + y),
                BinOp::Sub => Flt(x - y),
                BinOp::Mul => Flt(x * y),
                BinOp::Div => {
                    if y.is_zero() {
                        return Err(CalcError::Domain("division by zero".into()));
                    }
                    Flt(x / y)
                }
                BinOp::Mod => Flt(x.clone() - (Float::with_val(prec, &x / &y).trunc() * y)),
                BinOp::Pow => Flt(x.pow(y)),
            }
        }
        (Cmp(x), Cmp(y)) => match op {
            BinOp::Add => Cmp(x + y),
            BinOp::Sub => Cmp(x - y),
            BinOp::Mul => Cmp(x * y),
            BinOp::Div => {
                if y.real().is_zero() && y.imag().is_zero() {
                    return Err(CalcError::Domain("division by zero".into()));
                }
                Cmp(x / y)
            }
            BinOp::Mod => return Err(CalcError::Domain("% is undefined on complex values".into())),
            BinOp::Pow => Cmp(x.pow(y)),
        },
        _ => unreachable!("same_kind_op called with mismatched kinds"),
    })
}

impl NumericAtom {
    fn reduce_checked(self) -> CalcResult<NumericAtom> {
        Ok(self.reduce())
    }
}

fn time_scalar_op(op: BinOp, t: &Time, s: &NumericAtom, prec_bits: u32) -> CalcResult<NumericAtom> {
    let s_rat = to_rational(s, prec_bits)?;
    match op {
        BinOp::Mul => Ok(NumericAtom::Time(Time::duration(t.value.clone() * s_rat))),
        BinOp::Div => {
            if s_rat.cmp0() == Ordering::Equal {
                return Err(CalcError::Domain("division by zero".into()));
            }
            Ok(NumericAtom::Time(Time::new(t.value.clone() / s_rat, t.absolute)))
        }
        _ => Err(CalcError::Domain(
            "only multiplication and division combine a time with a scalar".into(),
        )),
    }
}

fn to_rational(a: &NumericAtom, prec_bits: u32) -> CalcResult<Rational> {
    match a {
        NumericAtom::Int(i) => Ok(Rational::from(i.clone())),
        NumericAtom::Rat(r) => Ok(r.clone()),
        NumericAtom::Flt(f) => NumericAtom::float_to_rational(f, (prec_bits as f64 / super::BITS_PER_DIGIT) as u32),
        NumericAtom::Cmp(_) => Err(CalcError::Domain("complex value where a real scalar was expected".into())),
        NumericAtom::Time(_) => Err(CalcError::Domain("time value where a scalar was expected".into())),
    }
}

/// Binary dispatch across the widening ladder. `Time` combinations are
/// intercepted before generic widening since they are not part of the
/// `Int < Rat < Flt < Cmp` ladder.
pub fn binary_op(op: BinOp, a: &NumericAtom, b: &NumericAtom, prec_bits: u32) -> CalcResult<NumericAtom> {
    match (a, b) {
        (NumericAtom::Time(t1), NumericAtom::Time(t2)) => match op {
            BinOp::Sub => Ok(NumericAtom::Time(Time::duration(t1.value.clone() - t2.value.clone()))),
            BinOp::Add if !t1.absolute && !t2.absolute => {
                Ok(NumericAtom::Time(Time::duration(t1.value.clone() + t2.value.clone())))
            }
            BinOp::Div if t1.absolute || t2.absolute => {
                Err(CalcError::Domain("cannot divide by an absolute time".into()))
            }
            BinOp::Div => {
                if t2.value.cmp0() == Ordering::Equal {
                    return Err(CalcError::Domain("division by zero".into()));
                }
                Ok(NumericAtom::Rat(t1.value.clone() / t2.value.clone()).reduce())
            }
            _ => Err(CalcError::Domain("unsupported operation between two time values".into())),
        },
        (NumericAtom::Time(t), NumericAtom::Int(_) | NumericAtom::Rat(_) | NumericAtom::Flt(_)) => {
            time_scalar_op(op, t, b, prec_bits)
        }
        (NumericAtom::Int(_) | NumericAtom::Rat(_) | NumericAtom::Flt(_), NumericAtom::Time(t))
            if op == BinOp::Mul =>
        {
            time_scalar_op(op, t, a, prec_bits)
        }
        (NumericAtom::Time(t), _) if op == BinOp::Add => {
            let dur = to_rational(b, prec_bits)?;
            Ok(NumericAtom::Time(Time::new(t.value.clone() + dur, t.absolute)))
        }
        (_, NumericAtom::Time(t)) if op == BinOp::Add => {
            let dur = to_rational(a, prec_bits)?;
            Ok(NumericAtom::Time(Time::new(t.value.clone() + dur, t.absolute)))
        }
        _ => {
            let rung = common_rung(a, b);
            let prec = common_prec(a, b).max(prec_bits);
            let aw = a.widen_to(rung, prec);
            let bw = b.widen_to(rung, prec);
            same_kind_op(op, aw, bw).map(NumericAtom::reduce)
        }
    }
}

pub fn unary_neg(a: &NumericAtom) -> CalcResult<NumericAtom> {
    Ok(match a {
        NumericAtom::Int(i) => NumericAtom::Int(-i.clone()),
        NumericAtom::Rat(r) => NumericAtom::Rat(-r.clone()),
        NumericAtom::Flt(f) => NumericAtom::Flt(-f.clone()),
        NumericAtom::Cmp(c) => NumericAtom::Cmp(-c.clone()),
        NumericAtom::Time(t) => NumericAtom::Time(Time::new(-t.value.clone(), t.absolute)),
    })
}

/// Three-way comparison, used by the boolean/comparison functions and by
/// the `if`/`while` condition machinery. Complex values only support
/// equality, matching the fact that `<`/`>` have no meaning on `Cmp`.
pub fn compare(a: &NumericAtom, b: &NumericAtom) -> CalcResult<Ordering> {
    match (a, b) {
        (NumericAtom::Time(t1), NumericAtom::Time(t2)) => Ok(t1.value.cmp(&t2.value)),
        (NumericAtom::Cmp(x), NumericAtom::Cmp(y)) => {
            if x == y {
                Ok(Ordering::Equal)
            } else {
                Err(CalcError::Domain("complex values are not ordered".into()))
            }
        }
        _ => {
            let rung = common_rung(a, b);
            let prec = common_prec(a, b);
            let aw = a.widen_to(rung.min(2), prec);
            let bw = b.widen_to(rung.min(2), prec);
            match (aw, bw) {
                (NumericAtom::Int(x), NumericAtom::Int(y)) => Ok(x.cmp(&y)),
                (NumericAtom::Rat(x), NumericAtom::Rat(y)) => Ok(x.cmp(&y)),
                (NumericAtom::Flt(x), NumericAtom::Flt(y)) => {
                    x.partial_cmp(&y).ok_or_else(|| CalcError::Domain("not-a-number comparison".into()))
                }
                _ => Err(CalcError::Domain("values are not ordered".into())),
            }
        }
    }
}
