//! Lifts the numeric-tower operations of [`crate::numeric::ops`] up to
//! [`Value`], the wider union the stack actually holds: containers
//! broadcast/zip elementwise, and any operation touching a `Symbolic`
//! operand produces a `Symbolic` with the operator as its root.

use smrtclcltr_symbolic::Symbolic;

use crate::error::{CalcError, CalcResult};
use crate::numeric::{self, BinOp, CalcList, NumericAtom};
use crate::stack::Value;

/// Lifts a numeric atom into a symbolic leaf. Only `Int`/`Rat`/`Flt`
/// widen into the `Symbolic` tree's real-valued `number` leaf; `Cmp` has
/// no complex-valued symbolic leaf to widen into, and `Time` isn't part
/// of the widening ladder at all (its rung is a sentinel, not a real
/// position), so both are rejected here rather than handed to
/// `widen_to`, which panics on a target below an atom's own rung.
fn atom_to_symbolic(atom: &NumericAtom) -> Option<Symbolic> {
    match atom {
        NumericAtom::Int(_) | NumericAtom::Rat(_) | NumericAtom::Flt(_) => match atom.widen_to(2, 113) {
            NumericAtom::Flt(f) => Some(Symbolic::number(f)),
            _ => unreachable!("Int/Rat/Flt always widen to Flt at rung 2"),
        },
        NumericAtom::Cmp(_) | NumericAtom::Time(_) => None,
    }
}

fn value_to_symbolic(value: &Value) -> Option<Symbolic> {
    match value {
        Value::Number(n) => atom_to_symbolic(n),
        Value::Symbolic(s) => Some(s.clone()),
        _ => None,
    }
}

fn combine_symbolic(op: BinOp, a: &Value, b: &Value) -> CalcResult<Value> {
    let lhs = value_to_symbolic(a)
        .ok_or_else(|| CalcError::Domain("this value cannot appear in a symbolic expression".into()))?;
    let rhs = value_to_symbolic(b)
        .ok_or_else(|| CalcError::Domain("this value cannot appear in a symbolic expression".into()))?;
    let result = match op {
        BinOp::Add => lhs + rhs,
        BinOp::Sub => lhs - rhs,
        BinOp::Mul => lhs * rhs,
        BinOp::Div => lhs / rhs,
        BinOp::Mod => lhs % rhs,
        BinOp::Pow => lhs.pow(rhs),
    };
    Ok(Value::Symbolic(result))
}

pub fn combine(op: BinOp, a: Value, b: Value, prec_bits: u32) -> CalcResult<Value> {
    if matches!(a, Value::Symbolic(_)) || matches!(b, Value::Symbolic(_)) {
        return combine_symbolic(op, &a, &b);
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(numeric::binary_op(op, &x, &y, prec_bits)?)),
        (Value::List(x), Value::Number(y)) => Ok(Value::List(x.broadcast(op, &y, prec_bits)?)),
        (Value::Number(x), Value::List(y)) => {
            let mut out = Vec::with_capacity(y.items.len());
            for item in &y.items {
                out.push(numeric::binary_op(op, &x, item, prec_bits)?);
            }
            Ok(Value::List(CalcList::new(out)))
        }
        (Value::List(x), Value::List(y)) => Ok(Value::List(x.zip_with(op, &y, prec_bits)?)),
        (Value::Matrix(x), Value::Number(y)) => Ok(Value::Matrix(x.broadcast(op, &y, prec_bits)?)),
        (Value::Matrix(x), Value::Matrix(y)) => match op {
            BinOp::Mul => Ok(Value::Matrix(x.matmul(&y, prec_bits)?)),
            BinOp::Div => {
                let inv = y.inverse(prec_bits)?;
                Ok(Value::Matrix(x.matmul(&inv, prec_bits)?))
            }
            BinOp::Add | BinOp::Sub => Ok(Value::Matrix(x.elementwise(op, &y, prec_bits)?)),
            _ => Err(CalcError::Domain("matrices only support +, -, * and / (via inverse)".into())),
        },
        (a, b) => Err(CalcError::Domain(format!("cannot combine {a} and {b}"))),
    }
}

pub fn negate(value: Value) -> CalcResult<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(numeric::unary_neg(&n)?)),
        Value::List(l) => {
            let items = l.items.iter().map(numeric::unary_neg).collect::<CalcResult<Vec<_>>>()?;
            Ok(Value::List(CalcList::new(items)))
        }
        Value::Matrix(m) => {
            let values = m.values.iter().map(numeric::unary_neg).collect::<CalcResult<Vec<_>>>()?;
            Ok(Value::Matrix(crate::numeric::Matrix { rows: m.rows, cols: m.cols, values }))
        }
        Value::Symbolic(s) => Ok(Value::Symbolic(-s)),
        Value::Program(_) => Err(CalcError::Domain("a program has no numeric negation".into())),
    }
}

pub fn compare(a: &Value, b: &Value) -> CalcResult<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numeric::compare(x, y),
        _ => Err(CalcError::Domain("only numbers are ordered".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Time;
    use pretty_assertions::assert_eq;
    use rug::{Integer, Rational};

    #[test]
    fn combining_a_symbolic_with_an_integer_widens_it_to_a_number_leaf() {
        let sym = Value::Symbolic(Symbolic::variable("x"));
        let int = Value::Number(NumericAtom::Int(Integer::from(2)));
        let result = combine(BinOp::Add, sym, int, 113).unwrap();
        assert!(matches!(result, Value::Symbolic(_)));
    }

    #[test]
    fn combining_a_symbolic_with_a_duration_is_a_domain_error_not_a_panic() {
        let sym = Value::Symbolic(Symbolic::variable("x"));
        let duration = Value::Number(NumericAtom::Time(Time::new(Rational::from(3600), false)));
        let err = combine(BinOp::Add, sym, duration, 113).unwrap_err();
        assert!(matches!(err, CalcError::Domain(_)));
    }
}
