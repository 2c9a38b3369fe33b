use std::cmp::Ordering;

use crate::builtins::{pop1, pop2};
use crate::error::{CalcError, CalcResult};
use crate::numeric::{BinOp, NumericAtom};
use crate::register_calc_fn;
use crate::registry::CalcFn;
use crate::stack::{Config, Flags, StackEntry, Value};
use crate::value_ops;

/// Whether a freshly produced value reads as "zero" for `flags.zero`
/// (§3.4: flags are "updated on every value write", not just by `cmp`).
/// Only numeric atoms have a zero; containers never set the flag.
fn value_is_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_zero(),
        _ => false,
    }
}

fn combine(stack: &mut Vec<StackEntry>, config: &Config, flags: &mut Flags, op: BinOp) -> CalcResult<()> {
    let (a, b) = pop2(stack)?;
    if !a.unit.compat(&b.unit) {
        return Err(CalcError::UnitsMismatch(format!("{} vs {}", a.unit, b.unit)));
    }
    let unit = match op {
        BinOp::Mul => a.unit.mul(&b.unit),
        BinOp::Div => a.unit.div(&b.unit),
        _ => if a.unit.is_none() { b.unit.clone() } else { a.unit.clone() },
    };
    let value = value_ops::combine(op, a.value, b.value, config.precision_bits())?;
    crate::stack::check_fixed_width(&value, config)?;
    flags.zero = value_is_zero(&value);
    stack.push(StackEntry::with_config(value, config).with_unit(unit));
    Ok(())
}

fn add(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Add)
}

fn sub(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Sub)
}

fn mul(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Mul)
}

fn div(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Div)
}

fn modulo(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Mod)
}

fn pow(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    combine(stack, config, flags, BinOp::Pow)
}

fn neg(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    let a = pop1(stack)?;
    let value = value_ops::negate(a.value)?;
    crate::stack::check_fixed_width(&value, config)?;
    flags.zero = value_is_zero(&value);
    stack.push(StackEntry::with_config(value, config).with_unit(a.unit));
    Ok(())
}

fn abs(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    let a = pop1(stack)?;
    let value = match a.value {
        Value::Number(n) => Value::Number(n.magnitude().reduce()),
        other => other,
    };
    flags.zero = value_is_zero(&value);
    stack.push(StackEntry::with_config(value, config).with_unit(a.unit));
    Ok(())
}

/// Compares the top two entries and sets `flags` without producing a
/// stack result, mirroring the driver-level `cmp` in the original
/// register-machine core.
fn cmp(stack: &mut Vec<StackEntry>, _config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    let (a, b) = pop2(stack)?;
    let ordering = value_ops::compare(&a.value, &b.value)?;
    flags.set_from_comparison(ordering);
    Ok(())
}

/// A boolean-producing comparison: pops two entries, evaluates
/// `ordering_holds`, pushes `1`/`0` and sets `flags.zero` to match the
/// pushed value — every value-producing function updates `flags.zero`
/// from its own result, not just `cmp`.
fn comparison(
    stack: &mut Vec<StackEntry>,
    config: &mut Config,
    flags: &mut Flags,
    ordering_holds: impl Fn(Ordering) -> bool,
) -> CalcResult<()> {
    let (a, b) = pop2(stack)?;
    let ordering = value_ops::compare(&a.value, &b.value)?;
    let holds = ordering_holds(ordering);
    flags.set_from_comparison(ordering);
    flags.zero = !holds;
    let result = NumericAtom::Int(rug::Integer::from(holds as i64));
    stack.push(StackEntry::with_config(Value::Number(result), config));
    Ok(())
}

fn eq(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o == Ordering::Equal)
}

fn ne(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o != Ordering::Equal)
}

fn lt(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o == Ordering::Less)
}

fn gt(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o == Ordering::Greater)
}

fn le(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o != Ordering::Greater)
}

fn ge(stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
    comparison(stack, config, flags, |o| o != Ordering::Less)
}

register_calc_fn! { ADD = CalcFn { name: "+", num_args: 2, num_resp: 1, help: "adds the top two stack entries", op: add } }
register_calc_fn! { SUB = CalcFn { name: "-", num_args: 2, num_resp: 1, help: "subtracts the top entry from the one below it", op: sub } }
register_calc_fn! { MUL = CalcFn { name: "*", num_args: 2, num_resp: 1, help: "multiplies the top two stack entries", op: mul } }
register_calc_fn! { DIV = CalcFn { name: "/", num_args: 2, num_resp: 1, help: "divides the second-from-top entry by the top", op: div } }
register_calc_fn! { MOD = CalcFn { name: "mod", num_args: 2, num_resp: 1, help: "residue of the second-from-top entry divided by the top", op: modulo } }
register_calc_fn! { POW = CalcFn { name: "^", num_args: 2, num_resp: 1, help: "raises the second-from-top entry to the power of the top", op: pow } }
register_calc_fn! { NEG = CalcFn { name: "neg", num_args: 1, num_resp: 1, help: "negates the top stack entry", op: neg } }
register_calc_fn! { ABS = CalcFn { name: "abs", num_args: 1, num_resp: 1, help: "absolute value of the top stack entry", op: abs } }
register_calc_fn! { CMP = CalcFn { name: "cmp", num_args: 2, num_resp: 0, help: "compares the top two entries and sets zero/sign flags", op: cmp } }
register_calc_fn! { EQ = CalcFn { name: "==", num_args: 2, num_resp: 1, help: "pushes 1 if the top two entries are equal, else 0", op: eq } }
register_calc_fn! { NE = CalcFn { name: "!=", num_args: 2, num_resp: 1, help: "pushes 1 if the top two entries differ, else 0", op: ne } }
register_calc_fn! { LT = CalcFn { name: "<", num_args: 2, num_resp: 1, help: "pushes 1 if the second-from-top entry is less than the top, else 0", op: lt } }
register_calc_fn! { GT = CalcFn { name: ">", num_args: 2, num_resp: 1, help: "pushes 1 if the second-from-top entry is greater than the top, else 0", op: gt } }
register_calc_fn! { LE = CalcFn { name: "<=", num_args: 2, num_resp: 1, help: "pushes 1 if the second-from-top entry is at most the top, else 0", op: le } }
register_calc_fn! { GE = CalcFn { name: ">=", num_args: 2, num_resp: 1, help: "pushes 1 if the second-from-top entry is at least the top, else 0", op: ge } }

pub fn list() -> Vec<&'static CalcFn> {
    vec![&ADD, &SUB, &MUL, &DIV, &MOD, &POW, &NEG, &ABS, &CMP, &EQ, &NE, &LT, &GT, &LE, &GE]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Value;
    use pretty_assertions::assert_eq;
    use rug::Integer;

    fn int_entry(n: i64) -> StackEntry {
        StackEntry::new(Value::Number(NumericAtom::Int(Integer::from(n))))
    }

    #[test]
    fn greater_than_pushes_boolean_and_sets_zero_flag() {
        let mut stack = vec![int_entry(1), int_entry(2)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        gt(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].value.to_string(), "0");
        assert!(flags.zero);
    }

    #[test]
    fn less_than_or_equal_holds_clears_zero_flag() {
        let mut stack = vec![int_entry(1), int_entry(2)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        le(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(stack[0].value.to_string(), "1");
        assert!(!flags.zero);
    }

    #[test]
    fn fixed_width_overflow_is_rejected_and_leaves_the_stack_untouched() {
        crate::registry::ensure_builtins_registered();
        let snapshot = vec![int_entry(100), int_entry(100)];
        let mut stack = snapshot.clone();
        let mut config = Config { fixed_bits: Some(8), is_signed: true, ..Config::default() };
        let mut flags = Flags::default();
        let result =
            crate::registry::with_registry(|r| r.call("+", &mut stack, &mut config, &mut flags));
        assert!(matches!(result, Err(CalcError::Overflow(_))));
        assert_eq!(stack.len(), snapshot.len());
    }

    #[test]
    fn add_sets_the_zero_flag_when_the_result_is_zero() {
        let mut stack = vec![int_entry(5), int_entry(-5)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        add(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(stack[0].value.to_string(), "0");
        assert!(flags.zero);
    }

    #[test]
    fn add_clears_the_zero_flag_when_the_result_is_nonzero() {
        let mut stack = vec![int_entry(2), int_entry(3)];
        let mut config = Config::default();
        let mut flags = Flags { zero: true, ..Flags::default() };
        add(&mut stack, &mut config, &mut flags).unwrap();
        assert!(!flags.zero);
    }

    #[test]
    fn abs_of_a_complex_number_is_its_magnitude() {
        let config = Config::default();
        let c = rug::Complex::with_val(config.precision_bits(), (3, 4));
        let mut stack = vec![StackEntry::new(Value::Number(NumericAtom::Cmp(c)))];
        let mut config = Config::default();
        let mut flags = Flags::default();
        abs(&mut stack, &mut config, &mut flags).unwrap();
        let rendered: f64 = stack[0].value.to_string().parse().unwrap();
        assert!((rendered - 5.0).abs() < 1e-9);
    }

    #[test]
    fn abs_of_a_negative_integer_is_positive() {
        let mut stack = vec![int_entry(-7)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        abs(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(stack[0].value.to_string(), "7");
    }

    #[test]
    fn fixed_width_in_range_result_is_accepted() {
        let mut stack = vec![int_entry(100), int_entry(20)];
        let mut config = Config { fixed_bits: Some(8), is_signed: true, ..Config::default() };
        let mut flags = Flags::default();
        add(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(stack[0].value.to_string(), "120");
    }
}
