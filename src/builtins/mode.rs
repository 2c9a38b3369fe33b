use crate::builtins::pop1;
use crate::error::{CalcError, CalcResult};
use crate::numeric::NumericAtom;
use crate::register_calc_fn;
use crate::registry::CalcFn;
use crate::stack::{AngleMode, ComplexMode, Config, Flags, QuotientMode, StackEntry, Value};

fn pop_u32(stack: &mut Vec<StackEntry>, name: &str) -> CalcResult<u32> {
    let entry = pop1(stack)?;
    match entry.value {
        Value::Number(NumericAtom::Int(i)) => i
            .to_u32()
            .ok_or_else(|| CalcError::InvalidArgument(format!("{name} argument out of range"))),
        _ => Err(CalcError::InvalidArgument(format!("{name} requires an integer argument"))),
    }
}

fn base(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let n = pop_u32(stack, "base")?;
    if !(2..=36).contains(&n) {
        return Err(CalcError::InvalidArgument(format!("base must be between 2 and 36, found {n}")));
    }
    config.base = n;
    Ok(())
}

fn precision(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let n = pop_u32(stack, "precision")?;
    config.precision = n.max(1);
    Ok(())
}

fn fixed_bits(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let n = pop_u32(stack, "fixed_bits")?;
    config.fixed_bits = if n == 0 { None } else { Some(n) };
    Ok(())
}

fn signed_mode(_stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    config.is_signed = !config.is_signed;
    Ok(())
}

fn mpq_mode(_stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    config.mpq_mode = match config.mpq_mode {
        QuotientMode::Quotient => QuotientMode::Floating,
        QuotientMode::Floating => QuotientMode::Quotient,
    };
    Ok(())
}

fn mpc_mode(_stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    config.mpc_mode = match config.mpc_mode {
        ComplexMode::Rect => ComplexMode::Polar,
        ComplexMode::Polar => ComplexMode::Ij,
        ComplexMode::Ij => ComplexMode::Rect,
    };
    Ok(())
}

fn angle_mode(_stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    config.angle_mode = match config.angle_mode {
        AngleMode::Degrees => AngleMode::Radians,
        AngleMode::Radians => AngleMode::Gradians,
        AngleMode::Gradians => AngleMode::Degrees,
    };
    Ok(())
}

fn debug(_stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    config.debug = !config.debug;
    Ok(())
}

register_calc_fn! { BASE = CalcFn { name: "base", num_args: 1, num_resp: 0, help: "sets the display radix from the top stack entry", op: base } }
register_calc_fn! { PRECISION = CalcFn { name: "precision", num_args: 1, num_resp: 0, help: "sets the working decimal precision from the top stack entry", op: precision } }
register_calc_fn! { FIXED_BITS = CalcFn { name: "fixed_bits", num_args: 1, num_resp: 0, help: "sets the fixed integer width in bits (0 disables it)", op: fixed_bits } }
register_calc_fn! { SIGNED_MODE = CalcFn { name: "signed_mode", num_args: 0, num_resp: 0, help: "toggles signed/unsigned fixed-width display", op: signed_mode } }
register_calc_fn! { MPQ_MODE = CalcFn { name: "mpq_mode", num_args: 0, num_resp: 0, help: "cycles rational display between exact quotient and floating-point", op: mpq_mode } }
register_calc_fn! { MPC_MODE = CalcFn { name: "mpc_mode", num_args: 0, num_resp: 0, help: "cycles complex display between rectangular, polar and i-suffixed forms", op: mpc_mode } }
register_calc_fn! { ANGLE_MODE = CalcFn { name: "angle_mode", num_args: 0, num_resp: 0, help: "cycles degrees -> radians -> gradians", op: angle_mode } }
register_calc_fn! { DEBUG = CalcFn { name: "debug", num_args: 0, num_resp: 0, help: "toggles verbose execution tracing", op: debug } }

pub fn list() -> Vec<&'static CalcFn> {
    vec![&BASE, &PRECISION, &FIXED_BITS, &SIGNED_MODE, &MPQ_MODE, &MPC_MODE, &ANGLE_MODE, &DEBUG]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mpq_mode_cycles_quotient_and_floating() {
        let mut stack = Vec::new();
        let mut config = Config::default();
        let mut flags = Flags::default();
        assert_eq!(config.mpq_mode, QuotientMode::Quotient);
        mpq_mode(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(config.mpq_mode, QuotientMode::Floating);
        mpq_mode(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(config.mpq_mode, QuotientMode::Quotient);
    }

    #[test]
    fn mpc_mode_cycles_rect_polar_ij() {
        let mut stack = Vec::new();
        let mut config = Config::default();
        let mut flags = Flags::default();
        assert_eq!(config.mpc_mode, ComplexMode::Rect);
        mpc_mode(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(config.mpc_mode, ComplexMode::Polar);
        mpc_mode(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(config.mpc_mode, ComplexMode::Ij);
        mpc_mode(&mut stack, &mut config, &mut flags).unwrap();
        assert_eq!(config.mpc_mode, ComplexMode::Rect);
    }
}
