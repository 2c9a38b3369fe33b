use std::cmp::Ordering;
use std::fmt;

use rug::Integer;

use crate::error::{CalcError, CalcResult};
use crate::numeric::{CalcList, Matrix, NumericAtom};
use crate::program::Program;
use crate::units::Unit;

/// A stack entry's payload: one of the calculator's five surface-level
/// value kinds. `NumericAtom` itself is the arithmetic tower's concern
/// (the five *numeric* atoms); `Value` is the wider union arithmetic
/// operators and the driver actually push and pop.
#[derive(Clone, Debug)]
pub enum Value {
    Number(NumericAtom),
    List(CalcList),
    Matrix(Matrix),
    Program(Program),
    Symbolic(smrtclcltr_symbolic::Symbolic),
}

impl Value {
    pub fn is_truthy(&self) -> CalcResult<bool> {
        match self {
            Value::Number(n) => Ok(!n.is_zero()),
            Value::List(l) => Ok(!l.is_empty()),
            _ => Err(crate::error::CalcError::Domain(
                "condition must evaluate to a number".into(),
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::List(l) => write!(f, "{l}"),
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Program(_) => write!(f, "$(...)"),
            Value::Symbolic(s) => write!(f, "'{s}'"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => a == b,
            (Value::Symbolic(a), Value::Symbolic(b)) => a == b,
            _ => false,
        }
    }
}

impl From<NumericAtom> for Value {
    fn from(atom: NumericAtom) -> Value {
        Value::Number(atom)
    }
}

impl From<CalcList> for Value {
    fn from(list: CalcList) -> Value {
        Value::List(list)
    }
}

impl From<Matrix> for Value {
    fn from(matrix: Matrix) -> Value {
        Value::Matrix(matrix)
    }
}

impl From<Program> for Value {
    fn from(program: Program) -> Value {
        Value::Program(program)
    }
}

impl From<smrtclcltr_symbolic::Symbolic> for Value {
    fn from(symbolic: smrtclcltr_symbolic::Symbolic) -> Value {
        Value::Symbolic(symbolic)
    }
}

/// Angle convention used by trigonometric functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AngleMode {
    Degrees,
    Radians,
    Gradians,
}

impl Default for AngleMode {
    fn default() -> Self {
        AngleMode::Degrees
    }
}

/// Display convention for `Rat` atoms: an exact `p/q` quotient, or
/// widened to `Flt` at the configured precision for display only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotientMode {
    Quotient,
    Floating,
}

impl Default for QuotientMode {
    fn default() -> Self {
        QuotientMode::Quotient
    }
}

/// Display convention for `Cmp` atoms: Cartesian `(re, im)`, polar
/// `(mag, <angle)`, or a trailing `i`-suffixed rectangular form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComplexMode {
    Rect,
    Polar,
    Ij,
}

impl Default for ComplexMode {
    fn default() -> Self {
        ComplexMode::Rect
    }
}

/// One entry on the data stack: a value plus the display/arithmetic
/// metadata it carries with it as it moves through the machine.
#[derive(Clone, Debug)]
pub struct StackEntry {
    pub value: Value,
    pub unit: Unit,
    /// Display radix for integer-valued entries (2, 8, 10, 16, ...).
    pub base: u32,
    /// Width in bits for fixed-width integer display/overflow checks;
    /// `None` means unconstrained ("big num" mode).
    pub fixed_bits: Option<u32>,
    pub is_signed: bool,
}

impl StackEntry {
    pub fn new(value: impl Into<Value>) -> StackEntry {
        StackEntry { value: value.into(), unit: Unit::none(), base: 10, fixed_bits: None, is_signed: true }
    }

    pub fn with_config(value: impl Into<Value>, config: &Config) -> StackEntry {
        let value = value.into();
        StackEntry {
            value,
            unit: Unit::none(),
            base: config.base,
            fixed_bits: config.fixed_bits,
            is_signed: config.is_signed,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> StackEntry {
        self.unit = unit;
        self
    }

    /// Renders this entry's value the way `show_stack` does: honoring
    /// this entry's own base/fixed-bits/signedness for `Int`s, and the
    /// calculator-wide `mpq_mode`/`mpc_mode` display conventions for
    /// `Rat`/`Cmp`. Other atoms and containers fall back to their plain
    /// `Display` impl, which carries no mode-dependent rendering.
    pub fn render(&self, config: &Config) -> String {
        let body = match &self.value {
            Value::Number(n) => render_number(n, self, config),
            other => other.to_string(),
        };
        if self.unit.is_none() {
            body
        } else {
            format!("{body}{}", self.unit)
        }
    }

    /// The bracketed debug tag `show_stack` appends to each entry when
    /// `debug` mode is on, e.g. `[u32,p:50,dec,mpz]`.
    pub fn debug_tag(&self, config: &Config) -> String {
        let width = match self.fixed_bits {
            Some(bits) => format!("{}{bits}", if self.is_signed { "s" } else { "u" }),
            None => "big".to_string(),
        };
        let base_name = match self.base {
            2 => "bin",
            8 => "oct",
            10 => "dec",
            16 => "hex",
            other => return format!("{width},p:{},base{other},{}", config.precision, atom_tag(&self.value)),
        };
        format!("{width},p:{},{base_name},{}", config.precision, atom_tag(&self.value))
    }
}

fn atom_tag(value: &Value) -> &'static str {
    match value {
        Value::Number(NumericAtom::Int(_)) => "mpz",
        Value::Number(NumericAtom::Rat(_)) => "mpq",
        Value::Number(NumericAtom::Flt(_)) => "mpf",
        Value::Number(NumericAtom::Cmp(_)) => "mpc",
        Value::Number(NumericAtom::Time(_)) => "time",
        Value::List(_) => "list",
        Value::Matrix(_) => "matrix",
        Value::Program(_) => "program",
        Value::Symbolic(_) => "symbolic",
    }
}

fn render_number(n: &NumericAtom, entry: &StackEntry, config: &Config) -> String {
    match n {
        NumericAtom::Int(i) => render_int(i, entry.base),
        NumericAtom::Rat(r) => match config.mpq_mode {
            QuotientMode::Quotient => format!("{}/{}", r.numer(), r.denom()),
            QuotientMode::Floating => {
                rug::Float::with_val(config.precision_bits(), r).to_string()
            }
        },
        NumericAtom::Cmp(c) => render_complex(c, config.mpc_mode),
        NumericAtom::Flt(f) => f.to_string(),
        NumericAtom::Time(t) => t.to_string(),
    }
}

/// Renders an `Int` in `base`, prefixed the way the parser's own
/// `0x`/`0b`/leading-`0` literal forms read back in (§6.4's "parse then
/// format is the identity" property), decimal left bare.
fn render_int(i: &Integer, base: u32) -> String {
    let digits = i.to_string_radix(base as i32);
    match base {
        2 => format!("0b{digits}"),
        8 => format!("0{digits}"),
        16 => format!("0x{digits}"),
        _ => digits,
    }
}

fn render_complex(c: &rug::Complex, mode: ComplexMode) -> String {
    match mode {
        ComplexMode::Rect => format!("({}, {})", c.real(), c.imag()),
        ComplexMode::Ij => {
            let im = c.imag();
            if im.is_sign_negative() {
                format!("{}{}i", c.real(), im)
            } else {
                format!("{}+{}i", c.real(), im)
            }
        }
        ComplexMode::Polar => {
            let re = c.real().to_f64();
            let im = c.imag().to_f64();
            let magnitude = re.hypot(im);
            let angle = im.atan2(re);
            format!("({magnitude}, <{angle})")
        }
    }
}

/// Fixed-width overflow check for `Int` arithmetic (§7 `Overflow`;
/// `original_source/checked_int.hpp`): when `fixed_bits` is set, a
/// result outside `[-2^(bits-1), 2^bits-1]` (signed) or `[0, 2^bits-1]`
/// (unsigned) is rejected rather than silently wrapped.
pub fn check_fixed_width(value: &Value, config: &Config) -> CalcResult<()> {
    let (Value::Number(NumericAtom::Int(i)), Some(bits)) = (value, config.fixed_bits) else {
        return Ok(());
    };
    let (min, max) = if config.is_signed {
        let half = Integer::from(1) << (bits - 1);
        (-half.clone(), half - 1)
    } else {
        (Integer::from(0), (Integer::from(1) << bits) - 1)
    };
    if i.cmp(&min) == Ordering::Less || i.cmp(&max) == Ordering::Greater {
        let signedness = if config.is_signed { "signed" } else { "unsigned" };
        return Err(CalcError::Overflow(format!(
            "{i} does not fit in a {bits}-bit {signedness} integer"
        )));
    }
    Ok(())
}

/// Persistent calculator mode, snapshotted before each command and
/// restored alongside the stack on undo.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: u32,
    pub fixed_bits: Option<u32>,
    pub is_signed: bool,
    pub precision: u32,
    pub angle_mode: AngleMode,
    pub mpq_mode: QuotientMode,
    pub mpc_mode: ComplexMode,
    pub interactive: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base: 10,
            fixed_bits: None,
            is_signed: true,
            precision: 50,
            angle_mode: AngleMode::Degrees,
            mpq_mode: QuotientMode::Quotient,
            mpc_mode: ComplexMode::Rect,
            interactive: false,
            debug: false,
        }
    }
}

impl Config {
    pub fn precision_bits(&self) -> u32 {
        crate::numeric::digits_to_bits(self.precision)
    }
}

/// Execution flags set as a side effect of arithmetic and comparison
/// operations, read by the control-flow machinery and by the `c?`-style
/// introspection functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
}

impl Flags {
    pub fn set_from_comparison(&mut self, ordering: std::cmp::Ordering) {
        self.zero = ordering == std::cmp::Ordering::Equal;
        self.sign = ordering == std::cmp::Ordering::Less;
        self.carry = false;
        self.overflow = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(n: i64) -> StackEntry {
        StackEntry::new(Value::Number(NumericAtom::Int(Integer::from(n))))
    }

    #[test]
    fn renders_integers_in_the_entrys_own_base() {
        let config = Config::default();
        let mut entry = int(255);
        entry.base = 16;
        assert_eq!(entry.render(&config), "0xff");
        entry.base = 2;
        assert_eq!(entry.render(&config), "0b11111111");
        entry.base = 10;
        assert_eq!(entry.render(&config), "255");
    }

    #[test]
    fn debug_tag_reflects_width_signedness_and_base() {
        let config = Config::default();
        let mut entry = int(7);
        entry.fixed_bits = Some(16);
        entry.is_signed = false;
        assert_eq!(entry.debug_tag(&config), "u16,p:50,dec,mpz");
    }

    #[test]
    fn check_fixed_width_rejects_out_of_range_signed_values() {
        let config = Config { fixed_bits: Some(8), is_signed: true, ..Config::default() };
        let ok = Value::Number(NumericAtom::Int(Integer::from(127)));
        assert!(check_fixed_width(&ok, &config).is_ok());
        let too_big = Value::Number(NumericAtom::Int(Integer::from(128)));
        assert!(matches!(check_fixed_width(&too_big, &config), Err(CalcError::Overflow(_))));
        let too_small = Value::Number(NumericAtom::Int(Integer::from(-129)));
        assert!(matches!(check_fixed_width(&too_small, &config), Err(CalcError::Overflow(_))));
    }

    #[test]
    fn check_fixed_width_rejects_negative_values_when_unsigned() {
        let config = Config { fixed_bits: Some(8), is_signed: false, ..Config::default() };
        let negative = Value::Number(NumericAtom::Int(Integer::from(-1)));
        assert!(matches!(check_fixed_width(&negative, &config), Err(CalcError::Overflow(_))));
        let max = Value::Number(NumericAtom::Int(Integer::from(255)));
        assert!(check_fixed_width(&max, &config).is_ok());
    }

    #[test]
    fn check_fixed_width_is_a_no_op_without_a_configured_width() {
        let config = Config::default();
        let huge = Value::Number(NumericAtom::Int(Integer::from(1) << 200));
        assert!(check_fixed_width(&huge, &config).is_ok());
    }
}
