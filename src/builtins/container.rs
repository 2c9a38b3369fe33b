use crate::builtins::pop1;
use crate::error::{CalcError, CalcResult};
use crate::numeric::{CalcList, Matrix, NumericAtom};
use crate::register_calc_fn;
use crate::register_regex_calc_fn;
use crate::registry::{CalcFn, RegexFn};
use crate::stack::{Config, Flags, StackEntry, Value};

/// `n tolist` pops the count `n` off the top, then the `n` entries below
/// it (bottom-to-top order preserved), and pushes them as one list.
fn tolist(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let count_entry = pop1(stack)?;
    let count = match count_entry.value {
        Value::Number(NumericAtom::Int(i)) => i
            .to_usize()
            .ok_or_else(|| CalcError::InvalidArgument("tolist count out of range".into()))?,
        _ => return Err(CalcError::InvalidArgument("tolist requires an integer count".into())),
    };
    if stack.len() < count {
        return Err(CalcError::InsufficientArgs { name: "tolist".to_string(), expected: count as i32, found: stack.len() });
    }
    let drained: Vec<StackEntry> = stack.split_off(stack.len() - count);
    let items = drained
        .into_iter()
        .map(|e| match e.value {
            Value::Number(n) => Ok(n),
            other => Err(CalcError::InvalidArgument(format!("tolist requires numbers, found {other}"))),
        })
        .collect::<CalcResult<Vec<_>>>()?;
    stack.push(StackEntry::with_config(Value::List(CalcList::new(items)), config));
    Ok(())
}

/// `fromlist` explodes the top-of-stack list back onto the stack,
/// bottom-to-top, followed by its length.
fn fromlist(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let entry = pop1(stack)?;
    let list = match entry.value {
        Value::List(l) => l,
        other => return Err(CalcError::InvalidArgument(format!("fromlist requires a list, found {other}"))),
    };
    let len = list.len();
    for item in list.items {
        stack.push(StackEntry::with_config(Value::Number(item), config));
    }
    stack.push(StackEntry::with_config(NumericAtom::Int(rug::Integer::from(len)), config));
    Ok(())
}

/// Converts the top-of-stack entry to a `Flt`, widening `Int`/`Rat` and
/// leaving `Flt`/`Cmp` as-is.
fn to_float(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let entry = pop1(stack)?;
    let value = match entry.value {
        Value::Number(n) => Value::Number(n.widen_to(2, config.precision_bits())),
        other => return Err(CalcError::InvalidArgument(format!("f requires a number, found {other}"))),
    };
    stack.push(StackEntry::with_config(value, config).with_unit(entry.unit));
    Ok(())
}

/// Retags the current top-of-stack entry's display base without
/// altering its numeric value, distinct from `base` which changes the
/// mode persistently for future entries.
fn cbase(stack: &mut Vec<StackEntry>, config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let mut entry = pop1(stack)?;
    entry.base = config.base;
    stack.push(entry);
    Ok(())
}

/// `Nmatrix` (e.g. `2matrix`, `3matrix`) pops the *entire* stack and
/// reshapes it row-major into an `N`-column matrix, matching the
/// regex-triggered lexer rule the original parser uses for this literal
/// form (`1 2 3 4 2matrix` -> `[[1 2][3 4]]`).
fn reshape_matrix(
    stack: &mut Vec<StackEntry>,
    config: &mut Config,
    _flags: &mut Flags,
    captures: &regex::Captures,
) -> CalcResult<()> {
    let cols: usize = captures[1]
        .parse()
        .map_err(|_| CalcError::InvalidArgument("matrix column count out of range".into()))?;
    if cols == 0 {
        return Err(CalcError::InvalidArgument("matrix column count must be at least 1".into()));
    }
    if stack.is_empty() || stack.len() % cols != 0 {
        return Err(CalcError::Domain(format!(
            "{} stack entries do not divide evenly into {cols} columns",
            stack.len()
        )));
    }
    let rows = stack.len() / cols;
    let items = stack
        .drain(..)
        .map(|e| match e.value {
            Value::Number(n) => Ok(n),
            other => Err(CalcError::InvalidArgument(format!("matrix requires numbers, found {other}"))),
        })
        .collect::<CalcResult<Vec<_>>>()?;
    let row_chunks = items.chunks(cols).map(|c| c.to_vec()).collect();
    let matrix = Matrix::from_rows(row_chunks).map_err(|_| {
        CalcError::Domain(format!("{rows} x {cols} reshape failed"))
    })?;
    stack.push(StackEntry::with_config(Value::Matrix(matrix), config));
    Ok(())
}

register_regex_calc_fn! {
    RESHAPE_MATRIX = RegexFn {
        pattern: r"^(\d+)matrix$",
        help: "reshapes the entire stack into an N-column matrix",
        reop: reshape_matrix,
    }
}

pub fn regex_list() -> Vec<&'static RegexFn> {
    vec![&RESHAPE_MATRIX]
}

register_calc_fn! { TOLIST = CalcFn { name: "tolist", num_args: 1, num_resp: 1, help: "packs the top n stack entries into a list", op: tolist } }
register_calc_fn! { FROMLIST = CalcFn { name: "fromlist", num_args: 1, num_resp: -1, help: "unpacks a list back onto the stack followed by its length", op: fromlist } }
register_calc_fn! { TO_FLOAT = CalcFn { name: "f", num_args: 1, num_resp: 1, help: "converts the top stack entry to a floating-point value", op: to_float } }
register_calc_fn! { CBASE = CalcFn { name: "cbase", num_args: 1, num_resp: 1, help: "retags the top stack entry with the current display base", op: cbase } }

pub fn list() -> Vec<&'static CalcFn> {
    vec![&TOLIST, &FROMLIST, &TO_FLOAT, &CBASE]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::with_registry;
    use pretty_assertions::assert_eq;
    use rug::Integer;

    fn int_entry(n: i64) -> StackEntry {
        StackEntry::new(Value::Number(NumericAtom::Int(Integer::from(n))))
    }

    #[test]
    fn n_matrix_reshapes_the_stack_row_major() {
        let mut stack = vec![int_entry(1), int_entry(2), int_entry(3), int_entry(4)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        with_registry(|r| r.call("2matrix", &mut stack, &mut config, &mut flags)).unwrap();
        assert_eq!(stack.len(), 1);
        match &stack[0].value {
            Value::Matrix(m) => {
                assert_eq!((m.rows, m.cols), (2, 2));
                assert_eq!(m.values.iter().map(|v| v.to_string()).collect::<Vec<_>>(), vec!["1", "2", "3", "4"]);
            }
            other => panic!("expected a matrix, found {other:?}"),
        }
        assert_eq!(stack[0].value.to_string(), "[[1 2][3 4]]");
    }

    #[test]
    fn n_matrix_rejects_a_count_that_does_not_divide_the_stack() {
        let mut stack = vec![int_entry(1), int_entry(2), int_entry(3)];
        let mut config = Config::default();
        let mut flags = Flags::default();
        let err = with_registry(|r| r.call("2matrix", &mut stack, &mut config, &mut flags)).unwrap_err();
        assert!(matches!(err, CalcError::Domain(_)));
        assert_eq!(stack.len(), 3, "a failed call must leave the stack untouched");
    }
}
