use crate::builtins::pop1;
use crate::error::CalcResult;
use crate::register_calc_fn;
use crate::registry::CalcFn;
use crate::stack::{Config, Flags, StackEntry};

fn drop_top(stack: &mut Vec<StackEntry>, _config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    pop1(stack)?;
    Ok(())
}

fn dup(stack: &mut Vec<StackEntry>, _config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let top = stack.last().cloned().ok_or_else(|| crate::error::CalcError::InsufficientArgs {
        name: "dup".to_string(),
        expected: 1,
        found: 0,
    })?;
    stack.push(top);
    Ok(())
}

fn swap(stack: &mut Vec<StackEntry>, _config: &mut Config, _flags: &mut Flags) -> CalcResult<()> {
    let len = stack.len();
    if len < 2 {
        return Err(crate::error::CalcError::InsufficientArgs {
            name: "swap".to_string(),
            expected: 2,
            found: len,
        });
    }
    stack.swap(len - 1, len - 2);
    Ok(())
}

register_calc_fn! { DROP = CalcFn { name: "drop", num_args: 1, num_resp: 0, help: "removes the top stack entry", op: drop_top } }
register_calc_fn! { DUP = CalcFn { name: "dup", num_args: 1, num_resp: 2, help: "duplicates the top stack entry", op: dup } }
register_calc_fn! { SWAP = CalcFn { name: "swap", num_args: 2, num_resp: 2, help: "swaps the top two stack entries", op: swap } }

pub fn list() -> Vec<&'static CalcFn> {
    vec![&DROP, &DUP, &SWAP]
}
