use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::error::{CalcError, CalcResult};
use crate::program::{Program, Runner};
use crate::registry::ensure_builtins_registered;
use crate::stack::{ComplexMode, Config, Flags, QuotientMode, StackEntry, Value};

/// How many stack snapshots `undo` can roll back through.
const UNDO_DEPTH: usize = 16;

/// The driver: owns the data stack, persistent mode, execution flags, and
/// the rolling snapshot history `undo` walks back through.
///
/// `saved_stacks.front()` is always the stack exactly as it was before
/// the line currently being processed; one `undo` restores it and pops
/// the snapshot, so repeated `undo` walks further back in history.
pub struct Calculator {
    stack: Vec<StackEntry>,
    saved_stacks: VecDeque<Vec<StackEntry>>,
    variables: HashMap<String, StackEntry>,
    config: Config,
    flags: Flags,
    running: bool,
}

impl Calculator {
    pub fn new() -> Calculator {
        ensure_builtins_registered();
        Calculator {
            stack: Vec::new(),
            saved_stacks: VecDeque::new(),
            variables: HashMap::new(),
            config: Config::default(),
            flags: Flags::default(),
            running: true,
        }
    }

    pub fn stack(&self) -> &[StackEntry] {
        &self.stack
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Snapshots the stack, then runs one parsed top-level program,
    /// rolling the stack back to the snapshot on error.
    pub fn run_one(&mut self, program: &Program) -> CalcResult<()> {
        self.push_snapshot();
        match program.execute(self) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.stack = self.saved_stacks.front().cloned().unwrap_or_default();
                Err(e)
            }
        }
    }

    fn push_snapshot(&mut self) {
        self.saved_stacks.push_front(self.stack.clone());
        if self.saved_stacks.len() > UNDO_DEPTH {
            self.saved_stacks.pop_back();
        }
    }

    pub fn undo(&mut self) -> CalcResult<()> {
        match self.saved_stacks.pop_front() {
            Some(previous) => {
                self.stack = previous;
                Ok(())
            }
            None => Err(CalcError::NothingToUndo),
        }
    }

    /// Renders the stack newest-at-bottom, one entry per line (§4.5): the
    /// most recently pushed entry (the top of the logical stack) prints
    /// last. In interactive mode each line is prefixed with its stack
    /// level (`1` = top); in debug mode each line is suffixed with a
    /// bracketed base/precision/width/kind tag.
    pub fn show_stack(&self) -> String {
        let depth = self.stack.len();
        self.stack
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let mut line = String::new();
                if self.config.interactive {
                    line.push_str(&format!("{}: ", depth - i));
                }
                line.push_str(&entry.render(&self.config));
                if self.config.debug {
                    line.push_str(&format!(" [{}]", entry.debug_tag(&self.config)));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn auto_complete(&self, prefix: &str) -> Vec<&'static str> {
        crate::registry::with_registry(|registry| registry.prefix_matches(prefix))
    }

    pub fn base(&mut self, n: u32) {
        self.config.base = n;
    }

    pub fn precision(&mut self, digits: u32) {
        self.config.precision = digits.max(1);
    }

    pub fn signed_mode(&mut self, signed: bool) {
        self.config.is_signed = signed;
    }

    pub fn mpq_mode(&mut self, mode: QuotientMode) {
        self.config.mpq_mode = mode;
    }

    pub fn mpc_mode(&mut self, mode: ComplexMode) {
        self.config.mpc_mode = mode;
    }

    pub fn debug_mode(&mut self, on: bool) {
        self.config.debug = on;
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::new()
    }
}

impl Runner for Calculator {
    fn run_program(&mut self, program: &Program) -> CalcResult<()> {
        if self.config.debug {
            debug!("running nested program with {} instructions", program.instructions.len());
        }
        program.execute(self)
    }

    fn bind_variable(&mut self, name: &str, entry: StackEntry) {
        self.variables.insert(name.to_string(), entry);
    }

    fn iterate_values(&mut self, program: &Program) -> CalcResult<Vec<StackEntry>> {
        let before = self.stack.len();
        program.execute(self)?;
        Ok(self.stack.split_off(before))
    }

    fn parts(&mut self) -> (&mut Vec<StackEntry>, &mut Config, &mut Flags) {
        (&mut self.stack, &mut self.config, &mut self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::NumericAtom;
    use crate::program::{Branch, IfElifStatement, Instruction, SimpleInstruction};
    use pretty_assertions::assert_eq;
    use rug::Integer;

    fn push_int(n: i64) -> Instruction {
        Instruction::Simple(SimpleInstruction::Push(StackEntry::new(Value::Number(NumericAtom::Int(
            Integer::from(n),
        )))))
    }

    fn call(name: &str) -> Instruction {
        Instruction::Simple(SimpleInstruction::Call(name.to_string()))
    }

    #[test]
    fn adds_two_numbers() {
        let mut calc = Calculator::new();
        let program = Program::new(vec![push_int(2), push_int(3), call("+")]);
        calc.run_one(&program).unwrap();
        assert_eq!(calc.stack().len(), 1);
        assert_eq!(calc.stack()[0].value.to_string(), "5");
    }

    #[test]
    fn failed_operation_restores_the_stack() {
        let mut calc = Calculator::new();
        calc.run_one(&Program::new(vec![push_int(1)])).unwrap();
        let before = calc.stack().len();
        let result = calc.run_one(&Program::new(vec![call("+")]));
        assert!(result.is_err());
        assert_eq!(calc.stack().len(), before);
    }

    #[test]
    fn undo_restores_the_previous_stack() {
        let mut calc = Calculator::new();
        calc.run_one(&Program::new(vec![push_int(1)])).unwrap();
        calc.run_one(&Program::new(vec![push_int(2)])).unwrap();
        assert_eq!(calc.stack().len(), 2);
        calc.undo().unwrap();
        assert_eq!(calc.stack().len(), 1);
    }

    #[test]
    fn undo_with_nothing_to_undo_errors() {
        let mut calc = Calculator::new();
        assert_eq!(calc.undo(), Err(CalcError::NothingToUndo));
    }

    #[test]
    fn if_condition_is_driven_by_flags_zero_not_a_popped_stack_value() {
        // `cmp` has num_resp: 0 -- it sets flags.zero from the comparison
        // and pushes nothing. The condition must be decided from the
        // flag, not by popping whatever happens to be on the stack
        // underneath (here, an unrelated `42`).
        let mut calc = Calculator::new();
        let if_stmt = Instruction::If(IfElifStatement {
            branches: vec![Branch {
                condition: Program::new(vec![push_int(1), push_int(2), call("cmp")]),
                body: Program::new(vec![push_int(100)]),
            }],
            else_body: Some(Program::new(vec![push_int(200)])),
        });
        let program = Program::new(vec![push_int(42), if_stmt]);
        calc.run_one(&program).unwrap();
        let rendered: Vec<String> = calc.stack().iter().map(|e| e.value.to_string()).collect();
        assert_eq!(rendered, vec!["42", "100"]);
    }

    #[test]
    fn show_stack_prints_newest_entry_last() {
        let mut calc = Calculator::new();
        calc.run_one(&Program::new(vec![push_int(1), push_int(2), push_int(3)])).unwrap();
        assert_eq!(calc.show_stack(), "1\n2\n3");
    }

    #[test]
    fn show_stack_prefixes_levels_in_interactive_mode() {
        let mut calc = Calculator::new();
        calc.config.interactive = true;
        calc.run_one(&Program::new(vec![push_int(1), push_int(2)])).unwrap();
        assert_eq!(calc.show_stack(), "2: 1\n1: 2");
    }

    #[test]
    fn show_stack_appends_debug_tags() {
        let mut calc = Calculator::new();
        calc.config.debug = true;
        calc.run_one(&Program::new(vec![push_int(5)])).unwrap();
        assert_eq!(calc.show_stack(), "5 [big,p:50,dec,mpz]");
    }
}
