use std::rc::Rc;

use crate::error::CalcResult;
use crate::stack::{Config, Flags, StackEntry};

/// One token of a parsed program: either a call by name (an operator or
/// word, looked up in the registry at execution time) or a literal value
/// to push.
#[derive(Clone, Debug)]
pub enum SimpleInstruction {
    Push(StackEntry),
    Call(String),
}

/// A resumable control-flow construct. Each variant tracks enough state
/// to be re-entered one instruction at a time, so the driver can run a
/// program interactively one step per REPL line.
#[derive(Clone, Debug)]
pub enum Instruction {
    Simple(SimpleInstruction),
    If(IfElifStatement),
    While(WhileStatement),
    For(ForStatement),
    /// A `break`/`continue` marker; interpreted by the innermost enclosing
    /// loop's [`Program::execute`] call.
    Break,
    Continue,
}

/// A condition/body pair used by both the `if`/`elif` chain and as the
/// shared building block other statements compose from.
#[derive(Clone, Debug)]
pub struct Branch {
    pub condition: Program,
    pub body: Program,
}

#[derive(Clone, Debug)]
pub struct IfElifStatement {
    pub branches: Vec<Branch>,
    pub else_body: Option<Program>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub condition: Program,
    pub body: Program,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub variable: String,
    pub iterable: Program,
    pub body: Program,
}

/// Outcome of running one control-flow statement to completion, telling
/// the enclosing [`Program::execute`] loop how to continue.
pub enum Flow {
    Continue,
    Break,
}

pub trait Statement {
    fn run(&self, runner: &mut dyn Runner) -> CalcResult<Flow>;
}

/// Everything a statement needs from the driver to run nested programs
/// and to read the truthiness of a condition, without depending on
/// `Calculator` directly (which would be a circular module dependency).
pub trait Runner {
    fn run_program(&mut self, program: &Program) -> CalcResult<()>;
    fn bind_variable(&mut self, name: &str, entry: StackEntry);
    fn iterate_values(&mut self, program: &Program) -> CalcResult<Vec<StackEntry>>;
    /// Splits the three pieces a builtin call touches out of one
    /// borrow, since separate `&mut self` accessor methods on a trait
    /// object can't be split the way direct field access can.
    fn parts(&mut self) -> (&mut Vec<StackEntry>, &mut Config, &mut Flags);
}

/// Runs `condition`, then reads `flags.zero` to decide whether it holds
/// (§4.4: "after the final condition item executes, read `flags.zero`").
/// Any stack growth the condition left behind (e.g. a comparison
/// operator's pushed boolean) is discarded either way — `cmp` itself
/// (`num_resp: 0`) leaves nothing to discard, so this also covers the
/// flags-only style of condition the registry's arity metadata calls
/// out explicitly.
fn condition_holds(condition: &Program, runner: &mut dyn Runner) -> CalcResult<bool> {
    let before = runner.parts().0.len();
    runner.run_program(condition)?;
    let (stack, _, flags) = runner.parts();
    stack.truncate(before);
    Ok(!flags.zero)
}

impl Statement for IfElifStatement {
    fn run(&self, runner: &mut dyn Runner) -> CalcResult<Flow> {
        for branch in &self.branches {
            if condition_holds(&branch.condition, runner)? {
                runner.run_program(&branch.body)?;
                return Ok(Flow::Continue);
            }
        }
        if let Some(else_body) = &self.else_body {
            runner.run_program(else_body)?;
        }
        Ok(Flow::Continue)
    }
}

impl Statement for WhileStatement {
    fn run(&self, runner: &mut dyn Runner) -> CalcResult<Flow> {
        loop {
            if !condition_holds(&self.condition, runner)? {
                return Ok(Flow::Continue);
            }
            match run_body_catching_breaks(&self.body, runner)? {
                Flow::Break => return Ok(Flow::Continue),
                Flow::Continue => continue,
            }
        }
    }
}

impl Statement for ForStatement {
    fn run(&self, runner: &mut dyn Runner) -> CalcResult<Flow> {
        let values = runner.iterate_values(&self.iterable)?;
        for value in values {
            runner.bind_variable(&self.variable, value);
            match run_body_catching_breaks(&self.body, runner)? {
                Flow::Break => break,
                Flow::Continue => continue,
            }
        }
        Ok(Flow::Continue)
    }
}

/// Runs `body`'s top-level instructions, stopping early (without
/// propagating further) on a `Break`/`Continue` marker at this nesting
/// level. `Continue` here means "stop this iteration", not "fall
/// through" — it maps to the loop's `continue`; `Break` maps to the
/// loop's `break`.
fn run_body_catching_breaks(body: &Program, runner: &mut dyn Runner) -> CalcResult<Flow> {
    for instruction in &body.instructions {
        match instruction {
            Instruction::Break => return Ok(Flow::Break),
            Instruction::Continue => return Ok(Flow::Continue),
            other => execute_one(other, runner)?,
        }
    }
    Ok(Flow::Continue)
}

fn execute_one(instruction: &Instruction, runner: &mut dyn Runner) -> CalcResult<()> {
    match instruction {
        Instruction::Simple(SimpleInstruction::Push(entry)) => {
            let (stack, _, _) = runner.parts();
            stack.push(entry.clone());
            Ok(())
        }
        Instruction::Simple(SimpleInstruction::Call(name)) => {
            let (stack, config, flags) = runner.parts();
            crate::registry::with_registry(|registry| registry.call(name, stack, config, flags))
        }
        Instruction::If(stmt) => stmt.run(runner).map(|_| ()),
        Instruction::While(stmt) => stmt.run(runner).map(|_| ()),
        Instruction::For(stmt) => stmt.run(runner).map(|_| ()),
        Instruction::Break | Instruction::Continue => Ok(()),
    }
}

/// A parsed, linear sequence of instructions. Immutable once parsed; a
/// [`Program`] value on the stack (a "quoted program", `$( ... )`) is
/// reference-counted so copying it around the stack is cheap.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// Whether this program was entered at the top level of the REPL
    /// (as opposed to being a quoted literal produced by the parser for
    /// later execution via `eval`/`for`/`if`).
    pub standalone: bool,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Program {
        Program { instructions, standalone: false }
    }

    pub fn standalone(instructions: Vec<Instruction>) -> Program {
        Program { instructions, standalone: true }
    }

    pub fn execute(&self, runner: &mut dyn Runner) -> CalcResult<()> {
        for instruction in &self.instructions {
            execute_one(instruction, runner)?;
        }
        Ok(())
    }
}

impl PartialEq for Program {
    fn eq(&self, _other: &Self) -> bool {
        // Programs compare by identity only (two quoted programs are
        // never "the same value" unless they're literally the same
        // parse); structural equality isn't a meaningful operation here.
        false
    }
}

pub type SharedProgram = Rc<Program>;
