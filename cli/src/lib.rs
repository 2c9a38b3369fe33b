//! The REPL driver: feeds lines of input through
//! [`smrtclcltr_parser::parse`] and [`smrtclcltr_core::Calculator`], and
//! renders the resulting stack or error. Kept independent of `rustyline`
//! so the line-by-line behavior (§4.5 of the driver design) can be
//! exercised without a real terminal; `main` wires this up to an actual
//! line editor.

use log::debug;

use smrtclcltr_core::Calculator;
use smrtclcltr_parser::NumberContext;

/// Meta-commands the driver intercepts before handing a line to the
/// parser, since they act on the calculator's snapshot history and
/// running state rather than the stack itself.
enum MetaCommand {
    Undo,
    Quit,
    Help,
}

fn meta_command(line: &str) -> Option<MetaCommand> {
    match line.trim() {
        "undo" => Some(MetaCommand::Undo),
        "quit" | "exit" => Some(MetaCommand::Quit),
        "help" | "?" => Some(MetaCommand::Help),
        _ => None,
    }
}

/// One calculator session plus whatever rendering a REPL turn produces.
pub struct Session {
    calc: Calculator,
}

/// What a `Session::eval_line` call has to say back to the driver loop:
/// text to print to the out/err sink (per §6.1's `out`/`err` split) and
/// whether the session is still running afterward.
pub struct Turn {
    pub out: Option<String>,
    pub err: Option<String>,
}

impl Session {
    pub fn new() -> Session {
        Session { calc: Calculator::new() }
    }

    pub fn is_running(&self) -> bool {
        self.calc.is_running()
    }

    fn number_context(&self) -> NumberContext {
        NumberContext { base: self.calc.config().base, precision_bits: self.calc.config().precision_bits() }
    }

    /// All registered builtin/regex names sharing `prefix`; wired up to a
    /// line editor's tab-completion hook (§6.1: `auto_complete`).
    pub fn complete(&self, prefix: &str) -> Vec<&'static str> {
        self.calc.auto_complete(prefix)
    }

    /// Runs one line of input to completion, returning what should be
    /// shown to the user. A blank line just redisplays the stack.
    pub fn eval_line(&mut self, line: &str) -> Turn {
        if let Some(cmd) = meta_command(line) {
            return self.run_meta(cmd);
        }
        if line.trim().is_empty() {
            return Turn { out: Some(self.calc.show_stack()), err: None };
        }
        let ctx = self.number_context();
        match smrtclcltr_parser::parse(line, ctx) {
            Ok(program) => {
                debug!("parsed {} top-level instruction(s)", program.instructions.len());
                match self.calc.run_one(&program) {
                    Ok(()) => Turn { out: Some(self.calc.show_stack()), err: None },
                    Err(e) => Turn { out: None, err: Some(e.to_string()) },
                }
            }
            Err(e) => Turn { out: None, err: Some(e.to_string()) },
        }
    }

    fn run_meta(&mut self, cmd: MetaCommand) -> Turn {
        match cmd {
            MetaCommand::Undo => match self.calc.undo() {
                Ok(()) => Turn { out: Some(self.calc.show_stack()), err: None },
                Err(e) => Turn { out: None, err: Some(e.to_string()) },
            },
            MetaCommand::Quit => {
                self.calc.stop();
                Turn { out: None, err: None }
            }
            MetaCommand::Help => Turn { out: Some(help_text()), err: None },
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

fn help_text() -> String {
    "smrtclcltr: an RPN calculator. Enter values and operators separated by \
     spaces; `undo` rolls back the last line, `quit`/`exit` ends the session."
        .to_string()
}

#[cfg(test)]
mod test;
