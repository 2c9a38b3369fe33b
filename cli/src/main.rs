use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser as ClapParser;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use smrtclcltr::Session;

const HISTORY_FILE: &str = ".smrtclcltr_history";

/// An interactive RPN calculator.
#[derive(ClapParser, Debug)]
#[command(name = "smrtclcltr", about = "An interactive RPN calculator")]
struct Cli {
    /// Verbosity level, 0 (emergency) through 9 (trace).
    #[arg(short = 'v', long = "verbosity", default_value_t = 0)]
    verbosity: u8,

    /// Tokens making up one forced input line; when present the session
    /// runs non-interactively (stdin is treated as closed) and exits
    /// after processing them.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

/// Bridges rustyline's tab-completion hook to [`Session::complete`].
struct CalcHelper {
    session: Rc<RefCell<Session>>,
}

impl Helper for CalcHelper {}
impl Validator for CalcHelper {}

impl Hinter for CalcHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for CalcHelper {}

impl Completer for CalcHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let prefix = &line[start..pos];
        let candidates = self
            .session
            .borrow()
            .complete(prefix)
            .into_iter()
            .map(|name| Pair { display: name.to_string(), replacement: name.to_string() })
            .collect();
        Ok((start, candidates))
    }
}

fn verbosity_filter(level: u8) -> log::LevelFilter {
    match level {
        0..=2 => log::LevelFilter::Error,
        3..=4 => log::LevelFilter::Warn,
        5..=6 => log::LevelFilter::Info,
        7..=8 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn run_one_line(session: &Rc<RefCell<Session>>, line: &str) {
    let turn = session.borrow_mut().eval_line(line);
    if let Some(out) = turn.out {
        println!("{out}");
    }
    if let Some(err) = turn.err {
        eprintln!("{err}");
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new().filter_level(verbosity_filter(cli.verbosity)).init();

    let session = Rc::new(RefCell::new(Session::new()));

    if !cli.tokens.is_empty() {
        run_one_line(&session, &cli.tokens.join(" "));
        return;
    }

    let mut editor: Editor<CalcHelper, rustyline::history::DefaultHistory> =
        Editor::new().expect("line editor failed to initialize");
    editor.set_helper(Some(CalcHelper { session: Rc::clone(&session) }));
    let _ = editor.load_history(HISTORY_FILE);

    while session.borrow().is_running() {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                run_one_line(&session, &line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }

    let _ = editor.save_history(HISTORY_FILE);
}
