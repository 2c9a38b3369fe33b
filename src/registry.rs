use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CalcError, CalcResult};
use crate::stack::{Config, Flags, StackEntry};

/// A single builtin: everything the driver needs to look it up, validate
/// a call against the stack, and invoke it.
pub struct CalcFn {
    pub name: &'static str,
    /// Number of stack arguments consumed; `-1` means variadic (the
    /// function inspects the stack itself, e.g. `drop_n`).
    pub num_args: i32,
    /// Number of stack results produced; informational only, used by
    /// `help` and by the symbolic-expression renderer to decide arity.
    pub num_resp: i32,
    pub help: &'static str,
    pub op: fn(&mut Vec<StackEntry>, &mut Config, &mut Flags) -> CalcResult<()>,
}

impl CalcFn {
    /// Runs the builtin with the "restore stack exactly on failure"
    /// contract: the op is handed the live stack directly, but the
    /// caller (see [`Registry::call`]) snapshots first and restores on
    /// `Err`.
    fn invoke(&self, stack: &mut Vec<StackEntry>, config: &mut Config, flags: &mut Flags) -> CalcResult<()> {
        // `num_args` >= 0 means "exactly n"; negative means "at least
        // |n|" (§4.2). Either way the pre-check is `stack.size() >=
        // |num_args()|` -- the op itself is responsible for popping the
        // right number of entries when it's variadic.
        let required = self.num_args.unsigned_abs() as usize;
        if stack.len() < required {
            return Err(CalcError::InsufficientArgs {
                name: self.name.to_string(),
                expected: self.num_args,
                found: stack.len(),
            });
        }
        (self.op)(stack, config, flags)
    }
}

/// A function triggered by matching the call token against a pattern
/// instead of an exact name, e.g. `2matrix`/`3matrix` reshaping the
/// whole stack into an `N`-column matrix. Mirrors the original's
/// `<regex>`-based lexer rules (`parser_parts.hpp`'s `regex_parser`):
/// patterns are tried in registration order, first match wins, and the
/// match's capture groups are handed to `reop` the same way a plain
/// `CalcFn::op` gets the stack.
pub struct RegexFn {
    pub pattern: &'static str,
    pub help: &'static str,
    pub reop: fn(&mut Vec<StackEntry>, &mut Config, &mut Flags, &regex::Captures) -> CalcResult<()>,
}

#[macro_export]
macro_rules! register_regex_calc_fn {
    ($ident:ident = RegexFn { $($field:tt)* }) => {
        pub static $ident: $crate::registry::RegexFn = $crate::registry::RegexFn { $($field)* };
    };
}

/// The table of all registered builtins, keyed by name. Populated at
/// process start by [`register_calc_fn!`] invocations scattered across
/// the `builtins` module; callers never construct one directly.
#[derive(Default)]
pub struct Registry {
    by_name: HashMap<&'static str, &'static CalcFn>,
    regex_variants: Vec<(Regex, &'static RegexFn)>,
}

impl Registry {
    fn new() -> Registry {
        Registry { by_name: HashMap::new(), regex_variants: Vec::new() }
    }

    fn insert(&mut self, f: &'static CalcFn) {
        self.by_name.insert(f.name, f);
    }

    /// Compiles and appends a regex variant. Called once at startup;
    /// a malformed pattern is an authoring bug in a builtin module, not
    /// a runtime condition, so this panics rather than threading a
    /// `Result` through registration.
    fn insert_regex(&mut self, f: &'static RegexFn) {
        let re = Regex::new(f.pattern).unwrap_or_else(|e| {
            panic!("builtin regex function {:?} has an invalid pattern: {e}", f.pattern)
        });
        self.regex_variants.push((re, f));
    }

    pub fn get(&self, name: &str) -> Option<&'static CalcFn> {
        self.by_name.get(name).copied()
    }

    pub fn all_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// All registered names sharing `prefix`, for tab completion.
    pub fn prefix_matches(&self, prefix: &str) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.by_name.keys().copied().filter(|n| n.starts_with(prefix)).collect();
        names.sort_unstable();
        names
    }

    /// Looks a function up and runs it, restoring the stack to its
    /// pre-call state if it returns an error. `config`/`flags` are left
    /// as the op mutated them even on failure, matching the fact that
    /// mode changes are not undo-scoped the way stack contents are.
    pub fn call(
        &self,
        name: &str,
        stack: &mut Vec<StackEntry>,
        config: &mut Config,
        flags: &mut Flags,
    ) -> CalcResult<()> {
        let snapshot = stack.clone();
        let result = match self.get(name) {
            Some(f) => f.invoke(stack, config, flags),
            None => match self.regex_variants.iter().find_map(|(re, f)| re.captures(name).map(|c| (f, c))) {
                Some((f, captures)) => (f.reop)(stack, config, flags, &captures),
                None => return Err(CalcError::UnknownFunction(name.to_string())),
            },
        };
        if result.is_err() {
            *stack = snapshot;
        }
        result
    }
}

pub static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::new()));

/// Declares a builtin and registers it into [`REGISTRY`] via an
/// `inventory`-free, `ctor`-free static initializer: the entry is a
/// `'static CalcFn`, and a module-level `#[allow(non_upper_case_globals)]`
/// const plus a registration thunk run from [`ensure_builtins_registered`]
/// wires it in.
///
/// ```ignore
/// register_calc_fn! {
///     ADD = CalcFn {
///         name: "+",
///         num_args: 2,
///         num_resp: 1,
///         help: "adds the top two stack entries",
///         op: crate::builtins::arithmetic::add,
///     }
/// }
/// ```
#[macro_export]
macro_rules! register_calc_fn {
    ($ident:ident = CalcFn { $($field:tt)* }) => {
        pub static $ident: $crate::registry::CalcFn = $crate::registry::CalcFn { $($field)* };
    };
}

/// Runs every builtin module's registration list. Idempotent; called
/// once by [`crate::calculator::Calculator::new`].
pub fn ensure_builtins_registered() {
    let mut registry = REGISTRY.lock().expect("registry mutex poisoned");
    if !registry.by_name.is_empty() {
        return;
    }
    for f in crate::builtins::all() {
        registry.insert(f);
    }
    for f in crate::builtins::all_regex() {
        registry.insert_regex(f);
    }
}

pub fn with_registry<T>(f: impl FnOnce(&Registry) -> T) -> T {
    ensure_builtins_registered();
    let registry = REGISTRY.lock().expect("registry mutex poisoned");
    f(&registry)
}
