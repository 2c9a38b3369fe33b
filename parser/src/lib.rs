//! Turns one line of REPL input into a [`smrtclcltr_core::program::Program`].
//!
//! The grammar (`grammar.pest`) only gives dedicated rules to the forms
//! that need them: control-flow keywords and the genuinely nested
//! literals (`quoted_program`, `quoted_symbolic`, `matrix_lit`,
//! `list_lit`). Everything else -- numbers, operators, function names --
//! is lexed as one maximal-munch `scalar_token` and classified here
//! afterward (see [`classify`]), mirroring the way the original
//! implementation's `single_number_parts` scans a token once and only
//! then decides what it is.

mod classify;
mod error;
mod symbolic_build;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use smrtclcltr_core::numeric::{CalcList, Matrix, NumericAtom};
use smrtclcltr_core::program::{
    Branch, ForStatement, IfElifStatement, Instruction, Program, SimpleInstruction, WhileStatement,
};
use smrtclcltr_core::stack::{StackEntry, Value};
use smrtclcltr_core::CalcError;

pub use classify::NumberContext;
pub use error::{Error, Result};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct SmrtclcltrParser;

/// Parses one input line into a standalone [`Program`], ready to hand to
/// [`smrtclcltr_core::Calculator::run_one`].
pub fn parse(input: &str, ctx: NumberContext) -> Result<Program> {
    let mut pairs = SmrtclcltrParser::parse(Rule::program, input)?;
    let program_pair = pairs.next().expect("the program rule always produces exactly one pair");
    let mut instructions = Vec::new();
    for pair in program_pair.into_inner() {
        if pair.as_rule() == Rule::instruction {
            instructions.push(build_instruction(pair, ctx)?);
        }
    }
    Ok(Program::standalone(instructions))
}

fn build_instruction(pair: Pair<Rule>, ctx: NumberContext) -> Result<Instruction> {
    let inner = pair.into_inner().next().expect("instruction always has one child");
    match inner.as_rule() {
        Rule::if_stmt => Ok(Instruction::If(build_if(inner, ctx)?)),
        Rule::while_stmt => Ok(Instruction::While(build_while(inner, ctx)?)),
        Rule::for_stmt => Ok(Instruction::For(build_for(inner, ctx)?)),
        Rule::kw_break => Ok(Instruction::Break),
        Rule::kw_continue => Ok(Instruction::Continue),
        Rule::simple_instruction => Ok(Instruction::Simple(build_simple(inner, ctx)?)),
        other => unreachable!("instruction child is one of its six alternatives, got {other:?}"),
    }
}

fn build_condition(pair: Pair<Rule>, ctx: NumberContext) -> Result<Program> {
    let mut instructions = Vec::new();
    for simple in pair.into_inner() {
        instructions.push(Instruction::Simple(build_simple(simple, ctx)?));
    }
    Ok(Program::new(instructions))
}

fn build_if(pair: Pair<Rule>, ctx: NumberContext) -> Result<IfElifStatement> {
    let mut inner = pair.into_inner().peekable();
    inner.next(); // kw_if
    let condition = build_condition(inner.next().expect("if_stmt always has a condition"), ctx)?;
    inner.next(); // kw_then
    let mut first_body = Vec::new();
    while inner.peek().map(Pair::as_rule) == Some(Rule::instruction) {
        first_body.push(build_instruction(inner.next().unwrap(), ctx)?);
    }
    let mut branches = vec![Branch { condition, body: Program::new(first_body) }];
    let mut else_body = None;
    for pair in inner {
        match pair.as_rule() {
            Rule::elif_clause => branches.push(build_elif(pair, ctx)?),
            Rule::else_clause => else_body = Some(build_else(pair, ctx)?),
            Rule::kw_endif => {}
            other => unreachable!("if_stmt tail is elif/else/endif, got {other:?}"),
        }
    }
    Ok(IfElifStatement { branches, else_body })
}

fn build_elif(pair: Pair<Rule>, ctx: NumberContext) -> Result<Branch> {
    let mut inner = pair.into_inner();
    inner.next(); // kw_elif
    let condition = build_condition(inner.next().expect("elif_clause always has a condition"), ctx)?;
    inner.next(); // kw_then
    let mut body = Vec::new();
    for instruction in inner {
        body.push(build_instruction(instruction, ctx)?);
    }
    Ok(Branch { condition, body: Program::new(body) })
}

fn build_else(pair: Pair<Rule>, ctx: NumberContext) -> Result<Program> {
    let mut inner = pair.into_inner();
    inner.next(); // kw_else
    let mut body = Vec::new();
    for instruction in inner {
        body.push(build_instruction(instruction, ctx)?);
    }
    Ok(Program::new(body))
}

fn build_while(pair: Pair<Rule>, ctx: NumberContext) -> Result<WhileStatement> {
    let mut inner = pair.into_inner();
    inner.next(); // kw_while
    let condition = build_condition(inner.next().expect("while_stmt always has a condition"), ctx)?;
    inner.next(); // kw_do
    let mut body = Vec::new();
    for pair in inner {
        if pair.as_rule() == Rule::instruction {
            body.push(build_instruction(pair, ctx)?);
        }
    }
    Ok(WhileStatement { condition, body: Program::new(body) })
}

fn build_for(pair: Pair<Rule>, ctx: NumberContext) -> Result<ForStatement> {
    let mut inner = pair.into_inner();
    inner.next(); // kw_for
    let variable = inner.next().expect("for_stmt always names a variable").as_str().to_string();
    inner.next(); // kw_in
    let iterable = build_condition(inner.next().expect("for_stmt always has an iterable"), ctx)?;
    inner.next(); // kw_do
    let mut body = Vec::new();
    for pair in inner {
        if pair.as_rule() == Rule::instruction {
            body.push(build_instruction(pair, ctx)?);
        }
    }
    Ok(ForStatement { variable, iterable, body: Program::new(body) })
}

fn build_simple(pair: Pair<Rule>, ctx: NumberContext) -> Result<SimpleInstruction> {
    let inner = pair.into_inner().next().expect("simple_instruction always has one child");
    match inner.as_rule() {
        Rule::scalar_token => build_scalar(inner, ctx),
        Rule::matrix_lit => Ok(SimpleInstruction::Push(build_matrix(inner, ctx)?)),
        Rule::list_lit => Ok(SimpleInstruction::Push(build_list(inner, ctx)?)),
        Rule::quoted_symbolic => Ok(SimpleInstruction::Push(build_quoted_symbolic(inner)?)),
        Rule::quoted_program => Ok(SimpleInstruction::Push(build_quoted_program(inner, ctx)?)),
        other => unreachable!("simple_instruction child is one of its four alternatives, got {other:?}"),
    }
}

fn build_scalar(pair: Pair<Rule>, ctx: NumberContext) -> Result<SimpleInstruction> {
    let token = pair.as_str();
    match classify::classify_number(token, &ctx)? {
        Some(atom) => {
            let mut entry = StackEntry::new(Value::Number(atom));
            entry.base = ctx.base;
            Ok(SimpleInstruction::Push(entry))
        }
        None => Ok(SimpleInstruction::Call(token.to_string())),
    }
}

fn required_number(pair: Pair<Rule>, ctx: &NumberContext) -> Result<NumericAtom> {
    let token = pair.as_str();
    classify::classify_number(token, ctx)?
        .ok_or_else(|| Error::Value(CalcError::Parse { message: format!("expected a number, found '{token}'") }))
}

fn build_matrix(pair: Pair<Rule>, ctx: NumberContext) -> Result<StackEntry> {
    let mut rows = Vec::new();
    for row in pair.into_inner() {
        let mut values = Vec::new();
        for token in row.into_inner() {
            values.push(required_number(token, &ctx)?);
        }
        rows.push(values);
    }
    let matrix = Matrix::from_rows(rows).map_err(Error::Value)?;
    Ok(StackEntry::new(Value::Matrix(matrix)))
}

fn build_list(pair: Pair<Rule>, ctx: NumberContext) -> Result<StackEntry> {
    let mut items = Vec::new();
    for token in pair.into_inner() {
        items.push(required_number(token, &ctx)?);
    }
    Ok(StackEntry::new(Value::List(CalcList::new(items))))
}

fn build_quoted_symbolic(pair: Pair<Rule>) -> Result<StackEntry> {
    let symbolic_equation = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::symbolic_equation)
        .expect("quoted_symbolic always wraps a symbolic_equation");
    let sym_equation = symbolic_equation
        .into_inner()
        .find(|p| p.as_rule() == Rule::sym_equation)
        .expect("symbolic_equation always wraps a sym_equation");
    Ok(StackEntry::new(Value::Symbolic(symbolic_build::build(sym_equation))))
}

fn build_quoted_program(pair: Pair<Rule>, ctx: NumberContext) -> Result<StackEntry> {
    let mut instructions = Vec::new();
    for pair in pair.into_inner() {
        if pair.as_rule() == Rule::instruction {
            instructions.push(build_instruction(pair, ctx)?);
        }
    }
    Ok(StackEntry::new(Value::Program(Program::new(instructions))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> NumberContext {
        NumberContext { base: 10, precision_bits: 200 }
    }

    fn run(input: &str) -> Program {
        parse(input, ctx()).unwrap()
    }

    #[test]
    fn parses_a_flat_arithmetic_line() {
        let program = run("1 2 +");
        assert_eq!(program.instructions.len(), 3);
        assert!(matches!(
            program.instructions[2],
            Instruction::Simple(SimpleInstruction::Call(ref name)) if name == "+"
        ));
    }

    #[test]
    fn parses_a_matrix_reshape_call_as_a_word() {
        let program = run("1 2 3 4 2matrix");
        assert!(matches!(
            program.instructions[4],
            Instruction::Simple(SimpleInstruction::Call(ref name)) if name == "2matrix"
        ));
    }

    #[test]
    fn parses_bracketed_matrix_literals() {
        let program = run("[[1 2][3 4]]");
        match &program.instructions[0] {
            Instruction::Simple(SimpleInstruction::Push(entry)) => match &entry.value {
                Value::Matrix(m) => assert_eq!((m.rows, m.cols), (2, 2)),
                other => panic!("expected a matrix, found {other:?}"),
            },
            other => panic!("expected a push, found {other:?}"),
        }
    }

    #[test]
    fn parses_brace_list_literals() {
        let program = run("{1 2 3}");
        match &program.instructions[0] {
            Instruction::Simple(SimpleInstruction::Push(entry)) => match &entry.value {
                Value::List(l) => assert_eq!(l.len(), 3),
                other => panic!("expected a list, found {other:?}"),
            },
            other => panic!("expected a push, found {other:?}"),
        }
    }

    #[test]
    fn parses_if_then_else_endif() {
        let program = run("if 1 2 > then 10 else 20 endif");
        assert_eq!(program.instructions.len(), 1);
        assert!(matches!(program.instructions[0], Instruction::If(_)));
    }

    #[test]
    fn parses_while_loops() {
        let program = run("while 1 do break done");
        assert!(matches!(program.instructions[0], Instruction::While(_)));
    }

    #[test]
    fn parses_for_loops_over_a_list() {
        let program = run("for i in {1 2 3} do i i * done");
        match &program.instructions[0] {
            Instruction::For(stmt) => assert_eq!(stmt.variable, "i"),
            other => panic!("expected a for loop, found {other:?}"),
        }
    }

    #[test]
    fn parses_quoted_programs() {
        let program = run("$( 1 2 + )");
        match &program.instructions[0] {
            Instruction::Simple(SimpleInstruction::Push(entry)) => {
                assert!(matches!(entry.value, Value::Program(_)));
            }
            other => panic!("expected a push, found {other:?}"),
        }
    }

    #[test]
    fn parses_quoted_symbolic_expressions() {
        let program = run("'2 * x + 1'");
        match &program.instructions[0] {
            Instruction::Simple(SimpleInstruction::Push(entry)) => match &entry.value {
                Value::Symbolic(s) => assert_eq!(s.to_string(), "2 * x + 1"),
                other => panic!("expected a symbolic value, found {other:?}"),
            },
            other => panic!("expected a push, found {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("if 1 then", ctx()).is_err());
    }
}

/// Tests driving individual grammar rules through pest directly, the way
/// `vasm`'s own `src/test/pest.rs` checks its grammar rule-by-rule rather
/// than only through the assembled high-level output. These exist
/// because a bug in one rule (`symbolic_equation` carrying its own
/// `SOI`/`EOI` anchors despite never being the parse's entry point) was
/// only caught by building the whole crate and noticing quoted symbolic
/// literals never parsed -- a rule-level test against `Rule::
/// symbolic_equation`/`Rule::quoted_symbolic` would have caught it the
/// moment the grammar changed.
#[cfg(test)]
mod grammar_tests {
    use ::pest::Parser;
    use pretty_assertions::assert_eq;

    use super::{Rule, SmrtclcltrParser};

    #[test]
    fn kw_if_matches_the_keyword_token() {
        ::pest::parses_to! {
            parser: SmrtclcltrParser,
            input: "if",
            rule: Rule::kw_if,
            tokens: [kw_if(0, 2)]
        };
    }

    #[test]
    fn sym_number_matches_a_signed_decimal_literal() {
        ::pest::parses_to! {
            parser: SmrtclcltrParser,
            input: "-3.5",
            rule: Rule::sym_number,
            tokens: [sym_number(0, 4)]
        };
    }

    #[test]
    fn sym_variable_matches_one_or_more_lowercase_letters() {
        ::pest::parses_to! {
            parser: SmrtclcltrParser,
            input: "theta",
            rule: Rule::sym_variable,
            tokens: [sym_variable(0, 5)]
        };
    }

    #[test]
    fn scalar_token_does_not_swallow_a_closing_bracket() {
        // Regression test for the maximal-munch character class that used
        // to absorb `]`/`}`/the next literal's opener when they weren't
        // whitespace-separated (see `matrix_lit` round-trip notes).
        ::pest::parses_to! {
            parser: SmrtclcltrParser,
            input: "2",
            rule: Rule::scalar_token,
            tokens: [scalar_token(0, 1)]
        };
    }

    #[test]
    fn symbolic_equation_is_not_anchored_to_start_of_input() {
        // `symbolic_equation` is only ever reached as a sub-rule of
        // `quoted_symbolic`, already mid-way through the enclosing
        // `program`'s input -- it must not require `SOI` to match there.
        let mut pairs = SmrtclcltrParser::parse(Rule::symbolic_equation, "x + 1").unwrap();
        let pair = pairs.next().unwrap();
        assert_eq!(pair.as_rule(), Rule::symbolic_equation);
        assert_eq!(pair.as_span().as_str(), "x + 1");
    }

    #[test]
    fn quoted_symbolic_parses_the_full_quoted_body() {
        let mut pairs = SmrtclcltrParser::parse(Rule::quoted_symbolic, "'2 * x + 1'").unwrap();
        let pair = pairs.next().unwrap();
        assert_eq!(pair.as_rule(), Rule::quoted_symbolic);
        assert_eq!(pair.as_span().as_str(), "'2 * x + 1'");
    }

    #[test]
    fn quoted_symbolic_rejects_an_unterminated_body() {
        assert!(SmrtclcltrParser::parse(Rule::quoted_symbolic, "'2 * x + 1").is_err());
    }

    #[test]
    fn program_requires_the_whole_input_to_be_consumed() {
        assert!(SmrtclcltrParser::parse(Rule::program, "1 2 + ]").is_err());
    }
}
