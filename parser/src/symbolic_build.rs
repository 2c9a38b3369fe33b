//! Builds a [`smrtclcltr_symbolic::Symbolic`] tree out of the `sym_*`
//! pairs captured by [`crate::Rule::symbolic_equation`].
//!
//! Walks the same left-associative, precedence-climbing shape the
//! grammar already encodes structurally (`sym_equation` > `sym_addsub` >
//! `sym_multdiv` > `sym_negation` > `sym_expon` > `sym_factorial` >
//! `sym_atomic`), using `Symbolic`'s own operator overloads so this module
//! never has to know how a node renders.

use pest::iterators::Pair;

use smrtclcltr_symbolic::Symbolic;

use crate::Rule;

pub fn build(pair: Pair<Rule>) -> Symbolic {
    debug_assert_eq!(pair.as_rule(), Rule::sym_equation);
    build_equation(pair)
}

fn build_equation(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let lhs = build_addsub(parts.next().expect("sym_equation always has a left side"));
    match parts.next() {
        Some(_eq_op) => {
            let rhs = build_addsub(parts.next().expect("eq_op is followed by a right side"));
            lhs.equals(rhs)
        }
        None => lhs,
    }
}

fn build_addsub(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let mut acc = build_multdiv(parts.next().expect("sym_addsub always has a left side"));
    let mut rest = parts;
    while let Some(op) = rest.next() {
        let rhs = build_multdiv(rest.next().expect("add_op is followed by an operand"));
        acc = match op.as_str() {
            "+" => acc + rhs,
            "-" => acc - rhs,
            other => unreachable!("add_op only ever matches '+' or '-', got {other:?}"),
        };
    }
    acc
}

fn build_multdiv(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let mut acc = build_negation(parts.next().expect("sym_multdiv always has a left side"));
    let mut rest = parts;
    while let Some(op) = rest.next() {
        let rhs = build_negation(rest.next().expect("mul_op is followed by an operand"));
        acc = match op.as_str() {
            "*" => acc * rhs,
            "/" => acc / rhs,
            "%" => acc % rhs,
            other => unreachable!("mul_op only ever matches '*', '/' or '%', got {other:?}"),
        };
    }
    acc
}

fn build_negation(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let first = parts.next().expect("sym_negation always has at least one child");
    match first.as_rule() {
        Rule::neg_op => -build_expon(parts.next().expect("neg_op is followed by an operand")),
        Rule::sym_expon => build_expon(first),
        other => unreachable!("sym_negation child is neg_op or sym_expon, got {other:?}"),
    }
}

fn build_expon(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let base = build_factorial(parts.next().expect("sym_expon always has a left side"));
    match parts.next() {
        Some(_pow_op) => {
            let exponent = build_factorial(parts.next().expect("pow_op is followed by an operand"));
            base.pow(exponent)
        }
        None => base,
    }
}

fn build_factorial(pair: Pair<Rule>) -> Symbolic {
    let mut parts = pair.into_inner();
    let atom = build_atomic(parts.next().expect("sym_factorial always has an operand"));
    match parts.next() {
        Some(_fact_op) => atom.factorial(),
        None => atom,
    }
}

fn build_atomic(pair: Pair<Rule>) -> Symbolic {
    let inner = pair.into_inner().next().expect("sym_atomic always has one child");
    match inner.as_rule() {
        Rule::sym_number => {
            let value: f64 = inner.as_str().parse().expect("sym_number only matches valid float syntax");
            Symbolic::number_f64(value)
        }
        Rule::sym_variable => Symbolic::variable(inner.as_str()),
        Rule::sym_paren => build_equation(
            inner
                .into_inner()
                .next()
                .expect("sym_paren always wraps a sym_equation"),
        ),
        Rule::sym_fn_call => {
            let mut call = inner.into_inner();
            let name = call.next().expect("sym_fn_call always starts with sym_fn_name");
            let arg = build_equation(call.next().expect("sym_fn_call always has an argument"));
            Symbolic::apply(name.as_str(), arg)
        }
        other => unreachable!("sym_atomic child is one of its four alternatives, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SmrtclcltrParser;
    use pest::Parser;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Symbolic {
        let mut pairs = SmrtclcltrParser::parse(Rule::symbolic_equation, input).unwrap();
        let equation = pairs.next().unwrap().into_inner().next().unwrap();
        build(equation)
    }

    #[test]
    fn builds_precedence_respecting_tree() {
        assert_eq!(parse("2 * x + 1").to_string(), "2 * x + 1");
        assert_eq!(parse("2 * (x + 1)").to_string(), "2 * (x + 1)");
    }

    #[test]
    fn builds_function_calls_and_factorial() {
        assert_eq!(parse("sin(x)").to_string(), "sin(x)");
        assert_eq!(parse("x!").to_string(), "x!");
    }

    #[test]
    fn builds_equation_and_negation() {
        assert_eq!(parse("x = -1").to_string(), "x = -1");
    }
}
