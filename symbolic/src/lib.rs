//! Shared-owned symbolic-expression tree.
//!
//! A [`Symbolic`] is a cheap-to-clone handle (`Rc<SymbolicNode>`) onto an
//! immutable node. Copying a symbolic operand into another expression
//! duplicates the handle, never the node it points at — the overall
//! structure is a DAG in memory but a tree semantically, since builders
//! here never introduce a cycle.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rug::ops::Pow as _;
use rug::{Float, Integer};

const LEAF_PRECISION: u32 = 113;

/// How a node renders: `None`/`Paren` cover atoms and function calls,
/// `Prefix`/`Infix`/`Postfix` cover the three operator shapes the
/// expression grammar produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    None,
    Paren,
    Prefix,
    Infix,
    Postfix,
}

#[derive(Clone, Debug)]
pub enum Operand {
    Variable(String),
    Number(Float),
    Expr(Symbolic),
}

impl Operand {
    fn priority(&self) -> u8 {
        match self {
            Operand::Variable(_) | Operand::Number(_) => ATOM_PRIO,
            Operand::Expr(s) => s.priority(),
        }
    }
}

/// One node: `op = None` marks a leaf (a variable or a number, carried in
/// `left`); `op = Some(name)` marks an operator or function application,
/// with `left`/`right` holding its operand(s) (`right` is unused by
/// prefix/postfix/paren nodes).
#[derive(Clone, Debug)]
pub struct SymbolicNode {
    pub op: Option<String>,
    pub style: Style,
    pub left: Option<Operand>,
    pub right: Option<Operand>,
}

/// The shared handle callers actually build trees with.
#[derive(Clone, Debug)]
pub struct Symbolic(Rc<SymbolicNode>);

const EQUATION_PRIO: u8 = 0;
const ADDSUB_PRIO: u8 = 1;
const MULTDIV_PRIO: u8 = 2;
const UNARY_NEG_PRIO: u8 = 3;
const EXPON_PRIO: u8 = 4;
const FACTORIAL_PRIO: u8 = 5;
const ATOM_PRIO: u8 = 6;

fn fn_prio(op: &str, style: Style) -> u8 {
    match (op, style) {
        ("=", _) => EQUATION_PRIO,
        ("+", Style::Infix) | ("-", Style::Infix) => ADDSUB_PRIO,
        ("*", _) | ("/", _) | ("%", _) => MULTDIV_PRIO,
        ("-", Style::Prefix) => UNARY_NEG_PRIO,
        ("^", _) => EXPON_PRIO,
        ("!", Style::Postfix) => FACTORIAL_PRIO,
        (_, Style::Paren) => ATOM_PRIO,
        _ => ATOM_PRIO,
    }
}

impl Symbolic {
    fn node(self_: SymbolicNode) -> Symbolic {
        Symbolic(Rc::new(self_))
    }

    pub fn variable(name: impl Into<String>) -> Symbolic {
        Symbolic::node(SymbolicNode {
            op: None,
            style: Style::None,
            left: Some(Operand::Variable(name.into())),
            right: None,
        })
    }

    pub fn number(value: Float) -> Symbolic {
        Symbolic::node(SymbolicNode { op: None, style: Style::None, left: Some(Operand::Number(value)), right: None })
    }

    pub fn number_f64(value: f64) -> Symbolic {
        Symbolic::number(Float::with_val(LEAF_PRECISION, value))
    }

    /// Wraps `expr` as an operand without duplicating the underlying
    /// node — only the `Rc` is cloned.
    pub fn from_expr(expr: &Symbolic) -> Symbolic {
        expr.clone()
    }

    fn priority(&self) -> u8 {
        match &self.0.op {
            None => ATOM_PRIO,
            Some(op) => fn_prio(op, self.0.style),
        }
    }

    pub fn is_atom(&self) -> bool {
        self.0.op.is_none()
    }

    pub fn root_op(&self) -> Option<&str> {
        self.0.op.as_deref()
    }

    fn binary(op: &str, lhs: Symbolic, rhs: Symbolic) -> Symbolic {
        Symbolic::node(SymbolicNode {
            op: Some(op.to_string()),
            style: Style::Infix,
            left: Some(Operand::Expr(lhs)),
            right: Some(Operand::Expr(rhs)),
        })
    }

    pub fn equals(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("=", self, rhs)
    }

    pub fn factorial(self) -> Symbolic {
        Symbolic::node(SymbolicNode {
            op: Some("!".to_string()),
            style: Style::Postfix,
            left: Some(Operand::Expr(self)),
            right: None,
        })
    }

    /// A function application, `name(arg)`, rendered fully parenthesized
    /// regardless of the argument's own precedence.
    pub fn apply(name: &str, arg: Symbolic) -> Symbolic {
        Symbolic::node(SymbolicNode {
            op: Some(name.to_string()),
            style: Style::Paren,
            left: Some(Operand::Expr(arg)),
            right: None,
        })
    }

    pub fn pow(self, exponent: Symbolic) -> Symbolic {
        Symbolic::binary("^", self, exponent)
    }

    /// Substitutes every occurrence of `name` with `value`, leaving the
    /// rest of the tree structurally unchanged (new nodes are allocated
    /// only along the path to a substituted leaf).
    pub fn substitute(&self, bindings: &HashMap<String, Float>) -> Symbolic {
        match (&self.0.op, &self.0.left, &self.0.right) {
            (None, Some(Operand::Variable(name)), _) => match bindings.get(name) {
                Some(v) => Symbolic::number(v.clone()),
                None => self.clone(),
            },
            (None, _, _) => self.clone(),
            (Some(op), left, right) => {
                let new_left = left.as_ref().map(|o| substitute_operand(o, bindings));
                let new_right = right.as_ref().map(|o| substitute_operand(o, bindings));
                Symbolic::node(SymbolicNode { op: Some(op.clone()), style: self.0.style, left: new_left, right: new_right })
            }
        }
    }

    /// Folds any subtree whose leaves are all numeric into a single
    /// number, leaving subtrees that still mention a variable alone.
    pub fn fold_constants(&self) -> Symbolic {
        if let Some(value) = self.try_eval() {
            return Symbolic::number(value);
        }
        match (&self.0.op, &self.0.left, &self.0.right) {
            (Some(op), left, right) => {
                let new_left = left.as_ref().map(|o| fold_operand(o));
                let new_right = right.as_ref().map(|o| fold_operand(o));
                Symbolic::node(SymbolicNode { op: Some(op.clone()), style: self.0.style, left: new_left, right: new_right })
            }
            _ => self.clone(),
        }
    }

    /// Evaluates to a concrete `Float` if every leaf in this subtree is a
    /// number (no free variables remain).
    pub fn try_eval(&self) -> Option<Float> {
        match (&self.0.op, &self.0.left, &self.0.right) {
            (None, Some(Operand::Number(n)), _) => Some(n.clone()),
            (None, Some(Operand::Variable(_)), _) => None,
            (Some(op), left, right) => {
                let l = left.as_ref().and_then(eval_operand);
                match (op.as_str(), self.0.style, l, right.as_ref().and_then(eval_operand)) {
                    ("+", Style::Infix, Some(a), Some(b)) => Some(a + b),
                    ("-", Style::Infix, Some(a), Some(b)) => Some(a - b),
                    ("*", _, Some(a), Some(b)) => Some(a * b),
                    ("/", _, Some(a), Some(b)) if !b.is_zero() => Some(a / b),
                    ("%", _, Some(a), Some(b)) if !b.is_zero() => {
                        let q = Float::with_val(a.prec(), &a / &b).trunc();
                        Some(a - q * b)
                    }
                    ("^", _, Some(a), Some(b)) => Some(a.pow(b)),
                    ("-", Style::Prefix, Some(a), _) => Some(-a),
                    ("!", Style::Postfix, Some(a), _) => {
                        let n = a.to_integer().and_then(|i| i.to_u32())?;
                        let fact = Integer::from(Integer::factorial(n));
                        Some(Float::with_val(a.prec(), &fact))
                    }
                    ("sin", Style::Paren, Some(a), _) => Some(a.sin()),
                    ("cos", Style::Paren, Some(a), _) => Some(a.cos()),
                    ("tan", Style::Paren, Some(a), _) => Some(a.tan()),
                    ("exp", Style::Paren, Some(a), _) => Some(a.exp()),
                    ("ln", Style::Paren, Some(a), _) => Some(a.ln()),
                    ("sqrt", Style::Paren, Some(a), _) => Some(a.sqrt()),
                    ("abs", Style::Paren, Some(a), _) => Some(a.abs()),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn eval_operand(operand: &Operand) -> Option<Float> {
    match operand {
        Operand::Number(n) => Some(n.clone()),
        Operand::Variable(_) => None,
        Operand::Expr(e) => e.try_eval(),
    }
}

fn substitute_operand(operand: &Operand, bindings: &HashMap<String, Float>) -> Operand {
    match operand {
        Operand::Variable(name) => match bindings.get(name) {
            Some(v) => Operand::Number(v.clone()),
            None => Operand::Variable(name.clone()),
        },
        Operand::Number(n) => Operand::Number(n.clone()),
        Operand::Expr(e) => Operand::Expr(e.substitute(bindings)),
    }
}

fn fold_operand(operand: &Operand) -> Operand {
    match operand {
        Operand::Expr(e) => Operand::Expr(e.fold_constants()),
        other => other.clone(),
    }
}

impl std::ops::Add for Symbolic {
    type Output = Symbolic;
    fn add(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("+", self, rhs)
    }
}

impl std::ops::Sub for Symbolic {
    type Output = Symbolic;
    fn sub(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("-", self, rhs)
    }
}

impl std::ops::Mul for Symbolic {
    type Output = Symbolic;
    fn mul(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("*", self, rhs)
    }
}

impl std::ops::Div for Symbolic {
    type Output = Symbolic;
    fn div(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("/", self, rhs)
    }
}

impl std::ops::Rem for Symbolic {
    type Output = Symbolic;
    fn rem(self, rhs: Symbolic) -> Symbolic {
        Symbolic::binary("%", self, rhs)
    }
}

impl std::ops::Neg for Symbolic {
    type Output = Symbolic;
    fn neg(self) -> Symbolic {
        Symbolic::node(SymbolicNode {
            op: Some("-".to_string()),
            style: Style::Prefix,
            left: Some(Operand::Expr(self)),
            right: None,
        })
    }
}

/// Thin wrapper functions matching the transcendental/special functions
/// that lift transparently over a symbolic argument.
pub mod functions {
    use super::Symbolic;

    macro_rules! unary_fn {
        ($name:ident) => {
            pub fn $name(arg: Symbolic) -> Symbolic {
                Symbolic::apply(stringify!($name), arg)
            }
        };
    }

    unary_fn!(sin);
    unary_fn!(cos);
    unary_fn!(tan);
    unary_fn!(exp);
    unary_fn!(ln);
    unary_fn!(sqrt);
    unary_fn!(gamma);
    unary_fn!(abs);
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Operand, parent_prio: u8) -> fmt::Result {
    match operand {
        Operand::Variable(name) => write!(f, "{name}"),
        Operand::Number(n) => write!(f, "{n}"),
        Operand::Expr(e) => write_symbolic(f, e, parent_prio),
    }
}

fn write_symbolic(f: &mut fmt::Formatter<'_>, expr: &Symbolic, parent_prio: u8) -> fmt::Result {
    let node = &expr.0;
    let this_prio = expr.priority();
    let needs_parens = this_prio < parent_prio;
    if needs_parens {
        write!(f, "(")?;
    }
    match (&node.op, node.style) {
        (None, _) => match &node.left {
            Some(operand) => write_operand(f, operand, ATOM_PRIO)?,
            None => write!(f, "?")?,
        },
        (Some(op), Style::Infix) => {
            if let Some(left) = &node.left {
                write_operand(f, left, this_prio)?;
            }
            write!(f, " {op} ")?;
            if let Some(right) = &node.right {
                // Right operand of a same-priority infix chain still needs
                // parens unless strictly higher, to disambiguate `a - (b - c)`.
                write_operand(f, right, this_prio + 1)?;
            }
        }
        (Some(op), Style::Prefix) => {
            write!(f, "{op}")?;
            if let Some(left) = &node.left {
                write_operand(f, left, this_prio)?;
            }
        }
        (Some(op), Style::Postfix) => {
            if let Some(left) = &node.left {
                write_operand(f, left, this_prio)?;
            }
            write!(f, "{op}")?;
        }
        (Some(op), Style::Paren) => {
            write!(f, "{op}(")?;
            if let Some(left) = &node.left {
                write_operand(f, left, EQUATION_PRIO)?;
            }
            write!(f, ")")?;
        }
        (Some(_), Style::None) => unreachable!("an operator node always carries a non-None style"),
    }
    if needs_parens {
        write!(f, ")")?;
    }
    Ok(())
}

impl fmt::Display for Symbolic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbolic(f, self, EQUATION_PRIO)
    }
}

impl PartialEq for Symbolic {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_precedence_aware_parens() {
        // 2 * x + 1
        let expr = Symbolic::number_f64(2.0) * Symbolic::variable("x") + Symbolic::number_f64(1.0);
        assert_eq!(expr.to_string(), "2 * x + 1");
        assert_eq!(expr.root_op(), Some("+"));
    }

    #[test]
    fn wraps_lower_precedence_child() {
        // (a + b) * c must keep its parens; a * b + c must not.
        let a = Symbolic::variable("a");
        let b = Symbolic::variable("b");
        let c = Symbolic::variable("c");
        let needs_parens = (a.clone() + b.clone()) * c.clone();
        assert_eq!(needs_parens.to_string(), "(a + b) * c");
        let no_parens = a * b + c;
        assert_eq!(no_parens.to_string(), "a * b + c");
    }

    #[test]
    fn substitutes_and_folds() {
        let mut bindings = HashMap::new();
        bindings.insert("x".to_string(), Float::with_val(LEAF_PRECISION, 3));
        let expr = Symbolic::variable("x").pow(Symbolic::number_f64(2.0)) + Symbolic::number_f64(1.0);
        let substituted = expr.substitute(&bindings);
        let folded = substituted.fold_constants();
        assert_eq!(folded.try_eval().map(|f| f.to_f64()), Some(10.0));
    }

    #[test]
    fn sharing_clones_the_handle_not_the_node() {
        let shared = Symbolic::variable("x");
        let lhs = Symbolic::from_expr(&shared) + Symbolic::number_f64(1.0);
        let rhs = Symbolic::from_expr(&shared) - Symbolic::number_f64(1.0);
        assert_eq!(lhs.to_string(), "x + 1");
        assert_eq!(rhs.to_string(), "x - 1");
    }
}
