//! Condition expression language.
//!
//! Free-text rule conditions (`age >= 18 && state == "CA"`) are parsed
//! into a small typed AST instead of being executed as code. The grammar
//! is deliberately minimal:
//!
//! ```text
//! expr    := or
//! or      := and (("||" | "or") and)*
//! and     := cmp (("&&" | "and") cmp)*
//! cmp     := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)*
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/") unary)*
//! unary   := ("!" | "not" | "-") unary | atom
//! atom    := number | string | true | false | null | ident | "(" expr ")"
//! ```
//!
//! Evaluation lives in `rulebook-eval`.

pub mod lexer;
pub mod parser;

use std::fmt;

use crate::value::Value;

pub use parser::parse_expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    Arith {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Identifiers referenced by the expression, in first-use order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Ident(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Not(e) | Expr::Neg(e) => e.collect_identifiers(out),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
            Expr::Compare { left, right, .. } | Expr::Arith { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Text(s)) => write!(f, "{:?}", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Not(e) => write!(f, "!{}", e),
            Expr::Neg(e) => write!(f, "-{}", e),
            Expr::And(l, r) => write!(f, "({} && {})", l, r),
            Expr::Or(l, r) => write!(f, "({} || {})", l, r),
            Expr::Compare { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Arith { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}
