use rust_decimal::Decimal;
use std::str::FromStr;

use super::lexer::{lex, Spanned, Token};
use super::{ArithOp, CompareOp, Expr};
use crate::error::ExprError;
use crate::value::Value;

/// Deepest nesting of parentheses and unary operators accepted.
pub const MAX_NESTING: usize = 64;

/// Most binary operators accepted in one expression. Together with
/// [`MAX_NESTING`] this bounds the depth of the resulting tree, so
/// evaluating or dropping it cannot exhaust the stack.
pub const MAX_OPERATORS: usize = 256;

/// Lex and parse a condition expression.
pub fn parse_expression(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(&tokens);
    if parser.peek() == &Token::Eof {
        return Err(parser.err("empty expression"));
    }
    let expr = parser.parse_expr()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.err(format!("unexpected trailing token {:?}", parser.peek())));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    operators: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned]) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            operators: 0,
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err(format!("expression nested deeper than {}", MAX_NESTING)));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Count one binary operator about to be consumed.
    fn count_operator(&mut self) -> Result<(), ExprError> {
        if self.operators >= MAX_OPERATORS {
            return Err(self.err(format!("expression has more than {} operators", MAX_OPERATORS)));
        }
        self.operators += 1;
        Ok(())
    }

    fn cur(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.cur().token
    }

    fn advance(&mut self) -> &Spanned {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn err(&self, msg: impl Into<String>) -> ExprError {
        ExprError::parse(self.cur().offset, msg)
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Token::Word(x) if x.eq_ignore_ascii_case(w))
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and_expr()?;
        while self.peek() == &Token::Or || self.is_word("or") {
            self.count_operator()?;
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_compare_expr()?;
        while self.peek() == &Token::And || self.is_word("and") {
            self.count_operator()?;
            self.advance();
            let right = self.parse_compare_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_compare_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_sum_expr()?;
        while let Some(op) = self.compare_op() {
            self.count_operator()?;
            self.advance();
            let right = self.parse_sum_expr()?;
            left = Expr::Compare {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn compare_op(&self) -> Option<CompareOp> {
        match self.peek() {
            Token::Eq => Some(CompareOp::Eq),
            Token::Neq => Some(CompareOp::Ne),
            Token::Lt => Some(CompareOp::Lt),
            Token::Lte => Some(CompareOp::Lte),
            Token::Gt => Some(CompareOp::Gt),
            Token::Gte => Some(CompareOp::Gte),
            _ => None,
        }
    }

    fn parse_sum_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_product_expr()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => break,
            };
            self.count_operator()?;
            self.advance();
            let right = self.parse_product_expr()?;
            left = Expr::Arith {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_product_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek() {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                _ => break,
            };
            self.count_operator()?;
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Arith {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == &Token::Not || self.is_word("not") {
            self.enter()?;
            self.advance();
            let e = self.parse_unary_expr()?;
            self.leave();
            return Ok(Expr::Not(Box::new(e)));
        }
        if self.peek() == &Token::Minus {
            self.enter()?;
            self.advance();
            let e = self.parse_unary_expr()?;
            self.leave();
            return Ok(Expr::Neg(Box::new(e)));
        }
        self.parse_atom_expr()
    }

    fn parse_atom_expr(&mut self) -> Result<Expr, ExprError> {
        let offset = self.cur().offset;
        let token = self.advance().token.clone();
        match token {
            Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Token::Float(text) => Decimal::from_str(&text)
                .map(|d| Expr::Literal(Value::Decimal(d)))
                .map_err(|e| ExprError::parse(offset, format!("invalid number '{}': {}", text, e))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Word(w) => match w.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                _ if is_keyword(&w) => Err(ExprError::parse(
                    offset,
                    format!("unexpected keyword '{}'", w),
                )),
                _ => Ok(Expr::Ident(w)),
            },
            Token::LParen => {
                self.enter()?;
                let inner = self.parse_expr()?;
                self.leave();
                if self.peek() != &Token::RParen {
                    return Err(self.err("expected ')'"));
                }
                self.advance();
                Ok(inner)
            }
            Token::Eof => Err(ExprError::parse(offset, "unexpected end of expression")),
            other => Err(ExprError::parse(offset, format!("unexpected token {:?}", other))),
        }
    }
}

fn is_keyword(w: &str) -> bool {
    ["and", "or", "not"]
        .iter()
        .any(|k| w.eq_ignore_ascii_case(k))
}
