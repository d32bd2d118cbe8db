//! Free-text condition evaluation.
//!
//! Expressions are parsed into the typed AST from `rulebook-core` and
//! interpreted against a variable binding. Every failure (syntax error,
//! unknown identifier, division by zero, type error, overflow) makes the
//! condition evaluate to `false`; nothing is ever raised to the caller.

use std::time::Instant;
use tracing::debug;

use rulebook_core::expr::Expr;
use rulebook_core::{parse_expression, ExprError, TraceKind, TraceRecorder, TraceStep, Value, Variables};

use crate::numeric;

/// Interpret a parsed expression.
pub fn eval_expr(expr: &Expr, vars: &Variables) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Ident(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::UnknownIdentifier { name: name.clone() }),

        Expr::Not(operand) => {
            let v = eval_expr(operand, vars)?;
            Ok(Value::Bool(!v.is_truthy()))
        }

        Expr::Neg(operand) => match eval_expr(operand, vars)? {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| ExprError::Overflow { op: "-".to_string() }),
            Value::Decimal(d) => Ok(Value::Decimal(-d)),
            other => Err(ExprError::type_error(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },

        Expr::And(left, right) => {
            if !eval_expr(left, vars)?.is_truthy() {
                // Short-circuit: left is false, skip right
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval_expr(right, vars)?.is_truthy()))
        }

        Expr::Or(left, right) => {
            if eval_expr(left, vars)?.is_truthy() {
                // Short-circuit: left is true, skip right
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval_expr(right, vars)?.is_truthy()))
        }

        Expr::Compare { left, op, right } => {
            let l = eval_expr(left, vars)?;
            let r = eval_expr(right, vars)?;
            numeric::compare_values(&l, &r, *op).map(Value::Bool)
        }

        Expr::Arith { left, op, right } => {
            let l = eval_expr(left, vars)?;
            let r = eval_expr(right, vars)?;
            numeric::eval_arith(&l, &r, *op)
        }
    }
}

/// Parse and evaluate `expression`, returning its truthiness or the
/// first error encountered.
pub fn try_evaluate_condition(expression: &str, vars: &Variables) -> Result<bool, ExprError> {
    let expr = parse_expression(expression)?;
    eval_expr(&expr, vars).map(|v| v.is_truthy())
}

/// Evaluate a condition expression against `vars`, recording one
/// `condition` trace entry. Errors evaluate to `false` and are recorded
/// in the entry's message.
pub fn evaluate_condition(expression: &str, vars: &Variables, recorder: &mut TraceRecorder) -> bool {
    let started = Instant::now();

    let mut referenced = Variables::new();
    let outcome = parse_expression(expression).and_then(|expr| {
        // Record the variables the expression actually references
        for name in expr.identifiers() {
            if let Some(v) = vars.get(name) {
                referenced.insert(name.to_string(), v.clone());
            }
        }
        eval_expr(&expr, vars).map(|v| v.is_truthy())
    });

    let (result, message) = match outcome {
        Ok(b) => (b, None),
        Err(e) => {
            debug!(expression = %expression, error = %e, "condition evaluation failed; treating as false");
            (false, Some(e.to_string()))
        }
    };

    let mut step = TraceStep::new(TraceKind::Condition, expression)
        .inputs(&referenced)
        .output(result)
        .passed(result)
        .since(started);
    if let Some(m) = message {
        step = step.message(m);
    }
    recorder.record(step);
    result
}
