//! Numeric helpers built on `rust_decimal`.
//!
//! All arithmetic uses checked `Decimal` operations and money is rounded
//! with `RoundingStrategy::MidpointNearestEven`. No `f64` anywhere in the
//! evaluation or pricing path.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use std::cmp::Ordering;

use rulebook_core::expr::{ArithOp, CompareOp};
use rulebook_core::{ExprError, Value};

/// Largest scale a `Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Round a monetary amount to `scale` decimal places (banker's rounding).
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale.min(MAX_SCALE), RoundingStrategy::MidpointNearestEven)
}

fn ordering_matches(ord: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
    }
}

pub fn compare_decimals(l: Decimal, r: Decimal, op: CompareOp) -> bool {
    ordering_matches(l.cmp(&r), op)
}

/// Compare two expression values.
///
/// Equality works across all types (values of unrelated types are simply
/// unequal). Ordering is defined for numbers (with Int/Decimal promotion)
/// and for text (lexicographic, which orders ISO dates correctly).
pub fn compare_values(left: &Value, right: &Value, op: CompareOp) -> Result<bool, ExprError> {
    match op {
        CompareOp::Eq => return Ok(left.loosely_equals(right)),
        CompareOp::Ne => return Ok(!left.loosely_equals(right)),
        _ => {}
    }
    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return Ok(compare_decimals(l, r, op));
    }
    match (left, right) {
        (Value::Text(l), Value::Text(r)) => Ok(ordering_matches(l.as_str().cmp(r.as_str()), op)),
        _ => Err(ExprError::type_error(format!(
            "operator '{}' not defined for {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Evaluate a binary arithmetic operation with overflow and zero checks.
pub fn eval_arith(left: &Value, right: &Value, op: ArithOp) -> Result<Value, ExprError> {
    if let (ArithOp::Add, Value::Text(l), Value::Text(r)) = (op, left, right) {
        return Ok(Value::Text(format!("{}{}", l, r)));
    }

    if let (Value::Int(l), Value::Int(r), false) = (left, right, op == ArithOp::Div) {
        let result = match op {
            ArithOp::Add => l.checked_add(*r),
            ArithOp::Sub => l.checked_sub(*r),
            _ => l.checked_mul(*r),
        };
        return result.map(Value::Int).ok_or_else(|| ExprError::Overflow {
            op: op.symbol().to_string(),
        });
    }

    let (l, r) = match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(ExprError::type_error(format!(
                "operator '{}' requires numeric operands, got {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };

    let result = match op {
        ArithOp::Add => l.checked_add(r),
        ArithOp::Sub => l.checked_sub(r),
        ArithOp::Mul => l.checked_mul(r),
        ArithOp::Div => {
            if r.is_zero() {
                return Err(ExprError::DivisionByZero);
            }
            l.checked_div(r)
        }
    };
    result.map(Value::Decimal).ok_or_else(|| ExprError::Overflow {
        op: op.symbol().to_string(),
    })
}
