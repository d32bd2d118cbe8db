//! Typed evaluation of condition trees.
//!
//! This is the live-preview path of the rule builder: each
//! [`ConditionLeaf`] is tested against the variable named by its field
//! code using the closed operator set, and groups combine their children
//! with AND/OR.
//!
//! An empty AND group is vacuously true and an empty OR group is
//! vacuously false. A leaf whose field is unset or unbound is false.

use std::time::Instant;

use rulebook_core::{
    ConditionGroup, ConditionLeaf, ConditionNode, GroupOperator, LeafOperator, TraceKind,
    TraceRecorder, TraceStep, Value, Variables,
};

use crate::numeric;
use rulebook_core::expr::CompareOp;

/// Evaluate a single leaf against `vars`.
pub fn evaluate_leaf(leaf: &ConditionLeaf, vars: &Variables) -> bool {
    let actual = match leaf.field().and_then(|f| vars.get(f)) {
        Some(Value::Null) | None => return false,
        Some(v) => v,
    };
    let expected = leaf.value.as_ref();

    match leaf.operator {
        LeafOperator::Eq => expected.is_some_and(|e| leaf_equals(actual, e)),
        LeafOperator::Ne => expected.is_some_and(|e| !leaf_equals(actual, e)),
        LeafOperator::Gt => ordered(actual, expected, CompareOp::Gt),
        LeafOperator::Gte => ordered(actual, expected, CompareOp::Gte),
        LeafOperator::Lt => ordered(actual, expected, CompareOp::Lt),
        LeafOperator::Lte => ordered(actual, expected, CompareOp::Lte),
        LeafOperator::Between => {
            let bounds = (
                actual.coerce_number(),
                expected.and_then(Value::coerce_number),
                leaf.value_end.as_ref().and_then(Value::coerce_number),
            );
            match bounds {
                (Some(x), Some(low), Some(high)) => low <= x && x <= high,
                _ => false,
            }
        }
        LeafOperator::In => match expected.and_then(Value::as_list) {
            Some(items) => items.iter().any(|item| leaf_equals(actual, item)),
            None => false,
        },
        LeafOperator::NotIn => match expected.and_then(Value::as_list) {
            Some(items) => !items.iter().any(|item| leaf_equals(actual, item)),
            None => false,
        },
        LeafOperator::Contains => match (actual, expected) {
            (Value::Text(haystack), Some(Value::Text(needle))) => haystack.contains(needle.as_str()),
            (Value::List(items), Some(needle)) => items.iter().any(|item| leaf_equals(item, needle)),
            _ => false,
        },
        LeafOperator::IsTrue => actual.as_bool() == Some(true),
        LeafOperator::IsFalse => actual.as_bool() == Some(false),
    }
}

/// Equality as the builder sees it: typed equality with numeric
/// promotion. Text is read as a number only against a numeric operand;
/// two texts always compare as strings.
fn leaf_equals(actual: &Value, expected: &Value) -> bool {
    if actual.loosely_equals(expected) {
        return true;
    }
    match (actual, expected) {
        (Value::Text(_), Value::Int(_) | Value::Decimal(_))
        | (Value::Int(_) | Value::Decimal(_), Value::Text(_)) => {
            match (actual.coerce_number(), expected.coerce_number()) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
        _ => false,
    }
}

fn ordered(actual: &Value, expected: Option<&Value>, op: CompareOp) -> bool {
    match (actual.coerce_number(), expected.and_then(Value::coerce_number)) {
        (Some(l), Some(r)) => numeric::compare_decimals(l, r, op),
        _ => false,
    }
}

/// Evaluate a condition group.
pub fn evaluate_group(group: &ConditionGroup, vars: &Variables) -> bool {
    eval_group(group, vars, None)
}

/// Evaluate a condition group, recording one `condition` trace entry per
/// leaf actually evaluated (short-circuited leaves are not recorded).
pub fn evaluate_group_traced(
    group: &ConditionGroup,
    vars: &Variables,
    recorder: &mut TraceRecorder,
) -> bool {
    eval_group(group, vars, Some(recorder))
}

fn eval_group(
    group: &ConditionGroup,
    vars: &Variables,
    mut recorder: Option<&mut TraceRecorder>,
) -> bool {
    match group.operator {
        GroupOperator::And => {
            for child in &group.conditions {
                if !eval_node(child, vars, recorder.as_deref_mut()) {
                    return false;
                }
            }
            true
        }
        GroupOperator::Or => {
            for child in &group.conditions {
                if eval_node(child, vars, recorder.as_deref_mut()) {
                    return true;
                }
            }
            false
        }
    }
}

fn eval_node(node: &ConditionNode, vars: &Variables, recorder: Option<&mut TraceRecorder>) -> bool {
    match node {
        ConditionNode::Group(g) => eval_group(g, vars, recorder),
        ConditionNode::Leaf(leaf) => {
            let started = Instant::now();
            let result = evaluate_leaf(leaf, vars);
            if let Some(rec) = recorder {
                let field = leaf.field().unwrap_or("");
                let actual = vars.get(field).cloned().unwrap_or(Value::Null);
                let mut step = TraceStep::new(TraceKind::Condition, leaf.to_string())
                    .input(field, actual)
                    .output(result)
                    .passed(result)
                    .since(started);
                if leaf.field().is_none() {
                    step = step.message("no field selected");
                }
                rec.record(step);
            }
            result
        }
    }
}
