//! Well-formedness checks for condition trees.
//!
//! Edits keep a tree structurally valid, but trees also arrive from
//! storage and from half-finished builder sessions. `validate_tree`
//! reports what an author still has to fix before a rule can publish.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::condition::{
    ConditionGroup, ConditionLeaf, ConditionNode, GroupOperator, LeafOperator, NodeId,
};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeIssue {
    pub node_id: NodeId,
    pub severity: IssueSeverity,
    pub message: String,
}

/// Validate a condition tree, returning issues in pre-order.
pub fn validate_tree(root: &ConditionGroup) -> Vec<TreeIssue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    check_group(root, &mut seen, &mut issues);
    issues
}

/// True when the tree has no `Error` issues.
pub fn is_publishable(root: &ConditionGroup) -> bool {
    validate_tree(root)
        .iter()
        .all(|i| i.severity != IssueSeverity::Error)
}

fn check_group(group: &ConditionGroup, seen: &mut BTreeSet<NodeId>, issues: &mut Vec<TreeIssue>) {
    check_unique(&group.id, seen, issues);
    if group.conditions.is_empty() {
        issues.push(TreeIssue {
            node_id: group.id.clone(),
            severity: IssueSeverity::Warning,
            message: format!(
                "empty {} group is vacuously {}",
                group.operator,
                match group.operator {
                    GroupOperator::And => "true",
                    GroupOperator::Or => "false",
                }
            ),
        });
    }
    for child in &group.conditions {
        match child {
            ConditionNode::Group(g) => check_group(g, seen, issues),
            ConditionNode::Leaf(l) => {
                check_unique(&l.id, seen, issues);
                check_leaf(l, issues);
            }
        }
    }
}

fn check_unique(id: &NodeId, seen: &mut BTreeSet<NodeId>, issues: &mut Vec<TreeIssue>) {
    if !seen.insert(id.clone()) {
        issues.push(TreeIssue {
            node_id: id.clone(),
            severity: IssueSeverity::Error,
            message: format!("duplicate node id '{}'", id),
        });
    }
}

fn check_leaf(leaf: &ConditionLeaf, issues: &mut Vec<TreeIssue>) {
    let mut push = |severity, message: String| {
        issues.push(TreeIssue {
            node_id: leaf.id.clone(),
            severity,
            message,
        })
    };

    if leaf.field().is_none() {
        push(IssueSeverity::Error, "no field selected".to_string());
    }

    let op = leaf.operator;
    let value = leaf.value.as_ref().filter(|v| **v != Value::Null);

    if op.takes_value() && value.is_none() {
        push(
            IssueSeverity::Error,
            format!("operator '{}' requires a value", op.symbol()),
        );
    }
    if !op.takes_value() && value.is_some() {
        push(
            IssueSeverity::Warning,
            format!("operator '{}' ignores the stored value", op.symbol()),
        );
    }

    match (op, &leaf.value_end) {
        (LeafOperator::Between, None) => push(
            IssueSeverity::Error,
            "between requires an upper bound (valueEnd)".to_string(),
        ),
        (LeafOperator::Between, Some(_)) => {}
        (_, Some(_)) => push(
            IssueSeverity::Warning,
            format!("valueEnd is ignored by operator '{}'", op.symbol()),
        ),
        (_, None) => {}
    }

    if let Some(v) = value {
        let is_list = matches!(v, Value::List(_));
        if op.takes_list() && !is_list {
            push(
                IssueSeverity::Error,
                format!("operator '{}' requires a list value", op.symbol()),
            );
        }
        if !op.takes_list() && is_list && op != LeafOperator::Contains {
            push(
                IssueSeverity::Error,
                format!("operator '{}' does not accept a list value", op.symbol()),
            );
        }
    }
}
