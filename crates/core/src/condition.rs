//! Condition tree model and pure structural edits.
//!
//! A condition tree is an owned recursive sum type: a root
//! [`ConditionGroup`] whose `conditions` are either nested groups or
//! [`ConditionLeaf`] comparisons. Edits never mutate their input; each
//! returns a new tree with the edited path copied.
//!
//! Edits driven by an interactive builder can race with removals, so a
//! missing target degrades to "return the input unchanged". The only
//! edit that fails loudly is removing the root, which would leave no tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::error::TreeError;
use crate::value::Value;

/// Opaque node identifier, stable across edits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Generate a fresh, never-before-used identifier.
    pub fn fresh() -> Self {
        NodeId(format!("cond_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

/// Comparison operator of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeafOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
    Contains,
    IsTrue,
    IsFalse,
}

impl LeafOperator {
    pub const ALL: [LeafOperator; 12] = [
        LeafOperator::Eq,
        LeafOperator::Ne,
        LeafOperator::Gt,
        LeafOperator::Gte,
        LeafOperator::Lt,
        LeafOperator::Lte,
        LeafOperator::Between,
        LeafOperator::In,
        LeafOperator::NotIn,
        LeafOperator::Contains,
        LeafOperator::IsTrue,
        LeafOperator::IsFalse,
    ];

    /// Whether the operator reads the leaf's `value`.
    pub fn takes_value(self) -> bool {
        !matches!(self, LeafOperator::IsTrue | LeafOperator::IsFalse)
    }

    /// Whether the operator expects a list-shaped `value`.
    pub fn takes_list(self) -> bool {
        matches!(self, LeafOperator::In | LeafOperator::NotIn)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LeafOperator::Eq => "==",
            LeafOperator::Ne => "!=",
            LeafOperator::Gt => ">",
            LeafOperator::Gte => ">=",
            LeafOperator::Lt => "<",
            LeafOperator::Lte => "<=",
            LeafOperator::Between => "between",
            LeafOperator::In => "in",
            LeafOperator::NotIn => "not in",
            LeafOperator::Contains => "contains",
            LeafOperator::IsTrue => "is true",
            LeafOperator::IsFalse => "is false",
        }
    }
}

/// Boolean combinator of a group, applied uniformly to all direct children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOperator::And => f.write_str("AND"),
            GroupOperator::Or => f.write_str("OR"),
        }
    }
}

// ──────────────────────────────────────────────
// Nodes
// ──────────────────────────────────────────────

/// A single comparison test on one named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionLeaf {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_code: Option<String>,
    pub operator: LeafOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_end: Option<Value>,
}

impl ConditionLeaf {
    pub fn new(field_code: &str, operator: LeafOperator, value: impl Into<Value>) -> Self {
        ConditionLeaf {
            id: NodeId::fresh(),
            field_code: Some(field_code.to_string()),
            operator,
            value: Some(value.into()),
            value_end: None,
        }
    }

    /// An inclusive range test, `low <= field <= high`.
    pub fn between(field_code: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        ConditionLeaf {
            id: NodeId::fresh(),
            field_code: Some(field_code.to_string()),
            operator: LeafOperator::Between,
            value: Some(low.into()),
            value_end: Some(high.into()),
        }
    }

    /// A value-less test such as `isTrue` / `isFalse`.
    pub fn flag(field_code: &str, operator: LeafOperator) -> Self {
        ConditionLeaf {
            id: NodeId::fresh(),
            field_code: Some(field_code.to_string()),
            operator,
            value: None,
            value_end: None,
        }
    }

    /// A blank leaf as inserted by the builder before a field is chosen.
    pub fn blank() -> Self {
        ConditionLeaf {
            id: NodeId::fresh(),
            field_code: None,
            operator: LeafOperator::Eq,
            value: None,
            value_end: None,
        }
    }

    /// The field code, treating an empty string as unset.
    pub fn field(&self) -> Option<&str> {
        self.field_code.as_deref().filter(|f| !f.trim().is_empty())
    }
}

/// An AND/OR combinator over child conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub id: NodeId,
    pub operator: GroupOperator,
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,
}

/// A child of a group: either a nested group or a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConditionNode {
    Group(ConditionGroup),
    Leaf(ConditionLeaf),
}

impl From<ConditionLeaf> for ConditionNode {
    fn from(leaf: ConditionLeaf) -> Self {
        ConditionNode::Leaf(leaf)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(group: ConditionGroup) -> Self {
        ConditionNode::Group(group)
    }
}

impl ConditionNode {
    pub fn id(&self) -> &NodeId {
        match self {
            ConditionNode::Group(g) => &g.id,
            ConditionNode::Leaf(l) => &l.id,
        }
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            ConditionNode::Group(g) => Some(g),
            ConditionNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&ConditionLeaf> {
        match self {
            ConditionNode::Leaf(l) => Some(l),
            ConditionNode::Group(_) => None,
        }
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        match self {
            ConditionNode::Group(g) => g.collect_ids(out),
            ConditionNode::Leaf(l) => out.push(l.id.clone()),
        }
    }
}

impl ConditionGroup {
    pub fn new(operator: GroupOperator) -> Self {
        ConditionGroup {
            id: NodeId::fresh(),
            operator,
            conditions: Vec::new(),
        }
    }

    /// Builder-style append, used when assembling trees in code.
    pub fn with(mut self, child: impl Into<ConditionNode>) -> Self {
        self.conditions.push(child.into());
        self
    }

    /// All node ids in pre-order, root first.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id.clone());
        for child in &self.conditions {
            child.collect_ids(out);
        }
    }

    pub fn contains_id(&self, id: &NodeId) -> bool {
        self.id == *id || self.find(id).is_some()
    }

    /// Pre-order search among the descendants of this group.
    pub fn find(&self, id: &NodeId) -> Option<&ConditionNode> {
        for child in &self.conditions {
            if child.id() == id {
                return Some(child);
            }
            if let ConditionNode::Group(g) = child {
                if let Some(found) = g.find(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn leaf_count(&self) -> usize {
        self.conditions
            .iter()
            .map(|c| match c {
                ConditionNode::Group(g) => g.leaf_count(),
                ConditionNode::Leaf(_) => 1,
            })
            .sum()
    }

    /// Nesting depth; a root group with only leaves has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .filter_map(ConditionNode::as_group)
            .map(ConditionGroup::depth)
            .max()
            .unwrap_or(0)
    }
}

// ──────────────────────────────────────────────
// Structural edits
// ──────────────────────────────────────────────

/// Replace the node with `target` by `updater(node)`.
///
/// The search is pre-order. Ancestors of the target are copied, siblings
/// are carried over untouched. If no node matches, the tree is returned
/// unchanged. The root may be replaced only by another group, and the
/// replacement must keep the target's id.
pub fn update_node<F>(root: &ConditionGroup, target: &NodeId, updater: F) -> ConditionGroup
where
    F: FnOnce(ConditionNode) -> ConditionNode,
{
    if root.id == *target {
        return match updater(ConditionNode::Group(root.clone())) {
            ConditionNode::Group(g) if g.id == *target => g,
            _ => {
                debug!(target_id = %target, "root update rejected: root must stay a group with the same id");
                root.clone()
            }
        };
    }

    let mut updater = Some(updater);
    match rebuild_updated(root, target, &mut updater) {
        Some(updated) => updated,
        None => {
            debug!(target_id = %target, "update_node: no matching node");
            root.clone()
        }
    }
}

fn rebuild_updated<F>(
    group: &ConditionGroup,
    target: &NodeId,
    updater: &mut Option<F>,
) -> Option<ConditionGroup>
where
    F: FnOnce(ConditionNode) -> ConditionNode,
{
    for (idx, child) in group.conditions.iter().enumerate() {
        if child.id() == target {
            let f = updater.take()?;
            let replacement = f(child.clone());
            if replacement.id() != target {
                debug!(target_id = %target, "update rejected: replacement changed the node id");
                return None;
            }
            let mut copy = group.clone();
            copy.conditions[idx] = replacement;
            return Some(copy);
        }
        if let ConditionNode::Group(inner) = child {
            if let Some(new_inner) = rebuild_updated(inner, target, updater) {
                let mut copy = group.clone();
                copy.conditions[idx] = ConditionNode::Group(new_inner);
                return Some(copy);
            }
        }
    }
    None
}

/// Remove the node with `target` from its parent's children.
///
/// Removing the root is rejected. A missing target returns the tree
/// unchanged.
pub fn remove_node(root: &ConditionGroup, target: &NodeId) -> Result<ConditionGroup, TreeError> {
    if root.id == *target {
        return Err(TreeError::RootRemoval { id: target.clone() });
    }
    match rebuild_without(root, target) {
        Some(pruned) => Ok(pruned),
        None => {
            debug!(target_id = %target, "remove_node: no matching node");
            Ok(root.clone())
        }
    }
}

fn rebuild_without(group: &ConditionGroup, target: &NodeId) -> Option<ConditionGroup> {
    if let Some(idx) = group.conditions.iter().position(|c| c.id() == target) {
        let mut copy = group.clone();
        copy.conditions.remove(idx);
        return Some(copy);
    }
    for (idx, child) in group.conditions.iter().enumerate() {
        if let ConditionNode::Group(inner) = child {
            if let Some(new_inner) = rebuild_without(inner, target) {
                let mut copy = group.clone();
                copy.conditions[idx] = ConditionNode::Group(new_inner);
                return Some(copy);
            }
        }
    }
    None
}

/// Append `child` to the group with `parent_id`.
///
/// No-op when the parent is missing, is a leaf, or when any id inside
/// `child` already occurs in the tree (ids must stay unique).
pub fn add_child(
    root: &ConditionGroup,
    parent_id: &NodeId,
    child: ConditionNode,
) -> ConditionGroup {
    let existing: BTreeSet<NodeId> = root.node_ids().into_iter().collect();
    let mut incoming = Vec::new();
    child.collect_ids(&mut incoming);
    let mut seen = BTreeSet::new();
    if incoming
        .iter()
        .any(|id| existing.contains(id) || !seen.insert(id.clone()))
    {
        debug!(parent_id = %parent_id, child_id = %child.id(), "add_child rejected: duplicate node id");
        return root.clone();
    }

    let mut child = Some(child);
    match rebuild_with_child(root, parent_id, &mut child) {
        Some(updated) => updated,
        None => {
            debug!(parent_id = %parent_id, "add_child: parent is missing or not a group");
            root.clone()
        }
    }
}

fn rebuild_with_child(
    group: &ConditionGroup,
    parent_id: &NodeId,
    child: &mut Option<ConditionNode>,
) -> Option<ConditionGroup> {
    if group.id == *parent_id {
        let mut copy = group.clone();
        copy.conditions.push(child.take()?);
        return Some(copy);
    }
    for (idx, node) in group.conditions.iter().enumerate() {
        match node {
            ConditionNode::Leaf(leaf) if leaf.id == *parent_id => return None,
            ConditionNode::Leaf(_) => {}
            ConditionNode::Group(inner) => {
                if let Some(new_inner) = rebuild_with_child(inner, parent_id, child) {
                    let mut copy = group.clone();
                    copy.conditions[idx] = ConditionNode::Group(new_inner);
                    return Some(copy);
                }
            }
        }
    }
    None
}

// ──────────────────────────────────────────────
// Rendering
// ──────────────────────────────────────────────

impl fmt::Display for ConditionLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field().unwrap_or("?");
        let value = self
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        match self.operator {
            LeafOperator::IsTrue | LeafOperator::IsFalse => {
                write!(f, "{} {}", field, self.operator.symbol())
            }
            LeafOperator::Between => {
                let end = self
                    .value_end
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                write!(f, "{} between {} and {}", field, value, end)
            }
            op => write!(f, "{} {} {}", field, op.symbol(), value),
        }
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "(empty {})", self.operator);
        }
        write!(f, "(")?;
        for (i, child) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::Group(g) => g.fmt(f),
            ConditionNode::Leaf(l) => l.fmt(f),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, field: &str, value: i64) -> ConditionLeaf {
        ConditionLeaf {
            id: NodeId::from(id),
            field_code: Some(field.to_string()),
            operator: LeafOperator::Gte,
            value: Some(Value::Int(value)),
            value_end: None,
        }
    }

    fn group(id: &str, op: GroupOperator, children: Vec<ConditionNode>) -> ConditionGroup {
        ConditionGroup {
            id: NodeId::from(id),
            operator: op,
            conditions: children,
        }
    }

    /// root(AND) -> [a, inner(OR) -> [b, c], d]
    fn sample() -> ConditionGroup {
        group(
            "root",
            GroupOperator::And,
            vec![
                leaf("a", "age", 18).into(),
                group(
                    "inner",
                    GroupOperator::Or,
                    vec![leaf("b", "years", 3).into(), leaf("c", "claims", 0).into()],
                )
                .into(),
                leaf("d", "limit", 1000).into(),
            ],
        )
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = ConditionLeaf::blank();
        let b = ConditionLeaf::blank();
        let g = ConditionGroup::new(GroupOperator::And);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, g.id);
    }

    #[test]
    fn update_nested_leaf_copies_path_only() {
        let tree = sample();
        let updated = update_node(&tree, &NodeId::from("c"), |node| match node {
            ConditionNode::Leaf(mut l) => {
                l.value = Some(Value::Int(2));
                ConditionNode::Leaf(l)
            }
            other => other,
        });
        let c = updated.find(&NodeId::from("c")).and_then(|n| n.as_leaf());
        assert_eq!(c.and_then(|l| l.value.clone()), Some(Value::Int(2)));
        // Siblings and input untouched
        assert_eq!(updated.conditions[0], tree.conditions[0]);
        assert_eq!(updated.conditions[2], tree.conditions[2]);
        assert_eq!(
            tree.find(&NodeId::from("c"))
                .and_then(|n| n.as_leaf())
                .and_then(|l| l.value.clone()),
            Some(Value::Int(0))
        );
    }

    #[test]
    fn update_missing_id_returns_input() {
        let tree = sample();
        let updated = update_node(&tree, &NodeId::from("nope"), |n| n);
        assert_eq!(updated, tree);
    }

    #[test]
    fn update_rejects_id_change() {
        let tree = sample();
        let updated = update_node(&tree, &NodeId::from("a"), |_| {
            ConditionNode::Leaf(leaf("zzz", "age", 21))
        });
        assert_eq!(updated, tree);
    }

    #[test]
    fn update_root_operator() {
        let tree = sample();
        let updated = update_node(&tree, &NodeId::from("root"), |node| match node {
            ConditionNode::Group(mut g) => {
                g.operator = GroupOperator::Or;
                ConditionNode::Group(g)
            }
            other => other,
        });
        assert_eq!(updated.operator, GroupOperator::Or);
        assert_eq!(updated.conditions, tree.conditions);
    }

    #[test]
    fn root_cannot_become_leaf() {
        let tree = sample();
        let updated = update_node(&tree, &NodeId::from("root"), |_| {
            ConditionNode::Leaf(leaf("root", "age", 1))
        });
        assert_eq!(updated, tree);
    }

    #[test]
    fn remove_nested_node() {
        let tree = sample();
        let pruned = remove_node(&tree, &NodeId::from("b")).unwrap();
        let inner = pruned
            .find(&NodeId::from("inner"))
            .and_then(|n| n.as_group())
            .unwrap();
        assert_eq!(inner.conditions.len(), 1);
        assert_eq!(inner.conditions[0].id(), &NodeId::from("c"));
        assert_eq!(pruned.conditions.len(), 3);
    }

    #[test]
    fn remove_group_drops_subtree() {
        let tree = sample();
        let pruned = remove_node(&tree, &NodeId::from("inner")).unwrap();
        assert_eq!(pruned.leaf_count(), 2);
        assert!(!pruned.contains_id(&NodeId::from("b")));
    }

    #[test]
    fn remove_root_is_rejected() {
        let tree = sample();
        let err = remove_node(&tree, &NodeId::from("root")).unwrap_err();
        assert_eq!(
            err,
            TreeError::RootRemoval {
                id: NodeId::from("root")
            }
        );
    }

    #[test]
    fn remove_missing_is_noop() {
        let tree = sample();
        assert_eq!(remove_node(&tree, &NodeId::from("ghost")).unwrap(), tree);
    }

    #[test]
    fn remove_after_update_removes_exactly_that_node() {
        let tree = sample();
        for id in ["a", "b", "c", "d", "inner"] {
            let target = NodeId::from(id);
            let updated = update_node(&tree, &target, |n| n);
            let pruned = remove_node(&updated, &target).unwrap();
            let mut expected: Vec<NodeId> = tree.node_ids();
            let removed: Vec<NodeId> = match tree.find(&target) {
                Some(ConditionNode::Group(g)) => g.node_ids(),
                Some(ConditionNode::Leaf(l)) => vec![l.id.clone()],
                None => vec![],
            };
            expected.retain(|x| !removed.contains(x));
            assert_eq!(pruned.node_ids(), expected, "removing {}", id);
        }
    }

    #[test]
    fn add_child_to_nested_group() {
        let tree = sample();
        let updated = add_child(
            &tree,
            &NodeId::from("inner"),
            leaf("e", "score", 700).into(),
        );
        let inner = updated
            .find(&NodeId::from("inner"))
            .and_then(|n| n.as_group())
            .unwrap();
        assert_eq!(inner.conditions.len(), 3);
        assert_eq!(inner.conditions[2].id(), &NodeId::from("e"));
    }

    #[test]
    fn add_child_to_leaf_is_noop() {
        let tree = sample();
        let updated = add_child(&tree, &NodeId::from("a"), leaf("e", "x", 1).into());
        assert_eq!(updated, tree);
    }

    #[test]
    fn add_child_to_missing_parent_is_noop() {
        let tree = sample();
        let updated = add_child(&tree, &NodeId::from("ghost"), leaf("e", "x", 1).into());
        assert_eq!(updated, tree);
    }

    #[test]
    fn add_child_with_duplicate_id_is_noop() {
        let tree = sample();
        let updated = add_child(&tree, &NodeId::from("root"), leaf("b", "x", 1).into());
        assert_eq!(updated, tree);
    }

    #[test]
    fn shape_queries() {
        let tree = sample();
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.depth(), 2);
        assert_eq!(
            tree.node_ids(),
            ["root", "a", "inner", "b", "c", "d"]
                .iter()
                .map(|s| NodeId::from(*s))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn display_renders_infix() {
        let tree = group(
            "g",
            GroupOperator::And,
            vec![
                leaf("a", "age", 18).into(),
                ConditionLeaf {
                    id: NodeId::from("s"),
                    field_code: Some("state".to_string()),
                    operator: LeafOperator::In,
                    value: Some(Value::List(vec![Value::from("CA"), Value::from("NY")])),
                    value_end: None,
                }
                .into(),
            ],
        );
        assert_eq!(tree.to_string(), "(age >= 18 AND state in [CA, NY])");
    }

    #[test]
    fn json_shape_uses_kind_tags() {
        let json = serde_json::json!({
            "id": "root",
            "operator": "AND",
            "conditions": [
                { "kind": "leaf", "id": "a", "fieldCode": "age", "operator": "between", "value": 18, "valueEnd": 65 },
                { "kind": "group", "id": "g", "operator": "OR", "conditions": [] }
            ]
        });
        let tree: ConditionGroup = serde_json::from_value(json).unwrap();
        assert_eq!(tree.conditions.len(), 2);
        let a = tree.conditions[0].as_leaf().unwrap();
        assert_eq!(a.operator, LeafOperator::Between);
        assert_eq!(a.value_end, Some(Value::Int(65)));
    }
}
