//! rulebook-core: data model of the business-rule core.
//!
//! Provides the recursive condition-tree model with its pure structural
//! edits, the flat rule model consumed by evaluation and conflict
//! detection, execution trace types, and the parser for free-text
//! condition expressions.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`ConditionGroup`], [`ConditionLeaf`], [`ConditionNode`], [`NodeId`]
//! - [`update_node()`], [`remove_node()`], [`add_child()`] -- tree edits
//! - [`validate_tree()`] -- well-formedness report
//! - [`Rule`] and its outcome/scope/status types
//! - [`Value`], [`Variables`] -- runtime values and bindings
//! - [`TraceEntry`], [`TraceRecorder`] -- audit trace
//! - [`parse_expression()`] -- condition expression parser

pub mod condition;
pub mod error;
pub mod expr;
pub mod rule;
pub mod trace;
pub mod validate;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use condition::{
    add_child, remove_node, update_node, ConditionGroup, ConditionLeaf, ConditionNode,
    GroupOperator, LeafOperator, NodeId,
};
pub use error::{ExprError, TreeError};
pub use expr::{parse_expression, Expr};
pub use rule::{
    OutcomeSeverity, Rule, RuleAction, RuleOutcome, RuleScope, RuleStatus, RuleType,
};
pub use trace::{TraceEntry, TraceKind, TraceRecorder, TraceStep};
pub use validate::{is_publishable, validate_tree, IssueSeverity, TreeIssue};
pub use value::{Value, Variables};
