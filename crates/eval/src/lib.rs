//! Rulebook evaluator -- condition expressions, condition trees, rule
//! lists and the pricing simulation engine.
//!
//! Evaluation is pure and synchronous. Every failure inside a condition
//! resolves to `false`; every failure inside a simulation run resolves to
//! a `success = false` result. Nothing in this crate panics on bad input.

pub mod expression;
pub mod numeric;
pub mod predicate;
pub mod rules;
pub mod simulation;

pub use expression::{evaluate_condition, try_evaluate_condition};
pub use predicate::{evaluate_group, evaluate_group_traced, evaluate_leaf};
pub use rules::{evaluate_rules, evaluate_rules_with, RuleEvaluation};
pub use simulation::{
    simulate, SimulationConfig, SimulationContext, SimulationEngine, SimulationError,
    SimulationResult,
};
