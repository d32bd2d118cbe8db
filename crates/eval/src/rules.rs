//! Priority-ordered rule evaluation.
//!
//! Rules are evaluated in ascending `priority` (lower first; rules without
//! a priority go last, ties keep input order). Each rule contributes one
//! `rule` trace entry whether it passes or not, and passing rules are
//! returned in evaluation order.

use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use rulebook_core::{Rule, TraceEntry, TraceKind, TraceRecorder, TraceStep, Value, Variables};

use crate::expression::try_evaluate_condition;
use crate::predicate::evaluate_group;

/// Result of evaluating a rule list against one variable binding.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub applicable_rules: Vec<Rule>,
    pub trace: Vec<TraceEntry>,
}

impl RuleEvaluation {
    pub fn applicable_ids(&self) -> Vec<&str> {
        self.applicable_rules.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Evaluate `rules` against `vars` with a fresh trace.
pub fn evaluate_rules(rules: &[Rule], vars: &Variables) -> RuleEvaluation {
    let mut recorder = TraceRecorder::new();
    let applicable = evaluate_rules_with(rules, vars, &mut recorder)
        .into_iter()
        .cloned()
        .collect();
    RuleEvaluation {
        applicable_rules: applicable,
        trace: recorder.into_entries(),
    }
}

/// Evaluate `rules` against `vars`, appending to an existing trace.
/// Returns the passing rules in evaluation order.
pub fn evaluate_rules_with<'r, I>(
    rules: I,
    vars: &Variables,
    recorder: &mut TraceRecorder,
) -> Vec<&'r Rule>
where
    I: IntoIterator<Item = &'r Rule>,
{
    let mut ordered: Vec<&Rule> = rules.into_iter().collect();
    ordered.sort_by_key(|r| r.priority_key());

    let mut applicable = Vec::new();
    for rule in ordered {
        let started = Instant::now();
        let (passed, message) = rule_holds(rule, vars);
        debug!(rule_id = %rule.id, passed, "rule evaluated");

        let mut step = TraceStep::new(TraceKind::Rule, rule.name.clone())
            .input("ruleId", rule.id.as_str())
            .input("condition", describe_condition(rule))
            .output(passed)
            .passed(passed)
            .since(started);
        if let Some(p) = rule.priority {
            step = step.input("priority", p);
        }
        if let Some(m) = message {
            step = step.message(m);
        }
        recorder.record(step);

        if passed {
            applicable.push(rule);
        }
    }
    applicable
}

/// Decide whether a rule's condition holds. The structured tree wins over
/// the expression; a rule with neither applies unconditionally.
fn rule_holds(rule: &Rule, vars: &Variables) -> (bool, Option<String>) {
    if let Some(group) = &rule.conditions {
        return (evaluate_group(group, vars), None);
    }
    match rule.condition.as_deref() {
        Some(expr) if !expr.trim().is_empty() => match try_evaluate_condition(expr, vars) {
            Ok(b) => (b, None),
            Err(e) => (false, Some(e.to_string())),
        },
        _ => (true, Some("no condition; applies unconditionally".to_string())),
    }
}

fn describe_condition(rule: &Rule) -> Value {
    match (&rule.conditions, &rule.condition) {
        (Some(group), _) => Value::Text(group.to_string()),
        (None, Some(expr)) => Value::Text(expr.clone()),
        (None, None) => Value::Null,
    }
}
