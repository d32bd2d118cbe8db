//! Rule data model: the flat rule view shared by evaluation, simulation
//! and conflict detection.

use serde::{Deserialize, Serialize};

use crate::condition::ConditionGroup;

/// Action taken when a rule's condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Accept,
    Flag,
    RequireDocs,
    Refer,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSeverity {
    Info,
    Warning,
    Error,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub action: RuleAction,
    pub severity: OutcomeSeverity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub required_docs: Vec<String>,
}

/// Applicability binding of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleScope {
    pub product_version_id: String,
    /// `None` applies to all states.
    #[serde(default)]
    pub state_code: Option<String>,
    /// `None` applies product-wide.
    #[serde(default)]
    pub coverage_version_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
    Draft,
    #[serde(rename = "Under Review")]
    UnderReview,
    Archived,
}

/// Rule category. Only `eligibility` changes simulation behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Eligibility,
    Pricing,
    Underwriting,
    Compliance,
    Coverage,
    Forms,
    #[default]
    Other,
}

/// A named condition bound to an outcome, priority, temporal window and
/// dependency list.
///
/// A rule may carry a structured `conditions` tree, a free-text
/// `condition` expression, both, or neither. The structured tree wins
/// when both are present; a rule with neither always applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub target_id: String,
    /// Lower values evaluate first.
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub status: RuleStatus,
    /// ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    /// ISO `YYYY-MM-DD`; absent means open-ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub depends_on_rule_id: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RuleOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RuleScope>,
}

impl Rule {
    /// A minimal active rule, mostly useful when building rule sets in code.
    pub fn new(id: &str, name: &str) -> Self {
        Rule {
            id: id.to_string(),
            name: name.to_string(),
            rule_type: RuleType::Other,
            target_id: String::new(),
            priority: None,
            status: RuleStatus::Active,
            effective_date: None,
            expiration_date: None,
            depends_on_rule_id: Vec::new(),
            condition: None,
            conditions: None,
            outcome: None,
            scope: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RuleStatus::Active
    }

    /// Sort key for evaluation order; rules without a priority go last.
    pub fn priority_key(&self) -> i64 {
        self.priority.unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_rule() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "Minimum age",
            "type": "eligibility",
            "targetId": "prod-1",
            "priority": 10,
            "status": "Under Review",
            "effectiveDate": "2024-01-01",
            "dependsOnRuleId": ["r0"],
            "condition": "age >= 18",
            "outcome": {
                "action": "require_docs",
                "severity": "warning",
                "message": "Proof of age required",
                "requiredDocs": ["Driver license"]
            }
        }))
        .unwrap();
        assert_eq!(rule.rule_type, RuleType::Eligibility);
        assert_eq!(rule.status, RuleStatus::UnderReview);
        assert_eq!(rule.priority, Some(10));
        assert_eq!(rule.depends_on_rule_id, vec!["r0"]);
        let outcome = rule.outcome.unwrap();
        assert_eq!(outcome.action, RuleAction::RequireDocs);
        assert_eq!(outcome.required_docs, vec!["Driver license"]);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let rule: Rule =
            serde_json::from_value(serde_json::json!({ "id": "r1", "name": "bare" })).unwrap();
        assert_eq!(rule.rule_type, RuleType::Other);
        assert_eq!(rule.status, RuleStatus::Active);
        assert!(rule.depends_on_rule_id.is_empty());
        assert_eq!(rule.priority_key(), i64::MAX);
    }
}
