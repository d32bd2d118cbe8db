//! Priority ties: rules sharing the same explicit priority.

use std::collections::BTreeMap;

use rulebook_core::Rule;

use crate::report::{Conflict, ConflictKind, ConflictSeverity};

/// One warning per priority value held by more than one rule. Rules
/// without a priority are ignored.
pub fn detect_priority_ties(rules: &[Rule]) -> Vec<Conflict> {
    let mut groups: BTreeMap<i64, Vec<&Rule>> = BTreeMap::new();
    for rule in rules {
        if let Some(p) = rule.priority {
            groups.entry(p).or_default().push(rule);
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(priority, members)| {
            let names: Vec<&str> = members.iter().map(|r| r.name.as_str()).collect();
            Conflict {
                kind: ConflictKind::PriorityTie,
                severity: ConflictSeverity::Warning,
                message: format!(
                    "{} rules share priority {}: {}",
                    members.len(),
                    priority,
                    names.join(", ")
                ),
                rule_ids: members.iter().map(|r| r.id.clone()).collect(),
                path: None,
            }
        })
        .collect()
}
