//! Overlapping effective windows.
//!
//! Every unordered pair of active rules with the same `targetId` is
//! compared. Windows are closed intervals: two windows overlap unless one
//! ends strictly before the other starts.

use std::collections::BTreeMap;
use time::macros::format_description;
use time::Date;
use tracing::warn;

use rulebook_core::Rule;

use crate::policy::OpenEndedPolicy;
use crate::report::{Conflict, ConflictKind, ConflictSeverity};

/// Closed date interval of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: Date,
    end: Date,
}

impl Window {
    fn overlaps(&self, other: &Window) -> bool {
        !(self.end < other.start || other.end < self.start)
    }
}

/// Parse an ISO `YYYY-MM-DD` date. An unparseable date counts as missing.
fn parse_date(rule_id: &str, field: &str, raw: Option<&str>) -> Option<Date> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let format = format_description!("[year]-[month]-[day]");
    match Date::parse(raw, &format) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(
                rule_id = %rule_id,
                field = %field,
                value = %raw,
                error = %e,
                "unparseable rule date; treating as missing"
            );
            None
        }
    }
}

fn window(rule: &Rule, policy: OpenEndedPolicy) -> Option<Window> {
    let start = parse_date(&rule.id, "effectiveDate", rule.effective_date.as_deref())?;
    let end = match parse_date(&rule.id, "expirationDate", rule.expiration_date.as_deref()) {
        Some(end) => end,
        None => match policy {
            OpenEndedPolicy::Skip => return None,
            OpenEndedPolicy::Unbounded => Date::MAX,
        },
    };
    Some(Window { start, end })
}

pub fn detect_overlaps(rules: &[Rule], policy: OpenEndedPolicy) -> Vec<Conflict> {
    // target -> active rules with a usable window, in input order
    let mut by_target: BTreeMap<&str, Vec<(&Rule, Window)>> = BTreeMap::new();
    for rule in rules.iter().filter(|r| r.is_active()) {
        if let Some(w) = window(rule, policy) {
            by_target
                .entry(rule.target_id.as_str())
                .or_default()
                .push((rule, w));
        }
    }

    let mut conflicts = Vec::new();
    for (target, entries) in &by_target {
        for (i, (a, wa)) in entries.iter().enumerate() {
            for (b, wb) in &entries[i + 1..] {
                if wa.overlaps(wb) {
                    conflicts.push(Conflict {
                        kind: ConflictKind::Overlap,
                        severity: ConflictSeverity::Warning,
                        message: format!(
                            "Rules '{}' and '{}' have overlapping effective dates for target '{}'",
                            a.name, b.name, target
                        ),
                        rule_ids: vec![a.id.clone(), b.id.clone()],
                        path: None,
                    });
                }
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulebook_core::RuleStatus;

    fn rule(id: &str, target: &str, from: Option<&str>, to: Option<&str>) -> Rule {
        let mut r = Rule::new(id, id);
        r.target_id = target.to_string();
        r.effective_date = from.map(str::to_string);
        r.expiration_date = to.map(str::to_string);
        r
    }

    #[test]
    fn touching_windows_overlap() {
        let rules = vec![
            rule("a", "t", Some("2024-01-01"), Some("2024-03-31")),
            rule("b", "t", Some("2024-03-31"), Some("2024-12-31")),
        ];
        assert_eq!(detect_overlaps(&rules, OpenEndedPolicy::Skip).len(), 1);
    }

    #[test]
    fn different_targets_never_conflict() {
        let rules = vec![
            rule("a", "t1", Some("2024-01-01"), Some("2024-12-31")),
            rule("b", "t2", Some("2024-01-01"), Some("2024-12-31")),
        ];
        assert!(detect_overlaps(&rules, OpenEndedPolicy::Skip).is_empty());
    }

    #[test]
    fn inactive_rules_are_ignored() {
        let mut b = rule("b", "t", Some("2024-01-01"), Some("2024-12-31"));
        b.status = RuleStatus::Draft;
        let rules = vec![rule("a", "t", Some("2024-01-01"), Some("2024-12-31")), b];
        assert!(detect_overlaps(&rules, OpenEndedPolicy::Skip).is_empty());
    }

    #[test]
    fn unparseable_dates_count_as_missing() {
        let rules = vec![
            rule("a", "t", Some("Jan 1 2024"), Some("2024-12-31")),
            rule("b", "t", Some("2024-01-01"), Some("2024-12-31")),
        ];
        assert!(detect_overlaps(&rules, OpenEndedPolicy::Unbounded).is_empty());
    }

    #[test]
    fn pairs_are_reported_once() {
        let rules = vec![
            rule("a", "t", Some("2024-01-01"), Some("2024-12-31")),
            rule("b", "t", Some("2024-02-01"), Some("2024-12-31")),
            rule("c", "t", Some("2024-03-01"), Some("2024-12-31")),
        ];
        let found = detect_overlaps(&rules, OpenEndedPolicy::Skip);
        let pairs: Vec<_> = found.iter().map(|c| c.rule_ids.clone()).collect();
        assert_eq!(
            pairs,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["a".to_string(), "c".to_string()],
                vec!["b".to_string(), "c".to_string()],
            ]
        );
    }
}
