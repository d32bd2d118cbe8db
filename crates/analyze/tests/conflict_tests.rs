//! Integration tests for the rule conflict detector.
//!
//! Fixture-driven tests load rule sets from `fixtures/rules/`; the rest
//! build small rule sets inline.

use std::path::{Path, PathBuf};

use rulebook_analyze::{
    detect_conflicts, ConflictKind, ConflictPolicy, ConflictSeverity, OpenEndedPolicy,
};
use rulebook_core::Rule;
use serde_json::json;

/// Locate the workspace root.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn load_rules(fixture: &str) -> Vec<Rule> {
    let path = workspace_root().join(fixture);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("bad rules in {}: {}", fixture, e))
}

fn rules(value: serde_json::Value) -> Vec<Rule> {
    serde_json::from_value(value).expect("valid rules")
}

fn windowed(id: &str, from: &str, to: Option<&str>) -> serde_json::Value {
    let mut r = json!({
        "id": id,
        "name": id,
        "targetId": "cov-1",
        "effectiveDate": from,
    });
    if let Some(to) = to {
        r["expirationDate"] = json!(to);
    }
    r
}

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

#[test]
fn conflicting_fixture_reports_every_kind() {
    let result = detect_conflicts(
        &load_rules("fixtures/rules/conflicting.json"),
        &ConflictPolicy::default(),
    );

    assert!(result.has_errors);
    assert!(result.has_warnings);
    assert!(!result.dependency_walk_truncated);
    assert_eq!(result.conflicts.len(), 3);

    let overlap: Vec<_> = result.of_kind(ConflictKind::Overlap).collect();
    assert_eq!(overlap.len(), 1);
    assert_eq!(overlap[0].rule_ids, vec!["rate-2024-h1", "rate-2024-h2"]);

    let cycle: Vec<_> = result.of_kind(ConflictKind::CircularDependency).collect();
    assert_eq!(cycle.len(), 1);
    assert_eq!(cycle[0].severity, ConflictSeverity::Error);
    assert_eq!(
        cycle[0].rule_ids,
        vec!["uw-claims", "uw-roof", "uw-inspection"]
    );

    let ties: Vec<_> = result.of_kind(ConflictKind::PriorityTie).collect();
    assert_eq!(ties.len(), 1);
    assert_eq!(ties[0].rule_ids.len(), 3);
}

#[test]
fn clean_fixture_has_no_conflicts() {
    let clean = load_rules("fixtures/rules/clean.json");
    for open_ended in [OpenEndedPolicy::Skip, OpenEndedPolicy::Unbounded] {
        let policy = ConflictPolicy {
            open_ended,
            ..ConflictPolicy::default()
        };
        let result = detect_conflicts(&clean, &policy);
        assert!(result.is_clean(), "{:?}: {:?}", open_ended, result.conflicts);
    }
}

// ──────────────────────────────────────────────
// Overlapping windows
// ──────────────────────────────────────────────

#[test]
fn half_year_windows_overlap_in_june() {
    let set = rules(json!([
        windowed("a", "2024-01-01", Some("2024-06-30")),
        windowed("b", "2024-06-01", Some("2024-12-31")),
    ]));
    let result = detect_conflicts(&set, &ConflictPolicy::default());
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].kind, ConflictKind::Overlap);
    assert_eq!(result.conflicts[0].severity, ConflictSeverity::Warning);
    assert!(!result.has_errors);
}

#[test]
fn adjacent_quarters_do_not_overlap() {
    let set = rules(json!([
        windowed("a", "2024-01-01", Some("2024-03-31")),
        windowed("b", "2024-04-01", Some("2024-12-31")),
    ]));
    assert!(detect_conflicts(&set, &ConflictPolicy::default()).is_clean());
}

#[test]
fn open_ended_rules_follow_policy() {
    let set = rules(json!([
        windowed("forever", "2024-01-01", None),
        windowed("later", "2030-01-01", Some("2030-12-31")),
    ]));

    let skip = detect_conflicts(&set, &ConflictPolicy::default());
    assert!(skip.is_clean());

    let unbounded = detect_conflicts(
        &set,
        &ConflictPolicy {
            open_ended: OpenEndedPolicy::Unbounded,
            ..ConflictPolicy::default()
        },
    );
    assert_eq!(unbounded.conflicts.len(), 1);
    assert_eq!(unbounded.conflicts[0].rule_ids, vec!["forever", "later"]);
}

#[test]
fn open_ended_rule_before_start_does_not_overlap() {
    let set = rules(json!([
        windowed("old", "2020-01-01", Some("2020-12-31")),
        windowed("forever", "2024-01-01", None),
    ]));
    let result = detect_conflicts(
        &set,
        &ConflictPolicy {
            open_ended: OpenEndedPolicy::Unbounded,
            ..ConflictPolicy::default()
        },
    );
    assert!(result.is_clean());
}

// ──────────────────────────────────────────────
// Dependency cycles
// ──────────────────────────────────────────────

#[test]
fn three_rule_cycle_yields_one_error() {
    let set = rules(json!([
        { "id": "A", "name": "A", "dependsOnRuleId": ["B"] },
        { "id": "B", "name": "B", "dependsOnRuleId": ["C"] },
        { "id": "C", "name": "C", "dependsOnRuleId": ["A"] },
    ]));
    let result = detect_conflicts(&set, &ConflictPolicy::default());
    assert_eq!(result.conflicts.len(), 1);
    let c = &result.conflicts[0];
    assert_eq!(c.kind, ConflictKind::CircularDependency);
    let mut ids = c.rule_ids.clone();
    ids.sort();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert_eq!(c.path.as_ref().map(Vec::len), Some(4));
    assert!(result.has_errors);
}

#[test]
fn diamond_dependencies_are_not_cycles() {
    let set = rules(json!([
        { "id": "A", "name": "A", "dependsOnRuleId": ["B", "C"] },
        { "id": "B", "name": "B", "dependsOnRuleId": ["D"] },
        { "id": "C", "name": "C", "dependsOnRuleId": ["D"] },
        { "id": "D", "name": "D" },
    ]));
    assert!(detect_conflicts(&set, &ConflictPolicy::default()).is_clean());
}

#[test]
fn visit_cap_sets_truncation_flag() {
    // Dense graph: every rule depends on every other rule.
    let ids: Vec<String> = (0..12).map(|i| format!("r{:02}", i)).collect();
    let set: Vec<Rule> = ids
        .iter()
        .map(|id| {
            let mut r = Rule::new(id, id);
            r.depends_on_rule_id = ids.iter().filter(|d| *d != id).cloned().collect();
            r
        })
        .collect();

    let result = detect_conflicts(
        &set,
        &ConflictPolicy {
            max_dependency_visits: 500,
            ..ConflictPolicy::default()
        },
    );
    assert!(result.dependency_walk_truncated);
    assert!(result.has_errors);
}

// ──────────────────────────────────────────────
// Priority ties
// ──────────────────────────────────────────────

#[test]
fn three_way_tie_is_one_conflict() {
    let set = rules(json!([
        { "id": "a", "name": "a", "priority": 10 },
        { "id": "b", "name": "b", "priority": 10 },
        { "id": "c", "name": "c", "priority": 10 },
    ]));
    let result = detect_conflicts(&set, &ConflictPolicy::default());
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].kind, ConflictKind::PriorityTie);
    assert_eq!(result.conflicts[0].rule_ids, vec!["a", "b", "c"]);
}

#[test]
fn breaking_the_tie_leaves_the_remaining_pair() {
    let set = rules(json!([
        { "id": "a", "name": "a", "priority": 10 },
        { "id": "b", "name": "b", "priority": 10 },
        { "id": "c", "name": "c", "priority": 11 },
    ]));
    let result = detect_conflicts(&set, &ConflictPolicy::default());
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].rule_ids, vec!["a", "b"]);
}

#[test]
fn distinct_priorities_have_no_ties() {
    let set = rules(json!([
        { "id": "a", "name": "a", "priority": 10 },
        { "id": "b", "name": "b", "priority": 11 },
        { "id": "c", "name": "c", "priority": 12 },
    ]));
    assert!(detect_conflicts(&set, &ConflictPolicy::default()).is_clean());
}
