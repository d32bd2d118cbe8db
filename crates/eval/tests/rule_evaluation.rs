//! Rule-list evaluation against JSON rule sets.

use serde_json::json;

use rulebook_core::{Rule, TraceKind, Value, Variables};
use rulebook_eval::{evaluate_condition, evaluate_rules};

fn rules(value: serde_json::Value) -> Vec<Rule> {
    serde_json::from_value(value).expect("valid rules")
}

fn vars(value: serde_json::Value) -> Variables {
    serde_json::from_value(value).expect("valid variables")
}

#[test]
fn applicable_rules_follow_priority_order() {
    let rule_set = rules(json!([
        { "id": "late", "name": "Late", "priority": 50, "condition": "premium > 500" },
        { "id": "early", "name": "Early", "priority": 5, "condition": "state == 'NY'" },
        { "id": "unranked", "name": "Unranked", "condition": "true" },
        { "id": "skipped", "name": "Skipped", "priority": 10, "condition": "premium < 10" }
    ]));
    let bound = vars(json!({ "premium": 900, "state": "NY" }));

    let eval = evaluate_rules(&rule_set, &bound);
    assert_eq!(eval.applicable_ids(), vec!["early", "late", "unranked"]);
    assert_eq!(eval.trace.len(), 4);
    assert!(eval.trace.iter().all(|e| e.kind == TraceKind::Rule));
}

#[test]
fn structured_condition_tree_from_json() {
    let rule_set = rules(json!([{
        "id": "tree",
        "name": "Coastal high value",
        "priority": 1,
        "conditions": {
            "kind": "group",
            "id": "root",
            "operator": "AND",
            "conditions": [
                { "kind": "leaf", "id": "l1", "fieldCode": "state", "operator": "in", "value": ["FL", "TX"] },
                { "kind": "leaf", "id": "l2", "fieldCode": "dwellingValue", "operator": "between", "value": 500000, "valueEnd": 2000000 }
            ]
        }
    }]));

    let hit = evaluate_rules(&rule_set, &vars(json!({ "state": "FL", "dwellingValue": 750000 })));
    assert_eq!(hit.applicable_ids(), vec!["tree"]);

    let miss = evaluate_rules(&rule_set, &vars(json!({ "state": "FL", "dwellingValue": 100 })));
    assert!(miss.applicable_rules.is_empty());
}

#[test]
fn division_by_zero_condition_is_false() {
    let mut recorder = rulebook_core::TraceRecorder::new();
    assert!(!evaluate_condition("1/0", &Variables::new(), &mut recorder));
    assert_eq!(recorder.entries()[0].output, Value::Bool(false));
}

#[test]
fn serialized_result_uses_camel_case() {
    let rule_set = rules(json!([{ "id": "r", "name": "R", "condition": "x == 1" }]));
    let eval = evaluate_rules(&rule_set, &vars(json!({ "x": 1 })));
    let out = serde_json::to_value(&eval).unwrap();
    assert!(out.get("applicableRules").is_some());
    assert_eq!(out["trace"][0]["type"], "rule");
    assert_eq!(out["trace"][0]["passed"], true);
}
