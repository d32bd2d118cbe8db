//! Dependency-cycle detection.
//!
//! The graph has an edge `A -> B` iff `B` is in `A.dependsOnRuleId`.
//! Edges to ids that are not in the rule set are ignored.
//!
//! The walk is an iterative depth-first search with three colours:
//!
//! - white: not on the current path
//! - gray: on the current path (a gray child closes a cycle)
//! - black: fully explored and no cycle is reachable from it
//!
//! A node only turns black when nothing below it touched a gray node, so
//! black pruning never hides a cycle, and diamonds (`A -> B`, `A -> C`,
//! both `-> D`) are never reported. Every distinct cycle is reported once;
//! cycles are keyed by their rotation starting at the smallest id.

use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use rulebook_core::Rule;

use crate::report::{Conflict, ConflictKind, ConflictSeverity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Gray,
    Black,
}

/// One entry of the explicit DFS stack.
struct Frame<'a> {
    node: &'a str,
    next_edge: usize,
    /// A gray node was reached from here, so this node cannot turn black.
    reaches_cycle: bool,
}

pub struct CycleReport {
    pub conflicts: Vec<Conflict>,
    pub truncated: bool,
}

fn build_graph(rules: &[Rule]) -> (Vec<&str>, HashMap<&str, Vec<&str>>) {
    let mut order: Vec<&str> = Vec::new();
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in rules {
        if !graph.contains_key(rule.id.as_str()) {
            order.push(rule.id.as_str());
        }
        graph.entry(rule.id.as_str()).or_default();
    }
    for rule in rules {
        let known: Vec<&str> = rule
            .depends_on_rule_id
            .iter()
            .map(String::as_str)
            .filter(|dep| graph.contains_key(dep))
            .collect();
        if let Some(edges) = graph.get_mut(rule.id.as_str()) {
            for dep in known {
                if !edges.contains(&dep) {
                    edges.push(dep);
                }
            }
        }
    }
    (order, graph)
}

/// Rotate a cycle (without its closing node) to start at its smallest id.
fn canonical(cycle: &[&str]) -> Vec<String> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[start..]
        .iter()
        .chain(cycle[..start].iter())
        .map(|s| s.to_string())
        .collect()
}

fn cycle_conflict(cycle: Vec<String>) -> Conflict {
    let mut path = cycle.clone();
    if let Some(first) = cycle.first() {
        path.push(first.clone());
    }
    Conflict {
        kind: ConflictKind::CircularDependency,
        severity: ConflictSeverity::Error,
        message: format!("Circular dependency detected: {}", path.join(" -> ")),
        rule_ids: cycle,
        path: Some(path),
    }
}

/// Find every distinct dependency cycle, visiting at most `max_visits`
/// edges.
pub fn detect_cycles(rules: &[Rule], max_visits: usize) -> CycleReport {
    let (order, graph) = build_graph(rules);
    let mut colour: HashMap<&str, Colour> = order.iter().map(|id| (*id, Colour::White)).collect();
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut conflicts = Vec::new();
    let mut visits = 0usize;
    let mut truncated = false;

    'starts: for &start in &order {
        if graph[start].is_empty() || colour[start] == Colour::Black {
            continue;
        }

        let mut stack = vec![Frame {
            node: start,
            next_edge: 0,
            reaches_cycle: false,
        }];
        colour.insert(start, Colour::Gray);

        while let Some(top) = stack.last_mut() {
            let edges = &graph[top.node];
            if top.next_edge < edges.len() {
                if visits >= max_visits {
                    truncated = true;
                    break 'starts;
                }
                visits += 1;

                let child = edges[top.next_edge];
                top.next_edge += 1;

                match colour[child] {
                    Colour::Black => {}
                    Colour::Gray => {
                        top.reaches_cycle = true;
                        let from = stack
                            .iter()
                            .position(|f| f.node == child)
                            .unwrap_or(0);
                        let nodes: Vec<&str> = stack[from..].iter().map(|f| f.node).collect();
                        let key = canonical(&nodes);
                        if seen.insert(key.clone()) {
                            conflicts.push(cycle_conflict(key));
                        }
                    }
                    Colour::White => {
                        colour.insert(child, Colour::Gray);
                        stack.push(Frame {
                            node: child,
                            next_edge: 0,
                            reaches_cycle: false,
                        });
                    }
                }
            } else if let Some(done) = stack.pop() {
                let finished = if done.reaches_cycle {
                    Colour::White
                } else {
                    Colour::Black
                };
                colour.insert(done.node, finished);
                if done.reaches_cycle {
                    if let Some(parent) = stack.last_mut() {
                        parent.reaches_cycle = true;
                    }
                }
            }
        }
    }

    if truncated {
        warn!(
            max_visits,
            cycles_found = conflicts.len(),
            "dependency walk hit its visit cap; cycle report may be incomplete"
        );
    }

    CycleReport {
        conflicts,
        truncated,
    }
}
