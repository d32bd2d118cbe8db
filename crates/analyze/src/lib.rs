//! Rulebook static analyzer -- conflict detection over a rule set.
//!
//! Three independent checks run over the same in-memory rules and feed a
//! single [`ConflictDetectionResult`]:
//!
//! - overlapping effective windows between active rules on one target
//! - cycles in the `dependsOnRuleId` graph
//! - rules sharing the same priority
//!
//! The analyzer is pure: it never mutates the rules and never fails.

pub mod cycles;
pub mod overlap;
pub mod policy;
pub mod priority;
pub mod report;

use tracing::info;

use rulebook_core::Rule;

pub use policy::{ConflictPolicy, OpenEndedPolicy};
pub use report::{Conflict, ConflictDetectionResult, ConflictKind, ConflictSeverity};

/// Run every conflict check over `rules`.
///
/// Conflicts are ordered by check (overlaps, cycles, priority ties) and
/// within each check by discovery order.
pub fn detect_conflicts(rules: &[Rule], policy: &ConflictPolicy) -> ConflictDetectionResult {
    let mut conflicts = overlap::detect_overlaps(rules, policy.open_ended);
    let walk = cycles::detect_cycles(rules, policy.max_dependency_visits);
    conflicts.extend(walk.conflicts);
    conflicts.extend(priority::detect_priority_ties(rules));

    let result = ConflictDetectionResult::new(conflicts, walk.truncated);
    info!(
        rules = rules.len(),
        conflicts = result.conflicts.len(),
        has_errors = result.has_errors,
        "conflict detection complete"
    );
    result
}
