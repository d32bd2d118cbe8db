//! ConflictDetectionResult: aggregated output of all conflict checks.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Overlap,
    CircularDependency,
    PriorityTie,
}

/// Severity of a conflict. `Error` means the rule set is structurally
/// invalid; `Warning` means it should be reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Warning,
    Error,
}

/// One finding of the detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub message: String,
    pub rule_ids: Vec<String>,
    /// Closed cycle path (`a -> b -> a`), cycles only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetectionResult {
    pub conflicts: Vec<Conflict>,
    pub has_errors: bool,
    pub has_warnings: bool,
    /// The dependency walk hit its visit cap; some cycles may be missing.
    pub dependency_walk_truncated: bool,
}

impl ConflictDetectionResult {
    /// Build the result, deriving the severity flags from `conflicts`.
    pub fn new(conflicts: Vec<Conflict>, dependency_walk_truncated: bool) -> Self {
        let has_errors = conflicts
            .iter()
            .any(|c| c.severity == ConflictSeverity::Error);
        let has_warnings = conflicts
            .iter()
            .any(|c| c.severity == ConflictSeverity::Warning);
        ConflictDetectionResult {
            conflicts,
            has_errors,
            has_warnings,
            dependency_walk_truncated,
        }
    }

    pub fn of_kind(&self, kind: ConflictKind) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}
