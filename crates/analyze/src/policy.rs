//! Detector configuration.

use serde::{Deserialize, Serialize};

/// How a rule without an expiration date is treated by the overlap check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenEndedPolicy {
    /// Skip any pair where either rule lacks a bound.
    #[default]
    Skip,
    /// A missing expiration date means the rule never expires.
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    pub open_ended: OpenEndedPolicy,
    /// Edge traversals allowed during the dependency-cycle walk.
    pub max_dependency_visits: usize,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy {
            open_ended: OpenEndedPolicy::Skip,
            max_dependency_visits: 10_000,
        }
    }
}
