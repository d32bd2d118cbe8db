//! Execution trace types.
//!
//! Every evaluation or calculation step appends one [`TraceEntry`] to a
//! [`TraceRecorder`]. Traces are append-only, ordered by creation and
//! produced fresh per run; entries are never mutated after append.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Rule,
    Calculation,
    Lookup,
    Condition,
    Result,
}

/// One audit record of an evaluation or calculation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub id: String,
    /// Microseconds since the recorder was created. Non-decreasing.
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub input: BTreeMap<String, Value>,
    pub output: Value,
    /// Step duration in microseconds.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A step under construction, handed to [`TraceRecorder::record`].
#[derive(Debug, Clone)]
pub struct TraceStep {
    kind: TraceKind,
    name: String,
    input: BTreeMap<String, Value>,
    output: Value,
    duration: Duration,
    passed: Option<bool>,
    message: Option<String>,
}

impl TraceStep {
    pub fn new(kind: TraceKind, name: impl Into<String>) -> Self {
        TraceStep {
            kind,
            name: name.into(),
            input: BTreeMap::new(),
            output: Value::Null,
            duration: Duration::ZERO,
            passed: None,
            message: None,
        }
    }

    pub fn input(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.input.insert(key.to_string(), value.into());
        self
    }

    pub fn inputs(mut self, values: &BTreeMap<String, Value>) -> Self {
        self.input
            .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn output(mut self, value: impl Into<Value>) -> Self {
        self.output = value.into();
        self
    }

    pub fn passed(mut self, passed: bool) -> Self {
        self.passed = Some(passed);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the duration from the instant the step started.
    pub fn since(mut self, started: Instant) -> Self {
        self.duration = started.elapsed();
        self
    }
}

/// Append-only trace accumulator, one per evaluation or simulation run.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    started: Instant,
    last_timestamp: u64,
    entries: Vec<TraceEntry>,
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceRecorder {
    pub fn new() -> Self {
        TraceRecorder {
            started: Instant::now(),
            last_timestamp: 0,
            entries: Vec::new(),
        }
    }

    /// Append a finished step.
    pub fn record(&mut self, step: TraceStep) {
        let elapsed = duration_micros(self.started.elapsed());
        self.last_timestamp = self.last_timestamp.max(elapsed);
        let id = format!("trace_{:04}", self.entries.len() + 1);
        self.entries.push(TraceEntry {
            id,
            timestamp: self.last_timestamp,
            kind: step.kind,
            name: step.name,
            input: step.input,
            output: step.output,
            duration: duration_micros(step.duration),
            passed: step.passed,
            message: step.message,
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize into the recorded entries.
    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

/// Whole microseconds in `d`, saturating.
pub fn duration_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_with_sequential_ids() {
        let mut rec = TraceRecorder::new();
        rec.record(TraceStep::new(TraceKind::Rule, "first").passed(true));
        rec.record(
            TraceStep::new(TraceKind::Calculation, "second")
                .input("base", Value::Int(100))
                .output(Value::Int(110)),
        );
        let entries = rec.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "trace_0001");
        assert_eq!(entries[1].id, "trace_0002");
        assert_eq!(entries[0].name, "first");
        assert_eq!(entries[0].passed, Some(true));
        assert_eq!(entries[1].input.get("base"), Some(&Value::Int(100)));
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn serializes_kind_as_type() {
        let mut rec = TraceRecorder::new();
        rec.record(TraceStep::new(TraceKind::Lookup, "base rate").message("default"));
        let json = serde_json::to_value(&rec.entries()[0]).unwrap();
        assert_eq!(json["type"], "lookup");
        assert_eq!(json["message"], "default");
        assert!(json.get("passed").is_none());
    }
}
