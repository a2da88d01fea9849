//! Snapshot of one pipeline run: every resolved value with its provenance,
//! the decision traces, and the diagnostics collected along the way.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::decision::DecisionTrace;
use crate::diagnostics::DiagnosticsReport;
use crate::redaction::redact;

/// Where a resolved value came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// A named provider such as a file or in-memory layer.
    ExternalProvider { name: String },
    EnvironmentVariable,
    /// The binding's default value.
    DefaultValue,
    /// Derived by a decision binding.
    DecisionFallback,
    /// Provenance tracking unavailable or inconclusive.
    Unknown,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::ExternalProvider { name } => write!(f, "provider:{}", name),
            Provenance::EnvironmentVariable => f.write_str("environment"),
            Provenance::DefaultValue => f.write_str("default"),
            Provenance::DecisionFallback => f.write_str("decision"),
            Provenance::Unknown => f.write_str("unknown"),
        }
    }
}

/// One resolved configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    key: String,
    stringified_value: String,
    provenance: Provenance,
    is_secret: bool,
}

impl ResolvedValue {
    pub fn new(
        key: impl Into<String>,
        stringified_value: impl Into<String>,
        provenance: Provenance,
        is_secret: bool,
    ) -> Self {
        Self {
            key: key.into(),
            stringified_value: stringified_value.into(),
            provenance,
            is_secret,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The unredacted value. Use [`ResolvedValue::display_value`] for output.
    pub fn stringified_value(&self) -> &str {
        &self.stringified_value
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn is_secret(&self) -> bool {
        self.is_secret
    }

    pub fn display_value(&self) -> &str {
        redact(&self.stringified_value, self.is_secret)
    }
}

impl Serialize for ResolvedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serializer.serialize_struct("ResolvedValue", 4)?;
        value.serialize_field("key", &self.key)?;
        value.serialize_field("value", self.display_value())?;
        value.serialize_field("provenance", &self.provenance)?;
        value.serialize_field("is_secret", &self.is_secret)?;
        value.end()
    }
}

/// Frozen record of a single pipeline run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    build_id: Uuid,
    resolved_values: Vec<ResolvedValue>,
    decision_traces: Vec<DecisionTrace>,
    timestamp: DateTime<Utc>,
    diagnostics: DiagnosticsReport,
}

impl Snapshot {
    pub fn new(
        resolved_values: Vec<ResolvedValue>,
        decision_traces: Vec<DecisionTrace>,
        diagnostics: DiagnosticsReport,
    ) -> Self {
        Self {
            build_id: Uuid::new_v4(),
            resolved_values,
            decision_traces,
            timestamp: Utc::now(),
            diagnostics,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// Resolved values in insertion order.
    pub fn resolved_values(&self) -> &[ResolvedValue] {
        &self.resolved_values
    }

    pub fn decision_traces(&self) -> &[DecisionTrace] {
        &self.decision_traces
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn diagnostics(&self) -> &DiagnosticsReport {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn value(&self, key: &str) -> Option<&ResolvedValue> {
        self.resolved_values.iter().find(|v| v.key == key)
    }

    pub fn trace(&self, key: &str) -> Option<&DecisionTrace> {
        self.decision_traces.iter().find(|t| t.key == key)
    }

    /// SHA-256 over the redacted content of the snapshot.
    ///
    /// Build id and timestamp are excluded, so two runs over the same reader
    /// state produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for value in &self.resolved_values {
            for part in [value.key(), value.display_value(), &value.provenance.to_string()] {
                hasher.update(part.as_bytes());
                hasher.update(b"\0");
            }
        }
        hasher.update(b"\x1e");
        for trace in &self.decision_traces {
            let index = trace.matched_index.to_string();
            for part in [&trace.key, &index, &trace.decision_name, &trace.decision_type] {
                hasher.update(part.as_bytes());
                hasher.update(b"\0");
            }
        }
        hasher.update(b"\x1e");
        for item in self.diagnostics.ordered_items() {
            let summary = item.context_summary().unwrap_or_default();
            for part in [
                item.key().unwrap_or(""),
                item.severity().as_str(),
                item.display_message(),
                &summary,
            ] {
                hasher.update(part.as_bytes());
                hasher.update(b"\0");
            }
        }
        hex::encode(hasher.finalize())
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut snapshot = serializer.serialize_struct("Snapshot", 6)?;
        snapshot.serialize_field("build_id", &self.build_id)?;
        snapshot.serialize_field("timestamp", &self.timestamp)?;
        snapshot.serialize_field("fingerprint", &self.fingerprint())?;
        snapshot.serialize_field("resolved_values", &self.resolved_values)?;
        snapshot.serialize_field("decision_traces", &self.decision_traces)?;
        snapshot.serialize_field("diagnostics", &self.diagnostics)?;
        snapshot.end()
    }
}

/// Mutable side of a snapshot while a run is in progress.
#[derive(Debug)]
pub(crate) struct SnapshotBuilder {
    build_id: Uuid,
    resolved_values: Vec<ResolvedValue>,
    decision_traces: Vec<DecisionTrace>,
}

impl SnapshotBuilder {
    pub(crate) fn new(build_id: Uuid) -> Self {
        Self {
            build_id,
            resolved_values: Vec::new(),
            decision_traces: Vec::new(),
        }
    }

    /// Record a value; a later value for the same key replaces the earlier one in place.
    pub(crate) fn record(&mut self, value: ResolvedValue) {
        match self.resolved_values.iter_mut().find(|v| v.key == value.key) {
            Some(existing) => *existing = value,
            None => self.resolved_values.push(value),
        }
    }

    pub(crate) fn trace(&mut self, trace: DecisionTrace) {
        self.decision_traces.push(trace);
    }

    pub(crate) fn resolved_count(&self) -> usize {
        self.resolved_values.len()
    }

    pub(crate) fn freeze(self, diagnostics: DiagnosticsReport) -> Snapshot {
        Snapshot {
            build_id: self.build_id,
            resolved_values: self.resolved_values,
            decision_traces: self.decision_traces,
            timestamp: Utc::now(),
            diagnostics,
        }
    }
}
