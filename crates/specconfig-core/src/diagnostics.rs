//! Diagnostics produced while building a configuration.
//!
//! A [`DiagnosticsReport`] stores items in insertion order but only ever
//! exposes them through [`DiagnosticsReport::ordered_items`], a total order
//! that depends on item content alone. Two reports holding the same items
//! compare equal and render identically regardless of how they were filled.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::redaction::redact;

/// Severity level for a diagnostic. Ordering: `Error < Warning < Info`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Blocks the build.
    Error,
    /// Potential issue, non-blocking.
    Warning,
    /// Audit or debugging information.
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context value attached to a diagnostic, with per-value redaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticContextValue {
    raw_value: String,
    is_secret: bool,
}

impl DiagnosticContextValue {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            is_secret: false,
        }
    }

    pub fn secret(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            is_secret: true,
        }
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn is_secret(&self) -> bool {
        self.is_secret
    }

    pub fn display_value(&self) -> &str {
        redact(&self.raw_value, self.is_secret)
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticItem {
    key: Option<String>,
    severity: Severity,
    message: String,
    is_message_secret: bool,
    context: BTreeMap<String, DiagnosticContextValue>,
}

impl DiagnosticItem {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            key: None,
            severity,
            message: message.into(),
            is_message_secret: false,
            context: BTreeMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Attach the configuration key this diagnostic relates to.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Mark the message itself as secret.
    pub fn with_secret_message(mut self, is_secret: bool) -> Self {
        self.is_message_secret = is_secret;
        self
    }

    pub fn with_context(mut self, name: impl Into<String>, value: DiagnosticContextValue) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Raw message, for programmatic inspection by the owner.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_message_secret(&self) -> bool {
        self.is_message_secret
    }

    pub fn context(&self) -> &BTreeMap<String, DiagnosticContextValue> {
        &self.context
    }

    pub fn display_message(&self) -> &str {
        redact(&self.message, self.is_message_secret)
    }

    /// `name=value` pairs joined by `, `, names sorted, values redacted.
    pub fn context_summary(&self) -> Option<String> {
        if self.context.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .context
            .iter()
            .map(|(name, value)| format!("{}={}", name, value.display_value()))
            .collect();
        Some(parts.join(", "))
    }

    /// Redacted message, optionally followed by the context summary in parentheses.
    pub fn formatted_description(&self, include_context: bool) -> String {
        match self.context_summary() {
            Some(summary) if include_context => format!("{} ({})", self.display_message(), summary),
            _ => self.display_message().to_string(),
        }
    }
}

/// Keys ascend; keyless items sort last.
fn compare_keys(lhs: Option<&str>, rhs: Option<&str>) -> Ordering {
    match (lhs, rhs) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Total order over diagnostics: key, severity, display message, context summary.
pub fn compare_items(lhs: &DiagnosticItem, rhs: &DiagnosticItem) -> Ordering {
    compare_keys(lhs.key(), rhs.key())
        .then_with(|| lhs.severity.cmp(&rhs.severity))
        .then_with(|| lhs.display_message().cmp(rhs.display_message()))
        .then_with(|| {
            lhs.context_summary()
                .unwrap_or_default()
                .cmp(&rhs.context_summary().unwrap_or_default())
        })
}

impl Serialize for DiagnosticItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct RedactedContext<'a>(&'a BTreeMap<String, DiagnosticContextValue>);

        impl Serialize for RedactedContext<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, value) in self.0 {
                    map.serialize_entry(name, value.display_value())?;
                }
                map.end()
            }
        }

        let mut item = serializer.serialize_struct("DiagnosticItem", 4)?;
        item.serialize_field("key", &self.key)?;
        item.serialize_field("severity", &self.severity)?;
        item.serialize_field("message", self.display_message())?;
        item.serialize_field("context", &RedactedContext(&self.context))?;
        item.end()
    }
}

/// Append-only multiset of diagnostics with a deterministic view.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsReport {
    items: Vec<DiagnosticItem>,
}

impl DiagnosticsReport {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_items(items: Vec<DiagnosticItem>) -> Self {
        Self { items }
    }

    pub fn add(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add a plain diagnostic built from its parts.
    pub fn add_message(&mut self, key: Option<&str>, severity: Severity, message: impl Into<String>) {
        let mut item = DiagnosticItem::new(severity, message);
        item.key = key.map(str::to_owned);
        self.add(item);
    }

    pub fn merge(&mut self, other: &DiagnosticsReport) {
        self.items.extend(other.items.iter().cloned());
    }

    /// All items in the deterministic order of [`compare_items`].
    pub fn ordered_items(&self) -> Vec<&DiagnosticItem> {
        let mut ordered: Vec<&DiagnosticItem> = self.items.iter().collect();
        ordered.sort_by(|a, b| compare_items(a, b));
        ordered
    }

    fn count_of(&self, severity: Severity) -> usize {
        self.items.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count_of(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_of(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count_of(Severity::Info)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One line per item, ordered: `[severity] key: description`.
    pub fn formatted_lines(&self) -> Vec<String> {
        self.ordered_items()
            .into_iter()
            .map(|item| match item.key() {
                Some(key) => format!("[{}] {}: {}", item.severity, key, item.formatted_description(true)),
                None => format!("[{}] {}", item.severity, item.formatted_description(true)),
            })
            .collect()
    }
}

impl PartialEq for DiagnosticsReport {
    fn eq(&self, other: &Self) -> bool {
        self.ordered_items() == other.ordered_items()
    }
}

impl Eq for DiagnosticsReport {}

impl Serialize for DiagnosticsReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut report = serializer.serialize_struct("DiagnosticsReport", 4)?;
        report.serialize_field("error_count", &self.error_count())?;
        report.serialize_field("warning_count", &self.warning_count())?;
        report.serialize_field("info_count", &self.info_count())?;
        report.serialize_field("items", &self.ordered_items())?;
        report.end()
    }
}
