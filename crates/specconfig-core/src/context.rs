//! Evaluation context for context-aware specifications.
//!
//! The context is produced on demand by a caller-owned [`ContextProvider`] and
//! handed to each contextual predicate. The core never keeps context state of
//! its own.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time environment state seen by contextual predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub current_date: DateTime<Utc>,
    pub launch_date: DateTime<Utc>,
    pub user_data: BTreeMap<String, serde_json::Value>,
    pub counters: BTreeMap<String, i64>,
    pub events: BTreeMap<String, DateTime<Utc>>,
    pub flags: BTreeMap<String, bool>,
    pub segments: BTreeSet<String>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            current_date: now,
            launch_date: now,
            user_data: BTreeMap::new(),
            counters: BTreeMap::new(),
            events: BTreeMap::new(),
            flags: BTreeMap::new(),
            segments: BTreeSet::new(),
        }
    }
}

impl EvaluationContext {
    /// Flag value; unknown flags read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Counter value; unknown counters read as `0`.
    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn event(&self, name: &str) -> Option<DateTime<Utc>> {
        self.events.get(name).copied()
    }

    pub fn in_segment(&self, segment: &str) -> bool {
        self.segments.contains(segment)
    }

    pub fn with_current_date(mut self, date: DateTime<Utc>) -> Self {
        self.current_date = date;
        self
    }

    pub fn with_launch_date(mut self, date: DateTime<Utc>) -> Self {
        self.launch_date = date;
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_counter(mut self, name: impl Into<String>, value: i64) -> Self {
        self.counters.insert(name.into(), value);
        self
    }

    pub fn with_event(mut self, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.events.insert(name.into(), at);
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.insert(segment.into());
        self
    }

    pub fn with_user_data(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.user_data.insert(name.into(), value);
        self
    }
}

/// Supplies the current [`EvaluationContext`].
///
/// Called once per contextual predicate evaluation, so implementations may
/// return fresh state (clock, counters) on every call.
pub trait ContextProvider: Send + Sync {
    fn current_context(&self) -> EvaluationContext;
}

/// Provider that always returns the same context. Useful for tests and
/// one-shot command-line runs.
#[derive(Debug, Clone)]
pub struct StaticContextProvider {
    context: EvaluationContext,
}

impl StaticContextProvider {
    pub fn new(context: EvaluationContext) -> Self {
        Self { context }
    }
}

impl ContextProvider for StaticContextProvider {
    fn current_context(&self) -> EvaluationContext {
        self.context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unknown_flags_and_counters_default() {
        let ctx = EvaluationContext::default();
        assert!(!ctx.flag("nightTime"));
        assert_eq!(ctx.counter("reloadCount"), 0);
        assert!(ctx.event("launched").is_none());
        assert!(!ctx.in_segment("beta"));
    }

    #[test]
    fn test_builder_sets_values() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let ctx = EvaluationContext::default()
            .with_current_date(at)
            .with_flag("nightTime", true)
            .with_counter("reloadCount", 3)
            .with_event("launched", at)
            .with_segment("beta")
            .with_user_data("owner", serde_json::json!("sam"));

        assert_eq!(ctx.current_date, at);
        assert!(ctx.flag("nightTime"));
        assert_eq!(ctx.counter("reloadCount"), 3);
        assert_eq!(ctx.event("launched"), Some(at));
        assert!(ctx.in_segment("beta"));
        assert_eq!(ctx.user_data["owner"], serde_json::json!("sam"));
    }

    #[test]
    fn test_static_provider_returns_same_context() {
        let ctx = EvaluationContext::default().with_flag("featureEnabled", true);
        let provider = StaticContextProvider::new(ctx.clone());
        assert_eq!(provider.current_context(), ctx);
        assert_eq!(provider.current_context(), ctx);
    }
}
