//! Structured observability hooks for configuration builds.
//!
//! This module provides:
//! - Build-scoped tracing spans via the `BuildSpan` RAII guard
//! - Emission functions for build lifecycle events
//!
//! Values and messages are redacted before they reach a log line.
//! Filtering is controlled by `SPECCONFIG_LOG` (see [`crate::telemetry`]).

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::redaction::redact;
use crate::snapshot::Provenance;

/// RAII guard that enters a build-scoped span for the duration of a build.
///
/// # Example
///
/// ```ignore
/// let _span = BuildSpan::enter(build_id);
/// // every event below carries build_id
/// ```
pub struct BuildSpan {
    _span: tracing::span::EnteredSpan,
}

impl BuildSpan {
    pub fn enter(build_id: Uuid) -> Self {
        let span = tracing::info_span!("specconfig.build", build_id = %build_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_build_started(bindings: usize, decisions: usize, mode: &str) {
    info!(
        event = "build.started",
        bindings = bindings,
        decisions = decisions,
        mode = %mode,
    );
}

/// Emit event: a binding wrote its field.
pub fn emit_binding_resolved(key: &str, value: &str, is_secret: bool, provenance: &Provenance) {
    debug!(
        event = "binding.resolved",
        key = %key,
        value = %redact(value, is_secret),
        provenance = %provenance,
    );
}

/// Emit event: a binding failed (warning level).
pub fn emit_binding_failed(key: &str, message: &str, is_secret: bool) {
    warn!(
        event = "binding.failed",
        key = %key,
        message = %redact(message, is_secret),
    );
}

pub fn emit_decision_applied(key: &str, matched_index: usize, decision_name: &str) {
    debug!(
        event = "decision.applied",
        key = %key,
        matched_index = matched_index,
        decision = %decision_name,
    );
}

pub fn emit_decision_unmatched(key: &str) {
    warn!(event = "decision.unmatched", key = %key);
}

/// Emit event: finalize or a final specification failed (warning level).
pub fn emit_finalize_failed(message: &str) {
    warn!(event = "build.finalize_failed", message = %message);
}

/// Emit event: build finished with outcome, counts and duration.
pub fn emit_build_finished(success: bool, resolved: usize, errors: usize, warnings: usize, duration_ms: u64) {
    info!(
        event = "build.finished",
        success = success,
        resolved = resolved,
        errors = errors,
        warnings = warnings,
        duration_ms = duration_ms,
    );
}
