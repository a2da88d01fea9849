//! Build orchestration with diagnostics and snapshots.
//!
//! [`ConfigPipeline::build`] applies every binding of a profile, then every
//! decision binding, then finalizes and validates. It never returns an error
//! or panics on bad configuration: every failure becomes a diagnostic in the
//! returned [`BuildResult`], next to a snapshot of what was resolved.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::context::ContextProvider;
use crate::decision::DecisionResolution;
use crate::diagnostics::DiagnosticsReport;
use crate::error::ConfigError;
use crate::obs::{
    emit_binding_failed, emit_binding_resolved, emit_build_finished, emit_build_started,
    emit_decision_applied, emit_decision_unmatched, emit_finalize_failed, BuildSpan,
};
use crate::profile::SpecProfile;
use crate::provenance::ProvenanceReporter;
use crate::reader::ConfigReader;
use crate::snapshot::{Provenance, ResolvedValue, Snapshot, SnapshotBuilder};

/// What to do when a binding fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandlingMode {
    /// Apply every binding and report all failures.
    #[default]
    CollectAll,
    /// Stop at the first failure.
    FailFast,
}

impl ErrorHandlingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorHandlingMode::CollectAll => "collect_all",
            ErrorHandlingMode::FailFast => "fail_fast",
        }
    }
}

/// Per-call collaborators for a build. All lifecycles belong to the caller.
#[derive(Clone, Default)]
pub struct BuildOptions {
    pub error_handling: ErrorHandlingMode,
    /// Consulted after each binding to refine provenance.
    pub provenance_reporter: Option<Arc<ProvenanceReporter>>,
    /// Required when the profile declares contextual specifications.
    pub context_provider: Option<Arc<dyn ContextProvider>>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_handling(mut self, mode: ErrorHandlingMode) -> Self {
        self.error_handling = mode;
        self
    }

    pub fn with_provenance_reporter(mut self, reporter: Arc<ProvenanceReporter>) -> Self {
        self.provenance_reporter = Some(reporter);
        self
    }

    pub fn with_context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("error_handling", &self.error_handling)
            .field("provenance_reporter", &self.provenance_reporter.is_some())
            .field("context_provider", &self.context_provider.is_some())
            .finish()
    }
}

/// Outcome of a pipeline run. Both arms carry a snapshot.
#[derive(Debug)]
pub enum BuildResult<F> {
    Success { final_value: F, snapshot: Snapshot },
    Failure { diagnostics: DiagnosticsReport, snapshot: Snapshot },
}

impl<F> BuildResult<F> {
    /// Diagnostics of the run; on success only non-fatal items remain.
    pub fn diagnostics(&self) -> &DiagnosticsReport {
        match self {
            BuildResult::Success { snapshot, .. } => snapshot.diagnostics(),
            BuildResult::Failure { diagnostics, .. } => diagnostics,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        match self {
            BuildResult::Success { snapshot, .. } | BuildResult::Failure { snapshot, .. } => snapshot,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success { .. })
    }

    pub fn final_value(&self) -> Option<&F> {
        match self {
            BuildResult::Success { final_value, .. } => Some(final_value),
            BuildResult::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<(F, Snapshot), (DiagnosticsReport, Snapshot)> {
        match self {
            BuildResult::Success { final_value, snapshot } => Ok((final_value, snapshot)),
            BuildResult::Failure { diagnostics, snapshot } => Err((diagnostics, snapshot)),
        }
    }
}

/// Mutable state of one run.
struct Run {
    started: Instant,
    diagnostics: DiagnosticsReport,
    snapshot: SnapshotBuilder,
}

impl Run {
    fn fail<F>(self) -> BuildResult<F> {
        self.finished(false);
        BuildResult::Failure {
            snapshot: self.snapshot.freeze(self.diagnostics.clone()),
            diagnostics: self.diagnostics,
        }
    }

    fn succeed<F>(self, final_value: F) -> BuildResult<F> {
        self.finished(true);
        BuildResult::Success {
            final_value,
            snapshot: self.snapshot.freeze(self.diagnostics),
        }
    }

    fn finished(&self, success: bool) {
        emit_build_finished(
            success,
            self.snapshot.resolved_count(),
            self.diagnostics.error_count(),
            self.diagnostics.warning_count(),
            self.started.elapsed().as_millis() as u64,
        );
    }
}

pub struct ConfigPipeline;

impl ConfigPipeline {
    pub fn build<D, F>(
        profile: &SpecProfile<D, F>,
        reader: &dyn ConfigReader,
        options: &BuildOptions,
    ) -> BuildResult<F> {
        let build_id = Uuid::new_v4();
        let _span = BuildSpan::enter(build_id);
        let fail_fast = options.error_handling == ErrorHandlingMode::FailFast;
        let context = options.context_provider.as_deref();

        emit_build_started(
            profile.bindings().len(),
            profile.decisions().len(),
            options.error_handling.as_str(),
        );

        let mut run = Run {
            started: Instant::now(),
            diagnostics: DiagnosticsReport::new(),
            snapshot: SnapshotBuilder::new(build_id),
        };
        let mut draft = profile.make_draft();

        for binding in profile.bindings() {
            let key = binding.key();
            match binding.apply(&mut draft, reader, context) {
                Ok(outcome) => {
                    let Some(value) = outcome.stringified else {
                        continue;
                    };
                    let provenance = if outcome.used_default {
                        Provenance::DefaultValue
                    } else {
                        options
                            .provenance_reporter
                            .as_ref()
                            .and_then(|reporter| reporter.provenance(key))
                            .unwrap_or(Provenance::Unknown)
                    };
                    emit_binding_resolved(key, &value, binding.is_secret(), &provenance);
                    run.snapshot
                        .record(ResolvedValue::new(key, value, provenance, binding.is_secret()));
                }
                Err(err) => {
                    let item = err.to_diagnostic(binding.is_secret());
                    emit_binding_failed(key, item.message(), item.is_message_secret());
                    run.diagnostics.add(item);
                    if fail_fast {
                        return run.fail();
                    }
                }
            }
        }

        for decision in profile.decisions() {
            let key = decision.key();
            match decision.apply(&mut draft) {
                DecisionResolution::Skipped => {}
                DecisionResolution::Applied { trace, stringified } => {
                    emit_decision_applied(key, trace.matched_index, &trace.decision_name);
                    run.snapshot.record(ResolvedValue::new(
                        key,
                        stringified,
                        Provenance::DecisionFallback,
                        decision.is_secret(),
                    ));
                    run.snapshot.trace(trace);
                }
                DecisionResolution::NoMatch => {
                    emit_decision_unmatched(key);
                    run.diagnostics.add(
                        ConfigError::DecisionFallbackFailed {
                            key: key.to_string(),
                        }
                        .to_diagnostic(false),
                    );
                    if fail_fast {
                        return run.fail();
                    }
                }
            }
        }

        if run.diagnostics.has_errors() {
            info!(errors = run.diagnostics.error_count(), "skipping finalize");
            return run.fail();
        }

        match profile.finalize_draft(draft, context) {
            Ok(final_value) => run.succeed(final_value),
            Err(err) => {
                let item = err.to_diagnostic(false);
                emit_finalize_failed(item.display_message());
                run.diagnostics.add(item);
                run.fail()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_handling_mode_default_and_serde() {
        assert_eq!(ErrorHandlingMode::default(), ErrorHandlingMode::CollectAll);
        assert_eq!(serde_json::to_string(&ErrorHandlingMode::FailFast).unwrap(), "\"fail_fast\"");
        let mode: ErrorHandlingMode = serde_json::from_str("\"collect_all\"").unwrap();
        assert_eq!(mode, ErrorHandlingMode::CollectAll);
        assert_eq!(ErrorHandlingMode::FailFast.as_str(), "fail_fast");
    }

    #[test]
    fn test_build_options_builder() {
        let options = BuildOptions::new()
            .with_error_handling(ErrorHandlingMode::FailFast)
            .with_provenance_reporter(Arc::new(ProvenanceReporter::new()));
        assert_eq!(options.error_handling, ErrorHandlingMode::FailFast);
        assert!(options.provenance_reporter.is_some());
        assert!(options.context_provider.is_none());
        assert_eq!(
            format!("{:?}", options),
            "BuildOptions { error_handling: FailFast, provenance_reporter: true, context_provider: false }"
        );
    }

    #[test]
    fn test_build_result_accessors() {
        let snapshot = Snapshot::new(vec![], vec![], DiagnosticsReport::new());
        let ok: BuildResult<u8> = BuildResult::Success {
            final_value: 7,
            snapshot,
        };
        assert!(ok.is_success());
        assert_eq!(ok.final_value(), Some(&7));
        assert!(ok.diagnostics().is_empty());
        let (value, _) = ok.into_result().unwrap();
        assert_eq!(value, 7);
    }
}
