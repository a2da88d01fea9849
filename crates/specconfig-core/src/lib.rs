//! SpecConfig Core Library
//!
//! Binds raw configuration lookups into typed drafts, validates them with
//! named specifications, and reports deterministic diagnostics plus a
//! provenance snapshot for every build.

pub mod binding;
pub mod context;
pub mod decision;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod obs;
pub mod pipeline;
pub mod profile;
pub mod provenance;
pub mod reader;
pub mod redaction;
pub mod snapshot;
pub mod telemetry;

pub use binding::{AnyBinding, Binding, BindingOutcome, FieldRef};
pub use context::{ContextProvider, EvaluationContext, StaticContextProvider};
pub use decision::{
    AnyDecisionBinding, DecisionBinding, DecisionEntry, DecisionResolution, DecisionSpec,
    DecisionTrace,
};
pub use diagnostics::{DiagnosticContextValue, DiagnosticItem, DiagnosticsReport, Severity};
pub use error::{ConfigError, ReadError, Result};
pub use loader::ConfigLoader;
pub use metadata::{ContextualSpecEntry, PredicateSpec, SpecEntry, SpecMetadata, Specification};
pub use pipeline::{BuildOptions, BuildResult, ConfigPipeline, ErrorHandlingMode};
pub use profile::{required, SpecProfile};
pub use provenance::ProvenanceReporter;
pub use reader::{
    decode, AccessEvent, AccessOutcome, AccessReporter, ConfigProvider, ConfigReader, ConfigValue,
    EnvironmentProvider, InMemoryProvider, JsonProvider, LayeredReader,
};
pub use redaction::{redact, REDACTION_MARKER};
pub use snapshot::{Provenance, ResolvedValue, Snapshot};

pub use obs::BuildSpan;
pub use telemetry::init_tracing;

/// SpecConfig version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
