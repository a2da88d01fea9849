//! Error taxonomy for reading and binding configuration.
//!
//! [`ReadError`] is what a reader or decoder reports for a single key.
//! [`ConfigError`] covers every way a build can fail; the pipeline turns each
//! one into a [`DiagnosticItem`] through [`ConfigError::to_diagnostic`].

use crate::diagnostics::{DiagnosticContextValue, DiagnosticItem};
use crate::metadata::SpecMetadata;

/// Failure looking up or decoding one key.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unsupported {kind} value at '{key}'")]
    Unsupported { key: String, kind: String },

    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Build failures. Every variant maps to exactly one diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: ReadError,
    },

    #[error("value for '{key}' failed specification {}", .spec.display_name())]
    SpecFailed { key: String, spec: SpecMetadata },

    #[error("no decision matched for '{key}'")]
    DecisionFallbackFailed { key: String },

    #[error("{0:#}")]
    Finalization(anyhow::Error),

    #[error("final value failed specification {}", .spec.display_name())]
    FinalSpecFailed { spec: SpecMetadata },

    #[error("context provider missing for specification {}", .spec.display_name())]
    ContextProviderMissing {
        key: Option<String>,
        spec: SpecMetadata,
    },

    #[error("missing required value for '{key}'")]
    MissingRequiredValue { key: String },
}

/// Result type for strict (first-error) profile operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

fn spec_context(item: DiagnosticItem, spec: &SpecMetadata) -> DiagnosticItem {
    item.with_context("spec", DiagnosticContextValue::new(spec.display_name()))
        .with_context("specType", DiagnosticContextValue::new(spec.type_name.clone()))
}

impl ConfigError {
    /// The key this error relates to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::Decode { key, .. }
            | ConfigError::SpecFailed { key, .. }
            | ConfigError::DecisionFallbackFailed { key }
            | ConfigError::MissingRequiredValue { key } => Some(key),
            ConfigError::ContextProviderMissing { key, .. } => key.as_deref(),
            ConfigError::Finalization(_) | ConfigError::FinalSpecFailed { .. } => None,
        }
    }

    /// Convert into an error-severity diagnostic.
    ///
    /// `is_secret` marks the message of decode and finalize failures as
    /// secret, since their text may embed the offending value.
    pub fn to_diagnostic(&self, is_secret: bool) -> DiagnosticItem {
        match self {
            ConfigError::Decode { key, .. } => {
                DiagnosticItem::error(format!("Binding application failed: {}", self))
                    .with_key(key.clone())
                    .with_secret_message(is_secret)
            }
            ConfigError::SpecFailed { key, spec } => spec_context(
                DiagnosticItem::error(format!("Value specification failed for key '{}'", key))
                    .with_key(key.clone()),
                spec,
            ),
            ConfigError::DecisionFallbackFailed { key } => {
                DiagnosticItem::error(format!("Decision fallback did not match for key '{}'", key))
                    .with_key(key.clone())
            }
            ConfigError::Finalization(err) => {
                DiagnosticItem::error(format!("Finalization failed: {:#}", err))
                    .with_secret_message(is_secret)
            }
            ConfigError::FinalSpecFailed { spec } => spec_context(
                DiagnosticItem::error("Post-finalization specification failed"),
                spec,
            ),
            ConfigError::ContextProviderMissing { key: Some(key), spec } => spec_context(
                DiagnosticItem::error(format!("Context provider missing for key '{}'", key))
                    .with_key(key.clone()),
                spec,
            ),
            ConfigError::ContextProviderMissing { key: None, spec } => spec_context(
                DiagnosticItem::error("Context provider missing for post-finalization specification"),
                spec,
            ),
            ConfigError::MissingRequiredValue { key } => {
                DiagnosticItem::error(format!("Missing required value for key '{}'", key))
                    .with_key(key.clone())
            }
        }
    }
}
