//! Specification metadata and the predicate wrappers that carry it.
//!
//! Every predicate a profile declares (value specs, contextual specs, final
//! specs, decisions) travels with a [`SpecMetadata`] so that a failure can be
//! explained by name without exposing the value that failed.

use serde::{Deserialize, Serialize};

use crate::context::{ContextProvider, EvaluationContext};

/// Human-readable metadata describing a specification for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecMetadata {
    /// Optional description for display.
    pub description: Option<String>,
    /// Stable type name used when no description is available.
    pub type_name: String,
}

impl SpecMetadata {
    pub fn new(description: Option<String>, type_name: impl Into<String>) -> Self {
        Self {
            description,
            type_name: type_name.into(),
        }
    }

    /// Preferred display name: trimmed description, falling back to the type name.
    pub fn display_name(&self) -> &str {
        match self.description.as_deref().map(str::trim) {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => self.type_name.as_str(),
        }
    }
}

/// A predicate over candidate values.
pub trait Specification<T: ?Sized> {
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// Description surfaced in diagnostics, if the specification has one.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Closure-backed specification with an optional description.
pub struct PredicateSpec<T> {
    description: Option<String>,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> PredicateSpec<T> {
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            description: Some(description.into()),
            predicate: Box::new(predicate),
        }
    }

    pub fn anonymous<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            description: None,
            predicate: Box::new(predicate),
        }
    }
}

impl<T> Specification<T> for PredicateSpec<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A type-erased specification paired with its metadata.
pub struct SpecEntry<T> {
    spec: Box<dyn Specification<T> + Send + Sync>,
    metadata: SpecMetadata,
}

impl<T: 'static> SpecEntry<T> {
    /// Wrap a concrete specification, deriving metadata from it.
    pub fn new<S>(spec: S) -> Self
    where
        S: Specification<T> + Send + Sync + 'static,
    {
        let metadata = SpecMetadata::new(
            spec.description().map(str::to_owned),
            short_type_name::<S>(),
        );
        Self {
            spec: Box::new(spec),
            metadata,
        }
    }

    /// Shorthand for a described [`PredicateSpec`].
    pub fn predicate<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(PredicateSpec::new(description, predicate))
    }

    /// Override the description reported in diagnostics.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }
}

impl<T> SpecEntry<T> {
    pub fn metadata(&self) -> &SpecMetadata {
        &self.metadata
    }

    pub fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.spec.is_satisfied_by(candidate)
    }
}

impl<T> std::fmt::Debug for SpecEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecEntry")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Specification evaluated against the current [`EvaluationContext`] and a candidate.
pub struct ContextualSpecEntry<T> {
    predicate: Box<dyn Fn(&EvaluationContext, &T) -> bool + Send + Sync>,
    metadata: SpecMetadata,
}

impl<T> ContextualSpecEntry<T> {
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&EvaluationContext, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            metadata: SpecMetadata::new(Some(description.into()), "ContextualSpecEntry"),
        }
    }

    pub fn anonymous<F>(predicate: F) -> Self
    where
        F: Fn(&EvaluationContext, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            metadata: SpecMetadata::new(None, "ContextualSpecEntry"),
        }
    }

    pub fn metadata(&self) -> &SpecMetadata {
        &self.metadata
    }

    /// Evaluate with a fresh context snapshot taken from `provider`.
    pub fn is_satisfied_by(&self, candidate: &T, provider: &dyn ContextProvider) -> bool {
        (self.predicate)(&provider.current_context(), candidate)
    }
}

impl<T> std::fmt::Debug for ContextualSpecEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualSpecEntry")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// `std::any::type_name` with module paths stripped from every segment.
///
/// `specconfig_core::metadata::PredicateSpec<alloc::string::String>` becomes
/// `PredicateSpec<String>`.
pub fn short_type_name<T: ?Sized>() -> String {
    shorten_type_path(std::any::type_name::<T>())
}

fn shorten_type_path(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}
