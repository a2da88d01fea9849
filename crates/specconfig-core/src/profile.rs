//! A profile declares everything needed to build one configuration type:
//! the draft factory, field bindings, decision bindings, the finalize step
//! and whole-value specifications.
//!
//! [`ConfigPipeline`](crate::pipeline::ConfigPipeline) runs a profile with
//! full diagnostics. The methods here are the strict path: they stop at the
//! first [`ConfigError`].

use std::fmt::Display;

use crate::binding::{AnyBinding, Binding};
use crate::context::ContextProvider;
use crate::decision::{AnyDecisionBinding, DecisionBinding, DecisionResolution};
use crate::error::{ConfigError, Result};
use crate::metadata::{ContextualSpecEntry, SpecEntry};
use crate::reader::ConfigReader;

type Finalize<D, F> = Box<dyn Fn(D) -> anyhow::Result<F> + Send + Sync>;

pub struct SpecProfile<D, F> {
    make_draft: Box<dyn Fn() -> D + Send + Sync>,
    bindings: Vec<AnyBinding<D>>,
    decisions: Vec<AnyDecisionBinding<D>>,
    finalize: Finalize<D, F>,
    final_specs: Vec<SpecEntry<F>>,
    contextual_final_specs: Vec<ContextualSpecEntry<F>>,
}

impl<D: 'static, F: 'static> SpecProfile<D, F> {
    /// Profile whose drafts start from `D::default()`.
    pub fn new<Fin>(finalize: Fin) -> Self
    where
        D: Default,
        Fin: Fn(D) -> anyhow::Result<F> + Send + Sync + 'static,
    {
        Self::with_draft(D::default, finalize)
    }

    pub fn with_draft<M, Fin>(make_draft: M, finalize: Fin) -> Self
    where
        M: Fn() -> D + Send + Sync + 'static,
        Fin: Fn(D) -> anyhow::Result<F> + Send + Sync + 'static,
    {
        Self {
            make_draft: Box::new(make_draft),
            bindings: Vec::new(),
            decisions: Vec::new(),
            finalize: Box::new(finalize),
            final_specs: Vec::new(),
            contextual_final_specs: Vec::new(),
        }
    }

    pub fn binding<V>(mut self, binding: Binding<D, V>) -> Self
    where
        V: Display + Clone + Send + Sync + 'static,
    {
        self.bindings.push(AnyBinding::new(binding));
        self
    }

    pub fn decision<V>(mut self, binding: DecisionBinding<D, V>) -> Self
    where
        V: Display + Send + Sync + 'static,
    {
        self.decisions.push(AnyDecisionBinding::new(binding));
        self
    }

    pub fn final_spec(mut self, spec: SpecEntry<F>) -> Self {
        self.final_specs.push(spec);
        self
    }

    pub fn contextual_final_spec(mut self, spec: ContextualSpecEntry<F>) -> Self {
        self.contextual_final_specs.push(spec);
        self
    }
}

impl<D, F> SpecProfile<D, F> {
    pub fn make_draft(&self) -> D {
        (self.make_draft)()
    }

    pub fn bindings(&self) -> &[AnyBinding<D>] {
        &self.bindings
    }

    pub fn decisions(&self) -> &[AnyDecisionBinding<D>] {
        &self.decisions
    }

    pub fn apply_bindings(
        &self,
        draft: &mut D,
        reader: &dyn ConfigReader,
        context: Option<&dyn ContextProvider>,
    ) -> Result<()> {
        for binding in &self.bindings {
            binding.apply(draft, reader, context)?;
        }
        Ok(())
    }

    pub fn apply_decisions(&self, draft: &mut D) -> Result<()> {
        for decision in &self.decisions {
            if decision.apply(draft) == DecisionResolution::NoMatch {
                return Err(ConfigError::DecisionFallbackFailed {
                    key: decision.key().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run the finalize step, then every final specification.
    pub fn finalize_draft(&self, draft: D, context: Option<&dyn ContextProvider>) -> Result<F> {
        let final_value = (self.finalize)(draft).map_err(finalization_error)?;
        self.validate(&final_value, context)?;
        Ok(final_value)
    }

    pub fn build(&self, reader: &dyn ConfigReader, context: Option<&dyn ContextProvider>) -> Result<F> {
        let mut draft = self.make_draft();
        self.apply_bindings(&mut draft, reader, context)?;
        self.apply_decisions(&mut draft)?;
        self.finalize_draft(draft, context)
    }

    fn validate(&self, final_value: &F, context: Option<&dyn ContextProvider>) -> Result<()> {
        if let Some(failed) = self.final_specs.iter().find(|spec| !spec.is_satisfied_by(final_value)) {
            return Err(ConfigError::FinalSpecFailed {
                spec: failed.metadata().clone(),
            });
        }

        let Some(first) = self.contextual_final_specs.first() else {
            return Ok(());
        };
        let provider = context.ok_or_else(|| ConfigError::ContextProviderMissing {
            key: None,
            spec: first.metadata().clone(),
        })?;
        match self
            .contextual_final_specs
            .iter()
            .find(|spec| !spec.is_satisfied_by(final_value, provider))
        {
            Some(failed) => Err(ConfigError::FinalSpecFailed {
                spec: failed.metadata().clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<D, F> std::fmt::Debug for SpecProfile<D, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecProfile")
            .field("bindings", &self.bindings)
            .field("decisions", &self.decisions)
            .field("final_specs", &self.final_specs)
            .field("contextual_final_specs", &self.contextual_final_specs)
            .finish_non_exhaustive()
    }
}

/// Finalize failures stay keyless; a final-spec failure raised from inside
/// a finalize closure keeps its spec metadata.
fn finalization_error(err: anyhow::Error) -> ConfigError {
    match err.downcast::<ConfigError>() {
        Ok(spec_failure @ ConfigError::FinalSpecFailed { .. }) => spec_failure,
        Ok(other) => ConfigError::Finalization(anyhow::Error::new(other)),
        Err(err) => ConfigError::Finalization(err),
    }
}

/// Unwrap a draft field inside a finalize closure.
///
/// ```ignore
/// let name = required(draft.name, "pet.name")?;
/// ```
pub fn required<V>(value: Option<V>, key: &str) -> anyhow::Result<V> {
    value.ok_or_else(|| {
        ConfigError::MissingRequiredValue {
            key: key.to_string(),
        }
        .into()
    })
}
