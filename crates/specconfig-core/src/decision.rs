//! Decision bindings: ordered fallbacks that derive a field from the rest of
//! the draft when no binding set it.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::binding::FieldRef;
use crate::metadata::{short_type_name, SpecMetadata};

/// Which decision resolved a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTrace {
    pub key: String,
    /// Position of the matched decision in declaration order.
    pub matched_index: usize,
    pub decision_name: String,
    pub decision_type: String,
}

/// A reusable decision over a draft.
pub trait DecisionSpec<D, V>: Send + Sync {
    fn decide(&self, draft: &D) -> Option<V>;

    fn description(&self) -> Option<&str> {
        None
    }
}

/// One ordered fallback: returns a value when it matches.
pub struct DecisionEntry<D, V> {
    decide: Box<dyn Fn(&D) -> Option<V> + Send + Sync>,
    metadata: SpecMetadata,
}

impl<D: 'static, V: 'static> DecisionEntry<D, V> {
    pub fn new<F>(description: impl Into<String>, decide: F) -> Self
    where
        F: Fn(&D) -> Option<V> + Send + Sync + 'static,
    {
        Self {
            decide: Box::new(decide),
            metadata: SpecMetadata::new(Some(description.into()), "DecisionEntry"),
        }
    }

    /// Yield `result` whenever `predicate` holds.
    pub fn when<P>(description: impl Into<String>, predicate: P, result: V) -> Self
    where
        P: Fn(&D) -> bool + Send + Sync + 'static,
        V: Clone + Send + Sync,
    {
        Self::new(description, move |draft: &D| predicate(draft).then(|| result.clone()))
    }

    pub fn from_spec<S>(spec: S) -> Self
    where
        S: DecisionSpec<D, V> + 'static,
    {
        let metadata = SpecMetadata::new(spec.description().map(str::to_owned), short_type_name::<S>());
        Self {
            decide: Box::new(move |draft: &D| spec.decide(draft)),
            metadata,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }
}

impl<D, V> DecisionEntry<D, V> {
    pub fn metadata(&self) -> &SpecMetadata {
        &self.metadata
    }

    pub fn decide(&self, draft: &D) -> Option<V> {
        (self.decide)(draft)
    }
}

/// Outcome of applying a decision binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionResolution {
    /// The field was already set.
    Skipped,
    Applied { trace: DecisionTrace, stringified: String },
    NoMatch,
}

/// Derives `key` from other draft fields; only runs when the field is unset.
pub struct DecisionBinding<D, V> {
    key: String,
    field: FieldRef<D, V>,
    decisions: Vec<DecisionEntry<D, V>>,
    is_secret: bool,
}

impl<D, V> DecisionBinding<D, V>
where
    V: Display + Send + Sync + 'static,
{
    pub fn new(key: impl Into<String>, field: FieldRef<D, V>) -> Self {
        Self {
            key: key.into(),
            field,
            decisions: Vec::new(),
            is_secret: false,
        }
    }

    pub fn with_decision(mut self, decision: DecisionEntry<D, V>) -> Self {
        self.decisions.push(decision);
        self
    }

    pub fn secret(mut self) -> Self {
        self.is_secret = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_secret(&self) -> bool {
        self.is_secret
    }

    /// First matching decision wins; later ones are not evaluated.
    pub fn apply(&self, draft: &mut D) -> DecisionResolution {
        if (self.field)(draft).is_some() {
            return DecisionResolution::Skipped;
        }

        for (index, decision) in self.decisions.iter().enumerate() {
            if let Some(value) = decision.decide(draft) {
                let stringified = value.to_string();
                *(self.field)(draft) = Some(value);
                let metadata = decision.metadata();
                return DecisionResolution::Applied {
                    trace: DecisionTrace {
                        key: self.key.clone(),
                        matched_index: index,
                        decision_name: metadata.display_name().to_string(),
                        decision_type: metadata.type_name.clone(),
                    },
                    stringified,
                };
            }
        }
        DecisionResolution::NoMatch
    }
}

trait ErasedDecision<D>: Send + Sync {
    fn key(&self) -> &str;
    fn is_secret(&self) -> bool;
    fn apply(&self, draft: &mut D) -> DecisionResolution;
}

impl<D, V> ErasedDecision<D> for DecisionBinding<D, V>
where
    V: Display + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        DecisionBinding::key(self)
    }

    fn is_secret(&self) -> bool {
        DecisionBinding::is_secret(self)
    }

    fn apply(&self, draft: &mut D) -> DecisionResolution {
        DecisionBinding::apply(self, draft)
    }
}

/// Decision binding with its value type erased.
pub struct AnyDecisionBinding<D> {
    inner: Box<dyn ErasedDecision<D>>,
}

impl<D: 'static> AnyDecisionBinding<D> {
    pub fn new<V>(binding: DecisionBinding<D, V>) -> Self
    where
        V: Display + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(binding),
        }
    }
}

impl<D> AnyDecisionBinding<D> {
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn is_secret(&self) -> bool {
        self.inner.is_secret()
    }

    pub fn apply(&self, draft: &mut D) -> DecisionResolution {
        self.inner.apply(draft)
    }
}

impl<D: 'static, V> From<DecisionBinding<D, V>> for AnyDecisionBinding<D>
where
    V: Display + Send + Sync + 'static,
{
    fn from(binding: DecisionBinding<D, V>) -> Self {
        Self::new(binding)
    }
}

impl<D> std::fmt::Debug for AnyDecisionBinding<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyDecisionBinding")
            .field("key", &self.key())
            .field("is_secret", &self.is_secret())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Draft {
        name: Option<String>,
        sleeping: Option<bool>,
    }

    struct SleepyName;

    impl DecisionSpec<Draft, String> for SleepyName {
        fn decide(&self, draft: &Draft) -> Option<String> {
            (draft.sleeping == Some(true)).then(|| "Sleepy".to_string())
        }
    }

    fn name_decision() -> DecisionBinding<Draft, String> {
        DecisionBinding::new("pet.name", |d: &mut Draft| &mut d.name)
            .with_decision(DecisionEntry::when(
                "Sleeping pets are Sleepy",
                |d: &Draft| d.sleeping == Some(true),
                "Sleepy".to_string(),
            ))
            .with_decision(DecisionEntry::new("Awake fallback", |d: &Draft| {
                d.sleeping.map(|_| "Buddy".to_string())
            }))
    }

    #[test]
    fn test_first_match_wins() {
        let mut draft = Draft {
            name: None,
            sleeping: Some(true),
        };
        match name_decision().apply(&mut draft) {
            DecisionResolution::Applied { trace, stringified } => {
                assert_eq!(stringified, "Sleepy");
                assert_eq!(trace.matched_index, 0);
                assert_eq!(trace.decision_name, "Sleeping pets are Sleepy");
                assert_eq!(trace.decision_type, "DecisionEntry");
                assert_eq!(trace.key, "pet.name");
            }
            other => panic!("expected applied, got {:?}", other),
        }
        assert_eq!(draft.name.as_deref(), Some("Sleepy"));
    }

    #[test]
    fn test_later_decision_matches() {
        let mut draft = Draft {
            name: None,
            sleeping: Some(false),
        };
        let resolution = name_decision().apply(&mut draft);
        assert!(matches!(
            resolution,
            DecisionResolution::Applied { ref trace, .. } if trace.matched_index == 1
        ));
        assert_eq!(draft.name.as_deref(), Some("Buddy"));
    }

    #[test]
    fn test_set_field_is_skipped_without_evaluating() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let binding = DecisionBinding::new("pet.name", |d: &mut Draft| &mut d.name).with_decision(
            DecisionEntry::new("counting", move |_: &Draft| {
                counter.fetch_add(1, Ordering::SeqCst);
                Some("X".to_string())
            }),
        );
        let mut draft = Draft {
            name: Some(String::new()),
            sleeping: None,
        };

        assert_eq!(binding.apply(&mut draft), DecisionResolution::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(draft.name.as_deref(), Some(""));
    }

    #[test]
    fn test_no_match_leaves_field_unset() {
        let mut draft = Draft::default();
        assert_eq!(name_decision().apply(&mut draft), DecisionResolution::NoMatch);
        assert!(draft.name.is_none());
    }

    #[test]
    fn test_spec_backed_entry_metadata() {
        let entry = DecisionEntry::from_spec(SleepyName);
        assert_eq!(entry.metadata().type_name, "SleepyName");
        assert_eq!(entry.metadata().display_name(), "SleepyName");

        let described = DecisionEntry::from_spec(SleepyName).with_description("Sleepy default");
        assert_eq!(described.metadata().display_name(), "Sleepy default");
    }

    #[test]
    fn test_any_decision_binding() {
        let erased: AnyDecisionBinding<Draft> = name_decision().secret().into();
        assert_eq!(erased.key(), "pet.name");
        assert!(erased.is_secret());

        let mut draft = Draft {
            name: None,
            sleeping: Some(true),
        };
        assert!(matches!(erased.apply(&mut draft), DecisionResolution::Applied { .. }));
    }
}
