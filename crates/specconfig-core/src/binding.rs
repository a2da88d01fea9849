//! Field bindings: one configuration key resolved into one draft field.

use std::fmt::Display;

use crate::context::ContextProvider;
use crate::error::{ConfigError, ReadError};
use crate::metadata::{ContextualSpecEntry, SpecEntry};
use crate::reader::ConfigReader;

/// Writable reference to one optional field of a draft.
///
/// A plain function pointer, so a binding can only ever address the field it
/// was built with: `|d: &mut PetDraft| &mut d.name`.
pub type FieldRef<D, V> = fn(&mut D) -> &mut Option<V>;

type Decoder<V> = Box<dyn Fn(&dyn ConfigReader, &str) -> Result<Option<V>, ReadError> + Send + Sync>;

/// Result of applying a binding that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOutcome {
    /// Display form of the written value; `None` when the field was left unset.
    pub stringified: Option<String>,
    pub used_default: bool,
}

impl BindingOutcome {
    fn unset() -> Self {
        Self {
            stringified: None,
            used_default: false,
        }
    }
}

/// Resolves `key` into a draft field of type `V`.
pub struct Binding<D, V> {
    key: String,
    field: FieldRef<D, V>,
    decode: Decoder<V>,
    default: Option<V>,
    value_specs: Vec<SpecEntry<V>>,
    contextual_specs: Vec<ContextualSpecEntry<V>>,
    is_secret: bool,
}

impl<D, V> Binding<D, V>
where
    V: Display + Clone + Send + Sync + 'static,
{
    pub fn new<F>(key: impl Into<String>, field: FieldRef<D, V>, decode: F) -> Self
    where
        F: Fn(&dyn ConfigReader, &str) -> Result<Option<V>, ReadError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            field,
            decode: Box::new(decode),
            default: None,
            value_specs: Vec::new(),
            contextual_specs: Vec::new(),
            is_secret: false,
        }
    }

    pub fn with_default(mut self, value: V) -> Self {
        self.default = Some(value);
        self
    }

    /// Append a value predicate; predicates run in the order added.
    pub fn with_spec(mut self, spec: SpecEntry<V>) -> Self {
        self.value_specs.push(spec);
        self
    }

    /// Append a predicate that also sees the current evaluation context.
    /// Contextual predicates run after all plain ones.
    pub fn with_contextual_spec(mut self, spec: ContextualSpecEntry<V>) -> Self {
        self.contextual_specs.push(spec);
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

    /// Decode, default, validate, then write the field.
    ///
    /// The field is written only when every predicate passes. A missing
    /// value with no default leaves the field untouched and is not an error.
    pub fn apply(
        &self,
        draft: &mut D,
        reader: &dyn ConfigReader,
        context: Option<&dyn ContextProvider>,
    ) -> Result<BindingOutcome, ConfigError> {
        let decoded = (self.decode)(reader, &self.key).map_err(|source| ConfigError::Decode {
            key: self.key.clone(),
            source,
        })?;

        let (value, used_default) = match (decoded, &self.default) {
            (Some(value), _) => (value, false),
            (None, Some(default)) => (default.clone(), true),
            (None, None) => return Ok(BindingOutcome::unset()),
        };

        if let Some(failed) = self.value_specs.iter().find(|spec| !spec.is_satisfied_by(&value)) {
            return Err(ConfigError::SpecFailed {
                key: self.key.clone(),
                spec: failed.metadata().clone(),
            });
        }

        if let Some(first) = self.contextual_specs.first() {
            let provider = context.ok_or_else(|| ConfigError::ContextProviderMissing {
                key: Some(self.key.clone()),
                spec: first.metadata().clone(),
            })?;
            if let Some(failed) = self
                .contextual_specs
                .iter()
                .find(|spec| !spec.is_satisfied_by(&value, provider))
            {
                return Err(ConfigError::SpecFailed {
                    key: self.key.clone(),
                    spec: failed.metadata().clone(),
                });
            }
        }

        let stringified = value.to_string();
        *(self.field)(draft) = Some(value);
        Ok(BindingOutcome {
            stringified: Some(stringified),
            used_default,
        })
    }
}

trait ErasedBinding<D>: Send + Sync {
    fn key(&self) -> &str;
    fn is_secret(&self) -> bool;
    fn apply(
        &self,
        draft: &mut D,
        reader: &dyn ConfigReader,
        context: Option<&dyn ContextProvider>,
    ) -> Result<BindingOutcome, ConfigError>;
}

impl<D, V> ErasedBinding<D> for Binding<D, V>
where
    V: Display + Clone + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        Binding::key(self)
    }

    fn is_secret(&self) -> bool {
        Binding::is_secret(self)
    }

    fn apply(
        &self,
        draft: &mut D,
        reader: &dyn ConfigReader,
        context: Option<&dyn ContextProvider>,
    ) -> Result<BindingOutcome, ConfigError> {
        Binding::apply(self, draft, reader, context)
    }
}

/// A binding with its value type erased, so bindings of different types can
/// share one ordered list.
pub struct AnyBinding<D> {
    inner: Box<dyn ErasedBinding<D>>,
}

impl<D: 'static> AnyBinding<D> {
    pub fn new<V>(binding: Binding<D, V>) -> Self
    where
        V: Display + Clone + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(binding),
        }
    }
}

impl<D> AnyBinding<D> {
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub fn is_secret(&self) -> bool {
        self.inner.is_secret()
    }

    pub fn apply(
        &self,
        draft: &mut D,
        reader: &dyn ConfigReader,
        context: Option<&dyn ContextProvider>,
    ) -> Result<BindingOutcome, ConfigError> {
        self.inner.apply(draft, reader, context)
    }
}

impl<D: 'static, V> From<Binding<D, V>> for AnyBinding<D>
where
    V: Display + Clone + Send + Sync + 'static,
{
    fn from(binding: Binding<D, V>) -> Self {
        Self::new(binding)
    }
}

impl<D> std::fmt::Debug for AnyBinding<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyBinding")
            .field("key", &self.key())
            .field("is_secret", &self.is_secret())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EvaluationContext, StaticContextProvider};
    use crate::reader::{decode, InMemoryProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Draft {
        name: Option<String>,
        port: Option<i64>,
        sleeping: Option<bool>,
    }

    fn name_binding() -> Binding<Draft, String> {
        Binding::new("pet.name", |d: &mut Draft| &mut d.name, decode::string)
    }

    #[test]
    fn test_decoded_value_is_written() {
        let reader = InMemoryProvider::new("m").with("pet.name", "Rex");
        let mut draft = Draft::default();

        let outcome = name_binding().apply(&mut draft, &reader, None).unwrap();
        assert_eq!(outcome.stringified.as_deref(), Some("Rex"));
        assert!(!outcome.used_default);
        assert_eq!(draft.name.as_deref(), Some("Rex"));
        assert!(draft.port.is_none());
    }

    #[test]
    fn test_default_used_when_missing() {
        let binding = Binding::new("pet.isSleeping", |d: &mut Draft| &mut d.sleeping, decode::bool)
            .with_default(false);
        let mut draft = Draft::default();

        let outcome = binding.apply(&mut draft, &InMemoryProvider::new("m"), None).unwrap();
        assert_eq!(outcome.stringified.as_deref(), Some("false"));
        assert!(outcome.used_default);
        assert_eq!(draft.sleeping, Some(false));
    }

    #[test]
    fn test_missing_without_default_leaves_field_unset() {
        let mut draft = Draft::default();
        let outcome = name_binding().apply(&mut draft, &InMemoryProvider::new("m"), None).unwrap();
        assert_eq!(outcome, BindingOutcome::unset());
        assert!(draft.name.is_none());
    }

    #[test]
    fn test_first_failing_spec_stops_evaluation() {
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = later_calls.clone();
        let binding = Binding::new("http.port", |d: &mut Draft| &mut d.port, decode::int)
            .with_spec(SpecEntry::predicate("Port > 0", |p: &i64| *p > 0))
            .with_spec(SpecEntry::predicate("Counted", move |_: &i64| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }));
        let reader = InMemoryProvider::new("m").with("http.port", -1);
        let mut draft = Draft::default();

        let err = binding.apply(&mut draft, &reader, None).unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::SpecFailed { key, spec } if key == "http.port" && spec.display_name() == "Port > 0"
        ));
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
        assert!(draft.port.is_none());
    }

    #[test]
    fn test_default_is_validated_too() {
        let binding = Binding::new("http.port", |d: &mut Draft| &mut d.port, decode::int)
            .with_default(0)
            .with_spec(SpecEntry::predicate("Port > 0", |p: &i64| *p > 0));
        let mut draft = Draft::default();
        assert!(binding.apply(&mut draft, &InMemoryProvider::new("m"), None).is_err());
    }

    #[test]
    fn test_decode_error_is_tagged_with_key() {
        let reader = InMemoryProvider::new("m").with("pet.name", 7);
        let mut draft = Draft::default();
        let err = name_binding().apply(&mut draft, &reader, None).unwrap_err();
        assert!(matches!(err, ConfigError::Decode { ref key, .. } if key == "pet.name"));
    }

    #[test]
    fn test_contextual_spec_requires_provider() {
        let binding = Binding::new("pet.isSleeping", |d: &mut Draft| &mut d.sleeping, decode::bool)
            .with_contextual_spec(ContextualSpecEntry::new("Pets sleep at night", |ctx, v: &bool| {
                ctx.flag("nightTime") == *v
            }));
        let reader = InMemoryProvider::new("m").with("pet.isSleeping", true);

        let mut draft = Draft::default();
        let err = binding.apply(&mut draft, &reader, None).unwrap_err();
        assert!(matches!(err, ConfigError::ContextProviderMissing { key: Some(_), .. }));

        let night = StaticContextProvider::new(EvaluationContext::default().with_flag("nightTime", true));
        let outcome = binding.apply(&mut draft, &reader, Some(&night)).unwrap();
        assert_eq!(outcome.stringified.as_deref(), Some("true"));

        let day = StaticContextProvider::new(EvaluationContext::default());
        let mut fresh = Draft::default();
        assert!(matches!(
            binding.apply(&mut fresh, &reader, Some(&day)),
            Err(ConfigError::SpecFailed { .. })
        ));
        assert!(fresh.sleeping.is_none());
    }

    #[test]
    fn test_contextual_spec_skipped_when_unset() {
        let binding = Binding::new("pet.isSleeping", |d: &mut Draft| &mut d.sleeping, decode::bool)
            .with_contextual_spec(ContextualSpecEntry::anonymous(|_, _: &bool| false));
        let mut draft = Draft::default();
        assert!(binding.apply(&mut draft, &InMemoryProvider::new("m"), None).is_ok());
    }

    #[test]
    fn test_any_binding_erases_value_type() {
        let bindings: Vec<AnyBinding<Draft>> = vec![
            name_binding().into(),
            Binding::new("http.port", |d: &mut Draft| &mut d.port, decode::int).secret().into(),
        ];
        let reader = InMemoryProvider::new("m").with("pet.name", "Rex").with("http.port", 8080);
        let mut draft = Draft::default();
        for binding in &bindings {
            binding.apply(&mut draft, &reader, None).unwrap();
        }

        assert_eq!(bindings[0].key(), "pet.name");
        assert!(bindings[1].is_secret());
        assert_eq!(draft.port, Some(8080));
        assert_eq!(format!("{:?}", bindings[1]), r#"AnyBinding { key: "http.port", is_secret: true }"#);
    }
}
