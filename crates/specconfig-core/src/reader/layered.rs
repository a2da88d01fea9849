use std::sync::Arc;

use super::{ConfigProvider, ConfigReader, ConfigValue, EnvironmentProvider};
use crate::error::ReadError;
use crate::snapshot::Provenance;

/// Result of one key lookup through a [`LayeredReader`].
#[derive(Debug, Clone, PartialEq)]
pub enum AccessOutcome {
    Found { provider: String, provenance: Provenance },
    Missing,
    Failed { provider: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessEvent {
    pub key: String,
    pub outcome: AccessOutcome,
}

/// Observer of raw key lookups. Implementations may be shared between
/// threads and readers.
pub trait AccessReporter: Send + Sync {
    fn report(&self, event: &AccessEvent);
}

/// Ordered stack of providers; the first provider that has a key wins.
#[derive(Default)]
pub struct LayeredReader {
    providers: Vec<Box<dyn ConfigProvider>>,
    reporter: Option<Arc<dyn AccessReporter>>,
}

impl LayeredReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment first, then `values`.
    pub fn with_environment_overrides<P>(values: P, environment: EnvironmentProvider) -> Self
    where
        P: ConfigProvider + 'static,
    {
        Self::new().with_provider(environment).with_provider(values)
    }

    /// Append a provider with lower precedence than those already added.
    pub fn with_provider<P>(mut self, provider: P) -> Self
    where
        P: ConfigProvider + 'static,
    {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn AccessReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn report(&self, key: &str, outcome: AccessOutcome) {
        if let Some(reporter) = &self.reporter {
            reporter.report(&AccessEvent {
                key: key.to_string(),
                outcome,
            });
        }
    }
}

impl std::fmt::Debug for LayeredReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredReader")
            .field("providers", &self.provider_names())
            .field("reporting", &self.reporter.is_some())
            .finish()
    }
}

impl ConfigReader for LayeredReader {
    fn lookup(&self, key: &str) -> Result<Option<ConfigValue>, ReadError> {
        for provider in &self.providers {
            match provider.lookup(key) {
                Ok(Some(value)) => {
                    self.report(
                        key,
                        AccessOutcome::Found {
                            provider: provider.name().to_string(),
                            provenance: provider.provenance(),
                        },
                    );
                    return Ok(Some(value));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.report(
                        key,
                        AccessOutcome::Failed {
                            provider: provider.name().to_string(),
                            message: err.to_string(),
                        },
                    );
                    return Err(err);
                }
            }
        }
        self.report(key, AccessOutcome::Missing);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{InMemoryProvider, JsonProvider};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<AccessEvent>>,
    }

    impl AccessReporter for Recorder {
        fn report(&self, event: &AccessEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event.clone());
            }
        }
    }

    #[test]
    fn test_first_provider_wins() {
        let reader = LayeredReader::new()
            .with_provider(InMemoryProvider::new("overrides").with("pet.name", "Rex"))
            .with_provider(
                InMemoryProvider::new("defaults")
                    .with("pet.name", "Fido")
                    .with("pet.isSleeping", false),
            );

        assert_eq!(reader.string("pet.name").unwrap().as_deref(), Some("Rex"));
        assert_eq!(reader.bool("pet.isSleeping").unwrap(), Some(false));
        assert_eq!(reader.provider_names(), vec!["overrides", "defaults"]);
    }

    #[test]
    fn test_environment_overrides_take_precedence() {
        let reader = LayeredReader::with_environment_overrides(
            InMemoryProvider::new("config.json").with("pet.isSleeping", false),
            EnvironmentProvider::from_vars([("PET_IS_SLEEPING", "yes")]),
        );
        assert_eq!(reader.bool("pet.isSleeping").unwrap(), Some(true));
        assert_eq!(reader.provider_names(), vec!["environment", "config.json"]);
    }

    #[test]
    fn test_reports_every_lookup() {
        let recorder = Arc::new(Recorder::default());
        let reader = LayeredReader::new()
            .with_provider(InMemoryProvider::new("memory").with("pet.name", "Rex"))
            .with_provider(JsonProvider::from_value("file", &serde_json::json!({"tags": []})).unwrap())
            .with_reporter(recorder.clone());

        reader.lookup("pet.name").unwrap();
        reader.lookup("pet.age").unwrap();
        assert!(reader.lookup("tags").is_err());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].outcome,
            AccessOutcome::Found {
                provider: "memory".to_string(),
                provenance: Provenance::ExternalProvider { name: "memory".to_string() },
            }
        );
        assert_eq!(events[1].outcome, AccessOutcome::Missing);
        assert!(matches!(&events[2].outcome, AccessOutcome::Failed { provider, .. } if provider == "file"));
    }
}
