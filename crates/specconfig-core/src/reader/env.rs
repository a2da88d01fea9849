use std::collections::BTreeMap;

use super::{ConfigProvider, ConfigReader, ConfigValue};
use crate::error::ReadError;
use crate::snapshot::Provenance;

/// Environment variable name for a dotted key.
///
/// Dots and dashes become `_`, camelCase boundaries gain a `_`, and the
/// result is upper-cased: `pet.isSleeping` maps to `PET_IS_SLEEPING`.
pub fn env_var_name(prefix: Option<&str>, key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 8);
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        out.push_str(&prefix.to_ascii_uppercase());
        out.push('_');
    }
    let mut prev_lower = false;
    for c in key.chars() {
        match c {
            '.' | '-' => {
                out.push('_');
                prev_lower = false;
            }
            c if c.is_ascii_uppercase() => {
                if prev_lower {
                    out.push('_');
                }
                out.push(c);
                prev_lower = false;
            }
            c => {
                out.push(c.to_ascii_uppercase());
                prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
enum Source {
    Process,
    Fixed(BTreeMap<String, String>),
}

/// Reads dotted keys from environment variables.
#[derive(Debug, Clone)]
pub struct EnvironmentProvider {
    prefix: Option<String>,
    source: Source,
}

impl EnvironmentProvider {
    /// Read from the live process environment on every lookup.
    pub fn new() -> Self {
        Self {
            prefix: None,
            source: Source::Process,
        }
    }

    /// Read from a fixed set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: None,
            source: Source::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn var_name(&self, key: &str) -> String {
        env_var_name(self.prefix.as_deref(), key)
    }
}

impl Default for EnvironmentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigReader for EnvironmentProvider {
    fn lookup(&self, key: &str) -> Result<Option<ConfigValue>, ReadError> {
        let name = self.var_name(key);
        match &self.source {
            Source::Fixed(vars) => Ok(vars.get(&name).cloned().map(ConfigValue::String)),
            Source::Process => match std::env::var(&name) {
                Ok(value) => Ok(Some(ConfigValue::String(value))),
                Err(std::env::VarError::NotPresent) => Ok(None),
                Err(std::env::VarError::NotUnicode(_)) => Err(ReadError::InvalidValue {
                    key: key.to_string(),
                    message: format!("environment variable {} is not valid unicode", name),
                }),
            },
        }
    }
}

impl ConfigProvider for EnvironmentProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn provenance(&self) -> Provenance {
        Provenance::EnvironmentVariable
    }
}
