//! Configuration readers: the lookup seam between the pipeline and its sources.
//!
//! The pipeline only ever sees a [`ConfigReader`]. Concrete sources implement
//! [`ConfigProvider`], which adds a name and a fixed [`Provenance`], and are
//! combined with a [`LayeredReader`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReadError;
use crate::snapshot::Provenance;

pub mod decode;
mod env;
mod json;
mod layered;
mod memory;

pub use env::{env_var_name, EnvironmentProvider};
pub use json::JsonProvider;
pub use layered::{AccessEvent, AccessOutcome, AccessReporter, LayeredReader};
pub use memory::InMemoryProvider;

/// A raw value as stored by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl ConfigValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Double(_) => "double",
            ConfigValue::String(_) => "string",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(v) => write!(f, "{}", v),
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Double(v) => write!(f, "{}", v),
            ConfigValue::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Double(value)
    }
}

fn mismatch(key: &str, expected: &'static str, found: &ConfigValue) -> ReadError {
    ReadError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

fn invalid(key: &str, message: String) -> ReadError {
    ReadError::InvalidValue {
        key: key.to_string(),
        message,
    }
}

/// Key lookup against some configuration source.
///
/// Typed accessors coerce string values, since environment variables and
/// many file formats only carry strings.
pub trait ConfigReader: Send + Sync {
    fn lookup(&self, key: &str) -> Result<Option<ConfigValue>, ReadError>;

    fn string(&self, key: &str) -> Result<Option<String>, ReadError> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ConfigValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch(key, "string", &other)),
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ReadError> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ConfigValue::Bool(b)) => Ok(Some(b)),
            Some(ConfigValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                _ => Err(invalid(key, format!("'{}' is not a boolean", s))),
            },
            Some(other) => Err(mismatch(key, "bool", &other)),
        }
    }

    fn int(&self, key: &str) -> Result<Option<i64>, ReadError> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ConfigValue::Int(i)) => Ok(Some(i)),
            Some(ConfigValue::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|e| invalid(key, format!("'{}' is not an integer: {}", s, e))),
            Some(other) => Err(mismatch(key, "int", &other)),
        }
    }

    fn double(&self, key: &str) -> Result<Option<f64>, ReadError> {
        match self.lookup(key)? {
            None => Ok(None),
            Some(ConfigValue::Double(d)) => Ok(Some(d)),
            Some(ConfigValue::Int(i)) => Ok(Some(i as f64)),
            Some(ConfigValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| invalid(key, format!("'{}' is not a number: {}", s, e))),
            Some(other) => Err(mismatch(key, "double", &other)),
        }
    }
}

/// A named configuration source with a fixed provenance.
pub trait ConfigProvider: ConfigReader {
    fn name(&self) -> &str;

    fn provenance(&self) -> Provenance {
        Provenance::ExternalProvider {
            name: self.name().to_string(),
        }
    }
}
