use std::collections::BTreeMap;

use super::{ConfigProvider, ConfigReader, ConfigValue};
use crate::error::ReadError;

/// Named in-memory map of dotted keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    name: String,
    values: BTreeMap<String, ConfigValue>,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigReader for InMemoryProvider {
    fn lookup(&self, key: &str) -> Result<Option<ConfigValue>, ReadError> {
        Ok(self.values.get(key).cloned())
    }
}

impl ConfigProvider for InMemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut provider = InMemoryProvider::new("memory").with("a", 1);
        provider.insert("b", "two");
        assert_eq!(provider.len(), 2);
        assert_eq!(provider.lookup("b").unwrap(), Some(ConfigValue::from("two")));

        assert_eq!(provider.remove("a"), Some(ConfigValue::Int(1)));
        assert_eq!(provider.lookup("a").unwrap(), None);
        assert!(!provider.is_empty());
    }
}
