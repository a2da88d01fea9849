use std::collections::BTreeMap;

use serde_json::Value;

use super::{ConfigProvider, ConfigReader, ConfigValue};
use crate::error::ReadError;

#[derive(Debug, Clone)]
enum Slot {
    Value(ConfigValue),
    Array,
}

/// JSON document flattened into dotted keys.
///
/// `{"pet": {"name": "Rex"}}` is readable as `pet.name`. Nulls are treated as
/// absent; arrays are kept so that reading one reports an error instead of
/// looking missing.
#[derive(Debug, Clone)]
pub struct JsonProvider {
    name: String,
    values: BTreeMap<String, Slot>,
}

impl JsonProvider {
    pub fn from_value(name: impl Into<String>, document: &Value) -> Result<Self, ReadError> {
        let name = name.into();
        let object = document.as_object().ok_or_else(|| ReadError::Provider {
            provider: name.clone(),
            message: "top-level JSON value must be an object".to_string(),
        })?;

        let mut values = BTreeMap::new();
        for (key, value) in object {
            flatten(key.clone(), value, &mut values);
        }
        Ok(Self { name, values })
    }

    pub fn from_json_str(name: impl Into<String>, text: &str) -> Result<Self, ReadError> {
        let name = name.into();
        let document: Value = serde_json::from_str(text).map_err(|e| ReadError::Provider {
            provider: name.clone(),
            message: e.to_string(),
        })?;
        Self::from_value(name, &document)
    }

    /// Flattened keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

fn flatten(prefix: String, value: &Value, out: &mut BTreeMap<String, Slot>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix, Slot::Value(ConfigValue::Bool(*b)));
        }
        Value::Number(n) => {
            let value = match n.as_i64() {
                Some(i) => ConfigValue::Int(i),
                None => ConfigValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            };
            out.insert(prefix, Slot::Value(value));
        }
        Value::String(s) => {
            out.insert(prefix, Slot::Value(ConfigValue::String(s.clone())));
        }
        Value::Array(_) => {
            out.insert(prefix, Slot::Array);
        }
        Value::Object(map) => {
            for (key, nested) in map {
                flatten(format!("{}.{}", prefix, key), nested, out);
            }
        }
    }
}

impl ConfigReader for JsonProvider {
    fn lookup(&self, key: &str) -> Result<Option<ConfigValue>, ReadError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Slot::Value(value)) => Ok(Some(value.clone())),
            Some(Slot::Array) => Err(ReadError::Unsupported {
                key: key.to_string(),
                kind: "array".to_string(),
            }),
        }
    }
}

impl ConfigProvider for JsonProvider {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_flatten_to_dotted_keys() {
        let provider = JsonProvider::from_value(
            "config.json",
            &json!({"pet": {"name": "Rex", "isSleeping": false, "age": 3}, "ratio": 0.5}),
        )
        .unwrap();

        assert_eq!(provider.string("pet.name").unwrap().as_deref(), Some("Rex"));
        assert_eq!(provider.bool("pet.isSleeping").unwrap(), Some(false));
        assert_eq!(provider.int("pet.age").unwrap(), Some(3));
        assert_eq!(provider.double("ratio").unwrap(), Some(0.5));
        assert_eq!(provider.lookup("pet").unwrap(), None);
    }

    #[test]
    fn test_nulls_are_absent_and_arrays_rejected() {
        let provider =
            JsonProvider::from_value("config.json", &json!({"a": null, "tags": ["x", "y"]})).unwrap();
        assert_eq!(provider.lookup("a").unwrap(), None);
        assert!(matches!(
            provider.lookup("tags"),
            Err(ReadError::Unsupported { ref kind, .. }) if kind == "array"
        ));
        let keys: Vec<&str> = provider.keys().collect();
        assert_eq!(keys, vec!["tags"]);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            JsonProvider::from_json_str("bad.json", "{not json"),
            Err(ReadError::Provider { .. })
        ));
        assert!(matches!(
            JsonProvider::from_value("list.json", &json!([1, 2])),
            Err(ReadError::Provider { .. })
        ));
    }

    #[test]
    fn test_provider_name() {
        let provider = JsonProvider::from_json_str("app.json", r#"{"k": "v"}"#).unwrap();
        assert_eq!(provider.name(), "app.json");
    }
}
