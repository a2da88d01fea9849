//! Typed decoders for use as binding decode functions.
//!
//! ```ignore
//! Binding::new("pet.name", |d: &mut PetDraft| &mut d.name, decode::string)
//! ```

use super::ConfigReader;
use crate::error::ReadError;

pub fn string(reader: &dyn ConfigReader, key: &str) -> Result<Option<String>, ReadError> {
    reader.string(key)
}

pub fn bool(reader: &dyn ConfigReader, key: &str) -> Result<Option<bool>, ReadError> {
    reader.bool(key)
}

pub fn int(reader: &dyn ConfigReader, key: &str) -> Result<Option<i64>, ReadError> {
    reader.int(key)
}

pub fn double(reader: &dyn ConfigReader, key: &str) -> Result<Option<f64>, ReadError> {
    reader.double(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::InMemoryProvider;

    #[test]
    fn test_decoders_delegate_to_reader() {
        let reader = InMemoryProvider::new("test")
            .with("pet.name", "Rex")
            .with("pet.isSleeping", "no")
            .with("http.port", 8080)
            .with("ratio", 0.25);

        assert_eq!(string(&reader, "pet.name").unwrap().as_deref(), Some("Rex"));
        assert_eq!(bool(&reader, "pet.isSleeping").unwrap(), Some(false));
        assert_eq!(int(&reader, "http.port").unwrap(), Some(8080));
        assert_eq!(double(&reader, "ratio").unwrap(), Some(0.25));
        assert_eq!(string(&reader, "absent").unwrap(), None);
    }
}
