//! JSON serializers.

use serde::Serialize;
use tracing::trace;

use crate::error::CodecError;
use crate::serializer::Serializer;

/// Encodes values to JSON bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Create a compact JSON serializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit indented output.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl<T> Serializer<T> for JsonSerializer
where
    T: Serialize + ?Sized,
{
    type Output = Vec<u8>;
    type Error = CodecError;

    fn format(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        trace!("Encoded {} bytes of JSON", bytes.len());
        Ok(bytes)
    }
}

/// Encodes values to a structured [`serde_json::Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValueSerializer;

impl<T> Serializer<T> for JsonValueSerializer
where
    T: Serialize + ?Sized,
{
    type Output = serde_json::Value;
    type Error = CodecError;

    fn format(&self) -> &str {
        "json-value"
    }

    fn encode(&self, value: &T) -> Result<serde_json::Value, CodecError> {
        Ok(serde_json::to_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct Report {
        name: String,
        passed: u32,
    }

    #[test]
    fn test_json_bytes() {
        let report = Report {
            name: "smoke".to_string(),
            passed: 3,
        };
        let bytes = JsonSerializer::new().encode(&report).unwrap();
        assert_eq!(bytes, br#"{"name":"smoke","passed":3}"#.to_vec());
    }

    #[test]
    fn test_json_pretty() {
        let bytes = JsonSerializer::new().pretty().encode(&vec![1, 2]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_json_value() {
        let value = JsonValueSerializer.encode(&("a", 1)).unwrap();
        assert_eq!(value, serde_json::json!(["a", 1]));
    }

    #[test]
    fn test_non_string_map_keys_fail() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");

        let err = JsonSerializer::new().encode(&map).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }
}
