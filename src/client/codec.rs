//! JSON conversion shared by every GitLab CI client

use serde::{de::DeserializeOwned, Serialize};

use super::error::{ClientError, Result};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialization context handed to each client at construction.
///
/// One instance is created at startup and shared through an `Arc`, so all
/// clients decode and encode payloads the same way.
#[derive(Debug, Clone, Default)]
pub struct JsonConverter {
    _private: (),
}

impl JsonConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a response body. An empty body decodes as JSON `null`, which
    /// satisfies `Option` and unit targets and fails everything else.
    pub fn decode<T: DeserializeOwned>(&self, url: &str, body: &str) -> Result<T> {
        let body = if body.trim().is_empty() { "null" } else { body };
        serde_json::from_str(body).map_err(|e| ClientError::conversion(url, e))
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        serde_json::to_string(value).map_err(ClientError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_decode() {
        let converter = JsonConverter::new();
        let named: Named = converter.decode("u", r#"{"name":"ci","extra":1}"#).unwrap();
        assert_eq!(named, Named { name: "ci".into() });
    }

    #[test]
    fn test_empty_body() {
        let converter = JsonConverter::new();
        let nothing: Option<Named> = converter.decode("u", "  ").unwrap();
        assert_eq!(nothing, None);

        let err = converter.decode::<Named>("https://g/api/v4/x", "").unwrap_err();
        assert!(matches!(err, ClientError::Conversion { ref url, .. } if url == "https://g/api/v4/x"));
    }

    #[test]
    fn test_encode() {
        let converter = JsonConverter::new();
        assert_eq!(converter.encode(&serde_json::json!({"ref": "main"})).unwrap(), r#"{"ref":"main"}"#);
    }
}
