//! Deterministic request fingerprints used as cache keys

use crate::protocol::types::BatchRequest;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a request's canonical JSON form
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestFingerprint([u8; 32]);

impl RequestFingerprint {
    /// Fingerprint a batch request.
    ///
    /// Returns `None` for streaming requests and for requests that fail to
    /// serialize; their responses are never cached.
    pub fn compute(request: &BatchRequest) -> Option<Self> {
        if request.stream {
            return None;
        }
        Self::of_serializable(request)
    }

    fn of_serializable<T: Serialize>(value: &T) -> Option<Self> {
        let value = serde_json::to_value(value).ok()?;
        Some(Self::of_value(&value))
    }

    /// Fingerprint any JSON value, independent of object key order
    pub fn of_value(value: &Value) -> Self {
        let mut canonical = String::new();
        write_canonical(value, &mut canonical);
        Self(Sha256::digest(canonical.as_bytes()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RequestFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestFingerprint({})", self.to_hex())
    }
}

/// Error parsing a fingerprint from hex
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint: expected 64 hex characters, got {0:?}")]
pub struct ParseFingerprintError(String);

impl FromStr for RequestFingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(ParseFingerprintError(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseFingerprintError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

/// Compact JSON with object keys sorted at every level
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::Message;
    use serde_json::json;

    #[test]
    fn test_streaming_requests_are_exempt() {
        let request = BatchRequest::new("gpt-4", vec![Message::user("hi")], true);
        assert!(RequestFingerprint::compute(&request).is_none());
    }

    #[test]
    fn test_same_request_same_fingerprint() {
        let a = BatchRequest::new("gpt-4", vec![Message::user("hi")], false);
        let b = a.clone();
        assert_eq!(
            RequestFingerprint::compute(&a),
            RequestFingerprint::compute(&b)
        );
    }

    #[test]
    fn test_model_changes_fingerprint() {
        let a = BatchRequest::new("gpt-4", vec![Message::user("hi")], false);
        let b = BatchRequest::new("gpt-3.5-turbo", vec![Message::user("hi")], false);
        assert_ne!(
            RequestFingerprint::compute(&a),
            RequestFingerprint::compute(&b)
        );
    }

    #[test]
    fn test_canonical_form_sorts_nested_keys() {
        let text = r#"{"b":1,"a":{"d":[1,2],"c":"x"}}"#;
        let value: Value = serde_json::from_str(text).unwrap();
        // Parsed objects keep their textual key order
        assert_eq!(value.to_string(), text);

        let mut out = String::new();
        write_canonical(&value, &mut out);
        assert_eq!(out, r#"{"a":{"c":"x","d":[1,2]},"b":1}"#);
    }

    #[test]
    fn test_key_order_does_not_change_fingerprint() {
        let mut forward = serde_json::Map::new();
        forward.insert("model".into(), json!("gpt-4"));
        forward.insert("temperature".into(), json!(0.0));
        let mut backward = serde_json::Map::new();
        backward.insert("temperature".into(), json!(0.0));
        backward.insert("model".into(), json!("gpt-4"));

        let forward = Value::Object(forward);
        let backward = Value::Object(backward);
        assert_ne!(forward.to_string(), backward.to_string());
        assert_eq!(
            RequestFingerprint::of_value(&forward),
            RequestFingerprint::of_value(&backward)
        );
    }

    #[test]
    fn test_unserializable_value_has_no_fingerprint() {
        // JSON object keys must be strings
        let mut tuple_keys = std::collections::HashMap::new();
        tuple_keys.insert((1u8, 2u8), "x");
        assert!(RequestFingerprint::of_serializable(&tuple_keys).is_none());
        assert!(RequestFingerprint::of_serializable(&json!({"model": "gpt-4"})).is_some());
    }

    #[test]
    fn test_hex_round_trip() {
        let fp = RequestFingerprint::of_value(&json!({"model": "gpt-4"}));
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex.parse::<RequestFingerprint>().unwrap(), fp);
        assert!("zz".parse::<RequestFingerprint>().is_err());
    }
}
