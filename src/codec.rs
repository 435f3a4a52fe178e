//! JSON codec for message parts.
//!
//! Every signed part of a wire message (header, parent header, metadata,
//! content) is an independently-parseable JSON blob. The codec is a marker
//! struct with static methods rather than a trait object, so callers pick it
//! at compile time.
//!
//! # Example
//!
//! ```
//! use replwire::codec::JsonCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Payload {
//!     code: String,
//! }
//!
//! let payload = Payload { code: "1+1".to_string() };
//! let encoded = JsonCodec::encode(&payload).unwrap();
//! let decoded: Payload = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, payload);
//! ```

use bytes::Bytes;

use crate::error::Result;

/// JSON codec for structured message parts.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    #[test]
    fn test_encode_decode_map() {
        let mut map = BTreeMap::new();
        map.insert("text/plain".to_string(), "2".to_string());

        let encoded = JsonCodec::encode(&map).unwrap();
        let decoded: BTreeMap<String, String> = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_encode_decode_value() {
        let value = json!({"code": "1+1", "silent": false});
        let encoded = JsonCodec::encode(&value).unwrap();
        let decoded: Value = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_empty_object() {
        let value = json!({});
        let encoded = JsonCodec::encode(&value).unwrap();
        assert_eq!(&encoded[..], b"{}");
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = b"not valid json";
        let result: Result<Value> = JsonCodec::decode(invalid);
        assert!(result.is_err());
    }
}
