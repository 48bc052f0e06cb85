//! Wire envelope
//!
//! `{"typeName":"<name>","data":"<json>"}`. `data` is itself the JSON text
//! produced by the payload's `stream_out`, so the payload is string-encoded
//! inside the outer object. Persisted values depend on this exact shape.

use crate::error::StreamResult;
use crate::streamable::DynamicStreamable;
use serde::{Deserialize, Serialize};

/// Type-tagged serialized payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Registered type name of the payload
    pub type_name: String,
    /// Payload fields as produced by `stream_out`
    pub data: String,
}

impl Envelope {
    /// Wrap a value
    ///
    /// # Errors
    /// Returns error if the value fails to stream out
    pub fn wrap<T: DynamicStreamable + ?Sized>(value: &T) -> StreamResult<Self> {
        Ok(Self {
            type_name: value.type_name().to_string(),
            data: value.stream_out()?,
        })
    }

    /// Encode as JSON text
    ///
    /// # Errors
    /// Returns error if JSON encoding fails
    pub fn encode(&self) -> StreamResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON text
    ///
    /// # Errors
    /// Returns error if `text` is not a well-formed envelope
    pub fn decode(text: &str) -> StreamResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encode_keeps_field_order_and_nested_string() {
        let envelope = Envelope {
            type_name: "Message".to_string(),
            data: r#"{"id":"m1"}"#.to_string(),
        };

        assert_eq!(
            envelope.encode().unwrap(),
            r#"{"typeName":"Message","data":"{\"id\":\"m1\"}"}"#
        );
    }

    #[test]
    fn decode_accepts_persisted_form() {
        let text = r#"{"typeName":"Persona","data":"{\"name\":\"Ada\"}"}"#;
        let envelope = Envelope::decode(text).unwrap();

        assert_eq!(envelope.type_name, "Persona");
        assert_eq!(envelope.data, r#"{"name":"Ada"}"#);
        assert_eq!(envelope.encode().unwrap(), text);
    }

    #[test]
    fn decode_rejects_missing_type_name() {
        assert!(Envelope::decode(r#"{"data":"{}"}"#).is_err());
        assert!(Envelope::decode("not json").is_err());
    }
}
