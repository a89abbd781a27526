//! Request and response bodies, and the best-effort JSON decoder.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A body that is either structured JSON or raw content.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured value. Serialized to JSON text when sent.
    Json(Value),
    /// Text, sent verbatim.
    Text(String),
    /// Raw bytes, sent verbatim and never decoded.
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// A JSON `null`, which is never written as a request body.
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Json(Value::Null))
    }

    /// View the payload as a JSON value. Raw text becomes a JSON string and
    /// bytes are decoded as lossy UTF-8.
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Json(value) => value.clone(),
            Payload::Text(text) => Value::String(text.clone()),
            Payload::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Deserialize the payload into a concrete type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }

    /// Encode for the wire. Returns the bytes and whether they are JSON.
    ///
    /// A JSON string value counts as text and goes out unquoted.
    pub(crate) fn encode(&self) -> Result<(Vec<u8>, bool), serde_json::Error> {
        match self {
            Payload::Json(Value::String(text)) => Ok((text.clone().into_bytes(), false)),
            Payload::Json(value) => Ok((serde_json::to_vec(value)?, true)),
            Payload::Text(text) => Ok((text.clone().into_bytes(), false)),
            Payload::Bytes(bytes) => Ok((bytes.clone(), false)),
        }
    }
}

impl PartialEq<Value> for Payload {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, Payload::Json(value) if value == other)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<bytes::Bytes> for Payload {
    fn from(bytes: bytes::Bytes) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Json(Value::from(n))
    }
}

impl From<u64> for Payload {
    fn from(n: u64) -> Self {
        Payload::Json(Value::from(n))
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Json(Value::from(n))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Json(Value::Bool(b))
    }
}

/// Parse text as JSON when possible, otherwise hand the input back untouched.
///
/// Only text is ever parsed. Bytes and values that are already structured
/// come back as they went in.
pub fn try_parse(content: impl Into<Payload>) -> Payload {
    match content.into() {
        Payload::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(text),
        },
        other => other,
    }
}
