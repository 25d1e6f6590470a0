//! Typed attribute values.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Explicit marker distinguishing a null value from a zero-length one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyAttributeValue {
  NullValue,
  ZeroLengthValue,
}

/// A string value qualified by a scope (e.g. a domain).
///
/// Two scoped values are equal only when both value and scope match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopedValue {
  pub value: String,
  pub scope: String,
}

/// A single attribute value. The variant is fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
  String(String),
  Scoped(ScopedValue),
  DateTime(DateTime<Utc>),
  Empty(EmptyAttributeValue),
  ByteArray(#[serde(with = "base64_bytes")] Vec<u8>),
  Opaque(serde_json::Value),
}

impl AttributeValue {
  pub fn string(value: impl Into<String>) -> Self {
    AttributeValue::String(value.into())
  }

  pub fn scoped(value: impl Into<String>, scope: impl Into<String>) -> Self {
    AttributeValue::Scoped(ScopedValue {
      value: value.into(),
      scope: scope.into(),
    })
  }

  pub fn null() -> Self {
    AttributeValue::Empty(EmptyAttributeValue::NullValue)
  }

  pub fn zero_length() -> Self {
    AttributeValue::Empty(EmptyAttributeValue::ZeroLengthValue)
  }

  /// Short name of the variant, used in diagnostics.
  pub fn type_name(&self) -> &'static str {
    match self {
      AttributeValue::String(_) => "string",
      AttributeValue::Scoped(_) => "scoped",
      AttributeValue::DateTime(_) => "date_time",
      AttributeValue::Empty(_) => "empty",
      AttributeValue::ByteArray(_) => "byte_array",
      AttributeValue::Opaque(_) => "opaque",
    }
  }

  /// The string payload, for `String` values only.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      AttributeValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn is_empty_marker(&self) -> bool {
    matches!(self, AttributeValue::Empty(_))
  }
}

impl fmt::Display for AttributeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AttributeValue::String(s) => write!(f, "{}", s),
      AttributeValue::Scoped(s) => write!(f, "{}@{}", s.value, s.scope),
      AttributeValue::DateTime(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Secs, true)),
      AttributeValue::Empty(_) => Ok(()),
      AttributeValue::ByteArray(b) => write!(f, "{}", STANDARD.encode(b)),
      AttributeValue::Opaque(v) => write!(f, "{}", v),
    }
  }
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    AttributeValue::String(value.to_string())
  }
}

impl From<String> for AttributeValue {
  fn from(value: String) -> Self {
    AttributeValue::String(value)
  }
}

impl From<DateTime<Utc>> for AttributeValue {
  fn from(value: DateTime<Utc>) -> Self {
    AttributeValue::DateTime(value)
  }
}

/// Byte-array values travel as standard base64 in JSON.
mod base64_bytes {
  use base64::Engine;
  use base64::engine::general_purpose::STANDARD;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
      .decode(encoded.as_bytes())
      .map_err(serde::de::Error::custom)
  }
}
