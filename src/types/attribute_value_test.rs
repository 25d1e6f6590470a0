//! Tests for `AttributeValue`.

use chrono::DateTime;

use super::{AttributeValue, EmptyAttributeValue};

#[test]
fn scoped_equality_includes_scope() {
  let a = AttributeValue::scoped("alice", "example.org");
  assert_eq!(a, AttributeValue::scoped("alice", "example.org"));
  assert_ne!(a, AttributeValue::scoped("alice", "example.com"));
  assert_ne!(a, AttributeValue::string("alice"));
}

#[test]
fn display_forms() {
  assert_eq!(AttributeValue::string("bob").to_string(), "bob");
  assert_eq!(
    AttributeValue::scoped("bob", "example.org").to_string(),
    "bob@example.org"
  );
  assert_eq!(AttributeValue::null().to_string(), "");
  assert_eq!(AttributeValue::ByteArray(vec![1, 2, 3]).to_string(), "AQID");
  let epoch = DateTime::from_timestamp(0, 0).unwrap();
  assert_eq!(
    AttributeValue::DateTime(epoch).to_string(),
    "1970-01-01T00:00:00Z"
  );
}

#[test]
fn empty_markers_are_distinct() {
  assert!(AttributeValue::null().is_empty_marker());
  assert!(AttributeValue::zero_length().is_empty_marker());
  assert_ne!(AttributeValue::null(), AttributeValue::zero_length());
  assert!(!AttributeValue::string("").is_empty_marker());
  assert_eq!(
    AttributeValue::null(),
    AttributeValue::Empty(EmptyAttributeValue::NullValue)
  );
}

#[test]
fn as_str_only_for_plain_strings() {
  assert_eq!(AttributeValue::string("x").as_str(), Some("x"));
  assert_eq!(AttributeValue::scoped("x", "y").as_str(), None);
  assert_eq!(AttributeValue::null().as_str(), None);
}

#[test]
fn serializes_with_type_tag() {
  let json = serde_json::to_value(AttributeValue::scoped("alice", "example.org")).unwrap();
  assert_eq!(json["type"], "scoped");
  assert_eq!(json["value"]["scope"], "example.org");

  let json = serde_json::to_value(AttributeValue::ByteArray(vec![0xff])).unwrap();
  assert_eq!(json["type"], "byte_array");
  assert_eq!(json["value"], "/w==");
  let back: AttributeValue = serde_json::from_value(json).unwrap();
  assert_eq!(back, AttributeValue::ByteArray(vec![0xff]));
}
