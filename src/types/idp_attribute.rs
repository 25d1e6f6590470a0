//! A named, ordered, multi-valued attribute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AttributeValue;

/// A named attribute holding an ordered list of values.
///
/// Built by a plugin during resolution and treated as immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPAttribute {
  id: String,
  values: Vec<AttributeValue>,
  /// Language tag -> human readable name.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  display_names: BTreeMap<String, String>,
  /// Language tag -> human readable description.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  display_descriptions: BTreeMap<String, String>,
}

impl IdPAttribute {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      values: Vec::new(),
      display_names: BTreeMap::new(),
      display_descriptions: BTreeMap::new(),
    }
  }

  pub fn with_values(id: impl Into<String>, values: Vec<AttributeValue>) -> Self {
    Self {
      values,
      ..Self::new(id)
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn values(&self) -> &[AttributeValue] {
    &self.values
  }

  pub fn set_values(&mut self, values: Vec<AttributeValue>) {
    self.values = values;
  }

  pub fn add_value(&mut self, value: AttributeValue) {
    self.values.push(value);
  }

  pub fn has_values(&self) -> bool {
    !self.values.is_empty()
  }

  pub fn display_names(&self) -> &BTreeMap<String, String> {
    &self.display_names
  }

  pub fn set_display_names(&mut self, names: BTreeMap<String, String>) {
    self.display_names = names;
  }

  pub fn display_descriptions(&self) -> &BTreeMap<String, String> {
    &self.display_descriptions
  }

  pub fn set_display_descriptions(&mut self, descriptions: BTreeMap<String, String>) {
    self.display_descriptions = descriptions;
  }
}
