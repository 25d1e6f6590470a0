//! A reference from one resolver plugin to another.

use std::fmt;

/// Which kind of plugin a dependency names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
  AttributeDefinition,
  DataConnector,
}

impl fmt::Display for DependencyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DependencyKind::AttributeDefinition => write!(f, "attribute definition"),
      DependencyKind::DataConnector => write!(f, "data connector"),
    }
  }
}

/// Named dependency on another plugin declared in the same resolver.
///
/// Connector dependencies may narrow which of the connector's attributes are read.
/// With neither `attribute_names` nor `all_attributes`, the consuming definition's
/// source attribute id is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverPluginDependency {
  plugin_id: String,
  kind: DependencyKind,
  attribute_names: Vec<String>,
  all_attributes: bool,
}

impl ResolverPluginDependency {
  pub fn definition(plugin_id: impl Into<String>) -> Self {
    Self {
      plugin_id: plugin_id.into(),
      kind: DependencyKind::AttributeDefinition,
      attribute_names: Vec::new(),
      all_attributes: false,
    }
  }

  pub fn connector(plugin_id: impl Into<String>) -> Self {
    Self {
      kind: DependencyKind::DataConnector,
      ..Self::definition(plugin_id)
    }
  }

  pub fn with_attribute_names<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.attribute_names = names.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_all_attributes(mut self) -> Self {
    self.all_attributes = true;
    self
  }

  pub fn plugin_id(&self) -> &str {
    &self.plugin_id
  }

  pub fn kind(&self) -> DependencyKind {
    self.kind
  }

  pub fn attribute_names(&self) -> &[String] {
    &self.attribute_names
  }

  pub fn all_attributes(&self) -> bool {
    self.all_attributes
  }
}
