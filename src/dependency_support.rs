//! Reading dependency results back out of the work context.

use tracing::trace;

use crate::strategy::ValueBindings;
use crate::types::{AttributeValue, DependencyKind, ResolverPluginDependency};
use crate::work_context::AttributeResolverWorkContext;

/// Connector attribute names selected by `dependency`, given the consumer's source id.
fn selected_names<'a>(
  dependency: &'a ResolverPluginDependency,
  available: impl Iterator<Item = &'a String>,
  source_attribute_id: Option<&'a str>,
) -> Vec<&'a str> {
  if !dependency.attribute_names().is_empty() {
    dependency
      .attribute_names()
      .iter()
      .map(String::as_str)
      .collect()
  } else if dependency.all_attributes() || source_attribute_id.is_none() {
    available.map(String::as_str).collect()
  } else {
    source_attribute_id.into_iter().collect()
  }
}

/// Values for one logical input, concatenated across all dependencies in
/// declaration order.
///
/// Definition dependencies contribute all of their values. Connector dependencies
/// contribute the attributes they select, defaulting to `source_attribute_id`.
/// Dependencies with no recorded result contribute nothing. Empty markers are kept.
pub fn merged_attribute_values(
  work: &AttributeResolverWorkContext,
  dependencies: &[ResolverPluginDependency],
  source_attribute_id: &str,
) -> Vec<AttributeValue> {
  let mut values = Vec::new();
  for dependency in dependencies {
    match dependency.kind() {
      DependencyKind::AttributeDefinition => {
        match work
          .resolved_attribute_definition(dependency.plugin_id())
          .and_then(|r| r.attribute())
        {
          Some(attribute) => values.extend(attribute.values().iter().cloned()),
          None => trace!(dependency = dependency.plugin_id(), "definition produced nothing"),
        }
      }
      DependencyKind::DataConnector => {
        let Some(attributes) = work
          .resolved_data_connector(dependency.plugin_id())
          .and_then(|r| r.attributes())
        else {
          trace!(dependency = dependency.plugin_id(), "connector produced nothing");
          continue;
        };
        for name in selected_names(dependency, attributes.keys(), Some(source_attribute_id)) {
          if let Some(attribute) = attributes.get(name) {
            values.extend(attribute.values().iter().cloned());
          }
        }
      }
    }
  }
  values
}

/// Every value visible through `dependencies`, keyed by attribute id.
///
/// Definition results are keyed by the definition id; connector results by the
/// connector's attribute names (all of them unless the dependency names some).
/// Values arriving under the same key from several dependencies are concatenated.
pub fn all_attribute_values(
  work: &AttributeResolverWorkContext,
  dependencies: &[ResolverPluginDependency],
) -> ValueBindings {
  let mut bindings = ValueBindings::new();
  for dependency in dependencies {
    match dependency.kind() {
      DependencyKind::AttributeDefinition => {
        if let Some(attribute) = work
          .resolved_attribute_definition(dependency.plugin_id())
          .and_then(|r| r.attribute())
        {
          bindings
            .entry(dependency.plugin_id().to_string())
            .or_default()
            .extend(attribute.values().iter().cloned());
        }
      }
      DependencyKind::DataConnector => {
        let Some(attributes) = work
          .resolved_data_connector(dependency.plugin_id())
          .and_then(|r| r.attributes())
        else {
          continue;
        };
        for name in selected_names(dependency, attributes.keys(), None) {
          if let Some(attribute) = attributes.get(name) {
            bindings
              .entry(name.to_string())
              .or_default()
              .extend(attribute.values().iter().cloned());
          }
        }
      }
    }
  }
  bindings
}

/// Drops explicit null / zero-length markers.
pub fn without_empty_markers(values: Vec<AttributeValue>) -> Vec<AttributeValue> {
  values.into_iter().filter(|v| !v.is_empty_marker()).collect()
}
