//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::types::{AttributeMap, AttributeValue, IdPAttribute};
use crate::work_context::AttributeResolverWorkContext;

pub(crate) fn strings(values: &[&str]) -> Vec<AttributeValue> {
  values.iter().map(|v| AttributeValue::string(*v)).collect()
}

pub(crate) fn attribute_map(attributes: &[(&str, Vec<AttributeValue>)]) -> AttributeMap {
  attributes
    .iter()
    .map(|(name, values)| {
      (
        name.to_string(),
        IdPAttribute::with_values(*name, values.clone()),
      )
    })
    .collect()
}

/// Records a connector result directly, as if the connector had already run.
pub(crate) fn record_connector(
  work: &mut AttributeResolverWorkContext,
  connector_id: &str,
  attributes: &[(&str, Vec<AttributeValue>)],
) {
  work
    .record_data_connector_resolution(connector_id, Some(Arc::new(attribute_map(attributes))))
    .unwrap();
}

/// Records a definition result directly, as if the definition had already run.
pub(crate) fn record_definition(
  work: &mut AttributeResolverWorkContext,
  definition_id: &str,
  values: Vec<AttributeValue>,
) {
  work
    .record_attribute_definition_resolution(
      definition_id,
      Some(Arc::new(IdPAttribute::with_values(definition_id, values))),
    )
    .unwrap();
}

pub(crate) fn work_with_connector(
  connector_id: &str,
  attributes: &[(&str, Vec<AttributeValue>)],
) -> AttributeResolverWorkContext {
  let mut work = AttributeResolverWorkContext::new();
  record_connector(&mut work, connector_id, attributes);
  work
}
