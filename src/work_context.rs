//! Per-resolution memoization table.
//!
//! One [AttributeResolverWorkContext] is created for each resolution request and
//! never shared across threads. It records, at most once per plugin id, what every
//! attribute definition and data connector produced, plus any failover substitutions.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::ResolutionError;
use crate::types::{AttributeMap, IdPAttribute};

/// Recorded outcome of one attribute definition. `None` means "resolved to nothing".
#[derive(Debug, Clone)]
pub struct ResolvedAttributeDefinition {
  definition_id: String,
  attribute: Option<Arc<IdPAttribute>>,
}

impl ResolvedAttributeDefinition {
  pub fn definition_id(&self) -> &str {
    &self.definition_id
  }

  pub fn attribute(&self) -> Option<&Arc<IdPAttribute>> {
    self.attribute.as_ref()
  }
}

/// Recorded outcome of one data connector.
///
/// When a failover stood in for the connector, `resolved_by` names the failover.
#[derive(Debug, Clone)]
pub struct ResolvedDataConnector {
  connector_id: String,
  resolved_by: String,
  attributes: Option<Arc<AttributeMap>>,
}

impl ResolvedDataConnector {
  pub fn connector_id(&self) -> &str {
    &self.connector_id
  }

  pub fn resolved_by(&self) -> &str {
    &self.resolved_by
  }

  pub fn is_failover(&self) -> bool {
    self.connector_id != self.resolved_by
  }

  pub fn attributes(&self) -> Option<&Arc<AttributeMap>> {
    self.attributes.as_ref()
  }
}

/// Scratch space for a single resolution request.
#[derive(Debug, Default)]
pub struct AttributeResolverWorkContext {
  definitions: HashMap<String, ResolvedAttributeDefinition>,
  connectors: HashMap<String, ResolvedDataConnector>,
  failovers: HashMap<String, String>,
}

impl AttributeResolverWorkContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records what `definition_id` resolved to. Fails if the id was already recorded.
  #[instrument(level = "trace", skip(self, attribute))]
  pub fn record_attribute_definition_resolution(
    &mut self,
    definition_id: &str,
    attribute: Option<Arc<IdPAttribute>>,
  ) -> Result<(), ResolutionError> {
    if self.definitions.contains_key(definition_id) {
      return Err(ResolutionError::AlreadyResolved(definition_id.to_string()));
    }
    self.definitions.insert(
      definition_id.to_string(),
      ResolvedAttributeDefinition {
        definition_id: definition_id.to_string(),
        attribute,
      },
    );
    Ok(())
  }

  /// Records what `connector_id` resolved to. Fails if the id was already recorded.
  #[instrument(level = "trace", skip(self, attributes))]
  pub fn record_data_connector_resolution(
    &mut self,
    connector_id: &str,
    attributes: Option<Arc<AttributeMap>>,
  ) -> Result<(), ResolutionError> {
    if self.connectors.contains_key(connector_id) {
      return Err(ResolutionError::AlreadyResolved(connector_id.to_string()));
    }
    self.connectors.insert(
      connector_id.to_string(),
      ResolvedDataConnector {
        connector_id: connector_id.to_string(),
        resolved_by: connector_id.to_string(),
        attributes,
      },
    );
    Ok(())
  }

  /// Records that `failover_id` stands in for `failed_id` for the rest of this resolution.
  ///
  /// The failover must already be recorded; the failed connector must not be.
  /// Later lookups of `failed_id` return the failover's result.
  #[instrument(level = "trace", skip(self))]
  pub fn record_failover_resolution(
    &mut self,
    failed_id: &str,
    failover_id: &str,
  ) -> Result<(), ResolutionError> {
    if self.connectors.contains_key(failed_id) {
      return Err(ResolutionError::AlreadyResolved(failed_id.to_string()));
    }
    let attributes = self
      .connectors
      .get(failover_id)
      .ok_or_else(|| {
        ResolutionError::failed(
          failed_id,
          format!("failover connector '{}' has not been resolved", failover_id),
        )
      })?
      .attributes
      .clone();
    debug!(failed = failed_id, failover = failover_id, "recording failover");
    self.connectors.insert(
      failed_id.to_string(),
      ResolvedDataConnector {
        connector_id: failed_id.to_string(),
        resolved_by: failover_id.to_string(),
        attributes,
      },
    );
    self
      .failovers
      .insert(failed_id.to_string(), failover_id.to_string());
    Ok(())
  }

  /// Read-only view of every recorded attribute definition.
  pub fn resolved_idp_attribute_definitions(&self) -> &HashMap<String, ResolvedAttributeDefinition> {
    &self.definitions
  }

  /// Read-only view of every recorded data connector, failovers included.
  pub fn resolved_data_connectors(&self) -> &HashMap<String, ResolvedDataConnector> {
    &self.connectors
  }

  pub fn resolved_attribute_definition(&self, id: &str) -> Option<&ResolvedAttributeDefinition> {
    self.definitions.get(id)
  }

  pub fn resolved_data_connector(&self, id: &str) -> Option<&ResolvedDataConnector> {
    self.connectors.get(id)
  }

  /// The connector standing in for `failed_id`, if a failover was recorded.
  pub fn failover_for(&self, failed_id: &str) -> Option<&str> {
    self.failovers.get(failed_id).map(String::as_str)
  }
}
