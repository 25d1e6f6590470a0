//! The attribute resolver: owns the plugins and drives one resolution per request.
//!
//! Plugins are configured once and shared read-only by concurrent resolutions.
//! Each call to [AttributeResolver::resolve_attributes] gets a fresh
//! [AttributeResolverWorkContext]; dependencies are resolved on demand, depth first,
//! and memoized there so every plugin runs at most once per request.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ComponentError, ResolutionError};
use crate::graph::DependencyGraph;
use crate::lifecycle::{ComponentState, Lifecycle};
use crate::plugin::{
  AttributeDefinition, DataConnector, resolve_attribute_definition, resolve_data_connector,
};
use crate::types::{
  AttributeMap, DependencyKind, IdPAttribute, ResolutionContext, ResolverPluginDependency,
};
use crate::work_context::AttributeResolverWorkContext;

/// Attributes released by one resolution, keyed by definition id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedAttributes {
  attributes: AttributeMap,
}

impl ResolvedAttributes {
  pub fn get(&self, id: &str) -> Option<&IdPAttribute> {
    self.attributes.get(id)
  }

  pub fn len(&self) -> usize {
    self.attributes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.attributes.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.attributes.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = &IdPAttribute> {
    self.attributes.values()
  }

  pub fn into_inner(self) -> AttributeMap {
    self.attributes
  }
}

pub struct AttributeResolver {
  id: String,
  definitions: Vec<Box<dyn AttributeDefinition>>,
  connectors: Vec<Box<dyn DataConnector>>,
  definition_index: HashMap<String, usize>,
  connector_index: HashMap<String, usize>,
  graph: Option<DependencyGraph>,
  lifecycle: Lifecycle,
}

impl fmt::Debug for AttributeResolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AttributeResolver")
      .field("id", &self.id)
      .field("definitions", &self.definitions.iter().map(|d| d.id()).collect::<Vec<_>>())
      .field("connectors", &self.connectors.iter().map(|c| c.id()).collect::<Vec<_>>())
      .field("state", &self.lifecycle.state())
      .finish_non_exhaustive()
  }
}

impl AttributeResolver {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      definitions: Vec::new(),
      connectors: Vec::new(),
      definition_index: HashMap::new(),
      connector_index: HashMap::new(),
      graph: None,
      lifecycle: Lifecycle::new(),
    }
  }

  pub fn with_attribute_definition(mut self, definition: impl AttributeDefinition + 'static) -> Self {
    self.add_attribute_definition(Box::new(definition));
    self
  }

  pub fn with_data_connector(mut self, connector: impl DataConnector + 'static) -> Self {
    self.add_data_connector(Box::new(connector));
    self
  }

  pub fn add_attribute_definition(&mut self, definition: Box<dyn AttributeDefinition>) {
    self.definitions.push(definition);
  }

  pub fn add_data_connector(&mut self, connector: Box<dyn DataConnector>) {
    self.connectors.push(connector);
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn state(&self) -> ComponentState {
    self.lifecycle.state()
  }

  pub fn attribute_definition(&self, id: &str) -> Option<&dyn AttributeDefinition> {
    self
      .definition_index
      .get(id)
      .map(|i| self.definitions[*i].as_ref())
  }

  pub fn data_connector(&self, id: &str) -> Option<&dyn DataConnector> {
    self
      .connector_index
      .get(id)
      .map(|i| self.connectors[*i].as_ref())
  }

  /// Initializes every plugin that is not yet initialized, then validates the
  /// dependency graph.
  #[instrument(level = "trace", skip(self), fields(resolver = %self.id))]
  pub fn initialize(&mut self) -> Result<(), ComponentError> {
    self.lifecycle.check_initializable(&self.id)?;
    for definition in &mut self.definitions {
      if definition.state() == ComponentState::Unconfigured {
        definition.initialize()?;
      }
    }
    for connector in &mut self.connectors {
      if connector.state() == ComponentState::Unconfigured {
        connector.initialize()?;
      }
    }

    let graph = DependencyGraph::build(&self.id, &self.definitions, &self.connectors)?;
    self.definition_index = self
      .definitions
      .iter()
      .enumerate()
      .map(|(i, d)| (d.id().to_string(), i))
      .collect();
    self.connector_index = self
      .connectors
      .iter()
      .enumerate()
      .map(|(i, c)| (c.id().to_string(), i))
      .collect();
    self.graph = Some(graph);
    self.lifecycle.mark_initialized();
    info!(
      resolver = %self.id,
      definitions = self.definitions.len(),
      connectors = self.connectors.len(),
      "attribute resolver initialized"
    );
    Ok(())
  }

  /// Validates every plugin, e.g. checking that directories are reachable.
  pub fn validate(&self) -> Result<(), ComponentError> {
    self.lifecycle.ensure_active(&self.id)?;
    for connector in &self.connectors {
      connector.validate()?;
    }
    for definition in &self.definitions {
      definition.validate()?;
    }
    Ok(())
  }

  pub fn destroy(&mut self) {
    if self.lifecycle.is_destroyed() {
      return;
    }
    for definition in &mut self.definitions {
      definition.destroy();
    }
    for connector in &mut self.connectors {
      connector.destroy();
    }
    self.lifecycle.destroy();
    info!(resolver = %self.id, "attribute resolver destroyed");
  }

  /// Resolves the attributes requested by `context` (all of them when it requests
  /// none) and returns what is released.
  ///
  /// Released: every recorded, non dependency-only definition that produced at
  /// least one value.
  #[instrument(level = "trace", skip_all, fields(resolver = %self.id, request = %context.request_id()))]
  pub fn resolve_attributes(
    &self,
    context: &ResolutionContext,
  ) -> Result<ResolvedAttributes, ResolutionError> {
    self.lifecycle.ensure_active(&self.id)?;
    let graph = self
      .graph
      .as_ref()
      .ok_or_else(|| ComponentError::Uninitialized(self.id.clone()))?;

    let targets: Vec<&str> = if context.requested_attribute_ids().is_empty() {
      graph.definition_order().collect()
    } else {
      context
        .requested_attribute_ids()
        .iter()
        .map(String::as_str)
        .filter(|id| {
          let known = self.definition_index.contains_key(*id);
          if !known {
            debug!(attribute = %id, "requested attribute has no definition");
          }
          known
        })
        .collect()
    };

    let mut work = AttributeResolverWorkContext::new();
    for id in targets {
      self.resolve_definition(id, context, &mut work)?;
    }

    let resolved = self.finalize(&work);
    info!(
      principal = context.principal().unwrap_or_default(),
      released = resolved.len(),
      "attribute resolution complete"
    );
    Ok(resolved)
  }

  fn finalize(&self, work: &AttributeResolverWorkContext) -> ResolvedAttributes {
    let mut attributes = AttributeMap::new();
    for (id, resolved) in work.resolved_idp_attribute_definitions() {
      let Some(definition) = self.attribute_definition(id) else {
        continue;
      };
      if definition.is_dependency_only() {
        debug!(attribute = %id, "dependency-only attribute not released");
        continue;
      }
      match resolved.attribute() {
        Some(attribute) if attribute.has_values() => {
          attributes.insert(id.clone(), attribute.as_ref().clone());
        }
        Some(_) => debug!(attribute = %id, "attribute has no values, not released"),
        None => {}
      }
    }
    ResolvedAttributes { attributes }
  }

  fn resolve_dependencies(
    &self,
    dependencies: &[ResolverPluginDependency],
    context: &ResolutionContext,
    work: &mut AttributeResolverWorkContext,
  ) -> Result<(), ResolutionError> {
    for dependency in dependencies {
      match dependency.kind() {
        DependencyKind::AttributeDefinition => {
          self.resolve_definition(dependency.plugin_id(), context, work)?
        }
        DependencyKind::DataConnector => {
          self.resolve_connector(dependency.plugin_id(), context, work)?
        }
      }
    }
    Ok(())
  }

  fn resolve_definition(
    &self,
    id: &str,
    context: &ResolutionContext,
    work: &mut AttributeResolverWorkContext,
  ) -> Result<(), ResolutionError> {
    let definition = self
      .attribute_definition(id)
      .ok_or_else(|| ResolutionError::UnknownPlugin(id.to_string()))?;
    if work.resolved_attribute_definition(id).is_some() {
      return Ok(());
    }
    if definition.settings().is_active(context) {
      self.resolve_dependencies(definition.dependencies(), context, work)?;
    }
    resolve_attribute_definition(definition, context, work)?;
    Ok(())
  }

  fn resolve_connector(
    &self,
    id: &str,
    context: &ResolutionContext,
    work: &mut AttributeResolverWorkContext,
  ) -> Result<(), ResolutionError> {
    let connector = self
      .data_connector(id)
      .ok_or_else(|| ResolutionError::UnknownPlugin(id.to_string()))?;
    if work.resolved_data_connector(id).is_some() {
      return Ok(());
    }
    if connector.settings().is_active(context) {
      self.resolve_dependencies(connector.dependencies(), context, work)?;
    }
    match resolve_data_connector(connector, context, work) {
      Ok(_) => Ok(()),
      Err(error) if error.is_maskable() => {
        let Some(failover_id) = connector.failover_connector_id() else {
          return Err(error);
        };
        warn!(connector = %id, failover = %failover_id, error = %error, "connector failed, using failover");
        self.resolve_connector(failover_id, context, work)?;
        work.record_failover_resolution(id, failover_id)
      }
      Err(error) => Err(error),
    }
  }
}
