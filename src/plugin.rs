//! Resolver plugin capabilities and the shared resolve discipline.
//!
//! Every attribute definition and data connector is a [ResolverPlugin]: it has an id,
//! declared dependencies, an error policy and a [Lifecycle]. The free functions
//! [resolve_attribute_definition] and [resolve_data_connector] wrap the plugin-specific
//! computation with the lifecycle check, activation condition, memoization and the
//! mask-vs-propagate policy. They never resolve dependencies themselves; the
//! orchestrator guarantees those are recorded first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::error::{ComponentError, ResolutionError};
use crate::lifecycle::{ComponentState, Lifecycle};
use crate::types::{AttributeMap, IdPAttribute, ResolutionContext, ResolverPluginDependency};
use crate::work_context::AttributeResolverWorkContext;

/// Predicate deciding whether a plugin takes part in a given resolution.
pub type ActivationCondition = Arc<dyn Fn(&ResolutionContext) -> bool + Send + Sync>;

/// Settings common to every resolver plugin.
#[derive(Clone)]
pub struct PluginSettings {
  pub id: String,
  pub dependencies: Vec<ResolverPluginDependency>,
  /// When false, runtime failures are logged and recorded as "resolved to nothing".
  pub propagate_resolution_errors: bool,
  pub activation_condition: Option<ActivationCondition>,
  pub lifecycle: Lifecycle,
}

impl PluginSettings {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      dependencies: Vec::new(),
      propagate_resolution_errors: true,
      activation_condition: None,
      lifecycle: Lifecycle::new(),
    }
  }

  pub fn is_active(&self, context: &ResolutionContext) -> bool {
    self
      .activation_condition
      .as_ref()
      .map(|condition| condition(context))
      .unwrap_or(true)
  }
}

impl fmt::Debug for PluginSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PluginSettings")
      .field("id", &self.id)
      .field("dependencies", &self.dependencies)
      .field("propagate_resolution_errors", &self.propagate_resolution_errors)
      .field("has_activation_condition", &self.activation_condition.is_some())
      .field("state", &self.lifecycle.state())
      .finish()
  }
}

/// Settings specific to attribute definitions.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSettings {
  /// Resolved for dependents but left out of the final attribute set.
  pub dependency_only: bool,
  /// Connector attribute read by this definition; defaults to the definition id.
  pub source_attribute_id: Option<String>,
  pub display_names: BTreeMap<String, String>,
  pub display_descriptions: BTreeMap<String, String>,
}

impl DefinitionSettings {
  fn decorate(&self, mut attribute: IdPAttribute) -> IdPAttribute {
    if !self.display_names.is_empty() {
      attribute.set_display_names(self.display_names.clone());
    }
    if !self.display_descriptions.is_empty() {
      attribute.set_display_descriptions(self.display_descriptions.clone());
    }
    attribute
  }
}

/// Settings specific to data connectors.
#[derive(Debug, Clone, Default)]
pub struct ConnectorSettings {
  /// Connector consulted in place of this one when it fails.
  pub failover_connector_id: Option<String>,
}

/// Identity, dependencies and lifecycle of a resolver plugin.
pub trait ResolverPlugin: Send + Sync {
  fn settings(&self) -> &PluginSettings;

  fn settings_mut(&mut self) -> &mut PluginSettings;

  fn id(&self) -> &str {
    &self.settings().id
  }

  fn dependencies(&self) -> &[ResolverPluginDependency] {
    &self.settings().dependencies
  }

  fn state(&self) -> ComponentState {
    self.settings().lifecycle.state()
  }

  /// Whether initialization must fail when no dependency is configured.
  fn requires_dependencies(&self) -> bool {
    false
  }

  /// Plugin-specific initialization checks.
  fn do_initialize(&mut self) -> Result<(), ComponentError> {
    Ok(())
  }

  fn do_validate(&self) -> Result<(), ComponentError> {
    Ok(())
  }

  fn do_destroy(&mut self) {}

  fn initialize(&mut self) -> Result<(), ComponentError> {
    let id = self.id().to_string();
    self.settings().lifecycle.check_initializable(&id)?;
    if self.requires_dependencies() && self.dependencies().is_empty() {
      return Err(ComponentError::initialization(
        id,
        "no dependencies were configured",
      ));
    }
    self.do_initialize()?;
    self.settings_mut().lifecycle.mark_initialized();
    debug!(plugin = %id, "plugin initialized");
    Ok(())
  }

  fn validate(&self) -> Result<(), ComponentError> {
    self.settings().lifecycle.ensure_active(self.id())?;
    self.do_validate()
  }

  fn destroy(&mut self) {
    if !self.settings().lifecycle.is_destroyed() {
      self.do_destroy();
      self.settings_mut().lifecycle.destroy();
    }
  }
}

/// A plugin producing one named attribute.
pub trait AttributeDefinition: ResolverPlugin {
  fn definition_settings(&self) -> &DefinitionSettings;

  fn definition_settings_mut(&mut self) -> &mut DefinitionSettings;

  /// Id of the connector attribute this definition reads.
  fn source_attribute_id(&self) -> &str {
    self
      .definition_settings()
      .source_attribute_id
      .as_deref()
      .unwrap_or_else(|| self.id())
  }

  fn is_dependency_only(&self) -> bool {
    self.definition_settings().dependency_only
  }

  /// Computes this definition's attribute from already-recorded dependency results.
  fn do_attribute_definition_resolve(
    &self,
    context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<IdPAttribute>, ResolutionError>;
}

/// A plugin producing a map of raw attributes from some source.
pub trait DataConnector: ResolverPlugin {
  fn connector_settings(&self) -> &ConnectorSettings;

  fn connector_settings_mut(&mut self) -> &mut ConnectorSettings;

  fn failover_connector_id(&self) -> Option<&str> {
    self.connector_settings().failover_connector_id.as_deref()
  }

  fn do_data_connector_resolve(
    &self,
    context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<AttributeMap>, ResolutionError>;
}

/// Builder methods available on every plugin.
pub trait PluginBuilderExt: ResolverPlugin + Sized {
  fn with_dependency(mut self, dependency: ResolverPluginDependency) -> Self {
    self.settings_mut().dependencies.push(dependency);
    self
  }

  fn with_propagate_resolution_errors(mut self, propagate: bool) -> Self {
    self.settings_mut().propagate_resolution_errors = propagate;
    self
  }

  fn with_activation_condition<F>(mut self, condition: F) -> Self
  where
    F: Fn(&ResolutionContext) -> bool + Send + Sync + 'static,
  {
    self.settings_mut().activation_condition = Some(Arc::new(condition));
    self
  }
}

impl<T: ResolverPlugin + Sized> PluginBuilderExt for T {}

/// Builder methods available on attribute definitions.
pub trait DefinitionBuilderExt: AttributeDefinition + Sized {
  fn with_dependency_only(mut self, dependency_only: bool) -> Self {
    self.definition_settings_mut().dependency_only = dependency_only;
    self
  }

  fn with_source_attribute_id(mut self, source: impl Into<String>) -> Self {
    self.definition_settings_mut().source_attribute_id = Some(source.into());
    self
  }

  fn with_display_name(mut self, lang: impl Into<String>, name: impl Into<String>) -> Self {
    self
      .definition_settings_mut()
      .display_names
      .insert(lang.into(), name.into());
    self
  }

  fn with_display_description(
    mut self,
    lang: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    self
      .definition_settings_mut()
      .display_descriptions
      .insert(lang.into(), description.into());
    self
  }
}

impl<T: AttributeDefinition + Sized> DefinitionBuilderExt for T {}

/// Builder methods available on data connectors.
pub trait ConnectorBuilderExt: DataConnector + Sized {
  fn with_failover_connector(mut self, failover_id: impl Into<String>) -> Self {
    self.connector_settings_mut().failover_connector_id = Some(failover_id.into());
    self
  }
}

impl<T: DataConnector + Sized> ConnectorBuilderExt for T {}

/// Applies the plugin's error policy to a failed computation.
fn mask_or_propagate<T>(
  settings: &PluginSettings,
  error: ResolutionError,
) -> Result<Option<T>, ResolutionError> {
  if error.is_maskable() && !settings.propagate_resolution_errors {
    info!(plugin = %settings.id, error = %error, "masking resolution failure");
    Ok(None)
  } else {
    Err(error)
  }
}

/// Resolves one attribute definition at most once per work context.
///
/// A second call within the same work context returns the recorded result
/// without running the computation again.
#[instrument(level = "trace", skip_all, fields(definition = %definition.id()))]
pub fn resolve_attribute_definition(
  definition: &dyn AttributeDefinition,
  context: &ResolutionContext,
  work: &mut AttributeResolverWorkContext,
) -> Result<Option<Arc<IdPAttribute>>, ResolutionError> {
  let settings = definition.settings();
  settings.lifecycle.ensure_active(&settings.id)?;
  if let Some(resolved) = work.resolved_attribute_definition(&settings.id) {
    trace!("already resolved");
    return Ok(resolved.attribute().cloned());
  }

  let attribute = if !settings.is_active(context) {
    debug!(plugin = %settings.id, "definition inactive for this request");
    None
  } else {
    match definition.do_attribute_definition_resolve(context, work) {
      Ok(attribute) => attribute.map(|a| definition.definition_settings().decorate(a)),
      Err(e) => mask_or_propagate(settings, e)?,
    }
  };

  let attribute = attribute.map(Arc::new);
  work.record_attribute_definition_resolution(&settings.id, attribute.clone())?;
  Ok(attribute)
}

/// Resolves one data connector at most once per work context.
///
/// Failover is not handled here: an unmasked error is returned so the orchestrator
/// can consult the configured failover connector.
#[instrument(level = "trace", skip_all, fields(connector = %connector.id()))]
pub fn resolve_data_connector(
  connector: &dyn DataConnector,
  context: &ResolutionContext,
  work: &mut AttributeResolverWorkContext,
) -> Result<Option<Arc<AttributeMap>>, ResolutionError> {
  let settings = connector.settings();
  settings.lifecycle.ensure_active(&settings.id)?;
  if let Some(resolved) = work.resolved_data_connector(&settings.id) {
    trace!("already resolved");
    return Ok(resolved.attributes().cloned());
  }

  let attributes = if !settings.is_active(context) {
    debug!(plugin = %settings.id, "connector inactive for this request");
    None
  } else {
    match connector.do_data_connector_resolve(context, work) {
      Ok(attributes) => attributes,
      Err(e) => mask_or_propagate(settings, e)?,
    }
  };

  let attributes = attributes.map(Arc::new);
  work.record_data_connector_resolution(&settings.id, attributes.clone())?;
  Ok(attributes)
}
