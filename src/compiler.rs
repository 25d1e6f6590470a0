//! Compile a [ResolverConfig] into an initialized [AttributeResolver].
//!
//! Engines and executors are injected through [Collaborators] rather than looked
//! up from global registries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::config::{
  AttributeDefinitionConfig, ConnectorKind, DataConnectorConfig, DefinitionKind, ResolverConfig,
};
use crate::connectors::{
  SearchDataConnector, SearchExecutor, StaticDataConnector, TemplatedSearchBuilder,
};
use crate::definitions::{
  ContextDerivedAttributeDefinition, DateTimeAttributeDefinition, PrescopedAttributeDefinition,
  RegexSplitAttributeDefinition, ScopedAttributeDefinition, ScriptedAttributeDefinition,
  SimpleAttributeDefinition, SubjectDerivedAttributeValuesFunction, TemplateAttributeDefinition,
};
use crate::error::ComponentError;
use crate::plugin::{
  AttributeDefinition, ConnectorBuilderExt, DataConnector, DefinitionBuilderExt, PluginBuilderExt,
};
use crate::resolver::AttributeResolver;
use crate::strategy::{HandlebarsTemplateEngine, TemplateEngine, ValueDerivationStrategy};
use crate::types::{AttributeValue, ResolverPluginDependency};

/// Named collaborators referenced from a configuration.
#[derive(Clone)]
pub struct Collaborators {
  template_engine: Arc<dyn TemplateEngine>,
  search_executors: HashMap<String, Arc<dyn SearchExecutor>>,
  strategies: HashMap<String, Arc<dyn ValueDerivationStrategy>>,
}

impl Default for Collaborators {
  fn default() -> Self {
    Self {
      template_engine: Arc::new(HandlebarsTemplateEngine::new()),
      search_executors: HashMap::new(),
      strategies: HashMap::new(),
    }
  }
}

impl fmt::Debug for Collaborators {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Collaborators")
      .field("search_executors", &self.search_executors.keys().collect::<Vec<_>>())
      .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
      .finish_non_exhaustive()
  }
}

impl Collaborators {
  pub fn new() -> Self {
    Self::default()
  }

  /// Engine used by template definitions and templated search filters.
  pub fn with_template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
    self.template_engine = engine;
    self
  }

  pub fn with_search_executor(mut self, name: impl Into<String>, executor: Arc<dyn SearchExecutor>) -> Self {
    self.search_executors.insert(name.into(), executor);
    self
  }

  pub fn with_strategy(
    mut self,
    name: impl Into<String>,
    strategy: Arc<dyn ValueDerivationStrategy>,
  ) -> Self {
    self.strategies.insert(name.into(), strategy);
    self
  }
}

fn dependencies(
  plugin_id: &str,
  configs: &[crate::config::DependencyConfig],
) -> Result<Vec<ResolverPluginDependency>, ComponentError> {
  configs
    .iter()
    .map(|c| c.to_dependency().map_err(|e| ComponentError::initialization(plugin_id, e)))
    .collect()
}

fn with_definition_settings<D>(
  definition: D,
  config: &AttributeDefinitionConfig,
) -> Result<Box<dyn AttributeDefinition>, ComponentError>
where
  D: AttributeDefinition + 'static,
{
  let mut definition = definition
    .with_propagate_resolution_errors(config.propagate_resolution_errors)
    .with_dependency_only(config.dependency_only);
  for dependency in dependencies(&config.id, &config.dependencies)? {
    definition = definition.with_dependency(dependency);
  }
  if let Some(source) = &config.source_attribute_id {
    definition = definition.with_source_attribute_id(source.as_str());
  }
  for (lang, name) in &config.display_names {
    definition = definition.with_display_name(lang.as_str(), name.as_str());
  }
  for (lang, description) in &config.display_descriptions {
    definition = definition.with_display_description(lang.as_str(), description.as_str());
  }
  Ok(Box::new(definition))
}

fn with_connector_settings<C>(
  connector: C,
  config: &DataConnectorConfig,
) -> Result<Box<dyn DataConnector>, ComponentError>
where
  C: DataConnector + 'static,
{
  let mut connector = connector.with_propagate_resolution_errors(config.propagate_resolution_errors);
  for dependency in dependencies(&config.id, &config.dependencies)? {
    connector = connector.with_dependency(dependency);
  }
  if let Some(failover) = &config.failover_connector_id {
    connector = connector.with_failover_connector(failover.as_str());
  }
  Ok(Box::new(connector))
}

fn compile_definition(
  config: &AttributeDefinitionConfig,
  collaborators: &Collaborators,
) -> Result<Box<dyn AttributeDefinition>, ComponentError> {
  let id = config.id.as_str();
  match &config.kind {
    DefinitionKind::Simple => with_definition_settings(SimpleAttributeDefinition::new(id), config),
    DefinitionKind::Scoped { scope, scope_source } => {
      let mut definition = ScopedAttributeDefinition::new(id);
      if let Some(scope) = scope {
        definition = definition.with_scope(scope.as_str());
      }
      if let Some(source) = scope_source {
        definition = definition.with_scope_source(source.as_str());
      }
      with_definition_settings(definition, config)
    }
    DefinitionKind::Prescoped { scope_delimiter } => with_definition_settings(
      PrescopedAttributeDefinition::new(id).with_scope_delimiter(scope_delimiter.as_str()),
      config,
    ),
    DefinitionKind::Template { template, source_attributes } => with_definition_settings(
      TemplateAttributeDefinition::new(id, template.as_str())
        .with_source_attributes(source_attributes.iter().cloned())
        .with_engine(collaborators.template_engine.clone()),
      config,
    ),
    DefinitionKind::DateTime {
      epoch_unit,
      date_time_pattern,
      ignore_conversion_errors,
    } => {
      let mut definition = DateTimeAttributeDefinition::new(id)
        .with_epoch_unit(*epoch_unit)
        .with_ignore_conversion_errors(*ignore_conversion_errors);
      if let Some(pattern) = date_time_pattern {
        definition = definition.with_date_time_pattern(pattern.as_str());
      }
      with_definition_settings(definition, config)
    }
    DefinitionKind::RegexSplit { regex, case_insensitive } => with_definition_settings(
      RegexSplitAttributeDefinition::new(id, regex.as_str()).with_case_insensitive(*case_insensitive),
      config,
    ),
    DefinitionKind::Scripted { strategy } => {
      let strategy = collaborators.strategies.get(strategy).cloned().ok_or_else(|| {
        ComponentError::initialization(id, format!("no strategy named '{}' was supplied", strategy))
      })?;
      with_definition_settings(ScriptedAttributeDefinition::new(id, strategy), config)
    }
    DefinitionKind::PrincipalName => {
      with_definition_settings(ContextDerivedAttributeDefinition::principal_name(id), config)
    }
    DefinitionKind::RequestProperty { key } => with_definition_settings(
      ContextDerivedAttributeDefinition::request_property(id, key.as_str()),
      config,
    ),
    DefinitionKind::SubjectPrincipalNames => with_definition_settings(
      ContextDerivedAttributeDefinition::subject_derived(
        id,
        SubjectDerivedAttributeValuesFunction::principal_names(),
      ),
      config,
    ),
    DefinitionKind::SubjectAttribute { attribute_id } => with_definition_settings(
      ContextDerivedAttributeDefinition::subject_derived(
        id,
        SubjectDerivedAttributeValuesFunction::attribute_principal_values(attribute_id.as_str()),
      ),
      config,
    ),
  }
}

fn compile_connector(
  config: &DataConnectorConfig,
  collaborators: &Collaborators,
) -> Result<Box<dyn DataConnector>, ComponentError> {
  let id = config.id.as_str();
  match &config.kind {
    ConnectorKind::Static { attributes } => {
      let mut connector = StaticDataConnector::new(id);
      for (name, values) in attributes {
        let values = values.iter().map(|v| AttributeValue::string(v.as_str())).collect();
        connector = connector.with_attribute(name.as_str(), values);
      }
      with_connector_settings(connector, config)
    }
    ConnectorKind::Search {
      filter,
      executor,
      no_result_is_error,
      multiple_results_is_error,
      result_cache,
    } => {
      let executor = collaborators.search_executors.get(executor).cloned().ok_or_else(|| {
        ComponentError::initialization(id, format!("no search executor named '{}' was supplied", executor))
      })?;
      let builder =
        TemplatedSearchBuilder::new(filter.as_str()).with_engine(collaborators.template_engine.clone());
      let mut connector = SearchDataConnector::new(id, Arc::new(builder), executor)
        .with_no_result_is_error(*no_result_is_error)
        .with_multiple_results_is_error(*multiple_results_is_error);
      if let Some(cache) = result_cache {
        connector = connector.with_result_cache(
          cache.max_capacity,
          Duration::from_secs(cache.time_to_live_secs),
        );
      }
      with_connector_settings(connector, config)
    }
  }
}

/// Builds every plugin named by `config` and initializes the resolver.
#[instrument(level = "trace", skip(config, collaborators), fields(resolver = %config.id))]
pub fn compile_resolver(
  config: &ResolverConfig,
  collaborators: &Collaborators,
) -> Result<AttributeResolver, ComponentError> {
  info!("compiling attribute resolver");
  let mut resolver = AttributeResolver::new(config.id.as_str());
  for connector in &config.data_connectors {
    resolver.add_data_connector(compile_connector(connector, collaborators)?);
  }
  for definition in &config.attribute_definitions {
    resolver.add_attribute_definition(compile_definition(definition, collaborators)?);
  }
  resolver.initialize()?;
  Ok(resolver)
}
