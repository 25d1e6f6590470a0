//! Search-backed connector: build a search, execute it, map the entries to attributes.
//!
//! The optional result cache is the only state shared between concurrent
//! resolutions. It is a `moka` concurrent cache keyed by the executable search's
//! cache key, and it is emptied whenever it is reconfigured or the connector is
//! destroyed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, trace};

use crate::dependency_support::all_attribute_values;
use crate::error::{ComponentError, ResolutionError};
use crate::plugin::{ConnectorSettings, DataConnector, PluginSettings, ResolverPlugin};
use crate::strategy::{HandlebarsTemplateEngine, TemplateEngine, ValueBindings};
use crate::types::{AttributeMap, AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// One directory entry: attribute name to string values.
pub type SearchEntry = BTreeMap<String, Vec<String>>;

/// A fully built search, ready for a [SearchExecutor].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableSearch {
  filter: String,
}

impl ExecutableSearch {
  pub fn new(filter: impl Into<String>) -> Self {
    Self {
      filter: filter.into(),
    }
  }

  pub fn filter(&self) -> &str {
    &self.filter
  }

  pub fn result_cache_key(&self) -> String {
    self.filter.clone()
  }
}

/// Builds the search for one resolution.
pub trait SearchBuilder: Send + Sync {
  /// Checks the builder's own configuration. Called at connector initialization.
  fn check(&self) -> Result<(), String> {
    Ok(())
  }

  fn build(
    &self,
    context: &ResolutionContext,
    dependency_values: &ValueBindings,
  ) -> Result<ExecutableSearch, String>;
}

/// Runs searches against a directory (LDAP or equivalent).
pub trait SearchExecutor: Send + Sync {
  fn search(&self, search: &ExecutableSearch) -> Result<Vec<SearchEntry>, String>;

  /// Checks connectivity. Called by component validation.
  fn validate(&self) -> Result<(), String> {
    Ok(())
  }
}

/// Escapes filter metacharacters per RFC 4515.
pub fn escape_filter_value(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '*' => escaped.push_str("\\2a"),
      '(' => escaped.push_str("\\28"),
      ')' => escaped.push_str("\\29"),
      '\\' => escaped.push_str("\\5c"),
      '\0' => escaped.push_str("\\00"),
      c => escaped.push(c),
    }
  }
  escaped
}

/// Renders a filter template.
///
/// Bindings: `principal`, `requester` and `issuer` (strings, empty when unknown)
/// and one array per dependency attribute id, so `{{uid.[0]}}` reads the first
/// `uid` value. Every bound value is filter-escaped; empty markers are dropped.
pub struct TemplatedSearchBuilder {
  template: String,
  engine: Arc<dyn TemplateEngine>,
}

impl TemplatedSearchBuilder {
  pub fn new(template: impl Into<String>) -> Self {
    Self {
      template: template.into(),
      engine: Arc::new(HandlebarsTemplateEngine::new()),
    }
  }

  pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
    self.engine = engine;
    self
  }
}

impl SearchBuilder for TemplatedSearchBuilder {
  fn check(&self) -> Result<(), String> {
    if self.template.trim().is_empty() {
      return Err("search filter template is empty".to_string());
    }
    self.engine.check(&self.template)
  }

  fn build(
    &self,
    context: &ResolutionContext,
    dependency_values: &ValueBindings,
  ) -> Result<ExecutableSearch, String> {
    let mut bindings = Map::new();
    for (name, values) in dependency_values {
      let escaped = values
        .iter()
        .filter(|v| !v.is_empty_marker())
        .map(|v| Value::String(escape_filter_value(&v.to_string())))
        .collect();
      bindings.insert(name.clone(), Value::Array(escaped));
    }
    let text = |v: Option<&str>| Value::String(escape_filter_value(v.unwrap_or_default()));
    bindings.insert("principal".into(), text(context.principal()));
    bindings.insert("requester".into(), text(context.attribute_recipient_id()));
    bindings.insert("issuer".into(), text(context.attribute_issuer_id()));

    let filter = self.engine.render(&self.template, &Value::Object(bindings))?;
    Ok(ExecutableSearch::new(filter))
  }
}

/// Connector that searches a directory and merges the result entries into one
/// attribute map of string values.
pub struct SearchDataConnector {
  settings: PluginSettings,
  connector: ConnectorSettings,
  builder: Arc<dyn SearchBuilder>,
  executor: Arc<dyn SearchExecutor>,
  no_result_is_error: bool,
  multiple_results_is_error: bool,
  result_cache: Option<Cache<String, Arc<AttributeMap>>>,
}

impl SearchDataConnector {
  pub fn new(
    id: impl Into<String>,
    builder: Arc<dyn SearchBuilder>,
    executor: Arc<dyn SearchExecutor>,
  ) -> Self {
    Self {
      settings: PluginSettings::new(id),
      connector: ConnectorSettings::default(),
      builder,
      executor,
      no_result_is_error: false,
      multiple_results_is_error: false,
      result_cache: None,
    }
  }

  pub fn with_no_result_is_error(mut self, value: bool) -> Self {
    self.no_result_is_error = value;
    self
  }

  pub fn with_multiple_results_is_error(mut self, value: bool) -> Self {
    self.multiple_results_is_error = value;
    self
  }

  pub fn with_result_cache(mut self, max_capacity: u64, time_to_live: Duration) -> Self {
    self.reconfigure_result_cache(max_capacity, time_to_live);
    self
  }

  /// Replaces the result cache; every previously cached result is discarded.
  pub fn reconfigure_result_cache(&mut self, max_capacity: u64, time_to_live: Duration) {
    self.invalidate_result_cache();
    self.result_cache = Some(
      Cache::builder()
        .max_capacity(max_capacity)
        .time_to_live(time_to_live)
        .build(),
    );
  }

  pub fn invalidate_result_cache(&self) {
    if let Some(cache) = &self.result_cache {
      info!(connector = self.id(), "invalidating search result cache");
      cache.invalidate_all();
    }
  }

  fn map_entries(&self, entries: Vec<SearchEntry>) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    for entry in entries {
      for (name, values) in entry {
        let attribute = attributes
          .entry(name.clone())
          .or_insert_with(|| IdPAttribute::new(name));
        for value in values {
          attribute.add_value(AttributeValue::String(value));
        }
      }
    }
    attributes
  }
}

impl fmt::Debug for SearchDataConnector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SearchDataConnector")
      .field("settings", &self.settings)
      .field("no_result_is_error", &self.no_result_is_error)
      .field("multiple_results_is_error", &self.multiple_results_is_error)
      .field("cached", &self.result_cache.is_some())
      .finish_non_exhaustive()
  }
}

impl ResolverPlugin for SearchDataConnector {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }

  fn do_initialize(&mut self) -> Result<(), ComponentError> {
    self
      .builder
      .check()
      .map_err(|e| ComponentError::initialization(self.id(), e))
  }

  fn do_validate(&self) -> Result<(), ComponentError> {
    self
      .executor
      .validate()
      .map_err(|e| ComponentError::validation(self.id(), e))
  }

  fn do_destroy(&mut self) {
    self.invalidate_result_cache();
  }
}

impl DataConnector for SearchDataConnector {
  fn connector_settings(&self) -> &ConnectorSettings {
    &self.connector
  }

  fn connector_settings_mut(&mut self) -> &mut ConnectorSettings {
    &mut self.connector
  }

  #[instrument(level = "trace", skip_all, fields(connector = %self.id()))]
  fn do_data_connector_resolve(
    &self,
    context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<AttributeMap>, ResolutionError> {
    let bindings = all_attribute_values(work, self.dependencies());
    let search = self
      .builder
      .build(context, &bindings)
      .map_err(|e| ResolutionError::failed(self.id(), format!("unable to build search: {}", e)))?;
    let cache_key = search.result_cache_key();

    if let Some(cached) = self.result_cache.as_ref().and_then(|c| c.get(&cache_key)) {
      trace!(key = %cache_key, "search result cache hit");
      return Ok(Some(cached.as_ref().clone()));
    }

    debug!(filter = search.filter(), "executing search");
    let entries = self
      .executor
      .search(&search)
      .map_err(|e| ResolutionError::failed(self.id(), format!("search failed: {}", e)))?;

    if entries.is_empty() {
      if self.no_result_is_error {
        return Err(ResolutionError::failed(self.id(), "search returned no results"));
      }
      return Ok(None);
    }
    if entries.len() > 1 && self.multiple_results_is_error {
      return Err(ResolutionError::failed(
        self.id(),
        format!("search returned {} results, expected one", entries.len()),
      ));
    }

    let attributes = self.map_entries(entries);
    if attributes.is_empty() {
      return Ok(None);
    }
    if let Some(cache) = &self.result_cache {
      cache.insert(cache_key, Arc::new(attributes.clone()));
    }
    Ok(Some(attributes))
  }
}
