//! Template definition: renders one string per positional tuple of source values.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::dependency_support::all_attribute_values;
use crate::error::{ComponentError, ResolutionError, UnsupportedAttributeTypeError};
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::strategy::{HandlebarsTemplateEngine, TemplateEngine};
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// Evaluates a template N times, where N is the shared value count of every
/// source attribute. Source attributes with differing counts are an error.
///
/// Null and zero-length markers bind as the empty string. Source attributes that
/// are absent altogether are left unbound. With no `source_attributes`
/// configured, every attribute visible through the dependencies is a source.
pub struct TemplateAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  template: String,
  source_attributes: Vec<String>,
  engine: Arc<dyn TemplateEngine>,
}

impl TemplateAttributeDefinition {
  pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      template: template.into(),
      source_attributes: Vec::new(),
      engine: Arc::new(HandlebarsTemplateEngine::new()),
    }
  }

  pub fn with_source_attributes<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.source_attributes = names.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
    self.engine = engine;
    self
  }

  fn binding_text(&self, value: &AttributeValue) -> Result<String, ResolutionError> {
    match value {
      AttributeValue::String(s) => Ok(s.clone()),
      AttributeValue::Scoped(scoped) => Ok(scoped.value.clone()),
      AttributeValue::Empty(_) => Ok(String::new()),
      other => Err(UnsupportedAttributeTypeError::new(self.id(), other.type_name()).into()),
    }
  }
}

impl ResolverPlugin for TemplateAttributeDefinition {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }

  fn requires_dependencies(&self) -> bool {
    true
  }

  fn do_initialize(&mut self) -> Result<(), ComponentError> {
    if self.template.trim().is_empty() {
      return Err(ComponentError::initialization(self.id(), "template is empty"));
    }
    self
      .engine
      .check(&self.template)
      .map_err(|e| ComponentError::initialization(self.id(), format!("invalid template: {}", e)))
  }
}

impl AttributeDefinition for TemplateAttributeDefinition {
  fn definition_settings(&self) -> &DefinitionSettings {
    &self.definition
  }

  fn definition_settings_mut(&mut self) -> &mut DefinitionSettings {
    &mut self.definition
  }

  #[instrument(level = "trace", skip_all, fields(definition = %self.id()))]
  fn do_attribute_definition_resolve(
    &self,
    _context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<IdPAttribute>, ResolutionError> {
    let mut available = all_attribute_values(work, self.dependencies());
    let names: Vec<String> = if self.source_attributes.is_empty() {
      available.keys().cloned().collect()
    } else {
      self.source_attributes.clone()
    };

    let mut columns: Vec<(String, Vec<String>)> = Vec::with_capacity(names.len());
    let mut cardinality: Option<(String, usize)> = None;
    for name in names {
      let Some(values) = available.remove(&name) else {
        debug!(source = %name, "source attribute absent, leaving it unbound");
        continue;
      };
      match &cardinality {
        Some((first, n)) if *n != values.len() => {
          return Err(ResolutionError::failed(
            self.id(),
            format!(
              "source attribute '{}' has {} values but '{}' has {}",
              name,
              values.len(),
              first,
              n
            ),
          ));
        }
        Some(_) => {}
        None => cardinality = Some((name.clone(), values.len())),
      }
      let texts = values
        .iter()
        .map(|v| self.binding_text(v))
        .collect::<Result<Vec<_>, _>>()?;
      columns.push((name, texts));
    }

    let rows = cardinality.map(|(_, n)| n).unwrap_or(0);
    let mut attribute = IdPAttribute::new(self.id());
    for row in 0..rows {
      let mut bindings = Map::new();
      for (name, texts) in &columns {
        bindings.insert(name.clone(), Value::String(texts[row].clone()));
      }
      let rendered = self
        .engine
        .render(&self.template, &Value::Object(bindings))
        .map_err(|e| ResolutionError::failed(self.id(), format!("template evaluation failed: {}", e)))?;
      attribute.add_value(AttributeValue::String(rendered));
    }
    Ok(Some(attribute))
  }
}
