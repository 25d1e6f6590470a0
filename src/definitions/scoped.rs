//! Scoped definition: attaches a scope to every string dependency value.

use tracing::debug;

use crate::dependency_support::{
  all_attribute_values, merged_attribute_values, without_empty_markers,
};
use crate::error::{ComponentError, ResolutionError, UnsupportedAttributeTypeError};
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// Produces scoped values from string dependency values.
///
/// The scope is either static (`scope`) or read from a single-valued dependency
/// attribute (`scope_source`); exactly one must be configured.
#[derive(Debug)]
pub struct ScopedAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  scope: Option<String>,
  scope_source: Option<String>,
}

impl ScopedAttributeDefinition {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      scope: None,
      scope_source: None,
    }
  }

  pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
    self.scope = Some(scope.into());
    self
  }

  pub fn with_scope_source(mut self, attribute_id: impl Into<String>) -> Self {
    self.scope_source = Some(attribute_id.into());
    self
  }

  fn resolve_scope(&self, work: &AttributeResolverWorkContext) -> Result<String, ResolutionError> {
    if let Some(scope) = &self.scope {
      return Ok(scope.clone());
    }
    let source = self.scope_source.as_deref().unwrap_or_default();
    let values = all_attribute_values(work, self.dependencies())
      .remove(source)
      .map(without_empty_markers)
      .unwrap_or_default();
    match values.as_slice() {
      [] => Err(ResolutionError::failed(
        self.id(),
        format!("scope source attribute '{}' produced no values", source),
      )),
      [AttributeValue::String(scope)] => Ok(scope.clone()),
      [other] => Err(UnsupportedAttributeTypeError::new(self.id(), other.type_name()).into()),
      _ => Err(ResolutionError::failed(
        self.id(),
        format!(
          "scope source attribute '{}' has {} values, expected one",
          source,
          values.len()
        ),
      )),
    }
  }
}

impl ResolverPlugin for ScopedAttributeDefinition {
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
    match (&self.scope, &self.scope_source) {
      (Some(_), Some(_)) => Err(ComponentError::initialization(
        self.id(),
        "scope and scope source cannot both be set",
      )),
      (None, None) => Err(ComponentError::initialization(
        self.id(),
        "either a scope or a scope source is required",
      )),
      _ => Ok(()),
    }
  }
}

impl AttributeDefinition for ScopedAttributeDefinition {
  fn definition_settings(&self) -> &DefinitionSettings {
    &self.definition
  }

  fn definition_settings_mut(&mut self) -> &mut DefinitionSettings {
    &mut self.definition
  }

  fn do_attribute_definition_resolve(
    &self,
    _context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<IdPAttribute>, ResolutionError> {
    let scope = self.resolve_scope(work)?;
    let mut attribute = IdPAttribute::new(self.id());
    for value in merged_attribute_values(work, self.dependencies(), self.source_attribute_id()) {
      match value {
        AttributeValue::String(s) => attribute.add_value(AttributeValue::scoped(s, scope.clone())),
        AttributeValue::Empty(_) => debug!(definition = self.id(), "skipping empty value"),
        other => {
          return Err(UnsupportedAttributeTypeError::new(self.id(), other.type_name()).into());
        }
      }
    }
    Ok(Some(attribute))
  }
}
