//! Prescoped definition: splits `value<delimiter>scope` strings into scoped values.

use tracing::debug;

use crate::dependency_support::merged_attribute_values;
use crate::error::{ComponentError, ResolutionError, UnsupportedAttributeTypeError};
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

pub const DEFAULT_SCOPE_DELIMITER: &str = "@";

/// Splits each string value at the first delimiter. A value without the
/// delimiter is a resolution failure.
#[derive(Debug)]
pub struct PrescopedAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  scope_delimiter: String,
}

impl PrescopedAttributeDefinition {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      scope_delimiter: DEFAULT_SCOPE_DELIMITER.to_string(),
    }
  }

  pub fn with_scope_delimiter(mut self, delimiter: impl Into<String>) -> Self {
    self.scope_delimiter = delimiter.into();
    self
  }
}

impl ResolverPlugin for PrescopedAttributeDefinition {
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
    if self.scope_delimiter.is_empty() {
      return Err(ComponentError::initialization(
        self.id(),
        "scope delimiter cannot be empty",
      ));
    }
    Ok(())
  }
}

impl AttributeDefinition for PrescopedAttributeDefinition {
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
    let mut attribute = IdPAttribute::new(self.id());
    for value in merged_attribute_values(work, self.dependencies(), self.source_attribute_id()) {
      match value {
        AttributeValue::String(s) => {
          let (value, scope) = s.split_once(self.scope_delimiter.as_str()).ok_or_else(|| {
            ResolutionError::failed(
              self.id(),
              format!(
                "value '{}' does not contain the delimiter '{}'",
                s, self.scope_delimiter
              ),
            )
          })?;
          attribute.add_value(AttributeValue::scoped(value, scope));
        }
        AttributeValue::Empty(_) => debug!(definition = self.id(), "skipping empty value"),
        other => {
          return Err(UnsupportedAttributeTypeError::new(self.id(), other.type_name()).into());
        }
      }
    }
    Ok(Some(attribute))
  }
}
