//! Pass-through definition: republishes dependency values unchanged.

use crate::dependency_support::merged_attribute_values;
use crate::error::ResolutionError;
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::types::{IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// Copies the merged dependency values, empty markers included, into a new attribute.
#[derive(Debug)]
pub struct SimpleAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
}

impl SimpleAttributeDefinition {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
    }
  }
}

impl ResolverPlugin for SimpleAttributeDefinition {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }

  fn requires_dependencies(&self) -> bool {
    true
  }
}

impl AttributeDefinition for SimpleAttributeDefinition {
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
    let values = merged_attribute_values(work, self.dependencies(), self.source_attribute_id());
    Ok(Some(IdPAttribute::with_values(self.id(), values)))
  }
}
