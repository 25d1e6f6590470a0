//! Scripted definition: delegates value derivation to an injected strategy.

use std::fmt;
use std::sync::Arc;

use crate::dependency_support::all_attribute_values;
use crate::error::ResolutionError;
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::strategy::ValueDerivationStrategy;
use crate::types::{IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// Passes every dependency value, keyed by attribute id, to a
/// [ValueDerivationStrategy] and publishes what it returns.
pub struct ScriptedAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  strategy: Arc<dyn ValueDerivationStrategy>,
}

impl ScriptedAttributeDefinition {
  pub fn new(id: impl Into<String>, strategy: Arc<dyn ValueDerivationStrategy>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      strategy,
    }
  }
}

impl fmt::Debug for ScriptedAttributeDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ScriptedAttributeDefinition")
      .field("settings", &self.settings)
      .finish_non_exhaustive()
  }
}

impl ResolverPlugin for ScriptedAttributeDefinition {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }
}

impl AttributeDefinition for ScriptedAttributeDefinition {
  fn definition_settings(&self) -> &DefinitionSettings {
    &self.definition
  }

  fn definition_settings_mut(&mut self) -> &mut DefinitionSettings {
    &mut self.definition
  }

  fn do_attribute_definition_resolve(
    &self,
    context: &ResolutionContext,
    work: &AttributeResolverWorkContext,
  ) -> Result<Option<IdPAttribute>, ResolutionError> {
    let bindings = all_attribute_values(work, self.dependencies());
    let values = self.strategy.derive(&bindings, context)?;
    Ok(Some(IdPAttribute::with_values(self.id(), values)))
  }
}
