//! Definition whose values come from the request context rather than from dependencies.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::ResolutionError;
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::strategy::ContextValuesFunction;
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

use super::SubjectDerivedAttributeValuesFunction;

/// Applies a [ContextValuesFunction] to the resolution context. An empty result
/// means "no attribute", never an error.
pub struct ContextDerivedAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  function: Arc<dyn ContextValuesFunction>,
}

impl ContextDerivedAttributeDefinition {
  pub fn new(id: impl Into<String>, function: Arc<dyn ContextValuesFunction>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      function,
    }
  }

  /// Publishes the request's principal name.
  pub fn principal_name(id: impl Into<String>) -> Self {
    Self::new(
      id,
      Arc::new(|context: &ResolutionContext| {
        Ok::<_, ResolutionError>(
          context
            .principal()
            .map(|p| vec![AttributeValue::string(p)])
            .unwrap_or_default(),
        )
      }),
    )
  }

  /// Publishes one free-form property of the enclosing request.
  pub fn request_property(id: impl Into<String>, key: impl Into<String>) -> Self {
    let key = key.into();
    Self::new(
      id,
      Arc::new(move |context: &ResolutionContext| {
        Ok::<_, ResolutionError>(
          context
            .request_property(&key)
            .map(|v| vec![AttributeValue::string(v)])
            .unwrap_or_default(),
        )
      }),
    )
  }

  pub fn subject_derived(id: impl Into<String>, function: SubjectDerivedAttributeValuesFunction) -> Self {
    Self::new(id, Arc::new(function))
  }
}

impl fmt::Debug for ContextDerivedAttributeDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextDerivedAttributeDefinition")
      .field("settings", &self.settings)
      .finish_non_exhaustive()
  }
}

impl ResolverPlugin for ContextDerivedAttributeDefinition {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }
}

impl AttributeDefinition for ContextDerivedAttributeDefinition {
  fn definition_settings(&self) -> &DefinitionSettings {
    &self.definition
  }

  fn definition_settings_mut(&mut self) -> &mut DefinitionSettings {
    &mut self.definition
  }

  fn do_attribute_definition_resolve(
    &self,
    context: &ResolutionContext,
    _work: &AttributeResolverWorkContext,
  ) -> Result<Option<IdPAttribute>, ResolutionError> {
    let values = self.function.apply(context)?;
    if values.is_empty() {
      debug!(definition = self.id(), "context produced no values");
      return Ok(None);
    }
    Ok(Some(IdPAttribute::with_values(self.id(), values)))
  }
}
