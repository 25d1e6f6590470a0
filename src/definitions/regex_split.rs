//! RegexSplit definition: keeps the first capture group of each matching value.

use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::dependency_support::merged_attribute_values;
use crate::error::{ComponentError, ResolutionError, UnsupportedAttributeTypeError};
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

#[derive(Debug)]
pub struct RegexSplitAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  pattern: String,
  case_insensitive: bool,
  regex: Option<Regex>,
}

impl RegexSplitAttributeDefinition {
  pub fn new(id: impl Into<String>, pattern: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      pattern: pattern.into(),
      case_insensitive: false,
      regex: None,
    }
  }

  pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
    self.case_insensitive = case_insensitive;
    self
  }
}

impl ResolverPlugin for RegexSplitAttributeDefinition {
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
    let regex = RegexBuilder::new(&self.pattern)
      .case_insensitive(self.case_insensitive)
      .build()
      .map_err(|e| ComponentError::initialization(self.id(), format!("invalid regex: {}", e)))?;
    // captures_len counts the implicit whole-match group.
    if regex.captures_len() < 2 {
      return Err(ComponentError::initialization(
        self.id(),
        "regex has no capture group",
      ));
    }
    self.regex = Some(regex);
    Ok(())
  }
}

impl AttributeDefinition for RegexSplitAttributeDefinition {
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
    let Some(regex) = &self.regex else {
      return Err(ComponentError::Uninitialized(self.id().to_string()).into());
    };
    let mut attribute = IdPAttribute::new(self.id());
    for value in merged_attribute_values(work, self.dependencies(), self.source_attribute_id()) {
      match &value {
        AttributeValue::String(s) => {
          match regex.captures(s).and_then(|c| c.get(1)) {
            Some(group) => attribute.add_value(AttributeValue::string(group.as_str())),
            None => trace!(value = %s, "no match"),
          }
        }
        AttributeValue::Empty(_) => {}
        other => {
          return Err(UnsupportedAttributeTypeError::new(self.id(), other.type_name()).into());
        }
      }
    }
    Ok(Some(attribute))
  }
}
