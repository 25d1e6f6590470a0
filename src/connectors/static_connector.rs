//! Connector returning a fixed attribute map.

use crate::error::ResolutionError;
use crate::plugin::{ConnectorSettings, DataConnector, PluginSettings, ResolverPlugin};
use crate::types::{AttributeMap, AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

#[derive(Debug)]
pub struct StaticDataConnector {
  settings: PluginSettings,
  connector: ConnectorSettings,
  attributes: AttributeMap,
}

impl StaticDataConnector {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      connector: ConnectorSettings::default(),
      attributes: AttributeMap::new(),
    }
  }

  pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
    let name = name.into();
    self
      .attributes
      .insert(name.clone(), IdPAttribute::with_values(name, values));
    self
  }
}

impl ResolverPlugin for StaticDataConnector {
  fn settings(&self) -> &PluginSettings {
    &self.settings
  }

  fn settings_mut(&mut self) -> &mut PluginSettings {
    &mut self.settings
  }
}

impl DataConnector for StaticDataConnector {
  fn connector_settings(&self) -> &ConnectorSettings {
    &self.connector
  }

  fn connector_settings_mut(&mut self) -> &mut ConnectorSettings {
    &mut self.connector
  }

  fn do_data_connector_resolve(
    &self,
    _context: &ResolutionContext,
    _work: &AttributeResolverWorkContext,
  ) -> Result<Option<AttributeMap>, ResolutionError> {
    if self.attributes.is_empty() {
      return Ok(None);
    }
    Ok(Some(self.attributes.clone()))
  }
}
