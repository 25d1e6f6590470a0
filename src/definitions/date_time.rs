//! DateTime definition: converts string values to UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::dependency_support::{merged_attribute_values, without_empty_markers};
use crate::error::{ResolutionError, UnsupportedAttributeTypeError};
use crate::plugin::{AttributeDefinition, DefinitionSettings, PluginSettings, ResolverPlugin};
use crate::types::{AttributeValue, IdPAttribute, ResolutionContext};
use crate::work_context::AttributeResolverWorkContext;

/// Unit of integer epoch values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochUnit {
  #[default]
  Seconds,
  Milliseconds,
}

/// Converts each string value to an instant.
///
/// With a `date_time_pattern` (chrono `strftime` syntax) every value is parsed
/// with that pattern only. Patterns without an offset are read as UTC, and
/// date-only patterns as midnight UTC. Without a pattern a value is read as a
/// signed integer epoch in `epoch_unit`.
#[derive(Debug)]
pub struct DateTimeAttributeDefinition {
  settings: PluginSettings,
  definition: DefinitionSettings,
  epoch_unit: EpochUnit,
  date_time_pattern: Option<String>,
  ignore_conversion_errors: bool,
}

impl DateTimeAttributeDefinition {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      settings: PluginSettings::new(id),
      definition: DefinitionSettings::default(),
      epoch_unit: EpochUnit::default(),
      date_time_pattern: None,
      ignore_conversion_errors: true,
    }
  }

  pub fn with_epoch_unit(mut self, unit: EpochUnit) -> Self {
    self.epoch_unit = unit;
    self
  }

  pub fn with_date_time_pattern(mut self, pattern: impl Into<String>) -> Self {
    self.date_time_pattern = Some(pattern.into());
    self
  }

  pub fn with_ignore_conversion_errors(mut self, ignore: bool) -> Self {
    self.ignore_conversion_errors = ignore;
    self
  }

  fn convert(&self, text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    match self.date_time_pattern.as_deref() {
      Some(pattern) => DateTime::parse_from_str(text, pattern)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
          NaiveDateTime::parse_from_str(text, pattern)
            .ok()
            .map(|naive| naive.and_utc())
        })
        .or_else(|| {
          NaiveDate::parse_from_str(text, pattern)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
        }),
      None => {
        let epoch = text.parse::<i64>().ok()?;
        match self.epoch_unit {
          EpochUnit::Seconds => DateTime::from_timestamp(epoch, 0),
          EpochUnit::Milliseconds => DateTime::from_timestamp_millis(epoch),
        }
      }
    }
  }
}

impl ResolverPlugin for DateTimeAttributeDefinition {
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

impl AttributeDefinition for DateTimeAttributeDefinition {
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
    let inputs = without_empty_markers(merged_attribute_values(
      work,
      self.dependencies(),
      self.source_attribute_id(),
    ));
    let mut attribute = IdPAttribute::new(self.id());
    for value in &inputs {
      let AttributeValue::String(text) = value else {
        return Err(UnsupportedAttributeTypeError::new(self.id(), value.type_name()).into());
      };
      match self.convert(text) {
        Some(instant) => attribute.add_value(AttributeValue::DateTime(instant)),
        None => debug!(value = %text, "value is not a recognisable date/time"),
      }
    }

    if !self.ignore_conversion_errors && attribute.values().len() != inputs.len() {
      return Err(ResolutionError::failed(
        self.id(),
        format!(
          "converted {} of {} values",
          attribute.values().len(),
          inputs.len()
        ),
      ));
    }
    Ok(Some(attribute))
  }
}
