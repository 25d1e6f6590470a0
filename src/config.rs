//! JSON resolver configuration.
//!
//! ```json
//! {
//!   "id": "shibboleth.AttributeResolver",
//!   "data_connectors": [
//!     { "id": "ldap", "type": "search", "filter": "(uid={{principal}})", "executor": "directory" }
//!   ],
//!   "attribute_definitions": [
//!     { "id": "eppn", "type": "scoped", "scope": "example.org",
//!       "source_attribute_id": "uid", "dependencies": [{ "connector": "ldap" }] }
//!   ]
//! }
//! ```
//!
//! Collaborators that cannot be written as JSON (search executors, scripted
//! strategies) are referenced by name and supplied to [crate::compiler::compile_resolver].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::instrument;

use crate::definitions::{DEFAULT_SCOPE_DELIMITER, EpochUnit};
use crate::types::ResolverPluginDependency;

pub const DEFAULT_RESOLVER_ID: &str = "attribute-resolver";

fn default_resolver_id() -> String {
  DEFAULT_RESOLVER_ID.to_string()
}

fn default_true() -> bool {
  true
}

fn default_scope_delimiter() -> String {
  DEFAULT_SCOPE_DELIMITER.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
  #[serde(default = "default_resolver_id")]
  pub id: String,
  #[serde(default)]
  pub data_connectors: Vec<DataConnectorConfig>,
  #[serde(default)]
  pub attribute_definitions: Vec<AttributeDefinitionConfig>,
}

/// `{ "definition": id }` or `{ "connector": id, "attribute_names": [..], "all_attributes": bool }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyConfig {
  #[serde(default)]
  pub definition: Option<String>,
  #[serde(default)]
  pub connector: Option<String>,
  #[serde(default)]
  pub attribute_names: Vec<String>,
  #[serde(default)]
  pub all_attributes: bool,
}

impl DependencyConfig {
  pub fn to_dependency(&self) -> Result<ResolverPluginDependency, String> {
    let dependency = match (&self.definition, &self.connector) {
      (Some(id), None) => {
        if !self.attribute_names.is_empty() || self.all_attributes {
          return Err(format!(
            "dependency on definition '{}' cannot select attribute names",
            id
          ));
        }
        return Ok(ResolverPluginDependency::definition(id.as_str()));
      }
      (None, Some(id)) => ResolverPluginDependency::connector(id.as_str()),
      _ => {
        return Err("a dependency names exactly one of 'definition' or 'connector'".to_string());
      }
    };
    let dependency = dependency.with_attribute_names(self.attribute_names.iter().cloned());
    Ok(if self.all_attributes {
      dependency.with_all_attributes()
    } else {
      dependency
    })
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeDefinitionConfig {
  pub id: String,
  #[serde(default)]
  pub dependencies: Vec<DependencyConfig>,
  #[serde(default = "default_true")]
  pub propagate_resolution_errors: bool,
  #[serde(default)]
  pub dependency_only: bool,
  #[serde(default)]
  pub source_attribute_id: Option<String>,
  #[serde(default)]
  pub display_names: BTreeMap<String, String>,
  #[serde(default)]
  pub display_descriptions: BTreeMap<String, String>,
  #[serde(flatten)]
  pub kind: DefinitionKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefinitionKind {
  Simple,
  Scoped {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    scope_source: Option<String>,
  },
  Prescoped {
    #[serde(default = "default_scope_delimiter")]
    scope_delimiter: String,
  },
  Template {
    template: String,
    #[serde(default)]
    source_attributes: Vec<String>,
  },
  DateTime {
    #[serde(default)]
    epoch_unit: EpochUnit,
    #[serde(default)]
    date_time_pattern: Option<String>,
    #[serde(default = "default_true")]
    ignore_conversion_errors: bool,
  },
  RegexSplit {
    regex: String,
    #[serde(default)]
    case_insensitive: bool,
  },
  /// Named [crate::strategy::ValueDerivationStrategy] from the collaborators.
  Scripted { strategy: String },
  PrincipalName,
  RequestProperty { key: String },
  SubjectPrincipalNames,
  SubjectAttribute { attribute_id: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConnectorConfig {
  pub id: String,
  #[serde(default)]
  pub dependencies: Vec<DependencyConfig>,
  #[serde(default = "default_true")]
  pub propagate_resolution_errors: bool,
  #[serde(default)]
  pub failover_connector_id: Option<String>,
  #[serde(flatten)]
  pub kind: ConnectorKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorKind {
  Static {
    #[serde(default)]
    attributes: BTreeMap<String, Vec<String>>,
  },
  Search {
    filter: String,
    /// Named [crate::connectors::SearchExecutor] from the collaborators.
    executor: String,
    #[serde(default)]
    no_result_is_error: bool,
    #[serde(default)]
    multiple_results_is_error: bool,
    #[serde(default)]
    result_cache: Option<ResultCacheConfig>,
  },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResultCacheConfig {
  #[serde(default = "ResultCacheConfig::default_max_capacity")]
  pub max_capacity: u64,
  #[serde(default = "ResultCacheConfig::default_time_to_live_secs")]
  pub time_to_live_secs: u64,
}

impl ResultCacheConfig {
  fn default_max_capacity() -> u64 {
    10_000
  }

  fn default_time_to_live_secs() -> u64 {
    600
  }
}

pub fn parse_resolver_config(json: &str) -> Result<ResolverConfig, serde_json::Error> {
  serde_json::from_str(json)
}

/// Loads a resolver configuration from `path`. Returns error if the file is
/// missing or not a valid configuration.
#[instrument(level = "trace", skip(path))]
pub fn load_resolver_config(path: &Path) -> Result<ResolverConfig, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::types::DependencyKind;

  #[test]
  fn parses_definitions_connectors_and_defaults() {
    let config = parse_resolver_config(
      r#"{
        "data_connectors": [
          { "id": "ldap", "type": "search", "filter": "(uid={{principal}})", "executor": "dir",
            "failover_connector_id": "static", "result_cache": {} },
          { "id": "static", "type": "static", "attributes": { "uid": ["guest"] } }
        ],
        "attribute_definitions": [
          { "id": "eppn", "type": "scoped", "scope": "example.org",
            "dependencies": [{ "connector": "ldap", "attribute_names": ["uid"] }] },
          { "id": "created", "type": "date_time", "epoch_unit": "milliseconds",
            "propagate_resolution_errors": false, "dependencies": [{ "definition": "eppn" }] },
          { "id": "principal", "type": "principal_name" }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(config.id, DEFAULT_RESOLVER_ID);
    let ldap = &config.data_connectors[0];
    assert_eq!(ldap.failover_connector_id.as_deref(), Some("static"));
    match &ldap.kind {
      ConnectorKind::Search { result_cache: Some(cache), no_result_is_error, .. } => {
        assert_eq!(cache.max_capacity, 10_000);
        assert_eq!(cache.time_to_live_secs, 600);
        assert!(!no_result_is_error);
      }
      other => panic!("unexpected kind: {other:?}"),
    }

    let eppn = &config.attribute_definitions[0];
    assert!(eppn.propagate_resolution_errors);
    let dep = eppn.dependencies[0].to_dependency().unwrap();
    assert_eq!(dep.kind(), DependencyKind::DataConnector);
    assert_eq!(dep.attribute_names(), ["uid".to_string()]);

    let created = &config.attribute_definitions[1];
    assert!(!created.propagate_resolution_errors);
    assert!(matches!(
      created.kind,
      DefinitionKind::DateTime {
        epoch_unit: EpochUnit::Milliseconds,
        ignore_conversion_errors: true,
        ..
      }
    ));
    assert!(matches!(config.attribute_definitions[2].kind, DefinitionKind::PrincipalName));
  }

  #[test]
  fn rejects_unknown_type() {
    assert!(parse_resolver_config(r#"{ "attribute_definitions": [{ "id": "x", "type": "velocity" }] }"#).is_err());
  }

  #[test]
  fn dependency_must_name_exactly_one_plugin() {
    assert!(DependencyConfig::default().to_dependency().is_err());
    let both = DependencyConfig {
      definition: Some("a".into()),
      connector: Some("b".into()),
      ..Default::default()
    };
    assert!(both.to_dependency().is_err());
    let selective_definition = DependencyConfig {
      definition: Some("a".into()),
      all_attributes: true,
      ..Default::default()
    };
    assert!(selective_definition.to_dependency().is_err());
  }

  #[test]
  fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "id": "r1", "attribute_definitions": [] }}"#).unwrap();
    let config = load_resolver_config(file.path()).unwrap();
    assert_eq!(config.id, "r1");

    let missing = load_resolver_config(Path::new("/nonexistent/resolver.json")).unwrap_err();
    assert_eq!(missing.kind(), std::io::ErrorKind::NotFound);
  }
}
