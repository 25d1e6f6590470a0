//! Tests for `runner`.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::compiler::Collaborators;
use crate::error::{ComponentError, ResolutionError};
use crate::runner::{RunError, load_resolver, resolve_in_background};
use crate::types::{AttributeValue, ResolutionContext};

const CONFIG: &str = r#"{
  "data_connectors": [
    { "id": "static", "type": "static", "attributes": { "uid": ["alice"] } }
  ],
  "attribute_definitions": [
    { "id": "eppn", "type": "scoped", "scope": "example.org", "source_attribute_id": "uid",
      "dependencies": [{ "connector": "static" }] },
    { "id": "principal", "type": "principal_name" }
  ]
}"#;

fn config_file(json: &str) -> tempfile::NamedTempFile {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(json.as_bytes()).unwrap();
  file
}

#[test]
fn load_resolver_compiles_the_file() {
  let file = config_file(CONFIG);
  let resolver = load_resolver(file.path(), &Collaborators::new()).unwrap();
  assert!(resolver.attribute_definition("eppn").is_some());
}

#[test]
fn load_resolver_reports_io_and_component_errors() {
  let err = load_resolver(Path::new("/nonexistent/resolver.json"), &Collaborators::new()).unwrap_err();
  assert!(matches!(err, RunError::Io { .. }));
  assert!(err.to_string().contains("/nonexistent/resolver.json"));

  let file = config_file(r#"{ "attribute_definitions": [{ "id": "x", "type": "simple" }] }"#);
  let err = load_resolver(file.path(), &Collaborators::new()).unwrap_err();
  assert!(matches!(
    err,
    RunError::Component(ComponentError::Initialization { .. })
  ));
}

#[tokio::test]
async fn resolves_on_the_blocking_pool() {
  let file = config_file(CONFIG);
  let resolver = Arc::new(load_resolver(file.path(), &Collaborators::new()).unwrap());

  let out = resolve_in_background(resolver.clone(), ResolutionContext::new().with_principal("alice"))
    .await
    .unwrap();
  assert_eq!(
    out.get("eppn").unwrap().values(),
    &[AttributeValue::scoped("alice", "example.org")]
  );
  assert_eq!(
    out.get("principal").unwrap().values(),
    &[AttributeValue::string("alice")]
  );

  let contexts = ["a", "b", "c"].map(|p| ResolutionContext::new().with_principal(p));
  let handles: Vec<_> = contexts
    .into_iter()
    .map(|ctx| tokio::spawn(resolve_in_background(resolver.clone(), ctx)))
    .collect();
  for handle in handles {
    assert_eq!(handle.await.unwrap().unwrap().len(), 2);
  }
}

#[tokio::test]
async fn resolution_errors_pass_through() {
  let file = config_file(CONFIG);
  let mut resolver = load_resolver(file.path(), &Collaborators::new()).unwrap();
  resolver.destroy();
  let err = resolve_in_background(Arc::new(resolver), ResolutionContext::new())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    RunError::Resolution(ResolutionError::Component(ComponentError::Destroyed(_)))
  ));
}
