//! Integration tests that run the resolve_attributes CLI and/or load_resolver on the JSON
//! fixtures in tests/integration/. resolver.json wires a directory search (with a static
//! failover) into scoped, template, date/time and regex definitions.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use idp_attribute_resolver::connectors::InMemoryDirectory;
use idp_attribute_resolver::{
  AttributeValue, Collaborators, ResolutionContext, RunError, load_resolver,
};

fn integration_dir() -> std::path::PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("integration")
}

fn fixture(name: &str) -> String {
  integration_dir()
    .join(name)
    .to_str()
    .expect("path")
    .to_string()
}

/// Run `cargo run --bin resolve_attributes -- <args...>` from the crate root. Returns (stdout, stderr, success).
fn run_resolve_attributes(args: &[&str]) -> (Vec<u8>, Vec<u8>, bool) {
  let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
  let out = Command::new(cargo.as_str())
    .args(["run", "--bin", "resolve_attributes", "--"])
    .args(args)
    .current_dir(env!("CARGO_MANIFEST_DIR"))
    .output()
    .expect("cargo run --bin resolve_attributes");
  (out.stdout, out.stderr, out.status.success())
}

fn collaborators() -> Collaborators {
  let directory = InMemoryDirectory::load(&integration_dir().join("people.json")).expect("people.json");
  Collaborators::new().with_search_executor("directory", Arc::new(directory))
}

// ---- CLI tests using tests/integration/*.json ----

#[test]
fn integration_cli_resolves_alice() {
  let (config, people) = (fixture("resolver.json"), fixture("people.json"));
  let (stdout, stderr, success) = run_resolve_attributes(&[
    "--config",
    &config,
    "--directory",
    &people,
    "--principal",
    "alice",
  ]);
  assert!(
    success,
    "alice should resolve: stderr={}",
    String::from_utf8_lossy(&stderr)
  );
  let out: serde_json::Value = serde_json::from_slice(&stdout).expect("stdout is JSON");
  let eppn = &out["eduPersonPrincipalName"];
  assert_eq!(eppn["values"][0]["type"], "scoped");
  assert_eq!(eppn["values"][0]["value"]["value"], "alice");
  assert_eq!(eppn["values"][0]["value"]["scope"], "example.org");
  assert_eq!(eppn["display_names"]["en"], "Principal name");
  assert_eq!(out["displayName"]["values"][0]["value"], "Alice Liddell");
  assert_eq!(out["mailLocalPart"]["values"][0]["value"], "alice");
  assert!(out.get("uid").is_none(), "dependency-only attribute must not be released");
}

#[test]
fn integration_cli_requested_attributes_only() {
  let (config, people) = (fixture("resolver.json"), fixture("people.json"));
  let (stdout, stderr, success) = run_resolve_attributes(&[
    "--config",
    &config,
    "--directory",
    &people,
    "--principal",
    "bob",
    "--attribute",
    "eduPersonScopedAffiliation",
  ]);
  assert!(success, "stderr={}", String::from_utf8_lossy(&stderr));
  let out: serde_json::Value = serde_json::from_slice(&stdout).expect("stdout is JSON");
  let released = out.as_object().expect("object");
  assert_eq!(released.len(), 1);
  assert_eq!(
    out["eduPersonScopedAffiliation"]["values"][0]["value"]["value"],
    "student"
  );
}

#[test]
fn integration_cli_cyclic_config_fails() {
  let config = fixture("cyclic.json");
  let (_stdout, stderr, success) = run_resolve_attributes(&["--config", &config]);
  assert!(!success, "cyclic.json should fail (exit non-zero)");
  let err = String::from_utf8_lossy(&stderr);
  assert!(err.contains("Configuration error"));
  assert!(err.contains("cycle"));
}

#[test]
fn integration_cli_missing_directory_fails() {
  let config = fixture("resolver.json");
  let (_stdout, stderr, success) = run_resolve_attributes(&["--config", &config]);
  assert!(!success, "search connector without an executor should fail");
  assert!(String::from_utf8_lossy(&stderr).contains("no search executor named 'directory'"));
}

// ---- Library path: load_resolver on the same fixtures ----

#[test]
fn integration_lib_resolves_alice() {
  let resolver = load_resolver(&integration_dir().join("resolver.json"), &collaborators())
    .expect("load_resolver");
  resolver.validate().expect("validate");
  let out = resolver
    .resolve_attributes(&ResolutionContext::new().with_principal("alice"))
    .expect("resolve");

  assert_eq!(
    out.get("eduPersonScopedAffiliation").expect("affiliation").values(),
    &[
      AttributeValue::scoped("member", "example.org"),
      AttributeValue::scoped("staff", "example.org"),
    ]
  );
  assert!(matches!(
    out.get("createTimestamp").expect("createTimestamp").values(),
    [AttributeValue::DateTime(_)]
  ));
  assert!(out.get("subjectNames").is_none());
}

#[test]
fn integration_lib_unknown_principal_uses_failover() {
  let resolver = load_resolver(&integration_dir().join("resolver.json"), &collaborators())
    .expect("load_resolver");
  let out = resolver
    .resolve_attributes(&ResolutionContext::new().with_principal("mallory"))
    .expect("resolve");

  assert_eq!(
    out.get("eduPersonPrincipalName").expect("eppn").values(),
    &[AttributeValue::scoped("guest", "example.org")]
  );
  assert_eq!(
    out.get("eduPersonScopedAffiliation").expect("affiliation").values(),
    &[AttributeValue::scoped("affiliate", "example.org")]
  );
  assert!(out.get("displayName").is_none());
}

#[test]
fn integration_lib_search_results_are_cached() {
  let directory = Arc::new(
    InMemoryDirectory::load(&integration_dir().join("people.json")).expect("people.json"),
  );
  let collaborators = Collaborators::new().with_search_executor("directory", directory.clone());
  let resolver = load_resolver(&integration_dir().join("resolver.json"), &collaborators)
    .expect("load_resolver");

  for _ in 0..3 {
    resolver
      .resolve_attributes(&ResolutionContext::new().with_principal("bob"))
      .expect("resolve");
  }
  assert_eq!(directory.search_count(), 1);
}

#[test]
fn integration_lib_cyclic_config_is_rejected() {
  let err = load_resolver(&integration_dir().join("cyclic.json"), &Collaborators::new()).unwrap_err();
  assert!(matches!(err, RunError::Component(_)));
  assert!(err.to_string().contains("cycle"));
}
