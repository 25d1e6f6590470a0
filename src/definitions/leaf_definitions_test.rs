//! Tests for the Simple, Prescoped, RegexSplit and Scripted definitions.

use std::sync::Arc;

use crate::error::{ComponentError, ResolutionError};
use crate::plugin::{DefinitionBuilderExt, PluginBuilderExt};
use crate::strategy::ValueBindings;
use crate::test_support::{record_connector, strings, work_with_connector};
use crate::types::{AttributeValue, ResolutionContext, ResolverPluginDependency};
use crate::{AttributeDefinition, ResolverPlugin};

use super::{
  PrescopedAttributeDefinition, RegexSplitAttributeDefinition, ScriptedAttributeDefinition,
  SimpleAttributeDefinition,
};

fn ldap() -> ResolverPluginDependency {
  ResolverPluginDependency::connector("ldap")
}

#[test]
fn simple_merges_connectors_in_declaration_order() {
  let mut d = SimpleAttributeDefinition::new("mail")
    .with_dependency(ldap())
    .with_dependency(ResolverPluginDependency::connector("db"));
  d.initialize().unwrap();
  let mut work = work_with_connector("ldap", &[("mail", strings(&["a@x.org"]))]);
  record_connector(
    &mut work,
    "db",
    &[("mail", vec![AttributeValue::null(), AttributeValue::string("b@x.org")])],
  );
  let attr = d
    .do_attribute_definition_resolve(&ResolutionContext::new(), &work)
    .unwrap()
    .unwrap();
  assert_eq!(
    attr.values(),
    &[
      AttributeValue::string("a@x.org"),
      AttributeValue::null(),
      AttributeValue::string("b@x.org"),
    ]
  );
}

#[test]
fn simple_reads_source_attribute_id() {
  let mut d = SimpleAttributeDefinition::new("email")
    .with_source_attribute_id("mail")
    .with_dependency(ldap());
  d.initialize().unwrap();
  let work = work_with_connector("ldap", &[("mail", strings(&["a@x.org"]))]);
  let attr = d
    .do_attribute_definition_resolve(&ResolutionContext::new(), &work)
    .unwrap()
    .unwrap();
  assert_eq!(attr.id(), "email");
  assert_eq!(attr.values(), strings(&["a@x.org"]).as_slice());
}

#[test]
fn prescoped_splits_at_first_delimiter() {
  let mut d = PrescopedAttributeDefinition::new("eppn").with_dependency(ldap());
  d.initialize().unwrap();
  let work = work_with_connector("ldap", &[("eppn", strings(&["alice@example.org@x"]))]);
  let attr = d
    .do_attribute_definition_resolve(&ResolutionContext::new(), &work)
    .unwrap()
    .unwrap();
  assert_eq!(attr.values(), &[AttributeValue::scoped("alice", "example.org@x")]);
}

#[test]
fn prescoped_missing_delimiter_fails() {
  let mut d = PrescopedAttributeDefinition::new("eppn")
    .with_scope_delimiter("#")
    .with_dependency(ldap());
  d.initialize().unwrap();
  let work = work_with_connector("ldap", &[("eppn", strings(&["alice@example.org"]))]);
  let err = d
    .do_attribute_definition_resolve(&ResolutionContext::new(), &work)
    .unwrap_err();
  assert!(matches!(err, ResolutionError::Failed { .. }));
}

#[test]
fn regex_split_keeps_first_group_and_skips_non_matches() {
  let mut d = RegexSplitAttributeDefinition::new("user", "^([^@]+)@EXAMPLE\\.ORG$")
    .with_case_insensitive(true)
    .with_source_attribute_id("mail")
    .with_dependency(ldap());
  d.initialize().unwrap();
  let work = work_with_connector(
    "ldap",
    &[("mail", strings(&["alice@example.org", "bob@other.org"]))],
  );
  let attr = d
    .do_attribute_definition_resolve(&ResolutionContext::new(), &work)
    .unwrap()
    .unwrap();
  assert_eq!(attr.values(), strings(&["alice"]).as_slice());
}

#[test]
fn regex_split_requires_a_capture_group() {
  let mut d = RegexSplitAttributeDefinition::new("user", "^.+$").with_dependency(ldap());
  assert!(matches!(
    d.initialize(),
    Err(ComponentError::Initialization { .. })
  ));
  let mut bad = RegexSplitAttributeDefinition::new("user", "(").with_dependency(ldap());
  assert!(bad.initialize().is_err());
}

#[test]
fn scripted_receives_named_bindings() {
  let strategy = |bindings: &ValueBindings, ctx: &ResolutionContext| {
    let count = bindings.get("uid").map(Vec::len).unwrap_or(0);
    Ok::<_, ResolutionError>(vec![AttributeValue::string(format!(
      "{}:{}",
      ctx.principal().unwrap_or("-"),
      count
    ))])
  };
  let mut d = ScriptedAttributeDefinition::new("summary", Arc::new(strategy)).with_dependency(ldap());
  d.initialize().unwrap();
  let work = work_with_connector("ldap", &[("uid", strings(&["a", "b"]))]);
  let attr = d
    .do_attribute_definition_resolve(&ResolutionContext::new().with_principal("alice"), &work)
    .unwrap()
    .unwrap();
  assert_eq!(attr.values(), strings(&["alice:2"]).as_slice());
}

#[test]
fn scripted_errors_surface_as_resolution_errors() {
  let strategy = |_: &ValueBindings, _: &ResolutionContext| {
    Err::<Vec<AttributeValue>, _>(ResolutionError::failed("summary", "script blew up"))
  };
  let mut d = ScriptedAttributeDefinition::new("summary", Arc::new(strategy));
  d.initialize().unwrap();
  let work = work_with_connector("ldap", &[]);
  assert!(
    d.do_attribute_definition_resolve(&ResolutionContext::new(), &work)
      .is_err()
  );
}
