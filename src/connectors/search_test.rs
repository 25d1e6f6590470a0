//! Tests for the search connector, its builder and its result cache.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ComponentError, ResolutionError};
use crate::plugin::PluginBuilderExt;
use crate::strategy::ValueBindings;
use crate::test_support::strings;
use crate::types::{AttributeValue, ResolutionContext, ResolverPluginDependency};
use crate::work_context::AttributeResolverWorkContext;
use crate::{DataConnector, ResolverPlugin};

use super::{
  ExecutableSearch, InMemoryDirectory, SearchBuilder, SearchDataConnector, SearchEntry,
  SearchExecutor, StaticDataConnector, TemplatedSearchBuilder, escape_filter_value,
};

fn entry(uid: &str, mail: &str) -> SearchEntry {
  [
    ("uid".to_string(), vec![uid.to_string()]),
    ("mail".to_string(), vec![mail.to_string()]),
  ]
  .into_iter()
  .collect()
}

fn directory() -> Arc<InMemoryDirectory> {
  Arc::new(InMemoryDirectory::new(vec![
    entry("alice", "alice@example.org"),
    entry("bob", "bob@example.org"),
  ]))
}

fn connector(filter: &str, dir: Arc<InMemoryDirectory>) -> SearchDataConnector {
  let mut c = SearchDataConnector::new("ldap", Arc::new(TemplatedSearchBuilder::new(filter)), dir);
  c.initialize().unwrap();
  c
}

fn resolve(c: &SearchDataConnector, ctx: &ResolutionContext) -> Result<Option<crate::types::AttributeMap>, ResolutionError> {
  c.do_data_connector_resolve(ctx, &AttributeResolverWorkContext::new())
}

#[test]
fn escapes_rfc4515_metacharacters() {
  assert_eq!(escape_filter_value("a*(b)\\c\0"), "a\\2a\\28b\\29\\5cc\\00");
  assert_eq!(escape_filter_value("plain"), "plain");
}

#[test]
fn templated_builder_binds_context_and_dependencies() {
  let builder = TemplatedSearchBuilder::new("(&(uid={{principal}})(ou={{ou.[0]}})(sp={{requester}}))");
  let mut deps = ValueBindings::new();
  deps.insert("ou".into(), vec![AttributeValue::null(), AttributeValue::string("st*ff")]);
  let ctx = ResolutionContext::new()
    .with_principal("al(ice)")
    .with_recipient("https://sp.example.org");
  let search = builder.build(&ctx, &deps).unwrap();
  assert_eq!(
    search.filter(),
    "(&(uid=al\\28ice\\29)(ou=st\\2aff)(sp=https://sp.example.org))"
  );
  assert_eq!(search.result_cache_key(), search.filter());
}

#[test]
fn maps_the_matching_entry_to_string_attributes() {
  let c = connector("(uid={{principal}})", directory());
  let attrs = resolve(&c, &ResolutionContext::new().with_principal("alice"))
    .unwrap()
    .unwrap();
  assert_eq!(attrs["mail"].values(), strings(&["alice@example.org"]).as_slice());
  assert_eq!(attrs["uid"].values(), strings(&["alice"]).as_slice());
}

#[test]
fn no_result_is_nothing_unless_configured_as_error() {
  let c = connector("(uid={{principal}})", directory());
  let ctx = ResolutionContext::new().with_principal("nobody");
  assert!(resolve(&c, &ctx).unwrap().is_none());

  let mut strict =
    SearchDataConnector::new("ldap", Arc::new(TemplatedSearchBuilder::new("(uid={{principal}})")), directory())
      .with_no_result_is_error(true);
  strict.initialize().unwrap();
  assert!(matches!(resolve(&strict, &ctx), Err(ResolutionError::Failed { .. })));
}

#[test]
fn multiple_results_merge_or_fail() {
  let c = connector("(mail=*)", directory());
  let attrs = resolve(&c, &ResolutionContext::new()).unwrap().unwrap();
  assert_eq!(attrs["uid"].values(), strings(&["alice", "bob"]).as_slice());

  let mut strict =
    SearchDataConnector::new("ldap", Arc::new(TemplatedSearchBuilder::new("(mail=*)")), directory())
      .with_multiple_results_is_error(true);
  strict.initialize().unwrap();
  let err = resolve(&strict, &ResolutionContext::new()).unwrap_err();
  assert!(err.to_string().contains("2 results"));
}

#[test]
fn cached_results_skip_the_executor_until_invalidated() {
  let dir = directory();
  let mut c = SearchDataConnector::new(
    "ldap",
    Arc::new(TemplatedSearchBuilder::new("(uid={{principal}})")),
    dir.clone(),
  )
  .with_result_cache(100, Duration::from_secs(60));
  c.initialize().unwrap();
  let ctx = ResolutionContext::new().with_principal("alice");

  let first = resolve(&c, &ctx).unwrap();
  let second = resolve(&c, &ctx).unwrap();
  assert_eq!(first, second);
  assert_eq!(dir.search_count(), 1);

  c.reconfigure_result_cache(100, Duration::from_secs(60));
  resolve(&c, &ctx).unwrap();
  assert_eq!(dir.search_count(), 2);

  c.invalidate_result_cache();
  resolve(&c, &ctx).unwrap();
  assert_eq!(dir.search_count(), 3);
}

struct Unreachable;

impl SearchExecutor for Unreachable {
  fn search(&self, _search: &ExecutableSearch) -> Result<Vec<SearchEntry>, String> {
    Err("connection refused".into())
  }

  fn validate(&self) -> Result<(), String> {
    Err("connection refused".into())
  }
}

#[test]
fn executor_failures_surface_as_resolution_and_validation_errors() {
  let mut c = SearchDataConnector::new(
    "ldap",
    Arc::new(TemplatedSearchBuilder::new("(uid={{principal}})")),
    Arc::new(Unreachable),
  );
  c.initialize().unwrap();
  assert!(matches!(
    c.validate(),
    Err(ComponentError::Validation { .. })
  ));
  let err = resolve(&c, &ResolutionContext::new()).unwrap_err();
  assert!(err.is_maskable());
}

#[test]
fn bad_filter_template_fails_initialization() {
  let mut c = SearchDataConnector::new(
    "ldap",
    Arc::new(TemplatedSearchBuilder::new("{{#each x}}")),
    directory(),
  );
  assert!(matches!(
    c.initialize(),
    Err(ComponentError::Initialization { .. })
  ));
}

#[test]
fn searches_use_dependency_values() {
  let mut c = SearchDataConnector::new(
    "ldap",
    Arc::new(TemplatedSearchBuilder::new("(uid={{login.[0]}})")),
    directory(),
  )
  .with_dependency(ResolverPluginDependency::connector("static"));
  c.initialize().unwrap();
  let mut work = AttributeResolverWorkContext::new();
  work
    .record_data_connector_resolution(
      "static",
      Some(Arc::new(crate::test_support::attribute_map(&[(
        "login",
        strings(&["bob"]),
      )]))),
    )
    .unwrap();
  let attrs = c
    .do_data_connector_resolve(&ResolutionContext::new(), &work)
    .unwrap()
    .unwrap();
  assert_eq!(attrs["mail"].values(), strings(&["bob@example.org"]).as_slice());
}

#[test]
fn static_connector_returns_its_map() {
  let mut c = StaticDataConnector::new("static").with_attribute("affiliation", strings(&["member"]));
  c.initialize().unwrap();
  let attrs = c
    .do_data_connector_resolve(&ResolutionContext::new(), &AttributeResolverWorkContext::new())
    .unwrap()
    .unwrap();
  assert_eq!(attrs.len(), 1);

  let mut empty = StaticDataConnector::new("empty");
  empty.initialize().unwrap();
  assert!(
    empty
      .do_data_connector_resolve(&ResolutionContext::new(), &AttributeResolverWorkContext::new())
      .unwrap()
      .is_none()
  );
}
