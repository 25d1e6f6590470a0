//! Value and context types shared by every resolver plugin.

use std::collections::BTreeMap;

mod attribute_value;
#[cfg(test)]
mod attribute_value_test;
mod idp_attribute;
mod resolution_context;
mod resolver_plugin_dependency;

pub use attribute_value::{AttributeValue, EmptyAttributeValue, ScopedValue};
pub use idp_attribute::IdPAttribute;
pub use resolution_context::{Principal, ResolutionContext, Subject, SubjectContext};
pub use resolver_plugin_dependency::{DependencyKind, ResolverPluginDependency};

/// Attributes produced by one data connector, keyed by attribute id.
pub type AttributeMap = BTreeMap<String, IdPAttribute>;
