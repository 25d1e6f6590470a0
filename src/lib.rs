//! # idp-attribute-resolver
//!
//! Dependency-graph evaluator that resolves identity attributes for a principal.
//!
//! ## Architecture
//!
//! An [AttributeResolver] owns two kinds of plugins, configured once and shared
//! by every request:
//!
//! - data connectors ([DataConnector]) fetch raw attribute maps from a source
//!   (a static map, a directory search);
//! - attribute definitions ([AttributeDefinition]) turn dependency values, or the
//!   request context, into one [IdPAttribute] each (scoped, template, date/time, ...).
//!
//! Each resolution gets its own [AttributeResolverWorkContext], which memoizes
//! every plugin result so each plugin runs at most once per request. Runtime
//! failures either abort the resolution or, for plugins configured to mask them,
//! are recorded as "resolved to nothing". A failing connector may name a failover
//! connector that stands in for it.
//!
//! Resolvers are usually built from JSON with [compile_resolver] (see [config]).

pub mod compiler;
pub mod config;
pub mod connectors;
pub mod definitions;
pub mod dependency_support;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod plugin;
pub mod resolver;
pub mod runner;
#[cfg(test)]
mod runner_test;
pub mod strategy;
#[cfg(test)]
mod test_support;
pub mod types;
pub mod work_context;

pub use compiler::{Collaborators, compile_resolver};
pub use error::{ComponentError, ResolutionError, UnsupportedAttributeTypeError};
pub use lifecycle::ComponentState;
pub use plugin::{AttributeDefinition, DataConnector, ResolverPlugin};
pub use resolver::{AttributeResolver, ResolvedAttributes};
pub use runner::{RunError, load_resolver, resolve_in_background};
pub use types::{AttributeValue, IdPAttribute, ResolutionContext};
pub use work_context::AttributeResolverWorkContext;
