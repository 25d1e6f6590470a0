//! Attribute definitions.
//!
//! Each definition reads recorded dependency results (or the request context)
//! and produces one [crate::types::IdPAttribute].

mod context_derived;
mod date_time;
mod prescoped;
mod regex_split;
mod scoped;
mod scripted;
mod simple;
mod subject_derived;
mod template;

#[cfg(test)]
mod leaf_definitions_test;

pub use context_derived::ContextDerivedAttributeDefinition;
pub use date_time::{DateTimeAttributeDefinition, EpochUnit};
pub use prescoped::{DEFAULT_SCOPE_DELIMITER, PrescopedAttributeDefinition};
pub use regex_split::RegexSplitAttributeDefinition;
pub use scoped::ScopedAttributeDefinition;
pub use scripted::ScriptedAttributeDefinition;
pub use simple::SimpleAttributeDefinition;
pub use subject_derived::{PrincipalValuesFn, SubjectDerivedAttributeValuesFunction};
pub use template::TemplateAttributeDefinition;
