//! Error types for component lifecycle and attribute resolution.

use thiserror::Error;

/// Lifecycle contract violations. These are never masked by a plugin's error policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
  #[error("component '{0}' has not been initialized")]
  Uninitialized(String),
  #[error("component '{0}' has been destroyed")]
  Destroyed(String),
  #[error("component '{id}' failed to initialize: {reason}")]
  Initialization { id: String, reason: String },
  #[error("component '{id}' failed validation: {reason}")]
  Validation { id: String, reason: String },
}

impl ComponentError {
  pub fn initialization(id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Initialization {
      id: id.into(),
      reason: reason.into(),
    }
  }

  pub fn validation(id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Validation {
      id: id.into(),
      reason: reason.into(),
    }
  }
}

/// A dependency value whose runtime type a plugin cannot process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("plugin '{plugin_id}' cannot process a value of type {value_type}")]
pub struct UnsupportedAttributeTypeError {
  pub plugin_id: String,
  pub value_type: &'static str,
}

impl UnsupportedAttributeTypeError {
  pub fn new(plugin_id: impl Into<String>, value_type: &'static str) -> Self {
    Self {
      plugin_id: plugin_id.into(),
      value_type,
    }
  }
}

/// Failure to produce a value during one resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
  #[error(transparent)]
  Component(#[from] ComponentError),
  #[error(transparent)]
  UnsupportedAttributeType(#[from] UnsupportedAttributeTypeError),
  #[error("plugin '{plugin_id}' failed: {message}")]
  Failed { plugin_id: String, message: String },
  #[error("a result for '{0}' is already recorded in this resolution")]
  AlreadyResolved(String),
  #[error("no plugin named '{0}' is configured")]
  UnknownPlugin(String),
}

impl ResolutionError {
  pub fn failed(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Failed {
      plugin_id: plugin_id.into(),
      message: message.into(),
    }
  }

  /// Whether a plugin configured to mask errors may swallow this failure.
  ///
  /// Lifecycle violations and resolver-graph invariant violations always propagate.
  pub fn is_maskable(&self) -> bool {
    matches!(
      self,
      ResolutionError::Failed { .. } | ResolutionError::UnsupportedAttributeType(_)
    )
  }
}
