//! Initialize-once / validate / destroy state machine shared by resolver components.

use std::fmt;

use crate::error::ComponentError;

/// Where a component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
  #[default]
  Unconfigured,
  Initialized,
  Destroyed,
}

impl fmt::Display for ComponentState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ComponentState::Unconfigured => write!(f, "unconfigured"),
      ComponentState::Initialized => write!(f, "initialized"),
      ComponentState::Destroyed => write!(f, "destroyed"),
    }
  }
}

/// Lifecycle state of a single component.
///
/// Transitions only move forward: `Unconfigured -> Initialized -> Destroyed`.
/// A component may also be destroyed without ever being initialized.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
  state: ComponentState,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> ComponentState {
    self.state
  }

  pub fn is_initialized(&self) -> bool {
    self.state == ComponentState::Initialized
  }

  pub fn is_destroyed(&self) -> bool {
    self.state == ComponentState::Destroyed
  }

  /// Fails unless the component may still be initialized.
  pub fn check_initializable(&self, id: &str) -> Result<(), ComponentError> {
    match self.state {
      ComponentState::Unconfigured => Ok(()),
      ComponentState::Initialized => Err(ComponentError::initialization(
        id,
        "component is already initialized",
      )),
      ComponentState::Destroyed => Err(ComponentError::Destroyed(id.to_string())),
    }
  }

  pub fn mark_initialized(&mut self) {
    self.state = ComponentState::Initialized;
  }

  /// Fails unless the component is initialized and not yet destroyed.
  pub fn ensure_active(&self, id: &str) -> Result<(), ComponentError> {
    match self.state {
      ComponentState::Initialized => Ok(()),
      ComponentState::Unconfigured => Err(ComponentError::Uninitialized(id.to_string())),
      ComponentState::Destroyed => Err(ComponentError::Destroyed(id.to_string())),
    }
  }

  /// Destroying twice is a no-op.
  pub fn destroy(&mut self) {
    self.state = ComponentState::Destroyed;
  }
}
