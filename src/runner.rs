//! Loading a resolver from disk and running resolutions from async code.
//!
//! - [load_resolver]: read a JSON configuration and compile it.
//! - [resolve_in_background]: run one synchronous resolution on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::compiler::{Collaborators, compile_resolver};
use crate::config::load_resolver_config;
use crate::error::{ComponentError, ResolutionError};
use crate::resolver::{AttributeResolver, ResolvedAttributes};
use crate::types::ResolutionContext;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("unable to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error(transparent)]
  Component(#[from] ComponentError),
  #[error(transparent)]
  Resolution(#[from] ResolutionError),
  #[error("resolution task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl RunError {
  pub fn io(path: &Path, source: std::io::Error) -> Self {
    Self::Io {
      path: path.display().to_string(),
      source,
    }
  }
}

/// Loads the configuration at `path` and compiles it into an initialized resolver.
#[instrument(level = "trace", skip(path, collaborators))]
pub fn load_resolver(path: &Path, collaborators: &Collaborators) -> Result<AttributeResolver, RunError> {
  let config = load_resolver_config(path).map_err(|e| RunError::io(path, e))?;
  let resolver = compile_resolver(&config, collaborators)?;
  info!(path = %path.display(), resolver = resolver.id(), "resolver loaded");
  Ok(resolver)
}

/// Runs [AttributeResolver::resolve_attributes] on the tokio blocking pool so
/// synchronous directory searches do not stall the async runtime.
pub async fn resolve_in_background(
  resolver: Arc<AttributeResolver>,
  context: ResolutionContext,
) -> Result<ResolvedAttributes, RunError> {
  let resolved = tokio::task::spawn_blocking(move || resolver.resolve_attributes(&context)).await??;
  Ok(resolved)
}
