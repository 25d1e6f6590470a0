//! CLI: resolve attributes for a principal from a JSON resolver configuration.
//!
//! Usage: `resolve_attributes --config <resolver.json> [OPTIONS]`
//! Example: resolve_attributes --config resolver.json --directory people.json --principal alice
//!
//! Prints the released attributes as JSON. Exits non-zero on any configuration or
//! resolution error.
//!
//! Set RUST_LOG=idp_attribute_resolver=trace for TRACE-level span enter/exit and events.

use clap::Parser;
use idp_attribute_resolver::connectors::InMemoryDirectory;
use idp_attribute_resolver::types::{Principal, Subject, SubjectContext};
use idp_attribute_resolver::{Collaborators, ResolutionContext, load_resolver, resolve_in_background};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Name under which `--directory` is offered to search connectors.
const DIRECTORY_EXECUTOR: &str = "directory";

/// Resolve attributes for a principal.
#[derive(Parser, Debug)]
#[command(name = "resolve_attributes")]
#[command(
  after_help = r#"Search connectors reference their executor by name. --directory registers an
in-memory directory (a JSON array of {"attr": ["value", ..]} entries) as "directory".

Examples:
  resolve_attributes --config resolver.json --principal alice
  resolve_attributes --config resolver.json --directory people.json --principal alice --attribute mail"#
)]
struct Args {
  /// Resolver configuration (JSON)
  #[arg(long, value_name = "FILE")]
  config: PathBuf,

  /// Principal to resolve attributes for
  #[arg(long)]
  principal: Option<String>,

  /// Entity the attributes are resolved for (relying party)
  #[arg(long)]
  requester: Option<String>,

  /// Entity resolving the attributes
  #[arg(long)]
  issuer: Option<String>,

  /// Only resolve these attribute ids (repeatable). Default: all.
  #[arg(long = "attribute", value_name = "ID")]
  attributes: Vec<String>,

  /// Username principal of the authenticated subject (repeatable)
  #[arg(long = "subject-principal", value_name = "NAME")]
  subject_principals: Vec<String>,

  /// Directory entries for search connectors (JSON)
  #[arg(long, value_name = "FILE")]
  directory: Option<PathBuf>,
}

fn build_context(args: &Args) -> ResolutionContext {
  let mut context = ResolutionContext::new().with_requested_attributes(args.attributes.iter().cloned());
  if let Some(principal) = &args.principal {
    context = context.with_principal(principal.as_str());
  }
  if let Some(requester) = &args.requester {
    context = context.with_recipient(requester.as_str());
  }
  if let Some(issuer) = &args.issuer {
    context = context.with_issuer(issuer.as_str());
  }
  if !args.subject_principals.is_empty() {
    let principals = args
      .subject_principals
      .iter()
      .map(|name| Principal::Username(name.clone()))
      .collect();
    context = context.with_subject_context(SubjectContext {
      principal_name: args.principal.clone(),
      subjects: vec![Subject::new(principals)],
    });
  }
  context
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  info!("resolve_attributes starting");
  let args = Args::parse();

  let mut collaborators = Collaborators::new();
  if let Some(path) = &args.directory {
    let directory = match InMemoryDirectory::load(path) {
      Ok(d) => d,
      Err(e) => {
        eprintln!("Error reading {}: {}", path.display(), e);
        process::exit(1);
      }
    };
    collaborators = collaborators.with_search_executor(DIRECTORY_EXECUTOR, Arc::new(directory));
  }

  let resolver = match load_resolver(&args.config, &collaborators) {
    Ok(r) => Arc::new(r),
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      process::exit(1);
    }
  };
  if let Err(e) = resolver.validate() {
    eprintln!("Validation error: {}", e);
    process::exit(1);
  }

  let context = build_context(&args);
  let resolved = match resolve_in_background(resolver, context).await {
    Ok(r) => r,
    Err(e) => {
      eprintln!("Resolution error: {}", e);
      process::exit(1);
    }
  };

  info!(released = resolved.len(), "resolution completed");
  match serde_json::to_string_pretty(&resolved) {
    Ok(json) => println!("{}", json),
    Err(e) => {
      eprintln!("Error encoding result: {}", e);
      process::exit(1);
    }
  }
}
