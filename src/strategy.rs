//! Injectable collaborators: template engines, value-derivation strategies and
//! context value functions.
//!
//! Each is invoked synchronously: named bindings in, a value set (or text) out.

use std::collections::BTreeMap;
use std::sync::RwLock;

use handlebars::Handlebars;

use crate::error::ResolutionError;
use crate::types::{AttributeValue, ResolutionContext};

/// Dependency values keyed by attribute id.
pub type ValueBindings = BTreeMap<String, Vec<AttributeValue>>;

/// Renders text templates against JSON bindings.
pub trait TemplateEngine: Send + Sync {
  /// Checks that `template` compiles. Called once at plugin initialization;
  /// engines may keep the compiled form for [TemplateEngine::render].
  fn check(&self, template: &str) -> Result<(), String>;

  fn render(&self, template: &str, bindings: &serde_json::Value) -> Result<String, String>;
}

/// [TemplateEngine] backed by handlebars, with HTML escaping disabled.
///
/// Each template is compiled once and registered under its own text.
pub struct HandlebarsTemplateEngine {
  registry: RwLock<Handlebars<'static>>,
}

impl Default for HandlebarsTemplateEngine {
  fn default() -> Self {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    Self {
      registry: RwLock::new(registry),
    }
  }
}

impl HandlebarsTemplateEngine {
  pub fn new() -> Self {
    Self::default()
  }

  fn render_registered(&self, template: &str, bindings: &serde_json::Value) -> Option<Result<String, String>> {
    let registry = match self.registry.read() {
      Ok(registry) => registry,
      Err(e) => return Some(Err(e.to_string())),
    };
    registry
      .has_template(template)
      .then(|| registry.render(template, bindings).map_err(|e| e.to_string()))
  }
}

impl TemplateEngine for HandlebarsTemplateEngine {
  fn check(&self, template: &str) -> Result<(), String> {
    let mut registry = self.registry.write().map_err(|e| e.to_string())?;
    if registry.has_template(template) {
      return Ok(());
    }
    registry
      .register_template_string(template, template)
      .map_err(|e| e.to_string())
  }

  fn render(&self, template: &str, bindings: &serde_json::Value) -> Result<String, String> {
    if let Some(rendered) = self.render_registered(template, bindings) {
      return rendered;
    }
    self.check(template)?;
    self
      .render_registered(template, bindings)
      .unwrap_or_else(|| Err(format!("template '{}' is not registered", template)))
  }
}

/// Derives a value set from named dependency values (scripted definitions).
pub trait ValueDerivationStrategy: Send + Sync {
  fn derive(
    &self,
    bindings: &ValueBindings,
    context: &ResolutionContext,
  ) -> Result<Vec<AttributeValue>, ResolutionError>;
}

impl<F> ValueDerivationStrategy for F
where
  F: Fn(&ValueBindings, &ResolutionContext) -> Result<Vec<AttributeValue>, ResolutionError>
    + Send
    + Sync,
{
  fn derive(
    &self,
    bindings: &ValueBindings,
    context: &ResolutionContext,
  ) -> Result<Vec<AttributeValue>, ResolutionError> {
    self(bindings, context)
  }
}

/// Extracts values from the request surrounding a resolution rather than from
/// the dependency graph.
pub trait ContextValuesFunction: Send + Sync {
  fn apply(&self, context: &ResolutionContext) -> Result<Vec<AttributeValue>, ResolutionError>;
}

impl<F> ContextValuesFunction for F
where
  F: Fn(&ResolutionContext) -> Result<Vec<AttributeValue>, ResolutionError> + Send + Sync,
{
  fn apply(&self, context: &ResolutionContext) -> Result<Vec<AttributeValue>, ResolutionError> {
    self(context)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::{HandlebarsTemplateEngine, TemplateEngine};

  #[test]
  fn handlebars_renders_without_html_escaping() {
    let engine = HandlebarsTemplateEngine::new();
    let out = engine
      .render("{{given}} <{{mail}}>", &json!({"given": "Ann & Co", "mail": "a@x.org"}))
      .unwrap();
    assert_eq!(out, "Ann & Co <a@x.org>");
  }

  #[test]
  fn handlebars_check_rejects_broken_template() {
    let engine = HandlebarsTemplateEngine::new();
    assert!(engine.check("{{#if x}}unterminated").is_err());
    assert!(engine.check("{{uid}}@example.org").is_ok());
  }

  #[test]
  fn templates_are_compiled_once() {
    let engine = HandlebarsTemplateEngine::new();
    engine.check("{{uid}}@example.org").unwrap();
    for uid in ["alice", "bob"] {
      let out = engine.render("{{uid}}@example.org", &json!({ "uid": uid })).unwrap();
      assert_eq!(out, format!("{}@example.org", uid));
    }
    engine.render("{{sn}}", &json!({ "sn": "Liddell" })).unwrap();
    assert_eq!(engine.registry.read().unwrap().get_templates().len(), 2);
  }
}
