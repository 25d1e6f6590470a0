//! Values derived from the principals of the authenticated subjects.

use std::sync::Arc;

use tracing::trace;

use crate::error::ResolutionError;
use crate::strategy::ContextValuesFunction;
use crate::types::{AttributeValue, Principal, ResolutionContext};

/// Per-principal extraction; `None` or an empty list contributes nothing.
pub type PrincipalValuesFn = Arc<dyn Fn(&Principal) -> Option<Vec<AttributeValue>> + Send + Sync>;

/// Applies an extractor to every principal of every subject in the request's
/// subject context and concatenates the non-empty results.
///
/// A request with no subject context yields no values.
#[derive(Clone)]
pub struct SubjectDerivedAttributeValuesFunction {
  extractor: PrincipalValuesFn,
}

impl SubjectDerivedAttributeValuesFunction {
  pub fn new<F>(extractor: F) -> Self
  where
    F: Fn(&Principal) -> Option<Vec<AttributeValue>> + Send + Sync + 'static,
  {
    Self {
      extractor: Arc::new(extractor),
    }
  }

  /// Names of username principals.
  pub fn principal_names() -> Self {
    Self::new(|principal| match principal {
      Principal::Username(name) => Some(vec![AttributeValue::string(name.as_str())]),
      _ => None,
    })
  }

  /// Values of attribute principals carrying `attribute_id`.
  pub fn attribute_principal_values(attribute_id: impl Into<String>) -> Self {
    let attribute_id = attribute_id.into();
    Self::new(move |principal| match principal {
      Principal::Attribute(attribute) if attribute.id() == attribute_id => {
        Some(attribute.values().to_vec())
      }
      _ => None,
    })
  }
}

impl ContextValuesFunction for SubjectDerivedAttributeValuesFunction {
  fn apply(&self, context: &ResolutionContext) -> Result<Vec<AttributeValue>, ResolutionError> {
    let Some(subject_context) = context.subject_context() else {
      trace!("no subject context");
      return Ok(Vec::new());
    };
    let values = subject_context
      .subjects
      .iter()
      .flat_map(|subject| subject.principals.iter())
      .filter_map(|principal| (self.extractor)(principal))
      .flatten()
      .collect();
    Ok(values)
  }
}
