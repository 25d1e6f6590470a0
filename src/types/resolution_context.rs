//! Per-request input to attribute resolution.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::IdPAttribute;

/// An authenticated principal attached to a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
  /// Login name established by authentication.
  Username(String),
  /// Principal carrying a whole attribute (e.g. asserted by an upstream IdP).
  Attribute(IdPAttribute),
  /// Any other principal type, identified by a kind label.
  Other { kind: String, name: String },
}

impl Principal {
  pub fn name(&self) -> &str {
    match self {
      Principal::Username(name) => name,
      Principal::Attribute(attribute) => attribute.id(),
      Principal::Other { name, .. } => name,
    }
  }
}

/// One authenticated subject and its principals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
  pub principals: Vec<Principal>,
}

impl Subject {
  pub fn new(principals: Vec<Principal>) -> Self {
    Self { principals }
  }
}

/// Authentication results for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectContext {
  pub principal_name: Option<String>,
  pub subjects: Vec<Subject>,
}

/// Identifies who attributes are being resolved for and on whose behalf.
///
/// Also carries the subject context and free-form properties of the enclosing
/// request so context-derived definitions can read them.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
  request_id: Uuid,
  principal: Option<String>,
  attribute_recipient_id: Option<String>,
  attribute_issuer_id: Option<String>,
  requested_attribute_ids: Vec<String>,
  subject_context: Option<SubjectContext>,
  request_properties: BTreeMap<String, String>,
}

impl Default for ResolutionContext {
  fn default() -> Self {
    Self::new()
  }
}

impl ResolutionContext {
  pub fn new() -> Self {
    Self {
      request_id: Uuid::new_v4(),
      principal: None,
      attribute_recipient_id: None,
      attribute_issuer_id: None,
      requested_attribute_ids: Vec::new(),
      subject_context: None,
      request_properties: BTreeMap::new(),
    }
  }

  pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
    self.principal = Some(principal.into());
    self
  }

  pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
    self.attribute_recipient_id = Some(recipient.into());
    self
  }

  pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
    self.attribute_issuer_id = Some(issuer.into());
    self
  }

  pub fn with_requested_attributes<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.requested_attribute_ids = ids.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_subject_context(mut self, subject_context: SubjectContext) -> Self {
    self.subject_context = Some(subject_context);
    self
  }

  pub fn with_request_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.request_properties.insert(key.into(), value.into());
    self
  }

  pub fn request_id(&self) -> Uuid {
    self.request_id
  }

  pub fn principal(&self) -> Option<&str> {
    self.principal.as_deref()
  }

  pub fn attribute_recipient_id(&self) -> Option<&str> {
    self.attribute_recipient_id.as_deref()
  }

  pub fn attribute_issuer_id(&self) -> Option<&str> {
    self.attribute_issuer_id.as_deref()
  }

  /// Empty means every configured definition is resolved.
  pub fn requested_attribute_ids(&self) -> &[String] {
    &self.requested_attribute_ids
  }

  pub fn subject_context(&self) -> Option<&SubjectContext> {
    self.subject_context.as_ref()
  }

  pub fn request_property(&self, key: &str) -> Option<&str> {
    self.request_properties.get(key).map(String::as_str)
  }
}
