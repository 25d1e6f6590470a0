//! A [SearchExecutor] over an in-memory list of entries.
//!
//! Understands equality and presence filters, alone or under a single `&`:
//! `(uid=alice)`, `(mail=*)`, `(&(uid=alice)(ou=staff))`. Attribute names and
//! values compare case-insensitively.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::instrument;

use super::search::{ExecutableSearch, SearchEntry, SearchExecutor};

static ASSERTION: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"\(([A-Za-z][A-Za-z0-9;.\-]*)=([^()]*)\)")
    .expect("ASSERTION is a valid regex pattern")
});

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
  entries: Vec<SearchEntry>,
  searches: AtomicUsize,
}

impl InMemoryDirectory {
  pub fn new(entries: Vec<SearchEntry>) -> Self {
    Self {
      entries,
      searches: AtomicUsize::new(0),
    }
  }

  /// Loads entries from a JSON array of `{ "attr": ["value", ..] }` objects.
  #[instrument(level = "trace", skip(path))]
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let entries: Vec<SearchEntry> = serde_json::from_slice(&bytes)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Self::new(entries))
  }

  /// Number of searches executed so far.
  pub fn search_count(&self) -> usize {
    self.searches.load(Ordering::Relaxed)
  }
}

fn unescape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut rest = value;
  while let Some(pos) = rest.find('\\') {
    out.push_str(&rest[..pos]);
    let hex = rest.get(pos + 1..pos + 3);
    match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
      Some(byte) => {
        out.push(char::from(byte));
        rest = &rest[pos + 3..];
      }
      None => {
        out.push('\\');
        rest = &rest[pos + 1..];
      }
    }
  }
  out.push_str(rest);
  out
}

fn parse_filter(filter: &str) -> Result<Vec<(String, Option<String>)>, String> {
  let filter = filter.trim();
  let assertions: Vec<(String, Option<String>)> = ASSERTION
    .captures_iter(filter)
    .map(|c| {
      let value = &c[2];
      let value = (value != "*").then(|| unescape(value));
      (c[1].to_ascii_lowercase(), value)
    })
    .collect();
  let conjunction = filter.starts_with("(&") && filter.ends_with(')');
  if assertions.is_empty() || (assertions.len() > 1 && !conjunction) {
    return Err(format!("unsupported filter '{}'", filter));
  }
  Ok(assertions)
}

fn entry_matches(entry: &SearchEntry, assertions: &[(String, Option<String>)]) -> bool {
  assertions.iter().all(|(name, expected)| {
    let values = entry
      .iter()
      .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
      .map(|(_, values)| values.as_slice())
      .unwrap_or_default();
    match expected {
      None => !values.is_empty(),
      Some(expected) => values.iter().any(|v| v.eq_ignore_ascii_case(expected)),
    }
  })
}

impl SearchExecutor for InMemoryDirectory {
  fn search(&self, search: &ExecutableSearch) -> Result<Vec<SearchEntry>, String> {
    self.searches.fetch_add(1, Ordering::Relaxed);
    let assertions = parse_filter(search.filter())?;
    Ok(
      self
        .entries
        .iter()
        .filter(|entry| entry_matches(entry, &assertions))
        .cloned()
        .collect(),
    )
  }
}
