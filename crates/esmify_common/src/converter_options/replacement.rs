use std::borrow::Cow;

use regex::Regex;
use serde::Deserialize;

/// A `{ search, replace }` text substitution from the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementRule {
  pub search: String,
  pub replace: String,
  /// Treat `search` as a regular expression. `replace` may then use `$1`-style groups.
  #[serde(default)]
  pub regex: bool,
}

/// A compiled `ReplacementRule`.
#[derive(Debug, Clone)]
pub enum Replacement {
  Literal { search: String, replace: String },
  Pattern { pattern: Regex, replace: String },
}

impl Replacement {
  pub fn apply<'text>(&self, text: &'text str) -> Cow<'text, str> {
    match self {
      Self::Literal { search, replace } => {
        if search.is_empty() || !text.contains(search.as_str()) {
          Cow::Borrowed(text)
        } else {
          Cow::Owned(text.replace(search.as_str(), replace))
        }
      }
      Self::Pattern { pattern, replace } => pattern.replace_all(text, replace.as_str()),
    }
  }
}

#[test]
fn test_apply_replacement() {
  let literal = Replacement::Literal { search: "foo".to_string(), replace: "bar".to_string() };
  assert_eq!(literal.apply("foo + foo"), "bar + bar");
  assert!(matches!(literal.apply("baz"), Cow::Borrowed(_)));

  let pattern = Replacement::Pattern {
    pattern: Regex::new(r"v(\d+)").unwrap(),
    replace: "version-$1".to_string(),
  };
  assert_eq!(pattern.apply("v1 and v22"), "version-1 and version-22");
}
