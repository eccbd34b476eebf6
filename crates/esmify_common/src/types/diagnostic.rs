use std::fmt::Display;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
  /// The structural parser could not build a tree.
  ParseFailure,
  /// A rewritten import fragment did not reparse and its site was left as is.
  SiteValidation,
  /// A construct that is intentionally left unconverted.
  Unsupported,
  Resolution,
  Projection,
  /// Even the fallback output does not parse.
  ConversionFailure,
}

impl Display for DiagnosticKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::ParseFailure => write!(f, "parse-failure"),
      Self::SiteValidation => write!(f, "site-validation"),
      Self::Unsupported => write!(f, "unsupported"),
      Self::Resolution => write!(f, "resolution"),
      Self::Projection => write!(f, "projection"),
      Self::ConversionFailure => write!(f, "conversion-failure"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub message: String,
}

impl Diagnostic {
  pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
    Self { kind, message: message.into() }
  }
}

impl Display for Diagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}] {}", self.kind, self.message)
  }
}
