/// `imported as local` inside the braces of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBinding {
  pub imported: String,
  pub local: String,
}

impl NamedBinding {
  pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
    Self { imported: imported.into(), local: local.into() }
  }
}

/// What a static import declaration binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
  /// `import "p";`
  SideEffect,
  /// `import local from "p";`
  Default(String),
  /// `import { imported as local } from "p";`
  Named(Vec<NamedBinding>),
}

/// One `require(...)` occurrence and the statement that owns it.
#[derive(Debug, Clone)]
pub struct ExtractedSite {
  /// Start of the removed text. Equals the call span for inline sites.
  pub start: u32,
  pub end: u32,
  pub text: String,
  pub require_path: String,
  pub declared_identifier: Option<String>,
  /// `let x; ... x = require(...)`: the bare declaration is removed separately.
  pub declaration_separate_from_call: bool,
  pub binding: ImportBinding,
}
