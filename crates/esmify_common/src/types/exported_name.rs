#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedName {
  pub local: String,
  pub exported: String,
}

impl ExportedName {
  pub fn new(local: impl Into<String>, exported: impl Into<String>) -> Self {
    Self { local: local.into(), exported: exported.into() }
  }

  pub fn is_aliased(&self) -> bool {
    self.local != self.exported
  }
}
