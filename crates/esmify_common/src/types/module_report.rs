use arcstr::ArcStr;
use serde::Serialize;

use crate::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConvertStatus {
  Converted,
  ConvertedWithFallback,
  Failed,
}

impl ConvertStatus {
  pub fn is_success(self) -> bool {
    !matches!(self, Self::Failed)
  }
}

/// Outcome of converting one module.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
  pub source_path: ArcStr,
  pub target_path: String,
  pub converted_text: String,
  pub status: ConvertStatus,
  pub diagnostics: Vec<Diagnostic>,
}

impl ModuleReport {
  pub fn success(&self) -> bool {
    self.status.is_success()
  }
}
