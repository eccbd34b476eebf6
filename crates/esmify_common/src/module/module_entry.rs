use std::path::PathBuf;

use arcstr::ArcStr;

use crate::{ExportedName, GraphRecord, ModuleIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
  Script,
  /// Copied verbatim and imported with a `json` type attribute.
  Json,
}

impl ModuleKind {
  pub fn from_path(path: &str) -> Self {
    if path.ends_with(".json") { Self::Json } else { Self::Script }
  }
}

/// One discovered file.
#[derive(Debug)]
pub struct ModuleEntry {
  pub idx: ModuleIdx,
  /// Normalized, slash-separated. Identifies the entry within the graph.
  pub source_path: ArcStr,
  pub root_dir: String,
  pub output_dir: String,
  pub working_dir: PathBuf,
  pub target_path: String,
  pub target_absolute_path: PathBuf,
  /// Derived from `target_path` only.
  pub id: String,
  pub weight: u32,
  pub referrers: Vec<ArcStr>,
  pub entry_point: bool,
  /// Converted for the bundle but never written.
  pub not_on_disk: bool,
  pub kind: ModuleKind,
  pub exported_names: Vec<ExportedName>,
  pub converted_text: Option<String>,
}

impl ModuleEntry {
  /// Records `referrer` once. Returns whether it was new.
  pub fn add_referrer(&mut self, referrer: &ArcStr) -> bool {
    if self.referrers.contains(referrer) {
      return false;
    }
    self.referrers.push(referrer.clone());
    self.weight += 1;
    true
  }

  pub fn absolute_source_path(&self) -> PathBuf {
    self.working_dir.join(self.source_path.as_str())
  }

  pub fn to_graph_record(&self) -> GraphRecord {
    GraphRecord {
      source: self.source_path.to_string(),
      target: self.target_path.clone(),
      id: self.id.clone(),
      weight: self.weight,
    }
  }
}
