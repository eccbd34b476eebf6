use std::path::PathBuf;

use esmify_utils::indexmap::FxIndexMap;

use crate::{NormalizedInputItem, Replacement};

#[allow(clippy::struct_excessive_bools)] // Using raw booleans is more clear in this case
#[derive(Debug)]
pub struct NormalizedConverterOptions {
  // --- Input
  pub input: Vec<NormalizedInputItem>,
  pub cwd: PathBuf,
  /// Normalized source path of the designated entry file.
  pub entry_point: Option<String>,
  pub follow_links: bool,

  // --- Output
  pub output_extension: String,
  pub target: String,
  pub no_header: bool,
  pub with_report: bool,

  // --- Rewrite
  pub pre_replacements: Vec<Replacement>,
  pub post_replacements: Vec<Replacement>,

  // --- Resolve
  pub rename: FxIndexMap<String, String>,
  pub import_map: bool,

  // --- Bundle
  pub bundle: Option<String>,
  pub minify: bool,
}
