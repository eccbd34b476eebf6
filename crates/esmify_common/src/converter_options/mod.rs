pub mod input_item;
pub mod normalized_converter_options;
pub mod replacement;

use std::path::PathBuf;

use esmify_utils::indexmap::FxIndexMap;
use serde::Deserialize;

use crate::{InputItem, ReplacementRule};

/// Raw configuration. Every field is optional, defaults are filled in by `normalize_options`.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterOptions {
  // --- Input
  pub input: Option<Vec<InputItem>>,
  pub cwd: Option<PathBuf>,
  pub root_dir: Option<String>,
  pub entry_point: Option<String>,
  pub follow_links: Option<bool>,

  // --- Output
  pub output_dir: Option<String>,
  pub output_extension: Option<String>,
  pub target: Option<String>,
  pub no_header: Option<bool>,
  pub with_report: Option<bool>,

  // --- Rewrite
  pub pre_replacements: Option<Vec<ReplacementRule>>,
  pub post_replacements: Option<Vec<ReplacementRule>>,

  // --- Resolve
  pub rename: Option<FxIndexMap<String, String>>,
  pub import_map: Option<bool>,

  // --- Bundle
  pub bundle: Option<String>,
  pub minify: Option<bool>,
}

impl ConverterOptions {
  /// Fills every field unset in `self` from `other`.
  #[must_use]
  pub fn merge(self, other: Self) -> Self {
    Self {
      input: self.input.or(other.input),
      cwd: self.cwd.or(other.cwd),
      root_dir: self.root_dir.or(other.root_dir),
      entry_point: self.entry_point.or(other.entry_point),
      follow_links: self.follow_links.or(other.follow_links),
      output_dir: self.output_dir.or(other.output_dir),
      output_extension: self.output_extension.or(other.output_extension),
      target: self.target.or(other.target),
      no_header: self.no_header.or(other.no_header),
      with_report: self.with_report.or(other.with_report),
      pre_replacements: self.pre_replacements.or(other.pre_replacements),
      post_replacements: self.post_replacements.or(other.post_replacements),
      rename: self.rename.or(other.rename),
      import_map: self.import_map.or(other.import_map),
      bundle: self.bundle.or(other.bundle),
      minify: self.minify.or(other.minify),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserialize_camel_case_config() {
    let options: ConverterOptions = serde_json::from_str(
      r#"{
        "input": ["src/index.js", { "source": "lib/a.js", "rootDir": "lib/" }],
        "outputDir": "out/",
        "followLinks": false,
        "rename": { "lodash": "lodash-es" },
        "preReplacements": [{ "search": "foo", "replace": "bar" }]
      }"#,
    )
    .unwrap();

    let input = options.input.unwrap();
    assert_eq!(input[0].source, "src/index.js");
    assert_eq!(input[1].root_dir.as_deref(), Some("lib/"));
    assert_eq!(options.output_dir.as_deref(), Some("out/"));
    assert_eq!(options.follow_links, Some(false));
    assert_eq!(options.rename.unwrap()["lodash"], "lodash-es");
    assert!(!options.pre_replacements.unwrap()[0].regex);
  }

  #[test]
  fn merge_prefers_self() {
    let cli = ConverterOptions { target: Some("node".to_string()), ..Default::default() };
    let file = ConverterOptions {
      target: Some("esm".to_string()),
      minify: Some(false),
      ..Default::default()
    };
    let merged = cli.merge(file);
    assert_eq!(merged.target.as_deref(), Some("node"));
    assert_eq!(merged.minify, Some(false));
  }
}
