use std::path::PathBuf;

use serde::Deserialize;

/// A seed file, as given by the user.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(from = "RawInputItem")]
pub struct InputItem {
  pub source: String,
  pub root_dir: Option<String>,
  pub output_dir: Option<String>,
  pub working_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInputItem {
  Path(String),
  #[serde(rename_all = "camelCase")]
  Item {
    source: String,
    root_dir: Option<String>,
    output_dir: Option<String>,
    working_dir: Option<PathBuf>,
  },
}

impl From<RawInputItem> for InputItem {
  fn from(value: RawInputItem) -> Self {
    match value {
      RawInputItem::Path(source) => Self { source, ..Self::default() },
      RawInputItem::Item { source, root_dir, output_dir, working_dir } => {
        Self { source, root_dir, output_dir, working_dir }
      }
    }
  }
}

impl From<&str> for InputItem {
  fn from(value: &str) -> Self {
    Self { source: value.to_string(), ..Self::default() }
  }
}

impl From<String> for InputItem {
  fn from(source: String) -> Self {
    Self { source, ..Self::default() }
  }
}

/// A seed with every directory filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInputItem {
  /// Normalized, working-dir-relative when the file lives below the working dir.
  pub source: String,
  pub root_dir: String,
  pub output_dir: String,
  pub working_dir: PathBuf,
}
