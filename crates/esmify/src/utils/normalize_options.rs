use std::path::{Path, PathBuf};

use esmify_common::{
  ConverterOptions, InputItem, NormalizedConverterOptions, NormalizedInputItem, Replacement,
  ReplacementRule,
};
use esmify_error::BuildResult;
use regex::Regex;
use sugar_path::SugarPath;

use super::stabilize_path::{as_folder, stabilize_path};

const DEFAULT_ROOT_DIR: &str = "./";
const DEFAULT_OUTPUT_DIR: &str = "dist/";
const DEFAULT_OUTPUT_EXTENSION: &str = ".mjs";
const DEFAULT_TARGET: &str = "esm";

pub fn normalize_options(raw_options: ConverterOptions) -> BuildResult<NormalizedConverterOptions> {
  let cwd = match raw_options.cwd {
    Some(cwd) => cwd.absolutize(),
    None => std::env::current_dir().map_err(anyhow::Error::from)?,
  };

  let input = raw_options.input.unwrap_or_default();
  if input.is_empty() {
    Err(anyhow::anyhow!("No input files were given"))?;
  }

  let root_dir = as_folder(raw_options.root_dir.as_deref().unwrap_or(DEFAULT_ROOT_DIR));
  let output_dir = as_folder(raw_options.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR));
  let input = input
    .into_iter()
    .map(|item| normalize_input_item(item, &cwd, &root_dir, &output_dir))
    .collect();

  let mut errors = vec![];
  let pre_replacements =
    compile_replacements(raw_options.pre_replacements.unwrap_or_default(), &mut errors);
  let post_replacements =
    compile_replacements(raw_options.post_replacements.unwrap_or_default(), &mut errors);
  if !errors.is_empty() {
    Err(errors)?;
  }

  let output_extension =
    raw_options.output_extension.unwrap_or_else(|| DEFAULT_OUTPUT_EXTENSION.to_string());
  let output_extension = if output_extension.starts_with('.') {
    output_extension
  } else {
    format!(".{output_extension}")
  };

  Ok(NormalizedConverterOptions {
    entry_point: raw_options.entry_point.map(|entry| stabilize_path(Path::new(&entry), &cwd)),
    input,
    follow_links: raw_options.follow_links.unwrap_or(true),
    output_extension,
    target: raw_options.target.unwrap_or_else(|| DEFAULT_TARGET.to_string()),
    no_header: raw_options.no_header.unwrap_or(false),
    with_report: raw_options.with_report.unwrap_or(false),
    pre_replacements,
    post_replacements,
    rename: raw_options.rename.unwrap_or_default(),
    import_map: raw_options.import_map.unwrap_or(false),
    bundle: raw_options.bundle,
    minify: raw_options.minify.unwrap_or(true),
    cwd,
  })
}

fn normalize_input_item(
  item: InputItem,
  cwd: &Path,
  root_dir: &str,
  output_dir: &str,
) -> NormalizedInputItem {
  let working_dir: PathBuf = match item.working_dir {
    Some(working_dir) if working_dir.is_absolute() => working_dir.normalize(),
    Some(working_dir) => cwd.join(working_dir).normalize(),
    None => cwd.to_path_buf(),
  };
  let source = Path::new(&item.source);
  let source = if source.is_absolute() {
    stabilize_path(source, &working_dir)
  } else {
    stabilize_path(&working_dir.join(source).normalize(), &working_dir)
  };

  NormalizedInputItem {
    source,
    root_dir: item.root_dir.as_deref().map_or_else(|| root_dir.to_string(), as_folder),
    output_dir: item.output_dir.as_deref().map_or_else(|| output_dir.to_string(), as_folder),
    working_dir,
  }
}

fn compile_replacements(
  rules: Vec<ReplacementRule>,
  errors: &mut Vec<anyhow::Error>,
) -> Vec<Replacement> {
  rules
    .into_iter()
    .filter_map(|rule| {
      if !rule.regex {
        return Some(Replacement::Literal { search: rule.search, replace: rule.replace });
      }
      match Regex::new(&rule.search) {
        Ok(pattern) => Some(Replacement::Pattern { pattern, replace: rule.replace }),
        Err(err) => {
          errors.push(anyhow::anyhow!("Invalid replacement pattern `{}`: {err}", rule.search));
          None
        }
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(input: Vec<InputItem>) -> ConverterOptions {
    ConverterOptions {
      input: Some(input),
      cwd: Some(PathBuf::from("/project")),
      ..ConverterOptions::default()
    }
  }

  #[test]
  fn fills_defaults() {
    let normalized = normalize_options(options(vec!["./src/index.js".into()])).unwrap();
    assert_eq!(normalized.output_extension, ".mjs");
    assert_eq!(normalized.target, "esm");
    assert!(normalized.follow_links);
    assert!(normalized.minify);
    assert!(!normalized.import_map);
    assert_eq!(
      normalized.input,
      vec![NormalizedInputItem {
        source: "src/index.js".to_string(),
        root_dir: "./".to_string(),
        output_dir: "dist/".to_string(),
        working_dir: PathBuf::from("/project"),
      }]
    );
  }

  #[test]
  fn per_item_directories_win() {
    let item = InputItem {
      source: "/project/lib/a.js".to_string(),
      root_dir: Some("lib".to_string()),
      output_dir: Some("out".to_string()),
      working_dir: None,
    };
    let mut raw = options(vec![item]);
    raw.output_extension = Some("js".to_string());
    let normalized = normalize_options(raw).unwrap();
    assert_eq!(normalized.output_extension, ".js");
    assert_eq!(normalized.input[0].source, "lib/a.js");
    assert_eq!(normalized.input[0].root_dir, "lib/");
    assert_eq!(normalized.input[0].output_dir, "out/");
  }

  #[test]
  fn empty_input_is_fatal() {
    assert!(normalize_options(options(vec![])).is_err());
  }

  #[test]
  fn invalid_pattern_is_fatal() {
    let mut raw = options(vec!["a.js".into()]);
    raw.pre_replacements =
      Some(vec![ReplacementRule { search: "(".to_string(), replace: String::new(), regex: true }]);
    let err = normalize_options(raw).unwrap_err();
    assert_eq!(err.len(), 1);
  }
}
