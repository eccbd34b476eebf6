//! Slash-separated path algebra used to project a source file onto its output location.
//!
//! Folders are told apart from files by a trailing `/`. Nothing here touches the disk.

use esmify_error::ProjectionError;

use crate::concat_string;

/// The root that stands for "the directory of the path itself".
pub const SELF_ROOT: &str = "./";

const TRANSLATED_EXTENSIONS: [&str; 3] = ["js", "cjs", "mjs"];

pub fn is_folder(path: &str) -> bool {
  path.ends_with('/')
}

/// Returns the absolute prefix of a slashed path (`/`, `C:/` or nothing) and the remainder.
fn split_prefix(path: &str) -> (String, &str) {
  let bytes = path.as_bytes();
  if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
    return (concat_string!(&path[..2], "/"), &path[2..]);
  }
  if path.starts_with('/') {
    return ("/".to_string(), path);
  }
  (String::new(), path)
}

pub fn normalize_path(path: &str) -> String {
  let slashed = path.replace('\\', "/");
  let (prefix, rest) = split_prefix(&slashed);

  let last_segment = rest.rsplit('/').next().unwrap_or_default();
  let folder = rest.ends_with('/') || matches!(last_segment, "." | "..");

  let mut segments: Vec<&str> = Vec::new();
  for segment in rest.split('/') {
    match segment {
      "" | "." => {}
      ".." => match segments.last() {
        Some(&last) if last != ".." => {
          segments.pop();
        }
        // Nothing above an absolute root.
        _ if !prefix.is_empty() => {}
        _ => segments.push(".."),
      },
      _ => segments.push(segment),
    }
  }

  let mut normalized = prefix;
  normalized.push_str(&segments.join("/"));
  if normalized.is_empty() {
    return SELF_ROOT.to_string();
  }
  if folder && !segments.is_empty() {
    normalized.push('/');
  }
  normalized
}

/// The directory part of a normalized file path, with its trailing `/`.
pub fn parent_dir(path: &str) -> String {
  let path = normalize_path(path);
  if is_folder(&path) {
    return path;
  }
  match path.rfind('/') {
    Some(idx) => path[..=idx].to_string(),
    None => SELF_ROOT.to_string(),
  }
}

pub fn join_path(dir: &str, path: &str) -> String {
  let path = path.replace('\\', "/");
  if !split_prefix(&path).0.is_empty() {
    return normalize_path(&path);
  }
  normalize_path(&concat_string!(dir, "/", path))
}

/// Position of `path` relative to `root`.
///
/// The self root `./` drops the first segment of the path instead.
pub fn sub_path(path: &str, root: &str) -> Result<String, ProjectionError> {
  let path = normalize_path(path);
  let root = normalize_path(root);

  if root == SELF_ROOT {
    return Ok(match path.split_once('/') {
      Some((_, "")) => SELF_ROOT.to_string(),
      Some((_, rest)) => rest.to_string(),
      None => path,
    });
  }

  let root_dir = if is_folder(&root) { root.clone() } else { concat_string!(root, "/") };
  if path == root || path == root_dir {
    return Ok(SELF_ROOT.to_string());
  }
  match path.strip_prefix(&root_dir) {
    Some(rest) => Ok(rest.to_string()),
    None => Err(ProjectionError::NotAPrefix { path, root }),
  }
}

/// Swaps a script extension for `extension` (given with its leading dot).
pub fn translate_extension(path: &str, extension: &str) -> String {
  if is_folder(path) {
    return path.to_string();
  }
  let file_start = path.rfind('/').map_or(0, |idx| idx + 1);
  match path[file_start..].rfind('.') {
    Some(dot) if dot > 0 => {
      let dot = file_start + dot;
      if TRANSLATED_EXTENSIONS.contains(&&path[dot + 1..]) {
        concat_string!(&path[..dot], extension)
      } else {
        path.to_string()
      }
    }
    _ => path.to_string(),
  }
}

/// Re-roots `source` from `root` under `output_dir` and translates its extension.
pub fn project_path(
  source: &str,
  root: &str,
  output_dir: &str,
  extension: &str,
) -> Result<String, ProjectionError> {
  let sub = sub_path(source, root)?;
  Ok(translate_extension(&join_path(output_dir, &sub), extension))
}

/// Relative specifier leading from the file `from` to `to`, always starting with `./` or `../`.
pub fn relative_path(from: &str, to: &str) -> String {
  let from_dir = parent_dir(from);
  let to = normalize_path(to);

  let (from_prefix, from_rest) = split_prefix(&from_dir);
  let (to_prefix, to_rest) = split_prefix(&to);
  if from_prefix != to_prefix {
    return to;
  }

  let from_segments: Vec<&str> =
    from_rest.split('/').filter(|segment| !segment.is_empty() && *segment != ".").collect();
  let to_segments: Vec<&str> =
    to_rest.split('/').filter(|segment| !segment.is_empty() && *segment != ".").collect();

  let common = from_segments
    .iter()
    .zip(to_segments.iter())
    .take_while(|(from_segment, to_segment)| from_segment == to_segment)
    .count();

  let mut relative = if from_segments.len() == common {
    SELF_ROOT.to_string()
  } else {
    "../".repeat(from_segments.len() - common)
  };
  relative.push_str(&to_segments[common..].join("/"));
  if is_folder(&to) && !relative.ends_with('/') {
    relative.push('/');
  }
  relative
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_is_idempotent() {
    let inputs = [
      "",
      ".",
      "./",
      "..",
      "../a/./b/",
      "a\\b\\..\\c.js",
      "/a/../../b",
      "C:\\project\\src\\index.js",
      "src//lib/",
      "a/b/..",
      "./a/../..",
    ];
    for input in inputs {
      let once = normalize_path(input);
      assert_eq!(normalize_path(&once), once, "normalizing {input:?} twice");
    }
  }

  #[test]
  fn normalize_path_shapes() {
    assert_eq!(normalize_path(""), "./");
    assert_eq!(normalize_path("./src/./a.js"), "src/a.js");
    assert_eq!(normalize_path("src/lib/"), "src/lib/");
    assert_eq!(normalize_path("a/b/.."), "a/");
    assert_eq!(normalize_path("../x/../../y"), "../../y");
    assert_eq!(normalize_path("/a/../../b"), "/b");
    assert_eq!(normalize_path("C:\\a\\b.js"), "C:/a/b.js");
    assert_eq!(normalize_path("/"), "/");
  }

  #[test]
  fn sub_path_with_prefix_root() {
    assert_eq!(sub_path("src/lib/a.js", "src/").unwrap(), "lib/a.js");
    assert_eq!(sub_path("src/lib/a.js", "src").unwrap(), "lib/a.js");
    assert_eq!(sub_path("src/", "src/").unwrap(), "./");
  }

  #[test]
  fn sub_path_with_self_root_drops_a_segment() {
    assert_eq!(sub_path("C:/project/a.js", "./").unwrap(), "project/a.js");
    assert_eq!(sub_path("/home/a.js", "./").unwrap(), "home/a.js");
    assert_eq!(sub_path("src/a.js", "./").unwrap(), "a.js");
    assert_eq!(sub_path("a.js", "./").unwrap(), "a.js");
  }

  #[test]
  fn sub_path_rejects_foreign_root() {
    assert_eq!(
      sub_path("lib/a.js", "src/"),
      Err(ProjectionError::NotAPrefix { path: "lib/a.js".to_string(), root: "src/".to_string() })
    );
    // `srcx/` shares characters but not the directory.
    assert!(sub_path("srcx/a.js", "src").is_err());
  }

  #[test]
  fn translate_extension_only_touches_scripts() {
    assert_eq!(translate_extension("dist/a.cjs", ".mjs"), "dist/a.mjs");
    assert_eq!(translate_extension("dist/a.js", ".mjs"), "dist/a.mjs");
    assert_eq!(translate_extension("dist/data.json", ".mjs"), "dist/data.json");
    assert_eq!(translate_extension("dist/.js", ".mjs"), "dist/.js");
    assert_eq!(translate_extension("dist.v1/a", ".mjs"), "dist.v1/a");
  }

  #[test]
  fn project_path_reroots() {
    assert_eq!(project_path("src/lib/a.js", "src/", "dist/", ".mjs").unwrap(), "dist/lib/a.mjs");
    assert_eq!(project_path("./dep-1.cjs", "./", "dist/", ".mjs").unwrap(), "dist/dep-1.mjs");
  }

  #[test]
  fn relative_path_between_files() {
    assert_eq!(relative_path("dist/a.mjs", "dist/dep-1.mjs"), "./dep-1.mjs");
    assert_eq!(relative_path("dist/lib/a.mjs", "dist/b.mjs"), "../b.mjs");
    assert_eq!(relative_path("dist/a.mjs", "dist/lib/b.mjs"), "./lib/b.mjs");
    assert_eq!(relative_path("a.mjs", "vendor/x/index.mjs"), "./vendor/x/index.mjs");
    assert_eq!(relative_path("/p/dist/a.mjs", "/p/node_modules/x/i.js"), "../node_modules/x/i.js");
  }

  #[test]
  fn parent_and_join() {
    assert_eq!(parent_dir("src/a.js"), "src/");
    assert_eq!(parent_dir("a.js"), "./");
    assert_eq!(parent_dir("/a.js"), "/");
    assert_eq!(join_path("src/", "../lib/a.js"), "lib/a.js");
    assert_eq!(join_path("./", "a.js"), "a.js");
    assert_eq!(join_path("src/", "/abs/a.js"), "/abs/a.js");
  }
}
