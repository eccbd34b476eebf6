use std::path::Path;

use esmify_utils::{path_ext::PathExt, path_projection::normalize_path};
use sugar_path::SugarPath;

/// Slash form of `path`, relative to `base` when it lives below it.
pub fn stabilize_path(path: &Path, base: &Path) -> String {
  if path.is_absolute() && path.starts_with(base) {
    normalize_path(&path.relative(base).to_slash_string())
  } else {
    normalize_path(&path.to_slash_string())
  }
}

/// Normalized folder path, always ending with `/`.
pub fn as_folder(path: &str) -> String {
  let mut folder = normalize_path(path);
  if !folder.ends_with('/') {
    folder.push('/');
  }
  folder
}

#[test]
fn test_stabilize_path() {
  let base = Path::new("/project");
  assert_eq!(stabilize_path(Path::new("/project/src/a.js"), base), "src/a.js");
  assert_eq!(stabilize_path(Path::new("/elsewhere/a.js"), base), "/elsewhere/a.js");
  assert_eq!(stabilize_path(Path::new("./src/../b.js"), base), "b.js");
}

#[test]
fn test_as_folder() {
  assert_eq!(as_folder("dist"), "dist/");
  assert_eq!(as_folder("./"), "./");
  assert_eq!(as_folder(""), "./");
  assert_eq!(as_folder("out\\lib\\"), "out/lib/");
}
