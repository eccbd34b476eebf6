use std::{borrow::Cow, ffi::OsStr, path::Path};

use sugar_path::SugarPath;

pub trait PathExt {
  /// Forward-slash form of the path, replacing invalid utf8 lossily.
  fn to_slash_string(&self) -> String;

  fn representative_file_name(&self) -> Cow<str>;
}

impl PathExt for Path {
  fn to_slash_string(&self) -> String {
    self.to_slash_lossy().into_owned()
  }

  /// It doesn't ensure the file name is a valid identifier in JS.
  fn representative_file_name(&self) -> Cow<str> {
    let file_name =
      self.file_stem().map_or_else(|| self.to_string_lossy(), |stem| stem.to_string_lossy());

    match &*file_name {
      // Node.js uses `index` as the file behind a directory import.
      "index" => self
        .parent()
        .and_then(Self::file_stem)
        .map(OsStr::to_string_lossy)
        .map_or(file_name, |parent_dir_name| parent_dir_name),
      _ => file_name,
    }
  }
}

#[test]
fn test_representative_file_name() {
  let cwd = Path::new(".").join("project");
  let path = cwd.join("src").join("vue.js");
  assert_eq!(path.representative_file_name(), "vue");

  let path = cwd.join("vue").join("index.js");
  assert_eq!(path.representative_file_name(), "vue");

  assert_eq!(Path::new("./dep-1.cjs").representative_file_name(), "dep-1");
}
