use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use oxc_resolver::{
  FsCache, NODEJS_BUILTINS, ResolveError, ResolveOptions as OxcResolverOptions, ResolverGeneric,
};

use esmify_fs::{FileSystem, OsFileSystem};

/// Node.js builtins, with or without the `node:` scheme.
pub fn is_builtin_module(specifier: &str) -> bool {
  specifier.starts_with("node:") || NODEJS_BUILTINS.contains(&specifier)
}

pub fn is_relative_specifier(specifier: &str) -> bool {
  specifier.starts_with("./")
    || specifier.starts_with("../")
    || specifier == "."
    || specifier == ".."
}

/// `@scope/pkg` of `@scope/pkg/sub/path`, `pkg` of `pkg/sub`.
pub fn package_name(specifier: &str) -> &str {
  let name_end = if specifier.starts_with('@') {
    specifier.match_indices('/').nth(1).map(|(idx, _)| idx)
  } else {
    specifier.find('/')
  };
  name_end.map_or(specifier, |idx| &specifier[..idx])
}

#[derive(Debug)]
pub struct Resolver<F: FileSystem + Default = OsFileSystem> {
  cwd: PathBuf,
  import_resolver: ResolverGeneric<FsCache<F>>,
  require_resolver: ResolverGeneric<FsCache<F>>,
}

impl<F: FileSystem + Default> Resolver<F> {
  pub fn new(cwd: PathBuf, fs: F) -> Self {
    let import_conditions = ["import", "module", "node", "default"];
    let require_conditions = ["require", "node", "default"];

    let resolve_options_with_import_conditions = OxcResolverOptions {
      condition_names: import_conditions.map(String::from).to_vec(),
      extensions: [".js", ".cjs", ".mjs", ".json"].map(String::from).to_vec(),
      main_fields: vec!["main".to_string()],
      main_files: vec!["index".to_string()],
      // The store below the working dir serves files living outside of it.
      modules: vec![
        "node_modules".to_string(),
        cwd.join("node_modules").to_string_lossy().into_owned(),
      ],
      builtin_modules: true,
      // Keep resolved paths inside the project tree.
      symlinks: false,
      ..Default::default()
    };

    let resolve_options_with_require_conditions = OxcResolverOptions {
      condition_names: require_conditions.map(String::from).to_vec(),
      ..resolve_options_with_import_conditions.clone()
    };

    let import_resolver = ResolverGeneric::new_with_cache(
      Arc::new(FsCache::new(fs)),
      resolve_options_with_import_conditions,
    );

    let require_resolver =
      import_resolver.clone_with_options(resolve_options_with_require_conditions);

    Self { cwd, import_resolver, require_resolver }
  }

  pub fn cwd(&self) -> &PathBuf {
    &self.cwd
  }
}

#[derive(Debug)]
pub struct ResolveReturn {
  /// Absolute, normalized path of the resolved file.
  pub path: PathBuf,
}

impl<F: FileSystem + Default> Resolver<F> {
  /// Resolves `specifier` from `importer_dir`, preferring the `import` entries of a package and
  /// falling back to its `require` ones.
  pub fn resolve(
    &self,
    importer_dir: &Path,
    specifier: &str,
  ) -> Result<ResolveReturn, ResolveError> {
    let dir = Some(importer_dir)
      .filter(|inner| inner.components().next().is_some())
      .unwrap_or(self.cwd.as_path());

    let resolution = self
      .import_resolver
      .resolve(dir, specifier)
      .or_else(|_| self.require_resolver.resolve(dir, specifier));

    resolution.map(|info| ResolveReturn { path: info.full_path() })
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  fn resolver(root: &Path) -> Resolver {
    Resolver::new(root.to_path_buf(), OsFileSystem)
  }

  #[test]
  fn relative_probing_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/dep.cjs", "");
    write(root, "src/dep.json", "{}");
    write(root, "src/lib/package.json", r#"{ "main": "./main" }"#);
    write(root, "src/lib/main.js", "");
    write(root, "src/util/index.cjs", "");

    let resolver = resolver(root);
    let src = root.join("src");
    assert_eq!(resolver.resolve(&src, "./dep").unwrap().path, src.join("dep.cjs"));
    assert_eq!(resolver.resolve(&src, "./dep.json").unwrap().path, src.join("dep.json"));
    assert_eq!(resolver.resolve(&src, "./lib").unwrap().path, src.join("lib/main.js"));
    assert_eq!(resolver.resolve(&src, "./util").unwrap().path, src.join("util/index.cjs"));
    assert!(resolver.resolve(&src, "./missing").is_err());
  }

  #[test]
  fn bare_specifiers() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/index.js", "");
    write(
      root,
      "node_modules/pkg/package.json",
      r#"{ "name": "pkg", "exports": { ".": { "require": "./cjs/index.js", "import": "./esm/index.mjs" } } }"#,
    );
    write(root, "node_modules/pkg/cjs/index.js", "");
    write(root, "node_modules/pkg/esm/index.mjs", "");
    write(root, "node_modules/@scope/lib/package.json", r#"{ "main": "lib/main.js" }"#);
    write(root, "node_modules/@scope/lib/lib/main.js", "");
    write(root, "node_modules/@scope/lib/extra.js", "");
    write(root, "node_modules/plain/index.js", "");

    let resolver = resolver(root);
    let src = root.join("src");

    let ret = resolver.resolve(&src, "pkg").unwrap();
    assert_eq!(ret.path, root.join("node_modules/pkg/esm/index.mjs"));

    let ret = resolver.resolve(&src, "@scope/lib").unwrap();
    assert_eq!(ret.path, root.join("node_modules/@scope/lib/lib/main.js"));

    let ret = resolver.resolve(&src, "@scope/lib/extra").unwrap();
    assert_eq!(ret.path, root.join("node_modules/@scope/lib/extra.js"));

    let ret = resolver.resolve(&src, "plain").unwrap();
    assert_eq!(ret.path, root.join("node_modules/plain/index.js"));

    assert!(resolver.resolve(&src, "nowhere").is_err());
  }

  #[test]
  fn require_entries_are_the_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "index.js", "");
    write(
      root,
      "node_modules/legacy/package.json",
      r#"{ "exports": { ".": { "require": "./index.js" } } }"#,
    );
    write(root, "node_modules/legacy/index.js", "");

    let ret = resolver(root).resolve(root, "legacy").unwrap();
    assert_eq!(ret.path, root.join("node_modules/legacy/index.js"));
  }

  #[test]
  fn working_dir_store_serves_outside_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "vendor/lib/a.js", "");
    write(root, "app/node_modules/shared/index.js", "");

    let resolver = Resolver::new(root.join("app"), OsFileSystem);
    let ret = resolver.resolve(&root.join("vendor/lib"), "shared").unwrap();
    assert_eq!(ret.path, root.join("app/node_modules/shared/index.js"));
  }

  #[test]
  fn broken_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "index.js", "");
    write(root, "node_modules/broken/package.json", "{ nope");

    assert!(resolver(root).resolve(root, "broken").is_err());
  }

  #[test]
  fn specifier_kinds() {
    assert!(is_relative_specifier("./a"));
    assert!(is_relative_specifier("../a"));
    assert!(!is_relative_specifier("a"));
    assert!(!is_relative_specifier(".a"));

    assert!(is_builtin_module("fs"));
    assert!(is_builtin_module("fs/promises"));
    assert!(is_builtin_module("node:test"));
    assert!(!is_builtin_module("lodash"));

    assert_eq!(package_name("@scope/pkg/sub/path"), "@scope/pkg");
    assert_eq!(package_name("pkg/sub"), "pkg");
    assert_eq!(package_name("pkg"), "pkg");
  }
}
