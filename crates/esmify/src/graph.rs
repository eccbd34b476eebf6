use std::path::Path;

use arcstr::ArcStr;
use esmify_common::{GraphRecord, ImportMap, ModuleEntry, ModuleIdx, ModuleKind};
use esmify_error::ProjectionError;
use esmify_utils::{
  path_projection::{join_path, normalize_path, project_path, translate_extension},
  xxhash::module_id,
};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;
use sugar_path::SugarPath;

/// Where a module comes from, and where its output goes.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSeed<'a> {
  pub source_path: &'a str,
  pub root_dir: &'a str,
  pub output_dir: &'a str,
  pub working_dir: &'a Path,
  pub not_on_disk: bool,
}

#[derive(Debug)]
pub struct AddModuleReturn {
  pub idx: ModuleIdx,
  pub is_new: bool,
  /// Set when the root dir was not a prefix of the source path and the path was kept as is.
  pub projection_error: Option<ProjectionError>,
}

/// Every module discovered during one run, in discovery order.
#[derive(Debug)]
pub struct ModuleGraph {
  pub modules: IndexVec<ModuleIdx, ModuleEntry>,
  pub import_map: ImportMap,
  visited: FxHashMap<ArcStr, ModuleIdx>,
  output_extension: String,
  entry_point: Option<String>,
}

impl ModuleGraph {
  pub fn new(output_extension: impl Into<String>, entry_point: Option<String>) -> Self {
    Self {
      modules: IndexVec::new(),
      import_map: ImportMap::default(),
      visited: FxHashMap::default(),
      output_extension: output_extension.into(),
      entry_point: entry_point.map(|entry| normalize_path(&entry)),
    }
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn get(&self, source_path: &str) -> Option<ModuleIdx> {
    self.visited.get(normalize_path(source_path).as_str()).copied()
  }

  /// Looks the module up by its normalized source path and creates it on first sight.
  pub fn add_module(&mut self, seed: ModuleSeed, referrer: Option<&ArcStr>) -> AddModuleReturn {
    let source_path = normalize_path(seed.source_path);

    if let Some(&idx) = self.visited.get(source_path.as_str()) {
      if let Some(referrer) = referrer {
        self.modules[idx].add_referrer(referrer);
      }
      return AddModuleReturn { idx, is_new: false, projection_error: None };
    }

    let (target_path, projection_error) =
      match project_path(&source_path, seed.root_dir, seed.output_dir, &self.output_extension) {
        Ok(target_path) => (target_path, None),
        Err(err) => {
          tracing::warn!("{err}, keeping the path of `{source_path}` as is");
          let target_path = translate_extension(
            &join_path(seed.output_dir, &source_path),
            &self.output_extension,
          );
          (target_path, Some(err))
        }
      };

    let source_path = ArcStr::from(source_path);
    let idx = self.modules.next_idx();
    let mut module = ModuleEntry {
      idx,
      entry_point: self.entry_point.as_deref() == Some(source_path.as_str()),
      kind: ModuleKind::from_path(&source_path),
      source_path: source_path.clone(),
      root_dir: seed.root_dir.to_string(),
      output_dir: seed.output_dir.to_string(),
      working_dir: seed.working_dir.to_path_buf(),
      target_absolute_path: seed.working_dir.join(&target_path).normalize(),
      id: module_id(&target_path),
      target_path,
      weight: 1,
      referrers: Vec::new(),
      not_on_disk: seed.not_on_disk,
      exported_names: Vec::new(),
      converted_text: None,
    };
    if let Some(referrer) = referrer {
      module.add_referrer(referrer);
    }
    tracing::debug!("Discovered `{}` -> `{}`", module.source_path, module.target_path);

    self.modules.push(module);
    self.visited.insert(source_path, idx);
    AddModuleReturn { idx, is_new: true, projection_error }
  }

  /// The designated entry module, else the first seed.
  pub fn entry_module(&self) -> Option<ModuleIdx> {
    self
      .modules
      .iter()
      .find(|module| module.entry_point)
      .map(|module| module.idx)
      .or_else(|| (!self.modules.is_empty()).then(|| ModuleIdx::from_usize(0)))
  }

  pub fn to_records(&self) -> Vec<GraphRecord> {
    self.modules.iter().map(ModuleEntry::to_graph_record).collect()
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  fn seed<'a>(source_path: &'a str, working_dir: &'a Path) -> ModuleSeed<'a> {
    ModuleSeed { source_path, root_dir: "src/", output_dir: "dist/", working_dir, not_on_disk: false }
  }

  #[test]
  fn shared_dependency_is_one_entry() {
    let cwd = PathBuf::from("/project");
    let mut graph = ModuleGraph::new(".mjs", None);
    let a = graph.add_module(seed("src/a.js", &cwd), None).idx;
    let b = graph.add_module(seed("./src/b.js", &cwd), None).idx;
    let a_path = graph.modules[a].source_path.clone();
    let b_path = graph.modules[b].source_path.clone();

    let first = graph.add_module(seed("src/c.cjs", &cwd), Some(&a_path));
    let second = graph.add_module(seed("src/lib/../c.cjs", &cwd), Some(&b_path));
    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.idx, second.idx);
    assert_eq!(graph.len(), 3);

    let c = &graph.modules[first.idx];
    assert_eq!(c.weight, 3);
    assert_eq!(c.referrers, vec![a_path.clone(), b_path]);
    assert_eq!(c.target_path, "dist/c.mjs");
    assert_eq!(c.target_absolute_path, PathBuf::from("/project/dist/c.mjs"));

    // A repeated referrer changes nothing.
    graph.add_module(seed("src/c.cjs", &cwd), Some(&a_path));
    assert_eq!(graph.modules[first.idx].weight, 3);
  }

  #[test]
  fn projection_failure_keeps_the_path() {
    let cwd = PathBuf::from("/project");
    let mut graph = ModuleGraph::new(".mjs", None);
    let ret = graph.add_module(seed("shared/x.js", &cwd), None);
    assert!(ret.projection_error.is_some());
    assert_eq!(graph.modules[ret.idx].target_path, "dist/shared/x.mjs");
  }

  #[test]
  fn ids_are_stable_and_entry_is_marked() {
    let cwd = PathBuf::from("/project");
    let mut graph = ModuleGraph::new(".mjs", Some("./src/main.js".to_string()));
    let a = graph.add_module(seed("src/a.js", &cwd), None).idx;
    let main = graph.add_module(seed("src/main.js", &cwd), None).idx;
    assert_eq!(graph.entry_module(), Some(main));
    assert_eq!(graph.modules[a].id, module_id("dist/a.mjs"));

    let mut fresh = ModuleGraph::new(".mjs", None);
    assert!(fresh.is_empty());
    assert_eq!(fresh.get("src/a.js"), None);
    let again = fresh.add_module(seed("src/a.js", &cwd), None).idx;
    assert_eq!(fresh.modules[again].id, module_id("dist/a.mjs"));
    assert_eq!(fresh.entry_module(), Some(again));
  }
}
