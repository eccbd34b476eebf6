mod runtime;
mod wrap_module;

use std::{
  cmp::Reverse,
  path::{Path, PathBuf},
};

use esmify_common::{ModuleEntry, ModuleIdx};
use esmify_ecmascript::EcmaCompiler;
use esmify_error::BuildResult;
use esmify_resolver::{is_builtin_module, is_relative_specifier};
use esmify_utils::{concat_string, ecmascript::quote_string, indexmap::FxIndexMap};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use sugar_path::SugarPath;

use self::runtime::{RUNTIME, external_name, init_name};
use crate::{graph::ModuleGraph, types::SharedOptions};

/// What an import of a bundled module points at.
#[derive(Debug, Clone)]
enum ImportTarget {
  Module(ModuleIdx),
  /// A builtin, loaded once at the top of the bundle into the named binding.
  External(String),
}

/// Splices every converted module of the graph into one self-contained script.
pub struct BundleStage<'a> {
  graph: &'a ModuleGraph,
  options: &'a SharedOptions,
  by_target: FxHashMap<PathBuf, ModuleIdx>,
  by_source: FxHashMap<PathBuf, ModuleIdx>,
  externals: FxIndexMap<String, String>,
  errors: Vec<anyhow::Error>,
}

impl<'a> BundleStage<'a> {
  pub fn new(graph: &'a ModuleGraph, options: &'a SharedOptions) -> Self {
    let by_target =
      graph.modules.iter().map(|module| (module.target_absolute_path.clone(), module.idx)).collect();
    let by_source = graph
      .modules
      .iter()
      .map(|module| (module.absolute_source_path().normalize(), module.idx))
      .collect();
    Self {
      graph,
      options,
      by_target,
      by_source,
      externals: FxIndexMap::default(),
      errors: Vec::new(),
    }
  }

  /// Most referenced modules first, ties in discovery order.
  pub fn sorted_modules(&self) -> Vec<ModuleIdx> {
    self
      .graph
      .modules
      .iter()
      .sorted_by_key(|module| (Reverse(module.weight), module.idx))
      .map(|module| module.idx)
      .collect()
  }

  pub fn bundle(mut self) -> BuildResult<String> {
    if self.graph.is_empty() {
      Err(anyhow::anyhow!("There is nothing to bundle"))?;
    }
    let mut chunks = self
      .sorted_modules()
      .into_iter()
      .filter_map(|idx| self.wrap_module(idx))
      .collect::<Vec<_>>();

    if !self.errors.is_empty() {
      Err(std::mem::take(&mut self.errors))?;
    }

    if let Some(entry) = self.graph.entry_module() {
      chunks.push(format!("{}();\n", init_name(&self.graph.modules[entry].id)));
    }

    let mut code = RUNTIME.to_string();
    for (specifier, binding) in &self.externals {
      code.push_str(&concat_string!(
        "const ",
        binding,
        " = await import(",
        quote_string(specifier),
        ");\n"
      ));
    }
    code.push_str(&chunks.concat());

    let code = EcmaCompiler::print(&code)?;
    tracing::debug!("Bundled {} modules", self.graph.len());
    if self.options.minify { EcmaCompiler::minify(&code) } else { Ok(code) }
  }

  /// The module (or builtin) `specifier` imports from `importer`. Records an error when there
  /// is none.
  fn resolve_import(&mut self, importer: &ModuleEntry, specifier: &str) -> Option<ImportTarget> {
    if is_builtin_module(specifier) {
      let next_idx = self.externals.len();
      let binding = self
        .externals
        .entry(specifier.to_string())
        .or_insert_with(|| external_name(next_idx))
        .clone();
      return Some(ImportTarget::External(binding));
    }

    let resolved = if is_relative_specifier(specifier) || specifier.starts_with('/') {
      let dir = importer.target_absolute_path.parent().unwrap_or_else(|| Path::new(""));
      self.by_target.get(&dir.join(specifier).normalize()).copied()
    } else {
      self
        .graph
        .import_map
        .get(specifier)
        .and_then(|path| self.by_source.get(&self.options.cwd.join(path).normalize()))
        .copied()
    };

    if resolved.is_none() {
      self.errors.push(anyhow::anyhow!(
        "Cannot bundle `{}`: `{specifier}` is not a module of the graph",
        importer.source_path
      ));
    }
    resolved.map(ImportTarget::Module)
  }
}
