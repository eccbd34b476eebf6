//! Rewrites the specifier of every static import of a converted module to the projected location
//! of the file it points at, discovering new modules on the way.

use std::{path::Path, sync::LazyLock};

use esmify_common::{Diagnostic, DiagnosticKind, ModuleIdx};
use esmify_ecmascript::EcmaCompiler;
use esmify_error::ProjectionError;
use esmify_resolver::{is_builtin_module, is_relative_specifier, package_name};
use esmify_utils::{
  concat_string,
  path_ext::PathExt,
  path_projection::{SELF_ROOT, join_path, project_path, relative_path, translate_extension},
};
use oxc::{
  allocator::Allocator,
  ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression,
    StringLiteral,
  },
  ast_visit::{Visit, walk},
};
use regex::Regex;

use super::shapes::is_json_specifier;
use crate::{
  graph::{ModuleGraph, ModuleSeed},
  types::{SharedOptions, SharedResolver},
  utils::{
    shield::{ShieldMode, shield},
    stabilize_path::stabilize_path,
    text_edits::TextEdits,
  },
};

const JSON_ATTRIBUTES: &str = r#" with { type: "json" }"#;

static IMPORT_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r#"(?m)(?:^[ \t]*(?:import|export)\b[^;'"]*?\bfrom[ \t]*|^[ \t]*import[ \t]*|(?P<dynamic>\bimport[ \t]*\([ \t]*))(?:'(?P<single>[^'\n]*)'|"(?P<double>[^"\n]*)")"#,
  )
  .unwrap()
});

static ATTRIBUTES_FOLLOW: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[ \t]*(?:with|assert)\b").unwrap());

/// A quoted module specifier inside the text.
#[derive(Debug)]
struct ImportSite {
  /// Span of the literal, quotes included.
  start: u32,
  end: u32,
  specifier: String,
  /// Static import of a json file without import attributes.
  lacks_attributes: bool,
}

#[derive(Default)]
struct ImportSiteCollector {
  sites: Vec<ImportSite>,
}

impl ImportSiteCollector {
  fn push(&mut self, literal: &StringLiteral, lacks_attributes: bool) {
    self.sites.push(ImportSite {
      start: literal.span.start,
      end: literal.span.end,
      specifier: literal.value.to_string(),
      lacks_attributes,
    });
  }
}

impl<'a> Visit<'a> for ImportSiteCollector {
  fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
    self.push(&decl.source, decl.with_clause.is_none());
  }

  fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
    if let Some(source) = &decl.source {
      self.push(source, decl.with_clause.is_none());
    }
    walk::walk_export_named_declaration(self, decl);
  }

  fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
    self.push(&decl.source, decl.with_clause.is_none());
  }

  fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
    if let Expression::StringLiteral(literal) = &expr.source {
      self.push(literal, false);
    }
    walk::walk_import_expression(self, expr);
  }
}

/// Import sites of text that doesn't parse, found by pattern over `text`.
fn collect_by_pattern(text: &str) -> Vec<ImportSite> {
  IMPORT_SPECIFIER
    .captures_iter(text)
    .filter_map(|caps| {
      let specifier = caps.name("single").or_else(|| caps.name("double"))?;
      let (start, end) = (specifier.start() - 1, specifier.end() + 1);
      Some(ImportSite {
        start: start as u32,
        end: end as u32,
        specifier: specifier.as_str().to_string(),
        lacks_attributes: caps.name("dynamic").is_none()
          && !ATTRIBUTES_FOLLOW.is_match(&text[end..]),
      })
    })
    .collect()
}

#[derive(Debug, Default)]
pub struct SpecifierOutput {
  pub text: String,
  pub diagnostics: Vec<Diagnostic>,
  /// Modules discovered with a root dir that is not a prefix of their path.
  pub projection_errors: Vec<(ModuleIdx, ProjectionError)>,
}

/// The fields of the importing module needed while its specifiers are rewritten.
struct Importer {
  source_path: arcstr::ArcStr,
  source_dir: std::path::PathBuf,
  working_dir: std::path::PathBuf,
  root_dir: String,
  output_dir: String,
  target: String,
  not_on_disk: bool,
}

pub struct SpecifierResolver {
  options: SharedOptions,
  resolver: SharedResolver,
}

impl SpecifierResolver {
  pub fn new(options: SharedOptions, resolver: SharedResolver) -> Self {
    Self { options, resolver }
  }

  pub fn rewrite(&self, text: &str, graph: &mut ModuleGraph, importer: ModuleIdx) -> SpecifierOutput {
    let module = &graph.modules[importer];
    let absolute_source_path = module.absolute_source_path();
    let importer = Importer {
      source_path: module.source_path.clone(),
      source_dir: absolute_source_path.parent().map(Path::to_path_buf).unwrap_or_default(),
      working_dir: module.working_dir.clone(),
      root_dir: module.root_dir.clone(),
      output_dir: module.output_dir.clone(),
      target: module.target_absolute_path.to_slash_string(),
      not_on_disk: module.not_on_disk,
    };

    let allocator = Allocator::default();
    let mut output = SpecifierOutput::default();
    let text = match EcmaCompiler::parse_module(&allocator, text) {
      Ok(program) => {
        let mut collector = ImportSiteCollector::default();
        collector.visit_program(&program);
        self.rewrite_sites(text, collector.sites, graph, &importer, &mut output)
      }
      Err(_) => {
        let shielded = shield(text, ShieldMode::Comments);
        let sites = collect_by_pattern(&shielded.text);
        let rewritten = self.rewrite_sites(&shielded.text, sites, graph, &importer, &mut output);
        shielded.unshield(&rewritten)
      }
    };
    output.text = text;
    output
  }

  fn rewrite_sites(
    &self,
    text: &str,
    sites: Vec<ImportSite>,
    graph: &mut ModuleGraph,
    importer: &Importer,
    output: &mut SpecifierOutput,
  ) -> String {
    let mut edits = TextEdits::new();
    for site in sites {
      let Some(specifier) = self.resolve(&site.specifier, graph, importer, output) else {
        continue;
      };
      if specifier != site.specifier {
        edits.replace(site.start + 1, site.end - 1, specifier.as_str());
      }
      if site.lacks_attributes && is_json_specifier(&specifier) {
        edits.insert(site.end, JSON_ATTRIBUTES);
      }
    }
    edits.apply(text)
  }

  /// The specifier to write in place of `specifier`, `None` to leave it alone.
  fn resolve(
    &self,
    specifier: &str,
    graph: &mut ModuleGraph,
    importer: &Importer,
    output: &mut SpecifierOutput,
  ) -> Option<String> {
    if is_builtin_module(specifier) || specifier.contains(':') {
      return None;
    }
    if is_relative_specifier(specifier) || specifier.starts_with('/') {
      self.resolve_relative(specifier, graph, importer, output)
    } else {
      self.resolve_bare(specifier, graph, importer, output)
    }
  }

  fn resolve_relative(
    &self,
    specifier: &str,
    graph: &mut ModuleGraph,
    importer: &Importer,
    output: &mut SpecifierOutput,
  ) -> Option<String> {
    let resolved = match self.resolver.resolve(&importer.source_dir, specifier) {
      Ok(resolved) => resolved,
      Err(err) => {
        output.diagnostics.push(Diagnostic::new(DiagnosticKind::Resolution, err.to_string()));
        return None;
      }
    };
    let source_path = stabilize_path(&resolved.path, &importer.working_dir);
    let seed = ModuleSeed {
      source_path: &source_path,
      root_dir: &importer.root_dir,
      output_dir: &importer.output_dir,
      working_dir: &importer.working_dir,
      not_on_disk: importer.not_on_disk,
    };
    let target = self.dependency_target(seed, graph, importer, output);
    Some(relative_path(&importer.target, &target))
  }

  fn resolve_bare(
    &self,
    specifier: &str,
    graph: &mut ModuleGraph,
    importer: &Importer,
    output: &mut SpecifierOutput,
  ) -> Option<String> {
    let name = package_name(specifier);
    let renamed = match self.options.rename.get(name) {
      Some(rename) => concat_string!(rename, &specifier[name.len()..]),
      None => specifier.to_string(),
    };
    let changed = (renamed != specifier).then(|| renamed.clone());

    let resolved = match self.resolver.resolve(&importer.source_dir, &renamed) {
      Ok(resolved) => resolved,
      Err(err) => {
        output.diagnostics.push(Diagnostic::new(DiagnosticKind::Resolution, err.to_string()));
        return changed;
      }
    };
    graph.import_map.insert(renamed.clone(), stabilize_path(&resolved.path, &self.options.cwd));

    let source_path = stabilize_path(&resolved.path, &importer.working_dir);
    let seed = ModuleSeed {
      source_path: &source_path,
      root_dir: SELF_ROOT,
      output_dir: &importer.output_dir,
      working_dir: &importer.working_dir,
      not_on_disk: self.options.import_map || importer.not_on_disk,
    };
    let target = self.dependency_target(seed, graph, importer, output);

    if self.options.import_map {
      changed
    } else {
      Some(relative_path(&importer.target, &target))
    }
  }

  /// Absolute slash path of the output of `seed`. Joins the graph when links are followed or
  /// the module is already known.
  fn dependency_target(
    &self,
    seed: ModuleSeed,
    graph: &mut ModuleGraph,
    importer: &Importer,
    output: &mut SpecifierOutput,
  ) -> String {
    if self.options.follow_links || graph.get(seed.source_path).is_some() {
      let ret = graph.add_module(seed, Some(&importer.source_path));
      if let Some(err) = ret.projection_error {
        output.projection_errors.push((ret.idx, err));
      }
      return graph.modules[ret.idx].target_absolute_path.to_slash_string();
    }

    let ext = &self.options.output_extension;
    let target = project_path(seed.source_path, seed.root_dir, seed.output_dir, ext)
      .unwrap_or_else(|_| translate_extension(&join_path(seed.output_dir, seed.source_path), ext));
    seed.working_dir.join(target).to_slash_string()
  }
}
