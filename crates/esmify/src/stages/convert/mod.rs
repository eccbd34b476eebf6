pub mod directives;
pub mod fallback;
pub mod shapes;
pub mod specifiers;
pub mod structural;

use esmify_common::{
  ConvertStatus, Diagnostic, DiagnosticKind, ExportedName, ModuleIdx, ModuleKind, ModuleReport,
  Replacement,
};
use esmify_ecmascript::EcmaCompiler;
use esmify_error::{BuildResult, ProjectionError};
use esmify_fs::{FileSystem, OsFileSystem, OxcResolverFileSystem};
use rustc_hash::FxHashMap;

use self::{
  directives::DirectiveProcessor,
  specifiers::SpecifierResolver,
  structural::RewriteOutcome,
};
use crate::{
  graph::{ModuleGraph, ModuleSeed},
  types::{SharedOptions, SharedResolver},
  utils::header::insert_header,
};

#[derive(Debug)]
pub struct ConvertStageOutput {
  pub graph: ModuleGraph,
  /// One per module, in discovery order.
  pub reports: Vec<ModuleReport>,
}

pub struct ConvertStage {
  fs: OsFileSystem,
  options: SharedOptions,
  directives: DirectiveProcessor,
  specifiers: SpecifierResolver,
}

struct RewriteReturn {
  text: String,
  exported_names: Vec<ExportedName>,
  status: ConvertStatus,
}

fn projection_diagnostic(err: &ProjectionError) -> Diagnostic {
  Diagnostic::new(DiagnosticKind::Projection, format!("{err}, the path was kept as is"))
}

fn apply_replacements(text: String, replacements: &[Replacement]) -> String {
  replacements.iter().fold(text, |text, replacement| replacement.apply(&text).into_owned())
}

impl ConvertStage {
  pub fn new(fs: OsFileSystem, options: SharedOptions, resolver: SharedResolver) -> BuildResult<Self> {
    let directives = DirectiveProcessor::new(&options.target).map_err(anyhow::Error::from)?;
    let specifiers = SpecifierResolver::new(options.clone(), resolver);
    Ok(Self { fs, options, directives, specifiers })
  }

  /// Converts every seed, then every module discovered while doing so, until the graph stops
  /// growing.
  pub fn convert(&self) -> BuildResult<ConvertStageOutput> {
    let mut graph =
      ModuleGraph::new(self.options.output_extension.as_str(), self.options.entry_point.clone());
    let mut pending_diagnostics: FxHashMap<ModuleIdx, Vec<Diagnostic>> = FxHashMap::default();

    let mut errors = vec![];
    for item in &self.options.input {
      let path = item.working_dir.join(&item.source);
      if !self.fs.is_file(&path) {
        errors.push(anyhow::anyhow!("Cannot find input file `{}`", path.display()));
        continue;
      }
      let seed = ModuleSeed {
        source_path: &item.source,
        root_dir: &item.root_dir,
        output_dir: &item.output_dir,
        working_dir: &item.working_dir,
        not_on_disk: false,
      };
      let ret = graph.add_module(seed, None);
      if let Some(err) = ret.projection_error {
        pending_diagnostics.entry(ret.idx).or_default().push(projection_diagnostic(&err));
      }
    }
    if !errors.is_empty() {
      Err(errors)?;
    }

    let mut reports = Vec::with_capacity(graph.len());
    let mut next = 0;
    while next < graph.len() {
      let idx = ModuleIdx::from_usize(next);
      let diagnostics = pending_diagnostics.remove(&idx).unwrap_or_default();
      reports.push(self.convert_module(&mut graph, idx, diagnostics, &mut pending_diagnostics));
      next += 1;
    }

    Ok(ConvertStageOutput { graph, reports })
  }

  fn convert_module(
    &self,
    graph: &mut ModuleGraph,
    idx: ModuleIdx,
    mut diagnostics: Vec<Diagnostic>,
    pending_diagnostics: &mut FxHashMap<ModuleIdx, Vec<Diagnostic>>,
  ) -> ModuleReport {
    let module = &graph.modules[idx];
    let source_path = module.source_path.clone();
    let target_path = module.target_path.clone();
    let kind = module.kind;
    tracing::debug!("Converting `{source_path}`");

    let report = |text: String, status: ConvertStatus, diagnostics: Vec<Diagnostic>| {
      for diagnostic in &diagnostics {
        tracing::warn!("{source_path}: {diagnostic}");
      }
      ModuleReport {
        source_path: source_path.clone(),
        target_path: target_path.clone(),
        converted_text: text,
        status,
        diagnostics,
      }
    };

    let source = match self.fs.read_to_string(&module.absolute_source_path()) {
      Ok(source) => source,
      Err(err) => {
        diagnostics.push(Diagnostic::new(
          DiagnosticKind::ConversionFailure,
          format!("Cannot read `{source_path}`: {err}"),
        ));
        return report(String::new(), ConvertStatus::Failed, diagnostics);
      }
    };

    if kind == ModuleKind::Json {
      let status = match serde_json::from_str::<serde_json::Value>(&source) {
        Ok(_) => ConvertStatus::Converted,
        Err(err) => {
          diagnostics
            .push(Diagnostic::new(DiagnosticKind::ConversionFailure, format!("Invalid JSON: {err}")));
          ConvertStatus::Failed
        }
      };
      graph.modules[idx].converted_text = Some(source.clone());
      return report(source, status, diagnostics);
    }

    let text = apply_replacements(source, &self.options.pre_replacements);
    let directives = self.directives.process(&text);
    let rewritten = rewrite(&directives.text, &mut diagnostics);

    let specifiers = self.specifiers.rewrite(&rewritten.text, graph, idx);
    diagnostics.extend(specifiers.diagnostics);
    for (dependency, err) in specifiers.projection_errors {
      pending_diagnostics.entry(dependency).or_default().push(projection_diagnostic(&err));
    }

    let text = directives.restore(&specifiers.text);
    let text = apply_replacements(text, &self.options.post_replacements);
    let text = if self.options.no_header { text } else { insert_header(&text, &source_path) };

    let module = &mut graph.modules[idx];
    module.converted_text = Some(text.clone());
    module.exported_names = rewritten.exported_names;
    report(text, rewritten.status, diagnostics)
  }
}

/// Structural rewrite, or the pattern-based one when the source or the structural output
/// doesn't parse.
fn rewrite(text: &str, diagnostics: &mut Vec<Diagnostic>) -> RewriteReturn {
  let reason = match structural::rewrite(text) {
    RewriteOutcome::Converted(output) => match EcmaCompiler::validate(&output.text) {
      Ok(()) => {
        diagnostics.extend(output.diagnostics);
        return RewriteReturn {
          text: output.text,
          exported_names: output.exported_names,
          status: ConvertStatus::Converted,
        };
      }
      Err(errors) => {
        let first = errors.first().map(ToString::to_string).unwrap_or_default();
        format!("rewritten text does not parse: {first}")
      }
    },
    RewriteOutcome::NeedsFallback(reason) => reason,
  };
  tracing::debug!("Falling back to pattern conversion: {reason}");
  diagnostics.push(Diagnostic::new(DiagnosticKind::ParseFailure, reason));

  let output = fallback::rewrite(text);
  diagnostics.extend(output.diagnostics);
  let status = match EcmaCompiler::validate(&output.text) {
    Ok(()) => ConvertStatus::ConvertedWithFallback,
    Err(errors) => {
      let first = errors.first().map(ToString::to_string).unwrap_or_default();
      diagnostics.push(Diagnostic::new(
        DiagnosticKind::ConversionFailure,
        format!("converted text does not parse: {first}"),
      ));
      ConvertStatus::Failed
    }
  };
  RewriteReturn { text: output.text, exported_names: output.exported_names, status }
}
