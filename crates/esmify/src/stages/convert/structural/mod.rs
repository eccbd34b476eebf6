//! Parse-tree driven rewrite of `require` calls and exports-object assignments.
//!
//! The tree is only read. Every change is collected as an offset edit against the source and
//! applied once at the end, so comments and formatting outside the edited ranges survive as is.

mod exports;
mod facts;
mod sites;

use esmify_common::{Diagnostic, DiagnosticKind, ExportedName, ExtractedSite, ImportBinding};
use esmify_ecmascript::EcmaCompiler;
use esmify_utils::indexmap::FxIndexSet;
use oxc::{allocator::Allocator, ast::ast, semantic::SemanticBuilder, span::Span};
use rustc_hash::{FxHashMap, FxHashSet};

use self::facts::{FactCollector, Facts};
use super::shapes::{dirname_shim, render_export_list, render_import, render_synthesized_default};
use crate::utils::text_edits::{TextEdits, expand_to_line};

#[derive(Debug)]
pub enum RewriteOutcome {
  Converted(StructuralOutput),
  NeedsFallback(String),
}

#[derive(Debug, Default)]
pub struct StructuralOutput {
  pub text: String,
  pub exported_names: Vec<ExportedName>,
  pub diagnostics: Vec<Diagnostic>,
}

/// How the legacy text of a site is taken out once its import is hoisted.
#[derive(Debug, Clone, Copy)]
enum Excision {
  /// The whole statement goes.
  Statement(Span),
  /// One declarator of a top-level declaration goes.
  Declarator { statement: usize, declarator: usize },
  /// `x = require(...)` goes, and so does the bare `let x;` it assigns.
  Assignment { statement: Span, declarator: (usize, usize) },
  /// The call is replaced by the hoisted binding.
  Inline,
}

#[derive(Debug)]
struct PendingSite {
  site: ExtractedSite,
  excision: Excision,
  import: String,
}

pub fn rewrite(source: &str) -> RewriteOutcome {
  let allocator = Allocator::default();
  let program = match EcmaCompiler::parse_commonjs(&allocator, source) {
    Ok(program) => program,
    Err(errors) => {
      let reason = errors.first().map_or_else(|| "unknown".to_string(), ToString::to_string);
      return RewriteOutcome::NeedsFallback(reason);
    }
  };
  let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
  let facts = FactCollector::collect(&scoping, &program);

  let mut rewriter = StructuralRewriter {
    source,
    program: &program,
    scoping: &scoping,
    facts,
    sites: Vec::new(),
    consumed: FxHashSet::default(),
    inline_bindings: FxHashMap::default(),
    edits: TextEdits::new(),
    diagnostics: Vec::new(),
    exported_names: Vec::new(),
    export_list: Vec::new(),
    read_replacements: FxHashMap::default(),
    has_default_export: false,
  };
  rewriter.collect_top_level_sites();
  rewriter.collect_inline_sites();
  rewriter.convert_exports();
  rewriter.report_leftovers();
  RewriteOutcome::Converted(rewriter.finish())
}

struct StructuralRewriter<'me, 'a> {
  source: &'me str,
  program: &'me ast::Program<'a>,
  scoping: &'me oxc::semantic::Scoping,
  facts: Facts,
  sites: Vec<PendingSite>,
  /// Spans of `require` calls and exports references already taken care of.
  consumed: FxHashSet<Span>,
  inline_bindings: FxHashMap<String, String>,
  edits: TextEdits,
  diagnostics: Vec<Diagnostic>,
  exported_names: Vec<ExportedName>,
  export_list: Vec<ExportedName>,
  /// `N` of `exports.N` reads, to the local now holding it.
  read_replacements: FxHashMap<String, String>,
  has_default_export: bool,
}

impl StructuralRewriter<'_, '_> {
  fn line_of(&self, offset: u32) -> usize {
    memchr::memchr_iter(b'\n', &self.source.as_bytes()[..offset as usize]).count() + 1
  }

  fn diagnose(&mut self, kind: DiagnosticKind, offset: u32, message: impl AsRef<str>) {
    let message = format!("{} (line {})", message.as_ref(), self.line_of(offset));
    self.diagnostics.push(Diagnostic::new(kind, message));
  }

  /// Validates the import of `site` on its own. A site whose import doesn't parse is left as is.
  fn push_site(&mut self, site: ExtractedSite, call_span: Span, excision: Excision) -> bool {
    self.consumed.insert(call_span);
    let import = render_import(&site.binding, &site.require_path);
    if let Err(errors) = EcmaCompiler::validate(&import) {
      let reason = errors.first().map_or_else(String::new, ToString::to_string);
      self.diagnose(
        DiagnosticKind::SiteValidation,
        site.start,
        format!("`{}` was left as is: {reason}", site.text),
      );
      return false;
    }
    self.sites.push(PendingSite { site, excision, import });
    true
  }

  fn report_leftovers(&mut self) {
    let require_uses = std::mem::take(&mut self.facts.require_uses);
    for span in require_uses {
      self.diagnose(DiagnosticKind::Unsupported, span.start, "`require` used as a value");
    }
    let references = self
      .facts
      .exports_references
      .iter()
      .filter(|reference| !self.consumed.contains(&reference.span))
      .map(|reference| (reference.span, reference.is_write))
      .collect::<Vec<_>>();
    for (span, is_write) in references {
      let text = span.source_text(self.source).to_string();
      let message = if is_write {
        format!("assignment to `{text}` was not converted")
      } else {
        format!("`{text}` can't be expressed with static exports")
      };
      self.diagnose(DiagnosticKind::Unsupported, span.start, message);
    }
  }

  /// Removes the declarators left without a binding, a whole declaration when none is left.
  fn excise_declarators(&mut self, removed: &FxHashMap<usize, Vec<usize>>) {
    let program = self.program;
    for (&statement, declarators) in removed {
      let ast::Statement::VariableDeclaration(decl) = &program.body[statement] else {
        continue;
      };
      let spans = decl.declarations.iter().map(|declarator| declarator.span).collect::<Vec<_>>();
      let is_removed = |idx: usize| declarators.contains(&idx);
      if (0..spans.len()).all(is_removed) {
        let (start, end) = expand_to_line(self.source, decl.span.start, decl.span.end);
        self.edits.remove(start, end);
        continue;
      }
      let trailing = (0..spans.len()).rev().take_while(|idx| is_removed(*idx)).count();
      let kept_until = spans.len() - trailing;
      if trailing > 0 {
        self.edits.remove(spans[kept_until - 1].end, spans[spans.len() - 1].end);
      }
      for idx in (0..kept_until).filter(|idx| is_removed(*idx)) {
        self.edits.remove(spans[idx].start, spans[idx + 1].start);
      }
    }
  }

  fn finish(mut self) -> StructuralOutput {
    let mut removed: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    let mut sites = std::mem::take(&mut self.sites);
    sites.sort_by_key(|pending| pending.site.start);

    let mut imports = FxIndexSet::default();
    for pending in &sites {
      imports.insert(pending.import.clone());
      match pending.excision {
        Excision::Statement(span) => {
          let (start, end) = expand_to_line(self.source, span.start, span.end);
          self.edits.remove(start, end);
        }
        Excision::Declarator { statement, declarator } => {
          removed.entry(statement).or_default().push(declarator);
        }
        Excision::Assignment { statement, declarator: (decl_statement, declarator) } => {
          let (start, end) = expand_to_line(self.source, statement.start, statement.end);
          self.edits.remove(start, end);
          removed.entry(decl_statement).or_default().push(declarator);
        }
        Excision::Inline => {
          if let ImportBinding::Default(local) = &pending.site.binding {
            self.edits.replace(pending.site.start, pending.site.end, local.clone());
          }
        }
      }
    }
    self.excise_declarators(&removed);

    let program = self.program;
    for directive in &program.directives {
      if directive.directive.as_str() == "use strict" {
        let (start, end) = expand_to_line(self.source, directive.span.start, directive.span.end);
        self.edits.remove(start, end);
      }
    }

    let mut prologue = imports.into_iter().collect::<Vec<_>>();
    if self.facts.uses_dirname
      && self.scoping.get_root_binding("__dirname").is_none()
      && self.scoping.get_root_binding("__filename").is_none()
    {
      prologue.extend(dirname_shim());
    }
    if !prologue.is_empty() {
      let offset = self.program.hashbang.as_ref().map_or(0, |hashbang| {
        self.source[hashbang.span.end as usize..]
          .find('\n')
          .map_or(self.source.len(), |idx| hashbang.span.end as usize + idx + 1)
      });
      let mut text = prologue.join("\n");
      if offset == self.source.len() && !self.source.is_empty() && !self.source.ends_with('\n') {
        text.insert(0, '\n');
      }
      text.push('\n');
      self.edits.insert(offset as u32, text);
    }

    let mut epilogue = Vec::new();
    if !self.export_list.is_empty() {
      epilogue.push(render_export_list(&self.export_list));
    }
    let has_module_syntax = self.program.body.iter().any(ast::Statement::is_module_declaration);
    let has_esm_default = self
      .program
      .body
      .iter()
      .any(|stmt| matches!(stmt, ast::Statement::ExportDefaultDeclaration(_)));
    if !self.has_default_export
      && !has_esm_default
      && (!self.exported_names.is_empty() || !has_module_syntax)
    {
      epilogue.push(render_synthesized_default(&self.exported_names));
    }
    if !epilogue.is_empty() {
      let mut text = String::new();
      if !self.source.is_empty() && !self.source.ends_with('\n') {
        text.push('\n');
      }
      text.push_str(&epilogue.join("\n"));
      text.push('\n');
      self.edits.insert(self.source.len() as u32, text);
    }

    StructuralOutput {
      text: self.edits.apply(self.source),
      exported_names: self.exported_names,
      diagnostics: self.diagnostics,
    }
  }
}
