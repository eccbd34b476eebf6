use std::path::Path;

use esmify_common::{DiagnosticKind, ExtractedSite, ImportBinding, NamedBinding};
use esmify_utils::{concat_string, ecmascript::legitimize_identifier_name, path_ext::PathExt};
use oxc::{
  ast::ast::{self, BindingPatternKind, Expression, Statement},
  span::Span,
  syntax::operator::AssignmentOperator,
};
use rustc_hash::FxHashMap;

use super::{Excision, StructuralRewriter};
use crate::stages::convert::shapes::{BINDING_PREFIX, is_json_specifier};

impl<'me, 'a> StructuralRewriter<'me, 'a> {
  /// Specifier of the literal `require` call spanning exactly `span`.
  fn require_at(&self, span: Span) -> Option<String> {
    self
      .facts
      .require_calls
      .iter()
      .find(|call| call.span == span)
      .and_then(|call| call.specifier.clone())
  }

  fn literal_require(&self, expr: &Expression<'a>) -> Option<(Span, String)> {
    let Expression::CallExpression(call) = expr.get_inner_expression() else {
      return None;
    };
    self.require_at(call.span).map(|specifier| (call.span, specifier))
  }

  fn write_count(&self, ident: &ast::BindingIdentifier<'a>) -> usize {
    ident.symbol_id.get().map_or(usize::MAX, |symbol_id| {
      self.scoping.get_resolved_references(symbol_id).filter(|reference| reference.is_write()).count()
    })
  }

  fn is_unmutated(&self, ident: &ast::BindingIdentifier<'a>) -> bool {
    self.write_count(ident) == 0
  }

  /// The import a top-level declarator turns into, with the call it consumes.
  fn declarator_import(
    &self,
    declarator: &ast::VariableDeclarator<'a>,
  ) -> Option<(ImportBinding, Span, String)> {
    let init = declarator.init.as_ref()?.get_inner_expression();

    if let Some((call_span, specifier)) = self.literal_require(init) {
      let binding = match &declarator.id.kind {
        BindingPatternKind::BindingIdentifier(ident) if self.is_unmutated(ident) => {
          ImportBinding::Default(ident.name.to_string())
        }
        BindingPatternKind::ObjectPattern(pattern) if !is_json_specifier(&specifier) => {
          ImportBinding::Named(self.flat_object_pattern(pattern)?)
        }
        _ => return None,
      };
      return Some((binding, call_span, specifier));
    }

    // `const x = require("p").name`
    let Expression::StaticMemberExpression(member) = init else {
      return None;
    };
    let (call_span, specifier) = self.literal_require(&member.object)?;
    match &declarator.id.kind {
      BindingPatternKind::BindingIdentifier(ident)
        if self.is_unmutated(ident) && !is_json_specifier(&specifier) =>
      {
        let binding = NamedBinding::new(member.property.name.as_str(), ident.name.as_str());
        Some((ImportBinding::Named(vec![binding]), call_span, specifier))
      }
      _ => None,
    }
  }

  /// `{ a, b: c }` with plain, unmutated bindings only.
  fn flat_object_pattern(&self, pattern: &ast::ObjectPattern<'a>) -> Option<Vec<NamedBinding>> {
    if pattern.rest.is_some() || pattern.properties.is_empty() {
      return None;
    }
    pattern
      .properties
      .iter()
      .map(|property| {
        if property.computed {
          return None;
        }
        let imported = property.key.static_name()?;
        match &property.value.kind {
          BindingPatternKind::BindingIdentifier(ident) if self.is_unmutated(ident) => {
            Some(NamedBinding::new(imported.as_ref(), ident.name.as_str()))
          }
          _ => None,
        }
      })
      .collect()
  }

  /// Top-level `let x;` declarators, by name.
  fn bare_declarators(&self) -> FxHashMap<&'me str, (usize, usize)> {
    let mut bare = FxHashMap::default();
    for (statement, stmt) in self.program.body.iter().enumerate() {
      let Statement::VariableDeclaration(decl) = stmt else {
        continue;
      };
      for (declarator, item) in decl.declarations.iter().enumerate() {
        if let (BindingPatternKind::BindingIdentifier(ident), None) = (&item.id.kind, &item.init) {
          bare.insert(ident.name.as_str(), (statement, declarator));
        }
      }
    }
    bare
  }

  pub(super) fn collect_top_level_sites(&mut self) {
    let program = self.program;
    let bare = self.bare_declarators();

    for (statement, stmt) in program.body.iter().enumerate() {
      match stmt {
        Statement::VariableDeclaration(decl) => {
          for (declarator, item) in decl.declarations.iter().enumerate() {
            let Some((binding, call_span, specifier)) = self.declarator_import(item) else {
              continue;
            };
            let site = ExtractedSite {
              start: item.span.start,
              end: item.span.end,
              text: item.span.source_text(self.source).to_string(),
              require_path: specifier,
              declared_identifier: first_local(&binding),
              declaration_separate_from_call: false,
              binding,
            };
            self.push_site(site, call_span, Excision::Declarator { statement, declarator });
          }
        }
        Statement::ExpressionStatement(expr_stmt) => {
          let expr = expr_stmt.expression.get_inner_expression();
          if let Some((call_span, specifier)) = self.literal_require(expr) {
            let site = self.statement_site(expr_stmt.span, specifier, ImportBinding::SideEffect);
            self.push_site(site, call_span, Excision::Statement(expr_stmt.span));
            continue;
          }

          // `x = require("p")` assigning a bare `let x;`
          let Expression::AssignmentExpression(assign) = expr else {
            continue;
          };
          let ast::AssignmentTarget::AssignmentTargetIdentifier(target) = &assign.left else {
            continue;
          };
          if assign.operator != AssignmentOperator::Assign {
            continue;
          }
          let Some((call_span, specifier)) = self.literal_require(&assign.right) else {
            continue;
          };
          let Some(&declarator) = bare.get(target.name.as_str()) else {
            continue;
          };
          let single_write = target
            .reference_id
            .get()
            .and_then(|reference_id| self.scoping.get_reference(reference_id).symbol_id())
            .is_some_and(|symbol_id| {
              self.scoping.get_resolved_references(symbol_id).filter(|r| r.is_write()).count() == 1
            });
          if !single_write {
            continue;
          }
          let mut site = self.statement_site(
            expr_stmt.span,
            specifier,
            ImportBinding::Default(target.name.to_string()),
          );
          site.declared_identifier = Some(target.name.to_string());
          site.declaration_separate_from_call = true;
          self.push_site(
            site,
            call_span,
            Excision::Assignment { statement: expr_stmt.span, declarator },
          );
        }
        _ => {}
      }
    }
  }

  fn statement_site(&self, span: Span, specifier: String, binding: ImportBinding) -> ExtractedSite {
    ExtractedSite {
      start: span.start,
      end: span.end,
      text: span.source_text(self.source).to_string(),
      require_path: specifier,
      declared_identifier: None,
      declaration_separate_from_call: false,
      binding,
    }
  }

  /// Every other `require` becomes a hoisted default import, the call is replaced by its binding.
  pub(super) fn collect_inline_sites(&mut self) {
    let calls = self
      .facts
      .require_calls
      .iter()
      .filter(|call| !self.consumed.contains(&call.span))
      .map(|call| (call.span, call.specifier.clone()))
      .collect::<Vec<_>>();

    for (span, specifier) in calls {
      let Some(specifier) = specifier else {
        self.consumed.insert(span);
        self.diagnose(
          DiagnosticKind::Unsupported,
          span.start,
          format!("`{}` has no literal path", span.source_text(self.source)),
        );
        continue;
      };
      let local = self.inline_binding(&specifier);
      let site = ExtractedSite {
        start: span.start,
        end: span.end,
        text: span.source_text(self.source).to_string(),
        require_path: specifier,
        declared_identifier: Some(local.clone()),
        declaration_separate_from_call: false,
        binding: ImportBinding::Default(local),
      };
      self.push_site(site, span, Excision::Inline);
    }
  }

  /// One binding per specifier, named after the required file.
  fn inline_binding(&mut self, specifier: &str) -> String {
    if let Some(local) = self.inline_bindings.get(specifier) {
      return local.clone();
    }
    let file_name = Path::new(specifier).representative_file_name().into_owned();
    let base = concat_string!(BINDING_PREFIX, legitimize_identifier_name(&file_name));
    let mut local = base.clone();
    let mut counter = 1;
    while self.source.contains(&local)
      || self.inline_bindings.values().any(|existing| existing == &local)
    {
      local = format!("{base}${counter}");
      counter += 1;
    }
    self.inline_bindings.insert(specifier.to_string(), local.clone());
    local
  }
}

fn first_local(binding: &ImportBinding) -> Option<String> {
  match binding {
    ImportBinding::SideEffect => None,
    ImportBinding::Default(local) => Some(local.clone()),
    ImportBinding::Named(bindings) => bindings.first().map(|binding| binding.local.clone()),
  }
}
