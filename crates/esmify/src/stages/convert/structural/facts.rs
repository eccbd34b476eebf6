use std::cell::Cell;

use oxc::{
  ast::ast::{self, IdentifierReference},
  ast_visit::{Visit, walk},
  semantic::{ScopeFlags, ScopeId, Scoping},
  span::{GetSpan, Span},
};
use rustc_hash::FxHashSet;

use esmify_ecmascript::{CallExpressionExt, ExpressionExt};

/// A `require(...)` call whose callee is the free `require`.
#[derive(Debug)]
pub struct RequireCall {
  pub span: Span,
  /// Set for a single string-literal argument.
  pub specifier: Option<String>,
}

/// A use of the free `exports`/`module` objects.
#[derive(Debug)]
pub struct ExportsReference {
  pub span: Span,
  /// `N` of `exports.N` and `module.exports.N`.
  pub property: Option<String>,
  /// `module.exports` itself.
  pub is_module_exports: bool,
  pub is_write: bool,
  /// Scope the reference sits in.
  pub scope_id: ScopeId,
}

/// Everything the rewrite decisions need from one walk over the tree.
#[derive(Debug, Default)]
pub struct Facts {
  pub require_calls: Vec<RequireCall>,
  /// `require` used other than as a callee.
  pub require_uses: Vec<Span>,
  pub exports_references: Vec<ExportsReference>,
  /// Names referenced without a declaration in the file.
  pub free_names: FxHashSet<String>,
  pub uses_dirname: bool,
}

pub struct FactCollector<'me> {
  scoping: &'me Scoping,
  facts: Facts,
  writing: bool,
  scope_stack: Vec<ScopeId>,
}

impl<'me> FactCollector<'me> {
  pub fn collect(scoping: &'me Scoping, program: &ast::Program) -> Facts {
    let mut collector =
      Self { scoping, facts: Facts::default(), writing: false, scope_stack: Vec::new() };
    collector.visit_program(program);
    collector.facts
  }

  fn is_free(&self, ident: &IdentifierReference) -> bool {
    ident
      .reference_id
      .get()
      .is_none_or(|reference_id| self.scoping.get_reference(reference_id).symbol_id().is_none())
  }

  fn current_scope(&self) -> ScopeId {
    self.scope_stack.last().copied().unwrap_or_else(|| self.scoping.root_scope_id())
  }

  fn free_identifier<'a>(&self, expr: &'a ast::Expression) -> Option<&'a str> {
    let ident = expr.as_identifier()?;
    self.is_free(ident).then_some(ident.name.as_str())
  }

  fn exports_reference(&self, member: &ast::MemberExpression) -> Option<ExportsReference> {
    let object = member.object();
    let property = member.static_property_name().map(ToString::to_string);
    let is_write = self.writing;
    let scope_id = self.current_scope();
    match self.free_identifier(object) {
      Some("exports") => {
        return Some(ExportsReference {
          span: member.span(),
          property,
          is_module_exports: false,
          is_write,
          scope_id,
        });
      }
      Some("module") if property.as_deref() == Some("exports") => {
        return Some(ExportsReference {
          span: member.span(),
          property: None,
          is_module_exports: true,
          is_write,
          scope_id,
        });
      }
      _ => {}
    }
    if let ast::Expression::StaticMemberExpression(inner) = object {
      if inner.property.name.as_str() == "exports"
        && self.free_identifier(&inner.object) == Some("module")
      {
        return Some(ExportsReference {
          span: member.span(),
          property,
          is_module_exports: false,
          is_write,
          scope_id,
        });
      }
    }
    None
  }
}

impl<'a> Visit<'a> for FactCollector<'_> {
  fn enter_scope(&mut self, _flags: ScopeFlags, scope_id: &Cell<Option<ScopeId>>) {
    let scope_id = scope_id.get().unwrap_or_else(|| self.current_scope());
    self.scope_stack.push(scope_id);
  }

  fn leave_scope(&mut self) {
    self.scope_stack.pop();
  }

  fn visit_call_expression(&mut self, it: &ast::CallExpression<'a>) {
    if it.is_require_call() && it.callee.as_identifier().is_some_and(|ident| self.is_free(ident)) {
      self.facts.require_calls.push(RequireCall {
        span: it.span,
        specifier: it.require_specifier().map(|literal| literal.value.to_string()),
      });
      for argument in &it.arguments {
        self.visit_argument(argument);
      }
      return;
    }
    walk::walk_call_expression(self, it);
  }

  fn visit_member_expression(&mut self, it: &ast::MemberExpression<'a>) {
    let Some(reference) = self.exports_reference(it) else {
      walk::walk_member_expression(self, it);
      return;
    };
    self.facts.exports_references.push(reference);
    if let ast::MemberExpression::ComputedMemberExpression(computed) = it {
      let writing = std::mem::replace(&mut self.writing, false);
      self.visit_expression(&computed.expression);
      self.writing = writing;
    }
  }

  fn visit_assignment_expression(&mut self, it: &ast::AssignmentExpression<'a>) {
    self.writing = true;
    self.visit_assignment_target(&it.left);
    self.writing = false;
    self.visit_expression(&it.right);
  }

  fn visit_update_expression(&mut self, it: &ast::UpdateExpression<'a>) {
    self.writing = true;
    self.visit_simple_assignment_target(&it.argument);
    self.writing = false;
  }

  fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
    if !self.is_free(it) {
      return;
    }
    match it.name.as_str() {
      "require" => self.facts.require_uses.push(it.span),
      "exports" | "module" => self.facts.exports_references.push(ExportsReference {
        span: it.span,
        property: None,
        is_module_exports: false,
        is_write: self.writing,
        scope_id: self.current_scope(),
      }),
      "__dirname" | "__filename" => self.facts.uses_dirname = true,
      _ => {}
    }
    self.facts.free_names.insert(it.name.to_string());
  }
}
