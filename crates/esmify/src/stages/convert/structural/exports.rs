use esmify_common::{DiagnosticKind, ExportedName};
use esmify_utils::concat_string;
use oxc::{
  ast::ast::{self, BindingPatternKind, Expression, Statement},
  span::{GetSpan, Span},
  syntax::operator::AssignmentOperator,
};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Excision, StructuralRewriter, facts::ExportsReference};
use crate::{stages::convert::shapes::is_declarable_name, utils::text_edits::expand_to_line};

/// Top-level declaration that `export ` can be put in front of.
struct PrefixableDeclaration {
  start: u32,
}

impl<'me, 'a> StructuralRewriter<'me, 'a> {
  fn exports_reference_at(&self, span: Span) -> Option<&ExportsReference> {
    self.facts.exports_references.iter().find(|reference| reference.span == span)
  }

  fn declarators_removed_by_sites(&self) -> FxHashSet<(usize, usize)> {
    self
      .sites
      .iter()
      .filter_map(|pending| match pending.excision {
        Excision::Declarator { statement, declarator } => Some((statement, declarator)),
        Excision::Assignment { declarator, .. } => Some(declarator),
        Excision::Statement(_) | Excision::Inline => None,
      })
      .collect()
  }

  fn prefixable_declarations(&self) -> FxHashMap<&'me str, PrefixableDeclaration> {
    let removed = self.declarators_removed_by_sites();
    let mut declarations = FxHashMap::default();
    for (statement, stmt) in self.program.body.iter().enumerate() {
      let name = match stmt {
        Statement::FunctionDeclaration(func) => func.id.as_ref().map(|id| id.name.as_str()),
        Statement::ClassDeclaration(class) => class.id.as_ref().map(|id| id.name.as_str()),
        Statement::VariableDeclaration(decl)
          if decl.declarations.len() == 1 && !removed.contains(&(statement, 0)) =>
        {
          match &decl.declarations[0].id.kind {
            BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.as_str()),
            _ => None,
          }
        }
        _ => None,
      };
      if let Some(name) = name {
        declarations.insert(name, PrefixableDeclaration { start: stmt.span().start });
      }
    }
    declarations
  }

  fn write_counts(&self) -> (FxHashMap<String, usize>, usize) {
    let mut properties: FxHashMap<String, usize> = FxHashMap::default();
    let mut module_exports = 0;
    for reference in self.facts.exports_references.iter().filter(|reference| reference.is_write) {
      if reference.is_module_exports {
        module_exports += 1;
      } else if let Some(property) = &reference.property {
        *properties.entry(property.clone()).or_default() += 1;
      }
    }
    (properties, module_exports)
  }

  pub(super) fn convert_exports(&mut self) {
    let program = self.program;
    let (property_writes, module_exports_writes) = self.write_counts();
    let mut prefixable = self.prefixable_declarations();

    for stmt in &program.body {
      let Statement::ExpressionStatement(expr_stmt) = stmt else {
        continue;
      };
      let expr = expr_stmt.expression.get_inner_expression();

      if self.is_es_module_marker(expr) {
        let (start, end) = expand_to_line(self.source, expr_stmt.span.start, expr_stmt.span.end);
        self.edits.remove(start, end);
        continue;
      }

      let Expression::AssignmentExpression(assign) = expr else {
        continue;
      };
      if assign.operator != AssignmentOperator::Assign {
        continue;
      }
      let Some(target) = assign.left.as_member_expression() else {
        continue;
      };
      let Some((target_span, is_module_exports, property)) = self
        .exports_reference_at(target.span())
        .map(|reference| (reference.span, reference.is_module_exports, reference.property.clone()))
      else {
        continue;
      };

      if is_module_exports {
        if module_exports_writes == 1 {
          self.consumed.insert(target_span);
          self.convert_module_exports(expr_stmt.span, &assign.right);
        }
        continue;
      }

      let Some(exported) = property else {
        continue;
      };
      if property_writes.get(&exported).copied() != Some(1) {
        continue;
      }

      if exported == "default" {
        self.consumed.insert(target_span);
        if self.has_default_export || module_exports_writes > 0 {
          self.diagnose(
            DiagnosticKind::Unsupported,
            expr_stmt.span.start,
            "`exports.default` next to a `module.exports` assignment",
          );
          continue;
        }
        self.edits.replace(expr_stmt.span.start, assign.right.span().start, "export default ");
        self.has_default_export = true;
        if let Some(local) = self.top_level_identifier(&assign.right) {
          self.read_replacements.insert(exported.clone(), local.to_string());
        }
        continue;
      }

      if let Some(local) = self.top_level_identifier(&assign.right) {
        self.consumed.insert(target_span);
        let (start, end) = expand_to_line(self.source, expr_stmt.span.start, expr_stmt.span.end);
        self.edits.remove(start, end);
        self.read_replacements.insert(exported.clone(), local.to_string());

        let name = ExportedName::new(local, exported.as_str());
        match prefixable.remove(local) {
          Some(declaration) if !name.is_aliased() => {
            self.edits.insert(declaration.start, "export ");
          }
          declaration => {
            if let Some(declaration) = declaration {
              prefixable.insert(local, declaration);
            }
            self.export_list.push(name.clone());
          }
        }
        self.push_exported_name(name);
      } else if self.can_declare(&exported) {
        self.consumed.insert(target_span);
        self.edits.replace(
          expr_stmt.span.start,
          assign.right.span().start,
          concat_string!("export const ", exported, " = "),
        );
        self.read_replacements.insert(exported.clone(), exported.clone());
        self.push_exported_name(ExportedName::new(exported.as_str(), exported.as_str()));
      } else {
        self.consumed.insert(target_span);
        self.diagnose(
          DiagnosticKind::Unsupported,
          expr_stmt.span.start,
          format!("`{}` collides with an existing binding", target_span.source_text(self.source)),
        );
      }
    }

    self.replace_exports_reads();
  }

  fn push_exported_name(&mut self, name: ExportedName) {
    if !self.exported_names.contains(&name) {
      self.exported_names.push(name);
    }
  }

  /// `N` can become `export const N`: a valid name that nothing else in the file refers to.
  fn can_declare(&self, name: &str) -> bool {
    is_declarable_name(name)
      && self.scoping.get_root_binding(name).is_none()
      && !self.facts.free_names.contains(name)
      && !self.inline_bindings.values().any(|local| local == name)
  }

  /// Name of `expr` when it is an identifier bound at the top level.
  fn top_level_identifier<'e>(&self, expr: &'e Expression<'a>) -> Option<&'e str> {
    let Expression::Identifier(ident) = expr.get_inner_expression() else {
      return None;
    };
    let symbol_id =
      ident.reference_id.get().and_then(|id| self.scoping.get_reference(id).symbol_id())?;
    (self.scoping.symbol_scope_id(symbol_id) == self.scoping.root_scope_id())
      .then_some(ident.name.as_str())
  }

  /// `Object.defineProperty(exports, "__esModule", { value: true })`
  fn is_es_module_marker(&mut self, expr: &Expression<'a>) -> bool {
    let Expression::CallExpression(call) = expr else {
      return false;
    };
    let Expression::StaticMemberExpression(callee) = &call.callee else {
      return false;
    };
    if callee.property.name.as_str() != "defineProperty"
      || !matches!(&callee.object, Expression::Identifier(object) if object.name.as_str() == "Object")
      || call.arguments.len() < 2
    {
      return false;
    }
    let is_marker = matches!(
      call.arguments[1].as_expression(),
      Some(Expression::StringLiteral(literal)) if literal.value.as_str() == "__esModule"
    );
    let Some(target) = call.arguments[0].as_expression() else {
      return false;
    };
    let target_span = target.span();
    let targets_exports =
      self.exports_reference_at(target_span).is_some_and(|reference| reference.property.is_none());
    if is_marker && targets_exports {
      self.consumed.insert(target_span);
      return true;
    }
    false
  }

  fn convert_module_exports(&mut self, statement: Span, value: &Expression<'a>) {
    self.edits.replace(statement.start, value.span().start, "export default ");
    self.has_default_export = true;

    let Expression::ObjectExpression(object) = value.get_inner_expression() else {
      return;
    };
    for property in &object.properties {
      let ast::ObjectPropertyKind::ObjectProperty(property) = property else {
        continue;
      };
      if property.computed || property.method || property.kind != ast::PropertyKind::Init {
        continue;
      }
      let Some(exported) = property.key.static_name() else {
        continue;
      };
      let Some(local) = self.top_level_identifier(&property.value) else {
        continue;
      };
      if exported == "default"
        || self.export_list.iter().any(|name| name.exported == exported.as_ref())
      {
        continue;
      }
      let name = ExportedName::new(local, exported.as_ref());
      self.export_list.push(name.clone());
      self.push_exported_name(name);
    }
  }

  /// `exports.N` reads of converted exports now read the local, unless a nested binding of the
  /// same name would capture it.
  fn replace_exports_reads(&mut self) {
    let mut reads = Vec::new();
    let mut shadowed = Vec::new();
    for reference in &self.facts.exports_references {
      if reference.is_write || self.consumed.contains(&reference.span) {
        continue;
      }
      let Some(local) =
        reference.property.as_ref().and_then(|name| self.read_replacements.get(name))
      else {
        continue;
      };
      let root_scope_id = self.scoping.root_scope_id();
      let captured = self
        .scoping
        .find_binding(reference.scope_id, local)
        .is_some_and(|symbol_id| self.scoping.symbol_scope_id(symbol_id) != root_scope_id);
      if captured {
        shadowed.push((reference.span, local.clone()));
      } else {
        reads.push((reference.span, local.clone()));
      }
    }
    for (span, local) in reads {
      self.consumed.insert(span);
      self.edits.replace(span.start, span.end, local);
    }
    for (span, local) in shadowed {
      self.consumed.insert(span);
      self.diagnose(
        DiagnosticKind::Unsupported,
        span.start,
        format!("`{}` is shadowed by a local `{local}`", span.source_text(self.source)),
      );
    }
  }
}
