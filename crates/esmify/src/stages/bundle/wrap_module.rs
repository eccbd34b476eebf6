use esmify_common::{ModuleIdx, ModuleKind};
use esmify_ecmascript::EcmaCompiler;
use esmify_utils::{
  concat_string,
  ecmascript::{property_access_str, to_module_import_export_name},
};
use itertools::Itertools;
use oxc::{
  allocator::Allocator,
  ast::ast::{
    BindingPattern, BindingPatternKind, CallExpression, Declaration, ExportAllDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, Expression, IdentifierReference,
    ImportDeclaration, ImportDeclarationSpecifier, ImportExpression, ObjectProperty, Statement,
  },
  ast_visit::{Visit, walk},
  semantic::{Scoping, SemanticBuilder, SymbolId},
  span::{GetSpan, Span},
};
use rustc_hash::FxHashMap;

use super::{
  BundleStage, ImportTarget,
  runtime::{init_name, namespace_name},
};
use crate::utils::text_edits::TextEdits;

const DEFAULT_BINDING: &str = "__esmify_default";

#[derive(Default)]
struct DynamicImportCollector {
  imports: Vec<(Span, String)>,
}

impl<'a> Visit<'a> for DynamicImportCollector {
  fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
    if let Expression::StringLiteral(literal) = &expr.source {
      self.imports.push((expr.span, literal.value.to_string()));
    }
    walk::walk_import_expression(self, expr);
  }
}

/// Turns every read of an imported binding into a read of the namespace property behind it, so
/// the value is looked up when the code runs rather than when the module is initialized.
struct ImportReferenceRewriter<'me> {
  scoping: &'me Scoping,
  accesses: &'me FxHashMap<SymbolId, String>,
  edits: &'me mut TextEdits,
}

impl ImportReferenceRewriter<'_> {
  fn access(&self, ident: &IdentifierReference) -> Option<&String> {
    let symbol_id =
      ident.reference_id.get().and_then(|id| self.scoping.get_reference(id).symbol_id())?;
    self.accesses.get(&symbol_id)
  }
}

impl<'a> Visit<'a> for ImportReferenceRewriter<'_> {
  fn visit_import_declaration(&mut self, _decl: &ImportDeclaration<'a>) {}

  fn visit_export_all_declaration(&mut self, _decl: &ExportAllDeclaration<'a>) {}

  // Specifier lists are removed whole and their getters are mapped separately.
  fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
    if let Some(declaration) = &decl.declaration {
      self.visit_declaration(declaration);
    }
  }

  fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
    if !matches!(expr.source, Expression::StringLiteral(_)) {
      walk::walk_import_expression(self, expr);
    }
  }

  fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
    if let Some(access) = self.access(ident) {
      let access = access.clone();
      self.edits.replace(ident.span.start, ident.span.end, access);
    }
  }

  fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
    if prop.shorthand {
      if let Expression::Identifier(ident) = &prop.value {
        if let Some(access) = self.access(ident) {
          let content = concat_string!(ident.name.as_str(), ": ", access);
          self.edits.replace(prop.span.start, prop.span.end, content);
          return;
        }
      }
    }
    walk::walk_object_property(self, prop);
  }

  // An imported function is called without the namespace as `this`.
  fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
    if let Expression::Identifier(ident) = &call.callee {
      if let Some(access) = self.access(ident) {
        let content = concat_string!("(0, ", access, ")");
        self.edits.replace(ident.span.start, ident.span.end, content);
        call.arguments.iter().for_each(|argument| self.visit_argument(argument));
        return;
      }
    }
    walk::walk_call_expression(self, call);
  }
}

fn collect_binding_names(pattern: &BindingPattern, names: &mut Vec<String>) {
  match &pattern.kind {
    BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
    BindingPatternKind::ObjectPattern(object) => {
      for property in &object.properties {
        collect_binding_names(&property.value, names);
      }
      if let Some(rest) = &object.rest {
        collect_binding_names(&rest.argument, names);
      }
    }
    BindingPatternKind::ArrayPattern(array) => {
      for element in array.elements.iter().flatten() {
        collect_binding_names(element, names);
      }
      if let Some(rest) = &array.rest {
        collect_binding_names(&rest.argument, names);
      }
    }
    BindingPatternKind::AssignmentPattern(assignment) => {
      collect_binding_names(&assignment.left, names);
    }
  }
}

fn declared_names(declaration: &Declaration) -> Vec<String> {
  let mut names = Vec::new();
  match declaration {
    Declaration::VariableDeclaration(decl) => {
      for declarator in &decl.declarations {
        collect_binding_names(&declarator.id, &mut names);
      }
    }
    Declaration::FunctionDeclaration(func) => {
      names.extend(func.id.as_ref().map(|id| id.name.to_string()));
    }
    Declaration::ClassDeclaration(class) => {
      names.extend(class.id.as_ref().map(|id| id.name.to_string()));
    }
    _ => {}
  }
  names
}

/// The body of one module, turned into statements of its init function.
#[derive(Default)]
struct WrappedModule {
  edits: TextEdits,
  /// Init calls of the dependencies, in source order.
  hoisted: Vec<String>,
  /// Imported binding to the namespace property it reads.
  import_accesses: FxHashMap<SymbolId, String>,
  import_accesses_by_name: FxHashMap<String, String>,
  /// `(exported, expression)` of the namespace getters.
  getters: Vec<(String, String)>,
}

impl BundleStage<'_> {
  fn namespace(&self, target: &ImportTarget) -> String {
    match target {
      ImportTarget::Module(idx) => namespace_name(&self.graph.modules[*idx].id),
      ImportTarget::External(binding) => binding.clone(),
    }
  }

  /// `init_<id>();` for an in-graph target.
  fn init_call(&self, target: &ImportTarget) -> Option<String> {
    match target {
      ImportTarget::Module(idx) => {
        Some(concat_string!(init_name(&self.graph.modules[*idx].id), "();"))
      }
      ImportTarget::External(_) => None,
    }
  }

  pub(super) fn wrap_module(&mut self, idx: ModuleIdx) -> Option<String> {
    let graph = self.graph;
    let module = &graph.modules[idx];
    let namespace = namespace_name(&module.id);
    let init = init_name(&module.id);

    let Some(text) = module.converted_text.as_deref() else {
      self
        .errors
        .push(anyhow::anyhow!("Cannot bundle `{}`: it was not converted", module.source_path));
      return None;
    };

    if module.kind == ModuleKind::Json {
      return Some(concat_string!(
        "var ",
        namespace,
        " = { default: ",
        text.trim(),
        " };\nvar ",
        init,
        " = () => {};\n"
      ));
    }

    let allocator = Allocator::default();
    let program = match EcmaCompiler::parse_module(&allocator, text) {
      Ok(program) => program,
      Err(errors) => {
        let first = errors.first().map(ToString::to_string).unwrap_or_default();
        self.errors.push(anyhow::anyhow!("Cannot bundle `{}`: {first}", module.source_path));
        return None;
      }
    };

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let mut wrapped = WrappedModule::default();
    if let Some(hashbang) = &program.hashbang {
      wrapped.edits.remove(hashbang.span.start, hashbang.span.end);
    }

    for stmt in &program.body {
      match stmt {
        Statement::ImportDeclaration(decl) => {
          wrapped.edits.remove(decl.span.start, decl.span.end);
          let Some(target) = self.resolve_import(module, &decl.source.value) else {
            continue;
          };
          wrapped.hoisted.extend(self.init_call(&target));
          let source = self.namespace(&target);
          for specifier in decl.specifiers.iter().flatten() {
            let (local, value) = match specifier {
              ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                (&spec.local, property_access_str(&source, "default"))
              }
              ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                (&spec.local, source.clone())
              }
              ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                (&spec.local, property_access_str(&source, &spec.imported.name()))
              }
            };
            if let Some(symbol_id) = local.symbol_id.get() {
              wrapped.import_accesses.insert(symbol_id, value.clone());
            }
            wrapped.import_accesses_by_name.insert(local.name.to_string(), value);
          }
        }
        Statement::ExportNamedDeclaration(decl) => {
          if let Some(declaration) = &decl.declaration {
            wrapped.edits.remove(decl.span.start, declaration.span().start);
            wrapped
              .getters
              .extend(declared_names(declaration).into_iter().map(|name| (name.clone(), name)));
            continue;
          }

          wrapped.edits.remove(decl.span.start, decl.span.end);
          match &decl.source {
            Some(source) => {
              let Some(target) = self.resolve_import(module, &source.value) else {
                continue;
              };
              wrapped.hoisted.extend(self.init_call(&target));
              let source = self.namespace(&target);
              for specifier in &decl.specifiers {
                let value = property_access_str(&source, &specifier.local.name());
                wrapped.getters.push((specifier.exported.name().to_string(), value));
              }
            }
            None => {
              for specifier in &decl.specifiers {
                let local = specifier.local.name();
                let value = wrapped
                  .import_accesses_by_name
                  .get(local.as_str())
                  .cloned()
                  .unwrap_or_else(|| local.to_string());
                wrapped.getters.push((specifier.exported.name().to_string(), value));
              }
            }
          }
        }
        Statement::ExportAllDeclaration(decl) => {
          wrapped.edits.remove(decl.span.start, decl.span.end);
          let Some(target) = self.resolve_import(module, &decl.source.value) else {
            continue;
          };
          wrapped.hoisted.extend(self.init_call(&target));
          let source = self.namespace(&target);
          match &decl.exported {
            Some(exported) => wrapped.getters.push((exported.name().to_string(), source)),
            None => wrapped
              .hoisted
              .push(concat_string!("__esmify_reexport(", namespace, ", ", source, ");")),
          }
        }
        Statement::ExportDefaultDeclaration(decl) => {
          let inner = decl.declaration.span();
          let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
              func.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
              class.id.as_ref().map(|id| id.name.to_string())
            }
            _ => None,
          };
          if let Some(name) = named {
            wrapped.edits.remove(decl.span.start, inner.start);
            wrapped.getters.push(("default".to_string(), name));
            continue;
          }
          wrapped.edits.replace(
            decl.span.start,
            inner.start,
            concat_string!("var ", DEFAULT_BINDING, " = "),
          );
          if matches!(
            decl.declaration,
            ExportDefaultDeclarationKind::FunctionDeclaration(_)
              | ExportDefaultDeclarationKind::ClassDeclaration(_)
          ) {
            wrapped.edits.insert(inner.end, ";");
          }
          wrapped.getters.push(("default".to_string(), DEFAULT_BINDING.to_string()));
        }
        _ => {}
      }
    }

    ImportReferenceRewriter {
      scoping: &scoping,
      accesses: &wrapped.import_accesses,
      edits: &mut wrapped.edits,
    }
    .visit_program(&program);

    let mut dynamic_imports = DynamicImportCollector::default();
    dynamic_imports.visit_program(&program);
    for (span, specifier) in dynamic_imports.imports {
      if esmify_resolver::is_builtin_module(&specifier) {
        continue;
      }
      let Some(target @ ImportTarget::Module(dependency)) = self.resolve_import(module, &specifier)
      else {
        continue;
      };
      let dependency = &graph.modules[dependency];
      wrapped.edits.replace(
        span.start,
        span.end,
        concat_string!(
          "Promise.resolve().then(() => (",
          init_name(&dependency.id),
          "(), ",
          self.namespace(&target),
          "))"
        ),
      );
    }

    let getters = wrapped
      .getters
      .iter()
      .map(|(exported, value)| {
        concat_string!(to_module_import_export_name(exported), ": () => ", value)
      })
      .join(", ");

    let mut wrapper = concat_string!(
      "var ",
      namespace,
      " = {};\nvar ",
      init,
      " = __esmify_init(() => {\n__esmify_export(",
      namespace,
      ", { ",
      getters,
      " });\n"
    );
    for line in &wrapped.hoisted {
      wrapper.push_str(line);
      wrapper.push('\n');
    }
    wrapper.push_str(&wrapped.edits.apply(text));
    wrapper.push_str("\n});\n");
    Some(wrapper)
  }
}
