//! Pattern-based conversion for sources the parser rejects.
//!
//! Works on a buffer whose comments and strings are shielded, and only on column-0 statements,
//! so it can't reach into nested code. Passes run in a fixed order and never look back.
//!
//! Relative script requires are converted ahead of the export passes so that their bindings count
//! as declarations there; the other requires follow, most specific shape first. Specifiers are
//! left as written: mapping them onto converted siblings happens afterwards in `specifiers`, for
//! both rewriters alike.

use std::sync::LazyLock;

use esmify_common::{Diagnostic, DiagnosticKind, ExportedName, ImportBinding, NamedBinding};
use esmify_utils::{concat_string, indexmap::FxIndexMap};
use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

use super::shapes::{
  dirname_shim, is_declarable_name, is_json_specifier, render_export_list, render_import,
  render_synthesized_default,
};
use crate::utils::shield::{ShieldMode, shield, unshield};

static REQUIRE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)[ \t]*=[ \t]*require\([ \t]*@@esm-s(\d+)@@[ \t]*\)[ \t]*(?:;|$)",
  )
  .unwrap()
});

static REQUIRE_MEMBER_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)[ \t]*=[ \t]*require\([ \t]*@@esm-s(\d+)@@[ \t]*\)\.([A-Za-z_$][\w$]*)[ \t]*(?:;|$)",
  )
  .unwrap()
});

static REQUIRE_DESTRUCTURING: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^(?:const|let|var)[ \t]*\{([^{}]*)\}[ \t]*=[ \t]*require\([ \t]*@@esm-s(\d+)@@[ \t]*\)[ \t]*(?:;|$)",
  )
  .unwrap()
});

static REQUIRE_SIDE_EFFECT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^require\([ \t]*@@esm-s(\d+)@@[ \t]*\)[ \t]*(?:;|$)").unwrap()
});

static ANY_REQUIRE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|[^.\w$])require[ \t]*\(").unwrap());

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^(export[ \t]+)?(?:const|let|var|class|function\*?|async[ \t]+function\*?)[ \t]+([A-Za-z_$][\w$]*)",
  )
  .unwrap()
});

static MODULE_EXPORTS_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^module\.exports[ \t]*=[ \t]*\{([^{}]*)\}[ \t]*(;?)").unwrap()
});

static MODULE_EXPORTS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^module\.exports[ \t]*=[ \t]*").unwrap());

static EXPORTS_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^(?:module\.)?exports\.([A-Za-z_$][\w$]*)[ \t]*=[ \t]*([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*(?:\n|$)",
  )
  .unwrap()
});

static EXPORTS_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?m)^(?:module\.)?exports\.([A-Za-z_$][\w$]*)[ \t]*=[ \t]*").unwrap()
});

static EXPORTS_DEFAULT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^(?:module\.)?exports\.default[ \t]*=[ \t]*").unwrap());

static NESTED_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^[ \t]+(?:const|let|var|class|function\*?|async[ \t]+function\*?)[ \t]+([A-Za-z_$][\w$]*)",
  )
  .unwrap()
});

static PARAMETER_LIST: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\(([^()]*)\)[ \t]*(?:=>|\{)").unwrap());

static EXPORTS_WRITE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:^|[^.\w$])(?:module\.)?exports\.([A-Za-z_$][\w$]*)[ \t]*=(?:[^=]|$)").unwrap()
});

static EXPORTS_READ: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(^|[^.\w$])(?:module\.)?exports\.([A-Za-z_$][\w$]*)").unwrap()
});

static ANY_EXPORTS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|[^.\w$])(?:module\.exports|exports)\b").unwrap());

static USE_STRICT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^[ \t]*@@esm-s(\d+)@@[ \t]*;?[ \t]*\n?").unwrap());

static ES_MODULE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^Object\.defineProperty\([ \t]*(?:module\.)?exports[ \t]*,[ \t]*@@esm-s(\d+)@@[^\n]*\n?",
  )
  .unwrap()
});

static DIRNAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|[^.\w$])__(?:dirname|filename)\b").unwrap());

static IDENTIFIER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap());

#[derive(Debug, Default)]
pub struct FallbackOutput {
  pub text: String,
  pub exported_names: Vec<ExportedName>,
  pub diagnostics: Vec<Diagnostic>,
}

struct FallbackRewriter {
  text: String,
  extracted: Vec<String>,
  imported: FxHashSet<String>,
  exported_names: Vec<ExportedName>,
  export_list: Vec<ExportedName>,
  has_default_export: bool,
  diagnostics: Vec<Diagnostic>,
}

pub fn rewrite(source: &str) -> FallbackOutput {
  let shielded = shield(source, ShieldMode::CommentsAndStrings);
  let mut rewriter = FallbackRewriter {
    text: shielded.text,
    extracted: shielded.extracted,
    imported: FxHashSet::default(),
    exported_names: Vec::new(),
    export_list: Vec::new(),
    has_default_export: false,
    diagnostics: Vec::new(),
  };

  rewriter.convert_requires(is_relative_script);
  rewriter.promote_shorthand_exports();
  rewriter.convert_generic_exports();
  rewriter.convert_requires(is_json_specifier);
  rewriter.convert_requires(has_extension);
  rewriter.convert_requires(|specifier| specifier.contains('/'));
  rewriter.convert_requires(|_| true);
  rewriter.finish()
}

fn is_relative(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

fn has_extension(specifier: &str) -> bool {
  let file_name = specifier.rsplit('/').next().unwrap_or(specifier);
  file_name.rfind('.').is_some_and(|dot| dot > 0)
}

fn is_relative_script(specifier: &str) -> bool {
  is_relative(specifier)
    && (!has_extension(specifier)
      || [".js", ".cjs", ".mjs"].iter().any(|ext| specifier.ends_with(ext)))
}

impl FallbackRewriter {
  /// Content of a plain shielded string literal.
  fn string_at(&self, idx: &str) -> Option<String> {
    let literal = self.extracted.get(idx.parse::<usize>().ok()?)?;
    let quote = literal.chars().next().filter(|quote| matches!(quote, '\'' | '"'))?;
    let inner = literal.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains('\\')).then(|| inner.to_string())
  }

  fn line_of(&self, offset: usize) -> usize {
    memchr::memchr_iter(b'\n', &self.text.as_bytes()[..offset]).count() + 1
  }

  fn diagnose(&mut self, kind: DiagnosticKind, offset: usize, message: impl AsRef<str>) {
    let message = format!("{} (line {})", message.as_ref(), self.line_of(offset));
    self.diagnostics.push(Diagnostic::new(kind, message));
  }

  fn import(&mut self, binding: &ImportBinding, specifier: &str) -> String {
    match binding {
      ImportBinding::SideEffect => {}
      ImportBinding::Default(local) => {
        self.imported.insert(local.clone());
      }
      ImportBinding::Named(bindings) => {
        self.imported.extend(bindings.iter().map(|binding| binding.local.clone()));
      }
    }
    render_import(binding, specifier)
  }

  /// Turns the column-0 `require` statements whose path passes `filter` into imports, in place.
  fn convert_requires(&mut self, filter: impl Fn(&str) -> bool) {
    let mut text = std::mem::take(&mut self.text);

    text = REQUIRE_DECLARATION
      .replace_all(&text, |caps: &Captures| {
        match self.string_at(&caps[2]).filter(|specifier| filter(specifier)) {
          Some(specifier) => self.import(&ImportBinding::Default(caps[1].to_string()), &specifier),
          None => caps[0].to_string(),
        }
      })
      .into_owned();

    text = REQUIRE_MEMBER_DECLARATION
      .replace_all(&text, |caps: &Captures| {
        match self
          .string_at(&caps[2])
          .filter(|specifier| filter(specifier) && !is_json_specifier(specifier))
        {
          Some(specifier) => {
            let binding = NamedBinding::new(&caps[3], &caps[1]);
            self.import(&ImportBinding::Named(vec![binding]), &specifier)
          }
          None => caps[0].to_string(),
        }
      })
      .into_owned();

    text = REQUIRE_DESTRUCTURING
      .replace_all(&text, |caps: &Captures| {
        let specifier = self
          .string_at(&caps[2])
          .filter(|specifier| filter(specifier) && !is_json_specifier(specifier));
        match (specifier, flat_bindings(&caps[1])) {
          (Some(specifier), Some(bindings)) => {
            self.import(&ImportBinding::Named(bindings), &specifier)
          }
          _ => caps[0].to_string(),
        }
      })
      .into_owned();

    text = REQUIRE_SIDE_EFFECT
      .replace_all(&text, |caps: &Captures| {
        match self.string_at(&caps[1]).filter(|specifier| filter(specifier)) {
          Some(specifier) => self.import(&ImportBinding::SideEffect, &specifier),
          None => caps[0].to_string(),
        }
      })
      .into_owned();

    self.text = text;
  }

  /// Column-0 declarations, by name, and whether they are already exported.
  fn declarations(&self) -> FxIndexMap<String, (usize, bool)> {
    DECLARATION
      .captures_iter(&self.text)
      .filter_map(|caps| {
        let start = caps.get(0)?.start();
        Some((caps[2].to_string(), (start, caps.get(1).is_some())))
      })
      .collect()
  }

  fn is_declared(&self, name: &str) -> bool {
    self.imported.contains(name) || self.declarations().contains_key(name)
  }

  /// Puts `export ` in front of the column-0 declaration of `name`.
  fn export_declaration(&mut self, name: &str) -> bool {
    match self.declarations().get(name) {
      Some(&(start, false)) => {
        self.text.insert_str(start, "export ");
        true
      }
      _ => false,
    }
  }

  fn push_exported_name(&mut self, name: ExportedName) {
    if !self.exported_names.contains(&name) {
      self.exported_names.push(name);
    }
  }

  /// `module.exports = { a, b }` with `a` and `b` declared at column 0.
  ///
  /// Every pass exports one more declaration; the loop stops once a pass changes nothing and is
  /// bounded by the buffer length either way.
  fn promote_shorthand_exports(&mut self) {
    let Some(caps) = MODULE_EXPORTS_OBJECT.captures(&self.text) else {
      return;
    };
    let entries = object_entries(&caps[1]);

    let mut passes = self.text.len();
    while passes > 0 {
      passes -= 1;
      let promoted = entries
        .iter()
        .filter(|(key, local)| key == local)
        .any(|(_, local)| self.export_declaration(local));
      if !promoted {
        break;
      }
    }

    let Some(caps) = MODULE_EXPORTS_OBJECT.captures(&self.text) else {
      return;
    };
    let Some(range) = caps.get(0).map(|whole| whole.range()) else {
      return;
    };
    let replacement = concat_string!("export default {", &caps[1], "};");
    self.text.replace_range(range, &replacement);
    self.has_default_export = true;

    let declarations = self.declarations();
    for (key, local) in entries {
      if key == "default" {
        continue;
      }
      let exported_declaration = declarations.get(&local).is_some_and(|(_, exported)| *exported);
      let name = ExportedName::new(local.as_str(), key.as_str());
      if !name.is_aliased() && exported_declaration {
        self.push_exported_name(name);
      } else if self.is_declared(&local)
        && !self.export_list.iter().any(|listed| listed.exported == name.exported)
      {
        self.export_list.push(name.clone());
        self.push_exported_name(name);
      }
    }
  }

  fn convert_generic_exports(&mut self) {
    if !self.has_default_export {
      let assignments = MODULE_EXPORTS.find_iter(&self.text).count();
      if assignments == 1 {
        self.text = MODULE_EXPORTS.replace(&self.text, "export default ").into_owned();
        self.has_default_export = true;
      }
    }

    let mut writes: FxIndexMap<String, usize> = FxIndexMap::default();
    for caps in EXPORTS_WRITE.captures_iter(&self.text) {
      *writes.entry(caps[1].to_string()).or_default() += 1;
    }
    let single_write = |name: &str| writes.get(name).copied() == Some(1);
    let mut replaced_reads: FxIndexMap<String, String> = FxIndexMap::default();

    // `exports.default = <expr>` is the default export itself. Next to another default it is
    // left for the leftover report.
    if single_write("default") && !self.has_default_export {
      if let Some(found) = EXPORTS_DEFAULT.find(&self.text) {
        let rest = &self.text[found.end()..];
        let value =
          rest[..rest.find('\n').unwrap_or(rest.len())].trim().trim_end_matches(';').trim_end();
        if IDENTIFIER.is_match(value) && self.is_declared(value) {
          replaced_reads.insert("default".to_string(), value.to_string());
        }
        self.text.replace_range(found.range(), "export default ");
        self.has_default_export = true;
      }
    }

    // `exports.N = L;` with `L` declared.
    let mut identifier_exports = Vec::new();
    let text = std::mem::take(&mut self.text);
    self.text = EXPORTS_IDENTIFIER
      .replace_all(&text, |caps: &Captures| {
        let (exported, local) = (&caps[1], &caps[2]);
        if exported != "default" && single_write(exported) && self.is_declared_in(&text, local) {
          identifier_exports.push(ExportedName::new(local, exported));
          String::new()
        } else {
          caps[0].to_string()
        }
      })
      .into_owned();
    for name in identifier_exports {
      replaced_reads.insert(name.exported.clone(), name.local.clone());
      if name.is_aliased() || !self.export_declaration(&name.local) {
        self.export_list.push(name.clone());
      }
      self.push_exported_name(name);
    }

    // `exports.N = <expr>`
    let mut declared = Vec::new();
    let text = std::mem::take(&mut self.text);
    self.text = EXPORTS_EXPRESSION
      .replace_all(&text, |caps: &Captures| {
        let exported = &caps[1];
        if single_write(exported)
          && is_declarable_name(exported)
          && !self.is_declared_in(&text, exported)
          && !replaced_reads.contains_key(exported)
        {
          declared.push(exported.to_string());
          concat_string!("export const ", exported, " = ")
        } else {
          caps[0].to_string()
        }
      })
      .into_owned();
    for name in declared {
      replaced_reads.insert(name.clone(), name.clone());
      self.push_exported_name(ExportedName::new(name.as_str(), name.as_str()));
    }

    // A nested binding of the same name would capture the read; those stay for the leftover
    // report.
    let nested = self.nested_bindings();
    replaced_reads.retain(|_, local| !nested.contains(local.as_str()));
    if !replaced_reads.is_empty() {
      self.text = EXPORTS_READ
        .replace_all(&self.text, |caps: &Captures| match replaced_reads.get(&caps[2]) {
          Some(local) => concat_string!(&caps[1], local),
          None => caps[0].to_string(),
        })
        .into_owned();
    }
  }

  /// Names declared below column 0 or taken as parameters, over-approximated.
  fn nested_bindings(&self) -> FxHashSet<String> {
    let mut names = NESTED_DECLARATION
      .captures_iter(&self.text)
      .map(|caps| caps[1].to_string())
      .collect::<FxHashSet<_>>();
    for caps in PARAMETER_LIST.captures_iter(&self.text) {
      names.extend(caps[1].split(',').filter_map(|parameter| {
        let parameter = parameter.trim().trim_start_matches("...");
        let name = parameter.split('=').next().unwrap_or(parameter).trim();
        IDENTIFIER.is_match(name).then(|| name.to_string())
      }));
    }
    names
  }

  fn is_declared_in(&self, text: &str, name: &str) -> bool {
    self.imported.contains(name)
      || DECLARATION.captures_iter(text).any(|caps| &caps[2] == name)
  }

  fn report_leftovers(&mut self) {
    let requires = ANY_REQUIRE.find_iter(&self.text).map(|found| found.start()).collect::<Vec<_>>();
    for offset in requires {
      self.diagnose(DiagnosticKind::Unsupported, offset, "`require` call was not converted");
    }
    let exports = ANY_EXPORTS.find_iter(&self.text).map(|found| found.start()).collect::<Vec<_>>();
    for offset in exports {
      self.diagnose(DiagnosticKind::Unsupported, offset, "exports object use was not converted");
    }
  }

  fn finish(mut self) -> FallbackOutput {
    let extracted = std::mem::take(&mut self.extracted);
    let is_use_strict =
      |idx: &str| idx.parse::<usize>().ok().and_then(|idx| extracted.get(idx)).is_some_and(|s| {
        s == "'use strict'" || s == "\"use strict\""
      });
    let is_es_module =
      |idx: &str| idx.parse::<usize>().ok().and_then(|idx| extracted.get(idx)).is_some_and(|s| {
        s == "'__esModule'" || s == "\"__esModule\""
      });

    self.text = USE_STRICT
      .replace_all(&self.text, |caps: &Captures| {
        if is_use_strict(&caps[1]) { String::new() } else { caps[0].to_string() }
      })
      .into_owned();
    self.text = ES_MODULE_MARKER
      .replace_all(&self.text, |caps: &Captures| {
        if is_es_module(&caps[1]) { String::new() } else { caps[0].to_string() }
      })
      .into_owned();

    self.report_leftovers();

    if DIRNAME.is_match(&self.text)
      && !self.is_declared_in(&self.text, "__dirname")
      && !self.is_declared_in(&self.text, "__filename")
    {
      let offset = if self.text.starts_with("#!") {
        self.text.find('\n').map_or(self.text.len(), |idx| idx + 1)
      } else {
        0
      };
      let mut shim = dirname_shim().join("\n");
      if offset == self.text.len() && !self.text.is_empty() && !self.text.ends_with('\n') {
        shim.insert(0, '\n');
      }
      shim.push('\n');
      self.text.insert_str(offset, &shim);
    }

    let mut epilogue = Vec::new();
    if !self.export_list.is_empty() {
      epilogue.push(render_export_list(&self.export_list));
    }
    if !self.has_default_export {
      epilogue.push(render_synthesized_default(&self.exported_names));
    }
    if !epilogue.is_empty() {
      if !self.text.is_empty() && !self.text.ends_with('\n') {
        self.text.push('\n');
      }
      self.text.push_str(&epilogue.join("\n"));
      self.text.push('\n');
    }

    FallbackOutput {
      text: unshield(&self.text, &extracted),
      exported_names: self.exported_names,
      diagnostics: self.diagnostics,
    }
  }
}

/// `a, b: c` of a destructuring pattern, when every entry is a plain name.
fn flat_bindings(pattern: &str) -> Option<Vec<NamedBinding>> {
  let bindings = pattern
    .split(',')
    .map(str::trim)
    .filter(|entry| !entry.is_empty())
    .map(|entry| {
      let (imported, local) = match entry.split_once(':') {
        Some((imported, local)) => (imported.trim(), local.trim()),
        None => (entry, entry),
      };
      (IDENTIFIER.is_match(imported) && IDENTIFIER.is_match(local))
        .then(|| NamedBinding::new(imported, local))
    })
    .collect::<Option<Vec<_>>>()?;
  (!bindings.is_empty()).then_some(bindings)
}

/// `(key, local)` of the identifier-valued entries of an object literal body.
fn object_entries(body: &str) -> Vec<(String, String)> {
  body
    .split(',')
    .map(str::trim)
    .filter_map(|entry| {
      let (key, value) = match entry.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (entry, entry),
      };
      (IDENTIFIER.is_match(key) && IDENTIFIER.is_match(value))
        .then(|| (key.to_string(), value.to_string()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_requires_become_imports() {
    let output = rewrite(
      "const a = require('./a');\nconst data = require(\"./data.json\");\nconst { x, y: z } = require('../lib/util.cjs');\nconst fs = require('fs');\nrequire('./polyfill');\nfunction broken( {\n",
    );
    assert!(output.text.contains("import a from \"./a\";"));
    assert!(output.text.contains("import data from \"./data.json\" with { type: \"json\" };"));
    assert!(output.text.contains("import { x, y as z } from \"../lib/util.cjs\";"));
    assert!(output.text.contains("import fs from \"fs\";"));
    assert!(output.text.contains("import \"./polyfill\";"));
    assert!(!output.text.contains("require("));
    assert!(output.text.contains("function broken( {"));
  }

  #[test]
  fn comments_and_strings_are_left_alone() {
    let output = rewrite(
      "// const a = require('./a');\nconst msg = \"exports.x = require('./b')\";\nconst b = require('./b');\n",
    );
    assert!(output.text.starts_with("// const a = require('./a');\n"));
    assert!(output.text.contains("\"exports.x = require('./b')\""));
    assert!(output.text.contains("import b from \"./b\";"));
  }

  #[test]
  fn shorthand_exports_are_promoted() {
    let output =
      rewrite("const a = 1;\nfunction b() {}\nconst c = 3;\nmodule.exports = { a, b, d: c };\n");
    assert!(output.text.contains("export const a = 1;"));
    assert!(output.text.contains("export function b() {}"));
    assert!(output.text.contains("\nconst c = 3;"));
    assert!(output.text.contains("export default { a, b, d: c };"));
    assert!(output.text.contains("export { c as d };"));
    assert_eq!(output.exported_names.len(), 3);
  }

  #[test]
  fn generic_exports() {
    let output = rewrite(
      "function parse() {}\nexports.parse = parse;\nexports.version = '1';\nexports.describe = () => exports.version;\n",
    );
    assert!(output.text.contains("export function parse() {}"));
    assert!(output.text.contains("export const version = '1';"));
    assert!(output.text.contains("export const describe = () => version;"));
    assert!(output.text.contains("export default { parse, version, describe };"));
  }

  #[test]
  fn exports_default_is_the_default_export() {
    let output = rewrite(
      "function main() {}\nexports.default = main;\nexports.run = () => exports.default();\nfunction broken( {\n",
    );
    assert!(output.text.contains("export default main;"));
    assert!(output.text.contains("export const run = () => main();"));
    assert!(!output.text.contains("main as default"));
    assert_eq!(output.text.matches("export default").count(), 1);

    let output = rewrite("exports.default = { a: 1 };\n");
    assert_eq!(output.text, "export default { a: 1 };\n");
  }

  #[test]
  fn shadowed_exports_reads_are_left_alone() {
    let output = rewrite(
      "exports.foo = function () {};\nfunction bar(foo) {\n  return exports.foo();\n}\nfunction broken( {\n",
    );
    assert!(output.text.contains("export const foo = function () {};"));
    assert!(output.text.contains("return exports.foo();"));
    assert!(output.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Unsupported));
  }

  #[test]
  fn module_exports_value() {
    let output = rewrite("'use strict';\nclass Store {}\nmodule.exports = Store;\n");
    assert_eq!(output.text, "class Store {}\nexport default Store;\n");
  }

  #[test]
  fn indented_requires_are_reported() {
    let output = rewrite("function load() {\n  return require('./lazy');\n}\n");
    assert!(output.text.contains("require('./lazy')"));
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Unsupported);
  }

  #[test]
  fn dirname_is_shimmed_after_hashbang() {
    let output = rewrite("#!/usr/bin/env node\nconsole.log(__dirname);\n");
    assert!(output.text.starts_with("#!/usr/bin/env node\nimport { fileURLToPath"));
  }

  #[test]
  fn flat_bindings_shapes() {
    assert_eq!(
      flat_bindings(" a, b: c "),
      Some(vec![NamedBinding::new("a", "a"), NamedBinding::new("b", "c")])
    );
    assert_eq!(flat_bindings("a: { b }"), None);
    assert_eq!(flat_bindings("...rest"), None);
  }
}
