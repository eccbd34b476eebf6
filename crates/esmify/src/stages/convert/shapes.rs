//! Text of the declarations both rewriters emit, so the two paths agree on their output.

use esmify_common::{ExportedName, ImportBinding, NamedBinding};
use esmify_utils::{
  concat_string,
  ecmascript::{is_validate_identifier_name, quote_string, to_module_import_export_name},
};
use itertools::Itertools;

/// Prefix of every binding the rewriters introduce.
pub const BINDING_PREFIX: &str = "__esmify_";

const RESERVED_WORDS: &[&str] = &[
  "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
  "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for",
  "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
  "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
  "throw", "true", "try", "typeof", "var", "void", "while", "with",
];

/// Whether `name` can be declared with `export const`.
pub fn is_declarable_name(name: &str) -> bool {
  is_validate_identifier_name(name) && !RESERVED_WORDS.contains(&name) && name != "yield"
}

pub fn is_json_specifier(specifier: &str) -> bool {
  specifier.ends_with(".json")
}

pub fn render_import(binding: &ImportBinding, specifier: &str) -> String {
  let source = quote_string(specifier);
  let attributes = if is_json_specifier(specifier) { r#" with { type: "json" }"# } else { "" };
  match binding {
    ImportBinding::SideEffect => concat_string!("import ", source, attributes, ";"),
    ImportBinding::Default(local) => {
      concat_string!("import ", local, " from ", source, attributes, ";")
    }
    ImportBinding::Named(bindings) => {
      concat_string!("import { ", render_named_bindings(bindings), " } from ", source, attributes, ";")
    }
  }
}

fn render_named_bindings(bindings: &[NamedBinding]) -> String {
  bindings
    .iter()
    .map(|binding| {
      if binding.imported == binding.local {
        binding.local.clone()
      } else {
        concat_string!(to_module_import_export_name(&binding.imported), " as ", binding.local)
      }
    })
    .join(", ")
}

/// `export { local as exported, ... };`
pub fn render_export_list(names: &[ExportedName]) -> String {
  let specifiers = names
    .iter()
    .map(|name| {
      if name.is_aliased() {
        concat_string!(name.local, " as ", to_module_import_export_name(&name.exported))
      } else {
        name.local.clone()
      }
    })
    .join(", ");
  concat_string!("export { ", specifiers, " };")
}

/// Default export standing in for the legacy exports object.
pub fn render_synthesized_default(names: &[ExportedName]) -> String {
  if names.is_empty() {
    return "export default {};".to_string();
  }
  let properties = names
    .iter()
    .map(|name| {
      if !name.is_aliased() {
        name.local.clone()
      } else if is_validate_identifier_name(&name.exported) {
        concat_string!(name.exported, ": ", name.local)
      } else {
        concat_string!(quote_string(&name.exported), ": ", name.local)
      }
    })
    .join(", ");
  concat_string!("export default { ", properties, " };")
}

/// Module-scoped `__filename` and `__dirname` rebuilt from `import.meta.url`.
pub fn dirname_shim() -> [String; 4] {
  [
    concat_string!(r#"import { fileURLToPath as "#, BINDING_PREFIX, r#"fileURLToPath } from "node:url";"#),
    concat_string!(r#"import { dirname as "#, BINDING_PREFIX, r#"dirname } from "node:path";"#),
    concat_string!("const __filename = ", BINDING_PREFIX, "fileURLToPath(import.meta.url);"),
    concat_string!("const __dirname = ", BINDING_PREFIX, "dirname(__filename);"),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn import_shapes() {
    assert_eq!(render_import(&ImportBinding::SideEffect, "./a.js"), r#"import "./a.js";"#);
    assert_eq!(
      render_import(&ImportBinding::Default("INFO1".into()), "./dep-1.cjs"),
      r#"import INFO1 from "./dep-1.cjs";"#
    );
    assert_eq!(
      render_import(&ImportBinding::Default("data".into()), "./d.json"),
      r#"import data from "./d.json" with { type: "json" };"#
    );
    let named = ImportBinding::Named(vec![
      NamedBinding::new("a", "a"),
      NamedBinding::new("b", "c"),
      NamedBinding::new("x-y", "xy"),
    ]);
    assert_eq!(render_import(&named, "p"), r#"import { a, b as c, "x-y" as xy } from "p";"#);
  }

  #[test]
  fn export_shapes() {
    let names = vec![ExportedName::new("a", "a"), ExportedName::new("c", "b")];
    assert_eq!(render_export_list(&names), "export { a, c as b };");
    assert_eq!(render_synthesized_default(&names), "export default { a, b: c };");
    assert_eq!(render_synthesized_default(&[]), "export default {};");
    assert_eq!(
      render_synthesized_default(&[ExportedName::new("x", "my-x")]),
      r#"export default { "my-x": x };"#
    );
  }

  #[test]
  fn declarable_names() {
    assert!(is_declarable_name("parse"));
    assert!(!is_declarable_name("default"));
    assert!(!is_declarable_name("my-name"));
  }
}
