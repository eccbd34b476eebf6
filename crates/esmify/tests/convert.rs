use std::fs;

use esmify::{ConvertStatus, Converter, ConverterOptions, DiagnosticKind, InputItem};
use esmify_utils::indexmap::FxIndexMap;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  for (path, content) in files {
    let path = dir.path().join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }
  dir
}

fn options(dir: &TempDir, input: &[&str]) -> ConverterOptions {
  ConverterOptions {
    input: Some(input.iter().copied().map(InputItem::from).collect()),
    cwd: Some(dir.path().to_path_buf()),
    no_header: Some(true),
    ..ConverterOptions::default()
  }
}

fn read(dir: &TempDir, path: &str) -> String {
  fs::read_to_string(dir.path().join(path)).unwrap()
}

#[test]
fn dependency_specifier_is_projected() {
  let dir = project(&[
    ("a.cjs", "const INFO1 = require(\"./dep-1.cjs\");\nconsole.log(INFO1);\n"),
    ("dep-1.cjs", "module.exports = \"info\";\n"),
  ]);
  let output = Converter::new(options(&dir, &["a.cjs"])).unwrap().write().unwrap();

  assert!(output.success());
  assert_eq!(
    read(&dir, "dist/a.mjs"),
    "import INFO1 from \"./dep-1.mjs\";\nconsole.log(INFO1);\nexport default {};\n"
  );
  assert_eq!(read(&dir, "dist/dep-1.mjs"), "export default \"info\";\n");

  let sources = output.graph.iter().map(|record| record.source.as_str()).collect::<Vec<_>>();
  assert_eq!(sources, ["a.cjs", "dep-1.cjs"]);
  assert_eq!(output.graph[1].target, "dist/dep-1.mjs");
  assert_eq!(output.graph[1].weight, 2);
}

#[test]
fn shared_dependency_is_converted_once() {
  let dir = project(&[
    ("src/a.js", "const c = require('./c');\nexports.a = c.value;\n"),
    ("src/b.js", "const c = require('./c');\nexports.b = c.value;\n"),
    ("src/c.js", "exports.value = 1;\n"),
  ]);
  let mut options = options(&dir, &["src/a.js", "src/b.js"]);
  options.root_dir = Some("src".to_string());
  let output = Converter::new(options).unwrap().convert().unwrap();

  assert_eq!(output.graph.len(), 3);
  let c = output.graph.iter().find(|record| record.source == "src/c.js").unwrap();
  assert_eq!(c.weight, 3);
  assert_eq!(c.target, "dist/c.mjs");
  assert!(output.modules[0].converted_text.contains("from \"./c.mjs\""));
  assert!(output.modules[1].converted_text.contains("from \"./c.mjs\""));
  // `convert` never touches the disk.
  assert!(!dir.path().join("dist").exists());
}

#[test]
fn unparsable_source_still_loses_its_requires() {
  let dir = project(&[
    ("main.js", "const dep = require('./dep');\nconst broken = ;\n"),
    ("dep.js", "module.exports = 1;\n"),
  ]);
  let output = Converter::new(options(&dir, &["main.js"])).unwrap().write().unwrap();

  let main = &output.modules[0];
  assert_eq!(main.status, ConvertStatus::Failed);
  assert!(main.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ParseFailure));
  assert!(main.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ConversionFailure));
  assert!(!output.success());

  let written = read(&dir, "dist/main.mjs");
  assert!(written.contains("import dep from \"./dep.mjs\";"));
  assert!(!written.contains("require("));
  assert_eq!(output.modules[1].status, ConvertStatus::Converted);
}

#[test]
fn third_party_entry_is_converted_next_to_the_output() {
  let dir = project(&[
    ("index.js", "const pkg = require('old-pkg');\nconsole.log(pkg);\n"),
    ("node_modules/pkg/package.json", r#"{ "name": "pkg", "main": "lib/main.js" }"#),
    ("node_modules/pkg/lib/main.js", "module.exports = 42;\n"),
  ]);
  let mut options = options(&dir, &["index.js"]);
  options.rename = Some(FxIndexMap::from_iter([("old-pkg".to_string(), "pkg".to_string())]));
  let output = Converter::new(options).unwrap().write().unwrap();

  assert!(output.success());
  assert!(read(&dir, "dist/index.mjs").contains("import pkg from \"./pkg/lib/main.mjs\";"));
  assert_eq!(read(&dir, "dist/pkg/lib/main.mjs"), "export default 42;\n");
  assert_eq!(output.import_map["pkg"], "node_modules/pkg/lib/main.js");
}

#[test]
fn import_map_mode_keeps_bare_specifiers() {
  let dir = project(&[
    ("index.js", "const pkg = require('pkg');\nconsole.log(pkg);\n"),
    ("node_modules/pkg/package.json", r#"{ "exports": { ".": { "require": "./index.js" } } }"#),
    ("node_modules/pkg/index.js", "module.exports = 42;\n"),
  ]);
  let mut options = options(&dir, &["index.js"]);
  options.import_map = Some(true);
  let output = Converter::new(options).unwrap().write().unwrap();

  assert!(output.success());
  assert!(read(&dir, "dist/index.mjs").contains("import pkg from \"pkg\";"));
  assert_eq!(output.import_map["pkg"], "node_modules/pkg/index.js");
  // Converted for the bundle, but never written.
  assert_eq!(output.modules.len(), 2);
  assert!(!dir.path().join("dist/pkg").exists());
}

#[test]
fn json_and_builtins() {
  let dir = project(&[
    ("app.js", "const fs = require('fs');\nconst data = require('./data');\nfs.writeFileSync(__dirname + '/x', data.name);\n"),
    ("data.json", "{ \"name\": \"app\" }\n"),
  ]);
  let output = Converter::new(options(&dir, &["app.js"])).unwrap().write().unwrap();

  assert!(output.success(), "{:#?}", output.modules);
  let app = read(&dir, "dist/app.mjs");
  assert!(app.contains("import fs from \"fs\";"));
  assert!(app.contains("import data from \"./data.json\" with { type: \"json\" };"));
  assert!(app.contains("const __dirname = "));
  assert_eq!(read(&dir, "dist/data.json"), "{ \"name\": \"app\" }\n");
}

#[test]
fn directives_and_replacements() {
  let dir = project(&[(
    "lib.js",
    "\
//#skip[esm]
const keep = require('./keep');
//#end-skip[esm]
//#remove[esm]
module.exports.legacy = true;
//#end-remove[esm]
//#add[esm] exports.modern = VERSION;
",
  )]);
  let mut options = options(&dir, &["lib.js"]);
  options.pre_replacements = Some(vec![esmify::ReplacementRule {
    search: "VERSION".to_string(),
    replace: "'1.0'".to_string(),
    regex: false,
  }]);
  let output = Converter::new(options).unwrap().convert().unwrap();

  let text = &output.modules[0].converted_text;
  assert!(text.starts_with("const keep = require('./keep');\n"));
  assert!(!text.contains("legacy"));
  assert!(text.contains("export const modern = '1.0';"));
  // The skipped file is never discovered.
  assert_eq!(output.graph.len(), 1);
}

#[test]
fn header_and_report() {
  let dir = project(&[("a.js", "#!/usr/bin/env node\nexports.run = () => {};\n")]);
  let mut options = options(&dir, &["a.js"]);
  options.no_header = None;
  let output = Converter::new(options).unwrap().convert().unwrap();

  let text = &output.modules[0].converted_text;
  assert!(text.starts_with("#!/usr/bin/env node\n/**\n * Generated by esmify from a.js.\n"));
  assert!(text.contains("export const run = () => {};"));

  let report = output.to_report(true);
  assert_eq!(report["a.js"].as_str(), Some(text.as_str()));
  assert_eq!(output.to_report(false), serde_json::json!({ "success": true }));
}

#[test]
fn missing_seed_is_fatal() {
  let dir = project(&[]);
  let errors = Converter::new(options(&dir, &["nope.js"])).unwrap().convert().unwrap_err();
  assert_eq!(errors.len(), 1);
}

#[test]
fn bundle_is_self_contained() {
  let dir = project(&[
    ("main.js", "const { add } = require('./math');\nconst config = require('./config.json');\nconsole.log(add(1, 2), config.name);\n"),
    ("math.js", "function add(a, b) {\n  return a + b;\n}\nexports.add = add;\n"),
    ("config.json", "{ \"name\": \"demo\" }"),
  ]);
  let mut options = options(&dir, &["main.js"]);
  options.bundle = Some("out/bundle.js".to_string());
  options.minify = Some(false);
  let output = Converter::new(options).unwrap().write().unwrap();

  assert!(output.success(), "{:?}", output.errors);
  let bundle = output.bundle.unwrap();
  assert_eq!(read(&dir, "out/bundle.js"), bundle);
  assert!(!bundle.contains("import "));
  assert!(!bundle.contains("export "));
  assert!(!bundle.contains("require("));
  assert!(bundle.contains("__esmify_init"));
  assert!(bundle.contains("\"demo\""));
  let math_id = &output.graph[1].id;
  assert!(bundle.contains(&format!("(0, ns_{math_id}.add)(1, 2)")));

  let main_id = &output.graph[0].id;
  assert!(bundle.trim_end().ends_with(&format!("init_{main_id}();")));
}

#[test]
fn bundle_reads_imports_when_they_are_used() {
  let dir = project(&[
    (
      "a.js",
      "const b = require('./b');
const hello = () => 'a';
exports.hello = hello;
console.log('RESULT', b.callA());
",
    ),
    (
      "b.js",
      "const { hello } = require('./a');
function callA() {
  return hello();
}
exports.callA = callA;
",
    ),
  ]);
  let mut options = options(&dir, &["a.js"]);
  options.bundle = Some("bundle.js".to_string());
  options.minify = Some(false);
  let output = Converter::new(options).unwrap().convert().unwrap();

  assert!(output.success(), "{:?}", output.errors);
  let bundle = output.bundle.unwrap();
  let (a_id, b_id) = (&output.graph[0].id, &output.graph[1].id);

  // No value is copied out of a namespace while the cycle is still initializing.
  assert!(!bundle.contains(&format!("= ns_{a_id}.")));
  assert!(!bundle.contains(&format!("= ns_{b_id}.")));
  assert!(bundle.contains(&format!("(0, ns_{a_id}.hello)()")));
  assert!(bundle.contains(&format!("init_{a_id}();")));
  assert!(bundle.contains(&format!("init_{b_id}();")));
}

#[test]
fn bundle_emits_most_imported_modules_first() {
  let dir = project(&[
    ("main.js", "require('./x');
require('./y');
require('./z');
"),
    ("x.js", "exports.x = require('./leaf').value;
"),
    ("y.js", "exports.y = require('./leaf').value;
"),
    ("z.js", "exports.z = require('./leaf').value;
"),
    ("leaf.js", "exports.value = 1;
"),
  ]);
  let mut options = options(&dir, &["main.js"]);
  options.bundle = Some("bundle.js".to_string());
  options.minify = Some(false);
  let output = Converter::new(options).unwrap().convert().unwrap();

  assert!(output.success(), "{:?}", output.errors);
  let weights = output
    .graph
    .iter()
    .map(|record| (record.source.as_str(), record.weight))
    .collect::<FxIndexMap<_, _>>();
  assert_eq!(weights["leaf.js"], 4);
  assert_eq!(weights["x.js"], 2);
  assert_eq!(weights["main.js"], 1);

  let bundle = output.bundle.unwrap();
  let position = |source: &str| {
    let record = output.graph.iter().find(|record| record.source == source).unwrap();
    bundle.find(&format!("var ns_{} =", record.id)).unwrap()
  };
  assert!(position("leaf.js") < position("x.js"));
  // Equal weights keep discovery order.
  assert!(position("x.js") < position("y.js"));
  assert!(position("y.js") < position("z.js"));
  assert!(position("z.js") < position("main.js"));
}

#[test]
fn bundle_reports_unresolved_imports() {
  let dir = project(&[("main.js", "const x = require('missing-pkg');\nconsole.log(x);\n")]);
  let mut options = options(&dir, &["main.js"]);
  options.bundle = Some("bundle.js".to_string());
  let output = Converter::new(options).unwrap().convert().unwrap();

  assert!(output.bundle.is_none());
  assert!(!output.errors.is_empty());
  assert!(!output.success());
  assert!(output.modules[0].diagnostics.iter().any(|d| d.kind == DiagnosticKind::Resolution));
}

#[test]
fn seeds_outside_the_root_keep_their_path() {
  let dir = project(&[("lib/a.js", "exports.a = 1;\n")]);
  let mut options = options(&dir, &["lib/a.js"]);
  options.root_dir = Some("src".to_string());
  let output = Converter::new(options).unwrap().convert().unwrap();

  assert_eq!(output.graph[0].target, "dist/lib/a.mjs");
  let diagnostics = &output.modules[0].diagnostics;
  assert!(diagnostics.iter().any(|d| d.kind == DiagnosticKind::Projection));
}
