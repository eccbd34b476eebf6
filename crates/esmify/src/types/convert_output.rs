use esmify_common::{GraphRecord, ImportMap, ModuleReport};
use serde_json::{Map, Value, json};

#[derive(Debug, Default)]
pub struct ConvertOutput {
  /// One report per module, in discovery order.
  pub modules: Vec<ModuleReport>,
  pub import_map: ImportMap,
  pub graph: Vec<GraphRecord>,
  pub bundle: Option<String>,
  /// Run-level problems, bundling ones included.
  pub errors: Vec<anyhow::Error>,
}

impl ConvertOutput {
  pub fn success(&self) -> bool {
    self.errors.is_empty() && self.modules.iter().all(ModuleReport::success)
  }

  /// `{ "success": bool }`, or the converted text of every module keyed by its source path.
  pub fn to_report(&self, with_report: bool) -> Value {
    if !with_report {
      return json!({ "success": self.success() });
    }
    let report = self
      .modules
      .iter()
      .map(|module| (module.source_path.to_string(), Value::from(module.converted_text.as_str())))
      .collect::<Map<_, _>>();
    Value::Object(report)
  }
}

#[cfg(test)]
mod tests {
  use esmify_common::{ConvertStatus, Diagnostic, DiagnosticKind};

  use super::*;

  fn report(source_path: &str, status: ConvertStatus) -> ModuleReport {
    ModuleReport {
      source_path: source_path.into(),
      target_path: String::new(),
      converted_text: format!("// {source_path}"),
      status,
      diagnostics: vec![Diagnostic::new(DiagnosticKind::Unsupported, "left as is")],
    }
  }

  #[test]
  fn success_needs_every_module() {
    let mut output = ConvertOutput {
      modules: vec![
        report("a.js", ConvertStatus::Converted),
        report("b.js", ConvertStatus::ConvertedWithFallback),
      ],
      ..ConvertOutput::default()
    };
    assert!(output.success());
    assert_eq!(output.to_report(false), json!({ "success": true }));

    output.modules.push(report("c.js", ConvertStatus::Failed));
    assert!(!output.success());
    assert_eq!(output.to_report(false), json!({ "success": false }));
  }

  #[test]
  fn run_errors_fail_the_run() {
    let output = ConvertOutput {
      errors: vec![anyhow::anyhow!("bundle failed")],
      ..ConvertOutput::default()
    };
    assert!(!output.success());
  }

  #[test]
  fn detailed_report() {
    let output = ConvertOutput {
      modules: vec![report("a.js", ConvertStatus::Converted)],
      ..ConvertOutput::default()
    };
    assert_eq!(output.to_report(true), json!({ "a.js": "// a.js" }));
  }
}
