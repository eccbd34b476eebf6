use esmify_error::{BuildError, BuildResult};
use oxc::{
  allocator::Allocator,
  codegen::{Codegen, CodegenOptions},
  minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions},
  ast::ast::Program,
  parser::{ParseOptions, Parser, ParserReturn},
  span::SourceType,
};

pub struct EcmaCompiler;

impl EcmaCompiler {
  fn parse<'a>(allocator: &'a Allocator, source_text: &'a str) -> ParserReturn<'a> {
    Parser::new(allocator, source_text, SourceType::mjs()).parse()
  }

  fn errors_of(ret: &ParserReturn) -> Option<BuildError> {
    if ret.panicked || !ret.errors.is_empty() {
      let errors = ret.errors.iter().map(|error| anyhow::anyhow!("{error}")).collect::<Vec<_>>();
      if errors.is_empty() {
        return Some(anyhow::anyhow!("Unrecoverable syntax error").into());
      }
      return Some(errors.into());
    }
    None
  }

  /// Parses legacy-dialect source: a script allowing a top-level `return`, else a module, so files
  /// already mixing in `import`/`export` still parse.
  pub fn parse_commonjs<'a>(
    allocator: &'a Allocator,
    source_text: &'a str,
  ) -> BuildResult<Program<'a>> {
    let ret = Parser::new(allocator, source_text, SourceType::cjs())
      .with_options(ParseOptions { allow_return_outside_function: true, ..ParseOptions::default() })
      .parse();
    let Some(script_errors) = Self::errors_of(&ret) else {
      return Ok(ret.program);
    };
    let ret = Self::parse(allocator, source_text);
    match Self::errors_of(&ret) {
      Some(_) => Err(script_errors),
      None => Ok(ret.program),
    }
  }

  pub fn parse_module<'a>(
    allocator: &'a Allocator,
    source_text: &'a str,
  ) -> BuildResult<Program<'a>> {
    let ret = Self::parse(allocator, source_text);
    match Self::errors_of(&ret) {
      Some(errors) => Err(errors),
      None => Ok(ret.program),
    }
  }

  /// Checks that `source_text` is a syntactically valid module.
  pub fn validate(source_text: &str) -> BuildResult<()> {
    let allocator = Allocator::default();
    let ret = Self::parse(&allocator, source_text);
    match Self::errors_of(&ret) {
      Some(errors) => Err(errors),
      None => Ok(()),
    }
  }

  pub fn print(source_text: &str) -> BuildResult<String> {
    let allocator = Allocator::default();
    let ret = Self::parse(&allocator, source_text);
    if let Some(errors) = Self::errors_of(&ret) {
      return Err(errors);
    }
    Ok(Codegen::new().build(&ret.program).code)
  }

  pub fn minify(source_text: &str) -> BuildResult<String> {
    let allocator = Allocator::default();
    let ret = Self::parse(&allocator, source_text);
    if let Some(errors) = Self::errors_of(&ret) {
      return Err(errors);
    }
    let program = allocator.alloc(ret.program);

    let ret = Minifier::new(MinifierOptions {
      mangle: Some(MangleOptions::default()),
      compress: Some(CompressOptions {
        drop_debugger: false,
        drop_console: false,
        ..CompressOptions::default()
      }),
    })
    .build(&allocator, program);

    let ret = Codegen::new()
      .with_options(CodegenOptions { minify: true, ..CodegenOptions::default() })
      .with_scoping(ret.scoping)
      .build(program);

    Ok(ret.code)
  }
}

#[test]
fn basic_test() {
  let code = EcmaCompiler::print("const a = 1;").unwrap();
  assert_eq!(code, "const a = 1;\n");
}

#[test]
fn validate_reports_syntax_errors() {
  assert!(EcmaCompiler::validate("import a from './a.mjs';\nexport { a };").is_ok());
  let errors = EcmaCompiler::validate("const = ;").unwrap_err();
  assert!(!errors.is_empty());
}

#[test]
fn parse_commonjs_accepts_both_dialects() {
  let allocator = Allocator::default();
  assert!(EcmaCompiler::parse_commonjs(&allocator, "if (done) return;\nmodule.exports = 1;").is_ok());
  assert!(EcmaCompiler::parse_commonjs(&allocator, "export const a = require('a');").is_ok());
  assert!(EcmaCompiler::parse_commonjs(&allocator, "const = ;").is_err());
}

#[test]
fn minify_keeps_side_effects() {
  let code = EcmaCompiler::minify("var answer = 40 + 2;\nconsole.log(answer);").unwrap();
  assert!(code.contains("console.log"));
}
