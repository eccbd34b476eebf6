use oxc::ast::ast;

pub trait CallExpressionExt<'ast> {
  fn is_require_call(&self) -> bool;

  /// The path of `require("path")`. `None` unless the only argument is a string literal.
  fn require_specifier(&self) -> Option<&ast::StringLiteral<'ast>>;
}

impl<'ast> CallExpressionExt<'ast> for ast::CallExpression<'ast> {
  fn is_require_call(&self) -> bool {
    matches!(&self.callee, ast::Expression::Identifier(ident) if ident.name == "require")
  }

  fn require_specifier(&self) -> Option<&ast::StringLiteral<'ast>> {
    if !self.is_require_call() || self.arguments.len() != 1 {
      return None;
    }
    match &self.arguments[0] {
      ast::Argument::StringLiteral(literal) => Some(literal),
      _ => None,
    }
  }
}
