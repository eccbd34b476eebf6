mod ecma_compiler;
mod ecma_utils;

pub use crate::{
  ecma_compiler::EcmaCompiler,
  ecma_utils::{CallExpressionExt, ExpressionExt},
};
