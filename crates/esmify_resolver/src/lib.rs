mod resolver;

pub use oxc_resolver::ResolveError;

pub use crate::resolver::{
  ResolveReturn, Resolver, is_builtin_module, is_relative_specifier, package_name,
};
