/// Helpers every bundle starts with.
///
/// `__esmify_init` runs a module body once, `__esmify_export` defines live getters on a namespace
/// object and `__esmify_reexport` forwards the named exports of another namespace.
pub const RUNTIME: &str = r#"var __esmify_init = (body) => {
  let initialized = false;
  return () => {
    if (!initialized) {
      initialized = true;
      body();
    }
  };
};
var __esmify_export = (namespace, getters) => {
  for (const name in getters) {
    Object.defineProperty(namespace, name, { get: getters[name], enumerable: true });
  }
};
var __esmify_reexport = (namespace, source) => {
  for (const name of Object.keys(source)) {
    if (name !== "default" && !Object.prototype.hasOwnProperty.call(namespace, name)) {
      Object.defineProperty(namespace, name, { get: () => source[name], enumerable: true });
    }
  }
};
"#;

pub fn namespace_name(id: &str) -> String {
  format!("ns_{id}")
}

pub fn init_name(id: &str) -> String {
  format!("init_{id}")
}

pub fn external_name(idx: usize) -> String {
  format!("__esmify_ext_{idx}")
}
