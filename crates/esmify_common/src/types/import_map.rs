use esmify_utils::indexmap::FxIndexMap;

/// Bare specifier to the working-dir-relative path of the package entry it resolved to.
pub type ImportMap = FxIndexMap<String, String>;
