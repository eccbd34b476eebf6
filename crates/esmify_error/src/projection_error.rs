use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
  #[error("`{root}` is not a prefix of `{path}`")]
  NotAPrefix { path: String, root: String },
}
