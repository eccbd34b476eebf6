use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphRecord {
  pub source: String,
  pub target: String,
  pub id: String,
  pub weight: u32,
}
