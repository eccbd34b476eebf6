use base_encode::to_string;
use xxhash_rust::xxh3::xxh3_128;

const CHARACTERS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Length of the identifiers derived from module paths.
pub const MODULE_ID_LENGTH: usize = 10;

pub fn xxhash_with_base(input: &[u8], base: u8) -> String {
  let hash = xxh3_128(input).to_le_bytes();
  // Encoding a non-empty byte slice with a base in `2..=64` can't fail.
  to_string(&hash, base, CHARACTERS).unwrap_or_default()
}

/// A short, stable, lowercase alphanumeric identifier for `input`.
pub fn module_id(input: &str) -> String {
  let mut id = xxhash_with_base(input.as_bytes(), 36);
  id.truncate(MODULE_ID_LENGTH);
  while id.len() < MODULE_ID_LENGTH {
    id.push('0');
  }
  id
}

#[test]
fn test_xxhash_with_base() {
  assert_eq!(xxhash_with_base(b"hello", 36), xxhash_with_base(b"hello", 36));
  assert_ne!(xxhash_with_base(b"hello", 36), xxhash_with_base(b"world", 36));
  assert!(xxhash_with_base(b"hello", 16).chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_module_id() {
  let id = module_id("src/index.js");
  assert_eq!(id.len(), MODULE_ID_LENGTH);
  assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
  assert_eq!(id, module_id("src/index.js"));
  assert_ne!(id, module_id("src/other.js"));
}
