//! Hides comments (and optionally string literals) behind numbered markers so that regex passes
//! can't match inside them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Prefix shared by every marker. Literal occurrences in the input are shielded as well.
const MARKER_PREFIX: &str = "@@esm-";

static MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@@esm-[cs](\d+)@@").unwrap());

const REGEX_PRECEDING_KEYWORDS: [&str; 13] = [
  "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw", "yield",
  "await",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldMode {
  Comments,
  CommentsAndStrings,
}

#[derive(Debug, Default)]
pub struct Shielded {
  pub text: String,
  pub extracted: Vec<String>,
}

impl Shielded {
  pub fn unshield(&self, text: &str) -> String {
    unshield(text, &self.extracted)
  }
}

pub fn shield(text: &str, mode: ShieldMode) -> Shielded {
  let mut scanner = Scanner::new(text, mode);
  scanner.run();
  Shielded { text: scanner.out, extracted: scanner.extracted }
}

pub fn unshield(text: &str, extracted: &[String]) -> String {
  MARKER
    .replace_all(text, |caps: &Captures| {
      caps[1]
        .parse::<usize>()
        .ok()
        .and_then(|idx| extracted.get(idx))
        .map_or_else(|| caps[0].to_string(), Clone::clone)
    })
    .into_owned()
}

struct Scanner<'a> {
  text: &'a str,
  bytes: &'a [u8],
  mode: ShieldMode,
  pos: usize,
  out: String,
  extracted: Vec<String>,
  last_code_byte: Option<u8>,
  last_word: (usize, usize),
}

impl<'a> Scanner<'a> {
  fn new(text: &'a str, mode: ShieldMode) -> Self {
    Self {
      text,
      bytes: text.as_bytes(),
      mode,
      pos: 0,
      out: String::with_capacity(text.len()),
      extracted: Vec::new(),
      last_code_byte: None,
      last_word: (0, 0),
    }
  }

  fn run(&mut self) {
    if self.text.starts_with("#!") {
      let end = self.line_end(0);
      self.copy(end);
    }

    while self.pos < self.bytes.len() {
      let byte = self.bytes[self.pos];
      let next = self.bytes.get(self.pos + 1).copied();
      match (byte, next) {
        (b'/', Some(b'/')) => {
          let end = self.line_end(self.pos);
          self.extract(end, 'c');
        }
        (b'/', Some(b'*')) => {
          let end = self.text[self.pos + 2..]
            .find("*/")
            .map_or(self.bytes.len(), |idx| self.pos + idx + 4);
          self.extract(end, 'c');
        }
        (b'\'' | b'"', _) => {
          let end = self.string_end(self.pos, byte);
          self.literal(end);
        }
        (b'`', _) => {
          let end = self.template_end(self.pos);
          self.literal(end);
        }
        (b'/', _) if self.regex_allowed() => {
          let end = self.regex_end(self.pos);
          self.code(end);
        }
        _ if self.text[self.pos..].starts_with(MARKER_PREFIX) => {
          self.extract(self.pos + MARKER_PREFIX.len(), 'c');
        }
        _ => {
          let char_len = self.text[self.pos..].chars().next().map_or(1, char::len_utf8);
          self.code(self.pos + char_len);
        }
      }
    }
  }

  fn copy(&mut self, end: usize) {
    self.out.push_str(&self.text[self.pos..end]);
    self.pos = end;
  }

  fn code(&mut self, end: usize) {
    let byte = self.bytes[self.pos];
    if is_ident_byte(byte) {
      if self.last_word.1 != self.pos {
        self.last_word.0 = self.pos;
      }
      self.last_word.1 = end;
    }
    if !byte.is_ascii_whitespace() {
      self.last_code_byte = Some(byte);
    }
    self.copy(end);
  }

  fn literal(&mut self, end: usize) {
    self.last_code_byte = Some(b'"');
    let hides_marker = self.text[self.pos..end].contains(MARKER_PREFIX);
    match self.mode {
      ShieldMode::Comments if !hides_marker => self.copy(end),
      _ => self.extract(end, 's'),
    }
  }

  fn extract(&mut self, end: usize, kind: char) {
    let idx = self.extracted.len();
    self.extracted.push(self.text[self.pos..end].to_string());
    self.out.push_str(MARKER_PREFIX);
    self.out.push(kind);
    self.out.push_str(&idx.to_string());
    self.out.push_str("@@");
    self.pos = end;
  }

  fn line_end(&self, from: usize) -> usize {
    memchr::memchr(b'\n', &self.bytes[from..]).map_or(self.bytes.len(), |idx| from + idx)
  }

  /// An unterminated string ends at the line break.
  fn string_end(&self, start: usize, quote: u8) -> usize {
    let mut idx = start + 1;
    while idx < self.bytes.len() {
      match self.bytes[idx] {
        b'\\' => idx += 2,
        b'\n' => return idx,
        byte if byte == quote => return idx + 1,
        _ => idx += 1,
      }
    }
    self.bytes.len()
  }

  fn template_end(&self, start: usize) -> usize {
    let mut idx = start + 1;
    while idx < self.bytes.len() {
      match self.bytes[idx] {
        b'\\' => idx += 2,
        b'`' => return idx + 1,
        b'$' if self.bytes.get(idx + 1) == Some(&b'{') => idx = self.substitution_end(idx + 2),
        _ => idx += 1,
      }
    }
    self.bytes.len()
  }

  /// End of a `${ ... }` substitution, right after its closing brace.
  fn substitution_end(&self, start: usize) -> usize {
    let mut depth = 1usize;
    let mut idx = start;
    while idx < self.bytes.len() {
      match self.bytes[idx] {
        b'{' => {
          depth += 1;
          idx += 1;
        }
        b'}' => {
          depth -= 1;
          idx += 1;
          if depth == 0 {
            return idx;
          }
        }
        quote @ (b'\'' | b'"') => idx = self.string_end(idx, quote),
        b'`' => idx = self.template_end(idx),
        _ => idx += 1,
      }
    }
    self.bytes.len()
  }

  fn regex_allowed(&self) -> bool {
    match self.last_code_byte {
      None => true,
      Some(byte) if is_ident_byte(byte) => {
        let (start, end) = self.last_word;
        REGEX_PRECEDING_KEYWORDS.contains(&&self.text[start..end])
      }
      Some(b')' | b']' | b'}' | b'"') => false,
      Some(_) => true,
    }
  }

  fn regex_end(&self, start: usize) -> usize {
    let mut idx = start + 1;
    let mut in_class = false;
    while idx < self.bytes.len() {
      match self.bytes[idx] {
        b'\\' => idx += 2,
        b'\n' => return idx,
        b'[' => {
          in_class = true;
          idx += 1;
        }
        b']' => {
          in_class = false;
          idx += 1;
        }
        b'/' if !in_class => {
          idx += 1;
          while idx < self.bytes.len() && self.bytes[idx].is_ascii_alphabetic() {
            idx += 1;
          }
          return idx;
        }
        _ => idx += 1,
      }
    }
    self.bytes.len()
  }
}

fn is_ident_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}

#[cfg(test)]
mod tests {
  use super::*;

  fn round_trip(text: &str, mode: ShieldMode) -> Shielded {
    let shielded = shield(text, mode);
    assert_eq!(shielded.unshield(&shielded.text), text, "round trip of {text:?}");
    shielded
  }

  #[test]
  fn comments_round_trip() {
    let text = "/* x */ const y = 1; // trailing";
    let shielded = round_trip(text, ShieldMode::Comments);
    assert_eq!(shielded.text, "@@esm-c0@@ const y = 1; @@esm-c1@@");
    assert!(!shielded.text.contains("//"));
    assert!(!shielded.text.contains("/*"));
  }

  #[test]
  fn strings_are_kept_or_hidden() {
    let text = r#"const a = "// not a comment"; const b = require('./b'); // real"#;
    let shielded = round_trip(text, ShieldMode::Comments);
    assert!(shielded.text.contains("\"// not a comment\""));
    assert_eq!(shielded.extracted, vec!["// real".to_string()]);

    let shielded = round_trip(text, ShieldMode::CommentsAndStrings);
    assert!(!shielded.text.contains("require('./b')"));
    assert!(shielded.text.contains("require(@@esm-s1@@)"));
  }

  #[test]
  fn templates_and_regexes() {
    let text = "const t = `a ${ { b: '}' }.b } // ${`nested`}`;\nconst r = /\\/\\/ [/*]/g.test(x) / 2;\n/* end */";
    let shielded = round_trip(text, ShieldMode::Comments);
    assert_eq!(shielded.extracted, vec!["/* end */".to_string()]);

    let shielded = round_trip(text, ShieldMode::CommentsAndStrings);
    assert_eq!(shielded.extracted.len(), 2);
  }

  #[test]
  fn division_is_not_a_regex() {
    let text = "const half = total / 2; const q = '/'; // done";
    let shielded = round_trip(text, ShieldMode::Comments);
    assert_eq!(shielded.extracted, vec!["// done".to_string()]);
  }

  #[test]
  fn literal_markers_survive() {
    round_trip("const s = 1; @@esm-c0@@ /* c */", ShieldMode::Comments);
    round_trip("x = '@@esm-s0@@'; // @@esm-c1@@", ShieldMode::Comments);
    round_trip("x = '@@esm-s0@@'; // @@esm-c1@@", ShieldMode::CommentsAndStrings);
  }

  #[test]
  fn edge_inputs_round_trip() {
    for text in ["", "#!/usr/bin/env node\n// c\n", "/* unterminated", "'unterminated\nnext", "a/*b*/c"] {
      round_trip(text, ShieldMode::Comments);
      round_trip(text, ShieldMode::CommentsAndStrings);
    }
  }
}
