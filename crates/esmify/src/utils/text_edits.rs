//! Offset-based text surgery: edits are collected against the original text and applied in one
//! pass, so no edit has to account for the ones before it.

#[derive(Debug)]
struct TextEdit {
  start: u32,
  end: u32,
  content: String,
}

#[derive(Debug, Default)]
pub struct TextEdits {
  edits: Vec<TextEdit>,
}

impl TextEdits {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.edits.is_empty()
  }

  pub fn replace(&mut self, start: u32, end: u32, content: impl Into<String>) {
    self.edits.push(TextEdit { start, end, content: content.into() });
  }

  pub fn remove(&mut self, start: u32, end: u32) {
    self.replace(start, end, String::new());
  }

  /// Inserts at `offset`. Inserts sharing an offset keep the order they were added in.
  pub fn insert(&mut self, offset: u32, content: impl Into<String>) {
    self.replace(offset, offset, content);
  }

  /// Applies every edit to `source`. An edit overlapping one that starts earlier is dropped.
  pub fn apply(mut self, source: &str) -> String {
    // Stable, so inserts at the same offset keep their order.
    self.edits.sort_by_key(|edit| (edit.start, edit.end));

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in self.edits {
      let (start, end) = (edit.start as usize, edit.end as usize);
      if start < cursor || end > source.len() || start > end {
        tracing::warn!("Dropping overlapping edit {start}..{end}");
        continue;
      }
      output.push_str(&source[cursor..start]);
      output.push_str(&edit.content);
      cursor = end;
    }
    output.push_str(&source[cursor..]);
    output
  }
}

/// Extends `start..end` over the whole line when nothing else is on it.
pub fn expand_to_line(source: &str, start: u32, end: u32) -> (u32, u32) {
  let (start_idx, end_idx) = (start as usize, end as usize);
  let line_start = source[..start_idx].rfind('\n').map_or(0, |idx| idx + 1);
  let line_end = source[end_idx..].find('\n').map_or(source.len(), |idx| end_idx + idx);
  let blank_before = source[line_start..start_idx].trim().is_empty();
  let blank_after = source[end_idx..line_end].trim().is_empty();
  if blank_before && blank_after {
    let line_end = if line_end < source.len() { line_end + 1 } else { line_end };
    (line_start as u32, line_end as u32)
  } else {
    (start, end)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn applies_edits_in_one_pass() {
    let source = "const a = require('a');\nconst b = 1;\n";
    let mut edits = TextEdits::new();
    edits.remove(0, 24);
    edits.insert(0, "import a from 'a';\n");
    edits.replace(30, 31, "bee");
    assert_eq!(edits.apply(source), "import a from 'a';\nconst bee = 1;\n");
  }

  #[test]
  fn inserts_keep_their_order() {
    let mut edits = TextEdits::new();
    edits.insert(3, "1");
    edits.insert(3, "2");
    edits.replace(3, 4, "d");
    edits.insert(4, "3");
    assert_eq!(edits.apply("abcx"), "abc12d3");
  }

  #[test]
  fn overlapping_edits_are_dropped() {
    let mut edits = TextEdits::new();
    edits.replace(0, 4, "X");
    edits.replace(2, 6, "Y");
    assert_eq!(edits.apply("abcdefg"), "Xefg");
  }

  #[test]
  fn expand_to_whole_line() {
    let source = "a;\n  let x;\nb; let y;\n";
    assert_eq!(expand_to_line(source, 5, 11), (3, 12));
    assert_eq!(expand_to_line(source, 15, 21), (15, 21));
  }
}
