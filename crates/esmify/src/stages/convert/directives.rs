//! Target-conditioned source regions.
//!
//! `//#skip[T]` … `//#end-skip[T]` keeps its content away from every rewrite,
//! `//#remove[T]` … `//#end-remove[T]` deletes it and `//#add[T] code` unwraps `code`.
//! Each marker also has a block comment form (`/*#skip[T]*/`, `/*#add[T] code */`).

use std::sync::LazyLock;

use esmify_utils::concat_string;
use regex::{Captures, Regex};

static SKIP_PLACEHOLDER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"/\*@esmify-skip:(\d+)\*/").unwrap());

#[derive(Debug)]
pub struct DirectiveProcessor {
  skip: Regex,
  remove: Regex,
  add_line: Regex,
  add_block: Regex,
}

#[derive(Debug, Default)]
pub struct DirectiveOutput {
  pub text: String,
  /// Content of every skipped block, indexed by its placeholder.
  pub skipped: Vec<String>,
}

impl DirectiveOutput {
  /// Puts the skipped blocks back in place of their placeholders.
  pub fn restore(&self, text: &str) -> String {
    if self.skipped.is_empty() {
      return text.to_string();
    }
    SKIP_PLACEHOLDER
      .replace_all(text, |caps: &Captures| {
        caps[1]
          .parse::<usize>()
          .ok()
          .and_then(|idx| self.skipped.get(idx))
          .map_or_else(|| caps[0].to_string(), Clone::clone)
      })
      .into_owned()
  }
}

fn block_pattern(name: &str, target: &str) -> String {
  let target = regex::escape(target);
  concat_string!(
    r"(?s)(?://#",
    name,
    r"\[",
    target,
    r"\][^\n]*\n?|/\*#",
    name,
    r"\[",
    target,
    r"\]\*/)(.*?)(?://#end-",
    name,
    r"\[",
    target,
    r"\][^\n]*|/\*#end-",
    name,
    r"\[",
    target,
    r"\]\*/)"
  )
}

impl DirectiveProcessor {
  pub fn new(target: &str) -> Result<Self, regex::Error> {
    let escaped = regex::escape(target);
    Ok(Self {
      skip: Regex::new(&block_pattern("skip", target))?,
      remove: Regex::new(&block_pattern("remove", target))?,
      add_line: Regex::new(&concat_string!(r"//#add\[", escaped, r"\][ \t]?([^\n]*)"))?,
      add_block: Regex::new(&concat_string!(r"(?s)/\*#add\[", escaped, r"\][ \t]?(.*?)\s*\*/"))?,
    })
  }

  pub fn process(&self, text: &str) -> DirectiveOutput {
    let mut skipped = Vec::new();
    let text = self.skip.replace_all(text, |caps: &Captures| {
      let placeholder = format!("/*@esmify-skip:{}*/", skipped.len());
      skipped.push(caps[1].to_string());
      placeholder
    });
    let text = self.remove.replace_all(&text, "");
    let text = self.add_block.replace_all(&text, "$1");
    let text = self.add_line.replace_all(&text, "$1");
    DirectiveOutput { text: text.into_owned(), skipped }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn skip_remove_and_add() {
    let processor = DirectiveProcessor::new("esm").unwrap();
    let source = "\
//#skip[esm]
const keep = require('./keep');
//#end-skip[esm]
//#remove[esm]
module.exports.legacy = true;
//#end-remove[esm]
//#add[esm] export const modern = true;
/*#add[esm] export const block = 1; */
//#remove[cjs]
const other = 1;
//#end-remove[cjs]
";
    let output = processor.process(source);
    assert_eq!(output.skipped, vec!["const keep = require('./keep');\n".to_string()]);
    assert!(output.text.starts_with("/*@esmify-skip:0*/\n"));
    assert!(!output.text.contains("legacy"));
    assert!(output.text.contains("export const modern = true;\n"));
    assert!(output.text.contains("export const block = 1;\n"));
    assert!(output.text.contains("//#remove[cjs]\nconst other = 1;"));
    assert!(!output.text.contains("//#add[esm]"));

    let restored = output.restore(&output.text);
    assert!(restored.starts_with("const keep = require('./keep');\n\n"));
  }

  #[test]
  fn block_comment_markers() {
    let processor = DirectiveProcessor::new("esm").unwrap();
    let output = processor.process("a();/*#remove[esm]*/b();/*#end-remove[esm]*/c();");
    assert_eq!(output.text, "a();c();");

    let output = processor.process("/*#skip[esm]*/x = require('x');/*#end-skip[esm]*/");
    assert_eq!(output.text, "/*@esmify-skip:0*/");
    assert_eq!(output.restore(&output.text), "x = require('x');");
  }

  #[test]
  fn targets_with_regex_characters() {
    let processor = DirectiveProcessor::new("esm.next").unwrap();
    let output = processor.process("//#add[esm.next] ok();\n//#add[esmxnext] no();\n");
    assert_eq!(output.text, "ok();\n//#add[esmxnext] no();\n");
  }
}
