use esmify_utils::concat_string;

/// Prepends the generated-file banner, keeping a hashbang line first.
pub fn insert_header(text: &str, source_path: &str) -> String {
  let header = concat_string!(
    "/**\n * Generated by esmify from ",
    source_path,
    ".\n * Edit the source file instead of this one.\n */\n"
  );
  if !text.starts_with("#!") {
    return concat_string!(header, text);
  }
  match text.find('\n') {
    Some(idx) => concat_string!(&text[..=idx], header, &text[idx + 1..]),
    None => concat_string!(text, "\n", header),
  }
}

#[test]
fn header_follows_hashbang() {
  let text = insert_header("#!/usr/bin/env node\nrun();\n", "src/cli.js");
  assert!(text.starts_with("#!/usr/bin/env node\n/**\n * Generated by esmify from src/cli.js."));
  assert!(text.ends_with(" */\nrun();\n"));

  let text = insert_header("run();", "a.js");
  assert!(text.starts_with("/**\n"));
  assert!(text.ends_with("*/\nrun();"));
}
