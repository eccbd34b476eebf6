/// Concatenates anything that is `AsRef<str>` into a new `String`, evaluating each part once.
#[macro_export]
macro_rules! concat_string {
  () => {
    String::new()
  };
  ($($part:expr),+ $(,)?) => {
    [$(::core::convert::AsRef::<str>::as_ref(&$part)),+].concat()
  };
}

#[test]
fn test_concat_string() {
  let name = String::from("dep");
  assert_eq!(concat_string!("./", name, ".mjs"), "./dep.mjs");
  assert_eq!(concat_string!(), "");
  assert_eq!(concat_string!(format!("{}", 1), "2"), "12");
}
