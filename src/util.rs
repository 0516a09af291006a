//! Small utility helpers used across modules.

/// Normalize an optional query parameter. The mobile client sends `""` or the
/// literal `"null"` when no user is signed in; both mean "absent".
pub fn present_param(raw: Option<&str>) -> Option<&str> {
  match raw.map(str::trim) {
    None | Some("") | Some("null") | Some("undefined") => None,
    Some(s) => Some(s),
  }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholder_ids_are_absent() {
    assert_eq!(present_param(None), None);
    assert_eq!(present_param(Some("")), None);
    assert_eq!(present_param(Some("null")), None);
    assert_eq!(present_param(Some(" user_1 ")), Some("user_1"));
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("ééééé", 3);
    assert!(t.starts_with('é'));
    assert!(t.ends_with("(10 bytes total)"));
  }
}
