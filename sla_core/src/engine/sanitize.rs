//! Text sanitization shared by ingestion (§4.1 step 2, §4.8).

pub const MAX_MESSAGE_TEXT_LEN: usize = 10_000;

/// Trim and strip control/invisible code points from message text. Unlike
/// `models::chat::sanitize_title` this does not cap length — callers
/// validate length separately so they can reject oversized input instead
/// of silently truncating it (§7: validation errors are rejected at
/// ingress, not repaired).
pub fn sanitize_text(raw: &str) -> String {
  raw
    .chars()
    .filter(|c| !c.is_control() || *c == '\n')
    .collect::<String>()
    .trim()
    .to_string()
}

pub fn is_oversized(text: &str) -> bool {
  text.chars().count() > MAX_MESSAGE_TEXT_LEN
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sanitize_trims_and_strips_control_chars_but_keeps_newlines() {
    let cleaned = sanitize_text("  hello\u{0000}\nworld  ");
    assert_eq!(cleaned, "hello\nworld");
  }

  #[test]
  fn oversized_detection_respects_the_10000_char_cap() {
    assert!(!is_oversized(&"a".repeat(10_000)));
    assert!(is_oversized(&"a".repeat(10_001)));
  }
}
