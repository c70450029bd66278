use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ChatId;

/// An exported chat invite link, tracked so the bot can re-validate or
/// revoke it without a round-trip to the chat API (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInvitation {
  pub chat_id: ChatId,
  pub token: String,
  pub created_at: DateTime<Utc>,
  pub revoked: bool,
}

impl ChatInvitation {
  pub fn new(chat_id: ChatId, token: String) -> Self {
    Self {
      chat_id,
      token,
      created_at: Utc::now(),
      revoked: false,
    }
  }

  pub fn revoke(&mut self) {
    self.revoked = true;
  }
}

/// Validate an invite token's shape: alphanumeric plus `_`/`-`, 8..64
/// characters (§4.8). Does not check the chat API for revocation.
pub fn is_valid_token_shape(token: &str) -> bool {
  let len = token.chars().count();
  (8..=64).contains(&len) && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_tokens_outside_length_bounds() {
    assert!(!is_valid_token_shape("short"));
    assert!(!is_valid_token_shape(&"a".repeat(65)));
  }

  #[test]
  fn rejects_tokens_with_invalid_characters() {
    assert!(!is_valid_token_shape("has a space!!"));
    assert!(!is_valid_token_shape("invalid/slash/chars"));
  }

  #[test]
  fn accepts_well_formed_tokens() {
    assert!(is_valid_token_shape("abcDEF123_-token"));
  }
}
