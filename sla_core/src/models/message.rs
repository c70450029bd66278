use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, RequestId};

/// Audit record written for every inbound chat message regardless of
/// classification outcome (§4.1 step 1 — "always write"). This
/// is the only table the ingestion pipeline writes to unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
  pub id: i64,
  pub chat_id: ChatId,
  pub sender_username: Option<String>,
  pub text: String,
  pub request_id: Option<RequestId>,
  pub received_at: DateTime<Utc>,
  pub edited_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
  pub fn new(id: i64, chat_id: ChatId, sender_username: Option<String>, text: String, received_at: DateTime<Utc>) -> Self {
    Self {
      id,
      chat_id,
      sender_username,
      text,
      request_id: None,
      received_at,
      edited_at: None,
    }
  }

  /// An `edited_message` event updates content only. It never reopens a
  /// closed `Request` nor retriggers classification (§4.1).
  pub fn apply_edit(&mut self, new_text: String, edited_at: DateTime<Utc>) {
    self.text = new_text;
    self.edited_at = Some(edited_at);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn applying_an_edit_never_touches_request_id() {
    let mut msg = ChatMessage::new(1, ChatId(10), Some("client".into()), "orig".into(), Utc::now());
    msg.request_id = Some(RequestId::generate());
    let linked = msg.request_id;
    msg.apply_edit("edited text".into(), Utc::now());
    assert_eq!(msg.text, "edited text");
    assert_eq!(msg.request_id, linked);
  }
}
