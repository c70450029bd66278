use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ChatId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ChatType {
  Group,
  Supergroup,
  Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ClientTier {
  Standard,
  Priority,
}

/// A monitored chat. The aggregate root for its `Request`s.
///
/// Invariant: the row is never deleted. When the bot is removed from the
/// chat, `monitoring_enabled` and `sla_enabled` are both flipped to `false`
/// but the row (and its history) is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
  pub id: ChatId,
  pub title: String,
  pub chat_type: ChatType,
  pub sla_enabled: bool,
  pub sla_threshold_minutes: i32,
  pub monitoring_enabled: bool,
  pub is_24x7: bool,
  pub manager_ids: HashSet<String>,
  pub accountant_ids: HashSet<String>,
  pub notify_in_chat_on_breach: bool,
  pub client_tier: ClientTier,
  pub invite_url: Option<String>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Chat {
  /// Create a new monitored chat with defaults matching `GlobalSettings`.
  pub fn new(id: ChatId, title: String, chat_type: ChatType, default_threshold: i32) -> Self {
    Self {
      id,
      title: sanitize_title(&title),
      chat_type,
      sla_enabled: true,
      sla_threshold_minutes: default_threshold,
      monitoring_enabled: true,
      is_24x7: false,
      manager_ids: HashSet::new(),
      accountant_ids: HashSet::new(),
      // Default false: a chat-wide breach notification is surprising noise
      // unless explicitly opted into. See design note §9.
      notify_in_chat_on_breach: false,
      client_tier: ClientTier::Standard,
      invite_url: None,
      deleted_at: None,
    }
  }

  /// Applied when the bot is removed from the chat (a `member_update` event).
  /// The row is retained; only monitoring stops.
  pub fn on_bot_removed(&mut self) {
    self.monitoring_enabled = false;
    self.sla_enabled = false;
  }

  pub fn effective_threshold_minutes(&self) -> i32 {
    self.sla_threshold_minutes
  }

  /// Recipients for level 0 (warning) and level 1 (first breach): chat
  /// accountants, falling back to chat managers, falling back to the
  /// supplied global manager set.
  pub fn primary_recipients<'a>(&'a self, global_managers: &'a HashSet<String>) -> &'a HashSet<String> {
    if !self.accountant_ids.is_empty() {
      &self.accountant_ids
    } else if !self.manager_ids.is_empty() {
      &self.manager_ids
    } else {
      global_managers
    }
  }

  /// Recipients for escalation level 2 and above: the union of chat
  /// managers and chat accountants, falling back to global managers if
  /// that union is empty.
  pub fn escalation_recipients(&self, global_managers: &HashSet<String>) -> HashSet<String> {
    let union: HashSet<String> = self
      .manager_ids
      .union(&self.accountant_ids)
      .cloned()
      .collect();
    if union.is_empty() {
      global_managers.clone()
    } else {
      union
    }
  }
}

/// Strip Unicode "other" category code points, trim, and cap at 255 chars,
/// per §4.8.
pub fn sanitize_title(raw: &str) -> String {
  let cleaned: String = raw
    .chars()
    .filter(|c| !is_other_category(*c))
    .collect::<String>()
    .trim()
    .to_string();
  cleaned.chars().take(255).collect()
}

fn is_other_category(c: char) -> bool {
  // Control, format, surrogate, private-use, and unassigned code points —
  // approximated without a full Unicode category table: control chars and
  // the common zero-width/invisible formatting characters.
  c.is_control() || matches!(c, '\u{200B}'..='\u{200F}' | '\u{FEFF}' | '\u{2060}')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sanitize_title_strips_control_chars_and_caps_length() {
    let raw = format!("{}{}", "a\u{0000}b\u{200B}c", "x".repeat(300));
    let cleaned = sanitize_title(&raw);
    assert!(!cleaned.contains('\u{0000}'));
    assert!(!cleaned.contains('\u{200B}'));
    assert_eq!(cleaned.chars().count(), 255);
  }

  #[test]
  fn on_bot_removed_disables_monitoring_but_keeps_the_row() {
    let mut chat = Chat::new(ChatId(-100), "Acme LLC".to_string(), ChatType::Supergroup, 60);
    chat.on_bot_removed();
    assert!(!chat.monitoring_enabled);
    assert!(!chat.sla_enabled);
    assert_eq!(chat.title, "Acme LLC");
  }

  #[test]
  fn recipient_tiering_falls_back_through_chat_then_global() {
    let global: HashSet<String> = ["global_mgr".to_string()].into_iter().collect();
    let mut chat = Chat::new(ChatId(1), "Chat".to_string(), ChatType::Group, 60);

    // No local recipients at all: falls back to global.
    assert_eq!(chat.primary_recipients(&global), &global);

    chat.manager_ids.insert("mgr1".to_string());
    assert_eq!(chat.primary_recipients(&global), &chat.manager_ids);

    chat.accountant_ids.insert("acct1".to_string());
    assert_eq!(chat.primary_recipients(&global), &chat.accountant_ids);
  }

  #[test]
  fn escalation_recipients_union_chat_managers_and_accountants() {
    let global: HashSet<String> = ["global_mgr".to_string()].into_iter().collect();
    let mut chat = Chat::new(ChatId(1), "Chat".to_string(), ChatType::Group, 60);
    chat.manager_ids.insert("mgr1".to_string());
    chat.accountant_ids.insert("acct1".to_string());

    let recipients = chat.escalation_recipients(&global);
    assert_eq!(recipients.len(), 2);
    assert!(recipients.contains("mgr1"));
    assert!(recipients.contains("acct1"));
  }

  #[test]
  fn escalation_recipients_fall_back_to_global_when_empty() {
    let global: HashSet<String> = ["global_mgr".to_string()].into_iter().collect();
    let chat = Chat::new(ChatId(1), "Chat".to_string(), ChatType::Group, 60);
    assert_eq!(chat.escalation_recipients(&global), global);
  }
}
