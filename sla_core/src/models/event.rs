use serde::{Deserialize, Serialize};

use crate::ids::ChatId;
use crate::models::chat::ChatType;

/// The normalized inbound event shape the core consumes at its webhook
/// boundary (§6). The adapter in front of the core is responsible for
/// translating the chat platform's native payload into this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventType {
  Message,
  EditedMessage,
  CallbackQuery,
  MemberUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRef {
  pub id: ChatId,
  pub chat_type: ChatType,
  pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromRef {
  pub id: i64,
  pub username: Option<String>,
  pub is_bot: bool,
  pub first_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
  pub event_type: ChatEventType,
  pub chat: ChatRef,
  pub from: FromRef,
  pub message_id: i64,
  /// For `message`/`edited_message`, the message body. For
  /// `callback_query`, the inline-keyboard callback data (§6 grammar) —
  /// the adapter carries it through this field rather than a dedicated
  /// one so the core has a single normalized event shape.
  pub text: Option<String>,
  pub date: i64,
  pub reply_to_message_id: Option<i64>,
  /// Present only for `member_update`: whether the bot itself was the
  /// member whose status changed, and whether it was added or removed.
  pub member_update: Option<MemberUpdateKind>,
  /// Present on the service message the chat platform sends into the
  /// *new* id when a group is upgraded to a supergroup: `chat.id` is
  /// already the new id, and this field names the old one (§3, §8
  /// scenario S4). Checked ahead of `event_type` dispatch so the
  /// migration repoint happens regardless of what event shape carries it.
  #[serde(default)]
  pub migrate_from_chat_id: Option<ChatId>,
  /// Present only for `callback_query`: the id the adapter needs to
  /// acknowledge the tap via `ChatApi::answer_callback_query`.
  pub callback_query_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberUpdateKind {
  BotAdded,
  BotRemoved,
  Other,
}
