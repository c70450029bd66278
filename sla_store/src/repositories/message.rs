use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sla_core::contracts::MessageRepository as MessageRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::models::ChatMessage;

pub struct PgMessageRepository {
  pool: Arc<PgPool>,
}

impl PgMessageRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl MessageRepositoryPort for PgMessageRepository {
  /// Always written regardless of classification outcome (§4.1
  /// step 1). `(chat_id, id)` is the natural key; a re-delivered webhook
  /// for the same message id is a harmless no-op overwrite.
  async fn insert(&self, message: &ChatMessage) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO chat_messages
           (chat_id, message_id, sender_username, text, request_id, received_at, edited_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (chat_id, message_id) DO UPDATE SET
           text = EXCLUDED.text, edited_at = EXCLUDED.edited_at"#,
    )
    .bind(message.chat_id.0)
    .bind(message.id)
    .bind(&message.sender_username)
    .bind(&message.text)
    .bind(message.request_id.map(|r| r.0))
    .bind(message.received_at)
    .bind(message.edited_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn apply_edit(&self, chat_id: sla_core::ids::ChatId, message_id: i64, new_text: &str, edited_at: DateTime<Utc>) -> CoreResult<()> {
    sqlx::query(
      r#"UPDATE chat_messages SET text = $3, edited_at = $4
         WHERE chat_id = $1 AND message_id = $2"#,
    )
    .bind(chat_id.0)
    .bind(message_id)
    .bind(new_text)
    .bind(edited_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }
}
