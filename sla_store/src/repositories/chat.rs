use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use sla_core::contracts::ChatRepository as ChatRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::ChatId;
use sla_core::models::chat::{Chat, ChatType, ClientTier};

#[derive(FromRow)]
struct ChatRow {
  id: i64,
  title: String,
  chat_type: ChatType,
  sla_enabled: bool,
  sla_threshold_minutes: i32,
  monitoring_enabled: bool,
  is_24x7: bool,
  manager_ids: Vec<String>,
  accountant_ids: Vec<String>,
  notify_in_chat_on_breach: bool,
  client_tier: ClientTier,
  invite_url: Option<String>,
  deleted_at: Option<DateTime<Utc>>,
}

impl From<ChatRow> for Chat {
  fn from(row: ChatRow) -> Self {
    Chat {
      id: ChatId(row.id),
      title: row.title,
      chat_type: row.chat_type,
      sla_enabled: row.sla_enabled,
      sla_threshold_minutes: row.sla_threshold_minutes,
      monitoring_enabled: row.monitoring_enabled,
      is_24x7: row.is_24x7,
      manager_ids: row.manager_ids.into_iter().collect(),
      accountant_ids: row.accountant_ids.into_iter().collect(),
      notify_in_chat_on_breach: row.notify_in_chat_on_breach,
      client_tier: row.client_tier,
      invite_url: row.invite_url,
      deleted_at: row.deleted_at,
    }
  }
}

fn to_vec(set: &HashSet<String>) -> Vec<String> {
  set.iter().cloned().collect()
}

pub struct PgChatRepository {
  pool: Arc<PgPool>,
}

impl PgChatRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ChatRepositoryPort for PgChatRepository {
  async fn find_by_id(&self, id: ChatId) -> CoreResult<Option<Chat>> {
    let row = sqlx::query_as::<_, ChatRow>(
      r#"SELECT id, title, chat_type, sla_enabled, sla_threshold_minutes,
                monitoring_enabled, is_24x7, manager_ids, accountant_ids,
                notify_in_chat_on_breach, client_tier, invite_url, deleted_at
         FROM chats WHERE id = $1"#,
    )
    .bind(id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(Chat::from))
  }

  /// Upsert by id. Handles the group→supergroup migration (§3): the
  /// caller is expected to have already repointed child rows under a new
  /// id in the same transaction the application layer opens; this method
  /// just writes the Chat aggregate itself.
  async fn upsert(&self, chat: &Chat) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO chats
           (id, title, chat_type, sla_enabled, sla_threshold_minutes,
            monitoring_enabled, is_24x7, manager_ids, accountant_ids,
            notify_in_chat_on_breach, client_tier, invite_url, deleted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (id) DO UPDATE SET
           title = EXCLUDED.title,
           chat_type = EXCLUDED.chat_type,
           sla_enabled = EXCLUDED.sla_enabled,
           sla_threshold_minutes = EXCLUDED.sla_threshold_minutes,
           monitoring_enabled = EXCLUDED.monitoring_enabled,
           is_24x7 = EXCLUDED.is_24x7,
           manager_ids = EXCLUDED.manager_ids,
           accountant_ids = EXCLUDED.accountant_ids,
           notify_in_chat_on_breach = EXCLUDED.notify_in_chat_on_breach,
           client_tier = EXCLUDED.client_tier,
           invite_url = EXCLUDED.invite_url,
           deleted_at = EXCLUDED.deleted_at"#,
    )
    .bind(chat.id.0)
    .bind(&chat.title)
    .bind(chat.chat_type)
    .bind(chat.sla_enabled)
    .bind(chat.sla_threshold_minutes)
    .bind(chat.monitoring_enabled)
    .bind(chat.is_24x7)
    .bind(to_vec(&chat.manager_ids))
    .bind(to_vec(&chat.accountant_ids))
    .bind(chat.notify_in_chat_on_breach)
    .bind(chat.client_tier)
    .bind(&chat.invite_url)
    .bind(chat.deleted_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn list_monitored(&self) -> CoreResult<Vec<Chat>> {
    let rows = sqlx::query_as::<_, ChatRow>(
      r#"SELECT id, title, chat_type, sla_enabled, sla_threshold_minutes,
                monitoring_enabled, is_24x7, manager_ids, accountant_ids,
                notify_in_chat_on_breach, client_tier, invite_url, deleted_at
         FROM chats WHERE monitoring_enabled = true"#,
    )
    .fetch_all(&*self.pool)
    .await?;
    Ok(rows.into_iter().map(Chat::from).collect())
  }

  async fn migrate(&self, old_id: ChatId, new_chat: &Chat) -> CoreResult<()> {
    migrate_chat(&self.pool, old_id, new_chat).await
  }
}

/// Bulk-repoint all child rows (`client_requests`, `chat_messages`,
/// `feedback_responses`, `chat_invitations`) from an old chat id to a new
/// one, for the group→supergroup migration (§3, §9: "upsert plus bulk
/// repoint of child rows" — scenario S4). Runs in a single transaction so
/// the repoint is atomic with the upsert of the new `Chat` row and the
/// `[MIGRATED]`-prefixed retention of the old one.
pub async fn migrate_chat(pool: &PgPool, old_id: ChatId, new_chat: &Chat) -> CoreResult<()> {
  let mut tx = pool.begin().await?;

  sqlx::query(
    r#"INSERT INTO chats
         (id, title, chat_type, sla_enabled, sla_threshold_minutes,
          monitoring_enabled, is_24x7, manager_ids, accountant_ids,
          notify_in_chat_on_breach, client_tier, invite_url, deleted_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
       ON CONFLICT (id) DO UPDATE SET
         title = EXCLUDED.title, chat_type = EXCLUDED.chat_type,
         sla_enabled = EXCLUDED.sla_enabled,
         sla_threshold_minutes = EXCLUDED.sla_threshold_minutes,
         monitoring_enabled = EXCLUDED.monitoring_enabled,
         is_24x7 = EXCLUDED.is_24x7, manager_ids = EXCLUDED.manager_ids,
         accountant_ids = EXCLUDED.accountant_ids,
         notify_in_chat_on_breach = EXCLUDED.notify_in_chat_on_breach,
         client_tier = EXCLUDED.client_tier, invite_url = EXCLUDED.invite_url,
         deleted_at = EXCLUDED.deleted_at"#,
  )
  .bind(new_chat.id.0)
  .bind(&new_chat.title)
  .bind(new_chat.chat_type)
  .bind(new_chat.sla_enabled)
  .bind(new_chat.sla_threshold_minutes)
  .bind(new_chat.monitoring_enabled)
  .bind(new_chat.is_24x7)
  .bind(to_vec(&new_chat.manager_ids))
  .bind(to_vec(&new_chat.accountant_ids))
  .bind(new_chat.notify_in_chat_on_breach)
  .bind(new_chat.client_tier)
  .bind(&new_chat.invite_url)
  .bind(new_chat.deleted_at)
  .execute(&mut *tx)
  .await?;

  for table in ["client_requests", "chat_messages", "feedback_responses", "chat_invitations"] {
    sqlx::query(&format!("UPDATE {table} SET chat_id = $1 WHERE chat_id = $2"))
      .bind(new_chat.id.0)
      .bind(old_id.0)
      .execute(&mut *tx)
      .await?;
  }

  sqlx::query(
    r#"UPDATE chats SET title = '[MIGRATED] ' || title, monitoring_enabled = false, sla_enabled = false
       WHERE id = $1"#,
  )
  .bind(old_id.0)
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_vec_preserves_all_members_regardless_of_order() {
    let mut set = HashSet::new();
    set.insert("a".to_string());
    set.insert("b".to_string());
    let vec = to_vec(&set);
    assert_eq!(vec.len(), 2);
    assert!(vec.contains(&"a".to_string()));
    assert!(vec.contains(&"b".to_string()));
  }
}
