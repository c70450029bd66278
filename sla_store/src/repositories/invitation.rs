use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use sla_core::contracts::InvitationRepository as InvitationRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::ChatId;
use sla_core::models::ChatInvitation;

#[derive(FromRow)]
struct InvitationRow {
  chat_id: i64,
  token: String,
  created_at: DateTime<Utc>,
  revoked: bool,
}

impl From<InvitationRow> for ChatInvitation {
  fn from(row: InvitationRow) -> Self {
    ChatInvitation {
      chat_id: ChatId(row.chat_id),
      token: row.token,
      created_at: row.created_at,
      revoked: row.revoked,
    }
  }
}

pub struct PgInvitationRepository {
  pool: Arc<PgPool>,
}

impl PgInvitationRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InvitationRepositoryPort for PgInvitationRepository {
  async fn upsert(&self, invitation: &ChatInvitation) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO chat_invitations (chat_id, token, created_at, revoked)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (chat_id) DO UPDATE SET
           token = EXCLUDED.token, created_at = EXCLUDED.created_at, revoked = EXCLUDED.revoked"#,
    )
    .bind(invitation.chat_id.0)
    .bind(&invitation.token)
    .bind(invitation.created_at)
    .bind(invitation.revoked)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn find_active(&self, chat_id: ChatId) -> CoreResult<Option<ChatInvitation>> {
    let row = sqlx::query_as::<_, InvitationRow>(
      "SELECT chat_id, token, created_at, revoked FROM chat_invitations WHERE chat_id = $1 AND revoked = false",
    )
    .bind(chat_id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(ChatInvitation::from))
  }
}
