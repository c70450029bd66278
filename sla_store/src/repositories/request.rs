use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sla_core::contracts::RequestRepository as RequestRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::{ChatId, RequestId};
use sla_core::models::request::{Classification, Request, RequestStatus};

#[derive(FromRow)]
struct RequestRow {
  id: Uuid,
  chat_id: i64,
  client_username: Option<String>,
  message_text: String,
  thread_id: Option<String>,
  classification: Classification,
  received_at: DateTime<Utc>,
  status: RequestStatus,
  sla_breached: bool,
  response_message_id: Option<i64>,
  response_time_minutes: Option<i64>,
  escalation_level: i32,
}

impl From<RequestRow> for Request {
  fn from(row: RequestRow) -> Self {
    Request {
      id: RequestId(row.id),
      chat_id: ChatId(row.chat_id),
      client_username: row.client_username,
      message_text: row.message_text,
      thread_id: row.thread_id,
      classification: row.classification,
      received_at: row.received_at,
      status: row.status,
      sla_breached: row.sla_breached,
      response_message_id: row.response_message_id,
      response_time_minutes: row.response_time_minutes,
      escalation_level: row.escalation_level,
    }
  }
}

const SELECT_COLUMNS: &str = r#"id, chat_id, client_username, message_text, thread_id,
  classification, received_at, status, sla_breached, response_message_id,
  response_time_minutes, escalation_level"#;

pub struct PgRequestRepository {
  pool: Arc<PgPool>,
}

impl PgRequestRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl RequestRepositoryPort for PgRequestRepository {
  async fn insert(&self, request: &Request) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO client_requests
           (id, chat_id, client_username, message_text, thread_id, classification,
            received_at, status, sla_breached, response_message_id,
            response_time_minutes, escalation_level)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
    )
    .bind(request.id.0)
    .bind(request.chat_id.0)
    .bind(&request.client_username)
    .bind(&request.message_text)
    .bind(&request.thread_id)
    .bind(request.classification)
    .bind(request.received_at)
    .bind(request.status)
    .bind(request.sla_breached)
    .bind(request.response_message_id)
    .bind(request.response_time_minutes)
    .bind(request.escalation_level)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn find_by_id(&self, id: RequestId) -> CoreResult<Option<Request>> {
    let row = sqlx::query_as::<_, RequestRow>(&format!(
      "SELECT {SELECT_COLUMNS} FROM client_requests WHERE id = $1"
    ))
    .bind(id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(Request::from))
  }

  async fn find_open_by_thread(&self, chat_id: ChatId, thread_id: Option<&str>) -> CoreResult<Option<Request>> {
    let row = if let Some(tid) = thread_id {
      sqlx::query_as::<_, RequestRow>(&format!(
        r#"SELECT {SELECT_COLUMNS} FROM client_requests
           WHERE chat_id = $1 AND thread_id = $2
             AND status NOT IN ('answered', 'closed')
           ORDER BY received_at ASC LIMIT 1"#
      ))
      .bind(chat_id.0)
      .bind(tid)
      .fetch_optional(&*self.pool)
      .await?
    } else {
      None
    };

    if row.is_some() {
      return Ok(row.map(Request::from));
    }

    // Fall back to FIFO: oldest open request for the chat (§4.6 step 1).
    let fallback = sqlx::query_as::<_, RequestRow>(&format!(
      r#"SELECT {SELECT_COLUMNS} FROM client_requests
         WHERE chat_id = $1 AND status NOT IN ('answered', 'closed')
         ORDER BY received_at ASC LIMIT 1"#
    ))
    .bind(chat_id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(fallback.map(Request::from))
  }

  async fn update(&self, request: &Request) -> CoreResult<()> {
    sqlx::query(
      r#"UPDATE client_requests SET
           status = $2, sla_breached = $3, response_message_id = $4,
           response_time_minutes = $5, escalation_level = $6
         WHERE id = $1"#,
    )
    .bind(request.id.0)
    .bind(request.status)
    .bind(request.sla_breached)
    .bind(request.response_message_id)
    .bind(request.response_time_minutes)
    .bind(request.escalation_level)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn list_open(&self, limit: i64) -> CoreResult<Vec<Request>> {
    let rows = sqlx::query_as::<_, RequestRow>(&format!(
      r#"SELECT {SELECT_COLUMNS} FROM client_requests
         WHERE status IN ('pending', 'in_progress')
         ORDER BY received_at ASC LIMIT $1"#
    ))
    .bind(limit)
    .fetch_all(&*self.pool)
    .await?;
    Ok(rows.into_iter().map(Request::from).collect())
  }
}
