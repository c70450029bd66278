use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sla_core::contracts::FeedbackRepository as FeedbackRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::{ChatId, FeedbackId};
use sla_core::models::FeedbackResponse;

#[derive(FromRow)]
struct FeedbackRow {
  id: Uuid,
  chat_id: i64,
  rating: i32,
  comment: Option<String>,
  submitted_at: DateTime<Utc>,
}

impl From<FeedbackRow> for FeedbackResponse {
  fn from(row: FeedbackRow) -> Self {
    FeedbackResponse {
      id: FeedbackId(row.id),
      chat_id: ChatId(row.chat_id),
      rating: row.rating,
      comment: row.comment,
      submitted_at: row.submitted_at,
    }
  }
}

pub struct PgFeedbackRepository {
  pool: Arc<PgPool>,
}

impl PgFeedbackRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl FeedbackRepositoryPort for PgFeedbackRepository {
  async fn insert(&self, feedback: &FeedbackResponse) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO feedback_responses (id, chat_id, rating, comment, submitted_at)
         VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(feedback.id.0)
    .bind(feedback.chat_id.0)
    .bind(feedback.rating)
    .bind(&feedback.comment)
    .bind(feedback.submitted_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn find_by_id(&self, id: FeedbackId) -> CoreResult<Option<FeedbackResponse>> {
    let row = sqlx::query_as::<_, FeedbackRow>(
      "SELECT id, chat_id, rating, comment, submitted_at FROM feedback_responses WHERE id = $1",
    )
    .bind(id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(FeedbackResponse::from))
  }
}
