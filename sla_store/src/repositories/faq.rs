use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sla_core::contracts::FaqRepository as FaqRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::ids::FaqItemId;
use sla_core::models::FaqItem;

#[derive(FromRow)]
struct FaqRow {
  id: Uuid,
  question: String,
  keywords: Vec<String>,
  answer: String,
  usage_count: i64,
  active: bool,
  updated_at: DateTime<Utc>,
}

impl From<FaqRow> for FaqItem {
  fn from(row: FaqRow) -> Self {
    FaqItem {
      id: FaqItemId(row.id),
      question: row.question,
      keywords: row.keywords,
      answer: row.answer,
      usage_count: row.usage_count,
      active: row.active,
      updated_at: row.updated_at,
    }
  }
}

pub struct PgFaqRepository {
  pool: Arc<PgPool>,
}

impl PgFaqRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl FaqRepositoryPort for PgFaqRepository {
  async fn list_active(&self) -> CoreResult<Vec<FaqItem>> {
    let rows = sqlx::query_as::<_, FaqRow>(
      "SELECT id, question, keywords, answer, usage_count, active, updated_at FROM faq_items WHERE active = true",
    )
    .fetch_all(&*self.pool)
    .await?;
    Ok(rows.into_iter().map(FaqItem::from).collect())
  }

  async fn find_by_id(&self, id: FaqItemId) -> CoreResult<Option<FaqItem>> {
    let row = sqlx::query_as::<_, FaqRow>(
      "SELECT id, question, keywords, answer, usage_count, active, updated_at FROM faq_items WHERE id = $1",
    )
    .bind(id.0)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(FaqItem::from))
  }

  async fn record_usage(&self, id: FaqItemId) -> CoreResult<()> {
    sqlx::query("UPDATE faq_items SET usage_count = usage_count + 1, updated_at = now() WHERE id = $1")
      .bind(id.0)
      .execute(&*self.pool)
      .await?;
    Ok(())
  }
}
