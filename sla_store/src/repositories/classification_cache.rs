use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use sla_core::contracts::ClassificationCacheRepository as ClassificationCacheRepositoryPort;
use sla_core::error::CoreResult;
use sla_core::models::ClassificationCacheEntry;

#[derive(FromRow)]
struct CacheRow {
  cache_key: String,
  classification: sla_core::models::Classification,
  confidence: f32,
  created_at: DateTime<Utc>,
}

impl From<CacheRow> for ClassificationCacheEntry {
  fn from(row: CacheRow) -> Self {
    ClassificationCacheEntry {
      cache_key: row.cache_key,
      classification: row.classification,
      confidence: row.confidence,
      created_at: row.created_at,
    }
  }
}

pub struct PgClassificationCacheRepository {
  pool: Arc<PgPool>,
}

impl PgClassificationCacheRepository {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ClassificationCacheRepositoryPort for PgClassificationCacheRepository {
  /// Returns whatever is stored, expired or not — the 24h TTL is enforced
  /// by the caller (`EngineContext::classify`), not here, matching the
  /// teacher's pattern of keeping expiry policy in the domain layer.
  async fn get(&self, cache_key: &str) -> CoreResult<Option<ClassificationCacheEntry>> {
    let row = sqlx::query_as::<_, CacheRow>(
      "SELECT cache_key, classification, confidence, created_at FROM classification_cache WHERE cache_key = $1",
    )
    .bind(cache_key)
    .fetch_optional(&*self.pool)
    .await?;
    Ok(row.map(ClassificationCacheEntry::from))
  }

  async fn put(&self, entry: &ClassificationCacheEntry) -> CoreResult<()> {
    sqlx::query(
      r#"INSERT INTO classification_cache (cache_key, classification, confidence, created_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (cache_key) DO UPDATE SET
           classification = EXCLUDED.classification,
           confidence = EXCLUDED.confidence,
           created_at = EXCLUDED.created_at"#,
    )
    .bind(&entry.cache_key)
    .bind(entry.classification)
    .bind(entry.confidence)
    .bind(entry.created_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }
}
