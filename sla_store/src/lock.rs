//! Postgres-backed `DistributedLock` (design note §9: "the distributed
//! lock is a compare-and-set with expiry"). Backs the single-active-
//! reconciler guarantee (§4.2, §4.5) without a Redis dependency.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use sla_core::contracts::DistributedLock;
use sla_core::error::CoreResult;

pub struct PostgresLock {
  pool: Arc<PgPool>,
}

impl PostgresLock {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl DistributedLock for PostgresLock {
  /// Acquire via upsert: a fresh row wins outright; a stale (expired)
  /// lease is reclaimed; a live lease held by anyone else is left alone
  /// and reported as a failed acquisition. The `WHERE` clause on the
  /// conflict action is what makes this a compare-and-set rather than an
  /// unconditional overwrite.
  async fn try_acquire(&self, name: &str, ttl: Duration) -> CoreResult<bool> {
    let now = Utc::now();
    let expires_at = now + ttl;
    let result = sqlx::query(
      r#"INSERT INTO distributed_locks (name, expires_at)
         VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE SET expires_at = EXCLUDED.expires_at
         WHERE distributed_locks.expires_at < $3"#,
    )
    .bind(name)
    .bind(expires_at)
    .bind(now)
    .execute(&*self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn release(&self, name: &str) -> CoreResult<()> {
    sqlx::query("DELETE FROM distributed_locks WHERE name = $1")
      .bind(name)
      .execute(&*self.pool)
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  // Compare-and-set correctness is exercised against a live Postgres
  // instance in `sla_store`'s integration tests, not here: the `WHERE
  // expires_at < $3` race is not meaningfully unit-testable without a
  // database.
}
