use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};

use sla_core::contracts::TimerStore;
use sla_core::error::CoreResult;
use sla_core::ids::RequestId;
use sla_core::models::{TimerJob, TimerJobType, TimerPayload};

/// A claim is invalidated after this long without completion, so a
/// crashed worker's in-flight job becomes pollable again (§5: timers
/// survive a crash, not just a clean shutdown).
const CLAIM_VISIBILITY_TIMEOUT: Duration = Duration::minutes(5);

#[derive(FromRow)]
struct JobRow {
  id: String,
  job_type: TimerJobType,
  payload: serde_json::Value,
  due_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for TimerJob {
  type Error = serde_json::Error;

  fn try_from(row: JobRow) -> Result<Self, Self::Error> {
    let payload: TimerPayload = serde_json::from_value(row.payload)?;
    Ok(TimerJob {
      id: row.id,
      job_type: row.job_type,
      payload,
      due_at: row.due_at,
    })
  }
}

/// Relational `due_at` table with a polling reaper, per design note §9.
/// Schedule is idempotent by id (first-wins): a second `schedule` call
/// with the same deterministic id is a silent no-op, never updating the
/// `due_at` of the row already on file.
pub struct PgTimerStore {
  pool: Arc<PgPool>,
}

impl PgTimerStore {
  pub fn new(pool: Arc<PgPool>) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl TimerStore for PgTimerStore {
  async fn schedule(&self, job: TimerJob) -> CoreResult<()> {
    let payload = serde_json::to_value(&job.payload)?;
    sqlx::query(
      r#"INSERT INTO sla_timer_jobs (id, job_type, payload, due_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (id) DO NOTHING"#,
    )
    .bind(&job.id)
    .bind(job.job_type)
    .bind(payload)
    .bind(job.due_at)
    .execute(&*self.pool)
    .await?;
    Ok(())
  }

  async fn exists(&self, job_id: &str) -> CoreResult<bool> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM sla_timer_jobs WHERE id = $1")
      .bind(job_id)
      .fetch_optional(&*self.pool)
      .await?;
    Ok(row.is_some())
  }

  async fn cancel(&self, job_id: &str) -> CoreResult<()> {
    sqlx::query("DELETE FROM sla_timer_jobs WHERE id = $1")
      .bind(job_id)
      .execute(&*self.pool)
      .await?;
    Ok(())
  }

  /// Deletes every job type scoped to a request, including all escalation
  /// levels (the id embeds the level, so this matches on payload rather
  /// than id prefix — §4.6 step 4: "warning, breach, all
  /// escalation levels 2..max").
  async fn cancel_all_for_request(&self, request_id: RequestId) -> CoreResult<()> {
    sqlx::query("DELETE FROM sla_timer_jobs WHERE payload->>'request_id' = $1")
      .bind(request_id.0.to_string())
      .execute(&*self.pool)
      .await?;
    Ok(())
  }

  async fn poll_due(&self, now: DateTime<Utc>, limit: i64) -> CoreResult<Vec<TimerJob>> {
    let visible_before = now - CLAIM_VISIBILITY_TIMEOUT;
    let rows: Vec<JobRow> = sqlx::query_as(
      r#"UPDATE sla_timer_jobs
         SET claimed_at = $1
         WHERE id IN (
           SELECT id FROM sla_timer_jobs
           WHERE due_at <= $1 AND (claimed_at IS NULL OR claimed_at < $2)
           ORDER BY due_at ASC
           LIMIT $3
           FOR UPDATE SKIP LOCKED
         )
         RETURNING id, job_type, payload, due_at"#,
    )
    .bind(now)
    .bind(visible_before)
    .bind(limit)
    .fetch_all(&*self.pool)
    .await?;

    rows
      .into_iter()
      .map(|row| TimerJob::try_from(row).map_err(Into::into))
      .collect()
  }

  async fn complete(&self, job_id: &str) -> CoreResult<()> {
    sqlx::query("DELETE FROM sla_timer_jobs WHERE id = $1")
      .bind(job_id)
      .execute(&*self.pool)
      .await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  // Claim-visibility and the `due_at <= now` ordering are exercised
  // against a live Postgres instance in integration tests — `FOR UPDATE
  // SKIP LOCKED` semantics are not unit-testable without a database.
}
