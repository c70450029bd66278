//! Timer-firing worker (§4.2, §4.3, §4.4): polls `TimerStore::poll_due`,
//! dispatches each due job to the matching `EngineContext::fire_*` handler,
//! and forwards any resulting `DeliveryJob` to the delivery worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, warn};

use sla_core::engine::delivery::DeliveryJob;
use sla_core::engine::escalation::FireOutcome;
use sla_core::engine::EngineContext;
use sla_core::models::timer_job::{TimerJob, TimerJobType};

/// Runs until the process exits. Each tick claims up to `batch_size` due
/// jobs and processes them concurrently, bounded by `concurrency` — a
/// crash mid-batch leaves the unfinished jobs claimed but not completed,
/// so they reappear once the claim's visibility timeout elapses.
pub async fn run(
  ctx: EngineContext,
  delivery_tx: mpsc::Sender<DeliveryJob>,
  poll_interval: Duration,
  batch_size: i64,
  concurrency: usize,
) {
  let semaphore = Arc::new(Semaphore::new(concurrency));
  let mut ticker = tokio::time::interval(poll_interval);

  loop {
    ticker.tick().await;
    let due = match ctx.timers.poll_due(chrono::Utc::now(), batch_size).await {
      Ok(jobs) => jobs,
      Err(err) => {
        warn!(%err, "timer poll failed, retrying next tick");
        continue;
      }
    };
    if due.is_empty() {
      continue;
    }
    debug!(count = due.len(), "claimed due timer jobs");

    let mut handles = Vec::with_capacity(due.len());
    for job in due {
      let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
      let ctx = ctx.clone();
      let delivery_tx = delivery_tx.clone();
      handles.push(tokio::spawn(async move {
        let _permit = permit;
        process_job(&ctx, job, &delivery_tx).await;
      }));
    }
    for handle in handles {
      if let Err(err) = handle.await {
        error!(%err, "timer job task panicked");
      }
    }
  }
}

async fn process_job(ctx: &EngineContext, job: TimerJob, delivery_tx: &mpsc::Sender<DeliveryJob>) {
  let job_id = job.id.clone();
  let outcome = match job.job_type {
    TimerJobType::Warning => ctx.fire_warning(job.payload.request_id).await,
    TimerJobType::Breach => ctx.fire_breach(job.payload.request_id).await,
    TimerJobType::Escalation => ctx.fire_escalation(job.payload.request_id, job.payload.level).await,
    TimerJobType::Reconcile => {
      // Reconciliation is driven by its own interval ticker
      // (`reconciliation::run`), never scheduled as a timer job; seeing one
      // here means a stale row from a prior schema, not a live code path.
      warn!(job_id = %job_id, "unexpected reconcile-type timer job, dropping");
      if let Err(err) = ctx.timers.complete(&job_id).await {
        error!(%err, job_id = %job_id, "failed to drop stale reconcile job");
      }
      return;
    }
  };

  let job_type_label = job_type_tag(job.job_type);
  match outcome {
    Ok(FireOutcome::Dropped(reason)) => {
      debug!(job_id = %job_id, reason, "timer fire dropped by idempotency guard");
      metrics::counter!("sla_timer_fires_dropped_total", "job_type" => job_type_label).increment(1);
      complete(ctx, &job_id).await;
    }
    Ok(FireOutcome::Created { alert_id, delivery }) => {
      debug!(job_id = %job_id, alert_id = %alert_id, "timer fire created an alert");
      metrics::counter!("sla_timer_fires_created_total", "job_type" => job_type_label).increment(1);
      if delivery_tx.send(delivery).await.is_err() {
        error!(job_id = %job_id, "delivery channel closed, alert will not be delivered this fire");
      }
      complete(ctx, &job_id).await;
    }
    Err(err) if err.is_retryable() => {
      warn!(%err, job_id = %job_id, "timer fire failed transiently, leaving claimed for redelivery");
    }
    Err(err) => {
      error!(%err, job_id = %job_id, "timer fire failed non-retryably, dropping job");
      metrics::counter!("sla_timer_fires_failed_total", "job_type" => job_type_label).increment(1);
      complete(ctx, &job_id).await;
    }
  }
}

fn job_type_tag(job_type: TimerJobType) -> &'static str {
  match job_type {
    TimerJobType::Warning => "warning",
    TimerJobType::Breach => "breach",
    TimerJobType::Escalation => "escalation",
    TimerJobType::Reconcile => "reconcile",
  }
}

async fn complete(ctx: &EngineContext, job_id: &str) {
  if let Err(err) = ctx.timers.complete(job_id).await {
    error!(%err, job_id, "failed to mark timer job complete");
  }
}
