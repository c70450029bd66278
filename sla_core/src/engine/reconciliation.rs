//! Reconciliation sweep (§4.5): periodic recovery of orphaned pending
//! requests whose breach timer was lost (enqueue failure, process crash
//! between commit and enqueue — scenario S5).

use chrono::Utc;
use tracing::{info, warn};

use crate::engine::context::EngineContext;
use crate::engine::escalation::FireOutcome;
use crate::error::CoreResult;
use crate::models::{RequestStatus, TimerJob, TimerJobType, TimerPayload};

const RECONCILIATION_BATCH_SIZE: i64 = 500;
pub const RECONCILIATION_LOCK_NAME: &str = "sla-reconciliation";
pub const RECONCILIATION_LOCK_TTL_SECS: i64 = 300;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationReport {
  pub total_pending: u32,
  pub rescheduled: u32,
  pub breached: u32,
  pub already_active: u32,
  pub failed: u32,
}

impl EngineContext {
  /// Attempt to acquire the distributed lock and, if held, run one sweep.
  /// Returns `None` when another instance already holds the lock — that
  /// is the expected, common case, not an error (§4.2, §4.5).
  pub async fn try_reconcile(&self) -> CoreResult<Option<ReconciliationReport>> {
    let acquired = self
      .lock
      .try_acquire(RECONCILIATION_LOCK_NAME, chrono::Duration::seconds(RECONCILIATION_LOCK_TTL_SECS))
      .await?;
    if !acquired {
      return Ok(None);
    }
    let report = self.reconcile().await;
    self.lock.release(RECONCILIATION_LOCK_NAME).await?;
    report.map(Some)
  }

  async fn reconcile(&self) -> CoreResult<ReconciliationReport> {
    let mut report = ReconciliationReport::default();
    let open_requests = self.requests.list_open(RECONCILIATION_BATCH_SIZE).await?;
    let now = Utc::now();

    for request in open_requests {
      if !matches!(request.status, RequestStatus::Pending | RequestStatus::InProgress) {
        continue;
      }
      report.total_pending += 1;

      let Some(chat) = self.chats.find_by_id(request.chat_id).await? else {
        report.failed += 1;
        continue;
      };
      if !chat.sla_enabled {
        continue;
      }

      let breach_id = crate::models::timer_id(TimerJobType::Breach, request.id, 1);
      match self.timers.exists(&breach_id).await {
        Ok(true) => {
          report.already_active += 1;
          continue;
        }
        Ok(false) => {}
        Err(err) => {
          warn!(request_id = %request.id, %err, "reconciliation: timer existence check failed");
          report.failed += 1;
          continue;
        }
      }

      let threshold = chat.effective_threshold_minutes();
      let deadline = request.received_at + chrono::Duration::minutes(threshold as i64);

      if now >= deadline {
        match self.fire_breach(request.id).await {
          Ok(FireOutcome::Created { .. }) => report.breached += 1,
          Ok(FireOutcome::Dropped(_)) => report.already_active += 1,
          Err(err) => {
            warn!(request_id = %request.id, %err, "reconciliation: synthesized breach fire failed");
            report.failed += 1;
          }
        }
        continue;
      }

      let job = TimerJob {
        id: breach_id,
        job_type: TimerJobType::Breach,
        payload: TimerPayload {
          request_id: request.id,
          chat_id: chat.id,
          threshold_minutes: threshold,
          level: 1,
        },
        due_at: deadline,
      };
      match self.timers.schedule(job).await {
        Ok(()) => report.rescheduled += 1,
        Err(err) => {
          warn!(request_id = %request.id, %err, "reconciliation: reschedule failed, retried next tick");
          report.failed += 1;
        }
      }
    }

    info!(
      total_pending = report.total_pending,
      rescheduled = report.rescheduled,
      breached = report.breached,
      already_active = report.already_active,
      failed = report.failed,
      "reconciliation sweep complete"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn report_defaults_to_all_zero() {
    let report = ReconciliationReport::default();
    assert_eq!(report.total_pending, 0);
    assert_eq!(report.rescheduled, 0);
  }
}
