use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum TimerJobType {
  Warning,
  Breach,
  Escalation,
  Reconcile,
}

impl TimerJobType {
  fn tag(self) -> &'static str {
    match self {
      TimerJobType::Warning => "warning",
      TimerJobType::Breach => "breach",
      TimerJobType::Escalation => "escalation",
      TimerJobType::Reconcile => "reconcile",
    }
  }
}

/// Payload carried by a durable timer job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerPayload {
  pub request_id: RequestId,
  pub chat_id: ChatId,
  pub threshold_minutes: i32,
  pub level: i32,
}

/// A durable delayed task. The `id` is deterministic so that `schedule`
/// with the same id is idempotent (first-wins) and `cancel` is always
/// safe to call twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerJob {
  pub id: String,
  pub job_type: TimerJobType,
  pub payload: TimerPayload,
  pub due_at: DateTime<Utc>,
}

/// Build the deterministic id `sla:{type}:{request_id}:{level}` described
/// in §3. This is the sole place the id format is constructed so that
/// ingestion, firing handlers, and reconciliation never drift apart.
pub fn timer_id(job_type: TimerJobType, request_id: RequestId, level: i32) -> String {
  format!("sla:{}:{}:{}", job_type.tag(), request_id.0, level)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timer_id_format_matches_spec() {
    let rid = RequestId::generate();
    let id = timer_id(TimerJobType::Breach, rid, 1);
    assert_eq!(id, format!("sla:breach:{}:1", rid.0));
  }

  #[test]
  fn timer_ids_differ_by_type_and_level() {
    let rid = RequestId::generate();
    let warning = timer_id(TimerJobType::Warning, rid, 0);
    let breach = timer_id(TimerJobType::Breach, rid, 1);
    let escalation2 = timer_id(TimerJobType::Escalation, rid, 2);
    let escalation3 = timer_id(TimerJobType::Escalation, rid, 3);
    assert_ne!(warning, breach);
    assert_ne!(escalation2, escalation3);
  }
}
