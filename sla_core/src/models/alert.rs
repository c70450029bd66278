use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AlertId, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AlertType {
  Warning,
  Breach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum DeliveryStatus {
  Pending,
  Delivered,
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ResolvedAction {
  MarkResolved,
  AccountantResponded,
  AutoExpired,
}

/// One escalation event attached to a `Request`.
///
/// Uniqueness invariant (§3): at most one non-resolved Alert exists per
/// `(request_id, alert_type, escalation_level)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  pub id: AlertId,
  pub request_id: RequestId,
  pub alert_type: AlertType,
  pub minutes_elapsed: i64,
  pub escalation_level: i32,
  pub recipient_ids: Vec<String>,
  pub delivery_status: DeliveryStatus,
  pub next_escalation_at: Option<DateTime<Utc>>,
  pub resolved_action: Option<ResolvedAction>,
  pub created_at: DateTime<Utc>,
}

impl Alert {
  pub fn new_warning(request_id: RequestId, minutes_elapsed: i64, recipient_ids: Vec<String>) -> Self {
    Self {
      id: AlertId::generate(),
      request_id,
      alert_type: AlertType::Warning,
      minutes_elapsed,
      escalation_level: 0,
      recipient_ids,
      delivery_status: DeliveryStatus::Pending,
      next_escalation_at: None,
      resolved_action: None,
      created_at: Utc::now(),
    }
  }

  pub fn new_breach(
    request_id: RequestId,
    minutes_elapsed: i64,
    recipient_ids: Vec<String>,
    next_escalation_at: Option<DateTime<Utc>>,
  ) -> Self {
    Self {
      id: AlertId::generate(),
      request_id,
      alert_type: AlertType::Breach,
      minutes_elapsed,
      escalation_level: 1,
      recipient_ids,
      delivery_status: DeliveryStatus::Pending,
      next_escalation_at,
      resolved_action: None,
      created_at: Utc::now(),
    }
  }

  pub fn new_escalation(
    request_id: RequestId,
    level: i32,
    minutes_elapsed: i64,
    recipient_ids: Vec<String>,
    next_escalation_at: Option<DateTime<Utc>>,
  ) -> Self {
    Self {
      id: AlertId::generate(),
      request_id,
      alert_type: AlertType::Breach,
      minutes_elapsed,
      escalation_level: level,
      recipient_ids,
      delivery_status: DeliveryStatus::Pending,
      next_escalation_at,
      resolved_action: None,
      created_at: Utc::now(),
    }
  }

  pub fn is_resolved(&self) -> bool {
    self.resolved_action.is_some()
  }

  pub fn resolve(&mut self, action: ResolvedAction) {
    if self.resolved_action.is_none() {
      self.resolved_action = Some(action);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn warning_alert_is_level_zero() {
    let alert = Alert::new_warning(RequestId::generate(), 48, vec!["acct1".into()]);
    assert_eq!(alert.escalation_level, 0);
    assert_eq!(alert.alert_type, AlertType::Warning);
    assert!(!alert.is_resolved());
  }

  #[test]
  fn breach_alert_is_level_one() {
    let alert = Alert::new_breach(RequestId::generate(), 60, vec!["acct1".into()], None);
    assert_eq!(alert.escalation_level, 1);
    assert_eq!(alert.alert_type, AlertType::Breach);
  }

  #[test]
  fn resolve_is_idempotent_first_writer_wins() {
    let mut alert = Alert::new_breach(RequestId::generate(), 60, vec![], None);
    alert.resolve(ResolvedAction::AccountantResponded);
    alert.resolve(ResolvedAction::MarkResolved);
    assert_eq!(alert.resolved_action, Some(ResolvedAction::AccountantResponded));
  }
}
