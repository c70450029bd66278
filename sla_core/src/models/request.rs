use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Classification {
  Request,
  Spam,
  Gratitude,
  Clarification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum RequestStatus {
  Pending,
  InProgress,
  WaitingClient,
  Transferred,
  Answered,
  Escalated,
  Closed,
}

impl RequestStatus {
  /// Terminal states: no further timers may fire, no new Alerts may be
  /// inserted (§3 invariant (a), §8 property 3).
  pub fn is_terminal(self) -> bool {
    matches!(self, RequestStatus::Answered | RequestStatus::Closed)
  }
}

/// The canonical SLA unit: a client message that requires a human reply.
///
/// Invariants (§3):
/// (a) once terminal, no further timers may fire for this request;
/// (b) `sla_breached` is monotonic (false → true, never reset);
/// (c) `response_time_minutes`, once set, is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  pub id: RequestId,
  pub chat_id: ChatId,
  pub client_username: Option<String>,
  pub message_text: String,
  pub thread_id: Option<String>,
  pub classification: Classification,
  pub received_at: DateTime<Utc>,
  pub status: RequestStatus,
  pub sla_breached: bool,
  pub response_message_id: Option<i64>,
  pub response_time_minutes: Option<i64>,
  pub escalation_level: i32,
}

impl Request {
  pub fn new_pending(
    chat_id: ChatId,
    client_username: Option<String>,
    message_text: String,
    thread_id: Option<String>,
    received_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: RequestId::generate(),
      chat_id,
      client_username,
      message_text,
      thread_id,
      classification: Classification::Request,
      received_at,
      status: RequestStatus::Pending,
      sla_breached: false,
      response_message_id: None,
      response_time_minutes: None,
      escalation_level: 0,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.status.is_terminal()
  }

  /// Only `Classification::Request` creates an active SLA obligation (§3).
  pub fn opens_sla_obligation(&self) -> bool {
    matches!(self.classification, Classification::Request) && !self.is_terminal()
  }

  /// Mark the request breached. Monotonic: calling this twice is a no-op,
  /// never un-sets the flag.
  pub fn mark_breached(&mut self) {
    self.sla_breached = true;
  }

  /// Transition into `answered` from an accountant reply. Sets the
  /// immutable `response_time_minutes` exactly once.
  pub fn mark_answered(&mut self, response_message_id: i64, response_time_minutes: i64) {
    if self.response_time_minutes.is_none() {
      self.response_time_minutes = Some(response_time_minutes);
    }
    self.response_message_id = Some(response_message_id);
    self.status = RequestStatus::Answered;
  }

  pub fn mark_closed(&mut self) {
    self.status = RequestStatus::Closed;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample(classification: Classification) -> Request {
    let mut r = Request::new_pending(ChatId(1), Some("client".into()), "help".into(), None, Utc::now());
    r.classification = classification;
    r
  }

  #[test]
  fn only_request_classification_opens_sla_obligation() {
    assert!(sample(Classification::Request).opens_sla_obligation());
    assert!(!sample(Classification::Spam).opens_sla_obligation());
    assert!(!sample(Classification::Gratitude).opens_sla_obligation());
    assert!(!sample(Classification::Clarification).opens_sla_obligation());
  }

  #[test]
  fn response_time_minutes_is_immutable_once_set() {
    let mut r = sample(Classification::Request);
    r.mark_answered(42, 55);
    assert_eq!(r.response_time_minutes, Some(55));
    // A second (buggy) call must not overwrite it.
    r.mark_answered(43, 999);
    assert_eq!(r.response_time_minutes, Some(55));
    assert_eq!(r.response_message_id, Some(43));
  }

  #[test]
  fn sla_breached_is_monotonic() {
    let mut r = sample(Classification::Request);
    assert!(!r.sla_breached);
    r.mark_breached();
    assert!(r.sla_breached);
    // No operation resets it back to false.
    r.mark_breached();
    assert!(r.sla_breached);
  }

  #[test]
  fn terminal_states_are_answered_and_closed_only() {
    let mut r = sample(Classification::Request);
    assert!(!r.is_terminal());
    r.status = RequestStatus::Escalated;
    assert!(!r.is_terminal());
    r.mark_closed();
    assert!(r.is_terminal());
  }
}
