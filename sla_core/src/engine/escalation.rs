//! Escalation state machine (§4.3, §4.4) and accountant-reply / manager
//! resolution (§4.6). Each handler re-loads the `Request`, re-checks the
//! idempotency/terminal-state guard under what the caller treats as a
//! single transaction, then mutates state and enqueues delivery.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::engine::context::EngineContext;
use crate::engine::delivery::DeliveryJob;
use crate::error::{CoreError, CoreResult};
use crate::ids::{AlertId, RequestId};
use crate::models::{Alert, ResolvedAction, TimerJob, TimerJobType, TimerPayload};

/// Result of processing one timer firing: the alert that was created (if
/// any — duplicates are dropped) and the delivery job to enqueue.
#[derive(Debug)]
pub enum FireOutcome {
  /// A logical precondition dropped the firing: the request is already
  /// terminal, or an alert already exists at this level (§7).
  Dropped(&'static str),
  Created {
    alert_id: AlertId,
    delivery: DeliveryJob,
  },
}

#[derive(Debug)]
pub struct ReplyOutcome {
  pub request_id: Option<RequestId>,
  pub response_time_minutes: Option<i64>,
}

impl EngineContext {
  /// Warning timer fire (§4.3).
  pub async fn fire_warning(&self, request_id: RequestId) -> CoreResult<FireOutcome> {
    let Some(request) = self.requests.find_by_id(request_id).await? else {
      return Ok(FireOutcome::Dropped("request not found"));
    };
    if request.is_terminal() {
      return Ok(FireOutcome::Dropped("request terminal"));
    }
    if self.alerts.find_unresolved(request_id, 0).await?.is_some() {
      return Ok(FireOutcome::Dropped("warning alert already exists"));
    }

    let Some(chat) = self.chats.find_by_id(request.chat_id).await? else {
      return Ok(FireOutcome::Dropped("chat not found"));
    };
    let settings = self.settings();
    let minutes_elapsed = (Utc::now() - request.received_at).num_minutes();
    let recipients: Vec<String> = chat.primary_recipients(&settings.global_manager_ids).iter().cloned().collect();
    if recipients.is_empty() {
      warn!(request_id = %request_id, "warning fire: no recipients resolved at any tier");
    }

    let alert = Alert::new_warning(request_id, minutes_elapsed, recipients.clone());
    self.alerts.insert(&alert).await?;

    Ok(FireOutcome::Created {
      alert_id: alert.id,
      delivery: DeliveryJob::for_alert(&alert, &chat),
    })
  }

  /// Breach timer fire (§4.3).
  pub async fn fire_breach(&self, request_id: RequestId) -> CoreResult<FireOutcome> {
    let Some(mut request) = self.requests.find_by_id(request_id).await? else {
      return Ok(FireOutcome::Dropped("request not found"));
    };
    if request.is_terminal() || request.escalation_level >= 1 {
      return Ok(FireOutcome::Dropped("request terminal or already escalated"));
    }
    if self.alerts.find_unresolved(request_id, 1).await?.is_some() {
      return Ok(FireOutcome::Dropped("breach alert already exists"));
    }

    let Some(chat) = self.chats.find_by_id(request.chat_id).await? else {
      return Ok(FireOutcome::Dropped("chat not found"));
    };
    let settings = self.settings();
    let minutes_elapsed = (Utc::now() - request.received_at).num_minutes();
    let recipients: Vec<String> = chat.primary_recipients(&settings.global_manager_ids).iter().cloned().collect();
    if recipients.is_empty() {
      warn!(request_id = %request_id, "breach fire: no recipients resolved at any tier");
    }

    let next_level = 2;
    let next_escalation_at = if next_level <= settings.max_escalation_level {
      Some(Utc::now() + chrono::Duration::minutes(settings.escalation_interval_minutes as i64))
    } else {
      None
    };

    request.mark_breached();
    request.status = crate::models::RequestStatus::Escalated;
    request.escalation_level = 1;
    let alert = Alert::new_breach(request_id, minutes_elapsed, recipients.clone(), next_escalation_at);

    // Single transaction in the persistence layer: status update + alert
    // insert commit together (§4.3 step 2).
    self.requests.update(&request).await?;
    self.alerts.insert(&alert).await?;

    if chat.notify_in_chat_on_breach {
      if let Err(err) = self
        .chat_api
        .send_message(chat.id, "SLA breach: this request is overdue for a reply.", None)
        .await
      {
        warn!(%err, request_id = %request_id, "in-chat breach notification failed, continuing");
      }
    }

    if let Some(due_at) = next_escalation_at {
      self.schedule_escalation(request_id, chat.id, next_level, due_at).await;
    }

    Ok(FireOutcome::Created {
      alert_id: alert.id,
      delivery: DeliveryJob::for_alert(&alert, &chat),
    })
  }

  /// Escalation timer fire for `level` (§4.4 "Processing an escalation
  /// job"). `level` is the level being transitioned *into*.
  pub async fn fire_escalation(&self, request_id: RequestId, level: i32) -> CoreResult<FireOutcome> {
    let Some(mut request) = self.requests.find_by_id(request_id).await? else {
      return Ok(FireOutcome::Dropped("request not found"));
    };
    if request.is_terminal() {
      return Ok(FireOutcome::Dropped("request terminal"));
    }
    if self.alerts.find_unresolved(request_id, level).await?.is_some() {
      return Ok(FireOutcome::Dropped("escalation alert already exists at this level"));
    }
    if level - 1 != request.escalation_level {
      // The latest alert has already moved past this level (a race with a
      // manual resolution or a duplicate firing); drop.
      return Ok(FireOutcome::Dropped("escalation level already advanced past this job"));
    }

    let Some(chat) = self.chats.find_by_id(request.chat_id).await? else {
      return Ok(FireOutcome::Dropped("chat not found"));
    };
    let settings = self.settings();
    let minutes_elapsed = (Utc::now() - request.received_at).num_minutes();
    let recipients: Vec<String> = chat.escalation_recipients(&settings.global_manager_ids).into_iter().collect();
    if recipients.is_empty() {
      warn!(request_id = %request_id, level, "escalation fire: no recipients resolved at any tier");
    }

    let next_level = level + 1;
    let at_max = level >= settings.max_escalation_level;
    let next_escalation_at = if at_max {
      None
    } else {
      Some(Utc::now() + chrono::Duration::minutes(settings.escalation_interval_minutes as i64))
    };

    let mut alert = Alert::new_escalation(request_id, level, minutes_elapsed, recipients.clone(), next_escalation_at);
    if at_max {
      alert.resolve(ResolvedAction::AutoExpired);
      info!(request_id = %request_id, level, "escalation reached max level, auto-expired");
    }

    request.escalation_level = level;
    self.requests.update(&request).await?;
    self.alerts.insert(&alert).await?;

    if let Some(due_at) = next_escalation_at {
      self.schedule_escalation(request_id, chat.id, next_level, due_at).await;
    }

    Ok(FireOutcome::Created {
      alert_id: alert.id,
      delivery: DeliveryJob::for_alert(&alert, &chat),
    })
  }

  async fn schedule_escalation(&self, request_id: RequestId, chat_id: crate::ids::ChatId, level: i32, due_at: chrono::DateTime<Utc>) {
    let job = TimerJob {
      id: crate::models::timer_id(TimerJobType::Escalation, request_id, level),
      job_type: TimerJobType::Escalation,
      payload: TimerPayload {
        request_id,
        chat_id,
        threshold_minutes: 0,
        level,
      },
      due_at,
    };
    // `schedule` on an already-existing id is a dedup no-op (§4.4).
    if let Err(err) = self.timers.schedule(job).await {
      warn!(request_id = %request_id, level, %err, "failed to schedule next escalation");
    }
  }

  /// Accountant reply resolves the oldest open Request for the chat
  /// (§4.6). Returns `request_id: None` when there was nothing open — the
  /// reply is then just a normal stored chat message.
  pub async fn handle_accountant_reply(
    &self,
    chat: &crate::models::Chat,
    event: &crate::models::event::ChatEvent,
    received_at: chrono::DateTime<Utc>,
  ) -> CoreResult<ReplyOutcome> {
    let Some(mut request) = self.requests.find_open_by_thread(chat.id, None).await? else {
      return Ok(ReplyOutcome {
        request_id: None,
        response_time_minutes: None,
      });
    };

    let response_time_minutes = (received_at - request.received_at).num_minutes().max(0);
    request.mark_answered(event.message_id, response_time_minutes);

    // Cancel the synchronous step happens before commit so a racing timer
    // fire still observes a consistent (if slightly stale) world and the
    // idempotency guard on its own reload catches the terminal state
    // (§5 "Cancellation").
    self.timers.cancel_all_for_request(request.id).await?;
    self.requests.update(&request).await?;
    self.resolve_open_alerts(request.id, ResolvedAction::AccountantResponded).await?;

    info!(request_id = %request.id, response_time_minutes, "request answered by accountant reply");

    Ok(ReplyOutcome {
      request_id: Some(request.id),
      response_time_minutes: Some(response_time_minutes),
    })
  }

  /// Manager clicks `notify_{alertId}` (§6 callback grammar: "send
  /// reminder to accountant"). Re-renders and re-sends the same Alert's
  /// message without creating a new Alert row or touching escalation
  /// state — a manual nudge, not a state transition.
  pub async fn notify_accountant(&self, alert_id: AlertId) -> CoreResult<Option<DeliveryJob>> {
    let Some(alert) = self.alerts.find_by_id(alert_id).await? else {
      return Err(CoreError::NotFound(format!("alert {alert_id} not found")));
    };
    if alert.is_resolved() {
      debug!(alert_id = %alert_id, "notify_accountant dropped: alert already resolved");
      return Ok(None);
    }
    let Some(request) = self.requests.find_by_id(alert.request_id).await? else {
      return Ok(None);
    };
    let Some(chat) = self.chats.find_by_id(request.chat_id).await? else {
      return Ok(None);
    };
    Ok(Some(DeliveryJob::for_alert(&alert, &chat)))
  }

  /// Manager clicks `resolve_{alertId}` (§4.4 transitions table: "manager
  /// mark_resolved").
  pub async fn resolve_by_manager(&self, alert_id: AlertId) -> CoreResult<()> {
    let Some(alert) = self.alerts.find_by_id(alert_id).await? else {
      return Err(CoreError::NotFound(format!("alert {alert_id} not found")));
    };
    let Some(mut request) = self.requests.find_by_id(alert.request_id).await? else {
      return Err(CoreError::NotFound(format!("request {} not found", alert.request_id)));
    };
    if request.is_terminal() {
      debug!(request_id = %request.id, "manager resolution dropped: request already terminal");
      return Ok(());
    }

    request.mark_closed();
    self.timers.cancel_all_for_request(request.id).await?;
    self.requests.update(&request).await?;
    self.resolve_open_alerts(request.id, ResolvedAction::MarkResolved).await?;
    Ok(())
  }

  async fn resolve_open_alerts(&self, request_id: RequestId, action: ResolvedAction) -> CoreResult<()> {
    for mut alert in self.alerts.list_unresolved_for_request(request_id).await? {
      alert.resolve(action);
      self.alerts.update(&alert).await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fire_outcome_dropped_carries_a_reason() {
    let outcome = FireOutcome::Dropped("request terminal");
    match outcome {
      FireOutcome::Dropped(reason) => assert_eq!(reason, "request terminal"),
      _ => panic!("expected Dropped"),
    }
  }
}
