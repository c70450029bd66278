//! `POST /webhook/callback` (§6): routes the inline-keyboard callback
//! grammar centralized in `sla_core::engine::delivery::callback` to the
//! matching engine call, then acknowledges the tap.
//!
//! The adapter in front of this service normalizes a `callback_query`
//! update into the same `ChatEvent` shape as a message, carrying the
//! callback data in `text` and the id to acknowledge in
//! `callback_query_id` (see the doc comment on those fields).

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use sla_core::ids::{AlertId, FeedbackId};
use sla_core::models::event::{ChatEvent, ChatEventType};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "outcome")]
pub enum CallbackResponse {
  Resolved,
  AccountantNotified,
  AlertAlreadyResolved,
  FeedbackViewed { rating: i32, comment: Option<String> },
  Acknowledged,
  Ignored,
}

pub async fn callback_handler(
  State(state): State<AppState>,
  Json(event): Json<ChatEvent>,
) -> Result<Json<CallbackResponse>, AppError> {
  if event.event_type != ChatEventType::CallbackQuery {
    return Err(AppError::Validation("expected a callback_query event".into()));
  }
  let data = event.text.as_deref().unwrap_or_default();
  let ctx = state.ctx();

  let response = if let Some(id) = data.strip_prefix("resolve_") {
    let alert_id = parse_alert_id(id)?;
    ctx.resolve_by_manager(alert_id).await?;
    CallbackResponse::Resolved
  } else if let Some(id) = data.strip_prefix("notify_") {
    let alert_id = parse_alert_id(id)?;
    match ctx.notify_accountant(alert_id).await? {
      Some(job) => {
        state
          .delivery_tx()
          .send(job)
          .await
          .map_err(|_| AppError::Validation("delivery channel closed".into()))?;
        CallbackResponse::AccountantNotified
      }
      None => CallbackResponse::AlertAlreadyResolved,
    }
  } else if let Some(id) = data.strip_prefix("view_feedback_") {
    let feedback_id = parse_feedback_id(id)?;
    match ctx.feedback.find_by_id(feedback_id).await? {
      Some(feedback) => CallbackResponse::FeedbackViewed {
        rating: feedback.rating,
        comment: feedback.comment,
      },
      None => return Err(AppError::NotFound(format!("feedback {feedback_id} not found"))),
    }
  } else if data.starts_with("survey:rating:") || data.starts_with("template:") {
    // Survey submission goes through `POST /feedback` directly from the
    // client's reply keyboard (§4.7); the template admin flow is out of
    // scope. Both taps are just acknowledged.
    CallbackResponse::Acknowledged
  } else {
    CallbackResponse::Ignored
  };

  if let Some(callback_query_id) = &event.callback_query_id {
    let ack_text = match &response {
      CallbackResponse::Resolved => Some("Marked resolved"),
      CallbackResponse::AccountantNotified => Some("Accountant notified"),
      CallbackResponse::AlertAlreadyResolved => Some("Already resolved"),
      _ => None,
    };
    ctx.chat_api.answer_callback_query(callback_query_id, ack_text).await?;
  }

  Ok(Json(response))
}

fn parse_alert_id(raw: &str) -> Result<AlertId, AppError> {
  Uuid::parse_str(raw)
    .map(AlertId::new)
    .map_err(|_| AppError::Validation(format!("invalid alert id in callback data: {raw}")))
}

fn parse_feedback_id(raw: &str) -> Result<FeedbackId, AppError> {
  Uuid::parse_str(raw)
    .map(FeedbackId::new)
    .map_err(|_| AppError::Validation(format!("invalid feedback id in callback data: {raw}")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use sla_core::engine::delivery::callback;

  #[test]
  fn parse_alert_id_round_trips_through_the_notify_grammar() {
    let alert_id = AlertId::generate();
    let data = callback::notify(alert_id);
    let raw = data.strip_prefix("notify_").unwrap();
    assert_eq!(parse_alert_id(raw).unwrap(), alert_id);
  }

  #[test]
  fn parse_alert_id_rejects_garbage() {
    assert!(parse_alert_id("not-a-uuid").is_err());
  }

  #[test]
  fn parse_feedback_id_round_trips_through_the_view_feedback_grammar() {
    let feedback_id = FeedbackId::generate();
    let data = callback::view_feedback(feedback_id);
    let raw = data.strip_prefix("view_feedback_").unwrap();
    assert_eq!(parse_feedback_id(raw).unwrap(), feedback_id);
  }
}
