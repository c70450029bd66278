//! `POST /webhook/chat-event` (§6): the core's one inbound surface. Thin
//! and unauthenticated at this layer — the adapter in front of this
//! service owns authentication, per the Non-goals in §1 and §6.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use sla_core::engine::ingestion::IngestOutcome;
use sla_core::models::event::ChatEvent;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "outcome")]
pub enum WebhookResponse {
  FaqHandled { faq_item_id: String },
  RequestOpened { request_id: String },
  Recorded { classification: String },
  AccountantReply { request_id: Option<String>, response_time_minutes: Option<i64> },
  MemberUpdate,
  EditApplied,
  ChatMigrated { old_id: String, new_id: String },
}

impl From<IngestOutcome> for WebhookResponse {
  fn from(outcome: IngestOutcome) -> Self {
    match outcome {
      IngestOutcome::FaqHandled { faq_item_id } => WebhookResponse::FaqHandled {
        faq_item_id: faq_item_id.to_string(),
      },
      IngestOutcome::RequestOpened(request) => WebhookResponse::RequestOpened {
        request_id: request.id.to_string(),
      },
      IngestOutcome::Recorded(classification) => WebhookResponse::Recorded {
        classification: format!("{classification:?}"),
      },
      IngestOutcome::AccountantReply(reply) => WebhookResponse::AccountantReply {
        request_id: reply.request_id.map(|id| id.to_string()),
        response_time_minutes: reply.response_time_minutes,
      },
      IngestOutcome::MemberUpdate => WebhookResponse::MemberUpdate,
      IngestOutcome::EditApplied => WebhookResponse::EditApplied,
      IngestOutcome::ChatMigrated { old_id, new_id } => WebhookResponse::ChatMigrated {
        old_id: old_id.to_string(),
        new_id: new_id.to_string(),
      },
    }
  }
}

pub async fn chat_event_handler(
  State(state): State<AppState>,
  Json(event): Json<ChatEvent>,
) -> Result<Json<WebhookResponse>, AppError> {
  let outcome = state.ctx().handle_event(event).await?;
  Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use sla_core::ids::RequestId;
  use sla_core::models::Classification;

  #[test]
  fn recorded_outcome_carries_the_classification() {
    let response: WebhookResponse = IngestOutcome::Recorded(Classification::Spam).into();
    match response {
      WebhookResponse::Recorded { classification } => assert_eq!(classification, "Spam"),
      other => panic!("unexpected response: {other:?}"),
    }
  }

  #[test]
  fn accountant_reply_with_no_open_request_carries_none() {
    let reply = sla_core::engine::escalation::ReplyOutcome {
      request_id: None,
      response_time_minutes: None,
    };
    let response: WebhookResponse = IngestOutcome::AccountantReply(Box::new(reply)).into();
    match response {
      WebhookResponse::AccountantReply { request_id, response_time_minutes } => {
        assert!(request_id.is_none());
        assert!(response_time_minutes.is_none());
      }
      other => panic!("unexpected response: {other:?}"),
    }
  }

  #[test]
  fn accountant_reply_with_an_open_request_carries_its_id() {
    let request_id = RequestId::generate();
    let reply = sla_core::engine::escalation::ReplyOutcome {
      request_id: Some(request_id),
      response_time_minutes: Some(12),
    };
    let response: WebhookResponse = IngestOutcome::AccountantReply(Box::new(reply)).into();
    match response {
      WebhookResponse::AccountantReply { request_id: Some(id), response_time_minutes: Some(12) } => {
        assert_eq!(id, request_id.to_string());
      }
      other => panic!("unexpected response: {other:?}"),
    }
  }
}
