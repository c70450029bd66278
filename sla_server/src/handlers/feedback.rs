//! `POST /feedback` (§4.7 "Low-rating path"): the post-interaction survey
//! submission surface. Separate from the chat-event webhook because the
//! client's rating tap is answered inline by the adapter and only the
//! resulting value needs to reach the engine.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sla_core::ids::ChatId;
use sla_core::models::FeedbackResponse;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
  pub chat_id: i64,
  pub rating: i32,
  pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitFeedbackResponse {
  pub feedback_id: String,
  pub alert_enqueued: bool,
}

pub async fn submit_feedback_handler(
  State(state): State<AppState>,
  Json(request): Json<SubmitFeedbackRequest>,
) -> Result<Json<SubmitFeedbackResponse>, AppError> {
  let feedback = FeedbackResponse::new(ChatId(request.chat_id), request.rating, request.comment);
  let feedback_id = feedback.id;

  let job = state.ctx().submit_feedback(feedback).await?;
  let alert_enqueued = if let Some(job) = job {
    state
      .delivery_tx()
      .send(job)
      .await
      .map_err(|_| AppError::Validation("delivery channel closed".into()))?;
    true
  } else {
    false
  };

  Ok(Json(SubmitFeedbackResponse {
    feedback_id: feedback_id.to_string(),
    alert_enqueued,
  }))
}
