//! Low-rating feedback alerting (§4.7 "Low-rating path", §8 scenario S7).
//! A parallel, simpler alert path: it shares the delivery fabric but never
//! touches the `Request` table.

use tracing::info;

use crate::engine::context::EngineContext;
use crate::engine::delivery::DeliveryJob;
use crate::error::CoreResult;
use crate::models::FeedbackResponse;

impl EngineContext {
  /// Record a survey response and, if the rating is at or below the
  /// configured threshold, build the delivery job for chat managers union
  /// global managers.
  pub async fn submit_feedback(&self, feedback: FeedbackResponse) -> CoreResult<Option<DeliveryJob>> {
    self.feedback.insert(&feedback).await?;

    let settings = self.settings();
    if !feedback.is_low_rating(settings.low_rating_threshold) {
      return Ok(None);
    }

    let mut recipients = settings.global_manager_ids.clone();
    if let Some(chat) = self.chats.find_by_id(feedback.chat_id).await? {
      recipients.extend(chat.manager_ids.iter().cloned());
    }

    if recipients.is_empty() {
      info!(feedback_id = %feedback.id, "low-rating alert has no resolvable recipients");
    }

    Ok(Some(DeliveryJob::for_low_rating(&feedback, recipients.into_iter().collect())))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ids::ChatId;

  #[test]
  fn low_rating_feedback_never_references_a_request() {
    let feedback = FeedbackResponse::new(ChatId(1), 2, Some("slow reply".into()));
    assert!(feedback.is_low_rating(3));
    // FeedbackResponse has no request_id field at all — the type system
    // enforces the "never touches the Request table" invariant.
    let _: crate::ids::FeedbackId = feedback.id;
  }
}
