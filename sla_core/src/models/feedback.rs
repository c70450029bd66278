use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, FeedbackId};

/// A post-interaction survey response. Ratings at or below
/// `GlobalSettings::low_rating_threshold` trigger a low-rating alert that
/// reuses the delivery fabric but never touches the `Request` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
  pub id: FeedbackId,
  pub chat_id: ChatId,
  pub rating: i32,
  pub comment: Option<String>,
  pub submitted_at: DateTime<Utc>,
}

impl FeedbackResponse {
  pub fn new(chat_id: ChatId, rating: i32, comment: Option<String>) -> Self {
    Self {
      id: FeedbackId::generate(),
      chat_id,
      rating: rating.clamp(1, 5),
      comment,
      submitted_at: Utc::now(),
    }
  }

  pub fn is_low_rating(&self, threshold: i32) -> bool {
    self.rating <= threshold
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn low_rating_detection_respects_threshold() {
    let f = FeedbackResponse::new(ChatId(1), 2, None);
    assert!(f.is_low_rating(3));
    assert!(!f.is_low_rating(1));
  }

  #[test]
  fn rating_is_clamped_to_valid_range() {
    let too_high = FeedbackResponse::new(ChatId(1), 9, None);
    let too_low = FeedbackResponse::new(ChatId(1), -3, None);
    assert_eq!(too_high.rating, 5);
    assert_eq!(too_low.rating, 1);
  }
}
