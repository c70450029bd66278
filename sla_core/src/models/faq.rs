use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::FaqItemId;

/// A canned answer the ingestion pipeline can match against before ever
/// invoking the classifier (§4.1 step 3). `keywords` are normalized the
/// same way incoming messages are (see `engine::faq::normalize`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
  pub id: FaqItemId,
  pub question: String,
  pub keywords: Vec<String>,
  pub answer: String,
  pub usage_count: i64,
  pub active: bool,
  pub updated_at: DateTime<Utc>,
}

impl FaqItem {
  pub fn new(question: String, keywords: Vec<String>, answer: String) -> Self {
    Self {
      id: FaqItemId::generate(),
      question,
      keywords,
      answer,
      usage_count: 0,
      active: true,
      updated_at: Utc::now(),
    }
  }

  pub fn record_usage(&mut self) {
    self.usage_count += 1;
    self.updated_at = Utc::now();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_usage_increments_counter() {
    let mut item = FaqItem::new("q".into(), vec!["a".into()], "answer".into());
    item.record_usage();
    item.record_usage();
    assert_eq!(item.usage_count, 2);
  }
}
