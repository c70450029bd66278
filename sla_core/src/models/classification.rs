use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::Classification;

/// A cached classifier verdict, keyed by the SHA-256 hex digest of the
/// normalized message text (`engine::classify::cache_key`). Entries older
/// than 24h are treated as expired by the repository layer rather than
/// deleted eagerly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationCacheEntry {
  pub cache_key: String,
  pub classification: Classification,
  pub confidence: f32,
  pub created_at: DateTime<Utc>,
}

impl ClassificationCacheEntry {
  pub fn new(cache_key: String, classification: Classification, confidence: f32) -> Self {
    Self {
      cache_key,
      classification,
      confidence,
      created_at: Utc::now(),
    }
  }

  pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
    now - self.created_at > ttl
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn entry_expires_after_ttl() {
    let mut entry = ClassificationCacheEntry::new("key".into(), Classification::Request, 0.9);
    entry.created_at = Utc::now() - Duration::hours(25);
    assert!(entry.is_expired(Utc::now(), Duration::hours(24)));
  }

  #[test]
  fn entry_within_ttl_is_not_expired() {
    let entry = ClassificationCacheEntry::new("key".into(), Classification::Request, 0.9);
    assert!(!entry.is_expired(Utc::now(), Duration::hours(24)));
  }
}
