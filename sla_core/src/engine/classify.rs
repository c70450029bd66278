//! Three-layer classification (§4.1 step 5): result cache, AI classifier
//! behind a circuit breaker, deterministic keyword fallback.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::models::request::Classification;

/// SHA-256 hex digest of the normalized text, used as the classification
/// cache key (§4.1 step 5a). Normalization matches `engine::faq::normalize_tokens`
/// joined back with single spaces, so equivalent phrasing hits the cache.
pub fn cache_key(text: &str) -> String {
  let normalized = super::faq::normalize_tokens(text).join(" ");
  let mut hasher = Sha256::new();
  hasher.update(normalized.as_bytes());
  hex::encode(hasher.finalize())
}

pub const CLASSIFICATION_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Deterministic keyword classifier (§4.1 step 5c): Russian-language
/// patterns mapped to the four classes, priority-scored. Falls back to
/// `CLARIFICATION` with confidence 0.3 when nothing matches.
pub fn keyword_classify(text: &str) -> (Classification, f32) {
  let lower = text.to_lowercase();

  const SPAM_MARKERS: &[&str] = &["казино", "крипто", "заработ", "http://", "https://", "viagra"];
  const GRATITUDE_MARKERS: &[&str] = &["спасибо", "благодар", "супер", "отлично", "thanks"];
  const REQUEST_MARKERS: &[&str] = &[
    "срочно", "нужно", "помогите", "декларац", "отчет", "сдать", "когда", "можете", "прошу",
  ];

  // Priority order: spam first (highest cost of a false negative), then
  // gratitude (terminal, no obligation), then request, clarification last.
  if SPAM_MARKERS.iter().any(|m| lower.contains(m)) {
    return (Classification::Spam, 0.9);
  }
  if GRATITUDE_MARKERS.iter().any(|m| lower.contains(m)) {
    return (Classification::Gratitude, 0.8);
  }
  if REQUEST_MARKERS.iter().any(|m| lower.contains(m)) {
    return (Classification::Request, 0.6);
  }
  (Classification::Clarification, 0.3)
}

const AI_CONFIDENCE_FLOOR: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
  Closed,
  Open,
  HalfOpen,
}

/// Circuit breaker around the external AI classifier: opens after 5
/// consecutive failures, half-opens after 60s, closes after 2 consecutive
/// successes in the half-open state (§4.1 step 5b).
pub struct CircuitBreaker {
  state: Mutex<BreakerInner>,
}

struct BreakerInner {
  status: BreakerState,
  consecutive_failures: u32,
  consecutive_successes: u32,
  opened_at: Option<Instant>,
}

const FAILURE_THRESHOLD: u32 = 5;
const SUCCESS_THRESHOLD: u32 = 2;
const OPEN_COOLDOWN: Duration = Duration::from_secs(60);

impl CircuitBreaker {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(BreakerInner {
        status: BreakerState::Closed,
        consecutive_failures: 0,
        consecutive_successes: 0,
        opened_at: None,
      }),
    }
  }

  /// Whether a call should be attempted right now. Transitions Open →
  /// HalfOpen once the cooldown elapses.
  pub fn allow_request(&self) -> bool {
    let mut inner = self.state.lock().expect("breaker mutex poisoned");
    match inner.status {
      BreakerState::Closed | BreakerState::HalfOpen => true,
      BreakerState::Open => {
        if inner.opened_at.map(|t| t.elapsed() >= OPEN_COOLDOWN).unwrap_or(false) {
          inner.status = BreakerState::HalfOpen;
          inner.consecutive_successes = 0;
          true
        } else {
          false
        }
      }
    }
  }

  pub fn record_success(&self) {
    let mut inner = self.state.lock().expect("breaker mutex poisoned");
    inner.consecutive_failures = 0;
    match inner.status {
      BreakerState::HalfOpen => {
        inner.consecutive_successes += 1;
        if inner.consecutive_successes >= SUCCESS_THRESHOLD {
          inner.status = BreakerState::Closed;
          inner.opened_at = None;
        }
      }
      BreakerState::Open => {
        // A stray success while open (race) is ignored; the half-open
        // probe governs the transition.
      }
      BreakerState::Closed => {}
    }
  }

  pub fn record_failure(&self) {
    let mut inner = self.state.lock().expect("breaker mutex poisoned");
    inner.consecutive_successes = 0;
    match inner.status {
      BreakerState::Closed => {
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= FAILURE_THRESHOLD {
          inner.status = BreakerState::Open;
          inner.opened_at = Some(Instant::now());
        }
      }
      BreakerState::HalfOpen => {
        inner.status = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
        inner.consecutive_failures = 0;
      }
      BreakerState::Open => {}
    }
  }
}

impl Default for CircuitBreaker {
  fn default() -> Self {
    Self::new()
  }
}

/// Decide whether an AI classifier's verdict should be trusted, or whether
/// the keyword fallback must run instead (§4.1 step 5: "if AI confidence <
/// 0.7 or AI path open, fall back").
pub fn should_fall_back_to_keywords(breaker: &CircuitBreaker, ai_confidence: Option<f32>) -> bool {
  if !breaker.allow_request() {
    return true;
  }
  match ai_confidence {
    Some(c) => c < AI_CONFIDENCE_FLOOR,
    None => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cache_key_is_stable_across_whitespace_variation() {
    let a = cache_key("Когда   срок сдачи?");
    let b = cache_key("когда срок сдачи");
    assert_eq!(a, b);
  }

  #[test]
  fn keyword_classifier_flags_spam_with_high_priority() {
    let (c, conf) = keyword_classify("Заработай миллион на крипто!");
    assert_eq!(c, Classification::Spam);
    assert!(conf > 0.5);
  }

  #[test]
  fn keyword_classifier_flags_gratitude() {
    let (c, _) = keyword_classify("Спасибо большое за помощь!");
    assert_eq!(c, Classification::Gratitude);
  }

  #[test]
  fn keyword_classifier_flags_request() {
    let (c, _) = keyword_classify("Срочно нужно сдать декларацию");
    assert_eq!(c, Classification::Request);
  }

  #[test]
  fn keyword_classifier_defaults_to_clarification_with_low_confidence() {
    let (c, conf) = keyword_classify("просто случайный текст без маркеров");
    assert_eq!(c, Classification::Clarification);
    assert_eq!(conf, 0.3);
  }

  #[test]
  fn circuit_breaker_opens_after_five_consecutive_failures() {
    let breaker = CircuitBreaker::new();
    for _ in 0..5 {
      assert!(breaker.allow_request());
      breaker.record_failure();
    }
    assert!(!breaker.allow_request());
  }

  #[test]
  fn circuit_breaker_closes_after_two_half_open_successes() {
    let breaker = CircuitBreaker::new();
    for _ in 0..5 {
      breaker.record_failure();
    }
    assert!(!breaker.allow_request());

    {
      let mut inner = breaker.state.lock().unwrap();
      inner.opened_at = Some(Instant::now() - OPEN_COOLDOWN - Duration::from_secs(1));
    }
    assert!(breaker.allow_request()); // transitions to half-open
    breaker.record_success();
    breaker.record_success();
    assert!(breaker.allow_request());
    // Closed again: failures reset, so a single failure should not re-open.
    breaker.record_failure();
    assert!(breaker.allow_request());
  }

  #[test]
  fn half_open_failure_reopens_the_breaker() {
    let breaker = CircuitBreaker::new();
    for _ in 0..5 {
      breaker.record_failure();
    }
    {
      let mut inner = breaker.state.lock().unwrap();
      inner.status = BreakerState::HalfOpen;
      inner.opened_at = Some(Instant::now());
    }
    breaker.record_failure();
    assert!(!breaker.allow_request());
  }

  #[test]
  fn low_confidence_ai_result_falls_back_to_keywords() {
    let breaker = CircuitBreaker::new();
    assert!(should_fall_back_to_keywords(&breaker, Some(0.5)));
    assert!(!should_fall_back_to_keywords(&breaker, Some(0.95)));
  }

  #[test]
  fn open_breaker_always_falls_back() {
    let breaker = CircuitBreaker::new();
    for _ in 0..5 {
      breaker.record_failure();
    }
    assert!(should_fall_back_to_keywords(&breaker, Some(0.99)));
  }
}
