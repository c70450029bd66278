//! FAQ short-circuit matching (§4.1 step 3) and its in-process TTL cache.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::FaqItem;

/// Normalize text the same way for incoming messages and FAQ keywords:
/// lowercase, strip punctuation, collapse whitespace, split into tokens.
pub fn normalize_tokens(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .map(|s| s.to_string())
    .collect()
}

/// Score a message's tokens against one FAQ item's keywords: the count of
/// distinct keywords that substring-match any token, or vice versa.
pub fn score(message_tokens: &[String], keywords: &[String]) -> usize {
  let normalized_keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
  normalized_keywords
    .iter()
    .filter(|kw| {
      message_tokens
        .iter()
        .any(|tok| tok.contains(kw.as_str()) || kw.contains(tok.as_str()))
    })
    .count()
}

/// The best-matching FAQ item for a message, if any item scores ≥ 1.
/// Ties are broken by higher `usage_count` (§4.1 step 3).
pub fn best_match<'a>(message_text: &str, items: &'a [FaqItem]) -> Option<&'a FaqItem> {
  let tokens = normalize_tokens(message_text);
  items
    .iter()
    .filter(|item| item.active)
    .map(|item| (score(&tokens, &item.keywords), item))
    .filter(|(s, _)| *s >= 1)
    .max_by(|(sa, a), (sb, b)| sa.cmp(sb).then(a.usage_count.cmp(&b.usage_count)))
    .map(|(_, item)| item)
}

/// Per-process FAQ cache, refreshed on a 5 minute TTL and invalidated
/// eagerly on FAQ CRUD (§4.1 step 3). A read error while refreshing is
/// swallowed by the caller, which proceeds without the short-circuit.
pub struct FaqCache {
  ttl: Duration,
  state: RwLock<Option<(Instant, Vec<FaqItem>)>>,
}

impl FaqCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      state: RwLock::new(None),
    }
  }

  pub fn with_default_ttl() -> Self {
    Self::new(Duration::from_secs(5 * 60))
  }

  /// Items from the cache if still fresh, `None` if a refresh is needed.
  pub fn get_fresh(&self) -> Option<Vec<FaqItem>> {
    let guard = self.state.read().ok()?;
    match guard.as_ref() {
      Some((fetched_at, items)) if fetched_at.elapsed() < self.ttl => Some(items.clone()),
      _ => None,
    }
  }

  pub fn store(&self, items: Vec<FaqItem>) {
    if let Ok(mut guard) = self.state.write() {
      *guard = Some((Instant::now(), items));
    }
  }

  /// Invalidate immediately on FAQ CRUD, bypassing the TTL.
  pub fn invalidate(&self) {
    if let Ok(mut guard) = self.state.write() {
      *guard = None;
    }
  }
}

impl Default for FaqCache {
  fn default() -> Self {
    Self::with_default_ttl()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(question: &str, keywords: &[&str]) -> FaqItem {
    let mut f = FaqItem::new(
      question.to_string(),
      keywords.iter().map(|s| s.to_string()).collect(),
      "answer".to_string(),
    );
    f.active = true;
    f
  }

  #[test]
  fn normalize_tokens_strips_punctuation_and_lowercases() {
    let tokens = normalize_tokens("Когда срок сдачи декларации?");
    assert_eq!(tokens, vec!["когда", "срок", "сдачи", "декларации"]);
  }

  #[test]
  fn scenario_s6_faq_scores_two_and_wins() {
    let faq = item("Срок сдачи?", &["срок", "сдач"]);
    let tokens = normalize_tokens("Когда срок сдачи декларации?");
    assert_eq!(score(&tokens, &faq.keywords), 2);
  }

  #[test]
  fn best_match_picks_highest_score_then_usage_count() {
    let mut low_usage = item("Срок?", &["срок"]);
    low_usage.usage_count = 1;
    let mut high_usage = item("Срок?", &["срок"]);
    high_usage.usage_count = 99;
    let items = vec![low_usage, high_usage.clone()];

    let matched = best_match("какой срок", &items).unwrap();
    assert_eq!(matched.usage_count, 99);
  }

  #[test]
  fn inactive_items_are_never_matched() {
    let mut inactive = item("Срок?", &["срок"]);
    inactive.active = false;
    let items = vec![inactive];
    assert!(best_match("какой срок", &items).is_none());
  }

  #[test]
  fn score_below_one_is_no_match() {
    let faq = item("Оплата?", &["оплата", "счет"]);
    let items = vec![faq];
    assert!(best_match("привет как дела", &items).is_none());
  }

  #[test]
  fn cache_returns_none_until_stored_and_respects_ttl() {
    let cache = FaqCache::new(Duration::from_millis(20));
    assert!(cache.get_fresh().is_none());
    cache.store(vec![item("q", &["k"])]);
    assert!(cache.get_fresh().is_some());
    std::thread::sleep(Duration::from_millis(30));
    assert!(cache.get_fresh().is_none());
  }

  #[test]
  fn invalidate_bypasses_ttl_immediately() {
    let cache = FaqCache::with_default_ttl();
    cache.store(vec![item("q", &["k"])]);
    assert!(cache.get_fresh().is_some());
    cache.invalidate();
    assert!(cache.get_fresh().is_none());
  }
}
