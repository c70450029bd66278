//! In-process sliding-window rate limiter enforcing the chat platform's
//! global outbound ceiling (§6: "≈ 30 messages/second global; the core
//! must not exceed it"). Per-process, not distributed — acceptable per
//! §5 "(iv) an in-memory rate limiter... defense-in-depth, not a
//! correctness constraint."

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::time::sleep;

pub struct RateLimiter {
  max_per_window: usize,
  window: Duration,
  timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
  pub fn new(max_per_window: usize, window: Duration) -> Self {
    Self {
      max_per_window,
      window,
      timestamps: Mutex::new(VecDeque::with_capacity(max_per_window)),
    }
  }

  /// The provider's global send ceiling: ~30 messages/second (§6).
  pub fn provider_default() -> Self {
    Self::new(30, Duration::from_secs(1))
  }

  /// Block until a slot in the sliding window is free, then reserve it.
  pub async fn acquire(&self) {
    loop {
      let wait = {
        let mut timestamps = self.timestamps.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        while let Some(&front) = timestamps.front() {
          if now.duration_since(front) >= self.window {
            timestamps.pop_front();
          } else {
            break;
          }
        }
        if timestamps.len() < self.max_per_window {
          timestamps.push_back(now);
          None
        } else {
          let oldest = *timestamps.front().expect("len checked above");
          Some(self.window - now.duration_since(oldest))
        }
      };

      match wait {
        None => return,
        Some(duration) => sleep(duration).await,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn allows_bursts_up_to_the_window_limit_without_blocking() {
    let limiter = RateLimiter::new(3, Duration::from_millis(200));
    let start = Instant::now();
    for _ in 0..3 {
      limiter.acquire().await;
    }
    assert!(start.elapsed() < Duration::from_millis(50));
  }

  #[tokio::test]
  async fn the_fourth_acquire_within_the_window_waits() {
    let limiter = RateLimiter::new(2, Duration::from_millis(100));
    limiter.acquire().await;
    limiter.acquire().await;
    let start = Instant::now();
    limiter.acquire().await;
    assert!(start.elapsed() >= Duration::from_millis(80));
  }
}
