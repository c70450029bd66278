//! Per-loop concurrency and polling cadence (§4.2, §5). Defaults match the
//! "dedicated worker groups" table: sla-timers, escalations, alert-delivery
//! and surveys share a pool size of 5; reconciliation is single-flight by
//! construction (the distributed lock makes a second concurrent sweep a
//! no-op, so a pool of more than one buys nothing).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
  pub timer_poll_interval: Duration,
  pub timer_batch_size: i64,
  pub timer_concurrency: usize,
  pub delivery_channel_capacity: usize,
  pub delivery_concurrency: usize,
  pub reconciliation_interval: Duration,
  pub settings_refresh_interval: Duration,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      timer_poll_interval: Duration::from_secs(5),
      timer_batch_size: 100,
      timer_concurrency: 5,
      delivery_channel_capacity: 256,
      delivery_concurrency: 5,
      // §4.5: reconciliation runs "periodically, e.g. every 5 minutes".
      reconciliation_interval: Duration::from_secs(300),
      // §4.2: settings refresh "every 60s ... without a restart".
      settings_refresh_interval: Duration::from_secs(60),
    }
  }
}
