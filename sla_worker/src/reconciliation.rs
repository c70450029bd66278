//! Periodic reconciliation tick (§4.5, §4.2). Every worker replica runs
//! this loop; the distributed lock in `EngineContext::try_reconcile`
//! ensures only one of them actually sweeps on a given tick.

use std::time::Duration;

use tracing::{error, info};

use sla_core::engine::EngineContext;

pub async fn run(ctx: EngineContext, interval: Duration) {
  let mut ticker = tokio::time::interval(interval);
  loop {
    ticker.tick().await;
    match ctx.try_reconcile().await {
      Ok(Some(report)) => {
        info!(
          total_pending = report.total_pending,
          rescheduled = report.rescheduled,
          breached = report.breached,
          failed = report.failed,
          "reconciliation tick complete"
        );
        metrics::gauge!("sla_reconciliation_last_total_pending").set(report.total_pending as f64);
        metrics::gauge!("sla_reconciliation_last_failed").set(report.failed as f64);
      }
      Ok(None) => {
        // Another replica holds the lock this tick — expected, not logged
        // above debug to avoid log spam across a multi-replica fleet.
      }
      Err(err) => error!(%err, "reconciliation tick failed"),
    }
  }
}
