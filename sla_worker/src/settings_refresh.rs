//! Periodic settings refresh (§4.2): re-reads `global_settings`
//! on an interval so an operator's change takes effect across every
//! running replica within one tick, without a restart.

use std::time::Duration;

use tracing::warn;

use sla_core::engine::EngineContext;

pub async fn run(ctx: EngineContext, interval: Duration) {
  let mut ticker = tokio::time::interval(interval);
  loop {
    ticker.tick().await;
    if let Err(err) = ctx.refresh_settings().await {
      // A failed refresh keeps serving the previous snapshot, per
      // `EngineContext::settings` — this is never fatal to the process.
      warn!(%err, "settings refresh failed, continuing with stale snapshot");
      metrics::counter!("sla_settings_refresh_failures_total").increment(1);
    }
  }
}
