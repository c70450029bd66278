//! Worker-pool layer: turns the durable timer queue and the engine's
//! pure-ish state transitions (`sla_core::engine`) into running background
//! loops. Each loop spawns a bounded pool of tasks fed by a channel,
//! adapted here to a polling timer queue instead of a pub/sub stream.

pub mod config;
pub mod delivery;
pub mod reconciliation;
pub mod retry;
pub mod settings_refresh;
pub mod timers;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sla_core::engine::delivery::DeliveryJob;
use sla_core::engine::EngineContext;

pub use config::WorkerConfig;

/// Handles to every background loop, so the host process (`sla_server`)
/// can join them on shutdown rather than leaking detached tasks.
pub struct WorkerHandles {
  pub timers: JoinHandle<()>,
  pub delivery: JoinHandle<()>,
  pub reconciliation: JoinHandle<()>,
  pub settings_refresh: JoinHandle<()>,
  /// Shared with the timer worker. The webhook handler also holds a clone
  /// so a low-rating `DeliveryJob` from `EngineContext::submit_feedback`
  /// (§4.7 survey path) enters the same delivery fabric as alert jobs.
  pub delivery_tx: mpsc::Sender<DeliveryJob>,
}

/// Spawn the full worker fleet: the timer-poll/fire loop, the delivery
/// loop it feeds, the periodic reconciliation sweep, and the periodic
/// settings refresh. Returns immediately; the loops run until their
/// `JoinHandle`s are dropped or the process exits.
pub fn spawn_all(ctx: EngineContext, config: WorkerConfig) -> WorkerHandles {
  let (delivery_tx, delivery_rx) = mpsc::channel::<DeliveryJob>(config.delivery_channel_capacity);

  let timers = tokio::spawn(timers::run(
    ctx.clone(),
    delivery_tx.clone(),
    config.timer_poll_interval,
    config.timer_batch_size,
    config.timer_concurrency,
  ));
  let delivery = tokio::spawn(delivery::run(ctx.clone(), delivery_rx, config.delivery_concurrency));
  let reconciliation = tokio::spawn(reconciliation::run(ctx.clone(), config.reconciliation_interval));
  let settings_refresh = tokio::spawn(settings_refresh::run(ctx, config.settings_refresh_interval));

  WorkerHandles {
    timers,
    delivery,
    reconciliation,
    settings_refresh,
    delivery_tx,
  }
}
