//! Process-wide application state: the single `EngineContext` (design
//! note §9) plus the delivery channel the webhook handlers share with the
//! worker fleet. `Arc<Inner>`-wrapped so cloning `AppState` into every
//! handler is cheap.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::info;

use sla_chatapi::{HttpAiClassifier, HttpChatApi};
use sla_core::engine::delivery::DeliveryJob;
use sla_core::engine::EngineContext;
use sla_store::{
  run_migrations, PgAlertRepository, PgChatRepository, PgClassificationCacheRepository,
  PgFaqRepository, PgFeedbackRepository, PgInvitationRepository, PgMessageRepository,
  PgRequestRepository, PgSettingsRepository, PostgresLock,
};
use sla_timers::PgTimerStore;
use sla_worker::WorkerHandles;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
  inner: Arc<AppStateInner>,
}

struct AppStateInner {
  ctx: EngineContext,
  pool: Arc<PgPool>,
  delivery_tx: mpsc::Sender<DeliveryJob>,
  // Held for the process lifetime so the worker loops keep running; never
  // read again, hence the allow.
  #[allow(dead_code)]
  worker_handles: WorkerHandles,
}

impl AppState {
  pub fn ctx(&self) -> &EngineContext {
    &self.inner.ctx
  }

  pub fn pool(&self) -> &PgPool {
    &self.inner.pool
  }

  pub fn delivery_tx(&self) -> &mpsc::Sender<DeliveryJob> {
    &self.inner.delivery_tx
  }

  /// Build the full dependency graph: connect the pool, run migrations,
  /// wire every repository/adapter behind the engine's port traits, then
  /// spawn the worker fleet (§4.2, §5).
  pub async fn try_new(config: &AppConfig) -> Result<Self> {
    let database_url = config.database_url()?;
    let pool = Arc::new(sla_store::connect(&database_url).await?);
    run_migrations(&pool).await?;
    info!("database migrations applied");

    let chat_api = Arc::new(HttpChatApi::new(config.chat_api.resolve()?)?);
    let classifier = Arc::new(HttpAiClassifier::new(config.classifier.resolve()?)?);

    let ctx = EngineContext::new(
      Arc::new(PgChatRepository::new(pool.clone())),
      Arc::new(PgRequestRepository::new(pool.clone())),
      Arc::new(PgAlertRepository::new(pool.clone())),
      Arc::new(PgSettingsRepository::new(pool.clone())),
      Arc::new(PgFeedbackRepository::new(pool.clone())),
      Arc::new(PgFaqRepository::new(pool.clone())),
      Arc::new(PgClassificationCacheRepository::new(pool.clone())),
      Arc::new(PgMessageRepository::new(pool.clone())),
      Arc::new(PgInvitationRepository::new(pool.clone())),
      Arc::new(PgTimerStore::new(pool.clone())),
      Arc::new(PostgresLock::new(pool.clone())),
      chat_api,
      classifier,
    );
    ctx.refresh_settings().await?;

    let worker_handles = sla_worker::spawn_all(ctx.clone(), config.worker.clone().into_worker_config());
    let delivery_tx = worker_handles.delivery_tx.clone();

    Ok(Self {
      inner: Arc::new(AppStateInner {
        ctx,
        pool,
        delivery_tx,
        worker_handles,
      }),
    })
  }
}
