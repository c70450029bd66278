//! The single context value threaded into every handler and worker
//! (design note §9: "inject explicit collaborator handles through a
//! single context value"). Holds the port trait objects plus the two
//! process-local, correctness-non-critical caches (FAQ cache, classifier
//! circuit breaker).

use std::sync::{Arc, RwLock};

use crate::contracts::{
  AlertRepository, ChatApi, ChatRepository, Classifier, ClassificationCacheRepository,
  DistributedLock, FaqRepository, FeedbackRepository, InvitationRepository, MessageRepository,
  RequestRepository, SettingsRepository, TimerStore,
};
use crate::engine::classify::CircuitBreaker;
use crate::engine::faq::FaqCache;
use crate::error::CoreResult;
use crate::models::GlobalSettings;

#[derive(Clone)]
pub struct EngineContext {
  pub chats: Arc<dyn ChatRepository>,
  pub requests: Arc<dyn RequestRepository>,
  pub alerts: Arc<dyn AlertRepository>,
  pub settings_repo: Arc<dyn SettingsRepository>,
  pub feedback: Arc<dyn FeedbackRepository>,
  pub faq_repo: Arc<dyn FaqRepository>,
  pub classification_cache: Arc<dyn ClassificationCacheRepository>,
  pub messages: Arc<dyn MessageRepository>,
  pub invitations: Arc<dyn InvitationRepository>,
  pub timers: Arc<dyn TimerStore>,
  pub lock: Arc<dyn DistributedLock>,
  pub chat_api: Arc<dyn ChatApi>,
  pub classifier: Arc<dyn Classifier>,
  pub faq_cache: Arc<FaqCache>,
  pub breaker: Arc<CircuitBreaker>,
  settings_cache: Arc<RwLock<GlobalSettings>>,
}

#[allow(clippy::too_many_arguments)]
impl EngineContext {
  pub fn new(
    chats: Arc<dyn ChatRepository>,
    requests: Arc<dyn RequestRepository>,
    alerts: Arc<dyn AlertRepository>,
    settings_repo: Arc<dyn SettingsRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    faq_repo: Arc<dyn FaqRepository>,
    classification_cache: Arc<dyn ClassificationCacheRepository>,
    messages: Arc<dyn MessageRepository>,
    invitations: Arc<dyn InvitationRepository>,
    timers: Arc<dyn TimerStore>,
    lock: Arc<dyn DistributedLock>,
    chat_api: Arc<dyn ChatApi>,
    classifier: Arc<dyn Classifier>,
  ) -> Self {
    Self {
      chats,
      requests,
      alerts,
      settings_repo,
      feedback,
      faq_repo,
      classification_cache,
      messages,
      invitations,
      timers,
      lock,
      chat_api,
      classifier,
      faq_cache: Arc::new(FaqCache::with_default_ttl()),
      breaker: Arc::new(CircuitBreaker::new()),
      settings_cache: Arc::new(RwLock::new(GlobalSettings::default())),
    }
  }

  /// A cheap, in-memory snapshot of the singleton settings row. Callers on
  /// the hot path read this instead of hitting the database per event.
  pub fn settings(&self) -> GlobalSettings {
    self
      .settings_cache
      .read()
      .expect("settings cache lock poisoned")
      .clone()
  }

  /// Re-read `global_settings` from the repository and refresh the
  /// in-memory snapshot. Called at startup and on a periodic timer
  /// (§4.2: "every 60s ... without a restart").
  pub async fn refresh_settings(&self) -> CoreResult<()> {
    let fresh = self.settings_repo.load().await?;
    *self.settings_cache.write().expect("settings cache lock poisoned") = fresh;
    Ok(())
  }

  /// FAQ items from the in-process cache, refreshing from the repository
  /// on a miss. A repository error on refresh is swallowed by the caller
  /// of `faq_items`, per §4.1: "FAQ cache read error → proceed without
  /// the short-circuit."
  pub async fn faq_items(&self) -> Vec<crate::models::FaqItem> {
    if let Some(items) = self.faq_cache.get_fresh() {
      return items;
    }
    match self.faq_repo.list_active().await {
      Ok(items) => {
        self.faq_cache.store(items.clone());
        items
      }
      Err(_) => Vec::new(),
    }
  }
}
