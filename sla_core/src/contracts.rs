//! Port traits the engine depends on. Implementations live in
//! `sla_store` (Postgres), `sla_timers` (durable scheduler), and
//! `sla_chatapi` (HTTP client to the chat platform) — this crate never
//! depends on any of them, only on these interfaces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::ids::{AlertId, ChatId, FaqItemId, FeedbackId, RequestId};
use crate::models::{
  Alert, ChatInvitation, ChatMessage, Classification, ClassificationCacheEntry, FaqItem,
  FeedbackResponse, GlobalSettings, Request,
};
use crate::models::chat::Chat;
use crate::models::timer_job::{TimerJob, TimerJobType};

#[async_trait]
pub trait ChatRepository: Send + Sync {
  async fn find_by_id(&self, id: ChatId) -> CoreResult<Option<Chat>>;
  async fn upsert(&self, chat: &Chat) -> CoreResult<()>;
  async fn list_monitored(&self) -> CoreResult<Vec<Chat>>;
  /// Group→supergroup migration (§3, §8 scenario S4): upsert `new_chat`
  /// under its (new) id, bulk-repoint every child row (`client_requests`,
  /// `chat_messages`, `feedback_responses`, `chat_invitations`) from
  /// `old_id` to it, and retain the old `Chat` row with its title
  /// `[MIGRATED]`-prefixed and monitoring disabled, all as one transaction.
  async fn migrate(&self, old_id: ChatId, new_chat: &Chat) -> CoreResult<()>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
  async fn insert(&self, request: &Request) -> CoreResult<()>;
  async fn find_by_id(&self, id: RequestId) -> CoreResult<Option<Request>>;
  /// The open (non-terminal) request to resolve for an accountant reply
  /// (§4.6). With `thread_id` set, prefers a thread-exact match; with
  /// `None`, returns the oldest open request for the chat (FIFO — §4.6
  /// step 1, §8 scenario S3).
  async fn find_open_by_thread(&self, chat_id: ChatId, thread_id: Option<&str>) -> CoreResult<Option<Request>>;
  async fn update(&self, request: &Request) -> CoreResult<()>;
  /// Requests still open, for the reconciliation sweep (§4.5).
  async fn list_open(&self, limit: i64) -> CoreResult<Vec<Request>>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
  async fn insert(&self, alert: &Alert) -> CoreResult<()>;
  async fn find_by_id(&self, id: AlertId) -> CoreResult<Option<Alert>>;
  /// Enforces the uniqueness invariant: at most one unresolved alert per
  /// `(request_id, alert_type, escalation_level)`.
  async fn find_unresolved(
    &self,
    request_id: RequestId,
    escalation_level: i32,
  ) -> CoreResult<Option<Alert>>;
  /// Every unresolved alert for a request, across all levels — used to
  /// resolve the whole chain on accountant reply / manager action (§4.6).
  async fn list_unresolved_for_request(&self, request_id: RequestId) -> CoreResult<Vec<Alert>>;
  async fn update(&self, alert: &Alert) -> CoreResult<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
  async fn load(&self) -> CoreResult<GlobalSettings>;
  async fn save(&self, settings: &GlobalSettings) -> CoreResult<()>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
  async fn insert(&self, feedback: &FeedbackResponse) -> CoreResult<()>;
  async fn find_by_id(&self, id: FeedbackId) -> CoreResult<Option<FeedbackResponse>>;
}

#[async_trait]
pub trait FaqRepository: Send + Sync {
  async fn list_active(&self) -> CoreResult<Vec<FaqItem>>;
  async fn find_by_id(&self, id: FaqItemId) -> CoreResult<Option<FaqItem>>;
  async fn record_usage(&self, id: FaqItemId) -> CoreResult<()>;
}

#[async_trait]
pub trait ClassificationCacheRepository: Send + Sync {
  async fn get(&self, cache_key: &str) -> CoreResult<Option<ClassificationCacheEntry>>;
  async fn put(&self, entry: &ClassificationCacheEntry) -> CoreResult<()>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
  async fn insert(&self, message: &ChatMessage) -> CoreResult<()>;
  async fn apply_edit(&self, chat_id: ChatId, message_id: i64, new_text: &str, edited_at: DateTime<Utc>) -> CoreResult<()>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
  async fn upsert(&self, invitation: &ChatInvitation) -> CoreResult<()>;
  async fn find_active(&self, chat_id: ChatId) -> CoreResult<Option<ChatInvitation>>;
}

/// Durable delayed-job scheduler backing warning/breach/escalation/reconcile
/// timers (§4.2). `schedule` with an id already present is a no-op
/// (idempotent by construction, since ids are deterministic —
/// see `models::timer_job::timer_id`).
#[async_trait]
pub trait TimerStore: Send + Sync {
  async fn schedule(&self, job: TimerJob) -> CoreResult<()>;
  /// Whether a job with this id is still pending (not yet fired or
  /// cancelled). Used by reconciliation (§4.5) to tell a lost timer from
  /// one that is merely not due yet.
  async fn exists(&self, job_id: &str) -> CoreResult<bool>;
  /// Safe to call on an id that was never scheduled or already fired.
  async fn cancel(&self, job_id: &str) -> CoreResult<()>;
  /// Cancel every timer of `job_type` for a request, used when a request
  /// reaches a terminal state and all its future timers must be dropped.
  async fn cancel_all_for_request(&self, request_id: RequestId) -> CoreResult<()>;
  /// Pop due jobs up to `limit`, marking them claimed so a second poller
  /// replica does not also fire them. A claim expires after a visibility
  /// timeout so a crash mid-handling is redelivered rather than lost
  /// (§5 "at-least-once firing, persistent across restart").
  async fn poll_due(&self, now: DateTime<Utc>, limit: i64) -> CoreResult<Vec<TimerJob>>;
  /// Remove a job after its handler has run to completion. The final
  /// `fired → removed` step of the lifecycle in `models::timer_job`.
  async fn complete(&self, job_id: &str) -> CoreResult<()>;
}

/// A single distributed lock guarding the reconciliation sweep across
/// worker replicas (§4.5). Backed by a Postgres CAS row rather than Redis.
#[async_trait]
pub trait DistributedLock: Send + Sync {
  /// Attempt to acquire `name` for `ttl`; returns `false` if another holder
  /// has a non-expired lease.
  async fn try_acquire(&self, name: &str, ttl: chrono::Duration) -> CoreResult<bool>;
  async fn release(&self, name: &str) -> CoreResult<()>;
}

/// Outbound adapter to the chat platform's Bot API (§5).
#[async_trait]
pub trait ChatApi: Send + Sync {
  async fn send_message(&self, chat_id: ChatId, text: &str, reply_markup: Option<&str>) -> CoreResult<i64>;
  async fn edit_message_text(&self, chat_id: ChatId, message_id: i64, text: &str) -> CoreResult<()>;
  async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> CoreResult<()>;
  async fn export_chat_invite_link(&self, chat_id: ChatId) -> CoreResult<String>;
}

/// Intent/spam classifier (§4.1 step 5). Implementations wrap an AI
/// provider behind a circuit breaker and fall back to the deterministic
/// keyword classifier on open/half-open rejection or transport failure.
#[async_trait]
pub trait Classifier: Send + Sync {
  async fn classify(&self, text: &str) -> CoreResult<(Classification, f32)>;
}
