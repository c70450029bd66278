//! Message ingestion pipeline (§4.1): membership filter, sanitize, FAQ
//! short-circuit, sender-role routing, classification, Request persistence,
//! timer scheduling.

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::engine::classify::{cache_key, keyword_classify, should_fall_back_to_keywords, CLASSIFICATION_CACHE_TTL};
use crate::engine::context::EngineContext;
use crate::engine::faq;
use crate::engine::sanitize::{is_oversized, sanitize_text};
use crate::error::{CoreError, CoreResult};
use crate::ids::ChatId;
use crate::models::chat::sanitize_title;
use crate::models::event::{ChatEvent, ChatEventType, MemberUpdateKind};
use crate::models::{
  Chat, ChatMessage, Classification, ClassificationCacheEntry, Request, TimerJob, TimerJobType,
  TimerPayload,
};

/// What happened to an ingested event, for the caller (webhook handler) to
/// turn into a response / metric.
#[derive(Debug)]
pub enum IngestOutcome {
  /// A FAQ entry answered the message inline; no Request was opened.
  FaqHandled { faq_item_id: crate::ids::FaqItemId },
  /// The message opened a new SLA-bearing Request.
  RequestOpened(Box<Request>),
  /// The message was classified but did not open a Request (SPAM,
  /// GRATITUDE, or CLARIFICATION without a linkable thread).
  Recorded(Classification),
  /// The sender was recognized as an accountant; handled as a reply.
  AccountantReply(Box<crate::engine::escalation::ReplyOutcome>),
  /// A non-text event (membership change) with no Request implications.
  MemberUpdate,
  /// An edited message updated a stored `ChatMessage` only.
  EditApplied,
  /// A group→supergroup migration repointed every child row from `old_id`
  /// onto `new_id` (§3, §8 scenario S4).
  ChatMigrated { old_id: ChatId, new_id: ChatId },
}

fn epoch_seconds(ts: i64) -> DateTime<Utc> {
  Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now)
}

impl EngineContext {
  pub async fn handle_event(&self, event: ChatEvent) -> CoreResult<IngestOutcome> {
    // Checked ahead of the `event_type` match: the chat platform delivers
    // a migration as a service message carrying `migrate_from_chat_id`
    // alongside whatever `event_type` it happens to tag the envelope with
    // (§3, §8 scenario S4), so this must not depend on that tag.
    if let Some(old_id) = event.migrate_from_chat_id {
      return self.handle_chat_migration(old_id, event).await;
    }
    match event.event_type {
      ChatEventType::MemberUpdate => self.handle_member_update(event).await,
      ChatEventType::EditedMessage => self.handle_edited_message(event).await,
      ChatEventType::CallbackQuery => {
        // Callback routing (mark_resolved / notify_accountant / survey
        // rating) is handled by the server layer, which parses the
        // grammar in `engine::delivery` and calls the escalation/feedback
        // engine directly. Bare ingestion treats it as a no-op record.
        Ok(IngestOutcome::Recorded(Classification::Clarification))
      }
      ChatEventType::Message => self.handle_text_message(event).await,
    }
  }

  /// Group→supergroup migration (§3, §9 "upsert plus bulk repoint of
  /// child rows", §8 scenario S4). `event.chat` already names the new id;
  /// `old_id` is the id being retired. The new `Chat` row carries over
  /// every setting from the old one except identity and type.
  async fn handle_chat_migration(&self, old_id: ChatId, event: ChatEvent) -> CoreResult<IngestOutcome> {
    let new_id = event.chat.id;
    let mut new_chat = match self.chats.find_by_id(old_id).await? {
      Some(old) => old,
      None => {
        let settings = self.settings();
        Chat::new(old_id, event.chat.title.clone().unwrap_or_default(), event.chat.chat_type, settings.default_sla_threshold_minutes)
      }
    };
    new_chat.id = new_id;
    new_chat.chat_type = event.chat.chat_type;
    if let Some(title) = event.chat.title.clone() {
      new_chat.title = sanitize_title(&title);
    }

    self.chats.migrate(old_id, &new_chat).await?;

    Ok(IngestOutcome::ChatMigrated { old_id, new_id })
  }

  async fn handle_member_update(&self, event: ChatEvent) -> CoreResult<IngestOutcome> {
    let chat_id = event.chat.id;
    let mut chat = self.load_or_create_chat(chat_id, &event).await?;

    match event.member_update {
      Some(MemberUpdateKind::BotRemoved) => {
        chat.on_bot_removed();
        self.chats.upsert(&chat).await?;
      }
      Some(MemberUpdateKind::BotAdded) => {
        // Re-addition does not auto-enable monitoring; an explicit admin
        // action does, and that is out of scope here (§4.1).
        self.chats.upsert(&chat).await?;
      }
      _ => {}
    }
    Ok(IngestOutcome::MemberUpdate)
  }

  async fn handle_edited_message(&self, event: ChatEvent) -> CoreResult<IngestOutcome> {
    let text = sanitize_text(event.text.as_deref().unwrap_or_default());
    if is_oversized(&text) {
      return Err(CoreError::Validation("edited message exceeds 10000 characters".into()));
    }
    // Never reopens a closed Request nor retriggers classification
    // (§4.1).
    self
      .messages
      .apply_edit(event.chat.id, event.message_id, &text, epoch_seconds(event.date))
      .await?;
    Ok(IngestOutcome::EditApplied)
  }

  async fn handle_text_message(&self, event: ChatEvent) -> CoreResult<IngestOutcome> {
    let raw_text = event.text.clone().unwrap_or_default();
    let text = sanitize_text(&raw_text);
    if is_oversized(&text) {
      return Err(CoreError::Validation("message exceeds 10000 characters".into()));
    }

    let chat = self.load_or_create_chat(event.chat.id, &event).await?;
    let received_at = epoch_seconds(event.date);

    // Always persisted, matched or not (§4.1).
    let message = ChatMessage::new(
      event.message_id,
      event.chat.id,
      event.from.username.clone(),
      text.clone(),
      received_at,
    );
    self.messages.insert(&message).await?;

    let is_accountant = event
      .from
      .username
      .as_deref()
      .map(|u| chat.accountant_ids.contains(u))
      .unwrap_or(false);

    if is_accountant {
      let outcome = self.handle_accountant_reply(&chat, &event, received_at).await?;
      return Ok(IngestOutcome::AccountantReply(Box::new(outcome)));
    }

    // FAQ short-circuit (§4.1 step 3): only considered for client senders,
    // already excluded accountants above.
    let faq_items = self.faq_items().await;
    if let Some(matched) = faq::best_match(&text, &faq_items) {
      let faq_id = matched.id;
      if let Err(err) = self.chat_api.send_message(event.chat.id, &matched.answer, None).await {
        warn!(%err, "faq auto-reply send failed");
      }
      // Best-effort: a failure here must not undo the short-circuit.
      if let Err(err) = self.faq_repo.record_usage(faq_id).await {
        warn!(%err, "faq usage increment failed");
      }
      self.faq_cache.invalidate();
      return Ok(IngestOutcome::FaqHandled { faq_item_id: faq_id });
    }

    let (classification, _confidence, _source) = self.classify(&text).await?;

    if classification != Classification::Request {
      if classification == Classification::Clarification {
        if let Some(open) = self
          .requests
          .find_open_by_thread(event.chat.id, event.reply_to_message_id.map(|id| id.to_string()).as_deref())
          .await?
        {
          debug!(request_id = %open.id, "clarification linked to open request without new SLA obligation");
        }
      }
      return Ok(IngestOutcome::Recorded(classification));
    }

    if !chat.sla_enabled {
      return Ok(IngestOutcome::Recorded(classification));
    }

    let request = Request::new_pending(
      event.chat.id,
      event.from.username.clone(),
      text,
      event.reply_to_message_id.map(|id| id.to_string()),
      received_at,
    );
    self.requests.insert(&request).await?;
    self.schedule_initial_timers(&chat, &request).await;

    Ok(IngestOutcome::RequestOpened(Box::new(request)))
  }

  /// Classify using the three-layer pipeline (§4.1 step 5): cache, AI +
  /// breaker, keyword fallback. Returns `(classification, confidence,
  /// source)` where `source` is `"cache"`, `"ai"`, or `"keyword"` —
  /// exercised by §8 property 8 (round-trip).
  pub async fn classify(&self, text: &str) -> CoreResult<(Classification, f32, &'static str)> {
    let key = cache_key(text);
    if let Ok(Some(entry)) = self.classification_cache.get(&key).await {
      if !entry.is_expired(Utc::now(), chrono::Duration::from_std(CLASSIFICATION_CACHE_TTL).unwrap()) {
        return Ok((entry.classification, entry.confidence, "cache"));
      }
    }

    let ai_result = if self.breaker.allow_request() {
      match self.classifier.classify(text).await {
        Ok((classification, confidence)) => {
          self.breaker.record_success();
          Some((classification, confidence))
        }
        Err(err) => {
          self.breaker.record_failure();
          debug!(%err, "ai classifier call failed, falling back");
          None
        }
      }
    } else {
      None
    };

    let (classification, confidence, source) =
      if should_fall_back_to_keywords(&self.breaker, ai_result.map(|(_, c)| c)) {
        let (c, conf) = keyword_classify(text);
        (c, conf, "keyword")
      } else {
        let (c, conf) = ai_result.expect("checked above");
        (c, conf, "ai")
      };

    let entry = ClassificationCacheEntry::new(key, classification, confidence);
    if let Err(err) = self.classification_cache.put(&entry).await {
      warn!(%err, "failed to persist classification cache entry");
    }

    Ok((classification, confidence, source))
  }

  async fn load_or_create_chat(&self, chat_id: ChatId, event: &ChatEvent) -> CoreResult<Chat> {
    if let Some(chat) = self.chats.find_by_id(chat_id).await? {
      return Ok(chat);
    }
    let settings = self.settings();
    let title = sanitize_title(event.chat.title.as_deref().unwrap_or_default());
    let chat = Chat::new(chat_id, title, event.chat.chat_type, settings.default_sla_threshold_minutes);
    self.chats.upsert(&chat).await?;
    Ok(chat)
  }

  async fn schedule_initial_timers(&self, chat: &Chat, request: &Request) {
    let threshold = chat.effective_threshold_minutes();
    let settings = self.settings();
    let warning_offset = settings.warning_offset_minutes.min(threshold.max(1));

    let warning_due = request.received_at + chrono::Duration::minutes((threshold - warning_offset) as i64);
    let breach_due = request.received_at + chrono::Duration::minutes(threshold as i64);

    let warning_job = TimerJob {
      id: crate::models::timer_id(TimerJobType::Warning, request.id, 0),
      job_type: TimerJobType::Warning,
      payload: TimerPayload {
        request_id: request.id,
        chat_id: chat.id,
        threshold_minutes: threshold,
        level: 0,
      },
      due_at: warning_due,
    };
    let breach_job = TimerJob {
      id: crate::models::timer_id(TimerJobType::Breach, request.id, 1),
      job_type: TimerJobType::Breach,
      payload: TimerPayload {
        request_id: request.id,
        chat_id: chat.id,
        threshold_minutes: threshold,
        level: 1,
      },
      due_at: breach_due,
    };

    // Enqueue is post-commit and best-effort: a failure here is recovered
    // by reconciliation (§4.1 "Failure semantics").
    if let Err(err) = self.timers.schedule(warning_job).await {
      warn!(request_id = %request.id, %err, "failed to schedule warning timer");
    }
    if let Err(err) = self.timers.schedule(breach_job).await {
      warn!(request_id = %request.id, %err, "failed to schedule breach timer");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn epoch_seconds_converts_unix_timestamp() {
    let dt = epoch_seconds(1_700_000_000);
    assert_eq!(dt.timestamp(), 1_700_000_000);
  }
}
