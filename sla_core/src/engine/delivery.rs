//! Alert message composition and the inline-keyboard callback grammar
//! (§4.7, §6). Sending and retry/backoff is a worker concern
//! (`sla_worker`) built atop the `ChatApi` port; this module only builds
//! the payload so the grammar and formatting are unit-testable without a
//! network dependency.

use crate::ids::{AlertId, ChatId, FeedbackId};
use crate::models::{Alert, AlertType, Chat, ChatType, FeedbackResponse};

const PREVIEW_LEN: usize = 200;

/// A unit of work for the alert-delivery worker pool: one Alert or
/// low-rating Feedback, the recipients already resolved, and a rendered
/// message ready to send per-recipient.
///
/// The chat platform's Bot API addresses a send by `chat_id`, not by
/// username, and cannot open a DM with a user who has never started a
/// conversation with the bot — so a single message goes to the chat the
/// Request lives in, @-mentioning every resolved recipient in the text
/// rather than fanning out one API call per recipient. `alert_id` is
/// `None` for the low-rating path, which has no Alert row to update.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
  pub alert_id: Option<AlertId>,
  pub chat_id: ChatId,
  pub recipients: Vec<String>,
  pub text: String,
  pub keyboard: Vec<(String, String)>,
}

impl DeliveryJob {
  pub fn for_alert(alert: &Alert, chat: &Chat) -> Self {
    Self {
      alert_id: Some(alert.id),
      chat_id: chat.id,
      recipients: alert.recipient_ids.clone(),
      text: compose_alert_text(alert, chat),
      keyboard: compose_alert_keyboard(alert.id, chat),
    }
  }

  pub fn for_low_rating(feedback: &FeedbackResponse, recipients: Vec<String>) -> Self {
    Self {
      alert_id: None,
      chat_id: feedback.chat_id,
      recipients,
      text: compose_low_rating_text(feedback),
      keyboard: vec![(
        "View feedback".to_string(),
        callback::view_feedback(feedback.id),
      )],
    }
  }
}

/// Escape the five HTML-significant characters Telegram's HTML parse mode
/// requires escaped (§4.7: "HTML-escaped user content").
pub fn html_escape(raw: &str) -> String {
  raw
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
    .replace('\'', "&#39;")
}

/// Truncate to a 200-character preview (§4.7), respecting char boundaries.
pub fn truncate_preview(text: &str) -> String {
  let truncated: String = text.chars().take(PREVIEW_LEN).collect();
  if text.chars().count() > PREVIEW_LEN {
    format!("{truncated}…")
  } else {
    truncated
  }
}

fn compose_alert_text(alert: &Alert, chat: &Chat) -> String {
  let kind = match alert.alert_type {
    AlertType::Warning => "SLA warning",
    AlertType::Breach => {
      if alert.escalation_level <= 1 {
        "SLA breach"
      } else {
        "SLA escalation"
      }
    }
  };
  let mentions = mention_recipients(&alert.recipient_ids);
  format!(
    "<b>{kind}</b> (level {level}) — {chat}\nElapsed: {minutes} min\n{mentions}",
    level = alert.escalation_level,
    chat = html_escape(&chat.title),
    minutes = alert.minutes_elapsed,
  )
}

/// `@username` mentions, HTML-escaped, for every resolved recipient — the
/// only way this implementation has to direct a single chat-wide message
/// at specific people (see `DeliveryJob` doc comment).
fn mention_recipients(recipient_ids: &[String]) -> String {
  if recipient_ids.is_empty() {
    return String::new();
  }
  let mentions: Vec<String> = recipient_ids.iter().map(|id| format!("@{}", html_escape(id))).collect();
  mentions.join(" ")
}

fn compose_low_rating_text(feedback: &FeedbackResponse) -> String {
  let comment = feedback
    .comment
    .as_deref()
    .map(truncate_preview)
    .map(|c| html_escape(&c))
    .unwrap_or_else(|| "(no comment)".to_string());
  format!(
    "<b>Low rating alert</b> — rating {rating}/5\n{comment}",
    rating = feedback.rating,
  )
}

fn chat_link(chat: &Chat) -> Option<(String, String)> {
  if let Some(url) = &chat.invite_url {
    return Some(("Open chat".to_string(), url.clone()));
  }
  if chat.chat_type == ChatType::Supergroup {
    return Some(("Open chat".to_string(), format!("tg://resolve?domain={}", chat.id.0)));
  }
  None
}

fn compose_alert_keyboard(alert_id: AlertId, chat: &Chat) -> Vec<(String, String)> {
  let mut buttons = vec![
    ("Mark resolved".to_string(), callback::resolve(alert_id)),
    ("Notify accountant".to_string(), callback::notify(alert_id)),
  ];
  if let Some(link) = chat_link(chat) {
    buttons.push(link);
  }
  buttons
}

/// The bit-exact inline-keyboard callback grammar from §6. Centralized so
/// the server's callback router and the delivery composer can never drift.
pub mod callback {
  use super::{AlertId, FeedbackId};

  pub fn notify(alert_id: AlertId) -> String {
    format!("notify_{alert_id}")
  }

  pub fn resolve(alert_id: AlertId) -> String {
    format!("resolve_{alert_id}")
  }

  pub fn survey_rating(delivery_id: &str, rating: u8) -> String {
    format!("survey:rating:{delivery_id}:{rating}")
  }

  pub fn view_feedback(feedback_id: FeedbackId) -> String {
    format!("view_feedback_{feedback_id}")
  }

  pub fn template_use(template_id: &str) -> String {
    format!("template:use:{template_id}")
  }

  pub const TEMPLATE_CANCEL: &str = "template:cancel";
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ids::RequestId;

  #[test]
  fn html_escape_covers_all_five_characters() {
    let escaped = html_escape(r#"<b>"tom's" & jerry</b>"#);
    assert_eq!(escaped, "&lt;b&gt;&quot;tom&#39;s&quot; &amp; jerry&lt;/b&gt;");
  }

  #[test]
  fn truncate_preview_caps_at_200_chars_with_ellipsis() {
    let long = "x".repeat(250);
    let preview = truncate_preview(&long);
    assert_eq!(preview.chars().count(), 201);
    assert!(preview.ends_with('…'));
  }

  #[test]
  fn truncate_preview_leaves_short_text_untouched() {
    assert_eq!(truncate_preview("short"), "short");
  }

  #[test]
  fn callback_grammar_matches_spec_bit_exact() {
    let alert_id = AlertId::generate();
    assert_eq!(callback::notify(alert_id), format!("notify_{alert_id}"));
    assert_eq!(callback::resolve(alert_id), format!("resolve_{alert_id}"));
    assert_eq!(callback::survey_rating("d1", 5), "survey:rating:d1:5");
    assert_eq!(callback::template_use("t1"), "template:use:t1");
    assert_eq!(callback::TEMPLATE_CANCEL, "template:cancel");
  }

  #[test]
  fn chat_link_prefers_invite_url_over_deep_link() {
    let mut chat = Chat::new(ChatId(-100), "Acme".into(), ChatType::Supergroup, 60);
    chat.invite_url = Some("https://t.me/joinchat/abc".into());
    let (_, url) = chat_link(&chat).unwrap();
    assert_eq!(url, "https://t.me/joinchat/abc");
  }

  #[test]
  fn chat_link_falls_back_to_deep_link_for_supergroups() {
    let chat = Chat::new(ChatId(-100), "Acme".into(), ChatType::Supergroup, 60);
    let (_, url) = chat_link(&chat).unwrap();
    assert_eq!(url, "tg://resolve?domain=-100");
  }

  #[test]
  fn chat_link_is_omitted_for_plain_groups_without_invite() {
    let chat = Chat::new(ChatId(-1), "Acme".into(), ChatType::Group, 60);
    assert!(chat_link(&chat).is_none());
  }

  #[test]
  fn delivery_job_for_alert_carries_resolved_recipients() {
    let chat = Chat::new(ChatId(1), "Acme".into(), ChatType::Group, 60);
    let alert = Alert::new_warning(RequestId::generate(), 48, vec!["acct1".into()]);
    let job = DeliveryJob::for_alert(&alert, &chat);
    assert_eq!(job.recipients, vec!["acct1".to_string()]);
    assert!(job.text.contains("SLA warning"));
    assert_eq!(job.keyboard.len(), 2);
  }
}
