//! Alert/feedback delivery worker (§4.7): drains `DeliveryJob`s produced by
//! the timer and feedback workers, renders the inline keyboard, and sends
//! through `ChatApi` with the backoff policy in [`crate::retry`].
//!
//! Delivery is intentionally not itself durable — a process crash between
//! an `Alert` commit and its send simply drops that one notification; the
//! alert row and its `resolve_{id}`/`notify_{id}` buttons remain usable
//! from the next alert at the following escalation level, and the
//! reconciliation sweep only restores *timers*, not in-flight deliveries
//! (§4.5 is explicit that it recovers lost breach timers, not messages).

use std::sync::Arc;

use serde_json::json;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error};

use sla_core::engine::delivery::DeliveryJob;
use sla_core::engine::EngineContext;

use crate::retry::retry_delivery;

/// Drains `rx` until the channel is closed (i.e. every producer has been
/// dropped — in practice, never, since the timer/feedback workers hold
/// their senders for the process lifetime).
pub async fn run(ctx: EngineContext, mut rx: mpsc::Receiver<DeliveryJob>, concurrency: usize) {
  let semaphore = Arc::new(Semaphore::new(concurrency));
  while let Some(job) = rx.recv().await {
    let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
    let ctx = ctx.clone();
    tokio::spawn(async move {
      let _permit = permit;
      deliver(&ctx, job).await;
    });
  }
}

async fn deliver(ctx: &EngineContext, job: DeliveryJob) {
  let reply_markup = inline_keyboard(&job.keyboard);
  let chat_id = job.chat_id;
  let text = job.text.clone();

  let result = retry_delivery(
    || {
      let text = text.clone();
      let reply_markup = reply_markup.clone();
      async move {
        ctx
          .chat_api
          .send_message(chat_id, &text, reply_markup.as_deref())
          .await
          .map(|_message_id| ())
      }
    },
    sla_chatapi::is_fatal_for_recipient,
  )
  .await;

  match &result {
    Ok(()) => {
      debug!(chat_id = chat_id.0, recipients = job.recipients.len(), "alert delivered");
      metrics::counter!("sla_alert_deliveries_total", "outcome" => "delivered").increment(1);
    }
    Err(err) => {
      error!(%err, chat_id = chat_id.0, "alert delivery exhausted retries");
      metrics::counter!("sla_alert_deliveries_total", "outcome" => "failed").increment(1);
    }
  }

  if let Some(alert_id) = job.alert_id {
    record_delivery_outcome(ctx, alert_id, result.is_ok()).await;
  }
}

/// Persist the aggregate delivery outcome on the Alert row (§4.7:
/// "Aggregate success/failure counts are recorded on the Alert"). A
/// single chat-wide send is the unit of delivery here (see `DeliveryJob`
/// doc comment), so the outcome is binary rather than per-recipient.
async fn record_delivery_outcome(ctx: &EngineContext, alert_id: sla_core::ids::AlertId, delivered: bool) {
  let Ok(Some(mut alert)) = ctx.alerts.find_by_id(alert_id).await else {
    return;
  };
  alert.delivery_status = if delivered {
    sla_core::models::DeliveryStatus::Delivered
  } else {
    sla_core::models::DeliveryStatus::Failed
  };
  if let Err(err) = ctx.alerts.update(&alert).await {
    error!(%err, alert_id = %alert_id, "failed to persist delivery status");
  }
}

/// Build a Telegram-style single-column inline keyboard from
/// `(label, callback_data)` pairs. `None` when there are no buttons, so
/// the `reply_markup` field is omitted from the API call entirely.
fn inline_keyboard(buttons: &[(String, String)]) -> Option<String> {
  if buttons.is_empty() {
    return None;
  }
  let rows: Vec<_> = buttons
    .iter()
    .map(|(label, data)| vec![json!({"text": label, "callback_data": data})])
    .collect();
  Some(json!({ "inline_keyboard": rows }).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inline_keyboard_is_none_for_no_buttons() {
    assert_eq!(inline_keyboard(&[]), None);
  }

  #[test]
  fn inline_keyboard_renders_one_button_per_row() {
    let buttons = vec![
      ("Mark resolved".to_string(), "resolve_abc".to_string()),
      ("Notify accountant".to_string(), "notify_abc".to_string()),
    ];
    let rendered = inline_keyboard(&buttons).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    let rows = parsed["inline_keyboard"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].as_array().unwrap().len(), 1);
    assert_eq!(rows[0][0]["callback_data"], "resolve_abc");
  }
}
