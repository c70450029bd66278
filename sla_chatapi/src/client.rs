use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sla_core::contracts::ChatApi;
use sla_core::error::{CoreError, CoreResult};
use sla_core::ids::ChatId;

use crate::rate_limit::RateLimiter;

/// Secrets and endpoint configuration (§6 "Environment overrides reserved
/// for secrets only: chat-API token"). Never logged.
#[derive(Debug, Clone)]
pub struct BotApiConfig {
  pub token: String,
  pub base_url: String,
  pub call_timeout: Duration,
}

impl BotApiConfig {
  pub fn from_env() -> CoreResult<Self> {
    let token = std::env::var("SLA_CHAT_API_TOKEN")
      .map_err(|_| CoreError::Internal("SLA_CHAT_API_TOKEN not set".into()))?;
    Ok(Self {
      token,
      base_url: "https://api.telegram.org".to_string(),
      // Infra default, per §5 Timeouts: "external chat API per-call: infra
      // default (≤ 10s recommended)".
      call_timeout: Duration::from_secs(10),
    })
  }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
  chat_id: i64,
  text: &'a str,
  parse_mode: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  reply_markup: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest<'a> {
  chat_id: i64,
  message_id: i64,
  text: &'a str,
  parse_mode: &'static str,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
  callback_query_id: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ExportChatInviteLinkRequest {
  chat_id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
  ok: bool,
  #[serde(default)]
  result: Option<T>,
  #[serde(default)]
  error_code: Option<i32>,
  #[serde(default)]
  description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
  message_id: i64,
}

/// HTTP adapter to the chat platform's Bot API (§6). All calls pass
/// through a shared rate limiter so the process as a whole never exceeds
/// the provider's global ceiling regardless of how many recipients a
/// single alert fans out to.
pub struct HttpChatApi {
  http: reqwest::Client,
  config: BotApiConfig,
  rate_limiter: RateLimiter,
}

impl HttpChatApi {
  pub fn new(config: BotApiConfig) -> CoreResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(config.call_timeout)
      .build()
      .map_err(|e| CoreError::Internal(format!("failed to build http client: {e}")))?;
    Ok(Self {
      http,
      config,
      rate_limiter: RateLimiter::provider_default(),
    })
  }

  fn method_url(&self, method: &str) -> String {
    format!("{}/bot{}/{}", self.config.base_url, self.config.token, method)
  }

  /// Classify a non-2xx response into permanent-vs-transient per §7: 4xx
  /// codes that mean "will never succeed for this recipient" (forbidden,
  /// blocked) are `PermanentExternal`; anything else (5xx, network) is
  /// `Database`-flavored transient so the worker's retry loop engages.
  fn classify_status(status: reqwest::StatusCode, description: Option<String>) -> CoreError {
    let message = description.unwrap_or_else(|| status.to_string());
    if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::BAD_REQUEST {
      CoreError::PermanentExternal(message)
    } else {
      CoreError::Database(format!("chat api transient error: {message}"))
    }
  }

  async fn call<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
    &self,
    method: &str,
    body: &Req,
  ) -> CoreResult<Resp> {
    self.rate_limiter.acquire().await;

    let response = self
      .http
      .post(self.method_url(method))
      .json(body)
      .send()
      .await
      .map_err(|e| CoreError::Database(format!("chat api request failed: {e}")))?;

    let status = response.status();
    let envelope: ApiEnvelope<Resp> = response
      .json()
      .await
      .map_err(|e| CoreError::Database(format!("chat api response decode failed: {e}")))?;

    if !envelope.ok {
      return Err(Self::classify_status(status, envelope.description));
    }
    envelope
      .result
      .ok_or_else(|| CoreError::Internal(format!("{method}: ok response with no result")))
  }
}

#[async_trait]
impl ChatApi for HttpChatApi {
  async fn send_message(&self, chat_id: ChatId, text: &str, reply_markup: Option<&str>) -> CoreResult<i64> {
    let request = SendMessageRequest {
      chat_id: chat_id.0,
      text,
      parse_mode: "HTML",
      reply_markup,
    };
    let sent: SentMessage = self.call("sendMessage", &request).await?;
    debug!(chat_id = chat_id.0, message_id = sent.message_id, "message sent");
    Ok(sent.message_id)
  }

  async fn edit_message_text(&self, chat_id: ChatId, message_id: i64, text: &str) -> CoreResult<()> {
    let request = EditMessageTextRequest {
      chat_id: chat_id.0,
      message_id,
      text,
      parse_mode: "HTML",
    };
    let _: serde_json::Value = self.call("editMessageText", &request).await?;
    Ok(())
  }

  async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> CoreResult<()> {
    let request = AnswerCallbackQueryRequest { callback_query_id, text };
    let _: bool = self.call("answerCallbackQuery", &request).await?;
    Ok(())
  }

  async fn export_chat_invite_link(&self, chat_id: ChatId) -> CoreResult<String> {
    let request = ExportChatInviteLinkRequest { chat_id: chat_id.0 };
    let link: String = self.call("exportChatInviteLink", &request).await?;
    Ok(link)
  }
}

/// Whether a `CoreError` produced by this adapter should terminate retries
/// for the recipient (§4.7: "Fatal codes (forbidden, blocked by user)
/// terminate retries for that recipient without failing the job").
pub fn is_fatal_for_recipient(err: &CoreError) -> bool {
  matches!(err, CoreError::PermanentExternal(_))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn method_url_embeds_token_and_method() {
    let config = BotApiConfig {
      token: "123:ABC".to_string(),
      base_url: "https://api.telegram.org".to_string(),
      call_timeout: Duration::from_secs(10),
    };
    let client = HttpChatApi::new(config).unwrap();
    assert_eq!(
      client.method_url("sendMessage"),
      "https://api.telegram.org/bot123:ABC/sendMessage"
    );
  }

  #[test]
  fn forbidden_and_bad_request_are_permanent() {
    assert!(is_fatal_for_recipient(&HttpChatApi::classify_status(
      reqwest::StatusCode::FORBIDDEN,
      None
    )));
    assert!(is_fatal_for_recipient(&HttpChatApi::classify_status(
      reqwest::StatusCode::BAD_REQUEST,
      None
    )));
  }

  #[test]
  fn server_errors_are_transient() {
    assert!(!is_fatal_for_recipient(&HttpChatApi::classify_status(
      reqwest::StatusCode::INTERNAL_SERVER_ERROR,
      None
    )));
  }
}
