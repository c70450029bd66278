//! Thin HTTP seam to the external AI classifier (§4.1 step 5b). Its
//! internals (prompt design, model choice, provider billing) are out of
//! scope (§1) — this adapter only has to satisfy the `Classifier` port:
//! one call in, `(Classification, confidence)` out, errors bubbled so the
//! engine's circuit breaker and keyword fallback can react.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sla_core::contracts::Classifier;
use sla_core::error::{CoreError, CoreResult};
use sla_core::models::Classification;

#[derive(Debug, Clone)]
pub struct AiClassifierConfig {
  pub endpoint: String,
  pub api_key: String,
  pub request_timeout: Duration,
}

impl AiClassifierConfig {
  pub fn from_env() -> CoreResult<Self> {
    let endpoint = std::env::var("SLA_CLASSIFIER_ENDPOINT")
      .map_err(|_| CoreError::Internal("SLA_CLASSIFIER_ENDPOINT not set".into()))?;
    let api_key = std::env::var("SLA_CLASSIFIER_API_KEY")
      .map_err(|_| CoreError::Internal("SLA_CLASSIFIER_API_KEY not set".into()))?;
    Ok(Self {
      endpoint,
      api_key,
      // §5 Timeouts: "Classifier: 30s request timeout".
      request_timeout: Duration::from_secs(30),
    })
  }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
  classification: Classification,
  confidence: f32,
}

pub struct HttpAiClassifier {
  http: reqwest::Client,
  config: AiClassifierConfig,
}

impl HttpAiClassifier {
  pub fn new(config: AiClassifierConfig) -> CoreResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(config.request_timeout)
      .build()
      .map_err(|e| CoreError::Internal(format!("failed to build http client: {e}")))?;
    Ok(Self { http, config })
  }
}

#[async_trait]
impl Classifier for HttpAiClassifier {
  async fn classify(&self, text: &str) -> CoreResult<(Classification, f32)> {
    let response = self
      .http
      .post(&self.config.endpoint)
      .bearer_auth(&self.config.api_key)
      .json(&ClassifyRequest { text })
      .send()
      .await
      .map_err(|e| CoreError::Database(format!("classifier request failed: {e}")))?;

    if !response.status().is_success() {
      return Err(CoreError::Database(format!(
        "classifier returned status {}",
        response.status()
      )));
    }

    let parsed: ClassifyResponse = response
      .json()
      .await
      .map_err(|e| CoreError::Database(format!("classifier response decode failed: {e}")))?;
    Ok((parsed.classification, parsed.confidence))
  }
}
