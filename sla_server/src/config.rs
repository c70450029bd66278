//! Typed configuration (§6 "Configuration surface"): YAML file with
//! environment overrides reserved for secrets, loaded from a priority
//! list of candidate sources tried in order, falling through to the
//! next on failure.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use sla_chatapi::{AiClassifierConfig, BotApiConfig};
use sla_worker::WorkerConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
  pub server: ServerConfig,
  pub chat_api: ChatApiConfig,
  pub classifier: ClassifierConfig,
  pub worker: WorkerFileConfig,
  pub observability: ObservabilityConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
  pub port: u16,
}

/// Non-secret chat-API settings. The token itself is an env-only secret
/// (§6: "Environment overrides reserved for secrets only") — see
/// [`ChatApiConfig::resolve`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatApiConfig {
  pub base_url: String,
  pub call_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassifierConfig {
  pub endpoint_env: String,
  pub request_timeout_secs: u64,
}

/// Mirrors `sla_worker::WorkerConfig` with durations expressed in seconds
/// for YAML readability; converted in [`WorkerFileConfig::into_worker_config`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerFileConfig {
  pub timer_poll_interval_secs: u64,
  pub timer_batch_size: i64,
  pub timer_concurrency: usize,
  pub delivery_channel_capacity: usize,
  pub delivery_concurrency: usize,
  pub reconciliation_interval_secs: u64,
  pub settings_refresh_interval_secs: u64,
}

impl WorkerFileConfig {
  pub fn into_worker_config(self) -> WorkerConfig {
    WorkerConfig {
      timer_poll_interval: Duration::from_secs(self.timer_poll_interval_secs),
      timer_batch_size: self.timer_batch_size,
      timer_concurrency: self.timer_concurrency,
      delivery_channel_capacity: self.delivery_channel_capacity,
      delivery_concurrency: self.delivery_concurrency,
      reconciliation_interval: Duration::from_secs(self.reconciliation_interval_secs),
      settings_refresh_interval: Duration::from_secs(self.settings_refresh_interval_secs),
    }
  }
}

impl Default for WorkerFileConfig {
  fn default() -> Self {
    let defaults = WorkerConfig::default();
    Self {
      timer_poll_interval_secs: defaults.timer_poll_interval.as_secs(),
      timer_batch_size: defaults.timer_batch_size,
      timer_concurrency: defaults.timer_concurrency,
      delivery_channel_capacity: defaults.delivery_channel_capacity,
      delivery_concurrency: defaults.delivery_concurrency,
      reconciliation_interval_secs: defaults.reconciliation_interval.as_secs(),
      settings_refresh_interval_secs: defaults.settings_refresh_interval.as_secs(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObservabilityConfig {
  pub log_level: String,
}

impl ChatApiConfig {
  /// Build the adapter config, pulling the bot token from `SLA_CHAT_API_TOKEN`
  /// (§6: secrets are env-only, never in the YAML file).
  pub fn resolve(&self) -> Result<BotApiConfig> {
    let token = env::var("SLA_CHAT_API_TOKEN").context("SLA_CHAT_API_TOKEN not set")?;
    Ok(BotApiConfig {
      token,
      base_url: self.base_url.clone(),
      call_timeout: Duration::from_secs(self.call_timeout_secs),
    })
  }
}

impl ClassifierConfig {
  pub fn resolve(&self) -> Result<AiClassifierConfig> {
    let endpoint = env::var(&self.endpoint_env).context("classifier endpoint env var not set")?;
    let api_key = env::var("SLA_CLASSIFIER_API_KEY").context("SLA_CLASSIFIER_API_KEY not set")?;
    Ok(AiClassifierConfig {
      endpoint,
      api_key,
      request_timeout: Duration::from_secs(self.request_timeout_secs),
    })
  }
}

impl AppConfig {
  /// Resolve the Postgres URL. §6 reserves this as an env-only secret;
  /// `SLA_DATABASE_URL` is required regardless of which YAML source loaded.
  pub fn database_url(&self) -> Result<String> {
    env::var("SLA_DATABASE_URL").context("SLA_DATABASE_URL not set")
  }

  /// Candidate sources tried in order: an explicit env override first,
  /// then conventional on-disk paths.
  pub fn load() -> Result<Self> {
    if let Ok(path) = env::var("SLA_CONFIG") {
      return Self::from_file(&path).with_context(|| format!("loading config from SLA_CONFIG={path}"));
    }
    for candidate in ["/app/config/sla.yml", "/app/sla.yml", "sla_server/sla.yml", "sla.yml"] {
      if Path::new(candidate).exists() {
        return Self::from_file(candidate);
      }
    }
    bail!(
      "no configuration found: set SLA_CONFIG or place sla.yml at one of the conventional paths"
    );
  }

  fn from_file(path: &str) -> Result<Self> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_yaml::from_str(&contents).with_context(|| format!("parsing {path}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn worker_file_config_default_round_trips_through_worker_config() {
    let file_config = WorkerFileConfig::default();
    let worker_config = file_config.into_worker_config();
    assert_eq!(worker_config.timer_concurrency, 5);
    assert_eq!(worker_config.reconciliation_interval, Duration::from_secs(300));
  }

  #[test]
  fn sample_yaml_parses_into_app_config() {
    let yaml = r#"
server:
  port: 8080
chat_api:
  base_url: "https://api.telegram.org"
  call_timeout_secs: 10
classifier:
  endpoint_env: "SLA_CLASSIFIER_ENDPOINT"
  request_timeout_secs: 30
worker:
  timer_poll_interval_secs: 5
  timer_batch_size: 100
  timer_concurrency: 5
  delivery_channel_capacity: 256
  delivery_concurrency: 5
  reconciliation_interval_secs: 300
  settings_refresh_interval_secs: 60
observability:
  log_level: "info"
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.worker.timer_concurrency, 5);
  }
}
