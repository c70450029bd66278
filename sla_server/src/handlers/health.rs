//! Health/readiness/liveness, trimmed to this service's one hard
//! dependency: Postgres. The chat API and classifier are best-effort
//! downstreams already guarded by their own retry/circuit-breaker
//! layers, so a blip there should not flip this process unready.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
  pub status: &'static str,
  pub service: &'static str,
  pub version: &'static str,
  pub database: ServiceStatus,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
  pub status: &'static str,
  pub latency_ms: u64,
  pub message: Option<String>,
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
  let database = check_database(&state).await;
  let healthy = database.status == "healthy";
  let status = HealthStatus {
    status: if healthy { "healthy" } else { "unhealthy" },
    service: "sla_server",
    version: env!("CARGO_PKG_VERSION"),
    database,
  };
  let code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
  (code, Json(status))
}

pub async fn readiness_handler(State(state): State<AppState>) -> (StatusCode, Json<ServiceStatus>) {
  let database = check_database(&state).await;
  let code = if database.status == "healthy" {
    StatusCode::OK
  } else {
    StatusCode::SERVICE_UNAVAILABLE
  };
  (code, Json(database))
}

pub async fn liveness_handler() -> StatusCode {
  StatusCode::OK
}

async fn check_database(state: &AppState) -> ServiceStatus {
  let start = Instant::now();
  match sqlx::query("select 1").fetch_one(state.pool()).await {
    Ok(_) => ServiceStatus {
      status: "healthy",
      latency_ms: start.elapsed().as_millis() as u64,
      message: None,
    },
    Err(err) => ServiceStatus {
      status: "unhealthy",
      latency_ms: start.elapsed().as_millis() as u64,
      message: Some(err.to_string()),
    },
  }
}
