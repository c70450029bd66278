//! Webhook-facing error type. Thin: the engine already distinguishes
//! error kinds via `CoreError` (§7); this layer only maps them to the
//! HTTP status a caller (the adapter in front of this service) should
//! see.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

use sla_core::error::CoreError;

#[derive(Error, Debug)]
pub enum AppError {
  #[error("validation error: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Core(#[from] CoreError),

  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Core(CoreError::Validation(_)) => StatusCode::BAD_REQUEST,
      AppError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Core(CoreError::Conflict(_)) => StatusCode::CONFLICT,
      AppError::Core(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: self.to_string() })).into_response()
  }
}
