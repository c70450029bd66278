use thiserror::Error;

/// Domain-level error kinds, distinguished by how a caller should react —
/// not by which adapter produced them: transient infra, permanent
/// external, logical precondition, validation, and programmer error.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
  /// A logical precondition that is an expected race, not a bug: the
  /// request was already terminal, a duplicate alert already exists, a
  /// timer job with the same id is already scheduled. Callers should drop
  /// the current operation silently (debug-log only).
  #[error("precondition not met: {0}")]
  Precondition(String),

  /// Input failed validation before it could be persisted.
  #[error("validation error: {0}")]
  Validation(String),

  /// The requested entity does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// A uniqueness or other data-integrity constraint was violated.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Database or other durable-store failure. Treated as transient:
  /// callers retry via their worker loop rather than failing the job.
  #[error("database error: {0}")]
  Database(String),

  /// The external chat API rejected an action for a specific recipient in
  /// a way that will never succeed on retry (forbidden, blocked by user,
  /// malformed token). Recorded, not retried.
  #[error("permanent external error: {0}")]
  PermanentExternal(String),

  /// An unexpected condition that indicates a programming or schema-drift
  /// error rather than a handled domain case.
  #[error("internal error: {0}")]
  Internal(String),
}

impl CoreError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, CoreError::Database(_))
  }
}

impl From<sqlx::Error> for CoreError {
  fn from(err: sqlx::Error) -> Self {
    if let Some(db_err) = err.as_database_error() {
      if db_err.is_unique_violation() {
        return CoreError::Conflict(db_err.message().to_string());
      }
      if db_err.is_foreign_key_violation() {
        return CoreError::Validation(format!("referenced row missing: {}", db_err.message()));
      }
    }
    match err {
      sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
      other => CoreError::Database(other.to_string()),
    }
  }
}

impl From<serde_json::Error> for CoreError {
  fn from(err: serde_json::Error) -> Self {
    CoreError::Internal(format!("serialization error: {err}"))
  }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_database_errors_are_retryable() {
    assert!(CoreError::Database("timeout".into()).is_retryable());
    assert!(!CoreError::Precondition("terminal".into()).is_retryable());
    assert!(!CoreError::Validation("too long".into()).is_retryable());
  }
}
