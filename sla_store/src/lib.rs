//! Postgres-backed implementations of the repository ports in
//! `sla_core::contracts`. Thin persistence wrappers around the pure
//! domain model — no business rules live here (§4.3–4.6).

pub mod lock;
pub mod migrations;
pub mod repositories;

pub use lock::PostgresLock;
pub use migrations::run_migrations;
pub use repositories::*;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect a pool with conservative defaults for the primary database
/// connection.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
  PgPoolOptions::new()
    .max_connections(20)
    .connect(database_url)
    .await
}
