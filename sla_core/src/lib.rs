//! Domain core of the SLA escalation engine: entities, port traits, and the
//! pure-ish orchestration that drives message ingestion, the escalation
//! state machine, reconciliation, and alert delivery composition.
//!
//! This crate depends on nothing but the port traits in [`contracts`] for
//! any I/O — it never touches Postgres, HTTP, or a concrete queue. Those
//! live in `sla_store`, `sla_chatapi`, and `sla_timers` respectively.

pub mod contracts;
pub mod engine;
pub mod error;
pub mod ids;
pub mod models;

pub use error::{CoreError, CoreResult};
