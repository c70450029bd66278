//! Durable delayed-job store backing `sla_core::contracts::TimerStore`
//! (§4.2). Design note §9: "any durable queue with delayed
//! delivery and per-id deduplication suffices... build the store atop a
//! relational due_at table with a polling reaper."
//!
//! This crate owns only the store half of the contract — persistence,
//! claiming, idempotent schedule/cancel. The polling loop that turns
//! `poll_due` into running handlers lives in `sla_worker`.

pub mod store;

pub use store::PgTimerStore;
