//! Business rules: pure-ish orchestration against the port traits in
//! [`crate::contracts`]. No module here depends on a concrete adapter.

pub mod classify;
pub mod context;
pub mod delivery;
pub mod escalation;
pub mod faq;
pub mod feedback;
pub mod ingestion;
pub mod reconciliation;
pub mod sanitize;

pub use context::EngineContext;
pub use ingestion::IngestOutcome;
