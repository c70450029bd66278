//! SLA escalation engine HTTP surface: config -> state -> handlers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use handlers::{
  callback::callback_handler, feedback::submit_feedback_handler, health, webhook::chat_event_handler,
};

/// Assemble the full router over an already-built `AppState` (§6: one
/// chat-event webhook, one callback webhook, one feedback submission
/// surface, plus health/readiness/liveness for the orchestrator).
pub fn get_router(state: AppState) -> Router {
  Router::new()
    .route("/webhook/chat-event", post(chat_event_handler))
    .route("/webhook/callback", post(callback_handler))
    .route("/feedback", post(submit_feedback_handler))
    .route("/health", get(health::health_handler))
    .route("/ready", get(health::readiness_handler))
    .route("/live", get(health::liveness_handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
