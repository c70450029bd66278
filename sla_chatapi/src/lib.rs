//! HTTP adapter to the chat platform's Bot API (§6) implementing
//! `sla_core::contracts::ChatApi`, plus the process-local rate limiter
//! that keeps the whole process under the provider's global send ceiling.

pub mod classifier;
pub mod client;
pub mod rate_limit;

pub use classifier::{AiClassifierConfig, HttpAiClassifier};
pub use client::{is_fatal_for_recipient, BotApiConfig, HttpChatApi};
pub use rate_limit::RateLimiter;
