//! Conversation memory and reply generation
//!
//! - Per-sender rolling history (DashMap + per-key async mutex)
//! - System instruction built from the tenant persona
//! - Completion call with fallback on failure

mod cache;
mod context_builder;
pub mod generator;
pub mod types;

pub use cache::{ConversationCache, HistorySlot};
pub use context_builder::ContextBuilder;
pub use generator::{CompletionRequest, LlmProvider, ResponseGenerator, FALLBACK_REPLY};
pub use types::{ConversationHistory, ConversationTurn, DEFAULT_MAX_HISTORY};
