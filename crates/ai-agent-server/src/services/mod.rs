pub mod backend;
pub mod business_config;
pub mod conversation;
pub mod llm_service;
pub mod persister;

pub use backend::{BackendApi, BackendClient};
pub use business_config::{BusinessConfigCache, TenantConfig};
pub use conversation::{ConversationCache, ResponseGenerator};
pub use llm_service::LlmService;
pub use persister::ConversationPersister;
