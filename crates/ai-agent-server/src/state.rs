use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::logging::{MessageFileSink, MessageLogger, MessageLoggerConfig};
use crate::services::conversation::LlmProvider;
use crate::services::{
    BackendApi, BackendClient, BusinessConfigCache, ConversationCache, ConversationPersister,
    LlmService, ResponseGenerator,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub generator: Arc<ResponseGenerator>,
    pub persister: ConversationPersister,
    pub message_logger: MessageLogger,
}

impl AppState {
    pub fn new(
        settings: Settings,
        llm_provider: Arc<dyn LlmProvider>,
        backend: Arc<dyn BackendApi>,
        message_logger: MessageLogger,
    ) -> Self {
        let business_configs = Arc::new(BusinessConfigCache::new(backend.clone()));
        let generator = Arc::new(ResponseGenerator::new(
            ConversationCache::new(settings.conversation.max_history),
            business_configs,
            llm_provider,
            message_logger.clone(),
        ));
        let persister = ConversationPersister::new(backend, settings.persistence_enabled());

        Self {
            settings: Arc::new(settings),
            generator,
            persister,
            message_logger,
        }
    }

    /// Wire the real HTTP clients and start the message log writer.
    /// Must be called inside a Tokio runtime.
    pub fn from_settings(settings: Settings) -> Self {
        let llm_provider: Arc<dyn LlmProvider> = Arc::new(LlmService::new(settings.llm.clone()));
        let backend: Arc<dyn BackendApi> = Arc::new(BackendClient::new(settings.backend.clone()));

        let message_logger = MessageLogger::new(
            MessageFileSink::from_config(&settings.logging),
            MessageLoggerConfig::from(&settings.logging),
        );

        info!(
            "Services initialized (llm={}, backend={}, persistence={})",
            settings.llm.base_url,
            settings.backend.base_url,
            settings.persistence_enabled()
        );

        Self::new(settings, llm_provider, backend, message_logger)
    }
}
