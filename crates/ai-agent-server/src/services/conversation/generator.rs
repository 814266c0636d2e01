use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::cache::ConversationCache;
use super::context_builder::ContextBuilder;
use super::types::ConversationTurn;
use crate::logging::{Direction, MessageLog, MessageLogger};
use crate::models::chat::ChatMessage;
use crate::services::business_config::BusinessConfigCache;
use crate::utils::error::{GenerationError, LlmError};
use crate::utils::preview;

/// Reply substituted whenever generation fails.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again in a moment.";

/// Everything the completion API needs for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<ConversationTurn>,
    pub message: String,
    pub conversation_id: String,
}

impl CompletionRequest {
    /// System instruction, prior turns, then the new user message.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.system.as_str()));
        messages.extend(self.history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(self.message.as_str()));
        messages
    }
}

/// Trait for LLM service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

pub struct ResponseGenerator {
    cache: ConversationCache,
    business_configs: Arc<BusinessConfigCache>,
    llm_provider: Arc<dyn LlmProvider>,
    logger: MessageLogger,
}

impl ResponseGenerator {
    pub fn new(
        cache: ConversationCache,
        business_configs: Arc<BusinessConfigCache>,
        llm_provider: Arc<dyn LlmProvider>,
        logger: MessageLogger,
    ) -> Self {
        Self {
            cache,
            business_configs,
            llm_provider,
            logger,
        }
    }

    /// Generate a reply and record the exchange. History is left untouched on error.
    pub async fn generate(
        &self,
        message: &str,
        sender: &str,
        tenant_id: Option<&str>,
    ) -> Result<String, GenerationError> {
        info!(
            "Generating AI response for {} (business: {}): {}...",
            sender,
            tenant_id.unwrap_or("-"),
            preview(message, 50)
        );

        let tenant_config = match tenant_id {
            Some(id) => self.business_configs.get_config(id).await,
            None => None,
        };
        let system = ContextBuilder::system_instruction(tenant_config.as_ref());

        // Held until the exchange is recorded; same-sender requests queue here.
        let slot = self.cache.slot(sender);
        let mut history = slot.lock().await;

        let request = CompletionRequest {
            system,
            history: history.to_vec(),
            message: message.to_string(),
            conversation_id: ContextBuilder::conversation_id(sender, tenant_id),
        };
        debug!(
            "Completion request for {} with {} prior turns",
            request.conversation_id,
            request.history.len()
        );

        let start = Instant::now();
        let reply = self.llm_provider.complete(request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerationError::EmptyReply);
        }

        history.push_exchange(message, reply);

        info!(
            "AI response generated for {} in {:?}: {}...",
            sender,
            start.elapsed(),
            preview(reply, 50)
        );

        Ok(reply.to_string())
    }

    /// [`generate`](Self::generate), degrading any failure to [`FALLBACK_REPLY`]
    /// plus one `error` message log entry.
    pub async fn respond(&self, message: &str, sender: &str, tenant_id: Option<&str>) -> String {
        match self.generate(message, sender, tenant_id).await {
            Ok(reply) => reply,
            Err(e) => {
                let error_msg = format!("Error generating response: {}", e);
                error!("{}", error_msg);
                self.logger.log(
                    MessageLog::builder(Direction::Error, sender, message)
                        .error(error_msg)
                        .business_id(tenant_id)
                        .build(),
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    pub fn history(&self) -> &ConversationCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use crate::services::backend::{BotConfig, BusinessStatus, MockBackendApi};
    use flume::Receiver;

    fn generator_with(
        llm: MockLlmProvider,
        backend: MockBackendApi,
    ) -> (ResponseGenerator, Receiver<MessageLog>) {
        let (logger, receiver) = MessageLogger::channel(64);
        let generator = ResponseGenerator::new(
            ConversationCache::default(),
            Arc::new(BusinessConfigCache::new(Arc::new(backend))),
            Arc::new(llm),
            logger,
        );
        (generator, receiver)
    }

    fn drain(receiver: &Receiver<MessageLog>) -> Vec<MessageLog> {
        receiver.try_iter().collect()
    }

    #[tokio::test]
    async fn test_history_grows_to_window() {
        let mut llm = MockLlmProvider::new();
        llm.expect_complete()
            .returning(|req| Ok(format!("echo: {}", req.message)));

        let (generator, _rx) = generator_with(llm, MockBackendApi::new());

        for n in 1..=15usize {
            let reply = generator.generate(&format!("msg {}", n), "+1", None).await.unwrap();
            assert_eq!(reply, format!("echo: msg {}", n));
            assert_eq!(generator.history().snapshot("+1").await.len(), (2 * n).min(20));
        }

        let turns = generator.history().snapshot("+1").await;
        assert_eq!(turns.last().unwrap().message, "echo: msg 15");
        assert_eq!(turns.first().unwrap(), &ConversationTurn::user("msg 6"));
    }

    #[tokio::test]
    async fn test_request_carries_history_and_correlation_id() {
        let mut llm = MockLlmProvider::new();
        let mut seq = mockall::Sequence::new();
        llm.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| req.history.is_empty() && req.conversation_id == "t1_+1")
            .returning(|_| Ok("first".to_string()));
        llm.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                req.history
                    == vec![ConversationTurn::user("hello"), ConversationTurn::assistant("first")]
                    && req.system.contains("Acme")
                    && req.message == "again"
            })
            .returning(|_| Ok("second".to_string()));

        let mut backend = MockBackendApi::new();
        backend.expect_fetch_business().times(1).returning(|_| {
            Ok(BusinessStatus {
                name: Some("Acme".to_string()),
                bot_configs: Some(vec![BotConfig::default()]),
            })
        });

        let (generator, _rx) = generator_with(llm, backend);
        assert_eq!(generator.generate("hello", "+1", Some("t1")).await.unwrap(), "first");
        assert_eq!(generator.generate("again", "+1", Some("t1")).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_missing_tenant_config_uses_generic_persona() {
        let mut llm = MockLlmProvider::new();
        llm.expect_complete()
            .withf(|req| req.system == ContextBuilder::default_instruction())
            .returning(|_| Ok("ok".to_string()));

        let mut backend = MockBackendApi::new();
        backend.expect_fetch_business().returning(|_| {
            Err(crate::utils::error::BackendError::Request("connection refused".to_string()))
        });

        let (generator, _rx) = generator_with(llm, backend);
        assert_eq!(generator.generate("hi", "+1", Some("t9")).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_respond_falls_back_with_one_error_entry() {
        let mut llm = MockLlmProvider::new();
        llm.expect_complete().returning(|_| {
            Err(LlmError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        });

        let (generator, rx) = generator_with(llm, MockBackendApi::new());
        let reply = generator.respond("Hello", "+1", None).await;

        assert_eq!(reply, FALLBACK_REPLY);
        let entries = drain(&rx);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, Direction::Error);
        assert_eq!(entries[0].message, "Hello");
        assert!(entries[0].error.as_deref().unwrap().contains("503"));
        assert!(generator.history().snapshot("+1").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_reply_is_an_error() {
        let mut llm = MockLlmProvider::new();
        llm.expect_complete().returning(|_| Ok("   ".to_string()));

        let (generator, rx) = generator_with(llm, MockBackendApi::new());
        let err = generator.generate("Hello", "+1", None).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyReply));

        assert_eq!(generator.respond("Hello", "+1", None).await, FALLBACK_REPLY);
        assert_eq!(drain(&rx).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_sender_requests_are_serialized() {
        let seen_lengths = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut llm = MockLlmProvider::new();
        let seen = seen_lengths.clone();
        llm.expect_complete().times(6).returning(move |req| {
            seen.lock().unwrap().push(req.history.len());
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(format!("echo: {}", req.message))
        });

        let (generator, _rx) = generator_with(llm, MockBackendApi::new());
        let generator = Arc::new(generator);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let generator = generator.clone();
                tokio::spawn(async move {
                    generator.generate(&format!("msg {}", i), "+1", None).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Each call saw every earlier exchange, never a half-written one.
        let mut lengths = seen_lengths.lock().unwrap().clone();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![0, 2, 4, 6, 8, 10]);

        let turns = generator.history().snapshot("+1").await;
        assert_eq!(turns.len(), 12);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].message, format!("echo: {}", pair[0].message));
        }
    }

    #[test]
    fn test_to_messages_order() {
        let request = CompletionRequest {
            system: "sys".to_string(),
            history: vec![ConversationTurn::user("q"), ConversationTurn::assistant("a")],
            message: "next".to_string(),
            conversation_id: "+1".to_string(),
        };

        let roles: Vec<Role> = request.to_messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.to_messages().last().unwrap().content, "next");
    }
}
