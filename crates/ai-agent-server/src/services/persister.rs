use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::{BackendApi, ConversationRecord};
use crate::utils::error::BackendError;

/// Writes each exchange to the backend. Outcomes are only logged.
#[derive(Clone)]
pub struct ConversationPersister {
    backend: Arc<dyn BackendApi>,
    enabled: bool,
}

impl ConversationPersister {
    pub fn new(backend: Arc<dyn BackendApi>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    /// Fire-and-forget: spawns the save and returns immediately.
    /// `None` when persistence is disabled.
    pub fn persist(
        &self,
        sender: &str,
        user_message: &str,
        ai_response: &str,
        tenant_id: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        if !self.enabled {
            debug!("Persistence disabled, skipping conversation for {}", sender);
            return None;
        }

        let record = ConversationRecord {
            phone_number: sender.to_string(),
            user_message: user_message.to_string(),
            ai_response: ai_response.to_string(),
            business_id: tenant_id.map(str::to_string),
            timestamp: Utc::now(),
        };

        let persister = self.clone();
        Some(tokio::spawn(async move {
            // Outcome already logged inside save().
            let _ = persister.save(record).await;
        }))
    }

    /// Awaited variant of [`persist`](Self::persist).
    pub async fn save(&self, record: ConversationRecord) -> Result<(), BackendError> {
        let sender = record.phone_number.clone();
        let business = record.business_id.clone().unwrap_or_else(|| "-".to_string());

        match self.backend.save_conversation(record).await {
            Ok(()) => {
                info!("Conversation saved for {} (business: {})", sender, business);
                Ok(())
            }
            Err(e @ BackendError::Status { .. }) => {
                warn!("Failed to save conversation: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Error saving conversation: {}", e);
                Err(e)
            }
        }
    }
}
