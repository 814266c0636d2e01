use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{ConversationHistory, ConversationTurn};
use crate::models::chat::Role;

/// Per-sender history slot. Holding its lock makes one request's
/// read-generate-append cycle exclusive for that sender.
pub type HistorySlot = Arc<Mutex<ConversationHistory>>;

/// In-memory conversation history keyed by sender identity.
/// DashMap for the index, one async mutex per sender for the contents.
#[derive(Clone)]
pub struct ConversationCache {
    storage: Arc<DashMap<String, HistorySlot>>,
    max_history: usize,
}

impl ConversationCache {
    pub fn new(max_history: usize) -> Self {
        Self {
            storage: Arc::new(DashMap::new()),
            max_history,
        }
    }

    /// Get (or create) the slot for a sender
    pub fn slot(&self, sender: &str) -> HistorySlot {
        if let Some(slot) = self.storage.get(sender) {
            return slot.value().clone();
        }

        self.storage
            .entry(sender.to_string())
            .or_insert_with(|| {
                debug!("Creating conversation history for {}", sender);
                Arc::new(Mutex::new(ConversationHistory::new(self.max_history)))
            })
            .value()
            .clone()
    }

    pub async fn append(&self, sender: &str, role: Role, text: &str) {
        self.slot(sender).lock().await.append(role, text);
    }

    pub async fn truncate_to(&self, sender: &str, max_len: usize) {
        self.slot(sender).lock().await.truncate_to(max_len);
    }

    /// Copy of the sender's current history (empty if unknown)
    pub async fn snapshot(&self, sender: &str) -> Vec<ConversationTurn> {
        let slot = match self.storage.get(sender) {
            Some(slot) => slot.value().clone(),
            None => return Vec::new(),
        };
        let history = slot.lock().await;
        history.to_vec()
    }

    /// Forget a sender entirely
    pub fn clear(&self, sender: &str) -> bool {
        self.storage.remove(sender).is_some()
    }

    /// Number of senders with history
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for ConversationCache {
    fn default() -> Self {
        Self::new(super::types::DEFAULT_MAX_HISTORY)
    }
}
