use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::chat::{ChatMessage, Role};

/// Default rolling window: 10 user+assistant pairs.
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// One role-tagged message in a dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
}

impl ConversationTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self { role: Role::User, message: message.into() }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self { role: Role::Assistant, message: message.into() }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        ChatMessage {
            role: turn.role,
            content: turn.message.clone(),
        }
    }
}

/// Most recent turns for one sender, oldest evicted first.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    max_len: usize,
}

impl ConversationHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    pub fn append(&mut self, role: Role, message: impl Into<String>) {
        self.turns.push_back(ConversationTurn { role, message: message.into() });
    }

    /// Drop the oldest entries until at most `max_len` remain.
    pub fn truncate_to(&mut self, max_len: usize) {
        while self.turns.len() > max_len {
            self.turns.pop_front();
        }
    }

    /// Record a completed exchange and enforce the window.
    pub fn push_exchange(&mut self, user_message: &str, assistant_reply: &str) {
        self.append(Role::User, user_message);
        self.append(Role::Assistant, assistant_reply);
        self.truncate_to(self.max_len);
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn to_vec(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_after_n_exchanges() {
        for n in [0usize, 1, 5, 10, 11, 30] {
            let mut history = ConversationHistory::default();
            for i in 0..n {
                history.push_exchange(&format!("q{}", i), &format!("a{}", i));
            }
            assert_eq!(history.len(), (2 * n).min(20), "after {} exchanges", n);
        }
    }

    #[test]
    fn test_truncation_keeps_most_recent() {
        let mut history = ConversationHistory::new(4);
        for i in 0..5 {
            history.push_exchange(&format!("q{}", i), &format!("a{}", i));
        }

        let messages: Vec<_> = history.turns().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["q3", "a3", "q4", "a4"]);
        assert_eq!(history.turns().next().unwrap().role, Role::User);
    }

    #[test]
    fn test_truncate_to_smaller_window() {
        let mut history = ConversationHistory::default();
        for i in 0..3 {
            history.append(Role::User, format!("m{}", i));
        }
        history.truncate_to(1);
        assert_eq!(history.to_vec(), vec![ConversationTurn::user("m2")]);
    }
}
