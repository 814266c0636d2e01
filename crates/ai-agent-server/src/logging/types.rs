use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
    Error,
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
            Self::Error => "error",
        }
    }
}

/// One line of the message log. Optional fields serialize as `null` so every
/// line carries the same keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub phone_number: String,
    pub message: String,
    pub response: Option<String>,
    pub error: Option<String>,
    pub business_id: Option<String>,
}

impl MessageLog {
    pub fn builder(
        direction: Direction,
        phone_number: impl Into<String>,
        message: impl Into<String>,
    ) -> MessageLogBuilder {
        MessageLogBuilder::new(direction, phone_number, message)
    }

    pub fn to_json_line(&self) -> String {
        // Serializing plain strings and a timestamp cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

pub struct MessageLogBuilder {
    log: MessageLog,
}

impl MessageLogBuilder {
    pub fn new(
        direction: Direction,
        phone_number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            log: MessageLog {
                timestamp: Utc::now(),
                direction,
                phone_number: phone_number.into(),
                message: message.into(),
                response: None,
                error: None,
                business_id: None,
            },
        }
    }

    pub fn response(mut self, content: impl Into<String>) -> Self {
        self.log.response = Some(content.into());
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.log.error = Some(message.into());
        self
    }

    pub fn business_id(mut self, business_id: Option<&str>) -> Self {
        self.log.business_id = business_id.map(str::to_string);
        self
    }

    pub fn build(self) -> MessageLog {
        self.log
    }
}
