use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::utils::error::BackendError;

/// `GET /api/setup/status/{business_id}` payload (only the fields we read).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bot_configs: Option<Vec<BotConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
    #[serde(default, rename = "businessHours")]
    pub business_hours: Option<String>,
}

/// `POST /api/conversations` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    pub phone_number: String,
    pub user_message: String,
    pub ai_response: String,
    pub business_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Trait for the backend API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn fetch_business(&self, business_id: &str) -> Result<BusinessStatus, BackendError>;
    async fn save_conversation(&self, record: ConversationRecord) -> Result<(), BackendError>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Content-Type", "application/json");
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn fetch_business(&self, business_id: &str) -> Result<BusinessStatus, BackendError> {
        let url = self.url(&format!("/api/setup/status/{}", business_id));
        debug!("Fetching business config from {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        response
            .json::<BusinessStatus>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn save_conversation(&self, record: ConversationRecord) -> Result<(), BackendError> {
        if self.config.api_key.is_none() {
            return Err(BackendError::NotConfigured);
        }

        let response = self
            .authorized(self.client.post(self.url("/api/conversations")))
            .json(&record)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if response.status() != StatusCode::CREATED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        Ok(())
    }
}
