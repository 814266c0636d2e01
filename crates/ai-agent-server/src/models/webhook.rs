use serde::{Deserialize, Serialize};

// ===== REQUEST MODELS =====

/// Form-encoded payload posted by the messaging provider. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub business_id: Option<String>,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize, Deserialize)]
pub struct TestResponse {
    pub user_message: String,
    pub ai_response: String,
    pub success: bool,
    pub business_id: Option<String>,
}
