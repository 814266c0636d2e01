//! Messaging-provider reply envelope (TwiML).

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use quick_xml::escape::escape;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A `<Response>` carrying a single `<Message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingResponse {
    message: String,
}

impl MessagingResponse {
    pub fn message(text: impl Into<String>) -> Self {
        Self { message: text.into() }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "{}<Response><Message>{}</Message></Response>",
            XML_DECLARATION,
            escape(self.message.as_str())
        )
    }
}

impl IntoResponse for MessagingResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.to_xml()).into_response()
    }
}
