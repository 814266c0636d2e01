use crate::models::{TestRequest, TestResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;
use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use std::sync::Arc;
use tracing::info;

/// `POST /test`: run a message through the generator without the messaging envelope.
pub async fn test_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TestRequest>, JsonRejection>,
) -> Result<Json<TestResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Message is required".to_string()))?;
    let phone_number = request.phone_number.unwrap_or_else(|| "test_user".to_string());
    let business_id = request.business_id;

    info!(
        "Test request for {} (business: {})",
        phone_number,
        business_id.as_deref().unwrap_or("-")
    );

    let ai_response = state
        .generator
        .respond(&message, &phone_number, business_id.as_deref())
        .await;

    // Only tenant-scoped test traffic is persisted.
    if business_id.is_some() {
        state
            .persister
            .persist(&phone_number, &message, &ai_response, business_id.as_deref());
    }

    Ok(Json(TestResponse {
        user_message: message,
        ai_response,
        success: true,
        business_id,
    }))
}
