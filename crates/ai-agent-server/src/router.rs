use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;
use crate::utils::error::ApiError;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Messaging provider
        .route("/webhook", post(handlers::webhook::webhook_handler))
        .route("/webhook/{tenant_id}", post(handlers::webhook::tenant_webhook_handler))
        // API
        .route("/test", post(handlers::test_endpoint::test_handler))
        .route("/health", get(handlers::health::health_check))
        // Diagnostics
        .route("/logs", get(handlers::diagnostics::logs_handler))
        .route("/messages", get(handlers::diagnostics::messages_handler))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());

    tracing::error!("Handler panicked: {}", detail);
    ApiError::InternalError("Internal server error".to_string()).into_response()
}
