use crate::logging::{Direction, MessageLog};
use crate::models::InboundMessage;
use crate::services::conversation::FALLBACK_REPLY;
use crate::state::AppState;
use crate::utils::{preview, MessagingResponse};
use axum::extract::{rejection::FormRejection, Form, Path, State};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// `POST /webhook/{tenant_id}`
pub async fn tenant_webhook_handler(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> MessagingResponse {
    process_webhook(state, Some(tenant_id), form).await
}

/// `POST /webhook` (no tenant)
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> MessagingResponse {
    process_webhook(state, None, form).await
}

/// Always answers with a well-formed reply; failures become the fallback message.
async fn process_webhook(
    state: Arc<AppState>,
    tenant_id: Option<String>,
    form: Result<Form<InboundMessage>, FormRejection>,
) -> MessagingResponse {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "webhook",
        %request_id,
        business_id = tenant_id.as_deref().unwrap_or("-")
    );

    async move {
        let inbound = match form {
            Ok(Form(inbound)) => inbound,
            Err(rejection) => {
                let error_msg = format!("Error in business webhook: {}", rejection.body_text());
                return fallback(&state, &InboundMessage::default(), tenant_id.as_deref(), error_msg);
            }
        };

        // Runs on its own task so a panic surfaces as a JoinError instead of a dropped connection.
        let pipeline = {
            let state = state.clone();
            let inbound = inbound.clone();
            let tenant_id = tenant_id.clone();
            tokio::spawn(
                async move { run_pipeline(&state, &inbound, tenant_id.as_deref()).await }
                    .in_current_span(),
            )
        };

        match pipeline.await {
            Ok(reply) => {
                info!("Webhook response sent: {}", preview(&reply, 80));
                MessagingResponse::message(reply)
            }
            Err(e) => {
                let error_msg = format!("Error in business webhook: {}", e);
                fallback(&state, &inbound, tenant_id.as_deref(), error_msg)
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_pipeline(state: &AppState, inbound: &InboundMessage, tenant_id: Option<&str>) -> String {
    let message = inbound.body.trim();
    let sender = inbound.from.as_str();

    info!(
        from = %sender,
        to = %inbound.to,
        "Webhook received: {}",
        preview(message, 80)
    );

    state.message_logger.log(
        MessageLog::builder(Direction::Incoming, sender, message)
            .business_id(tenant_id)
            .build(),
    );

    let reply = state.generator.respond(message, sender, tenant_id).await;

    state.message_logger.log(
        MessageLog::builder(Direction::Outgoing, sender, reply.as_str())
            .response(reply.as_str())
            .business_id(tenant_id)
            .build(),
    );

    state.persister.persist(sender, message, &reply, tenant_id);

    reply
}

fn fallback(
    state: &AppState,
    inbound: &InboundMessage,
    tenant_id: Option<&str>,
    error_msg: String,
) -> MessagingResponse {
    error!("{}", error_msg);

    let sender = if inbound.from.is_empty() { "unknown" } else { inbound.from.as_str() };
    let message = if inbound.body.is_empty() { "unknown" } else { inbound.body.as_str() };
    state.message_logger.log(
        MessageLog::builder(Direction::Error, sender, message)
            .error(error_msg)
            .business_id(tenant_id)
            .build(),
    );

    MessagingResponse::message(FALLBACK_REPLY)
}
