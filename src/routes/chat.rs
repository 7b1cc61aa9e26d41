use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::Method,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::AppError,
    message::ChatResponse,
    services::chat_proxy::InboundBody,
    state::SharedState,
};

// Mounted with `any` so that non-POST methods get the JSON 405 body.
pub async fn chat_handler(
    State(state): State<SharedState>,
    method: Method,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id, %method);

    async move {
        let result = state
            .proxy
            .handle(&method, InboundBody::Raw(body.to_vec()))
            .await;
        match &result {
            Ok(_) => tracing::info!("chat reply sent"),
            Err(err) => tracing::info!(status = %err.status(), error = %err, "chat request rejected"),
        }
        result.map(Json)
    }
    .instrument(span)
    .await
}
