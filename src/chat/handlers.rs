use axum::{
    extract::{rejection::BytesRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, error, instrument, warn};

use super::dto::{ChatRequest, HistoryEntry};
use crate::{
    completion::dto::CompletionResponse, error::ApiError, identity::UserIdentity,
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/history", get(history))
}

/// POST /chat {"message": "..."} → {"choices":[{"message":{"content":"..."}}]}
///
/// A newly issued identity cookie is attached to the response whatever the outcome.
#[instrument(skip_all, fields(user_id = %identity.user_id, new_user = identity.is_new()))]
pub async fn chat(
    State(state): State<AppState>,
    identity: UserIdentity,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let outcome = reply(&state, &identity.user_id, body).await;
    (identity, outcome).into_response()
}

async fn reply(
    state: &AppState,
    user_id: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let body = body.map_err(|e| {
        warn!(error = %e, "read chat body failed");
        ApiError::ReadBody
    })?;
    let request = parse_chat_request(&body).map_err(|e| {
        warn!(error = %e, "parse chat body failed");
        ApiError::ParseBody
    })?;

    let answer = state.completion.complete(&request.message).await.map_err(|e| {
        error!(error = %e, "completion failed");
        ApiError::Completion
    })?;

    // Recording is best-effort: the reply is returned even if the insert fails.
    if let Err(e) = state
        .store
        .append_message(user_id, &request.message, &answer)
        .await
    {
        error!(error = %e, "save message failed");
    }

    debug!("chat reply sent");
    Ok(Json(CompletionResponse::single(answer)))
}

fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, serde_json::Error> {
    // A bare `null` body reads as an empty message.
    serde_json::from_slice::<Option<ChatRequest>>(body).map(Option::unwrap_or_default)
}

/// GET /history → [{"user_message", "bot_response", "timestamp"}], oldest first.
#[instrument(skip_all, fields(user_id = %identity.user_id, new_user = identity.is_new()))]
pub async fn history(State(state): State<AppState>, identity: UserIdentity) -> Response {
    let outcome: Result<Json<Vec<HistoryEntry>>, ApiError> = state
        .store
        .history(&identity.user_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "load history failed");
            ApiError::History
        });
    (identity, outcome).into_response()
}
