use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    error::AppError,
    message::WebhookBody,
    services::nlu_client::NluPayload,
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// Messenger verification handshake. A successful handshake also renews the
// page subscription once the platform has had time to settle.
pub async fn verify_handler(
    State(state): State<SharedState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    if params.verify_token.as_deref() != Some(state.verify_token.as_str()) {
        warn!("webhook verification with wrong token");
        return (StatusCode::FORBIDDEN, "Error, wrong validation token".to_string());
    }

    let platform = state.platform.clone();
    let delay = state.subscribe_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = platform.subscribe_app().await {
            error!(error = %e, "subscription after verification failed");
        }
    });

    (StatusCode::OK, params.challenge.unwrap_or_default())
}

pub async fn events_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let data: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook body: {e}")))?;

    if data.entry.iter().all(|entry| entry.messaging.is_none()) {
        return Err(AppError::BadRequest(
            "webhook body has no messaging entries".to_string(),
        ));
    }

    for event in data
        .entry
        .into_iter()
        .flat_map(|entry| entry.messaging.unwrap_or_default())
    {
        let router = state.router.clone();
        tokio::spawn(async move { router.handle_event(event).await });
    }

    Ok(Json(json!({ "status": "ok" })))
}

// Replays an NLU payload to the configured test recipient without a round trip
// through the NLU backend.
pub async fn nlu_callback_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let Some(recipient) = state.test_recipient_id.clone() else {
        return Err(AppError::NotFound("no test recipient configured".to_string()));
    };
    let payload: NluPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid nlu payload: {e}")))?;

    info!(recipient = %recipient, "replaying nlu payload");
    let router = state.router.clone();
    tokio::spawn(async move { router.deliver(&recipient, payload).await });

    Ok(Json(json!({ "status": "ok" })))
}
