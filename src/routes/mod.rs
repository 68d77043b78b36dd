// src/routes/mod.rs
pub mod webhook;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use webhook::{events_handler, nlu_callback_handler, verify_handler};

pub fn create_router() -> Router<SharedState> {
    let webhook = get(verify_handler).post(events_handler);

    Router::new()
        .route("/webhook", webhook.clone())
        .route("/webhook/", webhook)
        .route("/test-apiai-callback", post(nlu_callback_handler))
        .route("/test-apiai-callback/", post(nlu_callback_handler))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}
