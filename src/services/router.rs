// src/services/router.rs
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::dispatcher::Dispatcher;
use super::gateway::PlatformApi;
use super::nlu_client::{NluBackend, NluContext, NluPayload, NluQuery};
use super::session_manager::SessionManager;
use crate::message::MessagingEvent;

const FALLBACK_FIRST_NAME: &str = "friend";
const CONTEXT_NAME: &str = "generic";

/// Connects inbound platform events to the NLU backend and sends its replies back.
#[derive(Clone)]
pub struct ConversationRouter {
    sessions: SessionManager,
    platform: Arc<dyn PlatformApi>,
    nlu: Arc<dyn NluBackend>,
    dispatcher: Dispatcher,
}

impl ConversationRouter {
    pub fn new(
        sessions: SessionManager,
        platform: Arc<dyn PlatformApi>,
        nlu: Arc<dyn NluBackend>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            sessions,
            platform,
            nlu,
            dispatcher,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub async fn handle_event(&self, event: MessagingEvent) {
        let Some(text) = event.text() else {
            debug!("ignoring event without text");
            return;
        };
        let sender = event.sender_id();
        let session_id = self.sessions.session_for(&sender).await;
        info!(sender = %sender, text, "got text from platform");

        let first_name = match self.platform.fetch_user_profile(&sender).await {
            Ok(profile) => profile
                .first_name
                .unwrap_or_else(|| FALLBACK_FIRST_NAME.to_string()),
            Err(e) => {
                error!(sender = %sender, error = %e, "user profile request failed");
                return;
            }
        };

        let mut parameters = Map::new();
        parameters.insert("facebook_user".to_string(), Value::String(first_name));
        let query = NluQuery {
            text: text.to_string(),
            session_id,
            contexts: vec![NluContext {
                name: CONTEXT_NAME.to_string(),
                parameters,
            }],
        };

        match self.nlu.text_request(query).await {
            Ok(payload) => self.deliver(&sender, payload).await,
            Err(e) => error!(sender = %sender, error = %e, "nlu request failed"),
        }
    }

    /// Send an NLU reply to `recipient_id`. Payloads without a result are dropped.
    pub async fn deliver(&self, recipient_id: &str, payload: NluPayload) {
        let Some(response) = payload.into_response() else {
            debug!(recipient = recipient_id, "nlu payload carries no result");
            return;
        };

        self.dispatcher
            .dispatch_then(recipient_id, response, |summary| {
                info!(
                    recipient = recipient_id,
                    items = summary.items,
                    sent = summary.sent,
                    failed = summary.failed,
                    "reply dispatched"
                );
            })
            .await;
    }
}
