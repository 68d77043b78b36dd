// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::services::dispatcher::Dispatcher;
use crate::services::gateway::{FacebookClient, MessageGateway, PlatformApi};
use crate::services::nlu_client::{ApiAiClient, NluBackend};
use crate::services::router::ConversationRouter;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub verify_token: String,
    pub subscribe_delay: Duration,
    pub test_recipient_id: Option<String>,
    pub platform: Arc<dyn PlatformApi>,
    pub router: ConversationRouter,
}

impl AppState {
    pub fn new(
        config: &Config,
        gateway: Arc<dyn MessageGateway>,
        platform: Arc<dyn PlatformApi>,
        nlu: Arc<dyn NluBackend>,
    ) -> Self {
        let dispatcher = Dispatcher::new(gateway, config.dispatch_delay);
        let router = ConversationRouter::new(
            SessionManager::new(config.session_ttl),
            platform.clone(),
            nlu,
            dispatcher,
        );
        Self {
            verify_token: config.fb_verify_token.clone(),
            subscribe_delay: config.subscribe_delay,
            test_recipient_id: config.test_recipient_id.clone(),
            platform,
            router,
        }
    }

    /// Wire up the Messenger and API.AI clients described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let facebook = Arc::new(FacebookClient::new(
            config.fb_graph_url.clone(),
            config.fb_page_access_token.clone(),
        ));
        let nlu = Arc::new(ApiAiClient::new(
            config.apiai_base_url.clone(),
            config.apiai_access_token.clone(),
            config.apiai_lang.clone(),
        ));
        Self::new(config, facebook.clone(), facebook, nlu)
    }
}
