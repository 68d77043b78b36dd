// src/services/gateway.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::message::{CardButton, QuickReply};

const PROFILE_FIELDS: &str = "first_name,last_name,profile_pic,locale,timezone,gender";
const DEFAULT_QUICK_REPLY_PROMPT: &str = "Please choose one:";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("platform error: {0}")]
    Remote(Value),
}

/// Outbound send primitives of the chat platform.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), GatewayError>;

    async fn send_card(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: &str,
        image_url: &str,
        buttons: &[CardButton],
    ) -> Result<(), GatewayError>;

    async fn send_quick_reply(
        &self,
        recipient_id: &str,
        prompt: &str,
        replies: &[QuickReply],
    ) -> Result<(), GatewayError>;

    async fn send_image(&self, recipient_id: &str, image_url: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub first_name: Option<String>,
}

/// Account-level platform calls that are not message sends.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Look up a user. An unreadable profile body yields an empty profile.
    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, GatewayError>;

    /// Subscribe the app to the page's webhook events.
    async fn subscribe_app(&self) -> Result<(), GatewayError>;
}

/// Messenger Graph API client.
#[derive(Debug, Clone)]
pub struct FacebookClient {
    http: reqwest::Client,
    graph_url: String,
    page_token: String,
}

impl FacebookClient {
    pub fn new(graph_url: impl Into<String>, page_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            graph_url: graph_url.into().trim_end_matches('/').to_string(),
            page_token: page_token.into(),
        }
    }

    async fn call_send_api(&self, recipient_id: &str, message: Value) -> Result<(), GatewayError> {
        let body = json!({
            "recipient": { "id": recipient_id },
            "message": message,
        });

        let response = self
            .http
            .post(format!("{}/me/messages", self.graph_url))
            .query(&[("access_token", self.page_token.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text) {
            if let Some(error) = map.get("error") {
                return Err(GatewayError::Remote(error.clone()));
            }
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessageGateway for FacebookClient {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), GatewayError> {
        self.call_send_api(recipient_id, json!({ "text": text })).await
    }

    async fn send_card(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: &str,
        image_url: &str,
        buttons: &[CardButton],
    ) -> Result<(), GatewayError> {
        let message = json!({
            "attachment": {
                "type": "template",
                "payload": {
                    "template_type": "generic",
                    "elements": [{
                        "title": title,
                        "subtitle": subtitle,
                        "image_url": image_url,
                        "buttons": buttons,
                    }],
                },
            },
        });
        self.call_send_api(recipient_id, message).await
    }

    async fn send_quick_reply(
        &self,
        recipient_id: &str,
        prompt: &str,
        replies: &[QuickReply],
    ) -> Result<(), GatewayError> {
        let quick_replies: Vec<Value> = replies
            .iter()
            .map(|r| {
                json!({
                    "content_type": "text",
                    "title": r.text,
                    "payload": r.payload,
                })
            })
            .collect();

        let text = if prompt.is_empty() {
            DEFAULT_QUICK_REPLY_PROMPT
        } else {
            prompt
        };
        let message = json!({ "text": text, "quick_replies": quick_replies });
        self.call_send_api(recipient_id, message).await
    }

    async fn send_image(&self, recipient_id: &str, image_url: &str) -> Result<(), GatewayError> {
        let message = json!({
            "attachment": {
                "type": "image",
                "payload": { "url": image_url },
            },
        });
        self.call_send_api(recipient_id, message).await
    }
}

#[async_trait]
impl PlatformApi for FacebookClient {
    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
        let body = self
            .http
            .get(format!("{}/{}", self.graph_url, user_id))
            .query(&[("fields", PROFILE_FIELDS), ("access_token", self.page_token.as_str())])
            .send()
            .await?
            .text()
            .await?;

        match serde_json::from_str::<UserProfile>(&body) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                warn!(user_id, error = %e, "could not parse user profile");
                Ok(UserProfile::default())
            }
        }
    }

    async fn subscribe_app(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}/me/subscribed_apps", self.graph_url))
            .query(&[("access_token", self.page_token.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!(result = %body, "subscribed to page events");
        Ok(())
    }
}
