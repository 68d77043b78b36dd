// src/services/nlu_client.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::message::{MessageItem, NluResponse};

const PROTOCOL_VERSION: &str = "20150910";

#[derive(Debug, Error)]
pub enum NluError {
    #[error("nlu request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("nlu returned {status}: {body}")]
    Status { status: u16, body: String },
}

// ---- Reply payload ----

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NluPayload {
    pub status: Option<NluStatus>,
    pub result: Option<NluResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NluStatus {
    pub code: Option<u16>,
    pub error_type: Option<String>,
    pub error_details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NluResult {
    /// Kept untyped; items are read one at a time in `into_response`.
    #[serde(default)]
    pub fulfillment: Value,
}

impl NluPayload {
    /// The reply items to send, or `None` when the payload has no result.
    pub fn into_response(self) -> Option<NluResponse> {
        if let Some(status) = &self.status {
            if status.code.is_some_and(|code| code >= 400) {
                warn!(
                    code = ?status.code,
                    error_type = ?status.error_type,
                    details = ?status.error_details,
                    "nlu reported an error status"
                );
            }
        }

        let fulfillment = self.result?.fulfillment;
        let items: NluResponse = fulfillment
            .get("messages")
            .and_then(Value::as_array)
            .map(|messages| messages.iter().map(MessageItem::from).collect())
            .unwrap_or_default();
        if !items.is_empty() {
            return Some(items);
        }

        Some(
            fulfillment
                .get("speech")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|body| vec![MessageItem::Text { body: body.to_string() }])
                .unwrap_or_default(),
        )
    }
}

// ---- Query ----

#[derive(Debug, Clone, Serialize)]
pub struct NluContext {
    pub name: String,
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NluQuery {
    pub text: String,
    pub session_id: String,
    pub contexts: Vec<NluContext>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    query: &'a str,
    lang: &'a str,
    session_id: &'a str,
    contexts: &'a [NluContext],
}

#[async_trait]
pub trait NluBackend: Send + Sync {
    async fn text_request(&self, query: NluQuery) -> Result<NluPayload, NluError>;
}

/// API.AI v1 `/query` client.
#[derive(Debug, Clone)]
pub struct ApiAiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    lang: String,
}

impl ApiAiClient {
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            lang: lang.into(),
        }
    }
}

#[async_trait]
impl NluBackend for ApiAiClient {
    async fn text_request(&self, query: NluQuery) -> Result<NluPayload, NluError> {
        let body = QueryBody {
            query: &query.text,
            lang: &self.lang,
            session_id: &query.session_id,
            contexts: &query.contexts,
        };

        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .query(&[("v", PROTOCOL_VERSION)])
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NluError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<NluPayload>().await?)
    }
}
