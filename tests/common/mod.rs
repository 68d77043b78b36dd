#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use messenger_nlu_bridge::message::{CardButton, QuickReply};
use messenger_nlu_bridge::services::gateway::{
    GatewayError, MessageGateway, PlatformApi, UserProfile,
};
use messenger_nlu_bridge::services::nlu_client::{NluBackend, NluError, NluPayload, NluQuery};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Card {
        title: String,
        subtitle: String,
        image_url: String,
        buttons: Vec<CardButton>,
    },
    QuickReply {
        prompt: String,
        replies: Vec<QuickReply>,
    },
    Image(String),
}

/// Records every send with the (tokio) time it happened.
#[derive(Default)]
pub struct RecordingGateway {
    pub calls: Mutex<Vec<(Instant, String, Sent)>>,
    pub fail_images: bool,
}

impl RecordingGateway {
    pub fn failing_images() -> Self {
        Self {
            fail_images: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, s)| s.clone())
            .collect()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _, _)| *t).collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r, _)| r.clone())
            .collect()
    }

    fn record(&self, recipient: &str, sent: Sent) {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), recipient.to_string(), sent));
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), GatewayError> {
        self.record(recipient_id, Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_card(
        &self,
        recipient_id: &str,
        title: &str,
        subtitle: &str,
        image_url: &str,
        buttons: &[CardButton],
    ) -> Result<(), GatewayError> {
        self.record(
            recipient_id,
            Sent::Card {
                title: title.to_string(),
                subtitle: subtitle.to_string(),
                image_url: image_url.to_string(),
                buttons: buttons.to_vec(),
            },
        );
        Ok(())
    }

    async fn send_quick_reply(
        &self,
        recipient_id: &str,
        prompt: &str,
        replies: &[QuickReply],
    ) -> Result<(), GatewayError> {
        self.record(
            recipient_id,
            Sent::QuickReply {
                prompt: prompt.to_string(),
                replies: replies.to_vec(),
            },
        );
        Ok(())
    }

    async fn send_image(&self, recipient_id: &str, image_url: &str) -> Result<(), GatewayError> {
        self.record(recipient_id, Sent::Image(image_url.to_string()));
        if self.fail_images {
            return Err(GatewayError::Status {
                status: 400,
                body: "bad image".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct StubPlatform {
    pub first_name: Option<String>,
    pub subscriptions: Mutex<usize>,
}

#[async_trait]
impl PlatformApi for StubPlatform {
    async fn fetch_user_profile(&self, _user_id: &str) -> Result<UserProfile, GatewayError> {
        Ok(UserProfile {
            first_name: self.first_name.clone(),
        })
    }

    async fn subscribe_app(&self) -> Result<(), GatewayError> {
        *self.subscriptions.lock().unwrap() += 1;
        Ok(())
    }
}

/// Answers every query with the same payload and remembers the queries.
pub struct StubNlu {
    pub reply: serde_json::Value,
    pub queries: Mutex<Vec<NluQuery>>,
}

impl StubNlu {
    pub fn replying(reply: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            reply,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NluBackend for StubNlu {
    async fn text_request(&self, query: NluQuery) -> Result<NluPayload, NluError> {
        self.queries.lock().unwrap().push(query);
        Ok(serde_json::from_value(self.reply.clone()).unwrap())
    }
}
