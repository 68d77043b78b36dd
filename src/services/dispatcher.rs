// src/services/dispatcher.rs
use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use super::gateway::{GatewayError, MessageGateway};
use super::translator::{OutboundOp, translate};
use crate::message::NluResponse;

pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub items: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Sends the parts of one reply in order, pausing between reply items.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn MessageGateway>,
    item_delay: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn MessageGateway>, item_delay: Duration) -> Self {
        Self {
            gateway,
            item_delay,
        }
    }

    /// Dispatch `response` and call `on_complete` once everything was attempted.
    pub async fn dispatch_then<F>(&self, recipient_id: &str, response: NluResponse, on_complete: F)
    where
        F: FnOnce(DispatchSummary),
    {
        let summary = self.dispatch(recipient_id, response).await;
        on_complete(summary);
    }

    /// Walk the reply items in order. Ops of one item go out back to back;
    /// the item delay is observed between items, not after the last one.
    /// A failed send is logged and does not stop the rest of the reply.
    pub async fn dispatch(&self, recipient_id: &str, response: NluResponse) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let total = response.len();

        for (index, item) in response.into_iter().enumerate() {
            if index > 0 && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }
            summary.items += 1;

            for op in translate(item) {
                match self.perform(recipient_id, &op).await {
                    Ok(()) => summary.sent += 1,
                    Err(e) => {
                        summary.failed += 1;
                        warn!(
                            recipient = recipient_id,
                            op = op.kind(),
                            error = %e,
                            "send failed, continuing with the rest of the reply"
                        );
                    }
                }
            }
            debug!(recipient = recipient_id, item = index + 1, total, "reply item dispatched");
        }
        summary
    }

    async fn perform(&self, recipient_id: &str, op: &OutboundOp) -> Result<(), GatewayError> {
        match op {
            OutboundOp::Text(text) => self.gateway.send_text(recipient_id, text).await,
            OutboundOp::Card {
                title,
                subtitle,
                image_url,
                buttons,
            } => {
                self.gateway
                    .send_card(recipient_id, title, subtitle, image_url, buttons)
                    .await
            }
            OutboundOp::QuickReply { prompt, replies } => {
                self.gateway
                    .send_quick_reply(recipient_id, prompt, replies)
                    .await
            }
            OutboundOp::Image(image_url) => self.gateway.send_image(recipient_id, image_url).await,
        }
    }
}
