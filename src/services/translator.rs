// src/services/translator.rs
use tracing::debug;

use super::chunker::split_response;
use crate::message::{CardButton, MessageItem, QuickReply};

/// A single call against the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOp {
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

impl OutboundOp {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundOp::Text(_) => "text",
            OutboundOp::Card { .. } => "card",
            OutboundOp::QuickReply { .. } => "quick_reply",
            OutboundOp::Image(_) => "image",
        }
    }
}

/// Turn one reply item into the sends that render it, in order.
pub fn translate(item: MessageItem) -> Vec<OutboundOp> {
    match item {
        MessageItem::Text { body } => split_response(&body)
            .into_iter()
            .map(OutboundOp::Text)
            .collect(),

        MessageItem::Card {
            title,
            subtitle,
            image_url,
            buttons,
        } => vec![OutboundOp::Card {
            title,
            subtitle,
            image_url,
            buttons: buttons.into_iter().map(CardButton::postback).collect(),
        }],

        MessageItem::QuickReply { options, .. } if options.is_empty() => Vec::new(),
        MessageItem::QuickReply { prompt, options } => vec![OutboundOp::QuickReply {
            prompt,
            replies: options.into_iter().map(QuickReply::echo).collect(),
        }],

        MessageItem::Image { image_url } if image_url.is_empty() => Vec::new(),
        MessageItem::Image { image_url } => vec![OutboundOp::Image(image_url)],

        MessageItem::Unsupported { code } => {
            debug!(%code, "skipping unsupported message type");
            Vec::new()
        }
    }
}
