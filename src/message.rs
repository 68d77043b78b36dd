// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---- Inbound webhook payload ----

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    pub messaging: Option<Vec<MessagingEvent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    pub message: Option<InboundMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub text: Option<String>,
}

impl MessagingEvent {
    /// Page-scoped sender id. Messenger ids can arrive as JSON numbers.
    pub fn sender_id(&self) -> String {
        match &self.sender.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.text.as_deref())
            .filter(|t| !t.is_empty())
    }
}

// ---- NLU reply items ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageItem {
    Text {
        body: String,
    },
    Card {
        title: String,
        subtitle: String,
        image_url: String,
        buttons: Vec<ButtonSpec>,
    },
    QuickReply {
        prompt: String,
        options: Vec<String>,
    },
    Image {
        image_url: String,
    },
    /// A type code this bridge does not render.
    Unsupported {
        code: Value,
    },
}

/// One conversation turn's reply, in display order.
pub type NluResponse = Vec<MessageItem>;

// Items in `result.fulfillment.messages` are read field by field: a field that
// is missing, null or of the wrong shape counts as empty, so one odd item never
// costs the rest of the reply.

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn array_field<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `speech` is either a string or a list of lines.
fn speech_text(raw: &Value) -> String {
    match raw.get("speech") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

impl ButtonSpec {
    /// Read a `{text, postback | payload}` button; the label doubles as payload.
    pub fn from_value(raw: &Value) -> Self {
        let label = string_field(raw, "text");
        let payload = ["postback", "payload"]
            .into_iter()
            .map(|key| string_field(raw, key))
            .find(|p| !p.is_empty())
            .unwrap_or_else(|| label.clone());
        ButtonSpec { label, payload }
    }
}

impl From<&Value> for MessageItem {
    fn from(raw: &Value) -> Self {
        let code = raw.get("type").cloned().unwrap_or(Value::Null);
        match code.as_i64() {
            Some(0) => MessageItem::Text {
                body: speech_text(raw),
            },
            Some(1) => MessageItem::Card {
                title: string_field(raw, "title"),
                subtitle: string_field(raw, "subtitle"),
                image_url: string_field(raw, "imageUrl"),
                buttons: array_field(raw, "buttons")
                    .iter()
                    .filter(|b| b.is_object())
                    .map(ButtonSpec::from_value)
                    .collect(),
            },
            Some(2) => MessageItem::QuickReply {
                prompt: string_field(raw, "title"),
                options: array_field(raw, "replies")
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            },
            Some(3) => MessageItem::Image {
                image_url: string_field(raw, "imageUrl"),
            },
            _ => MessageItem::Unsupported { code },
        }
    }
}

// ---- Outbound shapes handed to the gateway ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardButton {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub payload: String,
}

impl CardButton {
    pub fn postback(button: ButtonSpec) -> Self {
        Self {
            kind: "postback".to_string(),
            title: button.label,
            payload: button.payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub text: String,
    pub payload: String,
}

impl QuickReply {
    pub fn echo(option: String) -> Self {
        Self {
            payload: option.clone(),
            text: option,
        }
    }
}
