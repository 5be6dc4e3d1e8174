//! Chat value types: messages, conversations, presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of locally generated ids for messages not yet confirmed by the server.
pub const OPTIMISTIC_PREFIX: &str = "optimistic-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFrom {
    Customer,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub body: String,
}

/// One chat message. `_id` is the database id; `messageId` the WhatsApp id (or an
/// `optimistic-` id before confirmation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    pub from: MessageFrom,
    #[serde(default)]
    pub status: MessageStatus,
    pub customer_wa_id: String,
    #[serde(rename = "whatsAppNumberId")]
    pub whatsapp_number_id: String,
}

impl ChatMessage {
    pub fn body(&self) -> &str {
        &self.content.body
    }

    pub fn is_optimistic(&self) -> bool {
        self.message_id.starts_with(OPTIMISTIC_PREFIX)
    }

    /// True if `id` is either the database id or the WhatsApp message id.
    pub fn has_id(&self, id: &str) -> bool {
        self.message_id == id || self.id.as_deref() == Some(id)
    }

    pub fn belongs_to(&self, key: &ConversationKey) -> bool {
        self.customer_wa_id == key.customer_wa_id && self.whatsapp_number_id == key.whatsapp_number_id
    }
}

/// Identifies one thread: a customer on one of the business's WhatsApp numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub customer_wa_id: String,
    pub whatsapp_number_id: String,
}

impl ConversationKey {
    pub fn new(customer_wa_id: impl Into<String>, whatsapp_number_id: impl Into<String>) -> Self {
        Self {
            customer_wa_id: customer_wa_id.into(),
            whatsapp_number_id: whatsapp_number_id.into(),
        }
    }
}

/// Inbox entry for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub customer_wa_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(rename = "whatsAppNumberId", default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_number_id: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_message_from: Option<MessageFrom>,
    #[serde(default)]
    pub last_message_status: Option<MessageStatus>,
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// Entry for a customer seen for the first time through a realtime event.
    pub fn new(customer_wa_id: impl Into<String>) -> Self {
        let customer_wa_id = customer_wa_id.into();
        Self {
            customer_phone: customer_wa_id.clone(),
            customer_name: String::new(),
            customer_wa_id,
            whatsapp_number_id: None,
            last_message: String::new(),
            last_message_time: None,
            last_message_from: None,
            last_message_status: None,
            unread_count: 0,
        }
    }

    pub(crate) fn apply_last_message(&mut self, message: &ChatMessage) {
        self.last_message = message.content.body.clone();
        self.last_message_time = Some(message.timestamp);
        self.last_message_from = Some(message.from);
        self.last_message_status = Some(message.status);
        if self.whatsapp_number_id.is_none() {
            self.whatsapp_number_id = Some(message.whatsapp_number_id.clone());
        }
    }
}

/// Inferred customer activity in the open conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    #[default]
    Offline,
    Online,
    Typing,
}
