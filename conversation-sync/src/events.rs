//! Typed payloads of the inbound realtime events and their decoding.

use serde::{de::DeserializeOwned, Deserialize};
use wabot_core::channel::{EVENT_CUSTOMER_TYPING, EVENT_NEW_MESSAGE, EVENT_STATUS_UPDATE};
use wabot_core::RealtimeEvent;

use crate::error::{Result, SyncError};
use crate::types::{ChatMessage, MessageStatus};

/// `new-message`: the message itself plus optional customer details for inbox entries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageEvent {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// `message-status-update`. Some senders omit `customerWaId`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateEvent {
    pub message_id: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub customer_wa_id: Option<String>,
}

/// `customer-typing`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub customer_wa_id: String,
    #[serde(rename = "whatsAppNumberId")]
    pub whatsapp_number_id: String,
    #[serde(alias = "isTyping")]
    pub typing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    NewMessage(NewMessageEvent),
    StatusUpdate(StatusUpdateEvent),
    Typing(TypingEvent),
}

fn decode<T: DeserializeOwned>(event: &RealtimeEvent) -> Result<T> {
    serde_json::from_value(event.payload.clone()).map_err(|e| SyncError::MalformedEvent {
        name: event.name.clone(),
        reason: e.to_string(),
    })
}

fn require_non_empty(event: &RealtimeEvent, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::MalformedEvent {
            name: event.name.clone(),
            reason: format!("empty {}", field),
        });
    }
    Ok(())
}

impl InboundEvent {
    pub fn decode(event: &RealtimeEvent) -> Result<Self> {
        match event.name.as_str() {
            EVENT_NEW_MESSAGE => {
                let ev: NewMessageEvent = decode(event)?;
                require_non_empty(event, "customerWaId", &ev.message.customer_wa_id)?;
                require_non_empty(event, "whatsAppNumberId", &ev.message.whatsapp_number_id)?;
                Ok(InboundEvent::NewMessage(ev))
            }
            EVENT_STATUS_UPDATE => {
                let ev: StatusUpdateEvent = decode(event)?;
                require_non_empty(event, "messageId", &ev.message_id)?;
                Ok(InboundEvent::StatusUpdate(ev))
            }
            EVENT_CUSTOMER_TYPING => {
                let ev: TypingEvent = decode(event)?;
                require_non_empty(event, "customerWaId", &ev.customer_wa_id)?;
                Ok(InboundEvent::Typing(ev))
            }
            other => Err(SyncError::UnknownEvent(other.to_string())),
        }
    }
}
