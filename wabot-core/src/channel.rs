//! Realtime channel abstraction.
//!
//! [`RealtimeChannel`] is the narrow seam the conversation engine talks to: it emits room-scoping
//! events and hands out a receiver of inbound events. [`InMemoryChannel`] is the in-process
//! implementation used by tests and offline tooling; a socket-backed one lives outside the core.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

pub const EVENT_NEW_MESSAGE: &str = "new-message";
pub const EVENT_STATUS_UPDATE: &str = "message-status-update";
pub const EVENT_CUSTOMER_TYPING: &str = "customer-typing";

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Already subscribed")]
    AlreadySubscribed,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// One inbound event as delivered by the transport: name plus untyped JSON payload.
/// Payload decoding happens in the consumer so malformed events can be dropped there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub name: String,
    pub payload: Value,
}

impl RealtimeEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Room-scoping events emitted by the client. The core never processes their replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    JoinUserRoom {
        user_id: String,
    },
    JoinConversation {
        customer_wa_id: String,
        whatsapp_number_id: String,
    },
    LeaveConversation {
        customer_wa_id: String,
        whatsapp_number_id: String,
    },
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinUserRoom { .. } => "join-user-room",
            OutboundEvent::JoinConversation { .. } => "join-conversation",
            OutboundEvent::LeaveConversation { .. } => "leave-conversation",
        }
    }

    /// Wire payload of the event (camelCase keys).
    pub fn payload(&self) -> Value {
        match self {
            OutboundEvent::JoinUserRoom { user_id } => json!({ "userId": user_id }),
            OutboundEvent::JoinConversation {
                customer_wa_id,
                whatsapp_number_id,
            }
            | OutboundEvent::LeaveConversation {
                customer_wa_id,
                whatsapp_number_id,
            } => json!({
                "customerWaId": customer_wa_id,
                "whatsAppNumberId": whatsapp_number_id,
            }),
        }
    }
}

/// Narrow realtime interface: emit an event, subscribe to the inbound stream.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Emits a room-scoping event.
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError>;
    /// Returns the receiver of inbound events, in delivery order. Single consumer.
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<RealtimeEvent>, ChannelError>;
}

/// In-process channel: inbound events are pushed with [`InMemoryChannel::deliver`], outbound
/// events are recorded and can be inspected with [`InMemoryChannel::emitted`].
pub struct InMemoryChannel {
    sender: mpsc::UnboundedSender<RealtimeEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<RealtimeEvent>>>,
    emitted: Mutex<Vec<OutboundEvent>>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            emitted: Mutex::new(Vec::new()),
        }
    }

    /// Delivers an inbound event to the subscriber.
    pub fn deliver(&self, event: RealtimeEvent) -> Result<(), ChannelError> {
        self.sender.send(event).map_err(|_| ChannelError::Closed)
    }

    /// Snapshot of everything emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeChannel for InMemoryChannel {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        debug!(event = event.name(), payload = %event.payload(), "emit realtime event");
        let mut guard = self
            .emitted
            .lock()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        guard.push(event);
        Ok(())
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<RealtimeEvent>, ChannelError> {
        let mut guard = self
            .receiver
            .lock()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        guard.take().ok_or(ChannelError::AlreadySubscribed)
    }
}
