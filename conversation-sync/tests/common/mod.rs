//! Shared fixtures for conversation-sync integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use conversation_sync::{
    ChatMessage, Conversation, ConversationSyncEngine, MessagesApi, SendManualRequest,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use wabot_core::channel::{EVENT_CUSTOMER_TYPING, EVENT_NEW_MESSAGE, EVENT_STATUS_UPDATE};
use wabot_core::{ApiError, InMemoryChannel, RealtimeEvent, SessionContext};

pub const NUMBER: &str = "n1";

/// In-memory [`MessagesApi`]: fixed snapshots, recorded sends, optional send failure and an
/// optional gate that holds each send until notified.
pub struct MockMessagesApi {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<ChatMessage>,
    pub send_error: Mutex<Option<ApiError>>,
    pub sent: Mutex<Vec<SendManualRequest>>,
    pub send_gate: Option<Arc<Notify>>,
}

impl MockMessagesApi {
    pub fn new() -> Self {
        Self {
            conversations: Vec::new(),
            messages: Vec::new(),
            send_error: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            send_gate: None,
        }
    }

    pub fn with_conversations(mut self, conversations: Vec<Conversation>) -> Self {
        self.conversations = conversations;
        self
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn fail_send(self, err: ApiError) -> Self {
        *self.send_error.lock().unwrap() = Some(err);
        self
    }

    pub fn hold_sends(mut self, gate: Arc<Notify>) -> Self {
        self.send_gate = Some(gate);
        self
    }

    pub fn sent(&self) -> Vec<SendManualRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagesApi for MockMessagesApi {
    async fn fetch_conversations(
        &self,
        _session: &SessionContext,
    ) -> Result<Vec<Conversation>, ApiError> {
        Ok(self.conversations.clone())
    }

    async fn fetch_messages(
        &self,
        _session: &SessionContext,
        customer_wa_id: &str,
        whatsapp_number_id: &str,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        Ok(self
            .messages
            .iter()
            .filter(|m| {
                m.customer_wa_id == customer_wa_id && m.whatsapp_number_id == whatsapp_number_id
            })
            .cloned()
            .collect())
    }

    async fn send_manual(
        &self,
        _session: &SessionContext,
        request: &SendManualRequest,
    ) -> Result<(), ApiError> {
        if let Some(gate) = &self.send_gate {
            gate.notified().await;
        }
        self.sent.lock().unwrap().push(request.clone());
        match self.send_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn session() -> SessionContext {
    SessionContext::new("token-abcdefgh", "user-42").with_whatsapp_number(NUMBER)
}

pub fn engine(api: MockMessagesApi) -> (ConversationSyncEngine, Arc<MockMessagesApi>, Arc<InMemoryChannel>) {
    let api = Arc::new(api);
    let channel = Arc::new(InMemoryChannel::new());
    let engine = ConversationSyncEngine::new(session(), api.clone(), channel.clone());
    (engine, api, channel)
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap()
}

pub fn message_json(id: &str, customer: &str, from: &str, body: &str, minute: u32) -> Value {
    json!({
        "messageId": id,
        "content": {"body": body},
        "timestamp": at(minute).to_rfc3339(),
        "from": from,
        "status": "sent",
        "customerWaId": customer,
        "whatsAppNumberId": NUMBER,
    })
}

pub fn message(id: &str, customer: &str, from: &str, body: &str, minute: u32) -> ChatMessage {
    serde_json::from_value(message_json(id, customer, from, body, minute)).unwrap()
}

pub fn new_message(id: &str, customer: &str, from: &str, body: &str) -> RealtimeEvent {
    RealtimeEvent::new(EVENT_NEW_MESSAGE, message_json(id, customer, from, body, 30))
}

pub fn status_update(message_id: &str, status: &str, customer: Option<&str>) -> RealtimeEvent {
    let mut payload = json!({"messageId": message_id, "status": status});
    if let Some(c) = customer {
        payload["customerWaId"] = json!(c);
    }
    RealtimeEvent::new(EVENT_STATUS_UPDATE, payload)
}

pub fn typing(customer: &str, is_typing: bool) -> RealtimeEvent {
    RealtimeEvent::new(
        EVENT_CUSTOMER_TYPING,
        json!({"customerWaId": customer, "whatsAppNumberId": NUMBER, "typing": is_typing}),
    )
}
