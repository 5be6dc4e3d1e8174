//! REST seam for conversations and messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wabot_core::{ApiError, SessionContext};

use crate::types::{ChatMessage, Conversation};

/// Body of `POST /messages/send-manual`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendManualRequest {
    #[serde(rename = "whatsAppNumberId")]
    pub whatsapp_number_id: String,
    pub customer_wa_id: String,
    pub message: String,
}

#[async_trait]
pub trait MessagesApi: Send + Sync {
    /// `GET /messages/conversations/{userId}`.
    async fn fetch_conversations(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Conversation>, ApiError>;

    /// `GET /messages/conversation/{customerWaId}/{whatsAppNumberId}`.
    async fn fetch_messages(
        &self,
        session: &SessionContext,
        customer_wa_id: &str,
        whatsapp_number_id: &str,
    ) -> Result<Vec<ChatMessage>, ApiError>;

    /// `POST /messages/send-manual`.
    async fn send_manual(
        &self,
        session: &SessionContext,
        request: &SendManualRequest,
    ) -> Result<(), ApiError>;
}
