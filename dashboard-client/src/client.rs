//! HTTP implementation of [`SettingsStore`] and [`MessagesApi`] over the dashboard REST API.

use async_trait::async_trait;
use conversation_sync::{ChatMessage, Conversation, MessagesApi, SendManualRequest};
use flow_config::{FlowConfig, SaveResponse, SettingsStore};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use wabot_core::{ApiError, SessionContext};

use crate::config::ClientConfig;

/// `GET /user/{id}`: profile fields are ignored, only `botSettings` is read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(default)]
    bot_settings: Option<FlowConfig>,
}

/// Some deployments wrap the user record as `{ user: {...} }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserResponse {
    Wrapped { user: UserRecord },
    Bare(UserRecord),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsBody<'a> {
    bot_settings: &'a FlowConfig,
}

/// List endpoints answer either a bare array or an object keyed by the collection name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Bare(Vec<T>),
    Conversations { conversations: Vec<T> },
    Messages { messages: Vec<T> },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(v)
            | ListResponse::Conversations { conversations: v }
            | ListResponse::Messages { messages: v } => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    client: Client,
    base_url: String,
}

impl HttpDashboardClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder, session: &SessionContext) -> Result<Response, ApiError> {
        let response = request
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(user_id = %session.user_id, "dashboard API rejected the session token");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SettingsStore for HttpDashboardClient {
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn fetch_settings(
        &self,
        session: &SessionContext,
    ) -> Result<Option<FlowConfig>, ApiError> {
        let url = self.url(&format!("/user/{}", session.user_id));
        let response = Self::send(self.client.get(&url), session).await?;
        let record = match Self::json::<UserResponse>(response).await? {
            UserResponse::Wrapped { user } => user,
            UserResponse::Bare(user) => user,
        };
        debug!(has_settings = record.bot_settings.is_some(), "user record fetched");
        Ok(record.bot_settings)
    }

    #[instrument(skip(self, session, settings), fields(user_id = %session.user_id))]
    async fn update_settings(
        &self,
        session: &SessionContext,
        settings: &FlowConfig,
    ) -> Result<SaveResponse, ApiError> {
        let url = self.url(&format!("/user/{}", session.user_id));
        let body = UpdateSettingsBody {
            bot_settings: settings,
        };
        let response = Self::send(self.client.patch(&url).json(&body), session).await?;
        Self::json(response).await
    }
}

#[async_trait]
impl MessagesApi for HttpDashboardClient {
    #[instrument(skip(self, session), fields(user_id = %session.user_id))]
    async fn fetch_conversations(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Conversation>, ApiError> {
        let url = self.url(&format!("/messages/conversations/{}", session.user_id));
        let response = Self::send(self.client.get(&url), session).await?;
        Ok(Self::json::<ListResponse<Conversation>>(response)
            .await?
            .into_vec())
    }

    #[instrument(skip(self, session))]
    async fn fetch_messages(
        &self,
        session: &SessionContext,
        customer_wa_id: &str,
        whatsapp_number_id: &str,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let url = self.url(&format!(
            "/messages/conversation/{}/{}",
            customer_wa_id, whatsapp_number_id
        ));
        let response = Self::send(self.client.get(&url), session).await?;
        Ok(Self::json::<ListResponse<ChatMessage>>(response)
            .await?
            .into_vec())
    }

    #[instrument(skip(self, session, request), fields(customer_wa_id = %request.customer_wa_id))]
    async fn send_manual(
        &self,
        session: &SessionContext,
        request: &SendManualRequest,
    ) -> Result<(), ApiError> {
        let url = self.url("/messages/send-manual");
        let response = Self::send(self.client.post(&url).json(request), session).await?;
        // An empty 2xx body counts as accepted.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(());
        }
        let reply: SendResponse =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !reply.success {
            return Err(ApiError::Rejected(
                reply.message.unwrap_or_else(|| "send rejected".to_string()),
            ));
        }
        Ok(())
    }
}
