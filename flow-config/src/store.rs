//! Persistence seam for bot settings and the load/save flow around it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use wabot_core::{ApiError, SessionContext};

use crate::error::{FlowError, Result};
use crate::model::FlowConfigModel;
use crate::types::FlowConfig;

/// Body returned by `PATCH /user/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Reads and writes the `botSettings` of a user record.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `GET /user/{id}`; `None` when the user has no saved settings yet.
    async fn fetch_settings(
        &self,
        session: &SessionContext,
    ) -> std::result::Result<Option<FlowConfig>, ApiError>;

    /// `PATCH /user/{id}` with `{ botSettings }`.
    async fn update_settings(
        &self,
        session: &SessionContext,
        settings: &FlowConfig,
    ) -> std::result::Result<SaveResponse, ApiError>;
}

impl FlowConfigModel {
    /// Builds a model from the persisted settings, or defaults when none are stored.
    #[instrument(skip(store, session), fields(user_id = %session.user_id))]
    pub async fn load(store: &dyn SettingsStore, session: SessionContext) -> Result<Self> {
        let settings = store
            .fetch_settings(&session)
            .await
            .map_err(FlowError::LoadFailed)?;
        let found = settings.is_some();
        let config = settings.unwrap_or_default();
        info!(
            found,
            template = config.template.as_str(),
            menu_items = config.menu_items.len(),
            form_fields = config.form_fields.len(),
            "bot settings loaded"
        );
        Ok(Self::new(session, config))
    }

    /// Validates, cleans and submits the draft in one `PATCH`. Nothing is sent when validation
    /// fails; the draft is kept unchanged in every case so the caller can retry.
    #[instrument(skip(self, store), fields(user_id = %self.session.user_id))]
    pub async fn save(&self, store: &dyn SettingsStore) -> Result<SaveResponse> {
        self.validate_for_save()?;
        let document = self.build_cleaned_document();
        let response = store
            .update_settings(&self.session, &document)
            .await
            .map_err(|e| {
                error!(error = %e, "saving bot settings failed");
                FlowError::PersistenceFailed(e.to_string())
            })?;
        if !response.success {
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| "server reported failure".to_string());
            error!(message = %message, "bot settings rejected");
            return Err(FlowError::PersistenceFailed(message));
        }
        info!(
            menu_items = document.menu_items.len(),
            form_fields = document.form_fields.len(),
            "bot settings saved"
        );
        Ok(response)
    }
}
