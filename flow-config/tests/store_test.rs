//! Tests for [`flow_config::FlowConfigModel::load`] and [`flow_config::FlowConfigModel::save`]
//! against an in-memory [`SettingsStore`].

use std::sync::Mutex;

use async_trait::async_trait;
use flow_config::{
    FlowConfig, FlowConfigModel, FlowError, ItemMetadata, MenuItemKind, MenuItemUpdate,
    SaveResponse, SettingsStore, TemplateKind,
};
use wabot_core::{ApiError, SessionContext};

/// Records every PATCH body; answers with a configurable outcome.
struct MockSettingsStore {
    stored: Option<FlowConfig>,
    outcome: Mutex<Option<Result<SaveResponse, ApiError>>>,
    saved: Mutex<Vec<FlowConfig>>,
}

impl MockSettingsStore {
    fn new(stored: Option<FlowConfig>) -> Self {
        Self {
            stored,
            outcome: Mutex::new(None),
            saved: Mutex::new(Vec::new()),
        }
    }

    fn answer(self, outcome: Result<SaveResponse, ApiError>) -> Self {
        *self.outcome.lock().unwrap() = Some(outcome);
        self
    }

    fn saved(&self) -> Vec<FlowConfig> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn fetch_settings(
        &self,
        session: &SessionContext,
    ) -> Result<Option<FlowConfig>, ApiError> {
        if session.token.is_empty() {
            return Err(ApiError::Unauthorized);
        }
        Ok(self.stored.clone())
    }

    async fn update_settings(
        &self,
        _session: &SessionContext,
        settings: &FlowConfig,
    ) -> Result<SaveResponse, ApiError> {
        self.saved.lock().unwrap().push(settings.clone());
        self.outcome.lock().unwrap().take().unwrap_or(Ok(SaveResponse {
            success: true,
            message: None,
        }))
    }
}

fn session() -> SessionContext {
    SessionContext::new("token-abcdefgh", "user-42")
}

/// **Test: a user without saved settings starts from defaults.**
#[tokio::test]
async fn test_load_without_settings_uses_defaults() {
    let store = MockSettingsStore::new(None);
    let model = FlowConfigModel::load(&store, session()).await.unwrap();
    assert_eq!(model.draft(), &FlowConfig::default());
    assert_eq!(model.session().user_id, "user-42");
}

/// **Test: load failure surfaces the API error.**
#[tokio::test]
async fn test_load_unauthorized() {
    let store = MockSettingsStore::new(None);
    let result = FlowConfigModel::load(&store, SessionContext::new("", "user-42")).await;
    assert!(matches!(
        result,
        Err(FlowError::LoadFailed(ApiError::Unauthorized))
    ));
}

/// **Test: save sends the cleaned document, not the raw draft.**
///
/// **Setup:** barberia preset plus a table item whose only row is blank.
/// **Expected:** one PATCH; the blank table payload is absent; the draft still has it.
#[tokio::test]
async fn test_save_sends_cleaned_document() {
    let mut stored = FlowConfig::default();
    stored.template = TemplateKind::Barberia;
    let store = MockSettingsStore::new(Some(stored));
    let mut model = FlowConfigModel::load(&store, session()).await.unwrap();
    model.select_template(TemplateKind::Barberia);
    let id = model.add_menu_item().unwrap();
    model
        .update_menu_item(&id, MenuItemUpdate::Kind(MenuItemKind::Table))
        .unwrap();

    let response = model.save(&store).await.unwrap();

    assert!(response.success);
    let saved = store.saved();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].menu_item(&id).unwrap().metadata.is_none());
    assert!(matches!(
        model.draft().menu_item(&id).unwrap().metadata,
        ItemMetadata::Table(_)
    ));
}

/// **Test: invalid drafts are never sent.**
#[tokio::test]
async fn test_save_aborts_on_validation_failure() {
    let store = MockSettingsStore::new(None);
    let mut model = FlowConfigModel::load(&store, session()).await.unwrap();
    model.set_greeting("a".repeat(400));

    let result = model.save(&store).await;

    assert!(matches!(result, Err(FlowError::ValidationFailed { .. })));
    assert!(store.saved().is_empty());
}

/// **Test: `success: false` and transport errors both map to PersistenceFailed; draft kept.**
#[tokio::test]
async fn test_save_persistence_failures() {
    let store = MockSettingsStore::new(None).answer(Ok(SaveResponse {
        success: false,
        message: Some("Usuario no encontrado".into()),
    }));
    let mut model = FlowConfigModel::load(&store, session()).await.unwrap();
    model.select_template(TemplateKind::Servicios);
    let before = model.draft().clone();

    match model.save(&store).await {
        Err(FlowError::PersistenceFailed(msg)) => assert_eq!(msg, "Usuario no encontrado"),
        other => panic!("expected PersistenceFailed, got {:?}", other),
    }
    assert_eq!(model.draft(), &before);

    let store = MockSettingsStore::new(None).answer(Err(ApiError::Http("connection reset".into())));
    assert!(matches!(
        model.save(&store).await,
        Err(FlowError::PersistenceFailed(_))
    ));
}
