//! Bot flow document: menu items, form fields, messages, schedule settings.
//!
//! Serialized with the backend's camelCase keys so a [`FlowConfig`] can be sent as
//! `botSettings` unchanged.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MAX_MENU_ITEMS: usize = 5;
pub const MAX_FORM_FIELDS: usize = 6;
pub const MENU_LABEL_MAX: usize = 24;
pub const FORM_LABEL_MAX: usize = 40;
pub const SERVICE_TYPE_MAX: usize = 24;
pub const MESSAGE_TEXT_MAX: usize = 320;
pub const TABLE_MIN_COLUMNS: usize = 2;
pub const TABLE_MAX_COLUMNS: usize = 4;
pub const TABLE_MIN_ROWS: usize = 1;
pub const TABLE_MAX_ROWS: usize = 10;
pub const LIST_MIN_OPTIONS: usize = 2;
pub const MIN_RECOMMENDATIONS: usize = 1;

pub const SCHEDULE_LABEL: &str = "Agendar cita";
pub const MODIFY_LABEL: &str = "Modificar / Cancelar";

/// Character count as the user sees it, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Consultorio,
    Barberia,
    Servicios,
    #[default]
    Custom,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Consultorio => "consultorio",
            TemplateKind::Barberia => "barberia",
            TemplateKind::Servicios => "servicios",
            TemplateKind::Custom => "custom",
        }
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consultorio" => Ok(TemplateKind::Consultorio),
            "barberia" | "barbería" => Ok(TemplateKind::Barberia),
            "servicios" => Ok(TemplateKind::Servicios),
            "custom" => Ok(TemplateKind::Custom),
            other => Err(format!("unknown template: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    #[default]
    Action,
    Table,
    List,
    Location,
    Handoff,
}

/// Semantic role of an action item. `Schedule` and `Modify` are held by at most one item each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKey {
    Schedule,
    Modify,
    Prices,
    Custom,
}

impl ActionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKey::Schedule => "schedule",
            ActionKey::Modify => "modify",
            ActionKey::Prices => "prices",
            ActionKey::Custom => "custom",
        }
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, ActionKey::Schedule | ActionKey::Modify)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Two blank columns and one blank row.
    pub fn blank() -> Self {
        Self {
            columns: vec![String::new(); TABLE_MIN_COLUMNS],
            rows: vec![vec![String::new(); TABLE_MIN_COLUMNS]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListData {
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationData {
    pub address: String,
}

/// A bookable service offered by the item that holds `actionKey = schedule`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleService {
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl ScheduleService {
    pub fn blank() -> Self {
        Self {
            service_type: String::new(),
            price: None,
            recommendations: vec![String::new()],
        }
    }
}

/// Per-item payload. Serialized externally tagged, as an object with one key
/// (`{"table": {...}}`, `{"services": [...]}`), or absent for `None`. Reading is lenient; see
/// [`MetaWire`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemMetadata {
    #[default]
    None,
    Table(TableData),
    List(ListData),
    Location(LocationData),
    Services(Vec<ScheduleService>),
}

/// `meta` as stored by the backend: any subset of the payload keys, `{}` or `null`.
/// The first present key wins, in `services`, `table`, `list`, `location` order; a payload that
/// does not match the item kind is dropped later by cleaning.
#[derive(Debug, Default, Deserialize)]
struct MetaWire {
    #[serde(default)]
    services: Option<Vec<ScheduleService>>,
    #[serde(default)]
    table: Option<TableData>,
    #[serde(default)]
    list: Option<ListData>,
    #[serde(default)]
    location: Option<LocationData>,
}

impl From<MetaWire> for ItemMetadata {
    fn from(wire: MetaWire) -> Self {
        if let Some(services) = wire.services {
            ItemMetadata::Services(services)
        } else if let Some(table) = wire.table {
            ItemMetadata::Table(table)
        } else if let Some(list) = wire.list {
            ItemMetadata::List(list)
        } else if let Some(location) = wire.location {
            ItemMetadata::Location(location)
        } else {
            ItemMetadata::None
        }
    }
}

fn deserialize_meta<'de, D>(deserializer: D) -> Result<ItemMetadata, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let wire = Option::<MetaWire>::deserialize(deserializer)?;
    Ok(wire.map(ItemMetadata::from).unwrap_or_default())
}

impl ItemMetadata {
    pub fn is_none(&self) -> bool {
        matches!(self, ItemMetadata::None)
    }

    /// Fresh payload for an item switched to `kind`.
    pub fn default_for(kind: MenuItemKind) -> Self {
        match kind {
            MenuItemKind::Table => ItemMetadata::Table(TableData::blank()),
            MenuItemKind::List => ItemMetadata::List(ListData {
                options: vec![String::new(); LIST_MIN_OPTIONS],
            }),
            MenuItemKind::Location => ItemMetadata::Location(LocationData::default()),
            MenuItemKind::Action | MenuItemKind::Handoff => ItemMetadata::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: MenuItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_key: Option<ActionKey>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(
        rename = "meta",
        default,
        deserialize_with = "deserialize_meta",
        skip_serializing_if = "ItemMetadata::is_none"
    )]
    pub metadata: ItemMetadata,
}

impl MenuItem {
    /// Blank, editable action item.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            kind: MenuItemKind::Action,
            action_key: None,
            fixed: false,
            metadata: ItemMetadata::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Tel,
    Email,
    Date,
    Select,
    Textarea,
}

impl FieldType {
    /// Base used when deriving a field key from its type.
    pub fn key_base(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Tel => "tel",
            FieldType::Email => "email",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "toModified", default)]
    pub to_modified: bool,
    /// Choices for `select` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotMessages {
    pub schedule_confirmation: String,
    pub modification_confirmation: String,
    pub cancellation_confirmation: String,
    pub order_acknowledgement: String,
}

/// Opening hours as `HH:MM` strings, the format the backend stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub start: String,
    pub end: String,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "18:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderUnit {
    Hours,
    Minutes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub value: u32,
    pub unit: ReminderUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reminders {
    pub enabled: bool,
    pub client_reminders: Vec<Reminder>,
    pub user_reminders: Vec<Reminder>,
}

impl Default for Reminders {
    fn default() -> Self {
        Self {
            enabled: false,
            client_reminders: vec![Reminder {
                value: 24,
                unit: ReminderUnit::Hours,
            }],
            user_reminders: vec![Reminder {
                value: 1,
                unit: ReminderUnit::Hours,
            }],
        }
    }
}

/// Aggregate root persisted as `botSettings` on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowConfig {
    pub template: TemplateKind,
    pub greeting: String,
    pub schedule_message: String,
    pub messages: BotMessages,
    pub menu_items: Vec<MenuItem>,
    pub form_fields: Vec<FormField>,
    pub business_hours: BusinessHours,
    pub working_days: BTreeSet<Weekday>,
    pub appointment_interval: u32,
    pub auto_confirm_appointments: bool,
    pub reminders: Reminders,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            template: TemplateKind::Custom,
            greeting: String::new(),
            schedule_message: String::new(),
            messages: BotMessages::default(),
            menu_items: Vec::new(),
            form_fields: Vec::new(),
            business_hours: BusinessHours::default(),
            working_days: [
                Weekday::Monday,
                Weekday::Tuesday,
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
            ]
            .into_iter()
            .collect(),
            appointment_interval: 30,
            auto_confirm_appointments: false,
            reminders: Reminders::default(),
        }
    }
}

impl FlowConfig {
    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|i| i.id == id)
    }

    pub fn form_field(&self, key: &str) -> Option<&FormField> {
        self.form_fields.iter().find(|f| f.key == key)
    }

    /// The item currently holding `actionKey = schedule`, if any.
    pub fn schedule_item(&self) -> Option<&MenuItem> {
        self.menu_items
            .iter()
            .find(|i| i.action_key == Some(ActionKey::Schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_serializes_as_single_key() {
        let item = MenuItem {
            id: "a".into(),
            label: "Ubicación".into(),
            kind: MenuItemKind::Location,
            action_key: None,
            fixed: false,
            metadata: ItemMetadata::Location(LocationData {
                address: "Av. Juárez 10".into(),
            }),
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "location");
        assert_eq!(v["meta"], json!({"location": {"address": "Av. Juárez 10"}}));
        assert!(v.get("actionKey").is_none());
    }

    #[test]
    fn test_none_metadata_is_omitted() {
        let v = serde_json::to_value(MenuItem::new("x")).unwrap();
        assert!(v.get("meta").is_none());
    }

    #[test]
    fn test_flow_config_deserializes_partial_document() {
        let cfg: FlowConfig = serde_json::from_value(json!({
            "template": "barberia",
            "greeting": "Hola",
            "formFields": [{"key": "name", "label": "Nombre", "type": "text", "toModified": true}]
        }))
        .unwrap();
        assert_eq!(cfg.template, TemplateKind::Barberia);
        assert_eq!(cfg.appointment_interval, 30);
        assert!(cfg.form_fields[0].to_modified);
        assert!(!cfg.form_fields[0].required);
        assert_eq!(cfg.business_hours.start, "09:00");
    }

    #[test]
    fn test_empty_or_null_meta_reads_as_none() {
        let cfg: FlowConfig = serde_json::from_value(json!({
            "menuItems": [
                {"id": "a", "label": "Hablar", "type": "handoff", "meta": {}},
                {"id": "b", "label": "Asesor", "type": "handoff", "meta": null},
                {"id": "c", "label": "Otro", "type": "action"}
            ]
        }))
        .unwrap();
        assert!(cfg.menu_items.iter().all(|i| i.metadata.is_none()));
    }

    #[test]
    fn test_meta_bag_picks_present_payload() {
        let item: MenuItem = serde_json::from_value(json!({
            "id": "t",
            "label": "Precios",
            "type": "table",
            "meta": {"table": {"columns": ["A", "B"], "rows": [["1", "2"]]}, "list": null}
        }))
        .unwrap();
        assert_eq!(
            item.metadata,
            ItemMetadata::Table(TableData {
                columns: vec!["A".into(), "B".into()],
                rows: vec![vec!["1".into(), "2".into()]],
            })
        );
        let back: MenuItem = serde_json::from_value(serde_json::to_value(&item).unwrap()).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_char_len_counts_accents_once() {
        assert_eq!(char_len("teléfono"), 8);
    }

    #[test]
    fn test_template_from_str() {
        assert_eq!("Barbería".parse::<TemplateKind>().unwrap(), TemplateKind::Barberia);
        assert!("salon".parse::<TemplateKind>().is_err());
    }
}
