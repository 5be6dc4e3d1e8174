//! [`FlowConfigModel`]: the editable draft of a bot flow.
//!
//! All mutations go through this type so the invariants hold after every call: at most
//! [`MAX_MENU_ITEMS`] items and [`MAX_FORM_FIELDS`] fields, fixed items untouched, schedule and
//! modify held by at most one item each, form keys pairwise distinct, at most one `toModified`.
//! A rejected mutation leaves the draft as it was and records a message for the field.

use std::collections::BTreeMap;

use tracing::{debug, info};
use uuid::Uuid;
use wabot_core::SessionContext;

use crate::error::{FieldRef, FlowError, Result};
use crate::keys::{canonical_key_for_label, generate_unique_key};
use crate::templates::preset;
use crate::types::{
    char_len, ActionKey, BotMessages, BusinessHours, FieldType, FlowConfig, FormField,
    ItemMetadata, MenuItem, MenuItemKind, Reminders, TemplateKind, Weekday, FORM_LABEL_MAX,
    MAX_FORM_FIELDS, MAX_MENU_ITEMS, MENU_LABEL_MAX,
};

/// A single-field change to a menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItemUpdate {
    Label(String),
    Kind(MenuItemKind),
    ActionKey(Option<ActionKey>),
}

/// A single-field change to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldUpdate {
    Label(String),
    Type(FieldType),
    Required(bool),
    ToModified(bool),
    Options(Vec<String>),
}

pub struct FlowConfigModel {
    pub(crate) session: SessionContext,
    pub(crate) draft: FlowConfig,
    pub(crate) errors: BTreeMap<FieldRef, String>,
}

impl FlowConfigModel {
    pub fn new(session: SessionContext, config: FlowConfig) -> Self {
        Self {
            session,
            draft: config,
            errors: BTreeMap::new(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Current draft, including content that `build_cleaned_document` would strip.
    pub fn draft(&self) -> &FlowConfig {
        &self.draft
    }

    pub fn set_business_hours(&mut self, start: impl Into<String>, end: impl Into<String>) {
        self.draft.business_hours = BusinessHours {
            start: start.into(),
            end: end.into(),
        };
    }

    pub fn set_reminders(&mut self, reminders: Reminders) {
        self.draft.reminders = reminders;
    }

    pub fn set_greeting(&mut self, text: impl Into<String>) {
        self.draft.greeting = text.into();
    }

    pub fn set_schedule_message(&mut self, text: impl Into<String>) {
        self.draft.schedule_message = text.into();
    }

    pub fn messages_mut(&mut self) -> &mut BotMessages {
        &mut self.draft.messages
    }

    pub fn set_working_days<I>(&mut self, days: I)
    where
        I: IntoIterator<Item = Weekday>,
    {
        self.draft.working_days = days.into_iter().collect();
    }

    pub fn set_appointment_interval(&mut self, minutes: u32) {
        self.draft.appointment_interval = minutes;
    }

    pub fn set_auto_confirm(&mut self, enabled: bool) {
        self.draft.auto_confirm_appointments = enabled;
    }

    /// Last rejection message for `field`, kept until the field is successfully updated.
    pub fn error_for(&self, field: &FieldRef) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<FieldRef, String> {
        &self.errors
    }

    pub(crate) fn reject(&mut self, err: FlowError) -> FlowError {
        if let FlowError::LabelTooLong { field, .. } = &err {
            debug!(field = %field, error = %err, "update rejected");
            self.errors.insert(field.clone(), err.to_string());
        }
        err
    }

    /// Replaces greeting, schedule message, menu items and form fields with the preset for
    /// `template`, and drops every retained field error.
    pub fn select_template(&mut self, template: TemplateKind) {
        let p = preset(template);
        self.draft.template = template;
        self.draft.greeting = p.greeting;
        self.draft.schedule_message = p.schedule_message;
        self.draft.menu_items = p.menu_items;
        self.draft.form_fields = p.form_fields;
        self.errors.clear();
        info!(
            user_id = %self.session.user_id,
            template = template.as_str(),
            menu_items = self.draft.menu_items.len(),
            form_fields = self.draft.form_fields.len(),
            "template selected"
        );
    }

    /// Appends a blank action item and returns its id.
    pub fn add_menu_item(&mut self) -> Result<String> {
        if self.draft.menu_items.len() >= MAX_MENU_ITEMS {
            return Err(FlowError::LimitExceeded {
                what: "menu items",
                limit: MAX_MENU_ITEMS,
            });
        }
        let id = Uuid::new_v4().to_string();
        self.draft.menu_items.push(MenuItem::new(id.clone()));
        debug!(item_id = %id, "menu item added");
        Ok(id)
    }

    /// Removes an editable item. Returns false for fixed or unknown items.
    pub fn remove_menu_item(&mut self, id: &str) -> bool {
        let Some(pos) = self.draft.menu_items.iter().position(|i| i.id == id) else {
            return false;
        };
        if self.draft.menu_items[pos].fixed {
            debug!(item_id = %id, "fixed menu item cannot be removed");
            return false;
        }
        self.draft.menu_items.remove(pos);
        self.errors.retain(|f, _| match f {
            FieldRef::MenuItemLabel(i) | FieldRef::ServiceType { item_id: i, .. } => i != id,
            _ => true,
        });
        true
    }

    pub fn update_menu_item(&mut self, id: &str, update: MenuItemUpdate) -> Result<()> {
        let pos = self
            .draft
            .menu_items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| FlowError::UnknownMenuItem(id.to_string()))?;
        if self.draft.menu_items[pos].fixed {
            debug!(item_id = %id, "fixed menu item is immutable");
            return Ok(());
        }

        match update {
            MenuItemUpdate::Label(label) => {
                let len = char_len(&label);
                let field = FieldRef::MenuItemLabel(id.to_string());
                if len > MENU_LABEL_MAX {
                    return Err(self.reject(FlowError::LabelTooLong {
                        field,
                        len,
                        max: MENU_LABEL_MAX,
                    }));
                }
                self.errors.remove(&field);
                self.draft.menu_items[pos].label = label;
            }
            MenuItemUpdate::Kind(kind) => {
                let item = &mut self.draft.menu_items[pos];
                if item.kind == kind {
                    return Ok(());
                }
                item.kind = kind;
                if kind != MenuItemKind::Action {
                    item.action_key = None;
                }
                item.metadata = ItemMetadata::default_for(kind);
            }
            MenuItemUpdate::ActionKey(Some(key)) if key.is_exclusive() => {
                self.assign_exclusive_action(pos, key)?;
            }
            MenuItemUpdate::ActionKey(key) => {
                let item = &mut self.draft.menu_items[pos];
                let leaves_kind = key.is_some() && item.kind != MenuItemKind::Action;
                if item.action_key == Some(ActionKey::Schedule) || leaves_kind {
                    item.metadata = ItemMetadata::None;
                }
                if leaves_kind {
                    item.kind = MenuItemKind::Action;
                }
                item.action_key = key;
            }
        }
        Ok(())
    }

    /// Clears `key` from every other item, then gives it to the item at `pos`. Schedule
    /// services move along with the schedule role. Fails without changes if a fixed item
    /// holds `key`.
    fn assign_exclusive_action(&mut self, pos: usize, key: ActionKey) -> Result<()> {
        if let Some(holder) = self
            .draft
            .menu_items
            .iter()
            .enumerate()
            .find(|(i, item)| *i != pos && item.fixed && item.action_key == Some(key))
            .map(|(_, item)| item)
        {
            debug!(item_id = %holder.id, action_key = ?key, "action reserved by fixed item");
            return Err(FlowError::ActionHeldByFixedItem {
                item_id: holder.id.clone(),
                action: key.as_str(),
            });
        }

        let mut moved_services = None;
        for (i, item) in self.draft.menu_items.iter_mut().enumerate() {
            if i == pos || item.action_key != Some(key) {
                continue;
            }
            item.action_key = None;
            if let ItemMetadata::Services(services) = std::mem::take(&mut item.metadata) {
                moved_services = Some(services);
            }
        }
        let item = &mut self.draft.menu_items[pos];
        let keep_services = key == ActionKey::Schedule && item.action_key == Some(ActionKey::Schedule);
        item.kind = MenuItemKind::Action;
        item.action_key = Some(key);
        item.metadata = match moved_services {
            Some(services) if key == ActionKey::Schedule => ItemMetadata::Services(services),
            _ if keep_services => std::mem::take(&mut item.metadata),
            _ => ItemMetadata::None,
        };
        debug!(item_id = %item.id, action_key = ?key, "exclusive action assigned");
        Ok(())
    }

    fn form_keys_except(&self, exclude: Option<&str>) -> Vec<String> {
        self.draft
            .form_fields
            .iter()
            .map(|f| f.key.clone())
            .filter(|k| Some(k.as_str()) != exclude)
            .collect()
    }

    /// Appends a text field with a derived unique key; the first field ever added becomes the
    /// lookup (`toModified`) field. Returns the new key.
    pub fn add_form_field(&mut self) -> Result<String> {
        if self.draft.form_fields.len() >= MAX_FORM_FIELDS {
            return Err(FlowError::LimitExceeded {
                what: "form fields",
                limit: MAX_FORM_FIELDS,
            });
        }
        let field_type = FieldType::Text;
        let keys = self.form_keys_except(None);
        let key = generate_unique_key(field_type.key_base(), keys.iter().map(String::as_str), None);
        let to_modified = self.draft.form_fields.is_empty();
        self.draft.form_fields.push(FormField {
            key: key.clone(),
            label: String::new(),
            field_type,
            required: false,
            to_modified,
            options: Vec::new(),
        });
        debug!(key = %key, to_modified, "form field added");
        Ok(key)
    }

    /// Removes a field by key. If it held `toModified`, the flag moves to the first remaining field.
    pub fn remove_form_field(&mut self, key: &str) -> bool {
        let Some(pos) = self.draft.form_fields.iter().position(|f| f.key == key) else {
            return false;
        };
        let removed = self.draft.form_fields.remove(pos);
        self.errors.remove(&FieldRef::FormFieldLabel(key.to_string()));
        if removed.to_modified {
            if let Some(first) = self.draft.form_fields.first_mut() {
                first.to_modified = true;
            }
        }
        true
    }

    pub fn update_form_field(&mut self, key: &str, update: FormFieldUpdate) -> Result<()> {
        let pos = self
            .draft
            .form_fields
            .iter()
            .position(|f| f.key == key)
            .ok_or_else(|| FlowError::UnknownFormField(key.to_string()))?;

        match update {
            FormFieldUpdate::Label(label) => {
                let len = char_len(&label);
                let field = FieldRef::FormFieldLabel(key.to_string());
                if len > FORM_LABEL_MAX {
                    return Err(self.reject(FlowError::LabelTooLong {
                        field,
                        len,
                        max: FORM_LABEL_MAX,
                    }));
                }
                self.errors.remove(&field);
                if let Some(canonical) = canonical_key_for_label(&label) {
                    let keys = self.form_keys_except(Some(key));
                    let new_key =
                        generate_unique_key(canonical, keys.iter().map(String::as_str), None);
                    self.draft.form_fields[pos].key = new_key;
                }
                self.draft.form_fields[pos].label = label;
            }
            FormFieldUpdate::Type(field_type) => {
                let keys = self.form_keys_except(Some(key));
                let new_key = generate_unique_key(
                    field_type.key_base(),
                    keys.iter().map(String::as_str),
                    None,
                );
                if let Some(msg) = self.errors.remove(&FieldRef::FormFieldLabel(key.to_string())) {
                    self.errors
                        .insert(FieldRef::FormFieldLabel(new_key.clone()), msg);
                }
                let f = &mut self.draft.form_fields[pos];
                f.field_type = field_type;
                f.key = new_key;
                if field_type != FieldType::Select {
                    f.options.clear();
                }
            }
            FormFieldUpdate::Required(required) => {
                self.draft.form_fields[pos].required = required;
            }
            FormFieldUpdate::ToModified(true) => {
                for (i, f) in self.draft.form_fields.iter_mut().enumerate() {
                    f.to_modified = i == pos;
                }
                return Ok(());
            }
            FormFieldUpdate::ToModified(false) => {
                self.draft.form_fields[pos].to_modified = false;
            }
            FormFieldUpdate::Options(options) => {
                let f = &mut self.draft.form_fields[pos];
                if f.field_type != FieldType::Select {
                    return Err(FlowError::NotApplicable {
                        item_id: key.to_string(),
                        what: "select options",
                    });
                }
                f.options = options;
            }
        }

        let new_key = self.draft.form_fields[pos].key.clone();
        if new_key != key {
            debug!(old_key = %key, new_key = %new_key, "form field re-keyed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> FlowConfigModel {
        FlowConfigModel::new(SessionContext::new("token", "u1"), FlowConfig::default())
    }

    #[test]
    fn test_add_menu_item_stops_at_limit() {
        let mut m = model();
        for _ in 0..MAX_MENU_ITEMS {
            m.add_menu_item().unwrap();
        }
        assert!(matches!(
            m.add_menu_item(),
            Err(FlowError::LimitExceeded { limit: 5, .. })
        ));
        assert_eq!(m.draft().menu_items.len(), MAX_MENU_ITEMS);
    }

    #[test]
    fn test_new_menu_item_is_blank_action() {
        let mut m = model();
        let id = m.add_menu_item().unwrap();
        let item = m.draft().menu_item(&id).unwrap();
        assert_eq!(item.kind, MenuItemKind::Action);
        assert!(item.label.is_empty());
        assert!(!item.fixed);
    }

    #[test]
    fn test_kind_switch_resets_metadata() {
        let mut m = model();
        let id = m.add_menu_item().unwrap();
        m.update_menu_item(&id, MenuItemUpdate::Kind(MenuItemKind::Table))
            .unwrap();
        assert!(matches!(
            m.draft().menu_item(&id).unwrap().metadata,
            ItemMetadata::Table(_)
        ));
        m.update_menu_item(&id, MenuItemUpdate::Kind(MenuItemKind::Handoff))
            .unwrap();
        assert!(m.draft().menu_item(&id).unwrap().metadata.is_none());
    }

    #[test]
    fn test_unknown_item_is_reported() {
        let mut m = model();
        assert!(matches!(
            m.update_menu_item("nope", MenuItemUpdate::Label("x".into())),
            Err(FlowError::UnknownMenuItem(_))
        ));
    }

    #[test]
    fn test_label_error_cleared_on_valid_update() {
        let mut m = model();
        let id = m.add_menu_item().unwrap();
        let field = FieldRef::MenuItemLabel(id.clone());
        assert!(m
            .update_menu_item(&id, MenuItemUpdate::Label("x".repeat(30)))
            .is_err());
        assert!(m.error_for(&field).is_some());
        m.update_menu_item(&id, MenuItemUpdate::Label("Precios".into()))
            .unwrap();
        assert!(m.error_for(&field).is_none());
    }

    #[test]
    fn test_removing_lookup_field_promotes_first_remaining() {
        let mut m = model();
        let first = m.add_form_field().unwrap();
        let second = m.add_form_field().unwrap();
        assert!(m.remove_form_field(&first));
        assert!(m.draft().form_field(&second).unwrap().to_modified);
    }

    #[test]
    fn test_type_change_carries_label_error_to_new_key() {
        let mut m = model();
        let key = m.add_form_field().unwrap();
        assert!(m
            .update_form_field(&key, FormFieldUpdate::Label("x".repeat(41)))
            .is_err());
        m.update_form_field(&key, FormFieldUpdate::Type(FieldType::Email))
            .unwrap();
        assert!(m
            .error_for(&FieldRef::FormFieldLabel(key.clone()))
            .is_none());
        let moved = FieldRef::FormFieldLabel("email".to_string());
        assert!(m.error_for(&moved).is_some());
        m.update_form_field("email", FormFieldUpdate::Label("Correo".into()))
            .unwrap();
        assert!(m.error_for(&moved).is_none());
    }

    #[test]
    fn test_options_only_for_select() {
        let mut m = model();
        let key = m.add_form_field().unwrap();
        assert!(m
            .update_form_field(&key, FormFieldUpdate::Options(vec!["A".into()]))
            .is_err());
        m.update_form_field(&key, FormFieldUpdate::Type(FieldType::Select))
            .unwrap();
        m.update_form_field("select", FormFieldUpdate::Options(vec!["A".into(), "B".into()]))
            .unwrap();
        assert_eq!(m.draft().form_field("select").unwrap().options.len(), 2);
    }
}
