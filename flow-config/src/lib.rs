//! # flow-config
//!
//! Editable bot conversation flow: template presets, menu items (some fixed), per-item
//! payloads, form fields with derived unique keys and a single lookup (`toModified`) field,
//! and the validated, cleaned document sent to the backend.
//!
//! ## Modules
//!
//! - [`types`] – FlowConfig document and its parts
//! - [`model`] – FlowConfigModel: draft plus invariant-preserving edits
//! - [`metadata`] – table/list/location/services sub-editors
//! - [`keys`] – form-field key derivation
//! - [`templates`] – presets per business template
//! - [`validate`] / [`clean`] – pre-save checks and the submit-ready document
//! - [`store`] – SettingsStore seam and load/save

pub mod clean;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod model;
pub mod store;
pub mod templates;
pub mod types;
pub mod validate;

pub use error::{FieldRef, FlowError, Result, Violation};
pub use keys::{canonical_key_for_label, generate_unique_key};
pub use model::{FlowConfigModel, FormFieldUpdate, MenuItemUpdate};
pub use store::{SaveResponse, SettingsStore};
pub use templates::{preset, TemplatePreset, FIXED_MODIFY_ID, FIXED_SCHEDULE_ID};
pub use types::{
    ActionKey, BotMessages, BusinessHours, FieldType, FlowConfig, FormField, ItemMetadata,
    ListData, LocationData, MenuItem, MenuItemKind, Reminder, ReminderUnit, Reminders,
    ScheduleService, TableData, TemplateKind, Weekday,
};
