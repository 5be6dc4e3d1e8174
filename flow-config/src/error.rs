//! Flow configuration errors.
//!
//! Every rejected mutation leaves the draft unchanged. Only load/save errors come from the
//! backend; everything else is resolved locally by the caller.

use std::fmt;

use thiserror::Error;
use wabot_core::ApiError;

/// Identifies an editable text whose last rejection is retained until corrected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldRef {
    MenuItemLabel(String),
    FormFieldLabel(String),
    ServiceType { item_id: String, index: usize },
    Text(&'static str),
    BusinessHours,
    AppointmentInterval,
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::MenuItemLabel(id) => write!(f, "menuItems[{}].label", id),
            FieldRef::FormFieldLabel(key) => write!(f, "formFields[{}].label", key),
            FieldRef::ServiceType { item_id, index } => {
                write!(f, "menuItems[{}].services[{}].serviceType", item_id, index)
            }
            FieldRef::Text(name) => write!(f, "{}", name),
            FieldRef::BusinessHours => write!(f, "businessHours"),
            FieldRef::AppointmentInterval => write!(f, "appointmentInterval"),
        }
    }
}

/// One problem found by `validate_for_save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: FieldRef,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Limit exceeded: at most {limit} {what}")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("At least {min} {what} required")]
    BelowMinimum { what: &'static str, min: usize },

    #[error("{field} is too long ({len} > {max} characters)")]
    LabelTooLong {
        field: FieldRef,
        len: usize,
        max: usize,
    },

    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(String),

    #[error("Unknown form field: {0}")]
    UnknownFormField(String),

    #[error("Index {index} out of range for {what}")]
    IndexOutOfRange { what: &'static str, index: usize },

    /// Sub-editor used on an item whose kind has no such payload.
    #[error("Menu item {item_id} has no {what}")]
    NotApplicable { item_id: String, what: &'static str },

    #[error("No menu item holds the schedule action")]
    NoScheduleItem,

    /// Schedule and modify stay with the fixed item that holds them.
    #[error("Action {action} is held by fixed item {item_id}")]
    ActionHeldByFixedItem {
        item_id: String,
        action: &'static str,
    },

    #[error("Validation failed: {}", format_violations(.violations))]
    ValidationFailed { violations: Vec<Violation> },

    #[error("Failed to load settings: {0}")]
    LoadFailed(#[source] ApiError),

    #[error("Failed to save settings: {0}")]
    PersistenceFailed(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, FlowError>;
