//! Pre-save validation. Collects every violation instead of stopping at the first.

use chrono::NaiveTime;

use crate::error::{FieldRef, FlowError, Result, Violation};
use crate::model::FlowConfigModel;
use crate::types::{
    char_len, FlowConfig, ItemMetadata, FORM_LABEL_MAX, MENU_LABEL_MAX, MESSAGE_TEXT_MAX,
    SERVICE_TYPE_MAX,
};

fn too_long(field: FieldRef, len: usize, max: usize) -> Violation {
    Violation {
        field,
        message: format!("{} characters, at most {} allowed", len, max),
    }
}

fn parse_hour(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

pub fn collect_violations(config: &FlowConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for item in config.menu_items.iter().filter(|i| !i.fixed) {
        let len = char_len(&item.label);
        if len > MENU_LABEL_MAX {
            violations.push(too_long(
                FieldRef::MenuItemLabel(item.id.clone()),
                len,
                MENU_LABEL_MAX,
            ));
        }
    }

    for field in &config.form_fields {
        let len = char_len(&field.label);
        if len > FORM_LABEL_MAX {
            violations.push(too_long(
                FieldRef::FormFieldLabel(field.key.clone()),
                len,
                FORM_LABEL_MAX,
            ));
        }
    }

    if let Some(item) = config.schedule_item() {
        if let ItemMetadata::Services(services) = &item.metadata {
            for (index, service) in services.iter().enumerate() {
                let len = char_len(&service.service_type);
                if len > SERVICE_TYPE_MAX {
                    violations.push(too_long(
                        FieldRef::ServiceType {
                            item_id: item.id.clone(),
                            index,
                        },
                        len,
                        SERVICE_TYPE_MAX,
                    ));
                }
            }
        }
    }

    let texts: [(&'static str, &str); 6] = [
        ("greeting", config.greeting.as_str()),
        ("scheduleMessage", config.schedule_message.as_str()),
        ("messages.scheduleConfirmation", config.messages.schedule_confirmation.as_str()),
        ("messages.modificationConfirmation", config.messages.modification_confirmation.as_str()),
        ("messages.cancellationConfirmation", config.messages.cancellation_confirmation.as_str()),
        ("messages.orderAcknowledgement", config.messages.order_acknowledgement.as_str()),
    ];
    for (name, text) in texts {
        let len = char_len(text);
        if len > MESSAGE_TEXT_MAX {
            violations.push(too_long(FieldRef::Text(name), len, MESSAGE_TEXT_MAX));
        }
    }

    match (
        parse_hour(&config.business_hours.start),
        parse_hour(&config.business_hours.end),
    ) {
        (Some(start), Some(end)) if start < end => {}
        (Some(_), Some(_)) => violations.push(Violation {
            field: FieldRef::BusinessHours,
            message: "opening time must be before closing time".to_string(),
        }),
        _ => violations.push(Violation {
            field: FieldRef::BusinessHours,
            message: "hours must use HH:MM".to_string(),
        }),
    }

    if config.appointment_interval == 0 {
        violations.push(Violation {
            field: FieldRef::AppointmentInterval,
            message: "interval must be at least one minute".to_string(),
        });
    }

    violations
}

impl FlowConfigModel {
    /// Fails with [`FlowError::ValidationFailed`] listing every violation in the draft.
    pub fn validate_for_save(&self) -> Result<()> {
        let violations = collect_violations(&self.draft);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(FlowError::ValidationFailed { violations })
        }
    }
}
