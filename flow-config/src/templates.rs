//! Template presets shipped with the product.
//!
//! Every business template starts with the two fixed items (schedule, modify) at positions 0
//! and 1, followed by its free items; `custom` ships empty lists.

use crate::types::{
    ActionKey, FieldType, FormField, ItemMetadata, ListData, LocationData, MenuItem, MenuItemKind,
    ScheduleService, TableData, TemplateKind, MODIFY_LABEL, SCHEDULE_LABEL,
};

pub const FIXED_SCHEDULE_ID: &str = "fixed-schedule";
pub const FIXED_MODIFY_ID: &str = "fixed-modify";

/// The parts of a [`crate::FlowConfig`] a template replaces.
#[derive(Debug, Clone)]
pub struct TemplatePreset {
    pub greeting: String,
    pub schedule_message: String,
    pub menu_items: Vec<MenuItem>,
    pub form_fields: Vec<FormField>,
}

pub fn fixed_schedule_item(services: Vec<ScheduleService>) -> MenuItem {
    MenuItem {
        id: FIXED_SCHEDULE_ID.to_string(),
        label: SCHEDULE_LABEL.to_string(),
        kind: MenuItemKind::Action,
        action_key: Some(ActionKey::Schedule),
        fixed: true,
        metadata: if services.is_empty() {
            ItemMetadata::None
        } else {
            ItemMetadata::Services(services)
        },
    }
}

pub fn fixed_modify_item() -> MenuItem {
    MenuItem {
        id: FIXED_MODIFY_ID.to_string(),
        label: MODIFY_LABEL.to_string(),
        kind: MenuItemKind::Action,
        action_key: Some(ActionKey::Modify),
        fixed: true,
        metadata: ItemMetadata::None,
    }
}

fn item(template: TemplateKind, slug: &str, label: &str, kind: MenuItemKind) -> MenuItem {
    MenuItem {
        id: format!("{}-{}", template.as_str(), slug),
        label: label.to_string(),
        kind,
        action_key: None,
        fixed: false,
        metadata: ItemMetadata::None,
    }
}

fn field(key: &str, label: &str, field_type: FieldType, required: bool) -> FormField {
    FormField {
        key: key.to_string(),
        label: label.to_string(),
        field_type,
        required,
        to_modified: false,
        options: Vec::new(),
    }
}

fn service(service_type: &str, price: Option<&str>, recommendations: &[&str]) -> ScheduleService {
    ScheduleService {
        service_type: service_type.to_string(),
        price: price.map(str::to_string),
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
    }
}

fn table(columns: &[&str], rows: &[&[&str]]) -> ItemMetadata {
    ItemMetadata::Table(TableData {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    })
}

/// First field of every preset is the one used to look up existing appointments.
fn mark_lookup_field(mut fields: Vec<FormField>) -> Vec<FormField> {
    if let Some(first) = fields.first_mut() {
        first.to_modified = true;
    }
    fields
}

pub fn preset(template: TemplateKind) -> TemplatePreset {
    match template {
        TemplateKind::Consultorio => {
            let mut prices = item(template, "precios", "Precios", MenuItemKind::Table);
            prices.metadata = table(
                &["Consulta", "Precio"],
                &[&["Consulta general", "$500"], &["Seguimiento", "$350"]],
            );
            let mut location = item(template, "ubicacion", "Ubicación", MenuItemKind::Location);
            location.metadata = ItemMetadata::Location(LocationData::default());
            TemplatePreset {
                greeting: "¡Hola! Bienvenido a nuestro consultorio. ¿En qué podemos ayudarte?"
                    .to_string(),
                schedule_message: "Con gusto agendamos tu cita. Por favor compártenos tus datos."
                    .to_string(),
                menu_items: vec![
                    fixed_schedule_item(vec![service(
                        "Consulta general",
                        Some("$500"),
                        &["Llega 10 minutos antes de tu cita"],
                    )]),
                    fixed_modify_item(),
                    prices,
                    location,
                    item(template, "asesor", "Hablar con recepción", MenuItemKind::Handoff),
                ],
                form_fields: mark_lookup_field(vec![
                    field("phone", "Teléfono", FieldType::Tel, true),
                    field("name", "Nombre completo", FieldType::Text, true),
                    field("email", "Correo electrónico", FieldType::Email, false),
                    field("reason", "Motivo de consulta", FieldType::Textarea, false),
                ]),
            }
        }
        TemplateKind::Barberia => {
            let mut prices = item(template, "servicios", "Servicios y precios", MenuItemKind::Table);
            prices.metadata = table(
                &["Servicio", "Precio"],
                &[&["Corte clásico", "$150"], &["Barba", "$100"]],
            );
            let mut location = item(template, "ubicacion", "Ubicación", MenuItemKind::Location);
            location.metadata = ItemMetadata::Location(LocationData::default());
            TemplatePreset {
                greeting: "¡Qué onda! Bienvenido a la barbería. Elige una opción del menú."
                    .to_string(),
                schedule_message: "Vamos a apartar tu lugar. Compártenos tus datos.".to_string(),
                menu_items: vec![
                    fixed_schedule_item(vec![
                        service("Corte", Some("$150"), &["Llega con el cabello limpio"]),
                        service("Barba", Some("$100"), &["Sin recomendaciones"]),
                    ]),
                    fixed_modify_item(),
                    prices,
                    location,
                ],
                form_fields: mark_lookup_field(vec![
                    field("phone", "Teléfono", FieldType::Tel, true),
                    field("name", "Nombre", FieldType::Text, true),
                ]),
            }
        }
        TemplateKind::Servicios => {
            let mut catalog = item(template, "catalogo", "Nuestros servicios", MenuItemKind::List);
            catalog.metadata = ItemMetadata::List(ListData {
                options: vec!["Instalación".to_string(), "Mantenimiento".to_string()],
            });
            TemplatePreset {
                greeting: "¡Hola! Gracias por escribirnos. ¿Cómo podemos ayudarte hoy?"
                    .to_string(),
                schedule_message: "Agendemos una visita. Necesitamos algunos datos.".to_string(),
                menu_items: vec![
                    fixed_schedule_item(Vec::new()),
                    fixed_modify_item(),
                    catalog,
                    item(template, "asesor", "Hablar con un asesor", MenuItemKind::Handoff),
                ],
                form_fields: mark_lookup_field(vec![
                    field("phone", "Teléfono", FieldType::Tel, true),
                    field("name", "Nombre", FieldType::Text, true),
                    field("email", "Email", FieldType::Email, false),
                    field("address", "Dirección", FieldType::Text, true),
                ]),
            }
        }
        TemplateKind::Custom => TemplatePreset {
            greeting: "¡Hola! ¿En qué podemos ayudarte?".to_string(),
            schedule_message: String::new(),
            menu_items: Vec::new(),
            form_fields: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{char_len, MAX_FORM_FIELDS, MAX_MENU_ITEMS, MENU_LABEL_MAX};

    #[test]
    fn test_business_presets_start_with_fixed_items() {
        for t in [
            TemplateKind::Consultorio,
            TemplateKind::Barberia,
            TemplateKind::Servicios,
        ] {
            let p = preset(t);
            assert_eq!(p.menu_items[0].label, SCHEDULE_LABEL);
            assert_eq!(p.menu_items[0].action_key, Some(ActionKey::Schedule));
            assert!(p.menu_items[0].fixed);
            assert_eq!(p.menu_items[1].label, MODIFY_LABEL);
            assert!(p.menu_items[1].fixed);
            assert!(p.form_fields[0].to_modified);
            assert_eq!(p.form_fields.iter().filter(|f| f.to_modified).count(), 1);
        }
    }

    #[test]
    fn test_presets_respect_bounds() {
        for t in [
            TemplateKind::Consultorio,
            TemplateKind::Barberia,
            TemplateKind::Servicios,
            TemplateKind::Custom,
        ] {
            let p = preset(t);
            assert!(p.menu_items.len() <= MAX_MENU_ITEMS);
            assert!(p.form_fields.len() <= MAX_FORM_FIELDS);
            assert!(p.menu_items.iter().all(|i| char_len(&i.label) <= MENU_LABEL_MAX));
        }
    }

    #[test]
    fn test_custom_preset_is_empty() {
        let p = preset(TemplateKind::Custom);
        assert!(p.menu_items.is_empty());
        assert!(p.form_fields.is_empty());
    }
}
