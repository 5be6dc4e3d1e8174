//! Submit-ready document: metadata with no meaningful content is stripped.

use crate::model::FlowConfigModel;
use crate::types::{
    ActionKey, FieldType, FlowConfig, FormField, ItemMetadata, ListData, LocationData, MenuItem,
    MenuItemKind, ScheduleService, TableData, LIST_MIN_OPTIONS, TABLE_MIN_COLUMNS,
};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Keeps a table with at least two columns and at least one row that has content.
fn clean_table(table: &TableData) -> Option<TableData> {
    if table.columns.len() < TABLE_MIN_COLUMNS {
        return None;
    }
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !is_blank(c)))
        .cloned()
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(TableData {
        columns: table.columns.clone(),
        rows,
    })
}

fn clean_list(list: &ListData) -> Option<ListData> {
    let options: Vec<String> = list
        .options
        .iter()
        .filter(|o| !is_blank(o))
        .map(|o| o.trim().to_string())
        .collect();
    (options.len() >= LIST_MIN_OPTIONS).then_some(ListData { options })
}

fn clean_location(location: &LocationData) -> Option<LocationData> {
    let address = location.address.trim();
    (!address.is_empty()).then(|| LocationData {
        address: address.to_string(),
    })
}

fn clean_services(services: &[ScheduleService]) -> Option<Vec<ScheduleService>> {
    let cleaned: Vec<ScheduleService> = services
        .iter()
        .filter(|s| !is_blank(&s.service_type))
        .map(|s| ScheduleService {
            service_type: s.service_type.trim().to_string(),
            price: s.price.clone().filter(|p| !is_blank(p)),
            recommendations: s
                .recommendations
                .iter()
                .filter(|r| !is_blank(r))
                .cloned()
                .collect(),
        })
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Payload to emit for `item`; a payload that does not belong to the item's kind/role is dropped.
fn clean_metadata(item: &MenuItem) -> ItemMetadata {
    let cleaned = match (&item.metadata, item.kind) {
        (ItemMetadata::Services(s), _) if item.action_key == Some(ActionKey::Schedule) => {
            clean_services(s).map(ItemMetadata::Services)
        }
        (_, _) if item.fixed => None,
        (ItemMetadata::Table(t), MenuItemKind::Table) => clean_table(t).map(ItemMetadata::Table),
        (ItemMetadata::List(l), MenuItemKind::List) => clean_list(l).map(ItemMetadata::List),
        (ItemMetadata::Location(l), MenuItemKind::Location) => {
            clean_location(l).map(ItemMetadata::Location)
        }
        _ => None,
    };
    cleaned.unwrap_or_default()
}

fn clean_form_field(field: &FormField) -> FormField {
    let mut cleaned = field.clone();
    cleaned.options = if field.field_type == FieldType::Select {
        field
            .options
            .iter()
            .filter(|o| !is_blank(o))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    cleaned
}

impl FlowConfigModel {
    /// Copy of the draft with every menu item's metadata reduced to meaningful content and
    /// select options only on select fields. The draft itself is not touched.
    pub fn build_cleaned_document(&self) -> FlowConfig {
        let mut doc = self.draft.clone();
        for item in &mut doc.menu_items {
            item.metadata = clean_metadata(item);
        }
        doc.form_fields = self.draft.form_fields.iter().map(clean_form_field).collect();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: MenuItemKind, metadata: ItemMetadata) -> MenuItem {
        MenuItem {
            id: "i1".into(),
            label: "x".into(),
            kind,
            action_key: None,
            fixed: false,
            metadata,
        }
    }

    #[test]
    fn test_blank_rows_are_dropped_but_filled_rows_kept() {
        let t = TableData {
            columns: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into(), "".into()], vec!["".into(), " ".into()]],
        };
        let cleaned = clean_table(&t).unwrap();
        assert_eq!(cleaned.rows.len(), 1);
    }

    #[test]
    fn test_table_with_one_filled_row_is_kept() {
        let table = TableData {
            columns: vec!["Servicio".into(), "Precio".into()],
            rows: vec![vec!["Corte".into(), "$150".into()]],
        };
        let m = item(MenuItemKind::Table, ItemMetadata::Table(table.clone()));
        assert_eq!(clean_metadata(&m), ItemMetadata::Table(table));
    }

    #[test]
    fn test_list_with_one_real_option_is_dropped() {
        let m = item(
            MenuItemKind::List,
            ItemMetadata::List(ListData {
                options: vec!["Sí".into(), "  ".into()],
            }),
        );
        assert!(clean_metadata(&m).is_none());
    }

    #[test]
    fn test_mismatched_payload_is_dropped() {
        let m = item(
            MenuItemKind::Handoff,
            ItemMetadata::Location(LocationData {
                address: "Centro".into(),
            }),
        );
        assert!(clean_metadata(&m).is_none());
    }

    #[test]
    fn test_blank_address_is_dropped() {
        let m = item(MenuItemKind::Location, ItemMetadata::Location(LocationData::default()));
        assert!(clean_metadata(&m).is_none());
    }

    #[test]
    fn test_services_without_type_are_dropped() {
        let services = vec![
            ScheduleService {
                service_type: "Corte".into(),
                price: Some(" ".into()),
                recommendations: vec!["".into(), "Puntualidad".into()],
            },
            ScheduleService::blank(),
        ];
        let cleaned = clean_services(&services).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].price, None);
        assert_eq!(cleaned[0].recommendations, vec!["Puntualidad"]);
    }
}
