//! Sub-editors for per-item payloads: table columns/rows/cells, list options, location address,
//! and the services of the schedule item.
//!
//! Each mutation that would break a bound is rejected and leaves the payload untouched.

use tracing::debug;

use crate::error::{FieldRef, FlowError, Result};
use crate::model::FlowConfigModel;
use crate::types::{
    char_len, ActionKey, ItemMetadata, ListData, MenuItem, ScheduleService, TableData,
    LIST_MIN_OPTIONS, MIN_RECOMMENDATIONS, SERVICE_TYPE_MAX, TABLE_MAX_COLUMNS, TABLE_MAX_ROWS,
    TABLE_MIN_COLUMNS, TABLE_MIN_ROWS,
};

fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(FlowError::IndexOutOfRange { what, index });
    }
    Ok(())
}

impl FlowConfigModel {
    fn item_mut(&mut self, id: &str) -> Result<&mut MenuItem> {
        self.draft
            .menu_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| FlowError::UnknownMenuItem(id.to_string()))
    }

    fn table_mut(&mut self, id: &str) -> Result<&mut TableData> {
        match &mut self.item_mut(id)?.metadata {
            ItemMetadata::Table(t) => Ok(t),
            _ => Err(FlowError::NotApplicable {
                item_id: id.to_string(),
                what: "table",
            }),
        }
    }

    fn list_mut(&mut self, id: &str) -> Result<&mut ListData> {
        match &mut self.item_mut(id)?.metadata {
            ItemMetadata::List(l) => Ok(l),
            _ => Err(FlowError::NotApplicable {
                item_id: id.to_string(),
                what: "list",
            }),
        }
    }

    fn schedule_item_mut(&mut self) -> Result<&mut MenuItem> {
        self.draft
            .menu_items
            .iter_mut()
            .find(|i| i.action_key == Some(ActionKey::Schedule))
            .ok_or(FlowError::NoScheduleItem)
    }

    /// Service `index` of the schedule item, with the holder's id. An item without a services
    /// payload has no services.
    fn service_mut(&mut self, index: usize) -> Result<(String, &mut ScheduleService)> {
        let item = self.schedule_item_mut()?;
        match &mut item.metadata {
            ItemMetadata::Services(services) if index < services.len() => {
                Ok((item.id.clone(), &mut services[index]))
            }
            _ => Err(FlowError::IndexOutOfRange {
                what: "service",
                index,
            }),
        }
    }

    pub fn add_table_column(&mut self, id: &str) -> Result<()> {
        let table = self.table_mut(id)?;
        if table.columns.len() >= TABLE_MAX_COLUMNS {
            return Err(FlowError::LimitExceeded {
                what: "table columns",
                limit: TABLE_MAX_COLUMNS,
            });
        }
        table.columns.push(String::new());
        for row in &mut table.rows {
            row.push(String::new());
        }
        Ok(())
    }

    pub fn remove_table_column(&mut self, id: &str, index: usize) -> Result<()> {
        let table = self.table_mut(id)?;
        check_index("table column", index, table.columns.len())?;
        if table.columns.len() <= TABLE_MIN_COLUMNS {
            return Err(FlowError::BelowMinimum {
                what: "table columns",
                min: TABLE_MIN_COLUMNS,
            });
        }
        table.columns.remove(index);
        for row in &mut table.rows {
            if index < row.len() {
                row.remove(index);
            }
        }
        Ok(())
    }

    pub fn rename_table_column(
        &mut self,
        id: &str,
        index: usize,
        name: impl Into<String>,
    ) -> Result<()> {
        let table = self.table_mut(id)?;
        check_index("table column", index, table.columns.len())?;
        table.columns[index] = name.into();
        Ok(())
    }

    pub fn add_table_row(&mut self, id: &str) -> Result<()> {
        let table = self.table_mut(id)?;
        if table.rows.len() >= TABLE_MAX_ROWS {
            return Err(FlowError::LimitExceeded {
                what: "table rows",
                limit: TABLE_MAX_ROWS,
            });
        }
        table.rows.push(vec![String::new(); table.columns.len()]);
        Ok(())
    }

    pub fn remove_table_row(&mut self, id: &str, index: usize) -> Result<()> {
        let table = self.table_mut(id)?;
        check_index("table row", index, table.rows.len())?;
        if table.rows.len() <= TABLE_MIN_ROWS {
            return Err(FlowError::BelowMinimum {
                what: "table rows",
                min: TABLE_MIN_ROWS,
            });
        }
        table.rows.remove(index);
        Ok(())
    }

    pub fn update_table_cell(
        &mut self,
        id: &str,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<()> {
        let table = self.table_mut(id)?;
        check_index("table row", row, table.rows.len())?;
        check_index("table column", column, table.columns.len())?;
        let cells = &mut table.rows[row];
        if cells.len() < table.columns.len() {
            cells.resize(table.columns.len(), String::new());
        }
        cells[column] = value.into();
        Ok(())
    }

    pub fn add_list_option(&mut self, id: &str) -> Result<()> {
        self.list_mut(id)?.options.push(String::new());
        Ok(())
    }

    pub fn remove_list_option(&mut self, id: &str, index: usize) -> Result<()> {
        let list = self.list_mut(id)?;
        check_index("list option", index, list.options.len())?;
        if list.options.len() <= LIST_MIN_OPTIONS {
            return Err(FlowError::BelowMinimum {
                what: "list options",
                min: LIST_MIN_OPTIONS,
            });
        }
        list.options.remove(index);
        Ok(())
    }

    pub fn update_list_option(
        &mut self,
        id: &str,
        index: usize,
        value: impl Into<String>,
    ) -> Result<()> {
        let list = self.list_mut(id)?;
        check_index("list option", index, list.options.len())?;
        list.options[index] = value.into();
        Ok(())
    }

    pub fn set_location_address(&mut self, id: &str, address: impl Into<String>) -> Result<()> {
        match &mut self.item_mut(id)?.metadata {
            ItemMetadata::Location(loc) => {
                loc.address = address.into();
                Ok(())
            }
            _ => Err(FlowError::NotApplicable {
                item_id: id.to_string(),
                what: "location",
            }),
        }
    }

    /// Appends a blank service (one empty recommendation) to the schedule item; returns its index.
    pub fn add_service(&mut self) -> Result<usize> {
        let item = self.schedule_item_mut()?;
        let mut services = match std::mem::take(&mut item.metadata) {
            ItemMetadata::Services(services) => services,
            _ => Vec::new(),
        };
        services.push(ScheduleService::blank());
        let index = services.len() - 1;
        item.metadata = ItemMetadata::Services(services);
        debug!(item_id = %item.id, services = index + 1, "service added");
        Ok(index)
    }

    pub fn remove_service(&mut self, index: usize) -> Result<()> {
        let (item_id, _) = self.service_mut(index)?;
        if let ItemMetadata::Services(services) = &mut self.schedule_item_mut()?.metadata {
            services.remove(index);
        }
        // Later services shift down; their retained errors no longer line up.
        self.errors
            .retain(|f, _| !matches!(f, FieldRef::ServiceType { item_id: i, .. } if *i == item_id));
        Ok(())
    }

    pub fn update_service_type(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let len = char_len(&value);
        let (item_id, service) = self.service_mut(index)?;
        let field = FieldRef::ServiceType { item_id, index };
        if len > SERVICE_TYPE_MAX {
            return Err(self.reject(FlowError::LabelTooLong {
                field,
                len,
                max: SERVICE_TYPE_MAX,
            }));
        }
        service.service_type = value;
        self.errors.remove(&field);
        Ok(())
    }

    pub fn update_service_price(&mut self, index: usize, price: Option<String>) -> Result<()> {
        let (_, service) = self.service_mut(index)?;
        service.price = price.filter(|p| !p.trim().is_empty());
        Ok(())
    }

    pub fn add_recommendation(&mut self, service: usize) -> Result<()> {
        let (_, service) = self.service_mut(service)?;
        service.recommendations.push(String::new());
        Ok(())
    }

    pub fn remove_recommendation(&mut self, service: usize, index: usize) -> Result<()> {
        let (_, service) = self.service_mut(service)?;
        let recs = &mut service.recommendations;
        check_index("recommendation", index, recs.len())?;
        if recs.len() <= MIN_RECOMMENDATIONS {
            return Err(FlowError::BelowMinimum {
                what: "recommendations",
                min: MIN_RECOMMENDATIONS,
            });
        }
        recs.remove(index);
        Ok(())
    }

    pub fn update_recommendation(
        &mut self,
        service: usize,
        index: usize,
        value: impl Into<String>,
    ) -> Result<()> {
        let (_, service) = self.service_mut(service)?;
        let recs = &mut service.recommendations;
        check_index("recommendation", index, recs.len())?;
        recs[index] = value.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MenuItemUpdate;
    use crate::types::{FlowConfig, MenuItemKind, TemplateKind};
    use wabot_core::SessionContext;

    fn model_with(kind: MenuItemKind) -> (FlowConfigModel, String) {
        let mut m = FlowConfigModel::new(SessionContext::new("t", "u1"), FlowConfig::default());
        let id = m.add_menu_item().unwrap();
        m.update_menu_item(&id, MenuItemUpdate::Kind(kind)).unwrap();
        (m, id)
    }

    fn table(m: &FlowConfigModel, id: &str) -> TableData {
        match &m.draft().menu_item(id).unwrap().metadata {
            ItemMetadata::Table(t) => t.clone(),
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_columns_bounded_between_two_and_four() {
        let (mut m, id) = model_with(MenuItemKind::Table);
        assert!(matches!(
            m.remove_table_column(&id, 0),
            Err(FlowError::BelowMinimum { min: 2, .. })
        ));
        m.add_table_column(&id).unwrap();
        m.add_table_column(&id).unwrap();
        assert!(matches!(
            m.add_table_column(&id),
            Err(FlowError::LimitExceeded { limit: 4, .. })
        ));
        let t = table(&m, &id);
        assert_eq!(t.columns.len(), 4);
        assert!(t.rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn test_rows_bounded_between_one_and_ten() {
        let (mut m, id) = model_with(MenuItemKind::Table);
        assert!(m.remove_table_row(&id, 0).is_err());
        for _ in 1..TABLE_MAX_ROWS {
            m.add_table_row(&id).unwrap();
        }
        assert!(m.add_table_row(&id).is_err());
        assert_eq!(table(&m, &id).rows.len(), TABLE_MAX_ROWS);
    }

    #[test]
    fn test_removing_column_keeps_rows_aligned() {
        let (mut m, id) = model_with(MenuItemKind::Table);
        m.add_table_column(&id).unwrap();
        m.rename_table_column(&id, 0, "Servicio").unwrap();
        m.rename_table_column(&id, 1, "Duración").unwrap();
        m.rename_table_column(&id, 2, "Precio").unwrap();
        m.update_table_cell(&id, 0, 0, "Corte").unwrap();
        m.update_table_cell(&id, 0, 2, "$150").unwrap();
        m.remove_table_column(&id, 1).unwrap();
        let t = table(&m, &id);
        assert_eq!(t.columns, vec!["Servicio", "Precio"]);
        assert_eq!(t.rows[0], vec!["Corte", "$150"]);
    }

    #[test]
    fn test_list_keeps_two_options() {
        let (mut m, id) = model_with(MenuItemKind::List);
        assert!(m.remove_list_option(&id, 1).is_err());
        m.add_list_option(&id).unwrap();
        m.update_list_option(&id, 2, "Otro").unwrap();
        m.remove_list_option(&id, 0).unwrap();
        match &m.draft().menu_item(&id).unwrap().metadata {
            ItemMetadata::List(l) => assert_eq!(l.options, vec!["", "Otro"]),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_editor_on_wrong_kind_is_rejected() {
        let (mut m, id) = model_with(MenuItemKind::Location);
        assert!(matches!(
            m.add_table_row(&id),
            Err(FlowError::NotApplicable { .. })
        ));
        m.set_location_address(&id, "Calle 5 #12").unwrap();
    }

    #[test]
    fn test_services_need_a_schedule_item() {
        let mut m = FlowConfigModel::new(SessionContext::new("t", "u1"), FlowConfig::default());
        assert!(matches!(m.add_service(), Err(FlowError::NoScheduleItem)));
    }

    #[test]
    fn test_service_type_too_long_is_rejected_and_recorded() {
        let mut m = FlowConfigModel::new(SessionContext::new("t", "u1"), FlowConfig::default());
        m.select_template(TemplateKind::Servicios);
        let idx = m.add_service().unwrap();
        assert_eq!(idx, 0);
        assert!(m.update_service_type(0, "x".repeat(25)).is_err());
        let field = FieldRef::ServiceType {
            item_id: "fixed-schedule".into(),
            index: 0,
        };
        assert!(m.error_for(&field).is_some());
        m.update_service_type(0, "Instalación").unwrap();
        assert!(m.error_for(&field).is_none());
    }

    #[test]
    fn test_rejected_service_edits_leave_draft_unchanged() {
        let mut m = FlowConfigModel::new(SessionContext::new("t", "u1"), FlowConfig::default());
        m.select_template(TemplateKind::Servicios);
        let before = m.draft().clone();
        assert!(m.draft().schedule_item().unwrap().metadata.is_none());

        assert!(matches!(
            m.remove_service(0),
            Err(FlowError::IndexOutOfRange { .. })
        ));
        assert!(m.update_service_type(5, "Corte").is_err());
        assert!(m.update_service_price(0, Some("$100".into())).is_err());
        assert!(m.add_recommendation(0).is_err());
        assert_eq!(m.draft(), &before);
    }

    #[test]
    fn test_last_recommendation_cannot_be_removed() {
        let mut m = FlowConfigModel::new(SessionContext::new("t", "u1"), FlowConfig::default());
        m.select_template(TemplateKind::Servicios);
        m.add_service().unwrap();
        assert!(m.remove_recommendation(0, 0).is_err());
        m.add_recommendation(0).unwrap();
        m.update_recommendation(0, 1, "Traer identificación").unwrap();
        m.remove_recommendation(0, 0).unwrap();
        let services = match &m.draft().schedule_item().unwrap().metadata {
            ItemMetadata::Services(s) => s.clone(),
            other => panic!("expected services, got {:?}", other),
        };
        assert_eq!(services[0].recommendations, vec!["Traer identificación"]);
    }
}
