use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::catalog::Products;
use super::{impl_record, Reference, Resource, Schema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Available,
    Rented,
    Maintenance,
    Damaged,
    Sold,
    Retired,
}

/// One physical unit, usually of a catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub product_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EquipmentCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "name must be between 2 and 200 characters"))]
    pub name: String,
    pub product_id: Option<Uuid>,
    #[validate(length(max = 100, message = "serial_number cannot exceed 100 characters"))]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EquipmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 200, message = "name must be between 2 and 200 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "serial_number cannot exceed 100 characters"))]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EquipmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

fn product_reference(product_id: Option<Uuid>) -> Vec<Reference> {
    product_id
        .map(|id| Reference {
            field: "product_id",
            table: Products::TABLE,
            label: Products::LABEL,
            id,
        })
        .into_iter()
        .collect()
}

impl Schema for EquipmentCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn references(&self) -> Vec<Reference> {
        product_reference(self.product_id)
    }
}

impl Schema for EquipmentUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn references(&self) -> Vec<Reference> {
        product_reference(self.product_id)
    }
}

impl_record!(EquipmentItem);

pub struct Equipment;

impl Resource for Equipment {
    const TABLE: &'static str = "equipment_items";
    const SINGULAR: &'static str = "equipment_item";
    const PLURAL: &'static str = "equipment_items";
    const LABEL: &'static str = "equipment item";
    // Several units of one product commonly share a name.
    const UNIQUE_NAME: bool = false;
    const NULLABLE: &'static [&'static str] = &["product_id", "serial_number", "purchase_date", "notes"];

    type Record = EquipmentItem;
    type Create = EquipmentCreate;
    type Update = EquipmentUpdate;
}
