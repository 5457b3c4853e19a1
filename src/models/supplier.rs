use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_record, Resource, Schema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Equipment,
    Services,
    Materials,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub supplier_type: SupplierType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SupplierCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 20, message = "tax_id cannot exceed 20 characters"))]
    pub tax_id: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "phone cannot exceed 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "address cannot exceed 255 characters"))]
    pub address: Option<String>,
    #[validate(length(max = 100, message = "contact_person cannot exceed 100 characters"))]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub supplier_type: SupplierType,
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SupplierUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20, message = "tax_id cannot exceed 20 characters"))]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20, message = "phone cannot exceed 20 characters"))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "address cannot exceed 255 characters"))]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "contact_person cannot exceed 100 characters"))]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_type: Option<SupplierType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl Schema for SupplierCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Schema for SupplierUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl_record!(Supplier);

pub struct Suppliers;

impl Resource for Suppliers {
    const TABLE: &'static str = "suppliers";
    const SINGULAR: &'static str = "supplier";
    const PLURAL: &'static str = "suppliers";
    const LABEL: &'static str = "supplier";
    const NULLABLE: &'static [&'static str] = &["tax_id", "email", "phone", "address", "contact_person", "notes"];

    type Record = Supplier;
    type Create = SupplierCreate;
    type Update = SupplierUpdate;
}
