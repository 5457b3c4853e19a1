use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_record, Reference, Resource, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload shared by brands and categories
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LabelCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LabelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
}

impl Schema for LabelCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Schema for LabelUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A rentable catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub purchase_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "name must be between 2 and 200 characters"))]
    pub name: String,
    #[validate(length(max = 50, message = "sku cannot exceed 50 characters"))]
    pub sku: Option<String>,
    #[validate(length(max = 1000, message = "description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub purchase_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 200, message = "name must be between 2 and 200 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "sku cannot exceed 50 characters"))]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub daily_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
}

fn catalog_references(brand_id: Option<Uuid>, category_id: Option<Uuid>) -> Vec<Reference> {
    let brand = brand_id.map(|id| Reference {
        field: "brand_id",
        table: Brands::TABLE,
        label: Brands::LABEL,
        id,
    });
    let category = category_id.map(|id| Reference {
        field: "category_id",
        table: Categories::TABLE,
        label: Categories::LABEL,
        id,
    });
    brand.into_iter().chain(category).collect()
}

impl Schema for ProductCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn references(&self) -> Vec<Reference> {
        catalog_references(self.brand_id, self.category_id)
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", Some(self.daily_price)), ("purchase_price", self.purchase_price)]
    }
}

impl Schema for ProductUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn references(&self) -> Vec<Reference> {
        catalog_references(self.brand_id, self.category_id)
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", self.daily_price), ("purchase_price", self.purchase_price)]
    }
}

impl_record!(Brand, Category, Product);

pub struct Brands;

impl Resource for Brands {
    const TABLE: &'static str = "brands";
    const SINGULAR: &'static str = "brand";
    const PLURAL: &'static str = "brands";
    const LABEL: &'static str = "brand";
    const NULLABLE: &'static [&'static str] = &["description"];
    const REFERENCED_BY: &'static [(&'static str, &'static str)] = &[("products", "brand_id")];

    type Record = Brand;
    type Create = LabelCreate;
    type Update = LabelUpdate;
}

pub struct Categories;

impl Resource for Categories {
    const TABLE: &'static str = "categories";
    const SINGULAR: &'static str = "category";
    const PLURAL: &'static str = "categories";
    const LABEL: &'static str = "category";
    const NULLABLE: &'static [&'static str] = &["description"];
    const REFERENCED_BY: &'static [(&'static str, &'static str)] = &[("products", "category_id")];

    type Record = Category;
    type Create = LabelCreate;
    type Update = LabelUpdate;
}

pub struct Products;

impl Resource for Products {
    const TABLE: &'static str = "products";
    const SINGULAR: &'static str = "product";
    const PLURAL: &'static str = "products";
    const LABEL: &'static str = "product";
    const NULLABLE: &'static [&'static str] = &["sku", "description", "brand_id", "category_id", "purchase_price"];
    const REFERENCED_BY: &'static [(&'static str, &'static str)] = &[("equipment_items", "product_id")];

    type Record = Product;
    type Create = ProductCreate;
    type Update = ProductUpdate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::parse;
    use serde_json::json;

    #[test]
    fn product_lists_only_given_references() {
        let brand = Uuid::new_v4();
        let input = parse::<ProductCreate>(json!({ "name": "Moving head", "brand_id": brand })).unwrap();
        let refs = input.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].field, "brand_id");
        assert_eq!(refs[0].table, "brands");
        assert_eq!(refs[0].id, brand);
    }

    #[test]
    fn purchase_price_is_optional_but_bounded() {
        let input = parse::<ProductCreate>(json!({ "name": "Truss 2m" })).unwrap();
        assert!(input.purchase_price.is_none());
        assert_eq!(input.daily_price, Decimal::ZERO);

        let err = parse::<ProductCreate>(json!({ "name": "Truss 2m", "purchase_price": -1 })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["field"], "purchase_price");
    }

    #[test]
    fn product_name_allows_two_hundred_characters() {
        let name = "x".repeat(200);
        assert!(parse::<ProductCreate>(json!({ "name": name })).is_ok());
        let name = "x".repeat(201);
        assert!(parse::<ProductCreate>(json!({ "name": name })).is_err());
    }

    #[test]
    fn malformed_reference_is_attributed() {
        let err = parse::<ProductUpdate>(json!({ "category_id": "not-a-uuid" })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["field"], "category_id");
    }
}
