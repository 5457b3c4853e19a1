use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_record, Resource, Schema};

/// A billable service, priced per day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub daily_price: Option<Decimal>,
}

impl Schema for ServiceCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", Some(self.daily_price))]
    }
}

impl Schema for ServiceUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", self.daily_price)]
    }
}

/// A role personnel can be assigned to, with its default day rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosition {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobPositionCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub daily_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct JobPositionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub daily_price: Option<Decimal>,
}

impl Schema for JobPositionCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", Some(self.daily_price))]
    }
}

impl Schema for JobPositionUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_price", self.daily_price)]
    }
}

impl_record!(Service, JobPosition);

pub struct Services;

impl Resource for Services {
    const TABLE: &'static str = "services";
    const SINGULAR: &'static str = "service";
    const PLURAL: &'static str = "services";
    const LABEL: &'static str = "service";
    const NULLABLE: &'static [&'static str] = &["description"];

    type Record = Service;
    type Create = ServiceCreate;
    type Update = ServiceUpdate;
}

pub struct JobPositions;

impl Resource for JobPositions {
    const TABLE: &'static str = "job_positions";
    const SINGULAR: &'static str = "job_position";
    const PLURAL: &'static str = "job_positions";
    const LABEL: &'static str = "job position";
    const NULLABLE: &'static [&'static str] = &["description"];
    const REFERENCED_BY: &'static [(&'static str, &'static str)] = &[("personnel_positions", "job_position_id")];

    type Record = JobPosition;
    type Create = JobPositionCreate;
    type Update = JobPositionUpdate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::parse;
    use serde_json::json;

    #[test]
    fn create_defaults_price_to_zero() {
        let input = parse::<ServiceCreate>(json!({ "name": "Sound check" })).unwrap();
        assert_eq!(input.daily_price, Decimal::ZERO);
        assert!(input.description.is_none());
    }

    #[test]
    fn negative_and_excessive_prices_rejected() {
        let err = parse::<ServiceCreate>(json!({ "name": "Audio", "daily_price": -5 })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["field"], "daily_price");

        let err = parse::<JobPositionUpdate>(json!({ "daily_price": 250000 })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["message"], "daily_price cannot exceed 100000");
    }

    #[test]
    fn update_is_partial() {
        let update = parse::<ServiceUpdate>(json!({ "daily_price": 12.5 })).unwrap();
        assert!(update.name.is_none());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "daily_price": 12.5 }));
    }

    #[test]
    fn record_serializes_prices_as_numbers() {
        let service = Service {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Audio".to_string(),
            description: None,
            daily_price: "150.50".parse().unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&service).unwrap();
        assert_eq!(value["daily_price"], json!(150.5));
        assert_eq!(value["description"], serde_json::Value::Null);
    }
}
