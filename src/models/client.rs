use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{impl_record, Resource, Schema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    #[default]
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub client_type: ClientType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientCreate {
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
    #[validate(length(max = 100, message = "city cannot exceed 100 characters"))]
    pub city: Option<String>,
    #[validate(length(max = 10, message = "postal_code cannot exceed 10 characters"))]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub client_type: ClientType,
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClientUpdate {
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
    #[validate(length(max = 100, message = "city cannot exceed 100 characters"))]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10, message = "postal_code cannot exceed 10 characters"))]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl Schema for ClientCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Schema for ClientUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl_record!(Client);

pub struct Clients;

impl Resource for Clients {
    const TABLE: &'static str = "clients";
    const SINGULAR: &'static str = "client";
    const PLURAL: &'static str = "clients";
    const LABEL: &'static str = "client";
    const NULLABLE: &'static [&'static str] =
        &["tax_id", "email", "phone", "address", "city", "postal_code", "notes"];

    type Record = Client;
    type Create = ClientCreate;
    type Update = ClientUpdate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::parse;
    use serde_json::json;

    #[test]
    fn client_type_defaults_to_company() {
        let input = parse::<ClientCreate>(json!({ "name": "Acme Events" })).unwrap();
        assert_eq!(input.client_type, ClientType::Company);
    }

    #[test]
    fn unknown_client_type_is_attributed() {
        let err = parse::<ClientCreate>(json!({ "name": "Acme", "client_type": "government" })).unwrap_err();
        let details = &err.to_json()["details"];
        assert_eq!(details[0]["field"], "client_type");
        assert!(details[0]["message"].as_str().unwrap().contains("unknown variant"));
    }

    #[test]
    fn invalid_email_rejected() {
        let err = parse::<ClientUpdate>(json!({ "email": "not-an-email" })).unwrap_err();
        assert_eq!(err.to_json()["details"][0]["message"], "email must be a valid email address");
    }
}
