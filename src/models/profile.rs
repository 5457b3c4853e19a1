use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::{impl_record, Schema};
use crate::auth::Identity;

pub const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Account profile; `id` is the owner's identity id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Row for a profile seen for the first time
    pub fn initial_row(identity: &Identity) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("id".to_string(), Value::String(identity.id.to_string()));
        row.insert(
            "email".to_string(),
            identity.email.clone().map(Value::String).unwrap_or(Value::Null),
        );
        row.insert("role".to_string(), Value::String("user".to_string()));
        row
    }
}

/// The only self-editable profile fields; `role` is not among them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "full_name cannot exceed 100 characters"))]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "company_name cannot exceed 100 characters"))]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(max = 500, message = "avatar_url cannot exceed 500 characters"),
        url(message = "avatar_url must be a valid URL")
    )]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub const NULLABLE: &'static [&'static str] = &["full_name", "company_name", "avatar_url"];
}

impl Schema for ProfileUpdate {}

impl_record!(Profile);
