use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::service::{JobPosition, JobPositions};
use super::{impl_record, Reference, Resource, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PersonnelCreate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 20, message = "tax_id cannot exceed 20 characters"))]
    pub tax_id: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "phone cannot exceed 20 characters"))]
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PersonnelUpdate {
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
    pub hire_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl Schema for PersonnelCreate {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Schema for PersonnelUpdate {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// A job position held by a personnel member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonnelPosition {
    pub id: Uuid,
    pub user_id: Uuid,
    pub personnel_id: Uuid,
    pub job_position_id: Uuid,
    pub assigned_at: NaiveDate,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub daily_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/personnel/:id/positions`; `personnel_id` comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignmentCreate {
    #[validate(required(message = "job_position_id is required"))]
    pub job_position_id: Option<Uuid>,
    pub assigned_at: Option<NaiveDate>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub daily_rate: Option<Decimal>,
}

impl Schema for AssignmentCreate {
    fn references(&self) -> Vec<Reference> {
        self.job_position_id
            .map(|id| Reference {
                field: "job_position_id",
                table: JobPositions::TABLE,
                label: JobPositions::LABEL,
                id,
            })
            .into_iter()
            .collect()
    }

    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("daily_rate", self.daily_rate)]
    }
}

/// An assignment as listed under its personnel member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    #[serde(flatten)]
    pub assignment: PersonnelPosition,
    pub job_position_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub effective_daily_rate: Decimal,
}

impl PositionView {
    pub fn new(assignment: PersonnelPosition, position: &JobPosition) -> Self {
        let effective_daily_rate = assignment.daily_rate.unwrap_or(position.daily_price);
        Self {
            assignment,
            job_position_name: position.name.clone(),
            effective_daily_rate,
        }
    }
}

impl_record!(Personnel, PersonnelPosition);

pub struct PersonnelMembers;

impl Resource for PersonnelMembers {
    const TABLE: &'static str = "personnel";
    const SINGULAR: &'static str = "personnel";
    const PLURAL: &'static str = "personnel";
    const LABEL: &'static str = "personnel member";
    // Two employees may share a name.
    const UNIQUE_NAME: bool = false;
    const NULLABLE: &'static [&'static str] = &["tax_id", "email", "phone", "hire_date", "notes"];
    const CASCADE: &'static [(&'static str, &'static str)] = &[("personnel_positions", "personnel_id")];

    type Record = Personnel;
    type Create = PersonnelCreate;
    type Update = PersonnelUpdate;
}

pub struct PersonnelPositions;

impl Resource for PersonnelPositions {
    const TABLE: &'static str = "personnel_positions";
    const SINGULAR: &'static str = "position";
    const PLURAL: &'static str = "positions";
    const LABEL: &'static str = "assignment";
    const ORDER_BY: &'static str = "assigned_at";
    const UNIQUE_NAME: bool = false;

    type Record = PersonnelPosition;
    type Create = AssignmentCreate;
    // Assignments are removed and re-created, never patched.
    type Update = AssignmentCreate;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::parse;
    use serde_json::json;

    fn position(daily_price: &str) -> JobPosition {
        JobPosition {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Stagehand".to_string(),
            description: None,
            daily_price: daily_price.parse().unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn assignment(job: &JobPosition, daily_rate: Option<Decimal>) -> PersonnelPosition {
        PersonnelPosition {
            id: Uuid::new_v4(),
            user_id: job.user_id,
            personnel_id: Uuid::new_v4(),
            job_position_id: job.id,
            assigned_at: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            daily_rate,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_rate_prefers_override() {
        let job = position("120");
        let view = PositionView::new(assignment(&job, Some("150".parse().unwrap())), &job);
        assert_eq!(view.effective_daily_rate, Decimal::from(150));

        let view = PositionView::new(assignment(&job, None), &job);
        assert_eq!(view.effective_daily_rate, Decimal::from(120));
    }

    #[test]
    fn view_flattens_assignment() {
        let job = position("99.5");
        let view = PositionView::new(assignment(&job, None), &job);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["job_position_name"], "Stagehand");
        assert_eq!(value["effective_daily_rate"], json!(99.5));
        assert_eq!(value["assigned_at"], "2024-05-02");
        assert_eq!(value["daily_rate"], serde_json::Value::Null);
    }

    #[test]
    fn assignment_requires_job_position() {
        let err = parse::<AssignmentCreate>(json!({ "daily_rate": 10 })).unwrap_err();
        let details = &err.to_json()["details"];
        assert_eq!(details[0]["field"], "job_position_id");
        assert_eq!(details[0]["message"], "job_position_id is required");
    }
}
