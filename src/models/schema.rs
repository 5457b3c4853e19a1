use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::MAX_PRICE;
use crate::error::{ApiError, FieldError};

/// A foreign key a payload points at; it must name one of the owner's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub table: &'static str,
    pub label: &'static str,
    pub id: Uuid,
}

/// A request payload: declarative `validator` rules plus the checks that
/// `validator` cannot express on optional decimals.
pub trait Schema: Validate + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The record name carried by this payload, if any
    fn name(&self) -> Option<&str> {
        None
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Monetary fields, checked against `0..=MAX_PRICE`
    fn money(&self) -> Vec<(&'static str, Option<Decimal>)> {
        Vec::new()
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        let mut failed = !errors.field_errors().is_empty();

        if let Some(name) = self.name() {
            if name.trim().is_empty() && !name.is_empty() {
                errors.add("name", error("blank", "name cannot be blank"));
                failed = true;
            }
        }

        for (field, value) in self.money() {
            if let Some(value) = value {
                if let Err(e) = check_money(field, value) {
                    errors.add(field, e);
                    failed = true;
                }
            }
        }

        if failed {
            Err(errors)
        } else {
            Ok(())
        }
    }
}

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut e = ValidationError::new(code);
    e.message = Some(message.into());
    e
}

pub fn check_money(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(error("range", format!("{field} cannot be negative")));
    }
    if value > Decimal::from(MAX_PRICE) {
        return Err(error("range", format!("{field} cannot exceed {MAX_PRICE}")));
    }
    if value.normalize().scale() > 2 {
        return Err(error("scale", format!("{field} cannot have more than 2 decimal places")));
    }
    Ok(())
}

/// Deserialize and validate a JSON payload into `T`.
///
/// Deserialization failures (wrong types, unknown enum values) are reported
/// against the first field that fails on its own.
pub fn parse<T: Schema>(body: Value) -> Result<T, ApiError> {
    let Value::Object(object) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let input: T = match serde_json::from_value(Value::Object(object.clone())) {
        Ok(input) => input,
        Err(err) => return Err(deserialize_error::<T>(&object, err)),
    };

    input.check()?;
    Ok(input)
}

fn deserialize_error<T: Schema>(object: &Map<String, Value>, err: serde_json::Error) -> ApiError {
    let offending = object.iter().find_map(|(key, value)| {
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        serde_json::from_value::<T>(Value::Object(single))
            .err()
            .map(|e| FieldError::new(key.clone(), strip_position(&e)))
    });

    let detail = offending.unwrap_or_else(|| FieldError::new("body", strip_position(&err)));
    ApiError::validation_error("Validation failed", vec![detail])
}

/// serde_json appends "at line 1 column 12" which means nothing for a re-serialized value
fn strip_position(err: &serde_json::Error) -> String {
    let text = err.to_string();
    match text.find(" at line ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

/// Body of a PATCH: the serialized update (absent fields skipped) plus
/// explicit `null`s for columns that may be cleared.
pub fn patch_row<T: Schema>(update: &T, raw: &Map<String, Value>, nullable: &[&str]) -> Result<Map<String, Value>, ApiError> {
    let mut row = match serde_json::to_value(update) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => return Err(ApiError::internal_server_error("Failed to encode update")),
    };
    row.retain(|_, v| !v.is_null());

    for column in nullable {
        if matches!(raw.get(*column), Some(Value::Null)) {
            row.insert((*column).to_string(), Value::Null);
        }
    }
    Ok(row)
}
