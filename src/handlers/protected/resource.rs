//! Generic CRUD handlers, instantiated once per [`Resource`] in the router.

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::Value;
use uuid::Uuid;

use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::{no_content, ApiResponse, ApiResult, CurrentUser, Payload};
use crate::models::schema::{parse, patch_row};
use crate::models::{Record, Resource, Schema};
use crate::state::AppState;

/// Path ids that are not UUIDs cannot name a record
pub(crate) fn parse_id(raw: &str, label: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| not_found(label))
}

pub(crate) fn not_found(label: &str) -> ApiError {
    let mut label = label.to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    ApiError::not_found(format!("{} not found", label))
}

async fn check_name<R: Resource, S: Schema>(repo: &Repository<R>, input: &S, except: Option<Uuid>) -> Result<(), ApiError> {
    if !R::UNIQUE_NAME {
        return Ok(());
    }
    if let Some(name) = input.name() {
        if repo.name_taken(name, except).await? {
            return Err(ApiError::conflict(format!("A {} named '{}' already exists", R::LABEL, name)));
        }
    }
    Ok(())
}

pub(crate) async fn check_references<R: Resource, S: Schema>(repo: &Repository<R>, input: &S) -> Result<(), ApiError> {
    for reference in input.references() {
        if !repo.owns(reference.table, reference.id).await? {
            return Err(ApiError::field(reference.field, format!("Unknown {}", reference.label)));
        }
    }
    Ok(())
}

/// GET /api/<resource> - All of the caller's records, by name
pub async fn list<R: Resource>(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Vec<R::Record>> {
    let repo = Repository::<R>::new(state.store.clone(), user.id);
    let records = repo.select_all().await?;
    Ok(ApiResponse::success(R::PLURAL, records))
}

/// POST /api/<resource>
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload,
) -> ApiResult<R::Record> {
    let input: R::Create = parse(body)?;
    let repo = Repository::<R>::new(state.store.clone(), user.id);

    check_name(&repo, &input, None).await?;
    check_references(&repo, &input).await?;

    let record = repo.insert(&input).await?;
    tracing::info!(table = R::TABLE, id = %record.id(), owner = %user.id, "Created {}", R::LABEL);
    Ok(ApiResponse::created(R::SINGULAR, record))
}

/// GET /api/<resource>/:id
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<R::Record> {
    let id = parse_id(&id, R::LABEL)?;
    let repo = Repository::<R>::new(state.store.clone(), user.id);
    let record = repo.select_id(id).await?.ok_or_else(|| not_found(R::LABEL))?;
    Ok(ApiResponse::success(R::SINGULAR, record))
}

/// PATCH /api/<resource>/:id - Partial update; explicit `null` clears nullable columns
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> ApiResult<R::Record> {
    let id = parse_id(&id, R::LABEL)?;
    let Value::Object(raw) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let input: R::Update = parse(Value::Object(raw.clone()))?;
    let patch = patch_row(&input, &raw, R::NULLABLE)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let repo = Repository::<R>::new(state.store.clone(), user.id);
    if repo.select_id(id).await?.is_none() {
        return Err(not_found(R::LABEL));
    }
    check_name(&repo, &input, Some(id)).await?;
    check_references(&repo, &input).await?;

    let record = repo.update(id, patch).await?.ok_or_else(|| not_found(R::LABEL))?;
    tracing::info!(table = R::TABLE, id = %id, "Updated {}", R::LABEL);
    Ok(ApiResponse::success(R::SINGULAR, record))
}

/// DELETE /api/<resource>/:id
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id, R::LABEL)?;
    let repo = Repository::<R>::new(state.store.clone(), user.id);

    if repo.is_referenced(id).await? {
        return Err(ApiError::conflict(format!("This {} is still in use and cannot be deleted", R::LABEL)));
    }
    if !repo.delete(id).await? {
        return Err(not_found(R::LABEL));
    }
    let dependents = repo.delete_dependents(id).await?;

    tracing::info!(table = R::TABLE, id = %id, dependents, "Deleted {}", R::LABEL);
    Ok(no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_capitalizes_label() {
        assert_eq!(not_found("job position").message(), "Job position not found");
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id("42", "client").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
