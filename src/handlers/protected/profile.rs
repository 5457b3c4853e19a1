use axum::extract::State;
use serde_json::Value;

use crate::auth::Identity;
use crate::database::{Filter, Scope, StoreError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, Payload};
use crate::models::profile::PROFILES_TABLE;
use crate::models::schema::{parse, patch_row};
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;

fn decode(row: crate::database::Row) -> Result<Profile, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Malformed(format!("{}: {}", PROFILES_TABLE, e)))
}

/// The caller's profile, created from the identity on first access
async fn load_or_create(state: &AppState, identity: &Identity) -> Result<Profile, StoreError> {
    let scope = Scope::new(PROFILES_TABLE, identity.id);
    let existing = state
        .store
        .select(scope, &[Filter::eq("id", identity.id)], "id")
        .await?;

    match existing.into_iter().next() {
        Some(row) => decode(row),
        None => {
            let row = state.store.insert(scope, Profile::initial_row(identity)).await?;
            tracing::info!(user = %identity.id, "Created profile");
            decode(row)
        }
    }
}

/// GET /api/profile
pub async fn get(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Profile> {
    let profile = load_or_create(&state, &user).await?;
    Ok(ApiResponse::success("profile", profile))
}

/// PATCH /api/profile - Only `full_name`, `company_name` and `avatar_url` are writable
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(body): Payload,
) -> ApiResult<Profile> {
    let Value::Object(raw) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };
    let input: ProfileUpdate = parse(Value::Object(raw.clone()))?;
    let patch = patch_row(&input, &raw, ProfileUpdate::NULLABLE)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    load_or_create(&state, &user).await?;
    let row = state
        .store
        .update(Scope::new(PROFILES_TABLE, user.id), user.id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(ApiResponse::success("profile", decode(row)?))
}
