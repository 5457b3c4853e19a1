use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::resource::{check_references, not_found, parse_id};
use crate::database::{Filter, Repository};
use crate::error::ApiError;
use crate::middleware::{no_content, ApiResponse, ApiResult, CurrentUser, Payload};
use crate::models::personnel::AssignmentCreate;
use crate::models::schema::parse;
use crate::models::{JobPositions, PersonnelMembers, PersonnelPositions, PositionView, Resource};
use crate::state::AppState;

async fn personnel_id(state: &AppState, owner: Uuid, raw: &str) -> Result<Uuid, ApiError> {
    let id = parse_id(raw, PersonnelMembers::LABEL)?;
    let members = Repository::<PersonnelMembers>::new(state.store.clone(), owner);
    match members.select_id(id).await? {
        Some(_) => Ok(id),
        None => Err(not_found(PersonnelMembers::LABEL)),
    }
}

/// GET /api/personnel/:id/positions - Assignments in the order they were made
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<PositionView>> {
    let personnel_id = personnel_id(&state, user.id, &id).await?;

    let assignments = Repository::<PersonnelPositions>::new(state.store.clone(), user.id)
        .select_where(&[Filter::eq("personnel_id", personnel_id)])
        .await?;
    let positions: HashMap<Uuid, _> = Repository::<JobPositions>::new(state.store.clone(), user.id)
        .select_all()
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let views = assignments
        .into_iter()
        .filter_map(|assignment| match positions.get(&assignment.job_position_id) {
            Some(position) => Some(PositionView::new(assignment, position)),
            None => {
                tracing::warn!("Assignment {} points at a missing job position", assignment.id);
                None
            }
        })
        .collect();

    Ok(ApiResponse::success(PersonnelPositions::PLURAL, views))
}

/// POST /api/personnel/:id/positions
pub async fn assign(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> ApiResult<PositionView> {
    let personnel_id = personnel_id(&state, user.id, &id).await?;
    let mut input: AssignmentCreate = parse(body)?;
    let Some(job_position_id) = input.job_position_id else {
        return Err(ApiError::field("job_position_id", "job_position_id is required"));
    };

    let repo = Repository::<PersonnelPositions>::new(state.store.clone(), user.id);
    check_references(&repo, &input).await?;

    let existing = repo
        .select_where(&[
            Filter::eq("personnel_id", personnel_id),
            Filter::eq("job_position_id", job_position_id),
        ])
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::conflict("This job position is already assigned to the personnel member"));
    }

    input.assigned_at.get_or_insert_with(|| Utc::now().date_naive());
    let mut row = match serde_json::to_value(&input) {
        Ok(Value::Object(row)) => row,
        _ => return Err(ApiError::internal_server_error("Failed to encode assignment")),
    };
    row.insert("personnel_id".to_string(), Value::String(personnel_id.to_string()));

    let assignment = repo.insert_row(row).await?;
    let position = Repository::<JobPositions>::new(state.store.clone(), user.id)
        .select_id(job_position_id)
        .await?
        .ok_or_else(|| ApiError::field("job_position_id", "Unknown job position"))?;

    tracing::info!(personnel = %personnel_id, job_position = %job_position_id, "Assigned job position");
    Ok(ApiResponse::created(PersonnelPositions::SINGULAR, PositionView::new(assignment, &position)))
}

/// DELETE /api/personnel/:id/positions/:assignment_id
pub async fn unassign(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, assignment_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let personnel_id = personnel_id(&state, user.id, &id).await?;
    let assignment_id = parse_id(&assignment_id, PersonnelPositions::LABEL)?;

    let repo = Repository::<PersonnelPositions>::new(state.store.clone(), user.id);
    let belongs = repo
        .select_id(assignment_id)
        .await?
        .is_some_and(|a| a.personnel_id == personnel_id);
    if !belongs || !repo.delete(assignment_id).await? {
        return Err(not_found(PersonnelPositions::LABEL));
    }

    Ok(no_content())
}
