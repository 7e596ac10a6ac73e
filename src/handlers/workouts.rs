use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::{Role, SetLog};
use crate::error::ApiError;
use crate::gate::{GateError, RequestContext};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{group_by_exercise, ExerciseSets};

#[derive(Debug, Deserialize)]
pub struct SetInput {
    pub exercise_id: Uuid,
    pub set_number: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub performed_at: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
}

impl SetInput {
    fn validate(&self) -> Result<(), ApiError> {
        if self.set_number < 1 {
            return Err(ApiError::field_error("set_number", "must be at least 1"));
        }
        if self.reps < 0 {
            return Err(ApiError::field_error("reps", "must not be negative"));
        }
        if !self.weight_kg.is_finite() || self.weight_kg < 0.0 {
            return Err(ApiError::field_error("weight_kg", "must be a non-negative number"));
        }
        Ok(())
    }
}

/// Clients only ever log or read their own sets
pub(crate) fn scoped_client(ctx: &RequestContext, requested: Option<Uuid>) -> Result<Option<Uuid>, GateError> {
    if ctx.principal.role != Role::Client {
        return Ok(requested);
    }

    match requested {
        Some(client_id) if client_id != ctx.principal.id => {
            Err(GateError::Forbidden("clients may only access their own sets".to_string()))
        }
        _ => Ok(Some(ctx.principal.id)),
    }
}

/// PUT /api/workouts/:session_id/sets
///
/// Writing the same (session, exercise, set number) twice updates the row
/// in place. A key already owned by another organization is reported as
/// not found.
pub async fn put_set(
    State(state): State<AppState>,
    ctx: RequestContext,
    session_id: Result<Path<Uuid>, PathRejection>,
    input: Result<Json<SetInput>, JsonRejection>,
) -> ApiResult<SetLog> {
    let Path(session_id) = session_id?;
    let Json(input) = input?;
    input.validate()?;
    let organization_id = ctx.require_organization()?;
    let client_id = scoped_client(&ctx, input.client_id)?;

    let set = SetLog {
        organization_id,
        workout_session_id: session_id,
        exercise_id: input.exercise_id,
        client_id,
        set_number: input.set_number,
        reps: input.reps,
        weight_kg: input.weight_kg,
        performed_at: input.performed_at.unwrap_or_else(Utc::now),
    };

    let saved = state
        .set_logs
        .upsert_set(&set)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout set not found"))?;

    tracing::debug!(
        "Logged set {} of exercise {} in session {} for organization {}",
        saved.set_number,
        saved.exercise_id,
        session_id,
        organization_id
    );

    Ok(ApiResponse::success(saved))
}

/// GET /api/workouts/:session_id/sets - grouped per exercise
pub async fn list_sets(
    State(state): State<AppState>,
    ctx: RequestContext,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<ExerciseSets>> {
    let Path(session_id) = session_id?;
    let organization_id = ctx.require_organization()?;
    let client_id = scoped_client(&ctx, None)?;

    let mut sets = state.set_logs.sets_for_session(organization_id, session_id).await?;
    if let Some(client_id) = client_id {
        sets.retain(|set| set.client_id == Some(client_id));
    }

    Ok(ApiResponse::success(group_by_exercise(sets)))
}
