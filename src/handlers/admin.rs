use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::gate::{ImpersonationGrant, RequestContext};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub organization_id: Uuid,
}

/// POST /api/admin/impersonate
///
/// Role is checked against the real principal; an active overlay does not
/// change it.
pub async fn impersonate_start(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<ImpersonateRequest>, JsonRejection>,
) -> ApiResult<ImpersonationGrant> {
    let Json(payload) = payload?;
    let grant = state
        .impersonation
        .start(&ctx.principal, payload.organization_id, state.organizations.as_ref())
        .await?;

    let cookie = grant.set_cookie.clone();
    Ok(ApiResponse::success(grant).with_cookies([cookie]))
}

/// DELETE /api/admin/impersonate - idempotent
pub async fn impersonate_stop(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::success(json!({ "impersonating": false })).with_cookies([state.impersonation.stop()])
}
