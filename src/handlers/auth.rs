use axum::extract::State;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::Role;
use crate::gate::RequestContext;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct Whoami {
    pub id: Uuid,
    pub role: Role,
    pub organization_id: Option<Uuid>,
    pub effective_organization_id: Option<Uuid>,
    pub impersonating: bool,
}

/// GET /api/auth/whoami
pub async fn whoami(ctx: RequestContext) -> ApiResult<Whoami> {
    Ok(ApiResponse::success(Whoami {
        id: ctx.principal.id,
        role: ctx.principal.role,
        organization_id: ctx.principal.organization_id,
        effective_organization_id: ctx.effective.organization_id,
        impersonating: ctx.effective.impersonating,
    }))
}

/// DELETE /api/auth/session - clears session, refresh and impersonation cookies.
/// Safe to call without a session.
pub async fn sign_out(State(state): State<AppState>) -> ApiResponse<Value> {
    let mut cookies = state.sessions.sign_out_cookies();
    cookies.push(state.impersonation.stop());

    ApiResponse::success(json!({ "signed_out": true })).with_cookies(cookies)
}
