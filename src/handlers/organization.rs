use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;
use crate::database::Organization;
use crate::error::ApiError;
use crate::gate::RequestContext;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct OrganizationView {
    #[serde(flatten)]
    pub organization: Organization,
    pub trial_expired: bool,
    pub impersonating: bool,
}

/// GET /api/organization - subscription state of the effective organization
pub async fn current(State(state): State<AppState>, ctx: RequestContext) -> ApiResult<OrganizationView> {
    let organization_id = ctx.require_organization()?;

    let organization = state
        .organizations
        .find_organization(organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))?;

    Ok(ApiResponse::success(OrganizationView {
        trial_expired: organization.trial_expired(Utc::now()),
        organization,
        impersonating: ctx.effective.impersonating,
    }))
}
