use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::response::append_set_cookies;
use crate::app::AppState;
use crate::database::Organization;
use crate::gate::context::{Principal, RequestContext};
use crate::gate::impersonation::{effective_context, overlay_from_headers};
use crate::gate::{canonical_path, decide, AccessDecision};

/// Access gate run once per request before any handler.
///
/// Resolves the session, loads the profile, derives the Effective Context,
/// loads organization state only when the path is billable, then either
/// redirects (302) or forwards the request with a [`RequestContext`] in its
/// extensions. Rotated session cookies ride along on either outcome.
///
/// Loader failures never fail the request: a missing or unreadable profile
/// means anonymous, a missing or unreadable organization means no billing
/// restriction.
pub async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    // Classify what a page layer would eventually serve, not the raw bytes
    let path = canonical_path(request.uri().path());
    let session = state.sessions.resolve(request.headers()).await;

    let principal = match session.principal_id {
        Some(principal_id) => load_principal(&state, principal_id).await,
        None => None,
    };

    let context = principal.map(|principal| {
        let effective = effective_context(&principal, overlay_from_headers(request.headers()));
        RequestContext { principal, effective }
    });

    let organization = match (&context, state.policy.needs_organization_state(&path, context.is_some())) {
        (Some(ctx), true) => match ctx.organization_id() {
            Some(organization_id) => load_organization(&state, organization_id).await,
            None => None,
        },
        _ => None,
    };

    let decision = decide(
        &state.policy,
        &path,
        context.as_ref().map(|ctx| &ctx.principal),
        organization.as_ref(),
        Utc::now(),
    );

    let mut response = match decision.location(&state.policy) {
        Some(location) => {
            tracing::debug!("Gate redirect {} -> {} ({:?})", path, location, decision);
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        None => {
            debug_assert_eq!(decision, AccessDecision::Allow);
            if let Some(ctx) = context {
                request.extensions_mut().insert(ctx);
            }
            next.run(request).await
        }
    };

    append_set_cookies(&mut response, &session.set_cookies);
    response
}

/// Profile lookup, failing closed: absence or error reads as anonymous
async fn load_principal(state: &AppState, principal_id: uuid::Uuid) -> Option<Principal> {
    match state.profiles.find_profile(principal_id).await {
        Ok(Some(profile)) => {
            tracing::debug!("Profile loaded for principal {} ({})", profile.id, profile.role);
            Some(Principal::from(profile))
        }
        Ok(None) => {
            tracing::warn!("Session for principal {} has no profile; treating as anonymous", principal_id);
            None
        }
        Err(e) => {
            tracing::error!("Profile lookup failed for {}: {}", principal_id, e);
            None
        }
    }
}

/// Organization lookup, failing open: absence or error means no billing gate
async fn load_organization(state: &AppState, organization_id: uuid::Uuid) -> Option<Organization> {
    match state.organizations.find_organization(organization_id).await {
        Ok(organization) => {
            if organization.is_none() {
                tracing::warn!("Organization {} not found; skipping billing gate", organization_id);
            }
            organization
        }
        Err(e) => {
            tracing::error!("Organization lookup failed for {}: {}", organization_id, e);
            None
        }
    }
}
