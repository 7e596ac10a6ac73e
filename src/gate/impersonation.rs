use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::context::{EffectiveContext, Principal};
use super::GateError;
use crate::auth::cookies::{read_cookie, CookieSettings, IMPERSONATION_COOKIE};
use crate::database::OrganizationStore;

/// Result of a successful `start`
#[derive(Debug, Clone, Serialize)]
pub struct ImpersonationGrant {
    pub organization_id: Uuid,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub set_cookie: String,
}

/// Super-admin override of the Effective Context.
///
/// The overlay is a plain client-readable cookie holding the target
/// organization id. It only ever changes data scoping, never the role.
#[derive(Debug, Clone, Copy)]
pub struct ImpersonationOverlay {
    cookies: CookieSettings,
    ttl: Duration,
}

impl ImpersonationOverlay {
    pub fn new(cookies: CookieSettings, ttl_hours: i64) -> Self {
        Self {
            cookies,
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub async fn start(
        &self,
        principal: &Principal,
        organization_id: Uuid,
        organizations: &dyn OrganizationStore,
    ) -> Result<ImpersonationGrant, GateError> {
        if !principal.is_super_admin() {
            tracing::warn!(
                "Impersonation refused for principal {} with role {}",
                principal.id,
                principal.role
            );
            return Err(GateError::Forbidden("impersonation requires super_admin".to_string()));
        }

        let organization = organizations
            .find_organization(organization_id)
            .await
            .map_err(|e| GateError::UpstreamUnavailable(e.to_string()))?;

        if organization.is_none() {
            return Err(GateError::NotFound(format!("organization {}", organization_id)));
        }

        tracing::info!("Principal {} impersonating organization {}", principal.id, organization_id);

        Ok(ImpersonationGrant {
            organization_id,
            expires_at: Utc::now() + self.ttl,
            set_cookie: self.cookies.build(
                IMPERSONATION_COOKIE,
                &organization_id.to_string(),
                self.ttl.num_seconds(),
                false,
            ),
        })
    }

    /// Idempotent: clearing an absent overlay yields the same cookie
    pub fn stop(&self) -> String {
        self.cookies.clear(IMPERSONATION_COOKIE, false)
    }
}

/// Organization id carried by the overlay cookie, if well formed
pub fn overlay_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    read_cookie(headers, IMPERSONATION_COOKIE).and_then(|value| Uuid::parse_str(value).ok())
}

/// Resolve the Effective Context. The overlay only counts for super admins;
/// everyone else is pinned to their own organization.
pub fn effective_context(principal: &Principal, overlay: Option<Uuid>) -> EffectiveContext {
    match overlay {
        Some(organization_id) if principal.is_super_admin() => EffectiveContext {
            organization_id: Some(organization_id),
            impersonating: principal.organization_id != Some(organization_id),
        },
        Some(organization_id) => {
            tracing::warn!(
                "Ignoring impersonation of {} by non-admin principal {}",
                organization_id,
                principal.id
            );
            own_context(principal)
        }
        None => own_context(principal),
    }
}

fn own_context(principal: &Principal) -> EffectiveContext {
    EffectiveContext {
        organization_id: principal.organization_id,
        impersonating: false,
    }
}
