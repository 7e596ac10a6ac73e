use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use super::GateError;
use crate::database::{Profile, Role};
use crate::error::ApiError;

/// The authenticated caller, immutable for the lifetime of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub organization_id: Option<Uuid>,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

impl From<Profile> for Principal {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            organization_id: profile.organization_id,
        }
    }
}

/// Organization actually used to scope data access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveContext {
    pub organization_id: Option<Uuid>,
    pub impersonating: bool,
}

/// What the gate hands to downstream handlers through request extensions
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    pub principal: Principal,
    pub effective: EffectiveContext,
}

impl RequestContext {
    pub fn organization_id(&self) -> Option<Uuid> {
        self.effective.organization_id
    }

    /// Organization to scope queries to; data routes cannot run without one
    pub fn require_organization(&self) -> Result<Uuid, GateError> {
        self.effective
            .organization_id
            .ok_or_else(|| GateError::Forbidden("no organization context for this account".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| GateError::Unauthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_organization_is_forbidden() {
        let ctx = RequestContext {
            principal: Principal {
                id: Uuid::new_v4(),
                role: Role::SuperAdmin,
                organization_id: None,
            },
            effective: EffectiveContext {
                organization_id: None,
                impersonating: false,
            },
        };

        assert!(matches!(ctx.require_organization(), Err(GateError::Forbidden(_))));
    }
}
