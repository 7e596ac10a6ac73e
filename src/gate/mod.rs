//! Tenant-scoped access gate.
//!
//! One decision per request at the HTTP boundary: who the caller is, which
//! organization their queries are scoped to, and whether the requested page
//! needs a sign-in or a live subscription first. Handlers downstream trust
//! the resulting [`RequestContext`] instead of re-fetching profile and
//! organization rows themselves.

pub mod context;
pub mod decision;
pub mod impersonation;
pub mod policy;

pub use context::{EffectiveContext, Principal, RequestContext};
pub use decision::{decide, AccessDecision, BillingReason};
pub use impersonation::{ImpersonationGrant, ImpersonationOverlay};
pub use policy::{canonical_path, GatePolicy, RouteClass};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    /// No session, an invalid one, or a session without a profile
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}
