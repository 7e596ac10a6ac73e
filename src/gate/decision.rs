use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::Principal;
use super::policy::GatePolicy;
use crate::database::Organization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingReason {
    Expired,
}

impl BillingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingReason::Expired => "expired",
        }
    }
}

/// Per-request outcome of the gate. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectToDashboard,
    RedirectToBilling(BillingReason),
}

impl AccessDecision {
    /// Redirect target, `None` for `Allow`
    pub fn location(&self, policy: &GatePolicy) -> Option<String> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToLogin => Some(policy.login_path().to_string()),
            AccessDecision::RedirectToDashboard => Some(policy.dashboard_path().to_string()),
            AccessDecision::RedirectToBilling(reason) => {
                Some(format!("{}?{}=true", policy.billing_path(), reason.as_str()))
            }
        }
    }
}

/// Decide what happens to a request for `path`.
///
/// `principal` is `None` for anonymous callers (including sessions whose
/// profile could not be loaded). `organization` is the Effective Context's
/// organization when it was loaded; its absence never blocks a request.
/// The sign-in check always runs before the billing check.
pub fn decide(
    policy: &GatePolicy,
    path: &str,
    principal: Option<&Principal>,
    organization: Option<&Organization>,
    now: DateTime<Utc>,
) -> AccessDecision {
    let class = policy.classify(path);

    if principal.is_none() {
        return if class.protected {
            AccessDecision::RedirectToLogin
        } else {
            AccessDecision::Allow
        };
    }

    if policy.is_login(path) {
        return AccessDecision::RedirectToDashboard;
    }

    if class.billable && organization.is_some_and(|org| org.trial_expired(now)) {
        return AccessDecision::RedirectToBilling(BillingReason::Expired);
    }

    AccessDecision::Allow
}
