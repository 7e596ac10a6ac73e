use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Trainer,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Trainer => "trainer",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "trainer" => Ok(Role::Trainer),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    Expired,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            // billing providers disagree on the spelling
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row from `profiles`: one per principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    pub organization_id: Option<Uuid>,
}

/// Subscription state of a tenant, read-only from the gate's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub subscription_status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// A trial whose end date has passed. Any other status never expires here.
    pub fn trial_expired(&self, now: DateTime<Utc>) -> bool {
        self.subscription_status == SubscriptionStatus::Trialing
            && self.trial_ends_at.is_some_and(|ends| ends < now)
    }
}

/// One logged set. Natural key: (workout_session_id, exercise_id, set_number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    pub organization_id: Uuid,
    pub workout_session_id: Uuid,
    pub exercise_id: Uuid,
    pub client_id: Option<Uuid>,
    pub set_number: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub performed_at: DateTime<Utc>,
}

impl SetLog {
    pub fn tonnage(&self) -> f64 {
        f64::from(self.reps) * self.weight_kg
    }
}
