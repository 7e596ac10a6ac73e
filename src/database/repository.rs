use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Organization, Profile, SetLog};

/// Looks up the role and organization membership of a principal
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, principal_id: Uuid) -> Result<Option<Profile>, DatabaseError>;
}

/// Looks up the subscription state of an organization
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, DatabaseError>;
}

/// Exercise set logging, always scoped to one organization
#[async_trait]
pub trait SetLogStore: Send + Sync {
    /// Insert-or-update keyed by (workout_session_id, exercise_id, set_number).
    ///
    /// Returns `None` when the key already belongs to another organization;
    /// that row is left untouched.
    async fn upsert_set(&self, set: &SetLog) -> Result<Option<SetLog>, DatabaseError>;

    async fn sets_for_session(
        &self,
        organization_id: Uuid,
        workout_session_id: Uuid,
    ) -> Result<Vec<SetLog>, DatabaseError>;

    /// Sets performed in `[from, to)`, optionally narrowed to one client
    async fn sets_between(
        &self,
        organization_id: Uuid,
        client_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SetLog>, DatabaseError>;
}

/// Postgres-backed implementation of every store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SET_LOG_COLUMNS: &str = r#"
    organization_id, workout_session_id, exercise_id, client_id,
    set_number, reps, weight_kg, performed_at
"#;

fn parse_column<T: std::str::FromStr>(row: &PgRow, column: &'static str) -> Result<T, DatabaseError> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| DatabaseError::InvalidValue { column, value: raw })
}

fn set_log_from_row(row: &PgRow) -> Result<SetLog, DatabaseError> {
    Ok(SetLog {
        organization_id: row.try_get("organization_id")?,
        workout_session_id: row.try_get("workout_session_id")?,
        exercise_id: row.try_get("exercise_id")?,
        client_id: row.try_get("client_id")?,
        set_number: row.try_get("set_number")?,
        reps: row.try_get("reps")?,
        weight_kg: row.try_get("weight_kg")?,
        performed_at: row.try_get("performed_at")?,
    })
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile(&self, principal_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let row = sqlx::query("SELECT id, role, organization_id FROM profiles WHERE id = $1")
            .bind(principal_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<Profile, DatabaseError> {
            Ok(Profile {
                id: row.try_get("id")?,
                role: parse_column(&row, "role")?,
                organization_id: row.try_get("organization_id")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, subscription_status, trial_ends_at FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Organization, DatabaseError> {
            Ok(Organization {
                id: row.try_get("id")?,
                subscription_status: parse_column(&row, "subscription_status")?,
                trial_ends_at: row.try_get("trial_ends_at")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl SetLogStore for PgStore {
    async fn upsert_set(&self, set: &SetLog) -> Result<Option<SetLog>, DatabaseError> {
        // The WHERE on the conflict arm keeps another tenant's row intact;
        // RETURNING then yields nothing.
        let query = format!(
            r#"
            INSERT INTO set_logs ({SET_LOG_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (workout_session_id, exercise_id, set_number) DO UPDATE SET
                client_id = EXCLUDED.client_id,
                reps = EXCLUDED.reps,
                weight_kg = EXCLUDED.weight_kg,
                performed_at = EXCLUDED.performed_at
            WHERE set_logs.organization_id = EXCLUDED.organization_id
            RETURNING {SET_LOG_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(set.organization_id)
            .bind(set.workout_session_id)
            .bind(set.exercise_id)
            .bind(set.client_id)
            .bind(set.set_number)
            .bind(set.reps)
            .bind(set.weight_kg)
            .bind(set.performed_at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(set_log_from_row).transpose()
    }

    async fn sets_for_session(
        &self,
        organization_id: Uuid,
        workout_session_id: Uuid,
    ) -> Result<Vec<SetLog>, DatabaseError> {
        let query = format!(
            "SELECT {SET_LOG_COLUMNS} FROM set_logs \
             WHERE organization_id = $1 AND workout_session_id = $2"
        );

        let rows = sqlx::query(&query)
            .bind(organization_id)
            .bind(workout_session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(set_log_from_row).collect()
    }

    async fn sets_between(
        &self,
        organization_id: Uuid,
        client_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SetLog>, DatabaseError> {
        let query = format!(
            "SELECT {SET_LOG_COLUMNS} FROM set_logs \
             WHERE organization_id = $1 \
             AND ($2::uuid IS NULL OR client_id = $2) \
             AND performed_at >= $3 AND performed_at < $4"
        );

        let rows = sqlx::query(&query)
            .bind(organization_id)
            .bind(client_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(set_log_from_row).collect()
    }
}
