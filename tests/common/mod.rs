#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use fitcoach_api::app::{impersonation_overlay, router, AppState};
use fitcoach_api::auth::JwtSessionProvider;
use fitcoach_api::config::AppConfig;
use fitcoach_api::database::{
    DatabaseError, Organization, OrganizationStore, Profile, ProfileStore, Role, SetLog, SetLogStore,
    SubscriptionStatus,
};
use fitcoach_api::gate::GatePolicy;

/// In-memory stand-in for the profiles, organizations and set_logs tables
#[derive(Default)]
pub struct MemoryDirectory {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    organizations: Mutex<HashMap<Uuid, Organization>>,
    sets: Mutex<Vec<SetLog>>,
}

impl MemoryDirectory {
    pub fn add_organization(&self, status: SubscriptionStatus, trial_ends_at: Option<DateTime<Utc>>) -> Uuid {
        let id = Uuid::new_v4();
        self.organizations.lock().unwrap().insert(
            id,
            Organization {
                id,
                subscription_status: status,
                trial_ends_at,
            },
        );
        id
    }

    pub fn add_profile(&self, role: Role, organization_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.profiles.lock().unwrap().insert(id, Profile { id, role, organization_id });
        id
    }

    pub fn set_count(&self) -> usize {
        self.sets.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileStore for MemoryDirectory {
    async fn find_profile(&self, principal_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.profiles.lock().unwrap().get(&principal_id).cloned())
    }
}

#[async_trait]
impl OrganizationStore for MemoryDirectory {
    async fn find_organization(&self, organization_id: Uuid) -> Result<Option<Organization>, DatabaseError> {
        Ok(self.organizations.lock().unwrap().get(&organization_id).cloned())
    }
}

#[async_trait]
impl SetLogStore for MemoryDirectory {
    async fn upsert_set(&self, set: &SetLog) -> Result<Option<SetLog>, DatabaseError> {
        let mut sets = self.sets.lock().unwrap();
        let existing = sets.iter_mut().find(|row| {
            row.workout_session_id == set.workout_session_id
                && row.exercise_id == set.exercise_id
                && row.set_number == set.set_number
        });

        match existing {
            Some(row) if row.organization_id != set.organization_id => Ok(None),
            Some(row) => {
                *row = set.clone();
                Ok(Some(row.clone()))
            }
            None => {
                sets.push(set.clone());
                Ok(Some(set.clone()))
            }
        }
    }

    async fn sets_for_session(
        &self,
        organization_id: Uuid,
        workout_session_id: Uuid,
    ) -> Result<Vec<SetLog>, DatabaseError> {
        Ok(self
            .sets
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.organization_id == organization_id && row.workout_session_id == workout_session_id)
            .cloned()
            .collect())
    }

    async fn sets_between(
        &self,
        organization_id: Uuid,
        client_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SetLog>, DatabaseError> {
        Ok(self
            .sets
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.organization_id == organization_id)
            .filter(|row| client_id.is_none() || row.client_id == client_id)
            .filter(|row| row.performed_at >= from && row.performed_at < to)
            .cloned()
            .collect())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub directory: Arc<MemoryDirectory>,
    sessions: Arc<JwtSessionProvider>,
}

impl TestServer {
    /// `Cookie` header value carrying a fresh access token for `principal_id`
    pub fn session_cookie(&self, principal_id: Uuid) -> Result<String> {
        let issued = self.sessions.issue(principal_id)?;
        Ok(format!("fc_session={}", issued.access_token))
    }

    /// `Cookie` header value carrying only a refresh token
    pub fn refresh_only_cookie(&self, principal_id: Uuid) -> Result<String> {
        let issued = self.sessions.issue(principal_id)?;
        Ok(format!("fc_session=expired; fc_refresh={}", issued.refresh_token))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start the full router with in-memory stores on a free port
pub async fn spawn_server() -> Result<TestServer> {
    let config = AppConfig::development();
    let directory = Arc::new(MemoryDirectory::default());
    let sessions = Arc::new(JwtSessionProvider::new(&config.security)?);

    let state = AppState {
        sessions: sessions.clone(),
        profiles: directory.clone(),
        organizations: directory.clone(),
        set_logs: directory.clone(),
        policy: Arc::new(GatePolicy::from_config(&config.gate)),
        impersonation: impersonation_overlay(&config),
        pool: None,
    };
    let app = router(state, &config);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        directory,
        sessions,
    })
}

/// Client that reports redirects instead of following them
pub fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

pub fn location(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
