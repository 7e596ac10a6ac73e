use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, CookieSettings, JwtSessionProvider, SessionProvider};
use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager, OrganizationStore, PgStore, ProfileStore, SetLogStore};
use crate::gate::{GatePolicy, ImpersonationOverlay};
use crate::handlers;
use crate::middleware::access_gate;

/// Everything a request needs, shared across the process
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub set_logs: Arc<dyn SetLogStore>,
    pub policy: Arc<GatePolicy>,
    pub impersonation: ImpersonationOverlay,
    /// Pool used by `/health`; `None` when no database is configured
    pub pool: Option<PgPool>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AppState {
    /// Wire the Postgres stores and JWT sessions from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let pool = DatabaseManager::connect_lazy(&config.database)?;
        let store = Arc::new(PgStore::new(pool.clone()));
        let sessions = Arc::new(JwtSessionProvider::new(&config.security)?);

        Ok(Self {
            sessions,
            profiles: store.clone(),
            organizations: store.clone(),
            set_logs: store,
            policy: Arc::new(GatePolicy::from_config(&config.gate)),
            impersonation: impersonation_overlay(config),
            pool: Some(pool),
        })
    }
}

pub fn impersonation_overlay(config: &AppConfig) -> ImpersonationOverlay {
    ImpersonationOverlay::new(
        CookieSettings {
            secure: config.security.require_https,
        },
        config.security.impersonation_ttl_hours,
    )
}

/// Full application router with the access gate in front of every route
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .merge(api_routes())
        // Server-rendered pages live elsewhere; anything else gets the page shell
        .fallback(handlers::pages::page_shell)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state);

    if config.security.enable_cors {
        app = app.layer(cors_layer(config));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn api_routes() -> Router<AppState> {
    use handlers::{admin, auth, organization, reports, workouts};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/session", axum::routing::delete(auth::sign_out))
        .route(
            "/api/admin/impersonate",
            post(admin::impersonate_start).delete(admin::impersonate_stop),
        )
        .route("/api/organization", get(organization::current))
        .route(
            "/api/workouts/:session_id/sets",
            put(workouts::put_set).get(workouts::list_sets),
        )
        .route("/api/reports/tonnage", get(reports::tonnage))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}
