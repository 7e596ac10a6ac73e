use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "fitcoach-api",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "auth": "/api/auth/whoami, /api/auth/session (session required)",
                "admin": "/api/admin/impersonate (super_admin)",
                "organization": "/api/organization (session required)",
                "workouts": "/api/workouts/:session_id/sets (session required)",
                "reports": "/api/reports/tonnage (session required)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let database = match &state.pool {
        Some(pool) => DatabaseManager::health_check(pool).await.map_err(|e| e.to_string()),
        None => Err("not configured".to_string()),
    };

    match database {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e
                }
            })),
        ),
    }
}
