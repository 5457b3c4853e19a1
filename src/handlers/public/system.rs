use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "PresuX API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Small-business management backend: clients, catalog, equipment, personnel",
        "endpoints": {
            "auth": "/auth/login, /auth/signup, /auth/logout, /auth/callback (public)",
            "resources": "/api/{clients,suppliers,services,job-positions,brands,categories,products,equipment,personnel}[/:id] (protected)",
            "assignments": "/api/personnel/:id/positions[/:assignment_id] (protected)",
            "profile": "/api/profile (protected)",
            "health": "/health, /api/health (public)",
        }
    }))
}

/// GET /health and /api/health - Store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok",
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable",
                })),
            )
        }
    }
}

/// Unknown routes answer in the error envelope
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
