//! Authentication and service status handlers.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::SanitizedUser;
use crate::services::get_metrics;
use crate::startup::AppState;
use crate::utils::password::verify_password;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with the bearer token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SanitizedUser,
}

/// Authenticate with username and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .db
        .get_user_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid credentials")))?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(username = %req.username, "Login failed");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid credentials"
        )));
    }

    let token = state.jwt.issue_token(&user)?;
    info!(username = %user.username, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        user: SanitizedUser::from(user),
    }))
}

/// Liveness and database health.
///
/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        ),
    }
}

/// Prometheus scrape endpoint.
///
/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
