//! Dashboard handlers.

use axum::extract::{Json, State};

use crate::error::AppError;
use crate::models::DashboardStats;
use crate::startup::AppState;

/// Shop-wide aggregates for the dashboard.
///
/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.db.dashboard_stats().await?))
}
