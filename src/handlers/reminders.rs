//! Payment promise reminder handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::{CreateReminder, Reminder, ReminderWithContext};
use crate::startup::AppState;

/// All pending reminders, soonest promise date first.
///
/// GET /api/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReminderWithContext>>, AppError> {
    Ok(Json(state.db.list_pending_reminders().await?))
}

/// Pending reminders due today (IST).
///
/// GET /api/reminders/today
pub async fn today_reminders(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReminderWithContext>>, AppError> {
    Ok(Json(state.db.list_today_reminders().await?))
}

/// POST /api/reminders
pub async fn create_reminder(
    State(state): State<AppState>,
    Json(payload): Json<CreateReminder>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    if payload.amount_promised <= rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "amount_promised must be positive"
        )));
    }
    let reminder = state.db.create_reminder(&payload).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Mark a reminder completed. Completed reminders stay in the table but
/// drop out of the pending lists.
///
/// PUT /api/reminders/:id/complete
pub async fn complete_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.db.complete_reminder(id).await?;
    Ok(Json(json!({ "message": "Reminder completed" })))
}

/// DELETE /api/reminders/:id
pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.db.delete_reminder(id).await?;
    Ok(Json(json!({ "message": "Reminder deleted" })))
}
