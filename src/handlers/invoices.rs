//! Invoice handlers.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    CreatedInvoice, InvoiceDetail, InvoiceItem, InvoicePayload, InvoiceWithCustomer, UpdatedInvoice,
};
use crate::startup::AppState;

/// Invoice detail response: header with joined customer fields plus all
/// line items.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: InvoiceDetail,
    pub items: Vec<InvoiceItem>,
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceWithCustomer>>, AppError> {
    Ok(Json(state.db.list_invoices().await?))
}

/// GET /api/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let (invoice, items) = state
        .db
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;
    Ok(Json(InvoiceResponse { invoice, items }))
}

/// Create an invoice, allocating its number and posting it against the
/// customer ledger in one transaction.
///
/// POST /api/invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<InvoicePayload>,
) -> Result<(StatusCode, Json<CreatedInvoice>), AppError> {
    payload.validate()?;
    if payload.total_amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "total_amount must not be negative"
        )));
    }
    let created = state.db.create_invoice(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Full-replace edit. The invoice number never changes.
///
/// PUT /api/invoices/:id
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<InvoicePayload>,
) -> Result<Json<UpdatedInvoice>, AppError> {
    payload.validate()?;
    if payload.total_amount < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "total_amount must not be negative"
        )));
    }
    let updated = state.db.update_invoice(id, &payload).await?;
    Ok(Json(updated))
}

/// Delete an invoice and reverse its ledger effect.
///
/// DELETE /api/invoices/:id
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let new_balance = state.db.delete_invoice(id).await?;
    Ok(Json(json!({
        "message": "Invoice deleted",
        "new_ledger_balance": new_balance,
    })))
}
