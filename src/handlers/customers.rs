//! Customer directory handlers.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    Customer, CustomerPayload, CustomerWithStats, Invoice, RepaymentOutcome, RepaymentPayload,
};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    /// `gst` or `regular`; anything else returns all customers.
    pub filter: Option<String>,
}

/// List customers with pending totals and invoice counts.
///
/// GET /api/customers?filter=gst|regular
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<CustomerWithStats>>, AppError> {
    let customers = state.db.list_customers(query.filter.as_deref()).await?;
    Ok(Json(customers))
}

/// GET /api/customers/:id
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CustomerWithStats>, AppError> {
    let customer = state
        .db
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))?;
    Ok(Json(customer))
}

/// POST /api/customers
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate()?;
    let customer = state.db.create_customer(&payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /api/customers/:id
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;
    let customer = state.db.update_customer(id, &payload).await?;
    Ok(Json(customer))
}

/// Delete a customer. Returns 409 while the customer still has invoices.
///
/// DELETE /api/customers/:id
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.db.delete_customer(id).await?;
    Ok(Json(json!({ "message": "Customer deleted" })))
}

/// All invoices for one customer, newest first.
///
/// GET /api/customers/:id/transactions
pub async fn customer_transactions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    state
        .db
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer {} not found", id)))?;
    let invoices = state.db.customer_transactions(id).await?;
    Ok(Json(invoices))
}

/// Record a direct ledger repayment without creating an invoice.
///
/// POST /api/customers/:id/repayment
pub async fn record_repayment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RepaymentPayload>,
) -> Result<Json<RepaymentOutcome>, AppError> {
    let outcome = state.db.record_repayment(id, &payload).await?;
    Ok(Json(outcome))
}
