//! Customer directory models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub mobile: Option<String>,
    pub alt_mobile: Option<String>,
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub image_url: Option<String>,
    /// Signed running balance, authoritative: positive = customer owes the
    /// shop, negative = shop owes the customer.
    pub ledger_balance: Decimal,
    pub is_gst: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer row with derived aggregates for list/detail views.
///
/// `total_pending` is the sum of `balance_amount` over all of this
/// customer's invoices. It deliberately diverges from `ledger_balance`:
/// GST invoice balances feed `total_pending` but never post to the ledger.
/// The two fields carry different semantics and are never conflated.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerWithStats {
    pub id: i64,
    pub name: String,
    pub mobile: Option<String>,
    pub alt_mobile: Option<String>,
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub image_url: Option<String>,
    pub ledger_balance: Decimal,
    pub is_gst: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_pending: Decimal,
    pub total_invoices: i64,
}

/// Payload for creating or updating a customer. The explicit
/// `ledger_balance` is an opening-balance edit; invoice mutations adjust
/// the balance separately.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub mobile: Option<String>,
    pub alt_mobile: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
    pub image_url: Option<String>,
    pub ledger_balance: Option<Decimal>,
    #[serde(default)]
    pub is_gst: bool,
}

/// Direct repayment against a customer's ledger, recorded without an
/// invoice row (distinct from creating a `repayment`-type invoice).
#[derive(Debug, Clone, Deserialize)]
pub struct RepaymentPayload {
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of a direct repayment.
#[derive(Debug, Clone, Serialize)]
pub struct RepaymentOutcome {
    pub previous_balance: Decimal,
    pub repayment_amount: Decimal,
    pub new_balance: Decimal,
    pub payment_method: String,
}
