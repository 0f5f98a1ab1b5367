//! Dashboard aggregates.

use rust_decimal::Decimal;
use serde::Serialize;

/// Shop-wide figures for the dashboard. `total_customers` counts regular
/// (non-GST) customers only; `today_sales` is bounded by the IST calendar
/// day.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_invoices: i64,
    pub pending_amount: Decimal,
    pub today_sales: Decimal,
}
