//! Payment-promise reminders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    pub id: i64,
    pub customer_id: i64,
    pub invoice_id: Option<i64>,
    pub reminder_date: NaiveDate,
    pub amount_promised: Decimal,
    pub notes: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reminder list row with customer contact and invoice number joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReminderWithContext {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub mobile: Option<String>,
    pub invoice_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub reminder_date: NaiveDate,
    pub amount_promised: Decimal,
    pub notes: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminder {
    pub customer_id: i64,
    pub invoice_id: Option<i64>,
    pub reminder_date: NaiveDate,
    pub amount_promised: Decimal,
    pub notes: Option<String>,
}
