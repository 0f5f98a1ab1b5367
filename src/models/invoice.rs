//! Invoice header model and request payloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::invoice_item::CreateInvoiceItem;

/// Invoice type. GST invoices never post to the customer ledger; repayments
/// are zero-balance invoices that reduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Gst,
    NonGst,
    Repayment,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Gst => "gst",
            InvoiceType::NonGst => "non_gst",
            InvoiceType::Repayment => "repayment",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "gst" => InvoiceType::Gst,
            "repayment" => InvoiceType::Repayment,
            _ => InvoiceType::NonGst,
        }
    }
}

/// Payment status derived from paid vs total; `credit` is only ever set by
/// an explicit caller override (e.g. an overpayment kept on account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Credit,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Credit => "credit",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "partial" => PaymentStatus::Partial,
            "paid" => PaymentStatus::Paid,
            "credit" => PaymentStatus::Credit,
            _ => PaymentStatus::Pending,
        }
    }
}

/// Invoice row.
///
/// `previous_balance` and `current_outstanding` are ledger snapshots taken
/// when the invoice was applied; the update path relies on the stored
/// values rather than recomputing them from live state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub subtotal: Decimal,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub amount_paying: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_status: String,
    pub status: String,
    pub old_item_type: Option<String>,
    pub old_item_value: Decimal,
    pub previous_balance: Decimal,
    pub current_outstanding: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice list row with the customer name joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceWithCustomer {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// Single-invoice read: header plus the customer's contact fields as they
/// are *now* (for display and printing, not an invoice-time snapshot).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InvoiceDetail {
    pub id: i64,
    pub invoice_number: String,
    pub customer_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    pub subtotal: Decimal,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub amount_paying: Decimal,
    pub paid_amount: Decimal,
    pub balance_amount: Decimal,
    pub payment_status: String,
    pub status: String,
    pub old_item_type: Option<String>,
    pub old_item_value: Decimal,
    pub previous_balance: Decimal,
    pub current_outstanding: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub mobile: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// Payload for creating or fully replacing an invoice.
///
/// `previous_balance` is the customer ledger balance the caller saw before
/// submitting; when absent the balance is read inside the transaction.
/// `payment_status` and `new_ledger_balance`, when supplied, override the
/// recomputed values.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoicePayload {
    pub customer_id: i64,
    #[serde(rename = "type")]
    pub invoice_type: InvoiceType,
    #[validate(length(min = 1, message = "invoice must have at least one line item"))]
    pub items: Vec<CreateInvoiceItem>,
    pub subtotal: Decimal,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub gst_amount: Option<Decimal>,
    pub total_amount: Decimal,
    pub invoice_date: Option<NaiveDate>,
    pub old_item_type: Option<String>,
    pub old_item_value: Option<Decimal>,
    pub payment_method: Option<String>,
    pub amount_paying: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub previous_balance: Option<Decimal>,
    pub new_ledger_balance: Option<Decimal>,
}

/// Response body for invoice creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub payment_status: String,
    /// Customer ledger balance after the create. Zero for GST invoices,
    /// which do not post to the ledger.
    pub new_ledger_balance: Decimal,
}

/// Response body for invoice update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedInvoice {
    pub id: i64,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_ledger_balance: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_type_round_trips() {
        for t in [InvoiceType::Gst, InvoiceType::NonGst, InvoiceType::Repayment] {
            assert_eq!(InvoiceType::from_string(t.as_str()), t);
        }
    }

    #[test]
    fn unknown_type_defaults_to_non_gst() {
        assert_eq!(InvoiceType::from_string("bogus"), InvoiceType::NonGst);
    }

    #[test]
    fn payment_status_round_trips() {
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::Partial,
            PaymentStatus::Paid,
            PaymentStatus::Credit,
        ] {
            assert_eq!(PaymentStatus::from_string(s.as_str()), s);
        }
    }
}
