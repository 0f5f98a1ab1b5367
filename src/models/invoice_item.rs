//! Invoice line items.
//!
//! A line item is an immutable snapshot of item attributes at invoice time.
//! Editing the catalog `Item` afterwards never changes past invoices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::money::round_currency;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    /// Null for repayment "items", which reference no catalog entry.
    pub item_id: Option<i64>,
    pub item_name: String,
    pub stamp: Option<String>,
    pub remarks: String,
    pub hsn: Option<String>,
    pub unit: String,
    pub pc: i32,
    pub gross_weight: Decimal,
    pub less: Decimal,
    pub net_weight: Decimal,
    pub add_weight: Decimal,
    pub making_charges: Decimal,
    pub rate: Decimal,
    pub labour: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Line item as submitted on invoice create/update. `net_weight` and
/// `total` are derived server-side when the caller omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceItem {
    pub item_id: Option<i64>,
    pub item_name: String,
    pub stamp: Option<String>,
    #[serde(default)]
    pub remarks: String,
    pub hsn: Option<String>,
    pub unit: Option<String>,
    pub pc: Option<i32>,
    pub gross_weight: Option<Decimal>,
    pub less: Option<Decimal>,
    pub net_weight: Option<Decimal>,
    pub add_weight: Option<Decimal>,
    pub making_charges: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub labour: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub total: Option<Decimal>,
}

impl CreateInvoiceItem {
    /// Net weight: gross + polish weight + making charges applied as a
    /// percentage of gross.
    pub fn effective_net_weight(&self) -> Decimal {
        if let Some(net) = self.net_weight {
            return net;
        }
        let gross = self.gross_weight.unwrap_or_default();
        let add = self.add_weight.unwrap_or_default();
        let making = self.making_charges.unwrap_or_default();
        gross + add + gross * making / Decimal::from(100)
    }

    /// Line total: (net weight x rate + labour) x pieces - discount.
    pub fn effective_total(&self) -> Decimal {
        if let Some(total) = self.total {
            return round_currency(total);
        }
        let net = self.effective_net_weight();
        let rate = self.rate.unwrap_or_default();
        let labour = self.labour.unwrap_or_default();
        let pc = Decimal::from(self.pc.unwrap_or(1));
        let discount = self.discount.unwrap_or_default();
        round_currency((net * rate + labour) * pc - discount)
    }
}
