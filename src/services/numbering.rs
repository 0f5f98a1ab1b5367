//! Sequential invoice numbers.
//!
//! Three numbering schemes, one per invoice type:
//!
//! - non-GST sales:  `INV-<n>`, n in 1000..=99999
//! - repayments:     `REP-<n>`, n in 1000..=99999
//! - GST sales:      `HJ/<YY-YY>-<n>`, n in 1000..=9999, scoped per Indian
//!   financial year (April 1 boundary), so the counter restarts each FY
//!
//! Counters live in the `invoice_sequences` table and are allocated with a
//! single atomic upsert *inside* the invoice-create transaction, so two
//! concurrent creates of the same type cannot obtain the same number. The
//! UNIQUE constraint on `invoice_number` remains as a backstop. When a
//! counter passes its upper bound it wraps back to 1000.

use chrono::{Datelike, NaiveDate};
use sqlx::{Postgres, Transaction};

use crate::error::AppError;
use crate::models::InvoiceType;

const SEQUENCE_START: i64 = 1000;
const GST_SEQUENCE_MAX: i64 = 9999;
const SEQUENCE_MAX: i64 = 99999;

/// Indian financial year string (`"24-25"`) for a date. Years run April 1
/// to March 31; January-March belong to the year that started the previous
/// April.
pub fn financial_year(date: NaiveDate) -> String {
    let year = date.year();
    let (start, end) = if date.month() >= 4 {
        (year, year + 1)
    } else {
        (year - 1, year)
    };
    format!("{:02}-{:02}", start % 100, end % 100)
}

/// Format an invoice number for a scheme and sequence value.
pub fn format_invoice_number(invoice_type: InvoiceType, fy: &str, value: i64) -> String {
    match invoice_type {
        InvoiceType::NonGst => format!("INV-{}", value),
        InvoiceType::Repayment => format!("REP-{}", value),
        InvoiceType::Gst => format!("HJ/{}-{}", fy, value),
    }
}

fn numbering_scope(invoice_type: InvoiceType, today: NaiveDate) -> (&'static str, String, i64) {
    match invoice_type {
        InvoiceType::NonGst => ("INV", String::new(), SEQUENCE_MAX),
        InvoiceType::Repayment => ("REP", String::new(), SEQUENCE_MAX),
        InvoiceType::Gst => ("HJ", financial_year(today), GST_SEQUENCE_MAX),
    }
}

/// Allocate the next invoice number for a type, as of `today`.
///
/// Runs on the caller's transaction; the allocation is only visible to
/// other sessions once the invoice itself commits.
pub async fn allocate_invoice_number(
    tx: &mut Transaction<'_, Postgres>,
    invoice_type: InvoiceType,
    today: NaiveDate,
) -> Result<String, AppError> {
    let (scheme, period, max) = numbering_scope(invoice_type, today);

    let allocated: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (scheme, period, next_value)
        VALUES ($1, $2, $3 + 1)
        ON CONFLICT (scheme, period) DO UPDATE
        SET next_value = (
            CASE
                WHEN invoice_sequences.next_value > $4 THEN $3
                ELSE invoice_sequences.next_value
            END
        ) + 1
        RETURNING next_value - 1
        "#,
    )
    .bind(scheme)
    .bind(&period)
    .bind(SEQUENCE_START)
    .bind(max)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Failed to allocate invoice number: {}", e))
    })?;

    Ok(format_invoice_number(invoice_type, &period, allocated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn financial_year_boundary_is_april_first() {
        assert_eq!(financial_year(date(2024, 3, 15)), "23-24");
        assert_eq!(financial_year(date(2024, 3, 31)), "23-24");
        assert_eq!(financial_year(date(2024, 4, 1)), "24-25");
        assert_eq!(financial_year(date(2024, 4, 15)), "24-25");
        assert_eq!(financial_year(date(2024, 12, 31)), "24-25");
        assert_eq!(financial_year(date(2025, 1, 1)), "24-25");
    }

    #[test]
    fn financial_year_pads_to_two_digits() {
        assert_eq!(financial_year(date(2009, 5, 1)), "09-10");
        assert_eq!(financial_year(date(2100, 2, 1)), "99-00");
    }

    #[test]
    fn formats_per_scheme() {
        assert_eq!(
            format_invoice_number(InvoiceType::NonGst, "", 1000),
            "INV-1000"
        );
        assert_eq!(
            format_invoice_number(InvoiceType::Repayment, "", 1042),
            "REP-1042"
        );
        assert_eq!(
            format_invoice_number(InvoiceType::Gst, "24-25", 1001),
            "HJ/24-25-1001"
        );
    }

    #[test]
    fn scopes_carry_bounds() {
        let (scheme, period, max) = numbering_scope(InvoiceType::Gst, date(2024, 4, 15));
        assert_eq!((scheme, period.as_str(), max), ("HJ", "24-25", 9999));

        let (scheme, period, max) = numbering_scope(InvoiceType::NonGst, date(2024, 4, 15));
        assert_eq!((scheme, period.as_str(), max), ("INV", "", 99999));

        let (scheme, period, max) = numbering_scope(InvoiceType::Repayment, date(2024, 4, 15));
        assert_eq!((scheme, period.as_str(), max), ("REP", "", 99999));
    }
}
