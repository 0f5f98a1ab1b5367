//! Ledger balance engine.
//!
//! Pure posting arithmetic for the customer ledger. The database layer
//! executes these computations inside the same transaction as the invoice
//! and line-item writes, so a failure anywhere rolls all three back.
//!
//! An invoice edit is never an in-place mutation of the ledger: it is a
//! reversal of the original posting followed by a fresh posting
//! (Posted -> Reversed -> Posted-with-new-values), which keeps the
//! non-commutative arithmetic explicit and testable on its own. A
//! reversal always works from the invoice's *stored* ledger snapshots
//! (`previous_balance`, `current_outstanding`), never from recomputed
//! state; that makes it correct when other invoices were posted in
//! between, but still assumes a single writer per customer.

use rust_decimal::Decimal;

use crate::models::{InvoiceType, PaymentStatus};
use crate::utils::money::round_currency;

/// Inputs to a posting computation.
#[derive(Debug, Clone)]
pub struct PostingInput {
    pub invoice_type: InvoiceType,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    /// Customer ledger balance immediately before this invoice is applied.
    pub previous_balance: Decimal,
    /// Explicit status override; always wins over the recomputed status.
    pub status_override: Option<PaymentStatus>,
}

/// Result of posting one invoice against a ledger snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub balance_amount: Decimal,
    pub payment_status: PaymentStatus,
    /// Ledger balance immediately after this invoice. For GST invoices this
    /// is informational only and equals `balance_amount`.
    pub current_outstanding: Decimal,
    /// New value for `customers.ledger_balance`, or `None` when the invoice
    /// type does not touch the ledger (GST).
    pub new_ledger_balance: Option<Decimal>,
}

/// Classify payment status from paid vs total.
pub fn classify_payment(total_amount: Decimal, paid_amount: Decimal) -> PaymentStatus {
    if paid_amount >= total_amount {
        PaymentStatus::Paid
    } else if paid_amount > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Apply one invoice to a ledger snapshot.
pub fn post_invoice(input: &PostingInput) -> Posting {
    let previous = round_currency(input.previous_balance);

    match input.invoice_type {
        InvoiceType::NonGst => {
            let balance_amount = round_currency(input.total_amount - input.paid_amount);
            let current_outstanding = round_currency(previous + balance_amount);
            Posting {
                balance_amount,
                payment_status: input
                    .status_override
                    .unwrap_or_else(|| classify_payment(input.total_amount, input.paid_amount)),
                current_outstanding,
                new_ledger_balance: Some(current_outstanding),
            }
        }
        InvoiceType::Gst => {
            // GST customers settle in full at invoice time; the ledger is
            // never touched and current_outstanding is informational.
            let balance_amount = round_currency(input.total_amount - input.paid_amount);
            Posting {
                balance_amount,
                payment_status: input
                    .status_override
                    .unwrap_or_else(|| classify_payment(input.total_amount, input.paid_amount)),
                current_outstanding: balance_amount,
                new_ledger_balance: None,
            }
        }
        InvoiceType::Repayment => {
            // A repayment is a zero-balance invoice with
            // total_amount = paid_amount = amount; it reduces the ledger.
            let current_outstanding = round_currency(previous - input.total_amount);
            Posting {
                balance_amount: Decimal::ZERO,
                payment_status: input
                    .status_override
                    .unwrap_or_else(|| classify_payment(input.total_amount, input.paid_amount)),
                current_outstanding,
                new_ledger_balance: Some(current_outstanding),
            }
        }
    }
}

/// Net effect a stored invoice had on the ledger when it was applied:
/// `current_outstanding - previous_balance`. For rows written before the
/// snapshots existed (both zero), fall back to the signed delta implied by
/// the type: `balance_amount` for sales, `-total_amount` for repayments.
/// GST invoices never posted, so their effect is zero.
pub fn ledger_effect(
    invoice_type: InvoiceType,
    previous_balance: Decimal,
    current_outstanding: Decimal,
    balance_amount: Decimal,
    total_amount: Decimal,
) -> Decimal {
    match invoice_type {
        InvoiceType::Gst => Decimal::ZERO,
        InvoiceType::NonGst => {
            if previous_balance == Decimal::ZERO && current_outstanding == Decimal::ZERO {
                balance_amount
            } else {
                round_currency(current_outstanding - previous_balance)
            }
        }
        InvoiceType::Repayment => {
            if previous_balance == Decimal::ZERO && current_outstanding == Decimal::ZERO {
                -total_amount
            } else {
                round_currency(current_outstanding - previous_balance)
            }
        }
    }
}

/// Remove an existing invoice's effect from the current ledger balance.
/// Used as the `previous_balance` for a re-posting on the update path, and
/// as the final ledger value on the delete path. Replaying create-then-
/// delete of an invoice returns the customer to the pre-invoice balance
/// exactly.
pub fn reversed_ledger_balance(
    invoice_type: InvoiceType,
    current_ledger_balance: Decimal,
    previous_balance: Decimal,
    current_outstanding: Decimal,
    balance_amount: Decimal,
    total_amount: Decimal,
) -> Decimal {
    let effect = ledger_effect(
        invoice_type,
        previous_balance,
        current_outstanding,
        balance_amount,
        total_amount,
    );
    round_currency(current_ledger_balance - effect)
}
