//! Currency rounding.
//!
//! Every monetary value is rounded to two decimal places, half-up, before
//! it is persisted or compared. Amounts are `rust_decimal::Decimal`
//! throughout, so the binary floating-point drift the original float-based
//! bookkeeping had to compensate for cannot occur here; the rounding still
//! runs on every write path to keep stored values cents-exact regardless of
//! what arithmetic produced them.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half-up.
///
/// Midpoints round away from zero in both directions: `1.005` becomes
/// `1.01` and `-1.005` becomes `-1.01`.
///
/// Idempotent: `round_currency(round_currency(x)) == round_currency(x)`.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
