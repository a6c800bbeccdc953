//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the ledger enforces consistent invariants.

use crate::{Currency, LedgerError, Money, ResultLedger};

/// Upper bound (exclusive) for a single booked amount: 100.000.000 major units.
pub(crate) const MAX_AMOUNT_MINOR: i64 = 100_000_000 * 100;

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultLedger<Currency> {
    Currency::try_from(value)
        .map_err(|_| LedgerError::InvalidData(format!("invalid currency: {value}")))
}

/// Ensure an amount is strictly positive and below the booking cap.
pub(crate) fn ensure_bookable(amount: Money, label: &str) -> ResultLedger<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount(format!("{label} must be > 0")));
    }
    if amount.minor() >= MAX_AMOUNT_MINOR {
        return Err(LedgerError::InvalidAmount(format!("{label} too large")));
    }
    Ok(())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidData(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed)
}
