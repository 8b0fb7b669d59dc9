//! Business rule validation for transaction drafts and mixed payments.
//!
//! This module contains pure validation functions invoked by the lifecycle
//! manager before any state is persisted.

use rust_decimal::Decimal;

use quadra_shared::types::money::approx_eq;

use super::error::LedgerError;
use super::types::{CreateTransactionInput, PaymentMethod, Transaction};

/// Tolerance for the mixed-payment split check (one cent).
#[must_use]
pub fn split_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Validates the PIX + cash split of a mixed payment.
///
/// The split must satisfy `pix + cash == amount + late_fee - discount`
/// within the split tolerance.
///
/// # Errors
///
/// Returns `LedgerError::InvalidSplit` when the split does not match.
pub fn validate_mixed_split(
    amount: Decimal,
    late_fee: Decimal,
    discount: Decimal,
    pix_amount: Decimal,
    cash_amount: Decimal,
) -> Result<(), LedgerError> {
    let expected = Transaction::compute_total(amount, late_fee, discount);
    let actual = pix_amount + cash_amount;

    if !approx_eq(actual, expected, split_tolerance()) {
        return Err(LedgerError::InvalidSplit { expected, actual });
    }
    Ok(())
}

/// Validates a transaction draft before creation.
///
/// Checks:
/// 1. Amount is strictly positive
/// 2. Late fee and discount are non-negative
/// 3. PIX payments carry a PIX key
/// 4. Mixed payments carry a valid split
///
/// # Errors
///
/// Returns `LedgerError::Validation` or `LedgerError::InvalidSplit`.
pub fn validate_draft(input: &CreateTransactionInput) -> Result<(), LedgerError> {
    if input.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    if input.late_fee < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "late fee cannot be negative".to_string(),
        ));
    }
    if input.discount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "discount cannot be negative".to_string(),
        ));
    }

    if input.payment_method == PaymentMethod::Pix
        && input.pix_key.as_deref().is_none_or(|k| k.trim().is_empty())
    {
        return Err(LedgerError::Validation(
            "PIX payments require a PIX key".to_string(),
        ));
    }

    if input.mixed_payment {
        validate_mixed_split(
            input.amount,
            input.late_fee,
            input.discount,
            input.pix_amount,
            input.cash_amount,
        )?;
    }

    Ok(())
}

/// Re-validates an already-patched transaction before an update commits.
///
/// # Errors
///
/// Returns `LedgerError::Validation` or `LedgerError::InvalidSplit`.
pub fn validate_updated(tx: &Transaction) -> Result<(), LedgerError> {
    if tx.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    if tx.late_fee < Decimal::ZERO || tx.discount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "late fee and discount cannot be negative".to_string(),
        ));
    }

    if tx.payment_method == PaymentMethod::Pix
        && tx.pix_key.as_deref().is_none_or(|k| k.trim().is_empty())
    {
        return Err(LedgerError::Validation(
            "PIX payments require a PIX key".to_string(),
        ));
    }

    if tx.mixed_payment {
        validate_mixed_split(
            tx.amount,
            tx.late_fee,
            tx.discount,
            tx.pix_amount,
            tx.cash_amount,
        )?;
    }

    Ok(())
}
