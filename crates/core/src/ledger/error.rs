//! Ledger error types for validation, state and permission errors.
//!
//! One taxonomy covers the whole ledger surface: the transport layer maps
//! these to protocol responses via `error_code` / `http_status_code` and
//! never sees anything protocol-specific from here.

use rust_decimal::Decimal;
use thiserror::Error;

use quadra_shared::types::{PropertyId, TransactionId, UnitId};

use super::types::TransactionStatus;
use crate::workflow::types::{LedgerAction, Role};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mixed-payment split does not match the transaction total.
    #[error("Mixed payment split does not match total. Expected: {expected}, got: {actual}")]
    InvalidSplit {
        /// The expected total (`amount + late_fee - discount`).
        expected: Decimal,
        /// The actual split sum (`pix_amount + cash_amount`).
        actual: Decimal,
    },

    // ========== State Errors ==========
    /// Illegal transition from the current status.
    #[error("Cannot {action} a {status} transaction")]
    InvalidState {
        /// The status observed when the transition was attempted.
        status: TransactionStatus,
        /// The attempted action.
        action: LedgerAction,
    },

    /// The transaction was already approved or confirmed.
    #[error("Transaction {0} was already processed")]
    AlreadyProcessed(TransactionId),

    /// The record changed since it was read; the edit was not applied.
    #[error("Transaction {0} was modified concurrently")]
    ConcurrentModification(TransactionId),

    // ========== Permission Errors ==========
    /// The actor's role does not permit the action (domain rule,
    /// distinct from transport-level authorization).
    #[error("Role {role} may not {action} transactions")]
    Forbidden {
        /// The actor's role.
        role: Role,
        /// The attempted action.
        action: LedgerAction,
    },

    /// The actor has no access to the property.
    #[error("No access to property {0}")]
    PropertyAccessDenied(PropertyId),

    // ========== Not Found ==========
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Conflict ==========
    /// The unit already has a transaction for the billing period.
    #[error("Unit {unit_id} already billed for {month:02}/{year}")]
    AlreadyBilled {
        /// The unit that was already billed.
        unit_id: UnitId,
        /// Billing month (1-12).
        month: u32,
        /// Billing year.
        year: i32,
    },

    // ========== Store Errors ==========
    /// Persistence-layer fault.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidSplit { .. } => "INVALID_SPLIT",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::PropertyAccessDenied(_) => "PROPERTY_ACCESS_DENIED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::AlreadyBilled { .. } => "ALREADY_BILLED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::InvalidSplit { .. } => 400,

            // 403 Forbidden - domain permission errors
            Self::Forbidden { .. } | Self::PropertyAccessDenied(_) => 403,

            // 404 Not Found
            Self::TransactionNotFound(_) => 404,

            // 409 Conflict - duplicate period billing, already processed,
            // lost optimistic-concurrency race
            Self::AlreadyProcessed(_)
            | Self::AlreadyBilled { .. }
            | Self::ConcurrentModification(_) => 409,

            // 422 Unprocessable - illegal state transitions
            Self::InvalidState { .. } => 422,

            // 500 Internal Server Error
            Self::Store(_) => 500,
        }
    }
}
