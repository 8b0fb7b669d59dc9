//! Financial ledger domain logic.
//!
//! This module implements the money-affecting core:
//! - Transaction records and classification enums
//! - Error types for ledger operations
//! - Draft validation and the mixed-payment split check
//! - The audit trail codec embedded in the notes field
//! - Tag-based classification for reporting
//! - Property balance calculation

pub mod audit;
pub mod balance;
pub mod error;
pub mod tag;
pub mod types;
pub mod validation;

#[cfg(test)]
mod audit_props;
#[cfg(test)]
mod validation_props;

pub use audit::{AuditAction, AuditTrail, HistoryLine};
pub use balance::PropertyBalance;
pub use error::LedgerError;
pub use tag::{Tag, TagStatistics};
pub use types::{
    Category, CreateTransactionInput, Direction, PaymentMethod, Transaction, TransactionPatch,
    TransactionStatus,
};
