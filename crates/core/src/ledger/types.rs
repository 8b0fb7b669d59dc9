//! Ledger domain types for property financial transactions.
//!
//! This module defines the transaction record, its classification enums,
//! and the input/patch types used by the lifecycle manager.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use quadra_shared::types::{PropertyId, TenantId, TransactionId, UnitId, UserId};

/// Direction of a money movement relative to the property ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money coming into the property (rent, fees received).
    Income,
    /// Money leaving the property (maintenance, taxes paid).
    Expense,
}

impl Direction {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the sign applied to this direction in balance math.
    #[must_use]
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Income => Decimal::ONE,
            Self::Expense => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Transaction category used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Monthly rent.
    Rent,
    /// Condominium fee.
    CondoFee,
    /// Water, power, gas, internet.
    Utilities,
    /// Repairs and upkeep.
    Maintenance,
    /// Security deposit.
    Deposit,
    /// Contractual fine.
    LateFine,
    /// Property insurance.
    Insurance,
    /// Property tax.
    Tax,
    /// Anything else.
    Other,
}

impl Category {
    /// Returns the human-readable label used in audit lines.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rent => "Rent",
            Self::CondoFee => "Condo fee",
            Self::Utilities => "Utilities",
            Self::Maintenance => "Maintenance",
            Self::Deposit => "Deposit",
            Self::LateFine => "Late fine",
            Self::Insurance => "Insurance",
            Self::Tax => "Tax",
            Self::Other => "Other",
        }
    }
}

/// How a transaction is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant electronic transfer (requires a PIX key).
    Pix,
    /// Physical cash, settled via cash confirmation.
    Cash,
    /// Credit or debit card.
    Card,
    /// Regular bank transfer.
    BankTransfer,
    /// Split between PIX and cash; amounts must sum to the total.
    Mixed,
}

impl PaymentMethod {
    /// Returns the human-readable label used in audit lines.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::BankTransfer => "Bank transfer",
            Self::Mixed => "Mixed (PIX + cash)",
        }
    }

    /// Returns true if this method settles through cash confirmation.
    #[must_use]
    pub fn supports_cash_confirmation(&self) -> bool {
        matches!(self, Self::Cash | Self::Mixed)
    }
}

/// Transaction status in the settlement lifecycle.
///
/// The valid transitions are:
/// - Pending → Paid (approve, or cash confirmation)
/// - Pending → Cancelled (cancel)
/// - Pending → Deleted (soft delete)
/// - Cancelled → Deleted (soft delete)
///
/// "Approved" and "cash-confirmed" are transition labels into Paid,
/// not separate persisted statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting approval or cash confirmation.
    Pending,
    /// Settled; immutable except under a privileged override.
    Paid,
    /// Cancelled before settlement.
    Cancelled,
    /// Soft-deleted (terminal).
    Deleted,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Deleted => "deleted",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Returns true if the transaction can be modified without an override.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the transaction may be soft-deleted.
    #[must_use]
    pub fn allows_soft_delete(&self) -> bool {
        matches!(self, Self::Pending | Self::Cancelled)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction on a property ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The property this movement belongs to.
    pub property_id: PropertyId,
    /// The unit within the property, when applicable.
    pub unit_id: Option<UnitId>,
    /// The tenant responsible for payment, when applicable.
    pub payer_id: Option<TenantId>,
    /// Income or expense.
    pub direction: Direction,
    /// Reporting category.
    pub category: Category,
    /// Free-text description.
    pub description: String,
    /// Base amount (always positive).
    pub amount: Decimal,
    /// When payment is due.
    pub due_date: NaiveDate,
    /// When payment was settled.
    pub paid_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Settlement method.
    pub payment_method: PaymentMethod,
    /// PIX key, required when the method is PIX.
    pub pix_key: Option<String>,
    /// Late fee added to the base amount.
    pub late_fee: Decimal,
    /// Discount subtracted from the base amount.
    pub discount: Decimal,
    /// Derived: `amount + late_fee - discount`.
    pub total_amount: Decimal,
    /// Whether the settlement is split between PIX and cash.
    pub mixed_payment: bool,
    /// PIX portion of a mixed settlement.
    pub pix_amount: Decimal,
    /// Cash portion of a mixed settlement.
    pub cash_amount: Decimal,
    /// Hidden from non-privileged listings.
    pub private: bool,
    /// The user who created the transaction.
    pub created_by: UserId,
    /// The user who approved it, if approved.
    pub approved_by: Option<UserId>,
    /// When it was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// The user who cancelled it, if cancelled.
    pub cancelled_by: Option<UserId>,
    /// When it was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Whether a cash settlement was confirmed.
    pub cash_confirmed: bool,
    /// The user who confirmed the cash settlement.
    pub cash_confirmed_by: Option<UserId>,
    /// When the cash settlement was confirmed.
    pub cash_confirmed_at: Option<DateTime<Utc>>,
    /// User notes plus the encoded audit history (see `ledger::audit`).
    pub notes: String,
    /// Advisory balance snapshot captured at creation.
    pub balance_before: Decimal,
    /// Advisory balance snapshot captured at creation.
    pub balance_after: Decimal,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl Transaction {
    /// Computes the derived total: `amount + late_fee - discount`.
    #[must_use]
    pub fn compute_total(amount: Decimal, late_fee: Decimal, discount: Decimal) -> Decimal {
        amount + late_fee - discount
    }

    /// Returns the signed total used in balance math.
    #[must_use]
    pub fn signed_total(&self) -> Decimal {
        self.direction.sign() * self.total_amount
    }
}

/// Input for creating a new transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// The property this movement belongs to.
    pub property_id: PropertyId,
    /// The unit within the property, when applicable.
    pub unit_id: Option<UnitId>,
    /// The tenant responsible for payment, when applicable.
    pub payer_id: Option<TenantId>,
    /// Income or expense.
    pub direction: Direction,
    /// Reporting category.
    pub category: Category,
    /// Free-text description.
    pub description: String,
    /// Base amount (must be positive).
    pub amount: Decimal,
    /// When payment is due.
    pub due_date: NaiveDate,
    /// Settlement method.
    pub payment_method: PaymentMethod,
    /// PIX key, required when the method is PIX.
    pub pix_key: Option<String>,
    /// Late fee added to the base amount.
    pub late_fee: Decimal,
    /// Discount subtracted from the base amount.
    pub discount: Decimal,
    /// Whether the settlement is split between PIX and cash.
    pub mixed_payment: bool,
    /// PIX portion of a mixed settlement.
    pub pix_amount: Decimal,
    /// Cash portion of a mixed settlement.
    pub cash_amount: Decimal,
    /// Hidden from non-privileged listings.
    pub private: bool,
    /// Initial user notes.
    pub notes: String,
}

/// Partial update applied to a pending transaction.
///
/// `None` fields are left untouched. The `notes` field replaces the user
/// notes section only; the audit history is preserved by the codec and the
/// notes field is never part of the modification diff.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    /// New description.
    pub description: Option<String>,
    /// New base amount.
    pub amount: Option<Decimal>,
    /// New late fee.
    pub late_fee: Option<Decimal>,
    /// New discount.
    pub discount: Option<Decimal>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New settlement method.
    pub payment_method: Option<PaymentMethod>,
    /// New PIX key.
    pub pix_key: Option<String>,
    /// New category.
    pub category: Option<Category>,
    /// New mixed-payment flag.
    pub mixed_payment: Option<bool>,
    /// New PIX portion.
    pub pix_amount: Option<Decimal>,
    /// New cash portion.
    pub cash_amount: Option<Decimal>,
    /// New privacy flag.
    pub private: Option<bool>,
    /// Replacement user notes.
    pub notes: Option<String>,
}

impl TransactionPatch {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.late_fee.is_none()
            && self.discount.is_none()
            && self.due_date.is_none()
            && self.payment_method.is_none()
            && self.pix_key.is_none()
            && self.category.is_none()
            && self.mixed_payment.is_none()
            && self.pix_amount.is_none()
            && self.cash_amount.is_none()
            && self.private.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TransactionStatus::Pending.as_str(), "pending");
        assert_eq!(TransactionStatus::Paid.as_str(), "paid");
        assert_eq!(TransactionStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(TransactionStatus::Deleted.as_str(), "deleted");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            TransactionStatus::parse("pending"),
            Some(TransactionStatus::Pending)
        );
        assert_eq!(
            TransactionStatus::parse("PAID"),
            Some(TransactionStatus::Paid)
        );
        assert_eq!(
            TransactionStatus::parse("Cancelled"),
            Some(TransactionStatus::Cancelled)
        );
        assert_eq!(TransactionStatus::parse("approved"), None);
    }

    #[test]
    fn test_status_editable() {
        assert!(TransactionStatus::Pending.is_editable());
        assert!(!TransactionStatus::Paid.is_editable());
        assert!(!TransactionStatus::Cancelled.is_editable());
        assert!(!TransactionStatus::Deleted.is_editable());
    }

    #[test]
    fn test_status_allows_soft_delete() {
        assert!(TransactionStatus::Pending.allows_soft_delete());
        assert!(TransactionStatus::Cancelled.allows_soft_delete());
        assert!(!TransactionStatus::Paid.allows_soft_delete());
        assert!(!TransactionStatus::Deleted.allows_soft_delete());
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Income.sign(), Decimal::ONE);
        assert_eq!(Direction::Expense.sign(), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(
            Transaction::compute_total(dec!(1000), dec!(50), dec!(30)),
            dec!(1020)
        );
        assert_eq!(
            Transaction::compute_total(dec!(100), dec!(0), dec!(0)),
            dec!(100)
        );
    }

    #[test]
    fn test_payment_method_cash_confirmation() {
        assert!(PaymentMethod::Cash.supports_cash_confirmation());
        assert!(PaymentMethod::Mixed.supports_cash_confirmation());
        assert!(!PaymentMethod::Pix.supports_cash_confirmation());
        assert!(!PaymentMethod::Card.supports_cash_confirmation());
        assert!(!PaymentMethod::BankTransfer.supports_cash_confirmation());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TransactionPatch::default().is_empty());
        let patch = TransactionPatch {
            amount: Some(dec!(10)),
            ..TransactionPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
