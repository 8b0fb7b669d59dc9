//! Persistence seam for the ledger.
//!
//! The Ledger Store is an external collaborator: the core only talks to it
//! through `TransactionStore`. Mutations on a single id are serialized by
//! `update_if_status`, a compare-and-swap conditioned on the status and
//! version the caller observed; the loser of a race fails with
//! `InvalidState` or `ConcurrentModification`.

use async_trait::async_trait;
use chrono::Datelike;

use quadra_shared::types::{PropertyId, TransactionId, UnitId};

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Transaction, TransactionStatus};
use crate::workflow::types::LedgerAction;

pub mod memory;

pub use memory::{MemoryStore, StaticUnitDirectory};

/// Filter for store queries.
///
/// By default Deleted rows are excluded; an explicit status list overrides
/// that.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one property.
    pub property_id: Option<PropertyId>,
    /// Restrict to one unit.
    pub unit_id: Option<UnitId>,
    /// Restrict to these statuses; `None` means all except Deleted.
    pub statuses: Option<Vec<TransactionStatus>>,
    /// Restrict to rows due in this (month, year).
    pub due_period: Option<(u32, i32)>,
}

impl TransactionFilter {
    /// Filter scoped to one property.
    #[must_use]
    pub fn for_property(property_id: PropertyId) -> Self {
        Self {
            property_id: Some(property_id),
            ..Self::default()
        }
    }

    /// Restricts the filter to one unit.
    #[must_use]
    pub fn with_unit(mut self, unit_id: UnitId) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    /// Restricts the filter to the given statuses.
    #[must_use]
    pub fn with_statuses(mut self, statuses: Vec<TransactionStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Restricts the filter to rows due in the given month and year.
    #[must_use]
    pub fn due_in(mut self, month: u32, year: i32) -> Self {
        self.due_period = Some((month, year));
        self
    }

    /// Returns true if a transaction matches the filter.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(property_id) = self.property_id {
            if tx.property_id != property_id {
                return false;
            }
        }
        if let Some(unit_id) = self.unit_id {
            if tx.unit_id != Some(unit_id) {
                return false;
            }
        }
        match &self.statuses {
            Some(statuses) => {
                if !statuses.contains(&tx.status) {
                    return false;
                }
            }
            None => {
                if tx.status == TransactionStatus::Deleted {
                    return false;
                }
            }
        }
        if let Some((month, year)) = self.due_period {
            if tx.due_date.month() != month || tx.due_date.year() != year {
                return false;
            }
        }
        true
    }
}

/// Outcome of a billing batch insert.
#[derive(Debug, Clone)]
pub struct BillingBatchOutcome {
    /// Rows that were inserted.
    pub inserted: Vec<Transaction>,
    /// Units whose billing period was already covered, in input order.
    pub already_billed: Vec<UnitId>,
}

/// Durable keyed collection of transaction records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persists a new transaction.
    async fn insert(&self, tx: Transaction) -> Result<Transaction, LedgerError>;

    /// Persists a billing batch in one atomic scope.
    ///
    /// A staged row whose unit already carries a pending or paid
    /// transaction due in the same month is reported in
    /// `already_billed` instead of being inserted; the conflict check
    /// and the writes happen under the same store lock, so a row
    /// committed concurrently cannot slip between them. The remainder
    /// inserts all-or-nothing.
    async fn insert_billing_batch(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<BillingBatchOutcome, LedgerError>;

    /// Fetches one transaction by id.
    async fn get(&self, id: TransactionId) -> Result<Transaction, LedgerError>;

    /// Lists committed transactions matching the filter.
    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, LedgerError>;

    /// Replaces a transaction atomically, conditioned on what the
    /// caller observed. Fails with `InvalidState` (carrying `action`)
    /// when the stored status no longer matches, and with
    /// `ConcurrentModification` when the status matches but the row was
    /// rewritten since it was read (version mismatch). On success the
    /// stored version is bumped.
    async fn update_if_status(
        &self,
        expected: TransactionStatus,
        action: LedgerAction,
        tx: Transaction,
    ) -> Result<Transaction, LedgerError>;

    /// Permanently removes a transaction.
    async fn remove(&self, id: TransactionId) -> Result<(), LedgerError>;
}

/// Supplies the unit roster of a property.
///
/// Org-entity CRUD is a separate bounded context; batch generation only
/// needs this one read.
#[async_trait]
pub trait UnitDirectory: Send + Sync {
    /// Returns all unit ids belonging to the property.
    async fn units_of(&self, property_id: PropertyId) -> Result<Vec<UnitId>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{Category, Direction, PaymentMethod};
    use chrono::{NaiveDate, Utc};
    use quadra_shared::types::UserId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn make_tx(property_id: PropertyId, status: TransactionStatus) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            property_id,
            unit_id: None,
            payer_id: None,
            direction: Direction::Income,
            category: Category::Rent,
            description: "rent".to_string(),
            amount: dec!(100),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            paid_date: None,
            status,
            payment_method: PaymentMethod::BankTransfer,
            pix_key: None,
            late_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            total_amount: dec!(100),
            mixed_payment: false,
            pix_amount: Decimal::ZERO,
            cash_amount: Decimal::ZERO,
            private: false,
            created_by: UserId::new(),
            approved_by: None,
            approved_at: None,
            cancelled_by: None,
            cancelled_at: None,
            cash_confirmed: false,
            cash_confirmed_by: None,
            cash_confirmed_at: None,
            notes: String::new(),
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            created_at: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn test_filter_by_property() {
        let property = PropertyId::new();
        let filter = TransactionFilter::for_property(property);

        assert!(filter.matches(&make_tx(property, TransactionStatus::Pending)));
        assert!(!filter.matches(&make_tx(PropertyId::new(), TransactionStatus::Pending)));
    }

    #[test]
    fn test_filter_excludes_deleted_by_default() {
        let property = PropertyId::new();
        let filter = TransactionFilter::for_property(property);
        assert!(!filter.matches(&make_tx(property, TransactionStatus::Deleted)));
    }

    #[test]
    fn test_filter_explicit_statuses() {
        let property = PropertyId::new();
        let filter = TransactionFilter::for_property(property)
            .with_statuses(vec![TransactionStatus::Deleted]);
        assert!(filter.matches(&make_tx(property, TransactionStatus::Deleted)));
        assert!(!filter.matches(&make_tx(property, TransactionStatus::Pending)));
    }

    #[test]
    fn test_filter_due_period() {
        let property = PropertyId::new();
        let filter = TransactionFilter::for_property(property).due_in(3, 2026);
        let mut tx = make_tx(property, TransactionStatus::Pending);
        assert!(filter.matches(&tx));

        tx.due_date = NaiveDate::from_ymd_opt(2026, 4, 5).unwrap();
        assert!(!filter.matches(&tx));

        tx.due_date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert!(!filter.matches(&tx));
    }

    #[test]
    fn test_filter_unit() {
        let property = PropertyId::new();
        let unit = UnitId::new();
        let filter = TransactionFilter::for_property(property).with_unit(unit);

        let mut tx = make_tx(property, TransactionStatus::Pending);
        assert!(!filter.matches(&tx));
        tx.unit_id = Some(unit);
        assert!(filter.matches(&tx));
    }
}
