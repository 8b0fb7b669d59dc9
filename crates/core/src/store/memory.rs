//! In-memory store backed by a concurrent hash map.
//!
//! `update_if_status` performs its status and version comparison and the
//! write while holding the map entry lock, which gives single-row
//! linearizability without a broader transaction. Inserts and billing
//! batches serialize on one lock so the period-conflict scan and the
//! writes form a single atomic scope.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Datelike;
use dashmap::DashMap;

use quadra_shared::types::{PropertyId, TransactionId, UnitId};

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Transaction, TransactionStatus};
use crate::store::{
    BillingBatchOutcome, TransactionFilter, TransactionStore, UnitDirectory,
};
use crate::workflow::types::LedgerAction;

/// Thread-safe in-memory transaction store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<TransactionId, Transaction>,
    // Serializes inserts against the billing-batch conflict scan.
    // Never held across an await point.
    write_lock: Mutex<()>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns true if the unit already carries a pending or paid row
    /// due in the same month as `tx`.
    fn period_billed(&self, tx: &Transaction, unit_id: UnitId) -> bool {
        let filter = TransactionFilter::for_property(tx.property_id)
            .with_unit(unit_id)
            .due_in(tx.due_date.month(), tx.due_date.year())
            .with_statuses(vec![TransactionStatus::Pending, TransactionStatus::Paid]);
        self.rows.iter().any(|entry| filter.matches(entry.value()))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        let _guard = self.write_guard();
        if self.rows.contains_key(&tx.id) {
            return Err(LedgerError::Store(format!(
                "duplicate transaction id {}",
                tx.id
            )));
        }
        self.rows.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn insert_billing_batch(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<BillingBatchOutcome, LedgerError> {
        let _guard = self.write_guard();

        let mut staged = Vec::new();
        let mut already_billed = Vec::new();
        for tx in txs {
            match tx.unit_id {
                Some(unit_id) if self.period_billed(&tx, unit_id) => {
                    already_billed.push(unit_id);
                }
                _ => staged.push(tx),
            }
        }

        // Validate the whole batch before touching the map so a failure
        // leaves no partial writes behind.
        for tx in &staged {
            if self.rows.contains_key(&tx.id) {
                return Err(LedgerError::Store(format!(
                    "duplicate transaction id {}",
                    tx.id
                )));
            }
        }
        for tx in &staged {
            self.rows.insert(tx.id, tx.clone());
        }
        Ok(BillingBatchOutcome {
            inserted: staged,
            already_billed,
        })
    }

    async fn get(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.rows
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, LedgerError> {
        let mut rows: Vec<Transaction> = self
            .rows
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_if_status(
        &self,
        expected: TransactionStatus,
        action: LedgerAction,
        tx: Transaction,
    ) -> Result<Transaction, LedgerError> {
        let mut entry = self
            .rows
            .get_mut(&tx.id)
            .ok_or(LedgerError::TransactionNotFound(tx.id))?;
        if entry.status != expected {
            return Err(LedgerError::InvalidState {
                status: entry.status,
                action,
            });
        }
        if entry.version != tx.version {
            return Err(LedgerError::ConcurrentModification(tx.id));
        }
        let mut next = tx;
        next.version = entry.version + 1;
        *entry = next.clone();
        Ok(next)
    }

    async fn remove(&self, id: TransactionId) -> Result<(), LedgerError> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::TransactionNotFound(id))
    }
}

/// Fixed unit roster, keyed by property.
#[derive(Debug, Default)]
pub struct StaticUnitDirectory {
    units: HashMap<PropertyId, Vec<UnitId>>,
}

impl StaticUnitDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the unit roster of a property.
    #[must_use]
    pub fn with_property(mut self, property_id: PropertyId, units: Vec<UnitId>) -> Self {
        self.units.insert(property_id, units);
        self
    }
}

#[async_trait]
impl UnitDirectory for StaticUnitDirectory {
    async fn units_of(&self, property_id: PropertyId) -> Result<Vec<UnitId>, LedgerError> {
        Ok(self.units.get(&property_id).cloned().unwrap_or_default())
    }
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
            amount: dec!(500),
            due_date: NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
            paid_date: None,
            status,
            payment_method: PaymentMethod::Pix,
            pix_key: Some("tenant@bank.com".to_string()),
            late_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            total_amount: dec!(500),
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

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let tx = make_tx(PropertyId::new(), TransactionStatus::Pending);

        store.insert(tx.clone()).await.unwrap();
        let fetched = store.get(tx.id).await.unwrap();
        assert_eq!(fetched.id, tx.id);
        assert_eq!(fetched.amount, dec!(500));
    }

    #[tokio::test]
    async fn test_insert_duplicate_rejected() {
        let store = MemoryStore::new();
        let tx = make_tx(PropertyId::new(), TransactionStatus::Pending);

        store.insert(tx.clone()).await.unwrap();
        assert!(matches!(
            store.insert(tx).await,
            Err(LedgerError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get(TransactionId::new()).await,
            Err(LedgerError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_property() {
        let store = MemoryStore::new();
        let property = PropertyId::new();

        store
            .insert(make_tx(property, TransactionStatus::Pending))
            .await
            .unwrap();
        store
            .insert(make_tx(property, TransactionStatus::Paid))
            .await
            .unwrap();
        store
            .insert(make_tx(PropertyId::new(), TransactionStatus::Pending))
            .await
            .unwrap();

        let rows = store
            .list(&TransactionFilter::for_property(property))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_update_if_status_matches() {
        let store = MemoryStore::new();
        let mut tx = make_tx(PropertyId::new(), TransactionStatus::Pending);
        store.insert(tx.clone()).await.unwrap();

        tx.status = TransactionStatus::Paid;
        let committed = store
            .update_if_status(TransactionStatus::Pending, LedgerAction::Approve, tx.clone())
            .await
            .unwrap();
        assert_eq!(committed.status, TransactionStatus::Paid);
        assert_eq!(committed.version, 1);
        assert_eq!(store.get(tx.id).await.unwrap().status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_update_if_status_stale_version() {
        let store = MemoryStore::new();
        let tx = make_tx(PropertyId::new(), TransactionStatus::Pending);
        store.insert(tx.clone()).await.unwrap();

        // First writer commits an edit against the row it read.
        let mut first = tx.clone();
        first.amount = dec!(600);
        store
            .update_if_status(TransactionStatus::Pending, LedgerAction::Update, first)
            .await
            .unwrap();

        // Second writer still holds the original read: same status, but
        // the row was rewritten underneath it.
        let mut second = tx;
        second.amount = dec!(700);
        let result = store
            .update_if_status(TransactionStatus::Pending, LedgerAction::Update, second.clone())
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::ConcurrentModification(id)) if id == second.id
        ));
        // The first edit survives.
        let stored = store.get(second.id).await.unwrap();
        assert_eq!(stored.amount, dec!(600));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_update_if_status_stale_observation() {
        let store = MemoryStore::new();
        let mut tx = make_tx(PropertyId::new(), TransactionStatus::Paid);
        store.insert(tx.clone()).await.unwrap();

        tx.status = TransactionStatus::Cancelled;
        let result = store
            .update_if_status(TransactionStatus::Pending, LedgerAction::Cancel, tx.clone())
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::InvalidState {
                status: TransactionStatus::Paid,
                action: LedgerAction::Cancel,
            })
        ));
        // The stored row is untouched.
        assert_eq!(store.get(tx.id).await.unwrap().status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_billing_batch_detects_conflicts_in_store() {
        let store = MemoryStore::new();
        let property = PropertyId::new();
        let unit_a = UnitId::new();
        let unit_b = UnitId::new();

        // Unit A is already billed for the period, committed before the
        // batch ever looks at the store.
        let mut existing = make_tx(property, TransactionStatus::Pending);
        existing.unit_id = Some(unit_a);
        store.insert(existing).await.unwrap();

        let mut row_a = make_tx(property, TransactionStatus::Pending);
        row_a.unit_id = Some(unit_a);
        let mut row_b = make_tx(property, TransactionStatus::Pending);
        row_b.unit_id = Some(unit_b);

        let outcome = store
            .insert_billing_batch(vec![row_a, row_b.clone()])
            .await
            .unwrap();
        assert_eq!(outcome.already_billed, vec![unit_a]);
        assert_eq!(outcome.inserted.len(), 1);
        assert_eq!(outcome.inserted[0].id, row_b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_billing_batch_ignores_cancelled_rows() {
        let store = MemoryStore::new();
        let property = PropertyId::new();
        let unit = UnitId::new();

        let mut cancelled = make_tx(property, TransactionStatus::Cancelled);
        cancelled.unit_id = Some(unit);
        store.insert(cancelled).await.unwrap();

        let mut row = make_tx(property, TransactionStatus::Pending);
        row.unit_id = Some(unit);
        let outcome = store.insert_billing_batch(vec![row]).await.unwrap();
        assert!(outcome.already_billed.is_empty());
        assert_eq!(outcome.inserted.len(), 1);
    }

    #[tokio::test]
    async fn test_billing_batch_all_or_nothing_on_store_fault() {
        let store = MemoryStore::new();
        let property = PropertyId::new();
        let existing = make_tx(property, TransactionStatus::Cancelled);
        store.insert(existing.clone()).await.unwrap();

        let mut fresh = make_tx(property, TransactionStatus::Pending);
        fresh.unit_id = Some(UnitId::new());
        let mut duplicate = existing;
        duplicate.unit_id = Some(UnitId::new());

        let result = store.insert_billing_batch(vec![fresh, duplicate]).await;
        assert!(matches!(result, Err(LedgerError::Store(_))));
        // The fresh row must not have been written.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new();
        let tx = make_tx(PropertyId::new(), TransactionStatus::Cancelled);
        store.insert(tx.clone()).await.unwrap();

        store.remove(tx.id).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.remove(tx.id).await,
            Err(LedgerError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_static_unit_directory() {
        let property = PropertyId::new();
        let units = vec![UnitId::new(), UnitId::new()];
        let directory = StaticUnitDirectory::new().with_property(property, units.clone());

        assert_eq!(directory.units_of(property).await.unwrap(), units);
        assert!(directory.units_of(PropertyId::new()).await.unwrap().is_empty());
    }
}
