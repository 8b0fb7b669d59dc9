//! Ledger lifecycle manager.
//!
//! The manager is the single entry point for ledger mutations. Every
//! operation follows the same shape: read the current record, run the
//! pure domain checks, then commit through a status-conditioned write.
//! Cache invalidation and notifications run after the commit and never
//! affect the result.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use quadra_shared::config::LedgerSettings;
use quadra_shared::types::{PropertyId, TransactionId, UnitId};

use crate::ledger::audit::{self, AuditAction, AuditTrail, HistoryLine};
use crate::ledger::balance::{self, PropertyBalance};
use crate::ledger::error::LedgerError;
use crate::ledger::tag::{self, TagStatistics};
use crate::ledger::types::{
    Category, CreateTransactionInput, Direction, PaymentMethod, Transaction, TransactionPatch,
    TransactionStatus,
};
use crate::ledger::validation;
use crate::signal::{CacheInvalidator, NotificationPriority, Notifier};
use crate::store::{TransactionFilter, TransactionStore, UnitDirectory};
use crate::workflow::service::LifecycleService;
use crate::workflow::types::{Actor, CapabilityTable, LedgerAction, LifecycleAction, Role};

/// Balance and classification report for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceReport {
    /// Running balance over Paid rows.
    pub balance: PropertyBalance,
    /// Per-tag statistics over all non-deleted rows.
    pub statistics: TagStatistics,
}

/// Input for monthly batch generation.
#[derive(Debug, Clone)]
pub struct MonthlyBatchInput {
    /// The property to bill.
    pub property_id: PropertyId,
    /// Billing month (1-12).
    pub month: u32,
    /// Billing year.
    pub year: i32,
    /// Due date stamped on every generated transaction.
    pub due_date: NaiveDate,
    /// Amount charged per unit.
    pub default_amount: Decimal,
    /// Units left out of this billing run.
    pub excluded_units: Vec<UnitId>,
}

/// A unit skipped during batch generation, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedUnit {
    /// The skipped unit.
    pub unit_id: UnitId,
    /// Human-readable skip reason.
    pub reason: String,
}

/// Outcome of a monthly batch run.
///
/// Per-unit conflicts surface as skips; the run as a whole still
/// succeeds.
#[derive(Debug, Clone)]
pub struct MonthlyBatchResult {
    /// Transactions created in this run.
    pub created: Vec<Transaction>,
    /// Units skipped, with reasons.
    pub skipped: Vec<SkippedUnit>,
}

/// Orchestrates ledger operations over a store and its side channels.
pub struct LedgerManager<S, U> {
    store: S,
    units: U,
    cache: Arc<dyn CacheInvalidator>,
    notifier: Arc<dyn Notifier>,
    settings: LedgerSettings,
}

impl<S: TransactionStore, U: UnitDirectory> LedgerManager<S, U> {
    /// Creates a manager over the given collaborators.
    pub fn new(
        store: S,
        units: U,
        cache: Arc<dyn CacheInvalidator>,
        notifier: Arc<dyn Notifier>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            store,
            units,
            cache,
            notifier,
            settings,
        }
    }

    // ========== Creation ==========

    /// Creates a pending transaction.
    ///
    /// The balance snapshot captured on the record is advisory: if it
    /// cannot be computed the creation proceeds with zeroed snapshot
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns validation, split or permission errors; store faults
    /// surface as `LedgerError::Store`.
    pub async fn create_transaction(
        &self,
        actor: &Actor,
        input: CreateTransactionInput,
    ) -> Result<Transaction, LedgerError> {
        self.authorize(actor, LedgerAction::Create, input.property_id)?;
        validation::validate_draft(&input)?;

        let total_amount = Transaction::compute_total(input.amount, input.late_fee, input.discount);
        let (balance_before, balance_after) = match self.paid_balance(input.property_id).await {
            Ok(current) => balance::snapshot(&current, input.direction, total_amount),
            Err(err) => {
                warn!(property_id = %input.property_id, error = %err,
                    "balance snapshot unavailable, recording zeros");
                (Decimal::ZERO, Decimal::ZERO)
            }
        };

        let tx = Transaction {
            id: TransactionId::new(),
            property_id: input.property_id,
            unit_id: input.unit_id,
            payer_id: input.payer_id,
            direction: input.direction,
            category: input.category,
            description: input.description,
            amount: input.amount,
            due_date: input.due_date,
            paid_date: None,
            status: TransactionStatus::Pending,
            payment_method: input.payment_method,
            pix_key: input.pix_key,
            late_fee: input.late_fee,
            discount: input.discount,
            total_amount,
            mixed_payment: input.mixed_payment,
            pix_amount: input.pix_amount,
            cash_amount: input.cash_amount,
            private: input.private,
            created_by: actor.id,
            approved_by: None,
            approved_at: None,
            cancelled_by: None,
            cancelled_at: None,
            cash_confirmed: false,
            cash_confirmed_by: None,
            cash_confirmed_at: None,
            notes: input.notes,
            balance_before,
            balance_after,
            created_at: Utc::now(),
            version: 0,
        };

        let committed = self.store.insert(tx).await?;
        self.after_commit(
            committed.property_id,
            Some(("New transaction awaiting approval", NotificationPriority::Normal)),
        )
        .await;
        Ok(committed)
    }

    // ========== Reads ==========

    /// Fetches one transaction, enforcing property access.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or `PropertyAccessDenied`.
    pub async fn get_transaction(
        &self,
        actor: &Actor,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let tx = self.store.get(id).await?;
        if !actor.can_access(tx.property_id) {
            return Err(LedgerError::PropertyAccessDenied(tx.property_id));
        }
        Ok(tx)
    }

    /// Lists transactions for a property-scoped filter.
    ///
    /// Private rows are withheld from actors below Manager.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the filter has no property scope, or
    /// `PropertyAccessDenied`.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let property_id = filter.property_id.ok_or_else(|| {
            LedgerError::Validation("listing requires a property scope".to_string())
        })?;
        if !actor.can_access(property_id) {
            return Err(LedgerError::PropertyAccessDenied(property_id));
        }

        let mut rows = self.store.list(filter).await?;
        if actor.role < Role::Manager {
            rows.retain(|tx| !tx.private || tx.created_by == actor.id);
        }
        Ok(rows)
    }

    /// Computes the balance report for a property.
    ///
    /// The balance folds over Paid rows; the statistics classify every
    /// non-deleted row as of today.
    ///
    /// # Errors
    ///
    /// Returns `PropertyAccessDenied` or a store fault.
    pub async fn get_balance(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<BalanceReport, LedgerError> {
        if !actor.can_access(property_id) {
            return Err(LedgerError::PropertyAccessDenied(property_id));
        }
        let rows = self
            .store
            .list(&TransactionFilter::for_property(property_id))
            .await?;
        Ok(BalanceReport {
            balance: balance::compute(&rows),
            statistics: tag::aggregate(&rows, Utc::now().date_naive()),
        })
    }

    // ========== Updates ==========

    /// Applies a partial edit to a transaction.
    ///
    /// Field changes are diffed against the stored record and appended
    /// to the audit history as one MODIFICATION line; replacing the user
    /// notes never touches the history and is never diffed.
    ///
    /// # Errors
    ///
    /// Returns permission, validation or state errors; a concurrent
    /// status change surfaces as `InvalidState`.
    pub async fn update_transaction(
        &self,
        actor: &Actor,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::Update, current.property_id)?;
        LifecycleService::guard_update(&current, actor.role)?;

        if patch.is_empty() {
            return Ok(current);
        }

        let mut updated = current.clone();
        apply_patch(&mut updated, patch);
        updated.total_amount =
            Transaction::compute_total(updated.amount, updated.late_fee, updated.discount);
        validation::validate_updated(&updated)?;

        let changes = audit::diff_fields(&current, &updated);
        if !changes.is_empty() {
            let line = HistoryLine::new(
                AuditAction::Modification,
                &actor.id.to_string(),
                &audit::format_modification(&changes),
                Utc::now(),
            );
            updated.notes = audit::append(&updated.notes, &line);
        }

        let committed = self
            .store
            .update_if_status(current.status, LedgerAction::Update, updated)
            .await?;
        self.after_commit(
            committed.property_id,
            Some(("Transaction updated", NotificationPriority::Normal)),
        )
        .await;
        Ok(committed)
    }

    // ========== Lifecycle transitions ==========

    /// Approves a pending transaction into Paid.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` when an approver is already recorded,
    /// `InvalidState` otherwise for non-pending records (including a
    /// concurrent loser), or permission errors.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: TransactionId,
        note: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::Approve, current.property_id)?;
        let lifecycle = LifecycleService::approve(&current, actor.id)?;

        let committed = self
            .commit_transition(
                current,
                LedgerAction::Approve,
                lifecycle,
                AuditAction::Approval,
                actor,
                note.unwrap_or("Approved"),
            )
            .await?;
        self.after_commit(
            committed.property_id,
            Some(("Transaction approved", NotificationPriority::Normal)),
        )
        .await;
        Ok(committed)
    }

    /// Confirms a cash settlement, moving the transaction into Paid.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyProcessed` when already confirmed, `InvalidState`
    /// for incompatible methods or non-pending records, or permission
    /// errors.
    pub async fn confirm_cash(
        &self,
        actor: &Actor,
        id: TransactionId,
        note: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::ConfirmCash, current.property_id)?;
        let lifecycle = LifecycleService::confirm_cash(&current, actor.id)?;

        let committed = self
            .commit_transition(
                current,
                LedgerAction::ConfirmCash,
                lifecycle,
                AuditAction::Confirmation,
                actor,
                note.unwrap_or("Cash payment confirmed"),
            )
            .await?;
        self.after_commit(
            committed.property_id,
            Some(("Cash payment confirmed", NotificationPriority::Normal)),
        )
        .await;
        Ok(committed)
    }

    /// Cancels a pending transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for non-pending records or permission
    /// errors.
    pub async fn cancel(
        &self,
        actor: &Actor,
        id: TransactionId,
        reason: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::Cancel, current.property_id)?;
        let lifecycle = LifecycleService::cancel(&current, actor.id)?;

        let committed = self
            .commit_transition(
                current,
                LedgerAction::Cancel,
                lifecycle,
                AuditAction::Cancellation,
                actor,
                reason.unwrap_or("Cancelled"),
            )
            .await?;
        self.after_commit(
            committed.property_id,
            Some(("Transaction cancelled", NotificationPriority::High)),
        )
        .await;
        Ok(committed)
    }

    /// Soft-deletes a pending or cancelled transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for paid or already-deleted records, or
    /// permission errors.
    pub async fn soft_delete(
        &self,
        actor: &Actor,
        id: TransactionId,
        note: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::SoftDelete, current.property_id)?;
        let lifecycle = LifecycleService::soft_delete(&current)?;

        let committed = self
            .commit_transition(
                current,
                LedgerAction::SoftDelete,
                lifecycle,
                AuditAction::Deletion,
                actor,
                note.unwrap_or("Deleted"),
            )
            .await?;
        self.after_commit(committed.property_id, None).await;
        Ok(committed)
    }

    /// Permanently removes a transaction.
    ///
    /// Paid rows are never removable; otherwise only the creator or an
    /// admin may remove.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState`, `Forbidden` or permission errors.
    pub async fn hard_delete(
        &self,
        actor: &Actor,
        id: TransactionId,
    ) -> Result<(), LedgerError> {
        let current = self.store.get(id).await?;
        self.authorize(actor, LedgerAction::HardDelete, current.property_id)?;
        LifecycleService::guard_hard_delete(&current, actor)?;

        self.store.remove(id).await?;
        self.after_commit(current.property_id, None).await;
        Ok(())
    }

    // ========== Monthly batch ==========

    /// Generates one rent transaction per unit for a billing month.
    ///
    /// The whole roster is staged and handed to the store in one atomic
    /// batch; units already carrying a pending or paid transaction due
    /// in the period come back as skips and the remainder commits
    /// all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns validation or permission errors, or a store fault; a
    /// per-unit billing conflict is reported as a skip, not an error.
    pub async fn generate_monthly_batch(
        &self,
        actor: &Actor,
        input: MonthlyBatchInput,
    ) -> Result<MonthlyBatchResult, LedgerError> {
        self.authorize(actor, LedgerAction::Create, input.property_id)?;
        if !(1..=12).contains(&input.month) {
            return Err(LedgerError::Validation(format!(
                "invalid billing month {}",
                input.month
            )));
        }
        if input.default_amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "batch amount must be positive".to_string(),
            ));
        }
        // The store keys period conflicts on the due date, so the due
        // date must fall in the billing month.
        if input.due_date.month() != input.month || input.due_date.year() != input.year {
            return Err(LedgerError::Validation(
                "due date must fall in the billing month".to_string(),
            ));
        }

        let mut roster = self.units.units_of(input.property_id).await?;
        roster.retain(|unit| !input.excluded_units.contains(unit));

        let base = match self.paid_balance(input.property_id).await {
            Ok(current) => current,
            Err(err) => {
                warn!(property_id = %input.property_id, error = %err,
                    "balance snapshot unavailable, recording zeros");
                PropertyBalance::default()
            }
        };
        let description = format!(
            "{} {:02}/{}",
            self.settings.monthly_batch_description, input.month, input.year
        );

        let mut staged = Vec::new();
        for unit_id in roster {
            let (balance_before, balance_after) =
                balance::snapshot(&base, Direction::Income, input.default_amount);
            staged.push(Transaction {
                id: TransactionId::new(),
                property_id: input.property_id,
                unit_id: Some(unit_id),
                payer_id: None,
                direction: Direction::Income,
                category: Category::Rent,
                description: description.clone(),
                amount: input.default_amount,
                due_date: input.due_date,
                paid_date: None,
                status: TransactionStatus::Pending,
                payment_method: PaymentMethod::BankTransfer,
                pix_key: None,
                late_fee: Decimal::ZERO,
                discount: Decimal::ZERO,
                total_amount: input.default_amount,
                mixed_payment: false,
                pix_amount: Decimal::ZERO,
                cash_amount: Decimal::ZERO,
                private: false,
                created_by: actor.id,
                approved_by: None,
                approved_at: None,
                cancelled_by: None,
                cancelled_at: None,
                cash_confirmed: false,
                cash_confirmed_by: None,
                cash_confirmed_at: None,
                notes: String::new(),
                balance_before,
                balance_after,
                created_at: Utc::now(),
                version: 0,
            });
        }

        let outcome = self.store.insert_billing_batch(staged).await?;
        let skipped = outcome
            .already_billed
            .into_iter()
            .map(|unit_id| SkippedUnit {
                unit_id,
                reason: LedgerError::AlreadyBilled {
                    unit_id,
                    month: input.month,
                    year: input.year,
                }
                .to_string(),
            })
            .collect();
        let created = outcome.inserted;
        if !created.is_empty() {
            self.after_commit(
                input.property_id,
                Some(("Monthly billing generated", NotificationPriority::Normal)),
            )
            .await;
        }
        Ok(MonthlyBatchResult { created, skipped })
    }

    // ========== Internals ==========

    fn authorize(
        &self,
        actor: &Actor,
        action: LedgerAction,
        property_id: PropertyId,
    ) -> Result<(), LedgerError> {
        if !CapabilityTable::allows(actor.role, action) {
            return Err(LedgerError::Forbidden {
                role: actor.role,
                action,
            });
        }
        if !actor.can_access(property_id) {
            return Err(LedgerError::PropertyAccessDenied(property_id));
        }
        Ok(())
    }

    async fn paid_balance(&self, property_id: PropertyId) -> Result<PropertyBalance, LedgerError> {
        let rows = self
            .store
            .list(
                &TransactionFilter::for_property(property_id)
                    .with_statuses(vec![TransactionStatus::Paid]),
            )
            .await?;
        Ok(balance::compute(&rows))
    }

    async fn commit_transition(
        &self,
        current: Transaction,
        action: LedgerAction,
        lifecycle: LifecycleAction,
        audit_action: AuditAction,
        actor: &Actor,
        details: &str,
    ) -> Result<Transaction, LedgerError> {
        let mut updated = current.clone();
        lifecycle.apply(&mut updated);
        let line = HistoryLine::new(audit_action, &actor.id.to_string(), details, Utc::now());
        updated.notes = audit::append(&updated.notes, &line);
        self.store
            .update_if_status(current.status, action, updated)
            .await
    }

    /// Post-commit side channels. Failures are logged and swallowed.
    async fn after_commit(
        &self,
        property_id: PropertyId,
        message: Option<(&str, NotificationPriority)>,
    ) {
        let pattern = format!("{}:{}:*", self.settings.cache_prefix, property_id);
        if let Err(err) = self.cache.invalidate(&pattern).await {
            warn!(%property_id, error = %err, "cache invalidation failed");
        }
        if !self.settings.notifications_enabled {
            return;
        }
        if let Some((message, priority)) = message {
            let targets = [Role::Manager, Role::Admin, Role::Owner];
            if let Err(err) = self
                .notifier
                .notify(property_id, message, priority, &targets)
                .await
            {
                warn!(%property_id, error = %err, "notification delivery failed");
            }
        }
    }
}

/// Applies a patch to a transaction in place.
///
/// The notes field is re-threaded through the audit codec so a user edit
/// replaces only the notes section and keeps the history block intact.
fn apply_patch(tx: &mut Transaction, patch: TransactionPatch) {
    if let Some(description) = patch.description {
        tx.description = description;
    }
    if let Some(amount) = patch.amount {
        tx.amount = amount;
    }
    if let Some(late_fee) = patch.late_fee {
        tx.late_fee = late_fee;
    }
    if let Some(discount) = patch.discount {
        tx.discount = discount;
    }
    if let Some(due_date) = patch.due_date {
        tx.due_date = due_date;
    }
    if let Some(payment_method) = patch.payment_method {
        tx.payment_method = payment_method;
    }
    if let Some(pix_key) = patch.pix_key {
        tx.pix_key = Some(pix_key);
    }
    if let Some(category) = patch.category {
        tx.category = category;
    }
    if let Some(mixed_payment) = patch.mixed_payment {
        tx.mixed_payment = mixed_payment;
    }
    if let Some(pix_amount) = patch.pix_amount {
        tx.pix_amount = pix_amount;
    }
    if let Some(cash_amount) = patch.cash_amount {
        tx.cash_amount = cash_amount;
    }
    if let Some(private) = patch.private {
        tx.private = private;
    }
    if let Some(notes) = patch.notes {
        let mut trail = AuditTrail::decode(&tx.notes);
        trail.notes = notes;
        tx.notes = trail.encode();
    }
}
