//! Lifecycle state machine for ledger transactions.
//!
//! All methods are pure: they validate a transition against the current
//! record and return a `LifecycleAction` carrying the audit data. The
//! manager applies the action inside a status-conditioned write, so a
//! concurrent loser re-observes the post-transition state and fails here
//! with `InvalidState`.

use chrono::Utc;

use quadra_shared::types::UserId;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Transaction, TransactionStatus};
use crate::workflow::types::{Actor, LedgerAction, LifecycleAction, Role};

/// Stateless service validating lifecycle transitions.
pub struct LifecycleService;

impl LifecycleService {
    /// Approve a pending transaction.
    ///
    /// The `approved_by` guard runs before the status check and
    /// independently of it: a record that already carries an approver is
    /// `AlreadyProcessed` whatever its current status says.
    pub fn approve(tx: &Transaction, approved_by: UserId) -> Result<LifecycleAction, LedgerError> {
        if tx.approved_by.is_some() {
            return Err(LedgerError::AlreadyProcessed(tx.id));
        }
        if tx.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidState {
                status: tx.status,
                action: LedgerAction::Approve,
            });
        }
        Ok(LifecycleAction::Approve {
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Confirm a cash settlement on a pending cash or mixed transaction.
    pub fn confirm_cash(
        tx: &Transaction,
        confirmed_by: UserId,
    ) -> Result<LifecycleAction, LedgerError> {
        if tx.cash_confirmed {
            return Err(LedgerError::AlreadyProcessed(tx.id));
        }
        if !tx.payment_method.supports_cash_confirmation()
            || tx.status != TransactionStatus::Pending
        {
            return Err(LedgerError::InvalidState {
                status: tx.status,
                action: LedgerAction::ConfirmCash,
            });
        }
        Ok(LifecycleAction::ConfirmCash {
            confirmed_by,
            confirmed_at: Utc::now(),
        })
    }

    /// Cancel a pending transaction.
    ///
    /// Only Pending cancels; the source system also matched a phantom
    /// "approved" status that the persisted enum never contained.
    pub fn cancel(tx: &Transaction, cancelled_by: UserId) -> Result<LifecycleAction, LedgerError> {
        if tx.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidState {
                status: tx.status,
                action: LedgerAction::Cancel,
            });
        }
        Ok(LifecycleAction::Cancel {
            cancelled_by,
            cancelled_at: Utc::now(),
        })
    }

    /// Soft-delete a pending or cancelled transaction.
    pub fn soft_delete(tx: &Transaction) -> Result<LifecycleAction, LedgerError> {
        if !tx.status.allows_soft_delete() {
            return Err(LedgerError::InvalidState {
                status: tx.status,
                action: LedgerAction::SoftDelete,
            });
        }
        Ok(LifecycleAction::SoftDelete)
    }

    /// Validates that an actor may edit the transaction.
    ///
    /// Editing is limited to Pending unless the role carries the
    /// privileged override.
    pub fn guard_update(tx: &Transaction, role: Role) -> Result<(), LedgerError> {
        if tx.status.is_editable() || role.has_override() {
            return Ok(());
        }
        Err(LedgerError::InvalidState {
            status: tx.status,
            action: LedgerAction::Update,
        })
    }

    /// Validates that an actor may permanently remove the transaction.
    ///
    /// Hard deletion is blocked for Paid rows regardless of actor;
    /// otherwise the domain rule is creator-or-admin.
    pub fn guard_hard_delete(tx: &Transaction, actor: &Actor) -> Result<(), LedgerError> {
        if tx.status == TransactionStatus::Paid {
            return Err(LedgerError::InvalidState {
                status: tx.status,
                action: LedgerAction::HardDelete,
            });
        }
        if actor.id != tx.created_by && actor.role < Role::Admin {
            return Err(LedgerError::Forbidden {
                role: actor.role,
                action: LedgerAction::HardDelete,
            });
        }
        Ok(())
    }
}
