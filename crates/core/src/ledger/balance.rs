//! Property balance calculation.
//!
//! The running balance is always a streaming fold over the current store
//! state, never an independently maintained counter, so it cannot drift
//! from persisted truth. Snapshot fields on the transaction record are
//! advisory metadata only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Direction, Transaction, TransactionStatus};

/// Aggregated balance for one property, derived from Paid rows only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyBalance {
    /// Signed running balance: income minus expense.
    pub balance: Decimal,
    /// Unsigned sum of all Paid totals (reconciles with the paid tag).
    pub paid_volume: Decimal,
    /// Sum of Paid income totals.
    pub income_total: Decimal,
    /// Sum of Paid expense totals.
    pub expense_total: Decimal,
}

/// Computes the balance over a slice of transactions.
///
/// Only Paid rows participate; everything else is skipped. O(n) single
/// pass.
#[must_use]
pub fn compute(transactions: &[Transaction]) -> PropertyBalance {
    let mut result = PropertyBalance::default();
    for tx in transactions {
        if tx.status != TransactionStatus::Paid {
            continue;
        }
        result.paid_volume += tx.total_amount;
        match tx.direction {
            Direction::Income => result.income_total += tx.total_amount,
            Direction::Expense => result.expense_total += tx.total_amount,
        }
        result.balance += tx.signed_total();
    }
    result
}

/// Computes the advisory before/after snapshot captured at creation time.
///
/// `before` is the current paid balance; `after` applies the new
/// transaction's signed total as if it were already settled.
#[must_use]
pub fn snapshot(
    current: &PropertyBalance,
    direction: Direction,
    total_amount: Decimal,
) -> (Decimal, Decimal) {
    let before = current.balance;
    let after = before + direction.sign() * total_amount;
    (before, after)
}
