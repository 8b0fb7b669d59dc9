//! Tag-based classification of transactions for reporting.
//!
//! A tag is derived from stored fields and the current date; it is never
//! persisted. Deleted transactions are filtered out before classification.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Transaction, TransactionStatus};

/// Derived reporting classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Pending and not yet due.
    Pending,
    /// Pending and past its due date.
    Overdue,
    /// Settled.
    Paid,
    /// Cancelled.
    Cancelled,
}

impl Tag {
    /// Returns the string representation of the tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Classifies a transaction as of `today`.
///
/// Paid and Cancelled map directly from status; otherwise the due date
/// decides between Overdue and Pending. Deleted rows must be filtered out
/// by the caller; they classify as Pending/Overdue like the source status
/// they had, which is never meaningful.
#[must_use]
pub fn classify(tx: &Transaction, today: NaiveDate) -> Tag {
    match tx.status {
        TransactionStatus::Paid => Tag::Paid,
        TransactionStatus::Cancelled => Tag::Cancelled,
        TransactionStatus::Pending | TransactionStatus::Deleted => {
            if tx.due_date < today {
                Tag::Overdue
            } else {
                Tag::Pending
            }
        }
    }
}

/// Count and summed total for one tag bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagBucket {
    /// Number of transactions in the bucket.
    pub count: usize,
    /// Sum of `total_amount` over the bucket.
    pub total: Decimal,
}

impl TagBucket {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount;
    }
}

/// Per-tag statistics for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagStatistics {
    /// Pending bucket.
    pub pending: TagBucket,
    /// Overdue bucket.
    pub overdue: TagBucket,
    /// Paid bucket.
    pub paid: TagBucket,
    /// Cancelled bucket.
    pub cancelled: TagBucket,
}

impl TagStatistics {
    /// Returns the bucket for a tag.
    #[must_use]
    pub fn bucket(&self, tag: Tag) -> TagBucket {
        match tag {
            Tag::Pending => self.pending,
            Tag::Overdue => self.overdue,
            Tag::Paid => self.paid,
            Tag::Cancelled => self.cancelled,
        }
    }
}

/// Aggregates tag statistics over a set of transactions as of `today`.
///
/// The paid bucket's total reconciles exactly with the balance
/// calculator's paid volume for the same rows.
#[must_use]
pub fn aggregate(transactions: &[Transaction], today: NaiveDate) -> TagStatistics {
    let mut stats = TagStatistics::default();
    for tx in transactions {
        match classify(tx, today) {
            Tag::Pending => stats.pending.add(tx.total_amount),
            Tag::Overdue => stats.overdue.add(tx.total_amount),
            Tag::Paid => stats.paid.add(tx.total_amount),
            Tag::Cancelled => stats.cancelled.add(tx.total_amount),
        }
    }
    stats
}
