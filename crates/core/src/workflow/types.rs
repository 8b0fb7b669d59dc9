//! Workflow domain types: actors, roles, actions and capabilities.
//!
//! The authorization layer hands the ledger an already-validated `Actor`;
//! the ledger still enforces its own domain rules through the capability
//! table defined here, evaluated once per operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use quadra_shared::types::{PropertyId, UserId};

use crate::ledger::types::{Transaction, TransactionStatus};

/// User role in the property-management hierarchy.
///
/// Roles are ordered from lowest to highest privilege.
/// Higher roles can perform all actions of lower roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can only view transactions.
    Viewer = 0,
    /// On-site staff; can create transactions and confirm cash.
    Staff = 1,
    /// Property manager; can approve, cancel and soft-delete.
    Manager = 2,
    /// Full ledger access including privileged overrides.
    Admin = 3,
    /// Platform owner; same ledger powers as admin.
    Owner = 4,
}

impl Role {
    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "staff" => Some(Self::Staff),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Staff => "staff",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Returns true if the role carries the privileged override that
    /// allows editing paid transactions.
    #[must_use]
    pub fn has_override(&self) -> bool {
        *self >= Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger operation subject to capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    /// Create a pending transaction.
    Create,
    /// Edit a pending transaction.
    Update,
    /// Approve a pending transaction into Paid.
    Approve,
    /// Confirm a cash settlement into Paid.
    ConfirmCash,
    /// Cancel a pending transaction.
    Cancel,
    /// Soft-delete a pending or cancelled transaction.
    SoftDelete,
    /// Permanently remove a transaction.
    HardDelete,
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Approve => "approve",
            Self::ConfirmCash => "confirm cash",
            Self::Cancel => "cancel",
            Self::SoftDelete => "soft delete",
            Self::HardDelete => "delete",
        };
        write!(f, "{s}")
    }
}

/// Single capability table keyed by (role, action).
///
/// Replaces the scattered per-operation role checks of the source system.
pub struct CapabilityTable;

impl CapabilityTable {
    /// Returns the minimum role required for an action.
    #[must_use]
    pub fn required_role(action: LedgerAction) -> Role {
        match action {
            LedgerAction::Create | LedgerAction::ConfirmCash => Role::Staff,
            LedgerAction::Update
            | LedgerAction::Approve
            | LedgerAction::Cancel
            | LedgerAction::SoftDelete => Role::Manager,
            LedgerAction::HardDelete => Role::Admin,
        }
    }

    /// Returns true if the role may perform the action.
    #[must_use]
    pub fn allows(role: Role, action: LedgerAction) -> bool {
        role >= Self::required_role(action)
    }
}

/// An authenticated caller, as supplied by the authorization layer.
#[derive(Debug, Clone)]
pub struct Actor {
    /// The user's identity.
    pub id: UserId,
    /// The user's role.
    pub role: Role,
    /// Properties the user may operate on. Empty means unrestricted
    /// (platform-level roles).
    pub property_access: Vec<PropertyId>,
}

impl Actor {
    /// Returns true if the actor may operate on the given property.
    #[must_use]
    pub fn can_access(&self, property_id: PropertyId) -> bool {
        self.property_access.is_empty() || self.property_access.contains(&property_id)
    }
}

/// A validated state transition with its audit data.
///
/// Produced by the lifecycle service, applied to the persisted record by
/// the manager inside a status-conditioned write.
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// Approve a pending transaction into Paid.
    Approve {
        /// The approving user.
        approved_by: UserId,
        /// When the approval happened.
        approved_at: DateTime<Utc>,
    },
    /// Confirm a cash settlement into Paid.
    ConfirmCash {
        /// The confirming user.
        confirmed_by: UserId,
        /// When the confirmation happened.
        confirmed_at: DateTime<Utc>,
    },
    /// Cancel a pending transaction.
    Cancel {
        /// The cancelling user.
        cancelled_by: UserId,
        /// When the cancellation happened.
        cancelled_at: DateTime<Utc>,
    },
    /// Soft-delete a pending or cancelled transaction.
    SoftDelete,
}

impl LifecycleAction {
    /// Returns the status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> TransactionStatus {
        match self {
            Self::Approve { .. } | Self::ConfirmCash { .. } => TransactionStatus::Paid,
            Self::Cancel { .. } => TransactionStatus::Cancelled,
            Self::SoftDelete => TransactionStatus::Deleted,
        }
    }

    /// Applies the transition to a transaction record in place.
    pub fn apply(&self, tx: &mut Transaction) {
        tx.status = self.new_status();
        match self {
            Self::Approve {
                approved_by,
                approved_at,
            } => {
                tx.approved_by = Some(*approved_by);
                tx.approved_at = Some(*approved_at);
                tx.paid_date = Some(approved_at.date_naive());
            }
            Self::ConfirmCash {
                confirmed_by,
                confirmed_at,
            } => {
                tx.cash_confirmed = true;
                tx.cash_confirmed_by = Some(*confirmed_by);
                tx.cash_confirmed_at = Some(*confirmed_at);
                tx.paid_date = Some(confirmed_at.date_naive());
            }
            Self::Cancel {
                cancelled_by,
                cancelled_at,
            } => {
                tx.cancelled_by = Some(*cancelled_by);
                tx.cancelled_at = Some(*cancelled_at);
            }
            Self::SoftDelete => {}
        }
    }
}
