//! Audit trail codec for the transaction notes field.
//!
//! A transaction carries one free-text field holding both the user-authored
//! notes and a machine-appended history log. The encoding is:
//!
//! ```text
//! <notes>
//!
//! --- HISTORY ---
//! [APPROVAL - 2026-01-10 14:30] a1b2...: Approved
//! [MODIFICATION - 2026-01-11 09:12] a1b2...: amount: R$ 100.00 -> R$ 150.00
//! ```
//!
//! When no history exists the field is the bare notes. This module also
//! builds the field-level modification diff recorded on updates.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use quadra_shared::types::money::{approx_eq, format_brl};

use super::types::Transaction;

/// Marker separating user notes from the history log.
pub const HISTORY_MARKER: &str = "--- HISTORY ---";

/// Exact delimiter written by `encode` (blank line, marker, newline).
const HISTORY_DELIMITER: &str = "\n\n--- HISTORY ---\n";

/// Legacy stamp some callers prepended to the notes section.
const CREATED_BY_PREFIX: &str = "Created by ";

/// Timestamp format used inside history lines.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Display labels for the recognized diffable fields, keyed by field name.
static FIELD_LABELS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("description", "description"),
        ("amount", "amount"),
        ("late_fee", "late fee"),
        ("discount", "discount"),
        ("due_date", "due date"),
        ("payment_method", "payment method"),
        ("category", "category"),
        ("pix_amount", "PIX amount"),
        ("cash_amount", "cash amount"),
        ("mixed_payment", "mixed payment"),
        ("private", "private"),
    ])
});

/// Returns the display label for a recognized field, if any.
///
/// The `notes` field is deliberately absent: it is never diffed.
#[must_use]
pub fn field_label(field: &str) -> Option<&'static str> {
    FIELD_LABELS.get(field).copied()
}

/// Action recorded by a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A privileged field edit.
    Modification,
    /// Transition into Paid via approval.
    Approval,
    /// Transition into Cancelled.
    Cancellation,
    /// Transition into Paid via cash confirmation.
    Confirmation,
    /// Soft deletion.
    Deletion,
}

impl AuditAction {
    /// Returns the uppercase tag used in the encoded line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modification => "MODIFICATION",
            Self::Approval => "APPROVAL",
            Self::Cancellation => "CANCELLATION",
            Self::Confirmation => "CONFIRMATION",
            Self::Deletion => "DELETION",
        }
    }

    /// Parses an action tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MODIFICATION" => Some(Self::Modification),
            "APPROVAL" => Some(Self::Approval),
            "CANCELLATION" => Some(Self::Cancellation),
            "CONFIRMATION" => Some(Self::Confirmation),
            "DELETION" => Some(Self::Deletion),
            _ => None,
        }
    }
}

/// One structured history entry: `[<ACTION> - <timestamp>] <actor>: <details>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    /// The recorded action.
    pub action: AuditAction,
    /// Timestamp as rendered in the line (`%Y-%m-%d %H:%M`).
    pub timestamp: String,
    /// The acting user, rendered as text.
    pub actor: String,
    /// Human-readable details.
    pub details: String,
}

impl HistoryLine {
    /// Builds a new history line stamped at `at`.
    #[must_use]
    pub fn new(action: AuditAction, actor: &str, details: &str, at: DateTime<Utc>) -> Self {
        Self {
            action,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            actor: actor.to_string(),
            details: details.to_string(),
        }
    }

    /// Renders the line in its encoded form.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "[{} - {}] {}: {}",
            self.action.as_str(),
            self.timestamp,
            self.actor,
            self.details
        )
    }

    /// Parses an encoded line; returns `None` if it does not match the
    /// grammar.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (header, tail) = rest.split_once("] ")?;
        let (action_str, timestamp) = header.split_once(" - ")?;
        let action = AuditAction::parse(action_str)?;
        let (actor, details) = tail.split_once(": ")?;
        Some(Self {
            action,
            timestamp: timestamp.to_string(),
            actor: actor.to_string(),
            details: details.to_string(),
        })
    }
}

/// Decoded view of the notes field: user notes plus ordered history lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditTrail {
    /// The user-authored notes section.
    pub notes: String,
    /// Raw history lines, oldest first.
    pub history: Vec<String>,
}

impl AuditTrail {
    /// Decodes a raw notes field.
    ///
    /// Splits on the first history marker, strips a leading legacy
    /// created-by stamp from the notes section, and keeps non-empty
    /// history lines in order.
    #[must_use]
    pub fn decode(raw: &str) -> Self {
        let (notes, rest) = match raw.split_once(HISTORY_DELIMITER) {
            Some((notes, rest)) => (notes.to_string(), rest),
            None => match raw.find(HISTORY_MARKER) {
                // Marker present but with non-standard spacing (legacy data).
                Some(idx) => (
                    raw[..idx].trim_end().to_string(),
                    raw[idx + HISTORY_MARKER.len()..].trim_start_matches('\n'),
                ),
                None => (raw.to_string(), ""),
            },
        };

        let history = rest
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(ToString::to_string)
            .collect();

        Self {
            notes: strip_created_by_stamp(&notes),
            history,
        }
    }

    /// Encodes back into the single text field.
    ///
    /// Omits the marker block entirely when there is no history.
    #[must_use]
    pub fn encode(&self) -> String {
        if self.history.is_empty() {
            return self.notes.clone();
        }
        format!("{}{}{}", self.notes, HISTORY_DELIMITER, self.history.join("\n"))
    }

    /// Parses the history lines into structured entries, skipping any
    /// that do not match the grammar.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryLine> {
        self.history
            .iter()
            .filter_map(|line| HistoryLine::parse(line))
            .collect()
    }

    /// Appends a structured line to the history.
    pub fn push(&mut self, line: &HistoryLine) {
        self.history.push(line.render());
    }
}

/// Appends one history line to a raw notes field.
///
/// Equivalent to decode, push, encode.
#[must_use]
pub fn append(raw: &str, line: &HistoryLine) -> String {
    let mut trail = AuditTrail::decode(raw);
    trail.push(line);
    trail.encode()
}

/// Drops a leading legacy `Created by ...` stamp line from the notes.
fn strip_created_by_stamp(notes: &str) -> String {
    if !notes.starts_with(CREATED_BY_PREFIX) {
        return notes.to_string();
    }
    match notes.split_once('\n') {
        Some((_, rest)) => rest.trim_start_matches('\n').to_string(),
        None => String::new(),
    }
}

// ============================================================================
// Field-level modification diff
// ============================================================================

/// Numeric tolerance below which a money field is considered unchanged.
fn diff_tolerance() -> Decimal {
    Decimal::new(1, 3)
}

/// One recognized field whose normalized value changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Display label from the recognized-field table.
    pub label: &'static str,
    /// Value before the edit, formatted for display.
    pub before: String,
    /// Value after the edit, formatted for display.
    pub after: String,
}

fn money_changed(before: Decimal, after: Decimal) -> bool {
    !approx_eq(before, after, diff_tolerance())
}

fn fmt_bool(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}

/// Computes the field-level diff between two versions of a transaction.
///
/// Only recognized fields participate; a field is reported only when its
/// normalized value actually changed (money within 0.001, dates by calendar
/// day, booleans coerced). The `notes` field is never diffed.
#[must_use]
pub fn diff_fields(before: &Transaction, after: &Transaction) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut push = |field: &str, before: String, after: String| {
        if let Some(label) = field_label(field) {
            changes.push(FieldChange {
                label,
                before,
                after,
            });
        }
    };

    if before.description.trim() != after.description.trim() {
        push(
            "description",
            before.description.clone(),
            after.description.clone(),
        );
    }
    if money_changed(before.amount, after.amount) {
        push("amount", format_brl(before.amount), format_brl(after.amount));
    }
    if money_changed(before.late_fee, after.late_fee) {
        push(
            "late_fee",
            format_brl(before.late_fee),
            format_brl(after.late_fee),
        );
    }
    if money_changed(before.discount, after.discount) {
        push(
            "discount",
            format_brl(before.discount),
            format_brl(after.discount),
        );
    }
    if before.due_date != after.due_date {
        push(
            "due_date",
            before.due_date.format("%Y-%m-%d").to_string(),
            after.due_date.format("%Y-%m-%d").to_string(),
        );
    }
    if before.payment_method != after.payment_method {
        push(
            "payment_method",
            before.payment_method.label().to_string(),
            after.payment_method.label().to_string(),
        );
    }
    if before.category != after.category {
        push(
            "category",
            before.category.label().to_string(),
            after.category.label().to_string(),
        );
    }
    if money_changed(before.pix_amount, after.pix_amount) {
        push(
            "pix_amount",
            format_brl(before.pix_amount),
            format_brl(after.pix_amount),
        );
    }
    if money_changed(before.cash_amount, after.cash_amount) {
        push(
            "cash_amount",
            format_brl(before.cash_amount),
            format_brl(after.cash_amount),
        );
    }
    if before.mixed_payment != after.mixed_payment {
        push(
            "mixed_payment",
            fmt_bool(before.mixed_payment).to_string(),
            fmt_bool(after.mixed_payment).to_string(),
        );
    }
    if before.private != after.private {
        push(
            "private",
            fmt_bool(before.private).to_string(),
            fmt_bool(after.private).to_string(),
        );
    }

    changes
}

/// Renders a modification diff as the details of a MODIFICATION line.
#[must_use]
pub fn format_modification(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(|c| format!("{}: {} -> {}", c.label, c.before, c.after))
        .collect::<Vec<_>>()
        .join("; ")
}
