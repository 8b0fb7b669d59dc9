//! Property-based tests for the audit trail codec.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use super::audit::{append, AuditAction, AuditTrail, HistoryLine, HISTORY_MARKER};

/// Strategy for notes that do not contain the history marker and do not
/// start with the legacy created-by stamp.
fn notes_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,]{0,80}".prop_filter("no marker or stamp", |s| {
        !s.contains(HISTORY_MARKER) && !s.starts_with("Created by ")
    })
}

/// Strategy for an audit action.
fn action_strategy() -> impl Strategy<Value = AuditAction> {
    prop_oneof![
        Just(AuditAction::Modification),
        Just(AuditAction::Approval),
        Just(AuditAction::Cancellation),
        Just(AuditAction::Confirmation),
        Just(AuditAction::Deletion),
    ]
}

/// Strategy for single-line detail text without the line grammar tokens.
fn details_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,40}"
}

/// Strategy for a structured history line.
fn line_strategy() -> impl Strategy<Value = HistoryLine> {
    (action_strategy(), details_strategy()).prop_map(|(action, details)| {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 0).unwrap();
        HistoryLine::new(action, "user-1", &details, at)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Round-trip law: decode(encode(notes, lines)) == (notes, lines)
    /// for any notes not containing the history marker.
    #[test]
    fn prop_encode_decode_round_trip(
        notes in notes_strategy(),
        lines in prop::collection::vec(line_strategy(), 0..8),
    ) {
        let trail = AuditTrail {
            notes,
            history: lines.iter().map(HistoryLine::render).collect(),
        };

        let decoded = AuditTrail::decode(&trail.encode());
        prop_assert_eq!(decoded, trail);
    }

    /// Append composes in order: append(append(raw, a), b) yields
    /// history [.., a, b].
    #[test]
    fn prop_append_composes_in_order(
        notes in notes_strategy(),
        a in line_strategy(),
        b in line_strategy(),
    ) {
        let raw = append(&append(&notes, &a), &b);
        let trail = AuditTrail::decode(&raw);

        prop_assert_eq!(trail.notes, notes);
        prop_assert_eq!(trail.history, vec![a.render(), b.render()]);
    }

    /// Every rendered line parses back to itself.
    #[test]
    fn prop_history_line_parse_inverts_render(line in line_strategy()) {
        prop_assert_eq!(HistoryLine::parse(&line.render()), Some(line));
    }

    /// Appending never loses existing history.
    #[test]
    fn prop_append_preserves_existing(
        notes in notes_strategy(),
        existing in prop::collection::vec(line_strategy(), 1..6),
        new_line in line_strategy(),
    ) {
        let mut raw = notes.clone();
        for line in &existing {
            raw = append(&raw, line);
        }
        let appended = append(&raw, &new_line);
        let trail = AuditTrail::decode(&appended);

        prop_assert_eq!(trail.history.len(), existing.len() + 1);
        for (stored, original) in trail.history.iter().zip(existing.iter()) {
            prop_assert_eq!(stored, &original.render());
        }
    }
}
