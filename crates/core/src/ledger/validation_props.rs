//! Property-based tests for the mixed-payment split validator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::validation::{split_tolerance, validate_mixed_split};

/// Strategy to generate a positive amount from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a non-negative adjustment up to 10,000.00.
fn adjustment() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a split fraction in cents of the total.
fn split_cents() -> impl Strategy<Value = i64> {
    0i64..100_000_000i64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any exact split of the total passes, regardless of how the total
    /// divides between PIX and cash.
    #[test]
    fn prop_exact_split_passes(
        amount in positive_amount(),
        late_fee in adjustment(),
        pix_cents in split_cents(),
    ) {
        let total = amount + late_fee;
        let pix = Decimal::new(pix_cents, 2).min(total);
        let cash = total - pix;

        prop_assert!(
            validate_mixed_split(amount, late_fee, Decimal::ZERO, pix, cash).is_ok()
        );
    }

    /// A split off by more than the tolerance always fails with
    /// `InvalidSplit` carrying the expected total.
    #[test]
    fn prop_off_split_fails(
        amount in positive_amount(),
        gap_cents in 2i64..1_000_000i64,
    ) {
        let gap = Decimal::new(gap_cents, 2);
        let result = validate_mixed_split(
            amount,
            Decimal::ZERO,
            Decimal::ZERO,
            amount + gap,
            Decimal::ZERO,
        );

        prop_assert!(
            matches!(
                result,
                Err(LedgerError::InvalidSplit { expected, .. }) if expected == amount
            ),
            "split off by {gap} should be rejected, got: {result:?}"
        );
    }

    /// A split inside the tolerance band passes.
    #[test]
    fn prop_within_tolerance_passes(
        amount in positive_amount(),
    ) {
        let result = validate_mixed_split(
            amount,
            Decimal::ZERO,
            Decimal::ZERO,
            amount + split_tolerance(),
            Decimal::ZERO,
        );
        prop_assert!(result.is_ok());
    }

    /// The discount reduces the expected total symmetrically with the
    /// late fee increasing it.
    #[test]
    fn prop_fee_and_discount_shift_expected_total(
        amount in positive_amount(),
        late_fee in adjustment(),
        discount in adjustment(),
    ) {
        prop_assume!(discount < amount);
        let total = amount + late_fee - discount;

        prop_assert!(
            validate_mixed_split(amount, late_fee, discount, total, Decimal::ZERO).is_ok()
        );
        prop_assert!(
            validate_mixed_split(amount, late_fee, discount, Decimal::ZERO, total).is_ok()
        );
    }
}
