//! Decimal money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; these helpers cover rounding,
//! tolerance comparison, and display formatting.

use rust_decimal::Decimal;

/// Rounds an amount to cents (2 decimal places, banker's rounding).
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Returns true if two amounts are equal within the given tolerance.
#[must_use]
pub fn approx_eq(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Formats an amount for display in reais, e.g. `R$ 1250.00`.
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    format!("R$ {:.2}", round_cents(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(dec!(10.005)), dec!(10.00));
        assert_eq!(round_cents(dec!(10.015)), dec!(10.02));
        assert_eq!(round_cents(dec!(10.1)), dec!(10.10));
    }

    #[test]
    fn test_approx_eq_within_tolerance() {
        assert!(approx_eq(dec!(100.00), dec!(100.009), dec!(0.01)));
        assert!(approx_eq(dec!(100.00), dec!(99.991), dec!(0.01)));
        assert!(!approx_eq(dec!(100.00), dec!(100.02), dec!(0.01)));
    }

    #[test]
    fn test_approx_eq_exact() {
        assert!(approx_eq(dec!(50), dec!(50), Decimal::ZERO));
        assert!(!approx_eq(dec!(50), dec!(50.001), Decimal::ZERO));
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec!(1250)), "R$ 1250.00");
        assert_eq!(format_brl(dec!(0.5)), "R$ 0.50");
        assert_eq!(format_brl(dec!(-30.25)), "R$ -30.25");
    }
}
