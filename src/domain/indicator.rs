//! DSA candle-asymmetry indicator.
//!
//! DSA = [(high - open) + (open - low)] / [(high - open)² + (open - low)²],
//! rounded half-up to 6 fractional digits. A flat candle (zero denominator)
//! is defined as exactly 0, not an error.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits of the stored indicator, DECIMAL(10,6) in the table.
pub const DSA_SCALE: u32 = 6;

/// Row-local and total: every (open, high, low) triple has a DSA value.
pub fn compute_dsa(open: Decimal, high: Decimal, low: Decimal) -> Decimal {
    let a = high - open;
    let b = open - low;
    let numerator = a + b;
    let denominator = a * a + b * b;

    let mut dsa = if denominator.is_zero() {
        Decimal::ZERO
    } else {
        (numerator / denominator)
            .round_dp_with_strategy(DSA_SCALE, RoundingStrategy::MidpointAwayFromZero)
    };
    dsa.rescale(DSA_SCALE);
    dsa
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn flat_candle_is_exactly_zero() {
        let dsa = compute_dsa(dec("100.00"), dec("100.00"), dec("100.00"));
        assert_eq!(dsa, Decimal::ZERO);
        assert_eq!(dsa.to_string(), "0.000000");
    }

    #[test]
    fn hand_computed_case() {
        // a = 2.00, b = 1.00, numerator = 3.00, denominator = 5.00
        let dsa = compute_dsa(dec("10.00"), dec("12.00"), dec("9.00"));
        assert_eq!(dsa.to_string(), "0.600000");
    }

    #[test]
    fn result_always_has_six_fractional_digits() {
        let dsa = compute_dsa(dec("10.00"), dec("11.00"), dec("10.00"));
        // a = 1, b = 0 → 1 / 1 = 1
        assert_eq!(dsa.to_string(), "1.000000");
        assert_eq!(dsa.scale(), DSA_SCALE);
    }

    #[test]
    fn negative_numerator_is_preserved() {
        // a = high - open = -1.00, b = open - low = 0.00 on an inverted
        // candle where open sits above high.
        let dsa = compute_dsa(dec("11.00"), dec("10.00"), dec("11.00"));
        assert_eq!(dsa.to_string(), "-1.000000");
    }

    #[test]
    fn rounds_half_up_at_the_sixth_digit() {
        // a = 0.70, b = 0.70: numerator 1.40, denominator 0.98,
        // quotient 1.428571428... → 1.428571
        let dsa = compute_dsa(dec("10.00"), dec("10.70"), dec("9.30"));
        assert_eq!(dsa.to_string(), "1.428571");

        // a = 1.60, b = 1.60: numerator 3.20, denominator 5.12,
        // quotient 0.625 exactly at scale 3, padded to scale 6
        let dsa = compute_dsa(dec("10.00"), dec("11.60"), dec("8.40"));
        assert_eq!(dsa.to_string(), "0.625000");
    }

    #[test]
    fn compensating_moves_divide_by_their_spread() {
        // a = 3.00, b = -3.00: numerator 0, denominator 18 → exactly 0
        let dsa = compute_dsa(dec("10.00"), dec("13.00"), dec("13.00"));
        assert_eq!(dsa.to_string(), "0.000000");
    }
}
