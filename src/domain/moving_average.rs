//! Trailing moving average of closing price.
//!
//! O(1) per row via a running sum with eviction. The first rows of a series
//! use a shrinking window (1, 2, ... elements) rather than being skipped.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Trailing window length of the stored average.
pub const MA_WINDOW: usize = 5;

/// Fractional digits of the stored average, DECIMAL(10,2) in the table.
pub const MA_SCALE: u32 = 2;

/// Compute the trailing windowed mean over one stock's series.
///
/// The input must already be sorted ascending by date; partitioning per
/// stock id and ordering are the caller's responsibility. Position `i`
/// averages the range `[max(0, i - window + 1), i]`, rounded half-up to
/// two fractional digits.
pub fn compute_trailing_averages(
    series: &[(NaiveDate, Decimal)],
    window: usize,
) -> Vec<(NaiveDate, Decimal)> {
    if window == 0 {
        return Vec::new();
    }

    let mut averages = Vec::with_capacity(series.len());
    let mut running = Decimal::ZERO;

    for (i, &(date, close)) in series.iter().enumerate() {
        running += close;
        if i >= window {
            running -= series[i - window].1;
        }
        let count = Decimal::from(i.min(window - 1) + 1);
        let mut average = (running / count)
            .round_dp_with_strategy(MA_SCALE, RoundingStrategy::MidpointAwayFromZero);
        average.rescale(MA_SCALE);
        averages.push((date, average));
    }

    averages
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(closes: &[&str]) -> Vec<(NaiveDate, Decimal)> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                (
                    NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                    c.parse().unwrap(),
                )
            })
            .collect()
    }

    fn averages(closes: &[&str]) -> Vec<String> {
        compute_trailing_averages(&series(closes), MA_WINDOW)
            .into_iter()
            .map(|(_, avg)| avg.to_string())
            .collect()
    }

    #[test]
    fn shrinking_window_then_full_window() {
        assert_eq!(
            averages(&["10", "12", "11", "13", "14", "16"]),
            vec!["10.00", "11.00", "11.00", "11.50", "12.00", "13.20"]
        );
    }

    #[test]
    fn dates_pass_through_in_order() {
        let input = series(&["10", "20", "30"]);
        let output = compute_trailing_averages(&input, MA_WINDOW);
        let dates: Vec<NaiveDate> = output.iter().map(|&(d, _)| d).collect();
        let expected: Vec<NaiveDate> = input.iter().map(|&(d, _)| d).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn window_one_echoes_the_closes() {
        let output = compute_trailing_averages(&series(&["10.5", "20", "30.25"]), 1);
        let values: Vec<String> = output.into_iter().map(|(_, a)| a.to_string()).collect();
        assert_eq!(values, vec!["10.50", "20.00", "30.25"]);
    }

    #[test]
    fn eviction_matches_naive_recompute() {
        let input = series(&["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        let streamed = compute_trailing_averages(&input, 3);
        for (i, &(_, avg)) in streamed.iter().enumerate() {
            let start = i.saturating_sub(2);
            let window = &input[start..=i];
            let sum: Decimal = window.iter().map(|&(_, c)| c).sum();
            let mut expected = (sum / Decimal::from(window.len()))
                .round_dp_with_strategy(MA_SCALE, RoundingStrategy::MidpointAwayFromZero);
            expected.rescale(MA_SCALE);
            assert_eq!(avg, expected);
        }
    }

    #[test]
    fn rounds_half_up_at_the_second_digit() {
        // 10.00 + 10.01 + 10.01 = 30.02, / 3 = 10.00666... → 10.01
        // and the two-element prefix 20.01 / 2 = 10.005 → 10.01 (half-up)
        assert_eq!(
            averages(&["10.00", "10.01", "10.01"]),
            vec!["10.00", "10.01", "10.01"]
        );
    }

    #[test]
    fn empty_series_yields_empty_output() {
        assert!(compute_trailing_averages(&[], MA_WINDOW).is_empty());
    }

    #[test]
    fn zero_window_yields_empty_output() {
        assert!(compute_trailing_averages(&series(&["10", "20"]), 0).is_empty());
    }

    proptest! {
        #[test]
        fn one_average_per_observation(closes in proptest::collection::vec(0u32..100_000, 0..40)) {
            let input: Vec<(NaiveDate, Decimal)> = closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    (
                        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                            + chrono::Duration::days(i as i64),
                        Decimal::new(c as i64, 2),
                    )
                })
                .collect();
            let output = compute_trailing_averages(&input, MA_WINDOW);
            prop_assert_eq!(output.len(), input.len());

            // Every average lies within the bounds of its window.
            for (i, &(_, avg)) in output.iter().enumerate() {
                let start = i.saturating_sub(MA_WINDOW - 1);
                let window = &input[start..=i];
                let min = window.iter().map(|&(_, c)| c).min().unwrap();
                let max = window.iter().map(|&(_, c)| c).max().unwrap();
                // Half-up rounding can nudge past the bound by at most 0.005.
                let slack = Decimal::new(5, 3);
                prop_assert!(avg >= min - slack && avg <= max + slack);
            }
        }
    }
}
