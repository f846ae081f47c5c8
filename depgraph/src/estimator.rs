// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Percentage arithmetic, with defined rounding.

/// Computes `affected / total` as a percentage, rounded half-away-from-zero
/// to one decimal place. Returns `0.0` if `total` is zero.
pub fn percentage(affected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = (affected as f64 / total as f64) * 1000.0;
    raw.round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matches_spec_examples() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(0, 100), 0.0);
        assert_eq!(percentage(100, 100), 100.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(1, 1000), 0.1);
    }

    proptest! {
        #[test]
        fn always_matches_the_defined_formula(affected in 0usize..10_000, total in 0usize..10_000) {
            let expected = if total == 0 {
                0.0
            } else {
                ((affected as f64 / total as f64) * 1000.0).round() / 10.0
            };
            prop_assert_eq!(percentage(affected, total), expected);
        }

        #[test]
        fn never_negative_and_bounded_when_affected_le_total(total in 1usize..10_000) {
            let affected = total; // affected <= total in well-formed input
            let pct = percentage(affected, total);
            prop_assert!(pct >= 0.0);
            prop_assert!(pct <= 100.0 + f64::EPSILON);
        }
    }
}
