/// Scales the remaining hours by the share of remaining work still left.
///
/// With `prior_progress` at 100 or above there is no remaining work to scale
/// and the estimate is 0.
pub fn recompute_expected_time(prior_progress: i64, expected_time: f64, new_progress: i64) -> f64 {
    let prior_remaining = 100 - prior_progress;
    if prior_remaining <= 0 {
        return 0.0;
    }
    let remaining = 100 - new_progress;
    expected_time * remaining as f64 / prior_remaining as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scales_remaining_hours_linearly() {
        assert_eq!(recompute_expected_time(40, 10.0, 70), 5.0);
        assert_eq!(recompute_expected_time(0, 8.0, 50), 4.0);
        assert_eq!(recompute_expected_time(0, 8.0, 100), 0.0);
    }

    #[test]
    fn completed_task_never_divides_by_zero() {
        assert_eq!(recompute_expected_time(100, 10.0, 100), 0.0);
        assert_eq!(recompute_expected_time(100, 10.0, 30), 0.0);
    }

    #[test]
    fn unchanged_progress_keeps_estimate() {
        assert_eq!(recompute_expected_time(25, 12.0, 25), 12.0);
    }

    proptest! {
        #[test]
        fn estimate_is_finite_and_bounded(
            prior in 0i64..=100i64,
            expected in 0.0f64..1000.0f64,
            next in 0i64..=100i64,
        ) {
            let value = recompute_expected_time(prior, expected, next);
            prop_assert!(value.is_finite());
            if next >= prior && prior < 100 {
                prop_assert!(value <= expected + 1e-9);
            }
            if next == 100 {
                prop_assert_eq!(value, 0.0);
            }
        }
    }
}
