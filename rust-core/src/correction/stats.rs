//! Small statistics over power and frequency arrays

/// Index of the element closest to `value`
///
/// Linear scan; on ties the first minimal-distance index wins. `None` for an
/// empty array.
pub fn nearest_index(array: &[f64], value: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in array.iter().enumerate() {
        let diff = (x - value).abs();
        if diff.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, min_diff)| diff < min_diff) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i)
}

/// Median of `values`, sorting a copy
///
/// Even lengths average the two middle values. `None` when empty or when the
/// copy cannot be allocated.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = Vec::new();
    sorted.try_reserve_exact(values.len()).ok()?;
    sorted.extend_from_slice(values);
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) * 0.5)
    } else {
        Some(sorted[n / 2])
    }
}

/// Smallest value, `None` when empty
pub fn min_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Largest value, `None` when empty
pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// 10·log10 of a linear power value
pub fn to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Inverse of [`to_db`]
pub fn from_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nearest_index() {
        let axis = [-10.0, -5.0, 0.0, 5.0, 10.0];
        assert_eq!(nearest_index(&axis, 3.0), Some(3));
        assert_eq!(nearest_index(&axis, -100.0), Some(0));
        assert_eq!(nearest_index(&axis, 100.0), Some(4));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_nearest_index_tie_takes_first() {
        let axis = [-10.0, -5.0, 0.0, 5.0, 10.0];
        // 2.5 is equally far from 0 and 5
        assert_eq!(nearest_index(&axis, 2.5), Some(2));
        assert_eq!(nearest_index(&[1.0, 1.0, 1.0], 1.0), Some(0));
    }

    #[test]
    fn test_nearest_index_skips_nan() {
        assert_eq!(nearest_index(&[f64::NAN, 4.0, 8.0], 7.0), Some(2));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_extrema() {
        let values = [0.5, -2.0, 9.0, 3.0];
        assert_eq!(min_value(&values), Some(-2.0));
        assert_eq!(max_value(&values), Some(9.0));
        assert_eq!(min_value(&[]), None);
    }

    #[test]
    fn test_db_round_trip() {
        assert!((to_db(100.0) - 20.0).abs() < 1e-12);
        assert!((from_db(-30.0) - 1e-3).abs() < 1e-15);
    }

    proptest! {
        #[test]
        fn median_ignores_input_order(
            values in proptest::collection::vec(-1e3f64..1e3, 1..64),
            seed in any::<u64>(),
        ) {
            let mut shuffled = values.clone();
            // Deterministic permutation from the seed
            let n = shuffled.len();
            let mut state = seed | 1;
            for i in (1..n).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
            prop_assert_eq!(median(&values), median(&shuffled));
        }

        #[test]
        fn median_matches_textbook(values in proptest::collection::vec(-1e3f64..1e3, 1..64)) {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = sorted.len();
            let expected = if n % 2 == 1 {
                sorted[n / 2]
            } else {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            };
            prop_assert_eq!(median(&values), Some(expected));
        }
    }
}
