//! DC spike replacement from a frequency-offset second acquisition
//!
//! The hardware spike sits at the tuner's center frequency, so two captures
//! tuned a little apart have their spikes at different absolute frequencies.
//! The spike region of acquisition A is rebuilt from the bins of acquisition B
//! that fall at the same absolute frequency, after removing the constant gain
//! difference between the two captures.
//!
//! Both estimates must already be on an absolute frequency axis (MHz).

use super::stats::{from_db, nearest_index, to_db};
use crate::spectrum::SpectralEstimate;
use thiserror::Error;

/// Number of bin pairs averaged for the gain offset
const CALIBRATION_BINS: usize = 10;

/// Gap between the correction region and the calibration window
const CALIBRATION_GAP: usize = 5;

/// Why a dual correction was not applied
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrectionError {
    #[error("estimate is empty")]
    EmptyInput,

    #[error("correction width must be positive")]
    InvalidWidth,

    #[error("no bin near center frequency {0} MHz")]
    NoCenter(f64),

    #[error("frequency step is not positive ({0})")]
    NonPositiveStep(f64),
}

/// What a successful correction did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualCorrection {
    /// Spike bin in the corrected estimate
    pub center_index: usize,
    /// Spike bin in the reference estimate
    pub reference_center_index: usize,
    /// Gain offset A - B in dB added to every copied value
    pub offset_db: f64,
    pub bins_replaced: usize,
}

/// Rebuild `target`'s spike region from `reference`
///
/// # Arguments
/// * `target` - Estimate A, corrected in place
/// * `target_center_mhz` - Tuner frequency of A
/// * `reference` - Estimate B, read only
/// * `reference_center_mhz` - Tuner frequency of B
/// * `width` - Bins replaced on each side of A's center
pub fn apply_dual_correction(
    target: &mut SpectralEstimate,
    target_center_mhz: f64,
    reference: &SpectralEstimate,
    reference_center_mhz: f64,
    width: usize,
) -> Result<DualCorrection, CorrectionError> {
    if target.is_empty() || reference.is_empty() {
        return Err(CorrectionError::EmptyInput);
    }
    if width == 0 {
        return Err(CorrectionError::InvalidWidth);
    }

    let center_index = nearest_index(target.frequencies(), target_center_mhz)
        .ok_or(CorrectionError::NoCenter(target_center_mhz))?;
    let reference_center_index = nearest_index(reference.frequencies(), reference_center_mhz)
        .ok_or(CorrectionError::NoCenter(reference_center_mhz))?;

    for step in [target.frequency_step(), reference.frequency_step()] {
        if !(step > 0.0) {
            return Err(CorrectionError::NonPositiveStep(step));
        }
    }

    let offset_db = calibration_offset(target, reference, center_index, width);

    let length = target.len();
    let mut bins_replaced = 0;
    let first = center_index.saturating_sub(width);
    let last = (center_index + width).min(length - 1);
    for idx in first..=last {
        let freq = target.frequencies()[idx];
        if let Some(matched) = nearest_index(reference.frequencies(), freq) {
            let corrected_db = to_db(reference.power()[matched]) + offset_db;
            target.power_mut()[idx] = from_db(corrected_db);
            bins_replaced += 1;
        }
    }

    Ok(DualCorrection {
        center_index,
        reference_center_index,
        offset_db,
        bins_replaced,
    })
}

/// Mean dB difference A - B over frequency-matched bins just outside the
/// correction region; 0 when no usable pair exists
pub fn calibration_offset(
    target: &SpectralEstimate,
    reference: &SpectralEstimate,
    center_index: usize,
    width: usize,
) -> f64 {
    let start = center_index + width + CALIBRATION_GAP;
    let mut sum = 0.0;
    let mut count = 0usize;

    for idx in (start..start + CALIBRATION_BINS).take_while(|&i| i < target.len()) {
        let freq = target.frequencies()[idx];
        let Some(matched) = nearest_index(reference.frequencies(), freq) else {
            continue;
        };
        let diff = to_db(target.power()[idx]) - to_db(reference.power()[matched]);
        // A zero-power bin gives ±inf and would swamp the average
        if diff.is_finite() {
            sum += diff;
            count += 1;
        }
    }

    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 1024;
    const STEP_MHZ: f64 = 0.01;

    fn axis(center_mhz: f64) -> Vec<f64> {
        (0..N)
            .map(|k| center_mhz + (k as f64 - (N / 2) as f64) * STEP_MHZ)
            .collect()
    }

    fn flat(center_mhz: f64, level_db: f64) -> SpectralEstimate {
        SpectralEstimate::new(axis(center_mhz), vec![from_db(level_db); N]).unwrap()
    }

    #[test]
    fn test_spike_replaced_with_calibrated_reference() {
        let k_db = 6.0;
        let mut a = flat(98.0, -60.0);
        a.power_mut()[N / 2] = from_db(-10.0);

        // B sits k dB above A and carries structure inside A's spike region
        let mut b = flat(100.0, -60.0 + k_db);
        let b_idx_of_98 = N / 2 - 200;
        b.power_mut()[b_idx_of_98] = from_db(-40.0);
        b.power_mut()[b_idx_of_98 + 3] = from_db(-45.0);

        let result = apply_dual_correction(&mut a, 98.0, &b, 100.0, 50).unwrap();

        assert_eq!(result.center_index, N / 2);
        assert_eq!(result.reference_center_index, N / 2);
        assert!((result.offset_db + k_db).abs() < 1e-9);
        assert_eq!(result.bins_replaced, 101);

        // Calibrated, not raw: B's values shifted down by k dB
        assert!((to_db(a.power()[N / 2]) - (-40.0 - k_db)).abs() < 1e-9);
        assert!((to_db(a.power()[N / 2 + 3]) - (-45.0 - k_db)).abs() < 1e-9);
        assert!((to_db(a.power()[N / 2 + 10]) - -60.0).abs() < 1e-9);
        assert!((to_db(a.power()[N / 2 - 50]) - -60.0).abs() < 1e-9);
    }

    #[test]
    fn test_outside_region_untouched() {
        let mut a = flat(98.0, -60.0);
        a.power_mut()[N / 2 + 51] = 123.0;
        a.power_mut()[N / 2 - 51] = 321.0;
        let b = flat(100.0, -50.0);

        apply_dual_correction(&mut a, 98.0, &b, 100.0, 50).unwrap();

        assert_eq!(a.power()[N / 2 + 51], 123.0);
        assert_eq!(a.power()[N / 2 - 51], 321.0);
    }

    #[test]
    fn test_region_clipped_at_edges() {
        let mut a = flat(98.0, -60.0);
        let b = flat(98.0, -60.0);
        // Center near the top edge: only bins up to N - 1 are visited
        let result = apply_dual_correction(&mut a, 98.0 + 510.0 * STEP_MHZ, &b, 98.0, 50).unwrap();
        assert_eq!(result.center_index, N - 2);
        assert_eq!(result.bins_replaced, 52);
        // Calibration window falls off the end
        assert_eq!(result.offset_db, 0.0);
    }

    #[test]
    fn test_zero_power_pairs_skipped_in_calibration() {
        let a = flat(98.0, -60.0);
        let mut b = flat(100.0, -63.0);
        let start = N / 2 + 50 + 5 - 200;
        b.power_mut()[start] = 0.0;
        let offset = calibration_offset(&a, &b, N / 2, 50);
        assert!((offset - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_failures() {
        let b = flat(100.0, -60.0);

        let mut empty = SpectralEstimate::default();
        assert_eq!(
            apply_dual_correction(&mut empty, 98.0, &b, 100.0, 50),
            Err(CorrectionError::EmptyInput)
        );

        let mut a = flat(98.0, -60.0);
        assert_eq!(
            apply_dual_correction(&mut a, 98.0, &b, 100.0, 0),
            Err(CorrectionError::InvalidWidth)
        );

        let mut degenerate =
            SpectralEstimate::new(vec![98.0; N], vec![1.0; N]).unwrap();
        assert_eq!(
            apply_dual_correction(&mut degenerate, 98.0, &b, 100.0, 50),
            Err(CorrectionError::NonPositiveStep(0.0))
        );
    }
}
