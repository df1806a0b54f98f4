//! DC spike flattening from a single acquisition
//!
//! This is a heuristic patch, not an interpolation with any statistical
//! grounding. Bins around the spike are overwritten with copies of bins further
//! down the spectrum using empirically tuned offsets: the source starts
//! `width + 13` bins below the center and strides 3 bins per copy while
//! filling downwards, then 2 bins per copy while filling upwards. It trades
//! accuracy for not needing a second capture.

use crate::error::{Result, SpectrumError};

/// Extra distance between the spike and the first source bin
const BASE_OFFSET: isize = 13;

/// Fraction of the estimate length patched on each side in no-peer mode
const WIDTH_FRACTION: f64 = 0.002;

/// Correction width used when no peer acquisition exists
pub fn heuristic_width(length: usize) -> usize {
    (length as f64 * WIDTH_FRACTION) as usize
}

/// Overwrite `width` bins on each side of `center` in place
pub fn apply_single_correction(power: &mut [f64], center: usize, width: usize) -> Result<()> {
    let length = power.len();
    if length == 0 || center >= length || width == 0 {
        return Err(SpectrumError::InvalidParameter(format!(
            "single correction at {} with width {} over {} bins",
            center, width, length
        )));
    }

    let len = length as isize;
    let origin = center as isize - (width as isize + BASE_OFFSET);

    // Downward fill, source strides 3 before each copy
    let mut a = center as isize;
    let mut b = origin;
    for _ in 0..width {
        b -= 3;
        if b >= 0 && a >= 0 && a < len {
            power[a as usize] = power[b as usize];
            a -= 1;
        }
    }

    // Upward fill, source strides 2 after each copy; stops at the first
    // out-of-range pair
    let mut a = center as isize;
    let mut b = origin;
    for _ in 0..width {
        if a < len && b >= 0 && b < len {
            power[a as usize] = power[b as usize];
            a += 1;
            b -= 2;
        }
    }

    Ok(())
}
