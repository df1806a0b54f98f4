//! Re-centering of transform-ordered power arrays

use super::estimate::SpectralEstimate;
use crate::error::{try_zeroed, Result, SpectrumError};

/// Swap the two halves of `power` so the zero-frequency bin sits at n/2
///
/// Applying it twice restores the original order.
pub fn reorder_power(power: &mut [f64]) -> Result<()> {
    let length = power.len();
    if length == 0 || length % 2 != 0 {
        return Err(SpectrumError::InvalidParameter(format!(
            "re-centering needs an even, non-empty array (got {})",
            length
        )));
    }

    let half = length / 2;
    let mut scratch = try_zeroed("reorder scratch", length)?;
    scratch[..half].copy_from_slice(&power[half..]);
    scratch[half..].copy_from_slice(&power[..half]);
    power.copy_from_slice(&scratch);

    Ok(())
}

/// Re-center an estimate's power in place; the frequency axis is left untouched
pub fn reorder(estimate: &mut SpectralEstimate) -> Result<()> {
    reorder_power(estimate.power_mut())
}
