//! Spectral estimate containers

use crate::error::{Result, SpectrumError};

/// Parallel frequency/power arrays produced by one Welch run
///
/// `frequencies` is ascending. It starts relative to baseband (Hz) and is moved
/// to absolute MHz by [`SpectralEstimate::to_absolute_mhz`]. `power` holds
/// linear magnitude-squared values.
///
/// Both arrays always have the same length, so any bin index found on the
/// frequency axis is valid for `power`. The default value is the empty estimate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectralEstimate {
    frequencies: Vec<f64>,
    power: Vec<f64>,
}

impl SpectralEstimate {
    /// Pair up kernel output, rejecting mismatched or odd lengths
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> Result<Self> {
        if frequencies.len() != power.len() {
            return Err(SpectrumError::DataProcessing(format!(
                "frequency axis has {} bins but power has {}",
                frequencies.len(),
                power.len()
            )));
        }
        if power.is_empty() || power.len() % 2 != 0 {
            return Err(SpectrumError::InvalidParameter(format!(
                "estimate length must be even and positive (got {})",
                power.len()
            )));
        }
        Ok(Self { frequencies, power })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// In-place access to the power values; the length cannot change
    pub fn power_mut(&mut self) -> &mut [f64] {
        &mut self.power
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Shift a baseband axis to absolute frequency: (f + center) / 1e6
    pub fn to_absolute_mhz(&mut self, center_frequency_hz: f64) {
        for f in self.frequencies.iter_mut() {
            *f = (*f + center_frequency_hz) / 1e6;
        }
    }

    /// Spacing between the first two bins
    pub fn frequency_step(&self) -> f64 {
        if self.frequencies.len() > 1 {
            (self.frequencies[1] - self.frequencies[0]).abs()
        } else {
            0.0
        }
    }
}

/// Coarse and fine estimates of one acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatePair {
    pub coarse: SpectralEstimate,
    pub fine: SpectralEstimate,
    pub center_frequency_hz: f64,
}

impl EstimatePair {
    pub fn center_frequency_mhz(&self) -> f64 {
        self.center_frequency_hz / 1e6
    }

    /// Move both axes to absolute MHz
    pub fn to_absolute_mhz(&mut self) {
        self.coarse.to_absolute_mhz(self.center_frequency_hz);
        self.fine.to_absolute_mhz(self.center_frequency_hz);
    }
}
