//! Welch power spectral density estimation
//!
//! [`PsdKernel`] is the numeric primitive: segmentation, windowing and
//! overlapped averaging. [`SpectralEstimator`] wraps a kernel with the
//! checks the pipeline relies on (even segment length, matching output size).
//!
//! Kernel output convention: the frequency axis is ascending, from -fs/2 to
//! fs/2 - fs/n, while power stays in transform order with DC at index 0.
//! Only the power array is re-centered afterwards.

use super::estimate::{EstimatePair, SpectralEstimate};
use super::fft::FftEngine;
use super::window::{generate_window, window_power, WindowType};
use crate::config::AcquisitionContext;
use crate::error::{try_zeroed, Result, SpectrumError};
use ndarray::Array1;
use num_complex::Complex64;

/// Averaged-periodogram PSD primitive
pub trait PsdKernel: Send + Sync {
    /// Estimate the PSD of `samples`
    ///
    /// # Returns
    /// `(frequencies, power)`, both `segment_len` long
    fn estimate(
        &self,
        samples: &[Complex64],
        sample_rate: f64,
        segment_len: usize,
        overlap: usize,
        window: WindowType,
    ) -> Result<(Vec<f64>, Vec<f64>)>;
}

/// Density-scaled Welch estimator over complex samples
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchKernel;

impl PsdKernel for WelchKernel {
    fn estimate(
        &self,
        samples: &[Complex64],
        sample_rate: f64,
        segment_len: usize,
        overlap: usize,
        window: WindowType,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        if samples.is_empty() {
            return Err(SpectrumError::NullInput("sample buffer is empty".into()));
        }
        if segment_len == 0 || overlap >= segment_len {
            return Err(SpectrumError::InvalidParameter(format!(
                "segment length {} with overlap {}",
                segment_len, overlap
            )));
        }

        let coefficients = generate_window(window, segment_len)?;
        let mut engine = FftEngine::new(segment_len)?;
        let mut acc = Array1::from_vec(try_zeroed("welch accumulator", segment_len)?);

        // Short captures become one zero-padded segment
        let step = segment_len - overlap;
        let mut segments = 0usize;
        if samples.len() < segment_len {
            engine.accumulate_power(samples, &coefficients, &mut acc);
            segments = 1;
        } else {
            let mut start = 0;
            while start + segment_len <= samples.len() {
                engine.accumulate_power(
                    &samples[start..start + segment_len],
                    &coefficients,
                    &mut acc,
                );
                segments += 1;
                start += step;
            }
        }

        acc *= 1.0 / (sample_rate * window_power(&coefficients) * segments as f64);

        let frequencies = baseband_axis(segment_len, sample_rate)?;
        Ok((frequencies, acc.into_raw_vec()))
    }
}

/// Ascending baseband frequency axis: (k - n/2) * fs / n
pub fn baseband_axis(segment_len: usize, sample_rate: f64) -> Result<Vec<f64>> {
    let mut axis = try_zeroed("frequency axis", segment_len)?;
    let half = (segment_len / 2) as f64;
    let resolution = sample_rate / segment_len as f64;
    for (k, f) in axis.iter_mut().enumerate() {
        *f = (k as f64 - half) * resolution;
    }
    Ok(axis)
}

/// Produces validated estimates at a chosen resolution
pub struct SpectralEstimator<'a> {
    kernel: &'a dyn PsdKernel,
    sample_rate: f64,
    overlap: usize,
    window: WindowType,
}

impl<'a> SpectralEstimator<'a> {
    pub fn new(
        kernel: &'a dyn PsdKernel,
        sample_rate: f64,
        overlap: usize,
        window: WindowType,
    ) -> Self {
        Self {
            kernel,
            sample_rate,
            overlap,
            window,
        }
    }

    /// Estimator configured from an acquisition's settings
    pub fn for_context(kernel: &'a dyn PsdKernel, ctx: &AcquisitionContext) -> Self {
        Self::new(kernel, ctx.sample_rate_hz, ctx.overlap, ctx.window)
    }

    /// Estimate the PSD with `segment_len` bins
    pub fn estimate(&self, samples: &[Complex64], segment_len: usize) -> Result<SpectralEstimate> {
        if segment_len == 0 || segment_len % 2 != 0 {
            return Err(SpectrumError::InvalidParameter(format!(
                "segment length must be even and positive (got {})",
                segment_len
            )));
        }

        let (frequencies, power) = self.kernel.estimate(
            samples,
            self.sample_rate,
            segment_len,
            self.overlap,
            self.window,
        )?;

        if frequencies.len() != segment_len || power.len() != segment_len {
            return Err(SpectrumError::DataProcessing(format!(
                "kernel returned {}/{} bins for segment length {}",
                frequencies.len(),
                power.len(),
                segment_len
            )));
        }

        SpectralEstimate::new(frequencies, power)
    }

    /// Estimate both resolutions, releasing the samples afterwards
    pub fn estimate_pair(
        &self,
        samples: Vec<Complex64>,
        coarse_len: usize,
        fine_len: usize,
        center_frequency_hz: f64,
    ) -> Result<EstimatePair> {
        let coarse = self.estimate(&samples, coarse_len)?;
        let fine = self.estimate(&samples, fine_len)?;
        drop(samples);

        Ok(EstimatePair {
            coarse,
            fine,
            center_frequency_hz,
        })
    }
}
