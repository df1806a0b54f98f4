//! Window functions for Welch segments
//!
//! Coefficients are periodic (denominator M rather than M-1), the form used
//! for spectral estimation where the segment repeats end to end.

use crate::error::{try_zeroed, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Generate periodic window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Result<Vec<f64>> {
    let m = length as f64;
    let mut coefficients = try_zeroed("window coefficients", length)?;

    for (n, w) in coefficients.iter_mut().enumerate() {
        let angle = 2.0 * PI * n as f64 / m;
        *w = match window_type {
            WindowType::Hann => 0.5 - 0.5 * angle.cos(),
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            WindowType::Rectangular => 1.0,
        };
    }

    Ok(coefficients)
}

/// Sum of squared coefficients, the power normalisation of a density estimate
pub fn window_power(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
