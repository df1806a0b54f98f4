//! Spectral estimation: Welch PSD at two resolutions and re-centering

pub mod estimate;
pub mod fft;
pub mod reorder;
pub mod welch;
pub mod window;

pub use estimate::{EstimatePair, SpectralEstimate};
pub use fft::FftEngine;
pub use reorder::{reorder, reorder_power};
pub use welch::{PsdKernel, SpectralEstimator, WelchKernel};
pub use window::WindowType;
