//! Raw capture loading
//!
//! Captures are interleaved signed 8-bit I/Q pairs as written by HackRF-class
//! receivers (CS8). Other formats plug in through [`SampleSource`].

use crate::error::{Result, SpectrumError};
use num_complex::Complex64;
use std::path::Path;

/// Loads a complete capture into memory
pub trait SampleSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<Complex64>>;
}

/// Interleaved signed 8-bit I/Q file reader
#[derive(Debug, Clone, Copy, Default)]
pub struct Cs8FileSource;

impl Cs8FileSource {
    /// Convert raw CS8 bytes, ignoring a trailing half sample
    pub fn decode(bytes: &[u8]) -> Result<Vec<Complex64>> {
        let count = bytes.len() / 2;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(count)
            .map_err(|e| SpectrumError::allocation("sample buffer", e))?;

        samples.extend(bytes.chunks_exact(2).map(|pair| {
            let re = pair[0] as i8 as f64 / 128.0;
            let im = pair[1] as i8 as f64 / 128.0;
            Complex64::new(re, im)
        }));

        Ok(samples)
    }
}

impl SampleSource for Cs8FileSource {
    fn load(&self, path: &Path) -> Result<Vec<Complex64>> {
        let bytes = std::fs::read(path).map_err(|e| SpectrumError::file_io(path, e))?;
        let samples = Self::decode(&bytes)?;
        if samples.is_empty() {
            return Err(SpectrumError::NullInput(format!(
                "capture '{}' holds no samples",
                path.display()
            )));
        }
        Ok(samples)
    }
}
