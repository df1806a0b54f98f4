//! FFT engine for complex baseband segments
//!
//! Keeps one forward plan and its buffers so a Welch run over many segments
//! does not allocate per segment.

use crate::error::{try_filled, Result};
use ndarray::Array1;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward FFT of a fixed size over complex input
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Forward FFT processor
    fft: Arc<dyn Fft<f64>>,

    /// Reusable in-place buffer
    buffer: Vec<Complex64>,

    /// Scratch space required by the plan
    scratch: Vec<Complex64>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Result<Self> {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let zero = Complex64::new(0.0, 0.0);
        let scratch = try_filled("fft scratch", fft.get_inplace_scratch_len(), zero)?;
        let buffer = try_filled("fft buffer", fft_size, zero)?;

        Ok(Self {
            fft_size,
            fft,
            buffer,
            scratch,
        })
    }

    /// Window a segment, transform it, and add |X[k]|² into `acc`
    ///
    /// # Arguments
    /// * `segment` - Input samples (zero-padded if shorter than fft_size)
    /// * `window` - Window coefficients, fft_size long
    /// * `acc` - Per-bin accumulator in transform order (DC at index 0)
    pub fn accumulate_power(
        &mut self,
        segment: &[Complex64],
        window: &[f64],
        acc: &mut Array1<f64>,
    ) {
        let copy_len = segment.len().min(self.fft_size);
        for (dst, (&s, &w)) in self.buffer[..copy_len]
            .iter_mut()
            .zip(segment.iter().zip(window.iter()))
        {
            *dst = s * w;
        }
        if copy_len < self.fft_size {
            self.buffer[copy_len..].fill(Complex64::new(0.0, 0.0));
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (a, x) in acc.iter_mut().zip(self.buffer.iter()) {
            *a += x.norm_sqr();
        }
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
}
