//! Synthetic captures shared by the integration tests
//!
//! A capture is a single sample whose real part tags which spectrum the
//! [`SyntheticKernel`] produces, so estimates are exact and cheap.

#![allow(dead_code)]

use num_complex::Complex64;
use rf_spectrum::spectrum::{reorder, welch::baseband_axis, SpectralEstimator};
use rf_spectrum::{
    AcquisitionContext, Channel, EstimatePair, PsdKernel, Result, SampleSource, SpectrumError,
    WindowType,
};
use std::path::Path;
use std::time::Duration;

pub const SAMPLE_RATE: f64 = 20_000_000.0;
pub const PRIMARY_HZ: u64 = 98_000_000;
pub const SECONDARY_HZ: u64 = 100_000_000;

/// Tone offset from the primary's tuner frequency; lands on bin 1000 of 4096
pub const TONE_OFFSET_HZ: f64 = -5_117_187.5;
pub const TONE_MHZ: f64 = 92.8828125;

pub const FLOOR_A: f64 = 1e-8;
/// Secondary floor, 3 dB above the primary's
pub const FLOOR_B: f64 = 2e-8;
/// -20 dB
pub const TONE_POWER: f64 = 1e-2;
/// -10 dB
pub const SPIKE_POWER: f64 = 1e-1;

const TAG_PRIMARY: f64 = 1.0;
const TAG_SECONDARY: f64 = 2.0;

/// Maps `primary`/`secondary` paths to tagged one-sample captures
pub struct SyntheticSource {
    pub delay: Duration,
}

impl SyntheticSource {
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }
}

impl SampleSource for SyntheticSource {
    fn load(&self, path: &Path) -> Result<Vec<Complex64>> {
        std::thread::sleep(self.delay);
        let tag = match path.file_name().and_then(|n| n.to_str()) {
            Some("primary") => TAG_PRIMARY,
            Some("secondary") => TAG_SECONDARY,
            _ => {
                return Err(SpectrumError::file_io(
                    path,
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ))
            }
        };
        Ok(vec![Complex64::new(tag, 0.0)])
    }
}

/// Flat floor, a five-bin DC spike and (primary only) one tone
pub struct SyntheticKernel;

impl PsdKernel for SyntheticKernel {
    fn estimate(
        &self,
        samples: &[Complex64],
        sample_rate: f64,
        segment_len: usize,
        _overlap: usize,
        _window: WindowType,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let primary = samples[0].re == TAG_PRIMARY;
        let n = segment_len;
        let half = n / 2;

        let mut centered = vec![if primary { FLOOR_A } else { FLOOR_B }; n];
        for k in half - 2..=half + 2 {
            centered[k] = SPIKE_POWER;
        }
        if primary {
            let bin = (half as f64 + TONE_OFFSET_HZ / (sample_rate / n as f64)).round() as usize;
            centered[bin] = TONE_POWER;
        }

        // Back to transform order, DC first
        let mut power = vec![0.0; n];
        for (i, &p) in centered.iter().enumerate() {
            power[(i + half) % n] = p;
        }

        Ok((baseband_axis(n, sample_rate)?, power))
    }
}

pub fn channels() -> Vec<Channel> {
    vec![
        // Over the planted tone
        Channel::new(TONE_MHZ, 0.02),
        // Known-flat stretch
        Channel::new(95.0, 0.2),
        // Over the primary's DC spike
        Channel::new(98.0, 0.05),
    ]
}

pub fn primary_context(output: &Path) -> AcquisitionContext {
    let mut ctx = AcquisitionContext::new(output.with_file_name("primary"), PRIMARY_HZ);
    ctx.coarse_segment_len = 4096;
    ctx.fine_segment_len = 2048;
    ctx.threshold_db = -30.0;
    ctx.channels = channels();
    ctx.output_path = Some(output.to_path_buf());
    ctx
}

pub fn secondary_context(dir: &Path) -> AcquisitionContext {
    let mut ctx = AcquisitionContext::new(dir.join("secondary"), SECONDARY_HZ);
    ctx.coarse_segment_len = 4096;
    ctx.fine_segment_len = 2048;
    ctx
}

/// The secondary's estimate pair exactly as its pipeline would publish it
pub fn secondary_pair(ctx: &AcquisitionContext) -> EstimatePair {
    let estimator = SpectralEstimator::for_context(&SyntheticKernel, ctx);
    let mut pair = estimator
        .estimate_pair(
            vec![Complex64::new(TAG_SECONDARY, 0.0)],
            ctx.coarse_segment_len,
            ctx.fine_segment_len,
            ctx.center_frequency_hz as f64,
        )
        .unwrap();
    reorder(&mut pair.coarse).unwrap();
    reorder(&mut pair.fine).unwrap();
    pair.to_absolute_mhz();
    pair
}
