//! Threshold-based signal presence per configured channel
//!
//! Every channel is evaluated against the coarse estimate; detection never
//! fails and never short-circuits. Degenerate inputs simply report nothing
//! detected.

use crate::config::Channel;
use crate::correction::stats::{max_value, median, min_value, nearest_index, to_db};
use crate::spectrum::SpectralEstimate;

/// Statistics for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetection {
    pub channel: Channel,
    /// Inclusive bin range covered by the channel
    pub lower_index: usize,
    pub upper_index: usize,
    pub peak_power: f64,
    pub median_power: f64,
    /// Peak relative to the noise floor, in dB
    pub snr_db: f64,
    pub threshold_exceeded: bool,
}

/// Outcome over all channels
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub channels: Vec<ChannelDetection>,
    /// Minimum power over the whole estimate
    pub noise_floor: f64,
    pub signal_detected: bool,
}

impl DetectionResult {
    /// Channels whose peak crossed the threshold
    pub fn detected_channels(&self) -> impl Iterator<Item = &ChannelDetection> {
        self.channels.iter().filter(|c| c.threshold_exceeded)
    }
}

/// Evaluates channels against a corrected estimate
#[derive(Debug, Clone, Copy)]
pub struct ChannelDetector {
    threshold_db: f64,
}

impl ChannelDetector {
    /// # Arguments
    /// * `threshold_db` - A channel is detected when 10·log10(peak) is strictly above this
    pub fn new(threshold_db: f64) -> Self {
        Self { threshold_db }
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    /// Evaluate `channels` over an estimate on an absolute frequency axis
    pub fn detect(&self, estimate: &SpectralEstimate, channels: &[Channel]) -> DetectionResult {
        let Some(noise_floor) = min_value(estimate.power()) else {
            return DetectionResult::default();
        };

        let mut result = DetectionResult {
            channels: Vec::with_capacity(channels.len()),
            noise_floor,
            signal_detected: false,
        };

        for channel in channels {
            if let Some(detection) = self.evaluate(estimate, channel, noise_floor) {
                result.signal_detected |= detection.threshold_exceeded;
                result.channels.push(detection);
            }
        }

        result
    }

    fn evaluate(
        &self,
        estimate: &SpectralEstimate,
        channel: &Channel,
        noise_floor: f64,
    ) -> Option<ChannelDetection> {
        let (low_freq, high_freq) = channel.edges();
        let mut lower = nearest_index(estimate.frequencies(), low_freq)?;
        let mut upper = nearest_index(estimate.frequencies(), high_freq)?;
        if lower > upper {
            std::mem::swap(&mut lower, &mut upper);
        }
        let upper = upper.min(estimate.len() - 1);

        let range = &estimate.power()[lower..=upper];
        let peak_power = max_value(range)?;
        let median_power = median(range)?;
        let snr_db = to_db(peak_power / noise_floor);

        Some(ChannelDetection {
            channel: *channel,
            lower_index: lower,
            upper_index: upper,
            peak_power,
            median_power,
            snr_db,
            threshold_exceeded: to_db(peak_power) > self.threshold_db,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::stats::from_db;
    use crate::error::ErrorKind;

    fn estimate(levels_db: &[f64]) -> SpectralEstimate {
        let n = levels_db.len();
        SpectralEstimate::new(
            (0..n).map(|k| 100.0 + k as f64).collect(),
            levels_db.iter().map(|&db| from_db(db)).collect(),
        )
        .unwrap()
    }

    fn linear(power: &[f64]) -> SpectralEstimate {
        let n = power.len();
        SpectralEstimate::new((0..n).map(|k| 100.0 + k as f64).collect(), power.to_vec()).unwrap()
    }

    #[test]
    fn test_threshold_is_strict() {
        // 1e-3 is exactly -30 dB, 10^-2.9 one dB above
        let est = linear(&[1e-8, 1e-8, 1e-3, 1e-8, 1e-8, 10f64.powf(-2.9), 1e-8, 1e-8]);
        let detector = ChannelDetector::new(-30.0);
        let channels = [Channel::new(102.0, 2.0), Channel::new(105.0, 2.0)];

        let result = detector.detect(&est, &channels);

        assert_eq!(result.channels.len(), 2);
        assert!(!result.channels[0].threshold_exceeded);
        assert!(result.channels[1].threshold_exceeded);
        assert!(result.signal_detected);
        assert_eq!(result.detected_channels().count(), 1);
    }

    #[test]
    fn test_equal_to_threshold_not_detected() {
        let est = linear(&[1e-8, 1e-3, 1e-8, 1e-8]);
        let result = ChannelDetector::new(-30.0).detect(&est, &[Channel::new(101.0, 1.0)]);
        assert!(!result.signal_detected);
    }

    #[test]
    fn test_channel_statistics() {
        let est = estimate(&[-90.0, -70.0, -60.0, -50.0, -40.0, -90.0]);
        let result = ChannelDetector::new(0.0).detect(&est, &[Channel::new(102.5, 3.0)]);
        let ch = &result.channels[0];

        // Edges 101.0 and 104.0 map to bins 1 and 4
        assert_eq!((ch.lower_index, ch.upper_index), (1, 4));
        assert!((ch.peak_power - from_db(-40.0)).abs() < 1e-15);
        let expected_median = (from_db(-60.0) + from_db(-50.0)) / 2.0;
        assert!((ch.median_power - expected_median).abs() < 1e-15);
        assert!((ch.snr_db - 50.0).abs() < 1e-9);
        assert!((result.noise_floor - from_db(-90.0)).abs() < 1e-20);
    }

    #[test]
    fn test_inverted_bandwidth_is_swapped() {
        let est = estimate(&[-90.0, -70.0, -60.0, -50.0]);
        let result = ChannelDetector::new(-100.0).detect(&est, &[Channel::new(101.5, -1.0)]);
        let ch = &result.channels[0];
        assert!(ch.lower_index <= ch.upper_index);
    }

    #[test]
    fn test_out_of_band_channel_clamps() {
        let est = estimate(&[-90.0, -70.0, -60.0, -20.0]);
        let result = ChannelDetector::new(-30.0).detect(&est, &[Channel::new(500.0, 10.0)]);
        let ch = &result.channels[0];
        assert_eq!((ch.lower_index, ch.upper_index), (3, 3));
        assert!(ch.threshold_exceeded);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = SpectralEstimate::default();
        let result = ChannelDetector::new(-30.0).detect(&empty, &[Channel::new(1.0, 1.0)]);
        assert!(!result.signal_detected);
        assert!(result.channels.is_empty());

        let est = estimate(&[-10.0, -10.0]);
        let result = ChannelDetector::new(-30.0).detect(&est, &[]);
        assert!(!result.signal_detected);
    }

    #[test]
    fn test_mismatched_axis_never_reaches_detection() {
        let err = SpectralEstimate::new((0..10).map(|k| k as f64).collect(), vec![1.0, 2.0])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataProcessing);

        // Every channel range stays inside the power array, even far off the axis
        let est = estimate(&[-90.0, -70.0, -60.0, -20.0]);
        let channels = [Channel::new(8.0, 1.0), Channel::new(1e6, 1.0), Channel::new(-1e6, 4.0)];
        let result = ChannelDetector::new(-30.0).detect(&est, &channels);
        assert_eq!(result.channels.len(), 3);
        for ch in &result.channels {
            assert!(ch.lower_index <= ch.upper_index);
            assert!(ch.upper_index < est.power().len());
        }
    }
}
