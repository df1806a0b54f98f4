//! Acquisition and session configuration
//!
//! Configuration is plain data, deserialized from TOML and validated once
//! before processing starts. Nothing in here changes during a pipeline run.

use crate::error::{Result, SpectrumError};
use crate::spectrum::window::WindowType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 20_000_000.0;
pub const DEFAULT_COARSE_SEGMENT_LEN: usize = 32768;
pub const DEFAULT_FINE_SEGMENT_LEN: usize = 4096;
pub const DEFAULT_THRESHOLD_DB: f64 = -30.0;
pub const DEFAULT_CORRECTION_WIDTH: usize = 50;
pub const DEFAULT_PEER_TIMEOUT_SECS: u64 = 120;

/// One configured channel, in MHz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub center_frequency: f64,
    pub bandwidth: f64,
}

impl Channel {
    pub fn new(center_frequency: f64, bandwidth: f64) -> Self {
        Self {
            center_frequency,
            bandwidth,
        }
    }

    /// Lower and upper band edges
    pub fn edges(&self) -> (f64, f64) {
        let half = self.bandwidth / 2.0;
        (self.center_frequency - half, self.center_frequency + half)
    }
}

/// Which side of a dual acquisition a context drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionRole {
    /// Runs detection and writes the report
    Primary,
    /// Only produces an estimate pair for the primary
    Secondary,
}

/// Configuration for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionContext {
    /// Raw capture file
    pub input_path: PathBuf,

    /// Tuner center frequency in Hz
    pub center_frequency_hz: u64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Welch segment length for the coarse estimate
    #[serde(default = "default_coarse")]
    pub coarse_segment_len: usize,

    /// Welch segment length for the fine estimate
    #[serde(default = "default_fine")]
    pub fine_segment_len: usize,

    /// Samples shared by consecutive Welch segments
    #[serde(default)]
    pub overlap: usize,

    #[serde(default)]
    pub window: WindowType,

    /// Detection threshold in dB
    #[serde(default = "default_threshold")]
    pub threshold_db: f64,

    /// Bins replaced on each side of the DC spike
    #[serde(default = "default_correction_width")]
    pub correction_width: usize,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub channels: Vec<Channel>,

    /// Report destination (primary only)
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE_HZ
}

fn default_coarse() -> usize {
    DEFAULT_COARSE_SEGMENT_LEN
}

fn default_fine() -> usize {
    DEFAULT_FINE_SEGMENT_LEN
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_DB
}

fn default_correction_width() -> usize {
    DEFAULT_CORRECTION_WIDTH
}

impl AcquisitionContext {
    /// Context with default analysis settings and no channels
    pub fn new(input_path: impl Into<PathBuf>, center_frequency_hz: u64) -> Self {
        Self {
            input_path: input_path.into(),
            center_frequency_hz,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            coarse_segment_len: DEFAULT_COARSE_SEGMENT_LEN,
            fine_segment_len: DEFAULT_FINE_SEGMENT_LEN,
            overlap: 0,
            window: WindowType::default(),
            threshold_db: DEFAULT_THRESHOLD_DB,
            correction_width: DEFAULT_CORRECTION_WIDTH,
            verbose: false,
            channels: Vec::new(),
            output_path: None,
        }
    }

    /// Check the context before any buffer is allocated
    pub fn validate(&self, role: AcquisitionRole) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(SpectrumError::NullInput("input path is empty".into()));
        }

        for (name, len) in [
            ("coarse_segment_len", self.coarse_segment_len),
            ("fine_segment_len", self.fine_segment_len),
        ] {
            if len == 0 || len % 2 != 0 {
                return Err(SpectrumError::InvalidParameter(format!(
                    "{} must be even and positive (got {})",
                    name, len
                )));
            }
            if self.overlap >= len {
                return Err(SpectrumError::InvalidParameter(format!(
                    "overlap {} must be smaller than {} {}",
                    self.overlap, name, len
                )));
            }
        }

        if self.sample_rate_hz.is_nan() || self.sample_rate_hz <= 0.0 {
            return Err(SpectrumError::InvalidParameter(format!(
                "sample rate must be positive (got {})",
                self.sample_rate_hz
            )));
        }

        if self.correction_width == 0 {
            return Err(SpectrumError::InvalidParameter(
                "correction width must be positive".into(),
            ));
        }

        if role == AcquisitionRole::Primary {
            if self.output_path.is_none() {
                return Err(SpectrumError::NullInput("output path is not set".into()));
            }
            if self.channels.is_empty() {
                return Err(SpectrumError::NullInput("channel list is empty".into()));
            }
        }

        Ok(())
    }

    /// Center frequency in MHz, the unit of every absolute frequency axis
    pub fn center_frequency_mhz(&self) -> f64 {
        self.center_frequency_hz as f64 / 1e6
    }
}

/// Labels written into the report header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub band: String,
    pub fmin: String,
    pub fmax: String,
    pub units: String,
    pub measure: String,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            band: "VHF".to_string(),
            fmin: "88".to_string(),
            fmax: "108".to_string(),
            units: "MHz".to_string(),
            measure: "RMER".to_string(),
        }
    }
}

/// Limits on the primary's wait for its peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// `None` waits without bound
    pub peer_timeout_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: Some(DEFAULT_PEER_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    pub fn peer_timeout(&self) -> Option<Duration> {
        self.peer_timeout_secs.map(Duration::from_secs)
    }
}

/// Everything one analysis run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub primary: AcquisitionContext,

    /// Frequency-offset capture used to patch the primary's DC spike
    #[serde(default)]
    pub secondary: Option<AcquisitionContext>,

    #[serde(default)]
    pub report: ReportMetadata,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| SpectrumError::InvalidParameter(format!("session config: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| SpectrumError::file_io(path, e))?;
        Self::from_toml_str(&text)
    }
}
