//! RF Spectrum Core - PSD estimation and channel detection for SDR captures
//!
//! Estimates the power spectrum of a raw I/Q capture at two resolutions,
//! removes the receiver's DC spike (from a frequency-offset second capture, or
//! heuristically when there is none), checks configured channels for signal
//! presence and writes the calibrated fine spectrum as a JSON report.

pub mod config;
pub mod correction;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod spectrum;
pub mod sync;

pub use config::{AcquisitionContext, Channel, SessionConfig};
pub use detection::{ChannelDetector, DetectionResult};
pub use error::{ErrorKind, Result, SpectrumError};
pub use pipeline::{CorrectionApplied, PipelineOutcome, SpectrumPipeline};
pub use report::{JsonFileSink, ReportSink, SpectrumReport};
pub use source::{Cs8FileSource, SampleSource};
pub use spectrum::{EstimatePair, PsdKernel, SpectralEstimate, WelchKernel, WindowType};
pub use sync::{HandoffError, PeerHandoff};
