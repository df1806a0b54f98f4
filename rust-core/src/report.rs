//! Spectrum report construction and emission
//!
//! The report carries the fine-resolution estimate, calibrated to dB and on an
//! absolute frequency axis, wrapped in the JSON layout the visualisation
//! front end reads:
//!
//! ```json
//! { "data": { "band": "VHF", "fmin": "88", "fmax": "108", "units": "MHz",
//!             "measure": "RMER", "vectors": { "Pxx": [...], "f": [...] },
//!             "parameters": [] } }
//! ```

use crate::config::ReportMetadata;
use crate::correction::stats::to_db;
use crate::error::{Result, SpectrumError};
use crate::spectrum::SpectralEstimate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumReport {
    pub data: ReportBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBody {
    pub band: String,
    pub fmin: String,
    pub fmax: String,
    pub units: String,
    pub measure: String,
    pub vectors: ReportVectors,
    /// Reserved for per-channel parameters; always emitted empty
    pub parameters: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportVectors {
    /// Calibrated power in dB; non-finite values serialise as null
    #[serde(rename = "Pxx")]
    pub pxx: Vec<f64>,
    /// Absolute frequency in MHz
    pub f: Vec<f64>,
}

/// Offset tying the fine estimate's level to the coarse one
///
/// `| |10·log10(coarse[0])| - |10·log10(fine[0])| |`, or 0 if either is empty.
pub fn zero_bin_calibration(coarse: &SpectralEstimate, fine: &SpectralEstimate) -> f64 {
    match (coarse.power().first(), fine.power().first()) {
        (Some(&c), Some(&f)) => (to_db(c).abs() - to_db(f).abs()).abs(),
        _ => 0.0,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl SpectrumReport {
    /// Build the report from the fine estimate
    ///
    /// # Arguments
    /// * `metadata` - Header labels
    /// * `fine` - Fine estimate on an absolute MHz axis, linear power
    /// * `calibration_db` - Added to every dB value
    pub fn build(
        metadata: &ReportMetadata,
        fine: &SpectralEstimate,
        calibration_db: f64,
    ) -> Result<Self> {
        let mut pxx = Vec::new();
        let mut f = Vec::new();
        pxx.try_reserve_exact(fine.len())
            .map_err(|e| SpectrumError::allocation("report power vector", e))?;
        f.try_reserve_exact(fine.len())
            .map_err(|e| SpectrumError::allocation("report frequency vector", e))?;

        pxx.extend(fine.power().iter().map(|&p| round3(to_db(p) + calibration_db)));
        f.extend(fine.frequencies().iter().map(|&freq| round3(freq)));

        Ok(Self {
            data: ReportBody {
                band: metadata.band.clone(),
                fmin: metadata.fmin.clone(),
                fmax: metadata.fmax.clone(),
                units: metadata.units.clone(),
                measure: metadata.measure.clone(),
                vectors: ReportVectors { pxx, f },
                parameters: Vec::new(),
            },
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpectrumError::AllocationFailure(format!("report serialization: {}", e)))
    }
}

/// Destination for finished reports
pub trait ReportSink: Send + Sync {
    fn persist(&self, report: &SpectrumReport, destination: &Path) -> Result<()>;
}

/// Writes JSON through a temporary file renamed over the destination
///
/// A failed write leaves the previous report (if any) in place and no partial
/// file behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileSink;

impl ReportSink for JsonFileSink {
    fn persist(&self, report: &SpectrumReport, destination: &Path) -> Result<()> {
        let json = report.to_json()?;
        let bytes = json.as_bytes();

        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| SpectrumError::file_io(dir, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| SpectrumError::file_io(tmp.path(), e))?;

        let written = tmp
            .as_file()
            .metadata()
            .map_err(|e| SpectrumError::file_io(tmp.path(), e))?
            .len();
        if written != bytes.len() as u64 {
            return Err(SpectrumError::file_io(
                tmp.path(),
                std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("wrote {} of {} bytes", written, bytes.len()),
                ),
            ));
        }

        tmp.persist(destination)
            .map_err(|e| SpectrumError::file_io(destination, e.error))?;

        tracing::debug!(path = %destination.display(), bytes = bytes.len(), "report written");
        Ok(())
    }
}
