//! Acquisition pipeline: load, estimate, re-center, correct, detect, report
//!
//! Two ways in:
//! - [`SpectrumPipeline::process`] runs one capture alone and patches its DC
//!   spike with the single-acquisition heuristic
//! - [`SpectrumPipeline::process_with_correction`] runs a frequency-offset
//!   secondary capture on its own thread and rebuilds the primary's spike
//!   region from it
//!
//! Both the primary's wait on the secondary and the final join of the
//! secondary thread are bounded by [`SyncConfig::peer_timeout`]. A failed or
//! late peer degrades to the single-acquisition correction, and a secondary
//! still running at the deadline is detached instead of stalling the run.

use crate::config::{
    AcquisitionContext, AcquisitionRole, ReportMetadata, SessionConfig, SyncConfig,
};
use crate::correction::{apply_dual_correction, apply_single_correction, heuristic_width};
use crate::detection::{ChannelDetector, DetectionResult};
use crate::error::{Result, SpectrumError};
use crate::report::{zero_bin_calibration, JsonFileSink, ReportSink, SpectrumReport};
use crate::source::{Cs8FileSource, SampleSource};
use crate::spectrum::{reorder, EstimatePair, PsdKernel, SpectralEstimator, WelchKernel};
use crate::sync::PeerHandoff;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How often a finished primary checks whether the secondary has exited
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Step progress: `info` for verbose acquisitions, `debug` otherwise
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Which DC spike correction ended up in the analysed estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionApplied {
    /// Spike region rebuilt from the secondary acquisition
    Dual,
    /// Secondary unavailable; heuristic correction used instead
    SingleFallback,
    /// No secondary configured; heuristic correction
    Single,
    /// Every correction attempt failed; estimates left as measured
    None,
}

/// Result of one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub detection: DetectionResult,
    /// Report as written to the sink
    pub report: SpectrumReport,
    pub correction: CorrectionApplied,
    /// Zero-bin offset added to every reported dB value
    pub calibration_db: f64,
    pub elapsed: Duration,
}

/// Pluggable pipeline over a sample source, PSD kernel and report sink
pub struct SpectrumPipeline {
    // Shared with a secondary thread that may outlive the call
    source: Arc<dyn SampleSource>,
    kernel: Arc<dyn PsdKernel>,
    sink: Box<dyn ReportSink>,
    metadata: ReportMetadata,
    sync: SyncConfig,
}

impl Default for SpectrumPipeline {
    fn default() -> Self {
        Self::new(
            Box::new(Cs8FileSource),
            Box::new(WelchKernel),
            Box::new(JsonFileSink),
        )
    }
}

impl SpectrumPipeline {
    pub fn new(
        source: Box<dyn SampleSource>,
        kernel: Box<dyn PsdKernel>,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            source: Arc::from(source),
            kernel: Arc::from(kernel),
            sink,
            metadata: ReportMetadata::default(),
            sync: SyncConfig::default(),
        }
    }

    /// Default components with the session's report labels and sync limits
    pub fn from_session(session: &SessionConfig) -> Self {
        Self::default()
            .with_metadata(session.report.clone())
            .with_sync(session.sync.clone())
    }

    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    /// Analyse one capture without a peer
    pub fn process(&self, ctx: &AcquisitionContext) -> Result<PipelineOutcome> {
        let started = Instant::now();
        ctx.validate(AcquisitionRole::Primary)?;

        let mut pair = acquire(self.source.as_ref(), self.kernel.as_ref(), ctx)?;
        let correction = if self.correct_single(&mut pair) {
            CorrectionApplied::Single
        } else {
            CorrectionApplied::None
        };
        pair.to_absolute_mhz();

        self.finish(ctx, &pair, correction, started)
    }

    /// Analyse `primary`, patching its DC spike from `secondary`
    ///
    /// The secondary runs on its own thread. It is joined once it has
    /// published or failed; if it is still running when the peer timeout
    /// (counted from this call) expires, it is detached and left to finish
    /// on its own. Its failure is logged; the primary result stands on its own.
    pub fn process_with_correction(
        &self,
        primary: &AcquisitionContext,
        secondary: &AcquisitionContext,
    ) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let handoff = Arc::new(PeerHandoff::new());

        let peer = {
            let source = Arc::clone(&self.source);
            let kernel = Arc::clone(&self.kernel);
            let handoff = Arc::clone(&handoff);
            let ctx = secondary.clone();
            std::thread::Builder::new()
                .name("secondary-acquisition".into())
                .spawn(move || publish_peer(source.as_ref(), kernel.as_ref(), &ctx, &handoff))
                .map_err(|e| {
                    SpectrumError::AllocationFailure(format!("secondary acquisition thread: {}", e))
                })?
        };

        let outcome = self.run_primary(primary, &handoff);

        let deadline = self.sync.peer_timeout().map(|limit| started + limit);
        reap_secondary(peer, &handoff, deadline);

        outcome
    }

    /// Secondary half: estimate, re-center, shift, then publish to `handoff`
    ///
    /// An error is forwarded to the waiting primary before being returned.
    pub fn run_secondary(&self, ctx: &AcquisitionContext, handoff: &PeerHandoff) -> Result<()> {
        publish_peer(self.source.as_ref(), self.kernel.as_ref(), ctx, handoff)
    }

    /// Primary half: estimate, wait for the peer, correct, detect, report
    pub fn run_primary(
        &self,
        ctx: &AcquisitionContext,
        handoff: &PeerHandoff,
    ) -> Result<PipelineOutcome> {
        let started = Instant::now();
        ctx.validate(AcquisitionRole::Primary)?;

        let mut pair = acquire(self.source.as_ref(), self.kernel.as_ref(), ctx)?;

        progress!(ctx.verbose, "waiting for peer acquisition");
        let correction = match handoff.wait_for_peer(self.sync.peer_timeout()) {
            Ok(peer) => {
                pair.to_absolute_mhz();
                if self.correct_dual(ctx, &mut pair, &peer) {
                    CorrectionApplied::Dual
                } else {
                    CorrectionApplied::None
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "peer estimate unavailable, using single-acquisition correction"
                );
                let corrected = self.correct_single(&mut pair);
                pair.to_absolute_mhz();
                if corrected {
                    CorrectionApplied::SingleFallback
                } else {
                    CorrectionApplied::None
                }
            }
        };

        self.finish(ctx, &pair, correction, started)
    }

    /// Calibration, detection and report emission over corrected estimates
    ///
    /// `pair` must already be on an absolute MHz axis.
    pub fn analyze(
        &self,
        ctx: &AcquisitionContext,
        pair: &EstimatePair,
        correction: CorrectionApplied,
    ) -> Result<PipelineOutcome> {
        self.finish(ctx, pair, correction, Instant::now())
    }

    fn finish(
        &self,
        ctx: &AcquisitionContext,
        pair: &EstimatePair,
        correction: CorrectionApplied,
        started: Instant,
    ) -> Result<PipelineOutcome> {
        let output = ctx
            .output_path
            .as_deref()
            .ok_or_else(|| SpectrumError::NullInput("output path is not set".into()))?;

        let calibration_db = zero_bin_calibration(&pair.coarse, &pair.fine);
        let detection = ChannelDetector::new(ctx.threshold_db).detect(&pair.coarse, &ctx.channels);

        for channel in &detection.channels {
            progress!(
                ctx.verbose,
                center_mhz = channel.channel.center_frequency,
                snr_db = channel.snr_db,
                detected = channel.threshold_exceeded,
                "channel evaluated"
            );
        }
        if detection.signal_detected {
            progress!(ctx.verbose, "signal DETECTED");
        } else {
            progress!(ctx.verbose, "signal NOT DETECTED");
        }

        let report = SpectrumReport::build(&self.metadata, &pair.fine, calibration_db)?;
        self.sink.persist(&report, output)?;

        let elapsed = started.elapsed();
        progress!(
            ctx.verbose,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            correction = ?correction,
            "acquisition processed"
        );

        Ok(PipelineOutcome {
            detection,
            report,
            correction,
            calibration_db,
            elapsed,
        })
    }

    /// Heuristic correction of both resolutions; true if any succeeded
    fn correct_single(&self, pair: &mut EstimatePair) -> bool {
        let mut applied = false;
        for (label, estimate) in [("coarse", &mut pair.coarse), ("fine", &mut pair.fine)] {
            let len = estimate.len();
            match apply_single_correction(estimate.power_mut(), len / 2, heuristic_width(len)) {
                Ok(()) => applied = true,
                Err(e) => tracing::warn!(
                    resolution = label,
                    error = %e,
                    "single-acquisition correction skipped"
                ),
            }
        }
        applied
    }

    /// Cross-acquisition correction of both resolutions; true if any succeeded
    fn correct_dual(
        &self,
        ctx: &AcquisitionContext,
        pair: &mut EstimatePair,
        peer: &EstimatePair,
    ) -> bool {
        let center_mhz = pair.center_frequency_mhz();
        let peer_center_mhz = peer.center_frequency_mhz();

        let mut applied = false;
        for (label, estimate, reference) in [
            ("coarse", &mut pair.coarse, &peer.coarse),
            ("fine", &mut pair.fine, &peer.fine),
        ] {
            match apply_dual_correction(
                estimate,
                center_mhz,
                reference,
                peer_center_mhz,
                ctx.correction_width,
            ) {
                Ok(done) => {
                    applied = true;
                    progress!(
                        ctx.verbose,
                        resolution = label,
                        offset_db = done.offset_db,
                        bins = done.bins_replaced,
                        "DC spike replaced from peer"
                    );
                }
                Err(e) => {
                    tracing::warn!(resolution = label, error = %e, "dual correction skipped")
                }
            }
        }
        applied
    }
}

/// Load the capture, estimate both resolutions and re-center them
fn acquire(
    source: &dyn SampleSource,
    kernel: &dyn PsdKernel,
    ctx: &AcquisitionContext,
) -> Result<EstimatePair> {
    progress!(ctx.verbose, path = %ctx.input_path.display(), "loading capture");
    let samples = source.load(&ctx.input_path)?;
    progress!(ctx.verbose, samples = samples.len(), "capture loaded");

    let estimator = SpectralEstimator::for_context(kernel, ctx);
    let mut pair = estimator.estimate_pair(
        samples,
        ctx.coarse_segment_len,
        ctx.fine_segment_len,
        ctx.center_frequency_hz as f64,
    )?;

    reorder(&mut pair.coarse)?;
    reorder(&mut pair.fine)?;
    progress!(
        ctx.verbose,
        coarse_bins = pair.coarse.len(),
        fine_bins = pair.fine.len(),
        "estimates ready"
    );

    Ok(pair)
}

/// Secondary acquisition body; settles `handoff` on every path
fn publish_peer(
    source: &dyn SampleSource,
    kernel: &dyn PsdKernel,
    ctx: &AcquisitionContext,
    handoff: &PeerHandoff,
) -> Result<()> {
    let guard = handoff.begin();

    let prepared = ctx.validate(AcquisitionRole::Secondary).and_then(|_| {
        let mut pair = acquire(source, kernel, ctx)?;
        pair.to_absolute_mhz();
        Ok(pair)
    });

    match prepared {
        Ok(pair) => {
            progress!(
                ctx.verbose,
                center_mhz = pair.center_frequency_mhz(),
                "peer estimate published"
            );
            guard.publish(pair);
            Ok(())
        }
        Err(e) => {
            guard.fail(e.to_string());
            Err(e)
        }
    }
}

/// Join the secondary once it has settled the handoff or exited
///
/// Past `deadline` a secondary that has done neither is detached.
fn reap_secondary(peer: JoinHandle<Result<()>>, handoff: &PeerHandoff, deadline: Option<Instant>) {
    while !peer.is_finished() && handoff.is_pending() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!("secondary acquisition still running after peer timeout, detaching");
            return;
        }
        std::thread::sleep(REAP_POLL_INTERVAL);
    }

    match peer.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "secondary acquisition failed"),
        Err(_) => tracing::warn!("secondary acquisition panicked"),
    }
}
