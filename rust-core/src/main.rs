//! rf-spectrum - analyse one pair of existing captures
//!
//! ```text
//! rf-spectrum --config session.toml [--single]
//! ```

use anyhow::Context;
use clap::Parser;
use rf_spectrum::{SessionConfig, SpectrumPipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rf-spectrum")]
#[command(author, version, about = "DC-corrected PSD and channel detection for RF captures", long_about = None)]
struct Cli {
    /// Session configuration (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Ignore the secondary capture and use the single-acquisition correction
    #[arg(long)]
    single: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let session = SessionConfig::from_file(&cli.config)
        .with_context(|| format!("loading session {}", cli.config.display()))?;
    let pipeline = SpectrumPipeline::from_session(&session);

    let outcome = match (&session.secondary, cli.single) {
        (Some(secondary), false) => pipeline
            .process_with_correction(&session.primary, secondary)
            .context("dual-acquisition analysis failed")?,
        _ => pipeline
            .process(&session.primary)
            .context("single-acquisition analysis failed")?,
    };

    println!(
        "correction: {:?}, calibration: {:.3} dB, elapsed: {:.1} ms",
        outcome.correction,
        outcome.calibration_db,
        outcome.elapsed.as_secs_f64() * 1e3
    );
    for ch in &outcome.detection.channels {
        println!(
            "  {:>10.3} MHz  bw {:.3}  snr {:>7.2} dB  {}",
            ch.channel.center_frequency,
            ch.channel.bandwidth,
            ch.snr_db,
            if ch.threshold_exceeded { "DETECTED" } else { "-" }
        );
    }
    println!(
        "signal {}",
        if outcome.detection.signal_detected {
            "DETECTED"
        } else {
            "NOT DETECTED"
        }
    );

    Ok(())
}
