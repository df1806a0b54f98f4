//! DC spike correction and the statistics it shares with detection

pub mod dual;
pub mod single;
pub mod stats;

pub use dual::{apply_dual_correction, CorrectionError, DualCorrection};
pub use single::{apply_single_correction, heuristic_width};
