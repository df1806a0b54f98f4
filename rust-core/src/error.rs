//! Error types shared by every processing stage

use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NullInput,
    AllocationFailure,
    FileIo,
    InvalidParameter,
    DataProcessing,
}

impl ErrorKind {
    /// Fixed human-readable text for the kind
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NullInput => "Null input provided",
            ErrorKind::AllocationFailure => "Memory allocation failed",
            ErrorKind::FileIo => "File I/O error",
            ErrorKind::InvalidParameter => "Invalid parameter",
            ErrorKind::DataProcessing => "Data processing error",
        }
    }
}

#[derive(Error, Debug)]
pub enum SpectrumError {
    #[error("Null input: {0}")]
    NullInput(String),

    #[error("Memory allocation failed: {0}")]
    AllocationFailure(String),

    #[error("File I/O error on '{path}': {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data processing error: {0}")]
    DataProcessing(String),
}

impl SpectrumError {
    /// Create a file I/O error for `path`
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SpectrumError::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Map a failed reservation onto an allocation error naming the buffer
    pub fn allocation(buffer: &str, err: TryReserveError) -> Self {
        SpectrumError::AllocationFailure(format!("{}: {}", buffer, err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpectrumError::NullInput(_) => ErrorKind::NullInput,
            SpectrumError::AllocationFailure(_) => ErrorKind::AllocationFailure,
            SpectrumError::FileIo { .. } => ErrorKind::FileIo,
            SpectrumError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            SpectrumError::DataProcessing(_) => ErrorKind::DataProcessing,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpectrumError>;

/// Allocate `len` copies of `value`, reporting failure instead of aborting
pub fn try_filled<T: Clone>(buffer: &str, len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| SpectrumError::allocation(buffer, e))?;
    v.resize(len, value);
    Ok(v)
}

/// Zeroed `f64` buffer of `len` values
pub fn try_zeroed(buffer: &str, len: usize) -> Result<Vec<f64>> {
    try_filled(buffer, len, 0.0)
}
