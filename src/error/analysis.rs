// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 2001-2002
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Frame buffer length differs from the configured FFT size
    pub const BUFFER_LENGTH_MISMATCH: i32 = 2001;

    /// Frame sample rate differs from the configured sample rate
    pub const SAMPLE_RATE_MISMATCH: i32 = 2002;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Frame contract violations
///
/// These indicate an integration bug in the capture layer. They are reported
/// before any session state is touched, so a rejected frame leaves the
/// extractor exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Frame length does not match the configured FFT size
    BufferLengthMismatch { expected: usize, actual: usize },

    /// Frame sample rate does not match the configured sample rate
    SampleRateMismatch { expected: u32, actual: u32 },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::BufferLengthMismatch { .. } => {
                AnalysisErrorCodes::BUFFER_LENGTH_MISMATCH
            }
            AnalysisError::SampleRateMismatch { .. } => AnalysisErrorCodes::SAMPLE_RATE_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::BufferLengthMismatch { expected, actual } => {
                format!(
                    "Frame length mismatch: expected {} samples, got {}",
                    expected, actual
                )
            }
            AnalysisError::SampleRateMismatch { expected, actual } => {
                format!(
                    "Frame sample rate mismatch: expected {} Hz, got {} Hz",
                    expected, actual
                )
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
