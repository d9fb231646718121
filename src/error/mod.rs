// Error types for the timbre trainer engine
//
// This module defines custom error types for configuration, per-frame analysis
// preconditions and reference capture, providing structured error handling
// with stable numeric codes for host applications.

mod analysis;
mod config;
mod reference;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use reference::{log_reference_error, ReferenceError, ReferenceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// host integrations.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait() {
        let config_err: &dyn ErrorCode = &ConfigError::InvalidHopSize { hop_size: 0 };
        assert_eq!(config_err.code(), ConfigErrorCodes::INVALID_HOP_SIZE);

        let frame_err: &dyn ErrorCode = &AnalysisError::BufferLengthMismatch {
            expected: 4096,
            actual: 128,
        };
        assert_eq!(frame_err.code(), AnalysisErrorCodes::BUFFER_LENGTH_MISMATCH);

        let reference_err: &dyn ErrorCode = &ReferenceError::NotCapturing;
        assert_eq!(reference_err.code(), ReferenceErrorCodes::NOT_CAPTURING);
    }

    #[test]
    fn test_error_code_ranges_do_not_overlap() {
        let codes = [
            ConfigErrorCodes::FFT_SIZE_NOT_POWER_OF_TWO,
            ConfigErrorCodes::INVALID_STABILITY_WINDOW,
            AnalysisErrorCodes::BUFFER_LENGTH_MISMATCH,
            AnalysisErrorCodes::SAMPLE_RATE_MISMATCH,
            ReferenceErrorCodes::INSUFFICIENT_FRAMES,
            ReferenceErrorCodes::ALREADY_CAPTURING,
        ];
        assert!(codes[..2].iter().all(|c| (1001..2000).contains(c)));
        assert!(codes[2..4].iter().all(|c| (2001..3000).contains(c)));
        assert!(codes[4..].iter().all(|c| (3001..4000).contains(c)));
    }
}
