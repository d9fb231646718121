// Reference capture error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Reference error code constants
///
/// Error code range: 3001-3003
pub struct ReferenceErrorCodes {}

impl ReferenceErrorCodes {
    /// Not enough non-silent frames were collected
    pub const INSUFFICIENT_FRAMES: i32 = 3001;

    /// Frame offered while no capture is running
    pub const NOT_CAPTURING: i32 = 3002;

    /// Capture started while another one is running
    pub const ALREADY_CAPTURING: i32 = 3003;
}

/// Log a reference capture error with structured context
pub fn log_reference_error(err: &ReferenceError, context: &str) {
    error!(
        "Reference error in {}: code={}, component=ReferenceCapture, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Reference capture and session summary errors
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// Too few frames to build a stable reference (usually the player was too quiet)
    InsufficientFrames { required: usize, collected: usize },

    /// No capture is running
    NotCapturing,

    /// A capture is already running
    AlreadyCapturing,
}

impl ErrorCode for ReferenceError {
    fn code(&self) -> i32 {
        match self {
            ReferenceError::InsufficientFrames { .. } => ReferenceErrorCodes::INSUFFICIENT_FRAMES,
            ReferenceError::NotCapturing => ReferenceErrorCodes::NOT_CAPTURING,
            ReferenceError::AlreadyCapturing => ReferenceErrorCodes::ALREADY_CAPTURING,
        }
    }

    fn message(&self) -> String {
        match self {
            ReferenceError::InsufficientFrames {
                required,
                collected,
            } => {
                format!(
                    "Insufficient frames: need {}, got {} (signal too quiet?)",
                    required, collected
                )
            }
            ReferenceError::NotCapturing => "No reference capture in progress".to_string(),
            ReferenceError::AlreadyCapturing => {
                "Reference capture already in progress".to_string()
            }
        }
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReferenceError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ReferenceError {}
