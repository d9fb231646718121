// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Single source of truth for configuration error codes shared with hosts.
///
/// Error code range: 1001-1008
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// FFT size is not a power of two (or is too small to analyse)
    pub const FFT_SIZE_NOT_POWER_OF_TWO: i32 = 1001;

    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 1002;

    /// Hop size is zero or larger than the FFT size
    pub const INVALID_HOP_SIZE: i32 = 1003;

    /// Pitch search range is empty or non-positive
    pub const INVALID_PITCH_RANGE: i32 = 1004;

    /// YIN threshold outside (0, 1)
    pub const INVALID_YIN_THRESHOLD: i32 = 1005;

    /// Onset silence threshold is not below the sound threshold
    pub const INVALID_ONSET_THRESHOLDS: i32 = 1006;

    /// A frequency band has low >= high or a negative edge
    pub const INVALID_BAND: i32 = 1007;

    /// Stability window duration is not positive
    pub const INVALID_STABILITY_WINDOW: i32 = 1008;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=EngineConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors
///
/// Raised while configuring a session, never during per-frame processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// FFT size must be a power of two and at least 64 samples
    FftSizeNotPowerOfTwo { fft_size: usize },

    /// Sample rate must be greater than zero
    InvalidSampleRate { sample_rate: u32 },

    /// Hop size must be in 1..=fft_size
    InvalidHopSize { hop_size: usize },

    /// Pitch range must satisfy 0 < min < max
    InvalidPitchRange { min_hz: f64, max_hz: f64 },

    /// YIN threshold must lie strictly between 0 and 1
    InvalidYinThreshold { threshold: f64 },

    /// Silence threshold must be below the sound threshold
    InvalidOnsetThresholds { silence_db: f64, sound_db: f64 },

    /// Band edges must satisfy 0 <= low < high
    InvalidBand { name: String, low_hz: f64, high_hz: f64 },

    /// Stability window must cover a positive duration
    InvalidStabilityWindow { seconds: f64 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::FftSizeNotPowerOfTwo { .. } => ConfigErrorCodes::FFT_SIZE_NOT_POWER_OF_TWO,
            ConfigError::InvalidSampleRate { .. } => ConfigErrorCodes::INVALID_SAMPLE_RATE,
            ConfigError::InvalidHopSize { .. } => ConfigErrorCodes::INVALID_HOP_SIZE,
            ConfigError::InvalidPitchRange { .. } => ConfigErrorCodes::INVALID_PITCH_RANGE,
            ConfigError::InvalidYinThreshold { .. } => ConfigErrorCodes::INVALID_YIN_THRESHOLD,
            ConfigError::InvalidOnsetThresholds { .. } => {
                ConfigErrorCodes::INVALID_ONSET_THRESHOLDS
            }
            ConfigError::InvalidBand { .. } => ConfigErrorCodes::INVALID_BAND,
            ConfigError::InvalidStabilityWindow { .. } => {
                ConfigErrorCodes::INVALID_STABILITY_WINDOW
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::FftSizeNotPowerOfTwo { fft_size } => {
                format!(
                    "FFT size must be a power of two >= 64 (got {})",
                    fft_size
                )
            }
            ConfigError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::InvalidHopSize { hop_size } => {
                format!(
                    "Hop size must be between 1 and the FFT size (got {})",
                    hop_size
                )
            }
            ConfigError::InvalidPitchRange { min_hz, max_hz } => {
                format!(
                    "Pitch range must satisfy 0 < min < max (got {} Hz - {} Hz)",
                    min_hz, max_hz
                )
            }
            ConfigError::InvalidYinThreshold { threshold } => {
                format!("YIN threshold must be in (0, 1) (got {})", threshold)
            }
            ConfigError::InvalidOnsetThresholds {
                silence_db,
                sound_db,
            } => {
                format!(
                    "Silence threshold ({} dB) must be below sound threshold ({} dB)",
                    silence_db, sound_db
                )
            }
            ConfigError::InvalidBand {
                name,
                low_hz,
                high_hz,
            } => {
                format!(
                    "Band '{}' must satisfy 0 <= low < high (got {} Hz - {} Hz)",
                    name, low_hz, high_hz
                )
            }
            ConfigError::InvalidStabilityWindow { seconds } => {
                format!("Stability window must be positive (got {} s)", seconds)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
