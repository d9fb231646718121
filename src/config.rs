//! Configuration management for the timbre analysis engine
//!
//! Every empirically tuned constant (gate levels, YIN threshold, band edges,
//! stability window, reference comparison tolerances) lives here so that the
//! engine can be exercised against synthetic inputs with different settings.
//! Configuration is loaded from JSON and validated once, before a session is
//! configured.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Smallest FFT size the pipeline accepts
pub const MIN_FFT_SIZE: usize = 64;

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub pitch: PitchConfig,
    pub onset: OnsetConfig,
    pub stability: StabilityConfig,
    pub spectral: SpectralConfig,
    pub bands: BandConfig,
    pub reference: ReferenceConfig,
}

/// Frame-level analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT length in samples; every frame must have exactly this many samples
    pub fft_size: usize,
    /// Maximum number of harmonic partials extracted per frame
    pub max_harmonics: usize,
    /// Number of individual partial levels reported (partial1..partialN)
    pub partial_levels: usize,
    /// Frames whose RMS falls below this level (dBFS) produce no features
    pub silence_gate_db: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            max_harmonics: 20,
            partial_levels: 8,
            silence_gate_db: -55.0,
        }
    }
}

/// Fundamental frequency estimator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Absolute CMNDF threshold for accepting a period candidate
    pub yin_threshold: f64,
    /// Lowest accepted fundamental (Hz)
    pub min_frequency_hz: f64,
    /// Highest accepted fundamental (Hz)
    pub max_frequency_hz: f64,
    /// Confidence multiplier applied when a period is found but its frequency is out of range
    pub out_of_range_confidence_scale: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            yin_threshold: 0.15,
            // Just below open G3 (196 Hz) up to the top of the fingerboard harmonics
            min_frequency_hz: 180.0,
            max_frequency_hz: 4800.0,
            out_of_range_confidence_scale: 0.3,
        }
    }
}

/// Onset state machine thresholds (RMS dBFS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    pub silence_threshold_db: f64,
    pub sound_threshold_db: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: -50.0,
            sound_threshold_db: -35.0,
        }
    }
}

/// Rolling stability window parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Real-time span covered by the rolling windows; converted to a frame count at configure time
    pub window_seconds: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_seconds: 0.5,
        }
    }
}

impl StabilityConfig {
    /// Number of frames covering `window_seconds` at the given frame rate (at least 2)
    pub fn capacity_for(&self, sample_rate: u32, hop_size: usize) -> usize {
        let frames_per_second = sample_rate as f64 / hop_size.max(1) as f64;
        ((self.window_seconds * frames_per_second).round() as usize).max(2)
    }
}

/// Spectral shape descriptor parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Lower edge of the spectral slope regression (Hz)
    pub slope_min_hz: f64,
    /// Upper edge of the spectral slope regression (Hz)
    pub slope_max_hz: f64,
    /// Energy below this frequency counts towards the low-frequency ratio (Hz)
    pub low_frequency_cutoff_hz: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            slope_min_hz: 100.0,
            slope_max_hz: 10_000.0,
            low_frequency_cutoff_hz: 100.0,
        }
    }
}

/// Inclusive frequency band in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl BandRange {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }
}

/// Perceptual (Dünnwald) band edges for bowed-string tone quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    pub richness: BandRange,
    pub nasality: BandRange,
    pub brilliance: BandRange,
    pub harshness: BandRange,
    /// Level reported when a band or the whole spectrum holds no energy (dB)
    pub floor_db: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            richness: BandRange::new(190.0, 650.0),
            nasality: BandRange::new(650.0, 1300.0),
            brilliance: BandRange::new(1300.0, 4200.0),
            harshness: BandRange::new(4200.0, 6400.0),
            floor_db: -60.0,
        }
    }
}

impl BandConfig {
    /// Bands paired with their names, in reporting order
    pub fn named(&self) -> [(&'static str, BandRange); 4] {
        [
            ("richness", self.richness),
            ("nasality", self.nasality),
            ("brilliance", self.brilliance),
            ("harshness", self.harshness),
        ]
    }
}

/// Reference capture and comparison parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Duration of a reference capture (ms)
    pub capture_duration_ms: f64,
    /// Minimum non-silent frames required to build a reference
    pub min_frames: usize,
    /// Differences below this fraction of the display range count as a match
    pub match_tolerance: f64,
    /// Relative deviation (%) above which a difference is moderate
    pub moderate_deviation_pct: f64,
    /// Relative deviation (%) above which a difference is major
    pub major_deviation_pct: f64,
    /// Number of largest deviations surfaced to the player
    pub top_n: usize,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            capture_duration_ms: 3000.0,
            min_frames: 5,
            match_tolerance: 0.02,
            moderate_deviation_pct: 15.0,
            major_deviation_pct: 30.0,
            top_n: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// not valid JSON. Validation is left to [`EngineConfig::validate`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Parse configuration from a JSON string; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check every session-independent constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fft_size = self.analysis.fft_size;
        if fft_size < MIN_FFT_SIZE || !fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo { fft_size });
        }

        let pitch = &self.pitch;
        if !(pitch.min_frequency_hz > 0.0 && pitch.min_frequency_hz < pitch.max_frequency_hz) {
            return Err(ConfigError::InvalidPitchRange {
                min_hz: pitch.min_frequency_hz,
                max_hz: pitch.max_frequency_hz,
            });
        }
        if !(pitch.yin_threshold > 0.0 && pitch.yin_threshold < 1.0) {
            return Err(ConfigError::InvalidYinThreshold {
                threshold: pitch.yin_threshold,
            });
        }

        if self.onset.silence_threshold_db >= self.onset.sound_threshold_db {
            return Err(ConfigError::InvalidOnsetThresholds {
                silence_db: self.onset.silence_threshold_db,
                sound_db: self.onset.sound_threshold_db,
            });
        }

        for (name, band) in self.bands.named() {
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz) {
                return Err(ConfigError::InvalidBand {
                    name: name.to_string(),
                    low_hz: band.low_hz,
                    high_hz: band.high_hz,
                });
            }
        }
        let slope = &self.spectral;
        if !(slope.slope_min_hz >= 0.0 && slope.slope_min_hz < slope.slope_max_hz) {
            return Err(ConfigError::InvalidBand {
                name: "slope".to_string(),
                low_hz: slope.slope_min_hz,
                high_hz: slope.slope_max_hz,
            });
        }

        if !(self.stability.window_seconds > 0.0) {
            return Err(ConfigError::InvalidStabilityWindow {
                seconds: self.stability.window_seconds,
            });
        }

        Ok(())
    }

    /// Validate the configuration together with the capture parameters of a session
    pub fn validate_session(&self, sample_rate: u32, hop_size: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate { sample_rate });
        }
        if hop_size == 0 || hop_size > self.analysis.fft_size {
            return Err(ConfigError::InvalidHopSize { hop_size });
        }
        Ok(())
    }
}
