// Types module - Data structures for the timbre feature pipeline
//
// This module defines the core data structures passed between the stages of
// the feature extraction pipeline: the borrowed input frame, the dB spectrum,
// the harmonic partial set and the output feature vector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::MetricKey;

/// Level reported for bins with negligible energy (dB)
pub const SPECTRUM_FLOOR_DB: f64 = -100.0;

/// One analysis frame delivered by the capture layer
///
/// The sample buffer is owned by the caller and only borrowed for the
/// duration of a single `process` call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Time-domain samples, exactly `fft_size` long
    pub samples: &'a [f32],
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Capture timestamp in milliseconds
    pub timestamp_ms: f64,
    /// Optional monotonically increasing sequence number (drop detection is the caller's job)
    pub sequence: Option<u64>,
}

impl<'a> Frame<'a> {
    pub fn new(samples: &'a [f32], sample_rate: u32, timestamp_ms: f64) -> Self {
        Self {
            samples,
            sample_rate,
            timestamp_ms,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

/// Magnitude spectrum of one frame
///
/// Holds `fft_size / 2 + 1` bins in dB (floored at -100 dB) together with the
/// linear magnitudes, so downstream descriptors do not convert back and forth
/// per metric. The linear view is not floored: a bin reported at -100 dB keeps
/// its true (smaller) linear magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    db: Vec<f64>,
    linear: Vec<f64>,
    sample_rate: u32,
    fft_size: usize,
}

impl Spectrum {
    /// Build a spectrum from linear magnitudes, flooring the dB view
    pub fn from_linear(linear: Vec<f64>, sample_rate: u32, fft_size: usize) -> Self {
        let db = linear.iter().map(|&magnitude| linear_to_db(magnitude)).collect();
        Self {
            db,
            linear,
            sample_rate,
            fft_size,
        }
    }

    /// Build a spectrum from dB magnitudes
    pub fn from_db(db: Vec<f64>, sample_rate: u32, fft_size: usize) -> Self {
        let linear = db.iter().map(|&level| db_to_linear(level)).collect();
        Self {
            db,
            linear,
            sample_rate,
            fft_size,
        }
    }

    /// Magnitudes in dB
    pub fn db(&self) -> &[f64] {
        &self.db
    }

    /// Linear magnitudes
    pub fn linear(&self) -> &[f64] {
        &self.linear
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency spacing between bins (Hz)
    pub fn bin_width(&self) -> f64 {
        self.sample_rate as f64 / self.fft_size as f64
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Centre frequency of a bin (Hz)
    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width()
    }

    /// Nearest bin for a frequency (may lie beyond the last bin)
    pub fn frequency_to_bin(&self, frequency_hz: f64) -> usize {
        (frequency_hz / self.bin_width()).round().max(0.0) as usize
    }
}

/// Convert a dB level to linear magnitude
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Convert a linear magnitude to dB, flooring negligible values
pub fn linear_to_db(magnitude: f64) -> f64 {
    if magnitude > 1e-10 {
        20.0 * magnitude.log10()
    } else {
        SPECTRUM_FLOOR_DB
    }
}

/// Peak magnitudes of the harmonic partials of one frame
///
/// Index 1 is the fundamental. Never longer than the configured harmonic
/// limit and never contains a partial at or above Nyquist.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSet {
    f0_hz: f64,
    magnitudes: Vec<f64>,
}

impl PartialSet {
    pub fn new(f0_hz: f64, magnitudes: Vec<f64>) -> Self {
        Self { f0_hz, magnitudes }
    }

    /// Fundamental frequency the partials were located from
    pub fn f0_hz(&self) -> f64 {
        self.f0_hz
    }

    /// Linear magnitudes, partial 1 first
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Magnitude of partial `index` (1-based)
    pub fn get(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.magnitudes.get(i))
            .copied()
    }

    /// Level of partial `index` (1-based) in dB, if present and positive
    pub fn level_db(&self, index: usize) -> Option<f64> {
        self.get(index)
            .filter(|&magnitude| magnitude > 0.0)
            .map(linear_to_db)
    }

    /// Sum of all partial magnitudes
    pub fn total(&self) -> f64 {
        self.magnitudes.iter().sum()
    }
}

/// Descriptor values of one non-silent frame
///
/// Every [`MetricKey`] is always present as a key; a value of `None` means the
/// descriptor was undefined for this frame (no pitch, too few partials, zero
/// energy). Absent values are never replaced by zero or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<MetricKey, Option<f64>>,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureVector {
    /// Create a vector with every metric absent
    pub fn new() -> Self {
        Self {
            values: MetricKey::ALL.iter().map(|&key| (key, None)).collect(),
        }
    }

    /// Store a value; non-finite numbers are recorded as absent
    pub fn set(&mut self, key: MetricKey, value: Option<f64>) {
        self.values.insert(key, value.filter(|v| v.is_finite()));
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values.get(&key).copied().flatten()
    }

    pub fn is_present(&self, key: MetricKey) -> bool {
        self.get(key).is_some()
    }

    /// All entries in canonical key order
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, Option<f64>)> + '_ {
        self.values.iter().map(|(&key, &value)| (key, value))
    }

    /// Entries whose value is present
    pub fn present(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        self.values
            .iter()
            .filter_map(|(&key, &value)| value.map(|v| (key, v)))
    }
}
