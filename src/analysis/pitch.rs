// PitchEstimator - YIN fundamental frequency estimation
//
// This module estimates the fundamental frequency of a frame with the YIN
// algorithm and reports a confidence score alongside it.
//
// Algorithm:
// 1. Difference function d(τ) = Σ (x[i] - x[i+τ])² over the first half of the frame
// 2. Cumulative mean normalisation: d'(τ) = d(τ) · τ / Σ_{j=1..τ} d(j), d'(0) = 1
// 3. Absolute threshold: first τ ≥ 2 with d'(τ) below the threshold, then walk
//    down to the bottom of that dip
// 4. Parabolic interpolation around the dip for sub-sample period resolution
// 5. Range gate: periods outside the instrument range are reported as unpitched
//    with a scaled-down confidence
//
// References:
// - de Cheveigné, A. & Kawahara, H. (2002). YIN, a fundamental frequency estimator for speech and music

use serde::{Deserialize, Serialize};

use crate::config::PitchConfig;

/// Outcome class of a pitch estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PitchStatus {
    /// A period was found inside the instrument range
    Voiced,
    /// No lag dipped below the YIN threshold
    Unvoiced,
    /// Strong periodicity found, but its frequency lies outside the instrument range
    OutOfRange,
}

/// Fundamental frequency estimate of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct F0Estimate {
    /// Frequency in Hz, present only for [`PitchStatus::Voiced`]
    pub frequency_hz: Option<f64>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub status: PitchStatus,
}

impl F0Estimate {
    pub fn is_voiced(&self) -> bool {
        self.frequency_hz.is_some()
    }
}

/// Stateless YIN pitch estimator
///
/// Holds only its configuration and a reusable CMNDF buffer; no values carry
/// over between frames.
pub struct PitchEstimator {
    config: PitchConfig,
    cmndf: Vec<f64>,
}

impl PitchEstimator {
    pub fn new(config: PitchConfig) -> Self {
        Self {
            config,
            cmndf: Vec::new(),
        }
    }

    /// Estimate the fundamental of a time-domain frame
    ///
    /// # Arguments
    /// * `audio` - Time-domain frame
    /// * `sample_rate` - Sample rate in Hz
    pub fn estimate(&mut self, audio: &[f32], sample_rate: u32) -> F0Estimate {
        let half = audio.len() / 2;
        if half < 4 {
            return F0Estimate {
                frequency_hz: None,
                confidence: 0.0,
                status: PitchStatus::Unvoiced,
            };
        }

        self.compute_cmndf(audio, half);
        let cmndf = &self.cmndf;

        let Some(tau) = self.first_dip() else {
            let min_observed = cmndf[2..].iter().cloned().fold(f64::INFINITY, f64::min);
            return F0Estimate {
                frequency_hz: None,
                confidence: (1.0 - min_observed).clamp(0.0, 1.0),
                status: PitchStatus::Unvoiced,
            };
        };

        let refined_tau = if tau + 1 < half {
            let (s0, s1, s2) = (cmndf[tau - 1], cmndf[tau], cmndf[tau + 1]);
            let denom = 2.0 * (2.0 * s1 - s2 - s0);
            if denom != 0.0 {
                tau as f64 + (s2 - s0) / denom
            } else {
                tau as f64
            }
        } else {
            tau as f64
        };

        let frequency = sample_rate as f64 / refined_tau;
        let confidence = (1.0 - cmndf[tau]).clamp(0.0, 1.0);

        if frequency < self.config.min_frequency_hz || frequency > self.config.max_frequency_hz {
            return F0Estimate {
                frequency_hz: None,
                confidence: confidence * self.config.out_of_range_confidence_scale,
                status: PitchStatus::OutOfRange,
            };
        }

        F0Estimate {
            frequency_hz: Some(frequency),
            confidence,
            status: PitchStatus::Voiced,
        }
    }

    /// Fill `self.cmndf` for lags 0..half with direct squared-difference sums
    fn compute_cmndf(&mut self, audio: &[f32], half: usize) {
        self.cmndf.clear();
        self.cmndf.resize(half, 0.0);

        for tau in 1..half {
            let mut sum = 0.0f64;
            for i in 0..half {
                let d = audio[i] as f64 - audio[i + tau] as f64;
                sum += d * d;
            }
            self.cmndf[tau] = sum;
        }

        self.cmndf[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..half {
            running_sum += self.cmndf[tau];
            self.cmndf[tau] = if running_sum > 0.0 {
                self.cmndf[tau] * tau as f64 / running_sum
            } else {
                1.0
            };
        }
    }

    /// First lag ≥ 2 below the threshold, followed down to the local minimum
    fn first_dip(&self) -> Option<usize> {
        let threshold = self.config.yin_threshold;
        let half = self.cmndf.len();
        let mut tau = 2;
        while tau < half {
            if self.cmndf[tau] < threshold {
                while tau + 1 < half && self.cmndf[tau + 1] < self.cmndf[tau] {
                    tau += 1;
                }
                return Some(tau);
            }
            tau += 1;
        }
        None
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Nearest equal-tempered note name (A4 = 440 Hz), e.g. "A4" or "G3"
pub fn note_name(frequency_hz: f64) -> Option<String> {
    if !(frequency_hz > 0.0) || !frequency_hz.is_finite() {
        return None;
    }
    let midi = (69.0 + 12.0 * (frequency_hz / 440.0).log2()).round() as i64;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    Some(format!("{}{}", name, octave))
}
