//! Metric catalog
//!
//! Every value the engine reports is identified by a [`MetricKey`]. The
//! catalog carries presentation metadata (label, unit, category, display
//! range) that reference comparison uses to normalise differences between
//! metrics with very different scales, plus the playing factor behind each
//! metric and the corrective hint for either direction of deviation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptor family a metric belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Spectrum,
    Harmonic,
    Band,
    Temporal,
}

impl MetricCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricCategory::Spectrum => "Spectral shape",
            MetricCategory::Harmonic => "Harmonic structure",
            MetricCategory::Band => "Frequency bands",
            MetricCategory::Temporal => "Time & onset",
        }
    }
}

/// Presentation metadata for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricInfo {
    pub label: &'static str,
    pub unit: &'static str,
    pub category: MetricCategory,
    /// Typical display range (lo, hi)
    pub range: (f64, f64),
    /// Decimal places used when presenting the value
    pub decimals: usize,
    /// Playing technique that mainly drives this metric
    pub factor: &'static str,
    /// Hint when the value is above the reference
    pub tip_up: Option<&'static str>,
    /// Hint when the value is below the reference
    pub tip_down: Option<&'static str>,
}

impl MetricInfo {
    const fn new(
        label: &'static str,
        unit: &'static str,
        category: MetricCategory,
        range: (f64, f64),
        decimals: usize,
    ) -> Self {
        Self {
            label,
            unit,
            category,
            range,
            decimals,
            factor: "",
            tip_up: None,
            tip_down: None,
        }
    }

    const fn advice(
        self,
        factor: &'static str,
        tip_up: Option<&'static str>,
        tip_down: Option<&'static str>,
    ) -> Self {
        Self {
            factor,
            tip_up,
            tip_down,
            ..self
        }
    }

    /// Width of the display range
    pub fn span(&self) -> f64 {
        self.range.1 - self.range.0
    }

    /// Format a value with the metric's precision
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

/// Identifier of every metric in a [`crate::analysis::features::FeatureVector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    // Spectral shape
    SpectralCentroid,
    SpectralSpread,
    SpectralSlope,
    #[serde(rename = "sfm")]
    SpectralFlatness,
    SpectralFlux,
    SpectralRolloff85,
    SpectralRolloff95,
    SpectralIrregularity,

    // Harmonic structure
    #[serde(rename = "t1")]
    Tristimulus1,
    #[serde(rename = "t2")]
    Tristimulus2,
    #[serde(rename = "t3")]
    Tristimulus3,
    OddEvenRatio,
    Hnr,
    HarmonicSlope,
    Aperiodicity,
    Partial1,
    Partial2,
    Partial3,
    Partial4,
    Partial5,
    Partial6,
    Partial7,
    Partial8,

    // Frequency bands
    Richness,
    Nasality,
    Brilliance,
    Harshness,
    LowFrequencyRatio,

    // Time & onset
    Rms,
    F0,
    F0Confidence,
    F0Stability,
    CentroidStability,
    AttackTime,
    TimeSinceOnset,
}

impl MetricKey {
    /// All metrics in canonical reporting order
    pub const ALL: [MetricKey; 35] = [
        MetricKey::SpectralCentroid,
        MetricKey::SpectralSpread,
        MetricKey::SpectralSlope,
        MetricKey::SpectralFlatness,
        MetricKey::SpectralFlux,
        MetricKey::SpectralRolloff85,
        MetricKey::SpectralRolloff95,
        MetricKey::SpectralIrregularity,
        MetricKey::Tristimulus1,
        MetricKey::Tristimulus2,
        MetricKey::Tristimulus3,
        MetricKey::OddEvenRatio,
        MetricKey::Hnr,
        MetricKey::HarmonicSlope,
        MetricKey::Aperiodicity,
        MetricKey::Partial1,
        MetricKey::Partial2,
        MetricKey::Partial3,
        MetricKey::Partial4,
        MetricKey::Partial5,
        MetricKey::Partial6,
        MetricKey::Partial7,
        MetricKey::Partial8,
        MetricKey::Richness,
        MetricKey::Nasality,
        MetricKey::Brilliance,
        MetricKey::Harshness,
        MetricKey::LowFrequencyRatio,
        MetricKey::Rms,
        MetricKey::F0,
        MetricKey::F0Confidence,
        MetricKey::F0Stability,
        MetricKey::CentroidStability,
        MetricKey::AttackTime,
        MetricKey::TimeSinceOnset,
    ];

    /// Individual partial level keys, partial 1 first
    pub const PARTIALS: [MetricKey; 8] = [
        MetricKey::Partial1,
        MetricKey::Partial2,
        MetricKey::Partial3,
        MetricKey::Partial4,
        MetricKey::Partial5,
        MetricKey::Partial6,
        MetricKey::Partial7,
        MetricKey::Partial8,
    ];

    /// Stable string key used by hosts and serialized vectors
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::SpectralCentroid => "spectralCentroid",
            MetricKey::SpectralSpread => "spectralSpread",
            MetricKey::SpectralSlope => "spectralSlope",
            MetricKey::SpectralFlatness => "sfm",
            MetricKey::SpectralFlux => "spectralFlux",
            MetricKey::SpectralRolloff85 => "spectralRolloff85",
            MetricKey::SpectralRolloff95 => "spectralRolloff95",
            MetricKey::SpectralIrregularity => "spectralIrregularity",
            MetricKey::Tristimulus1 => "t1",
            MetricKey::Tristimulus2 => "t2",
            MetricKey::Tristimulus3 => "t3",
            MetricKey::OddEvenRatio => "oddEvenRatio",
            MetricKey::Hnr => "hnr",
            MetricKey::HarmonicSlope => "harmonicSlope",
            MetricKey::Aperiodicity => "aperiodicity",
            MetricKey::Partial1 => "partial1",
            MetricKey::Partial2 => "partial2",
            MetricKey::Partial3 => "partial3",
            MetricKey::Partial4 => "partial4",
            MetricKey::Partial5 => "partial5",
            MetricKey::Partial6 => "partial6",
            MetricKey::Partial7 => "partial7",
            MetricKey::Partial8 => "partial8",
            MetricKey::Richness => "richness",
            MetricKey::Nasality => "nasality",
            MetricKey::Brilliance => "brilliance",
            MetricKey::Harshness => "harshness",
            MetricKey::LowFrequencyRatio => "lowFrequencyRatio",
            MetricKey::Rms => "rms",
            MetricKey::F0 => "f0",
            MetricKey::F0Confidence => "f0Confidence",
            MetricKey::F0Stability => "f0Stability",
            MetricKey::CentroidStability => "centroidStability",
            MetricKey::AttackTime => "attackTime",
            MetricKey::TimeSinceOnset => "timeSinceOnset",
        }
    }

    /// Look up a key by its string form
    pub fn from_key(key: &str) -> Option<MetricKey> {
        KEY_LOOKUP.get(key).copied()
    }

    /// Presentation metadata and playing advice
    pub fn info(&self) -> MetricInfo {
        let (factor, tip_up, tip_down) = self.advice();
        self.display().advice(factor, tip_up, tip_down)
    }

    fn display(&self) -> MetricInfo {
        use MetricCategory::*;
        match self {
            MetricKey::SpectralCentroid => {
                MetricInfo::new("Brightness", "Hz", Spectrum, (500.0, 4000.0), 0)
            }
            MetricKey::SpectralSpread => {
                MetricInfo::new("Spread", "Hz", Spectrum, (200.0, 2000.0), 0)
            }
            MetricKey::SpectralSlope => {
                MetricInfo::new("Spectral slope", "dB/Hz", Spectrum, (-0.01, 0.0), 4)
            }
            MetricKey::SpectralFlatness => {
                MetricInfo::new("Noisiness", "", Spectrum, (0.0, 0.3), 3)
            }
            MetricKey::SpectralFlux => {
                MetricInfo::new("Spectral change", "dB", Spectrum, (0.0, 10.0), 2)
            }
            MetricKey::SpectralRolloff85 => {
                MetricInfo::new("Rolloff 85%", "Hz", Spectrum, (500.0, 8000.0), 0)
            }
            MetricKey::SpectralRolloff95 => {
                MetricInfo::new("Rolloff 95%", "Hz", Spectrum, (1000.0, 12000.0), 0)
            }
            MetricKey::SpectralIrregularity => {
                MetricInfo::new("Smoothness", "", Spectrum, (0.0, 0.8), 3)
            }
            MetricKey::Tristimulus1 => {
                MetricInfo::new("Fundamental strength", "", Harmonic, (0.0, 0.6), 3)
            }
            MetricKey::Tristimulus2 => {
                MetricInfo::new("Mid harmonics", "", Harmonic, (0.0, 0.6), 3)
            }
            MetricKey::Tristimulus3 => {
                MetricInfo::new("High harmonics", "", Harmonic, (0.0, 0.5), 3)
            }
            MetricKey::OddEvenRatio => {
                MetricInfo::new("Odd/even ratio", "", Harmonic, (0.5, 2.0), 2)
            }
            MetricKey::Hnr => MetricInfo::new("Clarity (HNR)", "dB", Harmonic, (0.0, 40.0), 1),
            MetricKey::HarmonicSlope => {
                MetricInfo::new("Harmonic decay", "dB/partial", Harmonic, (-10.0, 0.0), 2)
            }
            MetricKey::Aperiodicity => {
                MetricInfo::new("Aperiodicity", "", Harmonic, (0.0, 1.0), 3)
            }
            MetricKey::Partial1 => MetricInfo::new("Partial 1", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial2 => MetricInfo::new("Partial 2", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial3 => MetricInfo::new("Partial 3", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial4 => MetricInfo::new("Partial 4", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial5 => MetricInfo::new("Partial 5", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial6 => MetricInfo::new("Partial 6", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial7 => MetricInfo::new("Partial 7", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Partial8 => MetricInfo::new("Partial 8", "dB", Harmonic, (-80.0, 0.0), 1),
            MetricKey::Richness => MetricInfo::new("Richness", "dB", Band, (-20.0, 10.0), 1),
            MetricKey::Nasality => MetricInfo::new("Nasality", "dB", Band, (-20.0, 10.0), 1),
            MetricKey::Brilliance => MetricInfo::new("Brilliance", "dB", Band, (-20.0, 10.0), 1),
            MetricKey::Harshness => MetricInfo::new("Harshness", "dB", Band, (-20.0, 10.0), 1),
            MetricKey::LowFrequencyRatio => {
                MetricInfo::new("Rumble", "", Band, (0.0, 0.2), 3)
            }
            MetricKey::Rms => MetricInfo::new("Loudness", "dB", Temporal, (-50.0, 0.0), 1),
            MetricKey::F0 => MetricInfo::new("Pitch", "Hz", Temporal, (196.0, 880.0), 1),
            MetricKey::F0Confidence => {
                MetricInfo::new("Pitch confidence", "", Temporal, (0.0, 1.0), 2)
            }
            MetricKey::F0Stability => {
                MetricInfo::new("Pitch stability", "cents", Temporal, (0.0, 50.0), 1)
            }
            MetricKey::CentroidStability => {
                MetricInfo::new("Tone stability", "Hz", Temporal, (0.0, 500.0), 1)
            }
            MetricKey::AttackTime => MetricInfo::new("Attack", "ms", Temporal, (0.0, 200.0), 0),
            MetricKey::TimeSinceOnset => {
                MetricInfo::new("Time since onset", "ms", Temporal, (0.0, 10_000.0), 0)
            }
        }
    }

    /// Playing factor and (above, below) hints
    fn advice(&self) -> (&'static str, Option<&'static str>, Option<&'static str>) {
        const PRESSURE: &str = "Bow pressure";
        const PRESSURE_CONTACT: &str = "Bow pressure, contact point";
        const CONTACT: &str = "Contact point";
        const LEFT_HAND: &str = "Left hand";
        const LIGHTER: &str = "Lighten the bow pressure";
        const LIGHTER_AWAY: &str = "Lighten the bow / play further from the bridge";
        const HEAVIER_CLOSER: &str = "Press a little more / play closer to the bridge";
        const LITTLE_HEAVIER: &str = "Add a little bow pressure";

        match self {
            MetricKey::SpectralCentroid
            | MetricKey::SpectralRolloff85
            | MetricKey::SpectralRolloff95 => (PRESSURE, Some(LIGHTER_AWAY), Some(HEAVIER_CLOSER)),
            MetricKey::SpectralSpread => (
                CONTACT,
                Some("Keep the contact point steady"),
                Some("Try a different contact point"),
            ),
            MetricKey::SpectralSlope | MetricKey::Tristimulus3 => {
                (PRESSURE_CONTACT, Some(LIGHTER), Some(LITTLE_HEAVIER))
            }
            MetricKey::SpectralFlatness => ("Bow pressure (too much when high)", Some(LIGHTER), None),
            MetricKey::SpectralFlux => ("Bow steadiness", Some("Steady the bow"), None),
            MetricKey::SpectralIrregularity => {
                (PRESSURE, Some("Keep the bow pressure more even"), None)
            }
            MetricKey::Tristimulus1 => (
                PRESSURE_CONTACT,
                Some("Play further from the bridge"),
                Some("Play closer to the bridge"),
            ),
            MetricKey::Tristimulus2 => (
                "Bow speed, contact point",
                Some("Adjust the bow speed"),
                Some("Increase the bow speed"),
            ),
            MetricKey::OddEvenRatio => (
                "Contact point (β)",
                Some("Fine-tune the contact point"),
                Some("Fine-tune the contact point"),
            ),
            MetricKey::Hnr => (
                "Bow pressure, bow speed",
                None,
                Some("Balance bow pressure against bow speed"),
            ),
            MetricKey::Aperiodicity => (
                "Bow pressure, bow speed",
                Some("Balance bow pressure against bow speed"),
                None,
            ),
            MetricKey::HarmonicSlope => (
                PRESSURE,
                Some("Adjust the bow pressure"),
                Some("Adjust the bow pressure"),
            ),
            MetricKey::Partial1
            | MetricKey::Partial2
            | MetricKey::Partial3
            | MetricKey::Partial4
            | MetricKey::Partial5
            | MetricKey::Partial6
            | MetricKey::Partial7
            | MetricKey::Partial8 => (PRESSURE_CONTACT, None, None),
            MetricKey::Richness => (
                "Bow speed, contact point",
                None,
                Some("Increase the bow speed / move slightly away from the bridge"),
            ),
            MetricKey::Nasality => (CONTACT, Some("Adjust the contact point"), None),
            MetricKey::Brilliance => (PRESSURE, Some(LIGHTER), Some("Put more weight into the bow")),
            MetricKey::Harshness => ("Bow pressure (too much when high)", Some(LIGHTER_AWAY), None),
            MetricKey::LowFrequencyRatio => {
                ("Instrument handling", Some("Reduce handling and bow noise"), None)
            }
            MetricKey::Rms => (
                "Bow speed × bow pressure",
                Some("Slow the bow down"),
                Some("Speed the bow up"),
            ),
            MetricKey::F0 => (LEFT_HAND, Some("Bring the pitch down"), Some("Bring the pitch up")),
            MetricKey::F0Confidence => ("Left hand, bow steadiness", None, None),
            MetricKey::F0Stability => (LEFT_HAND, Some("Steady the left hand"), None),
            MetricKey::CentroidStability => ("Bow consistency", Some("Keep the bow even"), None),
            MetricKey::AttackTime => ("Bow start", Some("Set the bow in more quickly"), None),
            MetricKey::TimeSinceOnset => ("Bow changes", None, None),
        }
    }
}

static KEY_LOOKUP: Lazy<HashMap<&'static str, MetricKey>> =
    Lazy::new(|| MetricKey::ALL.iter().map(|key| (key.as_str(), *key)).collect());
