// Bands module - Fixed-band relative energy descriptors
//
// Each perceptual band (richness, nasality, brilliance, harshness) is
// reported as the RMS magnitude of its bins relative to the RMS magnitude of
// the whole spectrum, in dB:
//
//   level = 20 · log10(band_rms / total_rms + 1e-10)
//
// Band edges map to their nearest bins and are inclusive. A band with no
// bins, or a spectrum with no energy, reports the configured floor.
//
// References:
// - Dünnwald, H. (1991). Deduction of objective quality parameters on old and new violins

use crate::analysis::features::types::Spectrum;
use crate::config::{BandConfig, BandRange};

const RATIO_EPSILON: f64 = 1e-10;

/// Relative levels of the four perceptual bands (dB)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels {
    pub richness: f64,
    pub nasality: f64,
    pub brilliance: f64,
    pub harshness: f64,
}

/// Band energy feature computation functions
pub struct BandFeatures {
    config: BandConfig,
}

impl BandFeatures {
    pub fn new(config: BandConfig) -> Self {
        Self { config }
    }

    /// Compute all four band levels for a spectrum
    pub fn compute(&self, spectrum: &Spectrum) -> BandLevels {
        let total_rms = rms_of(&spectrum.linear()[1.min(spectrum.len())..]);

        BandLevels {
            richness: self.band_level(spectrum, self.config.richness, total_rms),
            nasality: self.band_level(spectrum, self.config.nasality, total_rms),
            brilliance: self.band_level(spectrum, self.config.brilliance, total_rms),
            harshness: self.band_level(spectrum, self.config.harshness, total_rms),
        }
    }

    fn band_level(&self, spectrum: &Spectrum, band: BandRange, total_rms: Option<f64>) -> f64 {
        let linear = spectrum.linear();
        let Some(last_bin) = linear.len().checked_sub(1) else {
            return self.config.floor_db;
        };

        let lo = spectrum.frequency_to_bin(band.low_hz);
        let hi = spectrum.frequency_to_bin(band.high_hz).min(last_bin);
        if lo > hi {
            return self.config.floor_db;
        }

        match (rms_of(&linear[lo..=hi]), total_rms) {
            (Some(band_rms), Some(total_rms)) if total_rms > 0.0 => {
                20.0 * (band_rms / total_rms + RATIO_EPSILON).log10()
            }
            _ => self.config.floor_db,
        }
    }
}

fn rms_of(magnitudes: &[f64]) -> Option<f64> {
    if magnitudes.is_empty() {
        return None;
    }
    let energy: f64 = magnitudes.iter().map(|&mag| mag * mag).sum();
    Some((energy / magnitudes.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::fft::FftProcessor;
    use crate::fixtures;

    fn spectrum_of(signal: &[f32]) -> Spectrum {
        FftProcessor::new(4096, 48000)
            .unwrap()
            .compute_spectrum(signal)
    }

    #[test]
    fn test_tone_lights_up_its_band() {
        let bands = BandFeatures::new(BandConfig::default());
        // 2 kHz falls in the brilliance band only
        let levels = bands.compute(&spectrum_of(&fixtures::sine(48000, 2000.0, 0.5, 4096)));

        assert!(
            levels.brilliance > levels.richness + 20.0,
            "brilliance {} should dominate richness {}",
            levels.brilliance,
            levels.richness
        );
        assert!(levels.brilliance > levels.nasality + 20.0);
        assert!(levels.brilliance > levels.harshness + 20.0);
        // A narrow-band tone concentrates energy, so its band RMS exceeds the total RMS
        assert!(levels.brilliance > 0.0);
    }

    #[test]
    fn test_silent_spectrum_reports_floor() {
        let bands = BandFeatures::new(BandConfig::default());
        let levels = bands.compute(&Spectrum::from_linear(vec![0.0; 2049], 48000, 4096));
        assert_eq!(levels.richness, -60.0);
        assert_eq!(levels.nasality, -60.0);
        assert_eq!(levels.brilliance, -60.0);
        assert_eq!(levels.harshness, -60.0);
    }

    #[test]
    fn test_band_beyond_spectrum_reports_floor() {
        let config = BandConfig {
            harshness: BandRange::new(30000.0, 40000.0),
            ..BandConfig::default()
        };
        let bands = BandFeatures::new(config);
        let levels = bands.compute(&spectrum_of(&fixtures::white_noise(4096, 0.5, 3)));
        assert_eq!(levels.harshness, -60.0);
        // Flat noise puts every in-range band near 0 dB relative to the whole spectrum
        assert!(levels.richness.abs() < 3.0, "richness = {}", levels.richness);
    }
}
