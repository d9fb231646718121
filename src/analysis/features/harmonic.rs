// Harmonic module - Partial extraction and harmonic-structure descriptors
//
// This module locates the harmonic partials of a pitched frame in the
// magnitude spectrum and derives the descriptors that depend on them:
// tristimulus, odd/even ratio, harmonic-to-noise ratio, aperiodicity,
// harmonic slope, partial levels and spectral irregularity.
//
// Partials are extracted once per frame and the resulting PartialSet is
// shared by every descriptor. When no partial set exists (no pitch, or
// fewer than two partials below Nyquist) every descriptor is absent.
//
// References:
// - Pollard, H. & Jansson, E. (1982). A tristimulus method for the specification of musical timbre
// - Jensen, K. (1999). Timbre models of musical sounds

use crate::analysis::features::spectral::regression_slope;
use crate::analysis::features::types::{PartialSet, Spectrum};

/// HNR reported when the spectrum holds no energy outside the harmonic windows (dB)
pub const HNR_CEILING_DB: f64 = 40.0;

/// Minimum number of partials for a frame to count as harmonic
const MIN_PARTIALS: usize = 2;

/// Minimum number of partials for the odd/even ratio
const MIN_ODD_EVEN_PARTIALS: usize = 3;

/// Harmonic and total spectral energy of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicEnergy {
    /// Squared magnitude inside the narrow windows around each partial
    pub harmonic: f64,
    /// Squared magnitude over every bin except DC
    pub total: f64,
}

impl HarmonicEnergy {
    pub fn noise(&self) -> f64 {
        self.total - self.harmonic
    }

    /// Harmonic-to-noise ratio in dB
    pub fn hnr_db(&self) -> Option<f64> {
        let noise = self.noise();
        if noise <= 0.0 {
            return Some(HNR_CEILING_DB);
        }
        (self.harmonic > 0.0).then(|| 10.0 * (self.harmonic / noise).log10())
    }

    /// Share of energy outside the harmonic windows, in [0, 1]
    pub fn aperiodicity(&self) -> Option<f64> {
        (self.total > 0.0).then(|| (self.noise() / self.total).clamp(0.0, 1.0))
    }
}

/// Partial extraction and harmonic descriptor functions
pub struct HarmonicFeatures {
    max_harmonics: usize,
}

impl HarmonicFeatures {
    /// Create a new harmonic features processor
    ///
    /// # Arguments
    /// * `max_harmonics` - Upper bound on the number of partials per frame
    pub fn new(max_harmonics: usize) -> Self {
        Self { max_harmonics }
    }

    /// Locate the peak magnitude of each harmonic of `f0_hz`
    ///
    /// For h = 1, 2, ... the target h·f0 is mapped to its nearest bin and the
    /// largest linear magnitude within ±max(2, ceil(f0_bins / 2)) bins is taken,
    /// which tolerates slight mistuning. Extraction stops at the harmonic limit
    /// or once h·f0 reaches Nyquist.
    ///
    /// # Returns
    /// `None` if `f0_hz` is absent or fewer than two partials were found
    pub fn extract_partials(&self, f0_hz: Option<f64>, spectrum: &Spectrum) -> Option<PartialSet> {
        let f0 = f0_hz.filter(|&f| f > 0.0)?;
        let linear = spectrum.linear();
        if linear.len() < 2 {
            return None;
        }

        let f0_bins = f0 / spectrum.bin_width();
        let radius = ((f0_bins / 2.0).ceil() as usize).max(2);
        let last_bin = linear.len() - 1;

        let mut magnitudes = Vec::with_capacity(self.max_harmonics);
        for h in 1..=self.max_harmonics {
            let target = h as f64 * f0;
            if target >= spectrum.nyquist() {
                break;
            }

            let center = spectrum.frequency_to_bin(target).min(last_bin);
            let lo = center.saturating_sub(radius).max(1);
            let hi = (center + radius).min(last_bin);
            let peak = linear[lo..=hi].iter().cloned().fold(0.0, f64::max);
            magnitudes.push(peak);
        }

        (magnitudes.len() >= MIN_PARTIALS).then(|| PartialSet::new(f0, magnitudes))
    }

    /// Split harmonic energy into fundamental, partials 2-4 and partials 5+
    ///
    /// # Returns
    /// `[T1, T2, T3]`, each a share of the summed partial magnitudes
    pub fn tristimulus(&self, partials: &PartialSet) -> Option<[f64; 3]> {
        let total = partials.total();
        if total <= 0.0 {
            return None;
        }

        let magnitudes = partials.magnitudes();
        let t1 = magnitudes[0];
        let t2: f64 = magnitudes.iter().skip(1).take(3).sum();
        let t3: f64 = magnitudes.iter().skip(4).sum();

        Some([t1 / total, t2 / total, t3 / total])
    }

    /// Odd/even harmonic ratio: sqrt(Σ odd partial power / Σ even partial power)
    ///
    /// Partial indices are 1-based, so the fundamental counts as odd.
    pub fn odd_even_ratio(&self, partials: &PartialSet) -> Option<f64> {
        if partials.len() < MIN_ODD_EVEN_PARTIALS {
            return None;
        }

        let (odd, even) = partials
            .magnitudes()
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(odd, even), (i, &mag)| {
                if i % 2 == 0 {
                    (odd + mag * mag, even)
                } else {
                    (odd, even + mag * mag)
                }
            });

        (even > 0.0).then(|| (odd / even).sqrt())
    }

    /// Harmonic energy around each partial against total spectral energy
    ///
    /// The harmonic window radius is max(1, ceil(f0_bins / 4)); overlapping
    /// windows never count a bin twice.
    pub fn harmonic_energy(&self, partials: &PartialSet, spectrum: &Spectrum) -> HarmonicEnergy {
        let linear = spectrum.linear();
        let total: f64 = linear.iter().skip(1).map(|&mag| mag * mag).sum();
        if linear.len() < 2 {
            return HarmonicEnergy {
                harmonic: 0.0,
                total,
            };
        }

        let f0 = partials.f0_hz();
        let radius = ((f0 / spectrum.bin_width() / 4.0).ceil() as usize).max(1);
        let last_bin = linear.len() - 1;

        let mut harmonic = 0.0;
        let mut next_free = 1;
        for h in 1..=partials.len() {
            let center = spectrum.frequency_to_bin(h as f64 * f0).min(last_bin);
            let lo = center.saturating_sub(radius).max(next_free);
            let hi = (center + radius).min(last_bin);
            if lo > hi {
                continue;
            }
            harmonic += linear[lo..=hi].iter().map(|&mag| mag * mag).sum::<f64>();
            next_free = hi + 1;
        }

        HarmonicEnergy { harmonic, total }
    }

    /// Regression slope of partial level (dB) against partial index
    ///
    /// Only partials with positive magnitude take part.
    pub fn harmonic_slope(&self, partials: &PartialSet) -> Option<f64> {
        let points = (1..=partials.len())
            .filter_map(|index| partials.level_db(index).map(|db| (index as f64, db)));

        regression_slope(points)
    }

    /// Levels in dB of partials 1..=count, absent per index
    pub fn partial_levels(&self, partials: &PartialSet, count: usize) -> Vec<Option<f64>> {
        (1..=count).map(|index| partials.level_db(index)).collect()
    }

    /// Spectral irregularity: Σ|a_k - a_(k+1)| / Σa_k over the partial magnitudes
    pub fn irregularity(&self, partials: &PartialSet) -> Option<f64> {
        let total = partials.total();
        if total <= 0.0 {
            return None;
        }

        let variation: f64 = partials
            .magnitudes()
            .windows(2)
            .map(|pair| (pair[0] - pair[1]).abs())
            .sum();

        Some(variation / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::fft::FftProcessor;
    use crate::fixtures;

    const SAMPLE_RATE: u32 = 48000;
    const FFT_SIZE: usize = 4096;

    fn spectrum_of(signal: &[f32]) -> Spectrum {
        FftProcessor::new(FFT_SIZE, SAMPLE_RATE)
            .unwrap()
            .compute_spectrum(signal)
    }

    fn harmonic() -> HarmonicFeatures {
        HarmonicFeatures::new(20)
    }

    #[test]
    fn test_no_partials_without_pitch() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 440.0, 0.5, FFT_SIZE));
        assert!(harmonic().extract_partials(None, &spectrum).is_none());
    }

    #[test]
    fn test_partials_capped_at_harmonic_limit() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 1000.0, 0.5, FFT_SIZE));
        let partials = harmonic()
            .extract_partials(Some(1000.0), &spectrum)
            .expect("1 kHz should yield partials");
        assert_eq!(partials.len(), 20);
    }

    #[test]
    fn test_partials_stop_at_nyquist() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 4000.0, 0.5, FFT_SIZE));
        let partials = harmonic()
            .extract_partials(Some(4000.0), &spectrum)
            .expect("4 kHz should yield partials");
        // 6 × 4000 Hz = 24000 Hz is Nyquist itself
        assert_eq!(partials.len(), 5);
    }

    #[test]
    fn test_single_partial_is_absent() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 15000.0, 0.5, FFT_SIZE));
        assert!(harmonic().extract_partials(Some(15000.0), &spectrum).is_none());
    }

    #[test]
    fn test_pure_sine_descriptors() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 440.0, 0.5, FFT_SIZE));
        let features = harmonic();
        let partials = features.extract_partials(Some(440.0), &spectrum).unwrap();

        let [t1, t2, t3] = features.tristimulus(&partials).unwrap();
        assert!(t1 > 0.95, "T1 should dominate, got {}", t1);
        assert!((t1 + t2 + t3 - 1.0).abs() < 1e-9);

        let energy = features.harmonic_energy(&partials, &spectrum);
        let hnr = energy.hnr_db().unwrap();
        assert!(hnr > 20.0, "HNR {} dB too low for a pure tone", hnr);
        let aperiodicity = energy.aperiodicity().unwrap();
        assert!(aperiodicity < 0.1, "aperiodicity {} too high", aperiodicity);

        let slope = features.harmonic_slope(&partials).unwrap();
        assert!(slope < 0.0, "partial levels should fall off, got {}", slope);
    }

    #[test]
    fn test_harmonic_tone_balance() {
        let signal = fixtures::harmonic_tone(SAMPLE_RATE, 220.0, &[1.0, 0.5, 0.25], FFT_SIZE);
        let spectrum = spectrum_of(&signal);
        let features = harmonic();
        let partials = features.extract_partials(Some(220.0), &spectrum).unwrap();

        let [t1, t2, _] = features.tristimulus(&partials).unwrap();
        assert!((t1 - 1.0 / 1.75).abs() < 0.05, "T1 = {}", t1);
        assert!((t2 - 0.75 / 1.75).abs() < 0.05, "T2 = {}", t2);

        // sqrt((1 + 0.0625) / 0.25) ≈ 2.06, allowing for Hann scalloping
        let ratio = features.odd_even_ratio(&partials).unwrap();
        assert!(ratio > 1.7 && ratio < 2.6, "odd/even ratio = {}", ratio);

        let levels = features.partial_levels(&partials, 8);
        assert_eq!(levels.len(), 8);
        assert!(levels[0].unwrap() > levels[1].unwrap());
        assert!(levels[1].unwrap() > levels[2].unwrap());
    }

    #[test]
    fn test_partial_level_of_on_bin_sine() {
        // 1500 Hz sits exactly on bin 128
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 1500.0, 1.0, FFT_SIZE));
        let features = harmonic();
        let partials = features.extract_partials(Some(1500.0), &spectrum).unwrap();
        let level = features.partial_levels(&partials, 1)[0].unwrap();
        assert!((level - (-6.02)).abs() < 0.2, "level = {} dB", level);
    }

    #[test]
    fn test_odd_even_requires_three_partials() {
        let features = harmonic();
        assert!(features
            .odd_even_ratio(&PartialSet::new(440.0, vec![1.0, 0.5]))
            .is_none());
        assert!(features
            .odd_even_ratio(&PartialSet::new(440.0, vec![1.0, 0.0, 0.5]))
            .is_none());
        let ratio = features
            .odd_even_ratio(&PartialSet::new(440.0, vec![0.6, 0.5, 0.8]))
            .unwrap();
        assert!((ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_harmonic_slope_skips_zero_partials() {
        let features = harmonic();
        let single = PartialSet::new(440.0, vec![1.0, 0.0, 0.0]);
        assert!(features.harmonic_slope(&single).is_none());

        let falling = PartialSet::new(440.0, vec![1.0, 0.1, 0.01]);
        let slope = features.harmonic_slope(&falling).unwrap();
        assert!((slope + 20.0).abs() < 1e-9, "slope = {}", slope);
    }

    #[test]
    fn test_irregularity() {
        let features = harmonic();
        let smooth = PartialSet::new(220.0, vec![0.5, 0.5, 0.5, 0.5]);
        assert_eq!(features.irregularity(&smooth), Some(0.0));

        let jagged = PartialSet::new(220.0, vec![1.0, 0.0, 1.0]);
        assert!((features.irregularity(&jagged).unwrap() - 1.0).abs() < 1e-12);

        let empty = PartialSet::new(220.0, vec![0.0, 0.0]);
        assert_eq!(features.irregularity(&empty), None);
    }

    #[test]
    fn test_hnr_ceiling_without_noise() {
        let energy = HarmonicEnergy {
            harmonic: 2.0,
            total: 2.0,
        };
        assert_eq!(energy.hnr_db(), Some(HNR_CEILING_DB));
        assert_eq!(energy.aperiodicity(), Some(0.0));

        let silent = HarmonicEnergy {
            harmonic: 0.0,
            total: 0.0,
        };
        assert_eq!(silent.aperiodicity(), None);
    }
}
