// Spectral module - Frequency-domain shape descriptors
//
// This module computes spectral shape features from the magnitude spectrum.
// Every descriptor except flux is a pure function of the current spectrum;
// flux keeps the previous frame's dB spectrum and is reset at session
// boundaries.
//
// The DC bin is skipped by every descriptor.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use crate::analysis::features::types::Spectrum;
use crate::config::SpectralConfig;

/// Magnitudes below this are clamped before taking logarithms
const MAGNITUDE_EPSILON: f64 = 1e-10;

/// Rolloff fractions reported per frame
pub const ROLLOFF_FRACTIONS: [f64; 2] = [0.85, 0.95];

/// Spectral shape feature computation functions
pub struct SpectralFeatures {
    config: SpectralConfig,
}

impl SpectralFeatures {
    pub fn new(config: SpectralConfig) -> Self {
        Self { config }
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Centroid in Hz, or `None` when the spectrum holds no magnitude
    pub fn compute_centroid(&self, spectrum: &Spectrum) -> Option<f64> {
        let (weighted_sum, magnitude_sum) = spectrum
            .linear()
            .iter()
            .enumerate()
            .skip(1)
            .fold((0.0, 0.0), |(w, m), (i, &mag)| {
                (w + spectrum.bin_frequency(i) * mag, m + mag)
            });

        (magnitude_sum > 0.0).then(|| weighted_sum / magnitude_sum)
    }

    /// Compute spectral spread (magnitude-weighted standard deviation around the centroid)
    pub fn compute_spread(&self, spectrum: &Spectrum, centroid: Option<f64>) -> Option<f64> {
        let centroid = centroid?;
        let (weighted_sum, magnitude_sum) = spectrum
            .linear()
            .iter()
            .enumerate()
            .skip(1)
            .fold((0.0, 0.0), |(w, m), (i, &mag)| {
                let d = spectrum.bin_frequency(i) - centroid;
                (w + d * d * mag, m + mag)
            });

        (magnitude_sum > 0.0).then(|| (weighted_sum / magnitude_sum).sqrt())
    }

    /// Compute spectral slope (dB per Hz)
    ///
    /// Least-squares regression of dB magnitude against frequency, restricted
    /// to the configured band (100-10000 Hz by default).
    pub fn compute_slope(&self, spectrum: &Spectrum) -> Option<f64> {
        let points = spectrum
            .db()
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, &db)| (spectrum.bin_frequency(i), db))
            .filter(|&(f, _)| f >= self.config.slope_min_hz && f <= self.config.slope_max_hz);

        regression_slope(points)
    }

    /// Compute spectral flatness (tonality measure)
    ///
    /// Formula: flatness = geometric_mean(|X[i]|) / arithmetic_mean(|X[i]|)
    ///
    /// Returns value between 0 (tonal, e.g., sine wave) and 1 (noise-like).
    pub fn compute_flatness(&self, spectrum: &Spectrum) -> Option<f64> {
        let bins = &spectrum.linear()[1.min(spectrum.len())..];
        if bins.is_empty() {
            return None;
        }

        let (log_sum, lin_sum) = bins.iter().fold((0.0, 0.0), |(l, s), &mag| {
            let m = mag.max(MAGNITUDE_EPSILON);
            (l + m.ln(), s + m)
        });
        let count = bins.len() as f64;
        let geometric_mean = (log_sum / count).exp();
        let arithmetic_mean = lin_sum / count;

        (arithmetic_mean > 0.0).then(|| (geometric_mean / arithmetic_mean).min(1.0))
    }

    /// Compute spectral rolloff for an energy fraction
    ///
    /// Finds the lowest frequency at which the cumulative squared magnitude
    /// reaches `fraction` of the total. Falls back to Nyquist if rounding
    /// keeps the cumulative sum just short of the target.
    pub fn compute_rolloff(&self, spectrum: &Spectrum, fraction: f64) -> Option<f64> {
        let linear = spectrum.linear();
        let total_energy: f64 = linear.iter().skip(1).map(|&mag| mag * mag).sum();
        if total_energy <= 0.0 {
            return None;
        }

        let threshold = fraction * total_energy;
        let mut cumulative_energy = 0.0;
        for (i, &mag) in linear.iter().enumerate().skip(1) {
            cumulative_energy += mag * mag;
            if cumulative_energy >= threshold {
                return Some(spectrum.bin_frequency(i));
            }
        }

        Some(spectrum.nyquist())
    }

    /// Ratio of energy below the low-frequency cutoff to total energy
    pub fn compute_low_frequency_ratio(&self, spectrum: &Spectrum) -> Option<f64> {
        let (low, total) = spectrum
            .linear()
            .iter()
            .enumerate()
            .skip(1)
            .fold((0.0, 0.0), |(low, total), (i, &mag)| {
                let energy = mag * mag;
                if spectrum.bin_frequency(i) < self.config.low_frequency_cutoff_hz {
                    (low + energy, total + energy)
                } else {
                    (low, total + energy)
                }
            });

        (total > 0.0).then(|| low / total)
    }
}

/// Frame-to-frame spectral change
///
/// Root-mean-square of the per-bin dB difference against the previous frame.
pub struct SpectralFlux {
    prev_spectrum: Option<Vec<f64>>,
}

impl Default for SpectralFlux {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralFlux {
    pub fn new() -> Self {
        Self {
            prev_spectrum: None,
        }
    }

    /// Compute flux against the stored spectrum, then store the current one
    ///
    /// Returns 0 on the first call after construction or [`SpectralFlux::reset`].
    pub fn compute(&mut self, spectrum: &Spectrum) -> f64 {
        let current = spectrum.db();
        let flux = match &self.prev_spectrum {
            Some(prev) if prev.len() == current.len() && !current.is_empty() => {
                let sum_sq: f64 = current
                    .iter()
                    .zip(prev.iter())
                    .map(|(curr, prev)| (curr - prev) * (curr - prev))
                    .sum();
                (sum_sq / current.len() as f64).sqrt()
            }
            _ => 0.0,
        };

        if let Some(prev) = self
            .prev_spectrum
            .as_mut()
            .filter(|prev| prev.len() == current.len())
        {
            prev.copy_from_slice(current);
        } else {
            self.prev_spectrum = Some(current.to_vec());
        }

        flux
    }

    /// Forget the previous spectrum
    pub fn reset(&mut self) {
        self.prev_spectrum = None;
    }

    pub fn has_history(&self) -> bool {
        self.prev_spectrum.is_some()
    }
}

/// Least-squares slope of y against x; `None` with fewer than two points or zero x-variance
pub(crate) fn regression_slope<I>(points: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (mut n, mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (x, y) in points {
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    if n < 2.0 {
        return None;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    (denom.abs() > f64::EPSILON).then(|| (n * sum_xy - sum_x * sum_y) / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::fft::FftProcessor;
    use crate::analysis::features::types::SPECTRUM_FLOOR_DB;
    use crate::fixtures;

    const SAMPLE_RATE: u32 = 48000;
    const FFT_SIZE: usize = 4096;

    fn spectrum_of(signal: &[f32]) -> Spectrum {
        FftProcessor::new(FFT_SIZE, SAMPLE_RATE)
            .unwrap()
            .compute_spectrum(signal)
    }

    fn features() -> SpectralFeatures {
        SpectralFeatures::new(SpectralConfig::default())
    }

    #[test]
    fn test_centroid_of_sine_within_one_bin() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 440.0, 0.5, FFT_SIZE));
        let centroid = features().compute_centroid(&spectrum).unwrap();
        let bin_width = SAMPLE_RATE as f64 / FFT_SIZE as f64;
        assert!(
            (centroid - 440.0).abs() < bin_width,
            "centroid {} Hz not within one bin of 440 Hz",
            centroid
        );
    }

    #[test]
    fn test_centroid_orders_low_and_high_tones() {
        let low = spectrum_of(&fixtures::sine(SAMPLE_RATE, 300.0, 0.5, FFT_SIZE));
        let high = spectrum_of(&fixtures::sine(SAMPLE_RATE, 3000.0, 0.5, FFT_SIZE));
        let f = features();
        assert!(f.compute_centroid(&high).unwrap() > f.compute_centroid(&low).unwrap());
    }

    #[test]
    fn test_spread_narrow_for_sine_wide_for_noise() {
        let f = features();
        let sine = spectrum_of(&fixtures::sine(SAMPLE_RATE, 1000.0, 0.5, FFT_SIZE));
        let noise = spectrum_of(&fixtures::white_noise(FFT_SIZE, 0.5, 11));

        let sine_spread = f.compute_spread(&sine, f.compute_centroid(&sine)).unwrap();
        let noise_spread = f.compute_spread(&noise, f.compute_centroid(&noise)).unwrap();
        assert!(sine_spread < 200.0, "sine spread {}", sine_spread);
        assert!(noise_spread > 5000.0, "noise spread {}", noise_spread);
        assert_eq!(f.compute_spread(&sine, None), None);
    }

    #[test]
    fn test_flatness_sine_vs_noise() {
        let f = features();
        let sine = spectrum_of(&fixtures::sine(SAMPLE_RATE, 1000.0, 0.5, FFT_SIZE));
        let noise = spectrum_of(&fixtures::white_noise(FFT_SIZE, 0.5, 3));

        let sine_flatness = f.compute_flatness(&sine).unwrap();
        let noise_flatness = f.compute_flatness(&noise).unwrap();
        assert!(sine_flatness < 0.1, "sine flatness {}", sine_flatness);
        assert!(noise_flatness > 0.7, "noise flatness {}", noise_flatness);
        assert!(noise_flatness <= 1.0);
    }

    #[test]
    fn test_slope_sign() {
        let f = features();
        // Declining dB line: -0.002 dB/Hz across the whole spectrum
        let n = FFT_SIZE / 2 + 1;
        let bin_width = SAMPLE_RATE as f64 / FFT_SIZE as f64;
        let db: Vec<f64> = (0..n).map(|i| -10.0 - 0.002 * i as f64 * bin_width).collect();
        let spectrum = Spectrum::from_db(db, SAMPLE_RATE, FFT_SIZE);

        let slope = f.compute_slope(&spectrum).unwrap();
        assert!((slope + 0.002).abs() < 1e-9, "slope {}", slope);
    }

    #[test]
    fn test_rolloff_ordering_and_nyquist_fallback() {
        let f = features();
        let low = spectrum_of(&fixtures::sine(SAMPLE_RATE, 200.0, 0.5, FFT_SIZE));
        let high = spectrum_of(&fixtures::sine(SAMPLE_RATE, 8000.0, 0.5, FFT_SIZE));

        let low_85 = f.compute_rolloff(&low, 0.85).unwrap();
        let high_85 = f.compute_rolloff(&high, 0.85).unwrap();
        let high_95 = f.compute_rolloff(&high, 0.95).unwrap();
        assert!(high_85 > low_85);
        assert!(high_95 >= high_85);
        assert!(high_95 <= SAMPLE_RATE as f64 / 2.0);
        assert_eq!(f.compute_rolloff(&high, 1.5), Some(SAMPLE_RATE as f64 / 2.0));
    }

    #[test]
    fn test_low_frequency_ratio() {
        let f = features();
        let rumble = spectrum_of(&fixtures::sine(SAMPLE_RATE, 50.0, 0.5, FFT_SIZE));
        let tone = spectrum_of(&fixtures::sine(SAMPLE_RATE, 880.0, 0.5, FFT_SIZE));
        assert!(f.compute_low_frequency_ratio(&rumble).unwrap() > 0.9);
        assert!(f.compute_low_frequency_ratio(&tone).unwrap() < 0.01);
    }

    #[test]
    fn test_flux_first_call_and_identical_frames() {
        let spectrum = spectrum_of(&fixtures::sine(SAMPLE_RATE, 440.0, 0.5, FFT_SIZE));
        let mut flux = SpectralFlux::new();

        assert_eq!(flux.compute(&spectrum), 0.0, "first call returns 0");
        assert_eq!(flux.compute(&spectrum), 0.0, "identical frames have no flux");
    }

    #[test]
    fn test_flux_measures_db_change_and_resets() {
        let n = FFT_SIZE / 2 + 1;
        let quiet = Spectrum::from_db(vec![-60.0; n], SAMPLE_RATE, FFT_SIZE);
        let loud = Spectrum::from_db(vec![-50.0; n], SAMPLE_RATE, FFT_SIZE);
        let mut flux = SpectralFlux::new();

        flux.compute(&quiet);
        assert!((flux.compute(&loud) - 10.0).abs() < 1e-9);

        flux.reset();
        assert!(!flux.has_history());
        assert_eq!(flux.compute(&quiet), 0.0, "first call after reset returns 0");
    }

    #[test]
    fn test_silent_spectrum_descriptors() {
        let f = features();
        let n = FFT_SIZE / 2 + 1;
        let floor = Spectrum::from_db(vec![SPECTRUM_FLOOR_DB; n], SAMPLE_RATE, FFT_SIZE);
        // The -100 dB floor is still a (tiny) positive magnitude, so descriptors stay defined
        assert!(f.compute_centroid(&floor).is_some());
        assert!((f.compute_flatness(&floor).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_slope_edge_cases() {
        assert_eq!(regression_slope(std::iter::empty()), None);
        assert_eq!(regression_slope([(1.0, 2.0)]), None);
        assert_eq!(regression_slope([(1.0, 2.0), (1.0, 3.0)]), None);
        assert!((regression_slope([(1.0, 1.0), (2.0, 3.0)]).unwrap() - 2.0).abs() < 1e-12);
    }
}
