// FeatureExtractor - per-frame timbre feature extraction for bowed strings
//
// This module turns one time-domain frame into a FeatureVector of spectral,
// harmonic, band and temporal descriptors. Each stage is computed once per
// frame and shared by the descriptors that depend on it.
//
// Module organization:
// - types: Data structures (Frame, Spectrum, PartialSet, FeatureVector)
// - fft: Hann-windowed radix-2 FFT producing the dB spectrum
// - spectral: Spectral shape descriptors (centroid, spread, slope, flatness, flux, rolloff)
// - harmonic: Partial extraction and harmonic descriptors (tristimulus, HNR, ...)
// - bands: Fixed-band relative energy descriptors
// - temporal: Time-domain frame level
// - mod.rs: Coordinator (FeatureExtractor)
//
// Pipeline per frame:
// 1. RMS level; frames below the silence gate produce no features
// 2. Spectrum via FFT
// 3. Fundamental frequency via YIN
// 4. Partial extraction (once, reused by every harmonic descriptor)
// 5. Spectral, harmonic and band descriptors
// 6. Onset detector and rolling stability windows
// 7. FeatureVector assembly (undefined descriptors stay absent)

pub mod bands;
pub mod fft;
pub mod harmonic;
pub mod spectral;
pub mod temporal;
pub mod types;

pub use types::{FeatureVector, Frame, PartialSet, Spectrum};

use bands::BandFeatures;
use fft::FftProcessor;
use harmonic::HarmonicFeatures;
use spectral::{SpectralFeatures, SpectralFlux, ROLLOFF_FRACTIONS};

use crate::analysis::onset::{OnsetDetector, OnsetEvent, OnsetState};
use crate::analysis::pitch::{F0Estimate, PitchEstimator};
use crate::analysis::stability::{pitch_stability_cents, RollingWindow};
use crate::config::EngineConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::metrics::MetricKey;

/// State that lives for one capture session and is cleared by `reset`
struct SessionState {
    flux: SpectralFlux,
    onset: OnsetDetector,
    f0_window: RollingWindow,
    centroid_window: RollingWindow,
}

impl SessionState {
    fn clear(&mut self) {
        self.flux.reset();
        self.onset.reset();
        self.f0_window.reset();
        self.centroid_window.reset();
    }
}

/// FeatureExtractor coordinates the timbre feature extraction pipeline
///
/// One instance owns all cross-frame state of a single frame stream.
/// Independent streams need independent instances.
pub struct FeatureExtractor {
    config: EngineConfig,
    sample_rate: u32,
    hop_size: usize,
    fft_processor: FftProcessor,
    pitch_estimator: PitchEstimator,
    spectral_features: SpectralFeatures,
    harmonic_features: HarmonicFeatures,
    band_features: BandFeatures,
    session: SessionState,
    last_pitch: Option<F0Estimate>,
    frames_processed: u64,
    frames_gated: u64,
}

impl FeatureExtractor {
    /// Configure an extractor with the default engine configuration
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (e.g., 48000)
    /// * `hop_size` - Samples between consecutive frames, used to size the stability windows
    pub fn configure(sample_rate: u32, hop_size: usize) -> Result<Self, ConfigError> {
        Self::with_config(EngineConfig::default(), sample_rate, hop_size)
    }

    /// Configure an extractor with an explicit engine configuration
    ///
    /// Validates the configuration and session parameters up front; frame
    /// processing never fails on configuration grounds afterwards.
    pub fn with_config(
        config: EngineConfig,
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<Self, ConfigError> {
        config.validate_session(sample_rate, hop_size)?;

        let fft_processor = FftProcessor::new(config.analysis.fft_size, sample_rate)?;
        let window_capacity = config.stability.capacity_for(sample_rate, hop_size);

        log::info!(
            "[FeatureExtractor] Configured: {} Hz, fft {} samples, hop {} samples, stability window {} frames",
            sample_rate,
            config.analysis.fft_size,
            hop_size,
            window_capacity
        );

        Ok(Self {
            pitch_estimator: PitchEstimator::new(config.pitch.clone()),
            spectral_features: SpectralFeatures::new(config.spectral.clone()),
            harmonic_features: HarmonicFeatures::new(config.analysis.max_harmonics),
            band_features: BandFeatures::new(config.bands.clone()),
            session: SessionState {
                flux: SpectralFlux::new(),
                onset: OnsetDetector::new(config.onset.clone()),
                f0_window: RollingWindow::new(window_capacity),
                centroid_window: RollingWindow::new(window_capacity),
            },
            fft_processor,
            sample_rate,
            hop_size,
            config,
            last_pitch: None,
            frames_processed: 0,
            frames_gated: 0,
        })
    }

    /// Extract all features from one frame
    ///
    /// # Arguments
    /// * `frame` - Frame of exactly `fft_size` samples at the configured sample rate
    ///
    /// # Returns
    /// `Ok(None)` for frames below the silence gate, otherwise the frame's
    /// FeatureVector. Errors are returned before any session state changes.
    pub fn process(&mut self, frame: &Frame) -> Result<Option<FeatureVector>, AnalysisError> {
        let fft_size = self.config.analysis.fft_size;
        if frame.samples.len() != fft_size {
            return Err(AnalysisError::BufferLengthMismatch {
                expected: fft_size,
                actual: frame.samples.len(),
            });
        }
        if frame.sample_rate != self.sample_rate {
            return Err(AnalysisError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: frame.sample_rate,
            });
        }

        let now = frame.timestamp_ms;
        let rms = temporal::rms_db(frame.samples);

        if rms < self.config.analysis.silence_gate_db {
            // Keep the onset machine in step so it can fall back to silent
            self.session.onset.update(rms, now);
            self.frames_gated += 1;
            self.last_pitch = None;
            tracing::trace!(rms_db = rms, timestamp_ms = now, "frame below silence gate");
            return Ok(None);
        }
        self.frames_processed += 1;

        let spectrum = self.fft_processor.compute_spectrum(frame.samples);
        let pitch = self.pitch_estimator.estimate(frame.samples, self.sample_rate);
        if pitch.frequency_hz.is_none() {
            tracing::trace!(
                status = ?pitch.status,
                confidence = pitch.confidence,
                "no pitch for frame"
            );
        }
        let partials = self
            .harmonic_features
            .extract_partials(pitch.frequency_hz, &spectrum);

        let mut vector = FeatureVector::new();
        self.add_spectral(&mut vector, &spectrum);
        self.add_harmonic(&mut vector, partials.as_ref(), &spectrum);
        self.add_bands(&mut vector, &spectrum);

        self.session.onset.update(rms, now);
        self.session.f0_window.push(pitch.frequency_hz);
        self.session
            .centroid_window
            .push(vector.get(MetricKey::SpectralCentroid));

        vector.set(MetricKey::Rms, Some(rms));
        vector.set(MetricKey::F0, pitch.frequency_hz);
        vector.set(MetricKey::F0Confidence, Some(pitch.confidence));
        vector.set(
            MetricKey::F0Stability,
            pitch_stability_cents(&self.session.f0_window, pitch.frequency_hz),
        );
        let centroid_window = &self.session.centroid_window;
        vector.set(
            MetricKey::CentroidStability,
            centroid_window.mean().map(|_| centroid_window.std_dev()),
        );
        vector.set(MetricKey::AttackTime, self.session.onset.latest_rise_time());
        vector.set(
            MetricKey::TimeSinceOnset,
            self.session.onset.time_since_last_onset(now),
        );

        self.last_pitch = Some(pitch);
        Ok(Some(vector))
    }

    fn add_spectral(&mut self, vector: &mut FeatureVector, spectrum: &Spectrum) {
        let spectral = &self.spectral_features;
        let centroid = spectral.compute_centroid(spectrum);

        vector.set(MetricKey::SpectralCentroid, centroid);
        vector.set(
            MetricKey::SpectralSpread,
            spectral.compute_spread(spectrum, centroid),
        );
        vector.set(MetricKey::SpectralSlope, spectral.compute_slope(spectrum));
        vector.set(MetricKey::SpectralFlatness, spectral.compute_flatness(spectrum));
        vector.set(
            MetricKey::SpectralRolloff85,
            spectral.compute_rolloff(spectrum, ROLLOFF_FRACTIONS[0]),
        );
        vector.set(
            MetricKey::SpectralRolloff95,
            spectral.compute_rolloff(spectrum, ROLLOFF_FRACTIONS[1]),
        );
        vector.set(
            MetricKey::LowFrequencyRatio,
            spectral.compute_low_frequency_ratio(spectrum),
        );
        vector.set(
            MetricKey::SpectralFlux,
            Some(self.session.flux.compute(spectrum)),
        );
    }

    fn add_harmonic(
        &self,
        vector: &mut FeatureVector,
        partials: Option<&PartialSet>,
        spectrum: &Spectrum,
    ) {
        let Some(partials) = partials else {
            return;
        };
        let harmonic = &self.harmonic_features;

        if let Some([t1, t2, t3]) = harmonic.tristimulus(partials) {
            vector.set(MetricKey::Tristimulus1, Some(t1));
            vector.set(MetricKey::Tristimulus2, Some(t2));
            vector.set(MetricKey::Tristimulus3, Some(t3));
        }
        vector.set(MetricKey::OddEvenRatio, harmonic.odd_even_ratio(partials));

        let energy = harmonic.harmonic_energy(partials, spectrum);
        vector.set(MetricKey::Hnr, energy.hnr_db());
        vector.set(MetricKey::Aperiodicity, energy.aperiodicity());

        vector.set(MetricKey::HarmonicSlope, harmonic.harmonic_slope(partials));
        vector.set(MetricKey::SpectralIrregularity, harmonic.irregularity(partials));

        let levels = harmonic.partial_levels(partials, self.config.analysis.partial_levels);
        for (&key, level) in MetricKey::PARTIALS.iter().zip(levels) {
            vector.set(key, level);
        }
    }

    fn add_bands(&self, vector: &mut FeatureVector, spectrum: &Spectrum) {
        let levels = self.band_features.compute(spectrum);
        vector.set(MetricKey::Richness, Some(levels.richness));
        vector.set(MetricKey::Nasality, Some(levels.nasality));
        vector.set(MetricKey::Brilliance, Some(levels.brilliance));
        vector.set(MetricKey::Harshness, Some(levels.harshness));
    }

    /// Clear all session state: flux history, onset machine and log, stability windows
    ///
    /// Call at every session boundary (new reference capture, new recording).
    pub fn reset(&mut self) {
        self.session.clear();
        self.last_pitch = None;
        log::info!(
            "[FeatureExtractor] Session reset after {} analysed / {} gated frames",
            self.frames_processed,
            self.frames_gated
        );
        self.frames_processed = 0;
        self.frames_gated = 0;
    }

    /// Onset events of the current session, oldest first
    pub fn onset_events(&self) -> &[OnsetEvent] {
        self.session.onset.events()
    }

    pub fn onset_state(&self) -> OnsetState {
        self.session.onset.state()
    }

    /// Pitch estimate of the most recent non-silent frame
    pub fn last_pitch(&self) -> Option<&F0Estimate> {
        self.last_pitch.as_ref()
    }

    /// Number of values currently held by the pitch and centroid stability windows
    pub fn stability_window_len(&self) -> (usize, usize) {
        (
            self.session.f0_window.len(),
            self.session.centroid_window.len(),
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn fft_size(&self) -> usize {
        self.fft_processor.fft_size()
    }

    /// Frames that passed the silence gate since configuration or the last reset
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
