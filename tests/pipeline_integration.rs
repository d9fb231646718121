//! Integration tests for the per-frame feature pipeline
//!
//! These tests stream synthetic audio through the hop-based FrameSlicer into
//! a FeatureExtractor, the way a capture layer would, and validate:
//! - Steady-tone descriptor values end to end
//! - Silence gating
//! - Onset detection on a level ramp
//! - Session reset semantics
//! - Frame validation errors

use timbre_trainer::analysis::{FeatureExtractor, FeatureVector, OnsetState};
use timbre_trainer::config::EngineConfig;
use timbre_trainer::error::{AnalysisError, AnalysisErrorCodes, ErrorCode};
use timbre_trainer::fixtures::{self, FrameSlicer};
use timbre_trainer::{Frame, MetricKey};

const SAMPLE_RATE: u32 = 48000;
const FFT_SIZE: usize = 4096;
const HOP_SIZE: usize = 512;

/// Slice a signal into hop-spaced frames and process each one
fn run_stream(
    extractor: &mut FeatureExtractor,
    signal: &[f32],
) -> Vec<(u64, f64, Option<FeatureVector>)> {
    let mut slicer = FrameSlicer::new(
        extractor.fft_size(),
        extractor.hop_size(),
        extractor.sample_rate(),
    );
    slicer
        .push(signal)
        .iter()
        .map(|sliced| {
            let vector = extractor
                .process(&sliced.frame())
                .expect("sliced frames match the configuration");
            (sliced.sequence, sliced.timestamp_ms, vector)
        })
        .collect()
}

/// Frames whose window is completely filled with signal
fn steady(
    results: &[(u64, f64, Option<FeatureVector>)],
) -> impl Iterator<Item = &FeatureVector> + '_ {
    let first_full = (FFT_SIZE / HOP_SIZE - 1) as u64;
    results
        .iter()
        .filter(move |(sequence, _, _)| *sequence >= first_full)
        .filter_map(|(_, _, vector)| vector.as_ref())
}

#[test]
fn test_steady_440hz_tone_end_to_end() {
    timbre_trainer::init_logging();
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    let tone = fixtures::sine(SAMPLE_RATE, 440.0, 0.5, SAMPLE_RATE as usize / 2);

    let results = run_stream(&mut extractor, &tone);
    assert_eq!(results.len(), tone.len() / HOP_SIZE);

    let mut checked = 0;
    for vector in steady(&results) {
        let f0 = vector.get(MetricKey::F0).expect("steady tone is voiced");
        assert!((f0 - 440.0).abs() <= 2.0, "f0 = {} Hz", f0);

        let centroid = vector.get(MetricKey::SpectralCentroid).unwrap();
        assert!((centroid - 440.0).abs() <= 20.0, "centroid = {} Hz", centroid);

        let hnr = vector.get(MetricKey::Hnr).unwrap();
        assert!(hnr > 20.0, "HNR = {} dB", hnr);

        let aperiodicity = vector.get(MetricKey::Aperiodicity).unwrap();
        assert!(aperiodicity < 0.1, "aperiodicity = {}", aperiodicity);

        let t1 = vector.get(MetricKey::Tristimulus1).unwrap();
        let t2 = vector.get(MetricKey::Tristimulus2).unwrap();
        let t3 = vector.get(MetricKey::Tristimulus3).unwrap();
        assert!(t1 > t2 && t1 > t3, "T1 {} should dominate ({}, {})", t1, t2, t3);

        assert!(vector.get(MetricKey::F0Stability).unwrap() < 5.0);
        checked += 1;
    }
    assert!(checked > 30, "only {} steady frames checked", checked);

    // The tone starts with the stream: one onset, no rise
    assert_eq!(extractor.onset_events().len(), 1);
    assert_eq!(extractor.onset_events()[0].rise_time_ms, 0.0);
    assert_eq!(extractor.onset_state(), OnsetState::Sustain);
}

#[test]
fn test_silence_produces_no_features() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    let results = run_stream(&mut extractor, &fixtures::silence(FFT_SIZE * 2));

    assert!(!results.is_empty());
    assert!(results.iter().all(|(_, _, vector)| vector.is_none()));
    assert_eq!(extractor.frames_processed(), 0);
    assert!(extractor.onset_events().is_empty());
}

#[test]
fn test_quiet_tone_below_gate_is_silent() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    // 0.001 peak is about -63 dBFS RMS
    let whisper = fixtures::scale(&fixtures::sine(SAMPLE_RATE, 440.0, 1.0, FFT_SIZE), 0.001);
    let result = extractor
        .process(&Frame::new(&whisper, SAMPLE_RATE, 0.0))
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_level_ramp_yields_one_onset() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    // 60 dB/s swell from -83 dBFS to -23 dBFS RMS
    let tone = fixtures::sine(SAMPLE_RATE, 440.0, 1.0, SAMPLE_RATE as usize);
    let swell = fixtures::ramp_db(&tone, -80.0, -20.0);

    run_stream(&mut extractor, &swell);

    let events = extractor.onset_events();
    assert_eq!(events.len(), 1, "expected one onset, got {:?}", events);
    // 15 dB between the thresholds at 60 dB/s is 250 ms, give or take a hop
    let rise = events[0].rise_time_ms;
    assert!(rise > 200.0 && rise < 300.0, "rise time = {} ms", rise);
}

#[test]
fn test_reset_starts_a_fresh_session() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    let tone = fixtures::harmonic_tone(SAMPLE_RATE, 392.0, &[1.0, 0.5, 0.3, 0.2], FFT_SIZE * 2);

    let first = run_stream(&mut extractor, &tone);
    assert_eq!(extractor.onset_events().len(), 1);
    assert!(first
        .iter()
        .filter_map(|(_, _, v)| v.as_ref())
        .any(|v| v.get(MetricKey::SpectralFlux).unwrap() > 0.0));

    extractor.reset();
    assert!(extractor.onset_events().is_empty());
    assert_eq!(extractor.stability_window_len(), (0, 0));

    let frame = &tone[tone.len() - FFT_SIZE..];
    let vector = extractor
        .process(&Frame::new(frame, SAMPLE_RATE, 0.0))
        .unwrap()
        .unwrap();
    assert_eq!(vector.get(MetricKey::SpectralFlux), Some(0.0));
    assert_eq!(vector.get(MetricKey::CentroidStability), Some(0.0));
    assert_eq!(extractor.onset_events().len(), 1);
}

#[test]
fn test_out_of_range_pitch_is_absent_with_low_confidence() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    let hum = fixtures::sine(SAMPLE_RATE, 100.0, 0.5, FFT_SIZE);
    let vector = extractor
        .process(&Frame::new(&hum, SAMPLE_RATE, 0.0))
        .unwrap()
        .unwrap();

    assert_eq!(vector.get(MetricKey::F0), None);
    assert!(vector.get(MetricKey::F0Confidence).unwrap() <= 0.3);
    assert_eq!(vector.get(MetricKey::Tristimulus1), None);
    assert!(vector.get(MetricKey::LowFrequencyRatio).unwrap() > 0.3);
}

#[test]
fn test_frame_errors_leave_state_untouched() {
    let mut extractor = FeatureExtractor::configure(SAMPLE_RATE, HOP_SIZE).unwrap();
    let tone = fixtures::sine(SAMPLE_RATE, 440.0, 0.5, FFT_SIZE);
    extractor
        .process(&Frame::new(&tone, SAMPLE_RATE, 0.0))
        .unwrap();

    let err = extractor
        .process(&Frame::new(&tone[..2048], SAMPLE_RATE, 10.0))
        .unwrap_err();
    assert_eq!(err.code(), AnalysisErrorCodes::BUFFER_LENGTH_MISMATCH);
    assert!(matches!(err, AnalysisError::BufferLengthMismatch { .. }));
    assert_eq!(extractor.frames_processed(), 1);

    // Flux still compares against the first frame
    let vector = extractor
        .process(&Frame::new(&tone, SAMPLE_RATE, 20.0))
        .unwrap()
        .unwrap();
    assert_eq!(vector.get(MetricKey::SpectralFlux), Some(0.0));
}

#[test]
fn test_custom_config_from_json() {
    let config = EngineConfig::from_json_str(
        r#"{
            "analysis": { "fft_size": 2048 },
            "stability": { "window_seconds": 0.25 }
        }"#,
    )
    .unwrap();
    let mut extractor = FeatureExtractor::with_config(config, SAMPLE_RATE, 256).unwrap();
    assert_eq!(extractor.fft_size(), 2048);

    let tone = fixtures::sine(SAMPLE_RATE, 660.0, 0.5, 2048);
    let vector = extractor
        .process(&Frame::new(&tone, SAMPLE_RATE, 0.0))
        .unwrap()
        .unwrap();
    let f0 = vector.get(MetricKey::F0).unwrap();
    assert!((f0 - 660.0).abs() / 660.0 < 0.005, "f0 = {}", f0);
}

#[test]
fn test_wav_file_through_pipeline() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("timbre_pipeline_{}.wav", std::process::id()));
    let tone = fixtures::harmonic_tone(SAMPLE_RATE, 293.66, &[0.5, 0.25, 0.12], FFT_SIZE * 3);
    fixtures::write_wav(&path, &tone, SAMPLE_RATE)?;
    let clip = fixtures::read_wav(&path)?;
    std::fs::remove_file(&path).ok();

    let mut extractor = FeatureExtractor::configure(clip.sample_rate, HOP_SIZE)?;
    let results = run_stream(&mut extractor, &clip.samples);
    let last = steady(&results).last().expect("steady frames");
    let f0 = last.get(MetricKey::F0).expect("voiced");
    assert!((f0 - 293.66).abs() < 1.5, "f0 = {}", f0);
    Ok(())
}
