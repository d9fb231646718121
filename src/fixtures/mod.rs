//! Deterministic audio sources for exercising the feature pipeline.
//!
//! The pipeline is driven by fixed-length frames delivered every hop. This
//! module provides the pieces needed to reproduce that without a live
//! capture device: synthetic signal generators, a streaming hop-based
//! framer, and a PCM WAV loader.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::features::Frame;

/// Pure sine of `len` samples starting at phase 0.
pub fn sine(sample_rate: u32, frequency_hz: f64, amplitude: f32, len: usize) -> Vec<f32> {
    harmonic_tone(sample_rate, frequency_hz, &[amplitude], len)
}

/// Sum of harmonics of `f0_hz`; `amplitudes[0]` is the fundamental.
///
/// Harmonics at or above Nyquist are skipped.
pub fn harmonic_tone(sample_rate: u32, f0_hz: f64, amplitudes: &[f32], len: usize) -> Vec<f32> {
    let sr = sample_rate as f64;
    let partials: Vec<(f64, f64)> = amplitudes
        .iter()
        .enumerate()
        .map(|(i, &amp)| ((i + 1) as f64 * f0_hz, amp as f64))
        .filter(|&(freq, _)| freq < sr / 2.0)
        .collect();

    (0..len)
        .map(|n| {
            let t = n as f64 / sr;
            partials
                .iter()
                .map(|&(freq, amp)| amp * (2.0 * PI * freq * t).sin())
                .sum::<f64>() as f32
        })
        .collect()
}

/// Uniform white noise in [-amplitude, amplitude), reproducible per seed.
pub fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(-1.0f32..1.0) * amplitude)
        .collect()
}

pub fn silence(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

/// Multiply every sample by `gain`.
pub fn scale(signal: &[f32], gain: f32) -> Vec<f32> {
    signal.iter().map(|&s| s * gain).collect()
}

/// Apply a gain envelope moving linearly in dB from `start_db` to `end_db`.
pub fn ramp_db(signal: &[f32], start_db: f64, end_db: f64) -> Vec<f32> {
    let last = signal.len().saturating_sub(1).max(1) as f64;
    signal
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let db = start_db + (end_db - start_db) * i as f64 / last;
            (s as f64 * 10f64.powf(db / 20.0)) as f32
        })
        .collect()
}

/// One window emitted by [`FrameSlicer`].
#[derive(Debug, Clone, PartialEq)]
pub struct SlicedFrame {
    /// Oldest sample first.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Stream time of the newest sample, in milliseconds.
    pub timestamp_ms: f64,
    pub sequence: u64,
}

impl SlicedFrame {
    /// Borrow as a pipeline [`Frame`].
    pub fn frame(&self) -> Frame<'_> {
        Frame::new(&self.samples, self.sample_rate, self.timestamp_ms).with_sequence(self.sequence)
    }
}

/// Streaming framer: keeps the last `frame_size` samples in a ring and emits
/// them in time order every `hop_size` samples.
///
/// Before `frame_size` samples have arrived the older part of each window is
/// zero, as with a freshly started capture.
pub struct FrameSlicer {
    ring: Vec<f32>,
    write_pos: usize,
    hop_size: usize,
    since_last_hop: usize,
    sample_rate: u32,
    samples_consumed: u64,
    next_sequence: u64,
}

impl FrameSlicer {
    pub fn new(frame_size: usize, hop_size: usize, sample_rate: u32) -> Self {
        Self {
            ring: vec![0.0; frame_size.max(1)],
            write_pos: 0,
            hop_size: hop_size.max(1),
            since_last_hop: 0,
            sample_rate,
            samples_consumed: 0,
            next_sequence: 0,
        }
    }

    /// Consume a block of samples of any length and return the windows completed by it.
    pub fn push(&mut self, block: &[f32]) -> Vec<SlicedFrame> {
        let mut frames = Vec::new();
        for &sample in block {
            self.ring[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.ring.len();
            self.samples_consumed += 1;
            self.since_last_hop += 1;

            if self.since_last_hop == self.hop_size {
                self.since_last_hop = 0;
                frames.push(self.snapshot());
            }
        }
        frames
    }

    fn snapshot(&mut self) -> SlicedFrame {
        let mut samples = Vec::with_capacity(self.ring.len());
        samples.extend_from_slice(&self.ring[self.write_pos..]);
        samples.extend_from_slice(&self.ring[..self.write_pos]);

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        SlicedFrame {
            samples,
            sample_rate: self.sample_rate,
            timestamp_ms: self.samples_consumed as f64 * 1000.0 / self.sample_rate as f64,
            sequence,
        }
    }

    /// Clear the ring and restart sequence numbers and stream time.
    pub fn reset(&mut self) {
        self.ring.iter_mut().for_each(|s| *s = 0.0);
        self.write_pos = 0;
        self.since_last_hop = 0;
        self.samples_consumed = 0;
        self.next_sequence = 0;
    }
}

/// Decoded WAV audio, mixed down to mono.
#[derive(Debug, Clone)]
pub struct WavClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Load a PCM WAV file (float, or 16/24/32-bit integer) as normalised mono.
///
/// Multi-channel files are averaged across channels.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<WavClip> {
    let path = path.as_ref();
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        bail!("{} declares no channels", path.display());
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .with_context(|| format!("decoding {}", path.display()))?,
        (hound::SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let full_scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .with_context(|| format!("decoding {}", path.display()))?
        }
        (format, bits) => {
            return Err(anyhow!(
                "unsupported sample format {:?}/{} bits in {}",
                format,
                bits,
                path.display()
            ))
        }
    };

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    log::debug!(
        "[fixtures] Loaded {} ({} samples @ {} Hz)",
        path.display(),
        samples.len(),
        spec.sample_rate
    );

    Ok(WavClip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Write mono samples as a 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let path = path.as_ref();
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
