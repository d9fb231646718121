// FFT module - Spectral transform of a single analysis frame
//
// This module handles FFT computation with proper windowing to reduce
// spectral leakage. The frame is multiplied by a pre-computed Hann window,
// transformed with an in-place radix-2 Cooley-Tukey FFT and converted to a
// dB magnitude spectrum that every spectral descriptor reads from.

use rustfft::num_complex::Complex;
use std::f64::consts::PI;

use crate::analysis::features::types::Spectrum;
use crate::error::ConfigError;

/// FFT processor that computes dB magnitude spectra from audio frames
///
/// The window, twiddle table and complex scratch buffer are sized once at
/// construction and reused for every frame; none of them leave this type.
pub struct FftProcessor {
    fft_size: usize,
    sample_rate: u32,
    /// Hann window for FFT (pre-computed)
    window: Vec<f64>,
    /// exp(-2πik/N) for k in 0..N/2
    twiddles: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size, must be a power of two
    /// * `sample_rate` - Sample rate the spectra are labelled with
    pub fn new(fft_size: usize, sample_rate: u32) -> Result<Self, ConfigError> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo { fft_size });
        }

        let window = hann_window(fft_size);
        let twiddles = (0..fft_size / 2)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / fft_size as f64))
            .collect();

        Ok(Self {
            fft_size,
            sample_rate,
            window,
            twiddles,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins in every produced spectrum
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute the dB magnitude spectrum of a frame
    ///
    /// Applies Hann windowing, performs the FFT and returns the positive
    /// frequencies only, scaled by 2/N and floored at -100 dB.
    ///
    /// # Arguments
    /// * `audio` - Frame of exactly `fft_size` samples (checked by the caller)
    pub fn compute_spectrum(&mut self, audio: &[f32]) -> Spectrum {
        debug_assert_eq!(audio.len(), self.fft_size);

        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(audio).zip(&self.window) {
            *slot = Complex::new(sample as f64 * w, 0.0);
        }

        radix2_in_place(&mut self.scratch, &self.twiddles);

        let scale = 2.0 / self.fft_size as f64;
        let linear = self.scratch[..self.num_bins()]
            .iter()
            .map(|c| c.norm() * scale)
            .collect();

        Spectrum::from_linear(linear, self.sample_rate, self.fft_size)
    }
}

/// Symmetric Hann window of length `size`
pub fn hann_window(size: usize) -> Vec<f64> {
    let denom = (size.max(2) - 1) as f64;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
        .collect()
}

/// In-place iterative radix-2 decimation-in-time FFT
///
/// `twiddles` must hold exp(-2πik/N) for k in 0..N/2 where N = buffer length.
fn radix2_in_place(buffer: &mut [Complex<f64>], twiddles: &[Complex<f64>]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            buffer.swap(i, j);
        }
    }

    // log2(N) butterfly stages
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let stride = n / len;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let w = twiddles[k * stride];
                let a = buffer[start + k];
                let b = buffer[start + k + half] * w;
                buffer[start + k] = a + b;
                buffer[start + k + half] = a - b;
            }
        }
        len <<= 1;
    }
}
