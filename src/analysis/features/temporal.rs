// Temporal module - Time-domain level measurement
//
// This module computes the frame level directly from the time-domain
// signal. The aggregator uses it for the silence gate, the onset detector
// and the reported RMS metric.

use crate::analysis::features::types::SPECTRUM_FLOOR_DB;

/// Compute the RMS level of a frame in dB full scale
///
/// # Returns
/// 20·log10(rms), or -100 dB for an empty or all-zero frame
pub fn rms_db(audio: &[f32]) -> f64 {
    if audio.is_empty() {
        return SPECTRUM_FLOOR_DB;
    }

    let sum_sq: f64 = audio.iter().map(|&s| s as f64 * s as f64).sum();
    let rms = (sum_sq / audio.len() as f64).sqrt();

    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        SPECTRUM_FLOOR_DB
    }
}
