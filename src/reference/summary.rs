// Session summary - statistics over a recorded run of feature frames

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::analysis::pitch::note_name;
use crate::error::ReferenceError;
use crate::metrics::MetricKey;

/// Statistics of one metric over the frames in which it was present
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub key: MetricKey,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary of a recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub duration_ms: f64,
    pub frame_count: usize,
    pub frames_per_second: f64,
    /// Mean f0 over voiced frames
    pub f0_hz: Option<f64>,
    pub note: Option<String>,
    /// One entry per metric present in at least one frame, in canonical order
    pub metrics: Vec<MetricSummary>,
}

impl SessionSummary {
    /// Summarise `(timestamp_ms, FeatureVector)` pairs in capture order
    ///
    /// # Errors
    /// `InsufficientFrames` with fewer than two frames
    pub fn from_frames(frames: &[(f64, FeatureVector)]) -> Result<Self, ReferenceError> {
        let (first, last) = match frames {
            [first, .., last] => (first.0, last.0),
            _ => {
                return Err(ReferenceError::InsufficientFrames {
                    required: 2,
                    collected: frames.len(),
                })
            }
        };

        let duration_ms = last - first;
        let frames_per_second = if duration_ms > 0.0 {
            frames.len() as f64 / (duration_ms / 1000.0)
        } else {
            0.0
        };

        let metrics: Vec<MetricSummary> = MetricKey::ALL
            .iter()
            .filter_map(|&key| summarize(key, frames.iter().filter_map(|(_, v)| v.get(key))))
            .collect();

        let f0_hz = metrics
            .iter()
            .find(|summary| summary.key == MetricKey::F0)
            .map(|summary| summary.mean);

        Ok(Self {
            duration_ms,
            frame_count: frames.len(),
            frames_per_second,
            note: f0_hz.and_then(note_name),
            f0_hz,
            metrics,
        })
    }

    pub fn metric(&self, key: MetricKey) -> Option<&MetricSummary> {
        self.metrics.iter().find(|summary| summary.key == key)
    }
}

fn summarize<I>(key: MetricKey, values: I) -> Option<MetricSummary>
where
    I: Iterator<Item = f64> + Clone,
{
    let count = values.clone().count();
    if count == 0 {
        return None;
    }

    let (min, max) = values
        .clone()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    // Summation rounding can put the mean of identical values outside [min, max]
    let mean = (values.clone().sum::<f64>() / count as f64).clamp(min, max);
    let variance = (values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64).max(0.0);

    Some(MetricSummary {
        key,
        count,
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
    })
}
