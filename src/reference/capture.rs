// Reference capture - collecting and averaging a reference sound
//
// A capture runs for a fixed duration (3 s by default). Every non-silent
// FeatureVector offered while it runs is kept; when it finishes, each metric
// is averaged over the frames in which it was present. Metrics that were
// never present stay absent in the profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::analysis::pitch::note_name;
use crate::config::ReferenceConfig;
use crate::error::ReferenceError;
use crate::metrics::MetricKey;

/// Progress of a running capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureProgress {
    /// Fraction of the capture duration elapsed, in [0, 1]
    pub fraction: f64,
    /// Milliseconds until the capture duration elapses
    pub remaining_ms: f64,
    pub frames_collected: usize,
}

/// Averaged descriptor values of a reference sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    /// Per-metric mean over the frames in which the metric was present
    pub metrics: FeatureVector,
    /// Mean fundamental over voiced frames
    pub f0_hz: Option<f64>,
    /// Nearest note name of `f0_hz`
    pub note: Option<String>,
    pub frame_count: usize,
}

impl ReferenceProfile {
    /// Average a set of frames into a profile
    ///
    /// # Errors
    /// `InsufficientFrames` if fewer than `min_frames` frames are given
    pub fn from_frames(frames: &[FeatureVector], min_frames: usize) -> Result<Self, ReferenceError> {
        if frames.len() < min_frames || frames.is_empty() {
            return Err(ReferenceError::InsufficientFrames {
                required: min_frames.max(1),
                collected: frames.len(),
            });
        }

        let mut sums: BTreeMap<MetricKey, (f64, usize)> = BTreeMap::new();
        for frame in frames {
            for (key, value) in frame.present() {
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let mut metrics = FeatureVector::new();
        for (key, (sum, count)) in sums {
            metrics.set(key, Some(sum / count as f64));
        }

        let f0_hz = metrics.get(MetricKey::F0);
        Ok(Self {
            note: f0_hz.and_then(note_name),
            f0_hz,
            metrics,
            frame_count: frames.len(),
        })
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.metrics.get(key)
    }
}

struct ActiveCapture {
    started_at_ms: f64,
    frames: Vec<FeatureVector>,
}

/// ReferenceCapture manages the reference recording workflow
pub struct ReferenceCapture {
    config: ReferenceConfig,
    active: Option<ActiveCapture>,
}

impl ReferenceCapture {
    pub fn new(config: ReferenceConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Begin a capture at `now_ms`
    ///
    /// # Errors
    /// `AlreadyCapturing` if a capture is running
    pub fn start(&mut self, now_ms: f64) -> Result<(), ReferenceError> {
        if self.active.is_some() {
            return Err(ReferenceError::AlreadyCapturing);
        }

        log::info!(
            "[ReferenceCapture] Started at {:.1} ms for {:.0} ms",
            now_ms,
            self.config.capture_duration_ms
        );
        self.active = Some(ActiveCapture {
            started_at_ms: now_ms,
            frames: Vec::new(),
        });
        Ok(())
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Offer one non-silent frame
    ///
    /// Frames arriving after the capture duration has elapsed are not kept.
    ///
    /// # Returns
    /// Progress after the frame was considered
    pub fn add_frame(
        &mut self,
        vector: &FeatureVector,
        now_ms: f64,
    ) -> Result<CaptureProgress, ReferenceError> {
        let duration = self.config.capture_duration_ms;
        let active = self.active.as_mut().ok_or(ReferenceError::NotCapturing)?;

        if now_ms - active.started_at_ms <= duration {
            active.frames.push(vector.clone());
        }

        Ok(progress_of(active, duration, now_ms))
    }

    /// Progress of the running capture, `None` when idle
    pub fn progress(&self, now_ms: f64) -> Option<CaptureProgress> {
        self.active
            .as_ref()
            .map(|active| progress_of(active, self.config.capture_duration_ms, now_ms))
    }

    /// Whether the capture duration has elapsed
    pub fn is_complete(&self, now_ms: f64) -> bool {
        self.progress(now_ms)
            .is_some_and(|progress| progress.fraction >= 1.0)
    }

    /// End the capture and average the collected frames
    ///
    /// The capture ends whether or not enough frames were collected.
    ///
    /// # Errors
    /// * `NotCapturing` - No capture is running
    /// * `InsufficientFrames` - Fewer than `min_frames` frames (player too quiet)
    pub fn finalize(&mut self) -> Result<ReferenceProfile, ReferenceError> {
        let active = self.active.take().ok_or(ReferenceError::NotCapturing)?;

        let profile = ReferenceProfile::from_frames(&active.frames, self.config.min_frames);
        match &profile {
            Ok(profile) => log::info!(
                "[ReferenceCapture] Reference built from {} frames ({})",
                profile.frame_count,
                profile.note.as_deref().unwrap_or("no pitch")
            ),
            Err(err) => log::warn!("[ReferenceCapture] Capture failed: {}", err),
        }
        profile
    }

    /// Abandon a running capture without building a profile
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            log::debug!("[ReferenceCapture] Capture cancelled");
        }
    }
}

fn progress_of(active: &ActiveCapture, duration_ms: f64, now_ms: f64) -> CaptureProgress {
    let elapsed = (now_ms - active.started_at_ms).max(0.0);
    let fraction = if duration_ms > 0.0 {
        (elapsed / duration_ms).min(1.0)
    } else {
        1.0
    };

    CaptureProgress {
        fraction,
        remaining_ms: (duration_ms - elapsed).max(0.0),
        frames_collected: active.frames.len(),
    }
}
