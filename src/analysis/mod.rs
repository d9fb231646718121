// Analysis module - per-frame DSP pipeline for timbre analysis
//
// This module groups the stages that turn a captured frame into timbre
// descriptors. The FeatureExtractor in `features` is the entry point; the
// other modules hold the stateful and stateless building blocks it drives.
//
// Architecture:
// - features: FeatureExtractor coordinator plus spectrum/descriptor stages
// - pitch: YIN fundamental frequency estimation (stateless)
// - onset: Level-based onset state machine (per session)
// - stability: Rolling windows for pitch and centroid stability (per session)
//
// Processing is synchronous and single-threaded: one frame is fully analysed
// per call, in capture order. Frame delivery and buffering belong to the
// caller.

pub mod features;
pub mod onset;
pub mod pitch;
pub mod stability;

pub use features::{FeatureExtractor, FeatureVector, Frame};
pub use onset::{OnsetDetector, OnsetEvent, OnsetState};
pub use pitch::{F0Estimate, PitchEstimator, PitchStatus};
pub use stability::RollingWindow;
