// Reference module - reference capture, comparison and session summaries
//
// This module provides three components built on top of FeatureVectors:
// 1. ReferenceCapture: Collects feature frames for a fixed duration and
//    averages them into a ReferenceProfile
// 2. compare / top_deviations: Per-metric comparison of live frames against
//    a ReferenceProfile
// 3. SessionSummary: Per-metric statistics over a recorded session
//
// The reference workflow:
// 1. Reset the FeatureExtractor and start a ReferenceCapture
// 2. Offer every non-silent FeatureVector until the capture duration elapses
// 3. Finish to obtain the ReferenceProfile, then reset the FeatureExtractor again
// 4. Compare each live FeatureVector against the profile

pub mod capture;
pub mod compare;
pub mod summary;

pub use capture::{CaptureProgress, ReferenceCapture, ReferenceProfile};
pub use compare::{compare, top_deviations, DeviationDirection, MetricComparison, Severity};
pub use summary::{MetricSummary, SessionSummary};
