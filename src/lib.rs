// Timbre Trainer Core - Rust feature extraction engine
// Per-frame timbre descriptors for bowed-string practice against a reference

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod reference;

// Re-exports for convenience
pub use analysis::{FeatureExtractor, FeatureVector, Frame, OnsetEvent};
pub use config::EngineConfig;
pub use error::{AnalysisError, ConfigError, ErrorCode, ReferenceError};
pub use metrics::{MetricCategory, MetricInfo, MetricKey};
pub use reference::{ReferenceCapture, ReferenceProfile, SessionSummary};

/// Install a `tracing` fmt subscriber for hosts and tests
///
/// Records emitted through the `log` facade are forwarded as well. Calling
/// this more than once is harmless; later calls leave the first subscriber in
/// place.
pub fn init_logging() {
    if tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        log::info!("[timbre_trainer] Logging initialised");
    }
}
