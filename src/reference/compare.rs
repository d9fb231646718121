// Reference comparison - live frame against a reference profile
//
// Differences are judged against each metric's display range: a difference
// under `match_tolerance` of the range is a match, otherwise the severity
// follows the relative difference to the reference value.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::config::ReferenceConfig;
use crate::metrics::MetricKey;
use crate::reference::capture::ReferenceProfile;

/// Which side of the reference the current value lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviationDirection {
    Above,
    Below,
    Equal,
}

/// How far a metric has drifted from the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Within the match tolerance of the display range
    Match,
    Minor,
    Moderate,
    Major,
}

/// Comparison of one metric against the reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub key: MetricKey,
    pub current: f64,
    pub reference: f64,
    /// current - reference
    pub diff: f64,
    /// |diff| as a share of the metric's display range
    pub normalized_diff: f64,
    pub direction: DeviationDirection,
    pub severity: Severity,
}

impl MetricComparison {
    /// Corrective hint for the direction of the deviation
    ///
    /// `None` for an exact match, or when the catalog has no advice for that side.
    pub fn tip(&self) -> Option<&'static str> {
        let info = self.key.info();
        match self.direction {
            DeviationDirection::Above => info.tip_up,
            DeviationDirection::Below => info.tip_down,
            DeviationDirection::Equal => None,
        }
    }
}

/// Compare every metric present in both the frame and the profile
///
/// # Returns
/// Comparisons in canonical metric order
pub fn compare(
    current: &FeatureVector,
    profile: &ReferenceProfile,
    config: &ReferenceConfig,
) -> Vec<MetricComparison> {
    current
        .present()
        .filter_map(|(key, value)| {
            let reference = profile.get(key)?;
            compare_metric(key, value, reference, config)
        })
        .collect()
}

fn compare_metric(
    key: MetricKey,
    current: f64,
    reference: f64,
    config: &ReferenceConfig,
) -> Option<MetricComparison> {
    let span = key.info().span();
    if span <= 0.0 {
        return None;
    }

    let diff = current - reference;
    let abs_diff = diff.abs();
    let direction = match diff.partial_cmp(&0.0) {
        Some(Ordering::Greater) => DeviationDirection::Above,
        Some(Ordering::Less) => DeviationDirection::Below,
        _ => DeviationDirection::Equal,
    };

    let severity = if abs_diff < span * config.match_tolerance {
        Severity::Match
    } else {
        let reference_abs = if reference == 0.0 { 1.0 } else { reference.abs() };
        let pct = abs_diff / reference_abs * 100.0;
        if pct > config.major_deviation_pct {
            Severity::Major
        } else if pct > config.moderate_deviation_pct {
            Severity::Moderate
        } else {
            Severity::Minor
        }
    };

    Some(MetricComparison {
        key,
        current,
        reference,
        diff,
        normalized_diff: abs_diff / span,
        direction,
        severity,
    })
}

/// The `n` largest deviations by normalized difference, largest first
///
/// Empty when even the largest deviation is below `match_tolerance`.
pub fn top_deviations(
    comparisons: &[MetricComparison],
    n: usize,
    match_tolerance: f64,
) -> Vec<MetricComparison> {
    let mut sorted = comparisons.to_vec();
    sorted.sort_by(|a, b| {
        b.normalized_diff
            .partial_cmp(&a.normalized_diff)
            .unwrap_or(Ordering::Equal)
    });

    match sorted.first() {
        Some(largest) if largest.normalized_diff >= match_tolerance => {
            sorted.truncate(n);
            sorted
        }
        _ => Vec::new(),
    }
}
