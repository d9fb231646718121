// Stability module - rolling short-term statistics
//
// A RollingWindow keeps the most recent values of one scalar metric (pitch,
// spectral centroid) and reports their population mean and standard
// deviation. Its capacity is derived from a real-time duration at configure
// time, so the window covers the same span of audio whatever the hop size.

use std::collections::VecDeque;

/// Bounded FIFO of recent values with population statistics
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create an empty window holding at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest when full; absent or non-finite values are ignored
    pub fn push(&mut self, value: Option<f64>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Population mean, `None` while empty
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Population standard deviation; 0 with fewer than two values
    pub fn std_dev(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let Some(mean) = self.mean() else {
            return 0.0;
        };
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Pitch stability in cents: 1200 · log2((mean + sd) / mean)
///
/// # Returns
/// `None` unless the window mean is positive and the current frame has a pitch
pub fn pitch_stability_cents(window: &RollingWindow, current_f0: Option<f64>) -> Option<f64> {
    current_f0?;
    let mean = window.mean().filter(|&m| m > 0.0)?;
    Some(1200.0 * ((mean + window.std_dev()) / mean).log2())
}
