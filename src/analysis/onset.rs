// OnsetDetector - level-based onset state machine
//
// This module tracks the note attack of a sustained instrument from the
// frame RMS level. Unlike percussive onset detection there is no spectral
// peak picking: a bowed note is considered started once its level climbs
// from below the silence threshold up to the sound threshold, and the time
// that climb took is the rise (attack) time.
//
// States:
// - Silent:  level at or below the silence threshold
// - Rising:  level crossed the silence threshold, sound threshold not yet reached
// - Sustain: sound threshold reached, note is held
//
// Transitions:
// - Silent  → Rising:  level > silence threshold (rise start recorded)
// - Rising  → Sustain: level ≥ sound threshold (OnsetEvent appended)
// - Rising  → Silent:  level < silence threshold
// - Sustain → Silent:  level < silence threshold
//
// A frame that jumps from silence straight past the sound threshold passes
// through Rising within the same update and yields a rise time of zero.

use serde::{Deserialize, Serialize};

use crate::config::OnsetConfig;

/// Current phase of the onset state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnsetState {
    Silent,
    Rising,
    Sustain,
}

/// A completed attack: when it started and how long the climb took
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetEvent {
    /// Timestamp at which the level first exceeded the silence threshold (ms)
    pub onset_time_ms: f64,
    /// Time from the silence crossing to the sound crossing (ms)
    pub rise_time_ms: f64,
}

/// OnsetDetector tracks silence/rise/sustain transitions of the frame level
pub struct OnsetDetector {
    config: OnsetConfig,
    state: OnsetState,
    rise_start_ms: f64,
    latest: Option<OnsetEvent>,
    events: Vec<OnsetEvent>,
}

impl OnsetDetector {
    pub fn new(config: OnsetConfig) -> Self {
        Self {
            config,
            state: OnsetState::Silent,
            rise_start_ms: 0.0,
            latest: None,
            events: Vec::new(),
        }
    }

    /// Advance the state machine by one frame
    ///
    /// # Arguments
    /// * `rms_db` - Frame level in dB
    /// * `timestamp_ms` - Frame timestamp in milliseconds
    ///
    /// # Returns
    /// The onset completed by this frame, if any
    pub fn update(&mut self, rms_db: f64, timestamp_ms: f64) -> Option<OnsetEvent> {
        let silence = self.config.silence_threshold_db;
        let sound = self.config.sound_threshold_db;

        if self.state == OnsetState::Silent && rms_db > silence {
            self.state = OnsetState::Rising;
            self.rise_start_ms = timestamp_ms;
        }

        match self.state {
            OnsetState::Rising if rms_db >= sound => {
                let event = OnsetEvent {
                    onset_time_ms: self.rise_start_ms,
                    rise_time_ms: timestamp_ms - self.rise_start_ms,
                };
                self.state = OnsetState::Sustain;
                self.latest = Some(event);
                self.events.push(event);
                log::debug!(
                    "[OnsetDetector] Onset at {:.1} ms (rise {:.1} ms)",
                    event.onset_time_ms,
                    event.rise_time_ms
                );
                Some(event)
            }
            OnsetState::Rising | OnsetState::Sustain if rms_db < silence => {
                self.state = OnsetState::Silent;
                None
            }
            _ => None,
        }
    }

    pub fn state(&self) -> OnsetState {
        self.state
    }

    /// Milliseconds since the latest onset started, `None` before the first onset
    pub fn time_since_last_onset(&self, now_ms: f64) -> Option<f64> {
        self.latest.map(|event| now_ms - event.onset_time_ms)
    }

    /// Rise time of the latest onset (ms)
    pub fn latest_rise_time(&self) -> Option<f64> {
        self.latest.map(|event| event.rise_time_ms)
    }

    pub fn latest_onset(&self) -> Option<&OnsetEvent> {
        self.latest.as_ref()
    }

    /// Every onset since construction or the last reset, oldest first
    pub fn events(&self) -> &[OnsetEvent] {
        &self.events
    }

    /// Return to `Silent` and clear the event log
    pub fn reset(&mut self) {
        self.state = OnsetState::Silent;
        self.rise_start_ms = 0.0;
        self.latest = None;
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> OnsetDetector {
        OnsetDetector::new(OnsetConfig::default())
    }

    /// Feed (level, time) pairs and collect the emitted events
    fn feed(detector: &mut OnsetDetector, levels: &[(f64, f64)]) -> Vec<OnsetEvent> {
        levels
            .iter()
            .filter_map(|&(db, t)| detector.update(db, t))
            .collect()
    }

    #[test]
    fn test_ramp_yields_single_onset_with_rise_time() {
        let mut detector = detector();
        let levels = [
            (-80.0, 0.0),
            (-70.0, 10.0),
            (-48.0, 20.0), // crosses -50 dB
            (-42.0, 30.0),
            (-36.0, 40.0),
            (-34.0, 50.0), // reaches -35 dB
            (-30.0, 60.0),
            (-30.0, 70.0),
            (-31.0, 80.0),
        ];

        let events = feed(&mut detector, &levels);
        assert_eq!(events.len(), 1, "expected exactly one onset: {:?}", events);
        assert_eq!(events[0].onset_time_ms, 20.0);
        assert_eq!(events[0].rise_time_ms, 30.0);
        assert_eq!(detector.state(), OnsetState::Sustain);
        assert_eq!(detector.events().len(), 1);
        assert_eq!(detector.latest_rise_time(), Some(30.0));
        assert_eq!(detector.time_since_last_onset(120.0), Some(100.0));
    }

    #[test]
    fn test_no_onset_before_first_attack() {
        let mut detector = detector();
        assert_eq!(detector.time_since_last_onset(0.0), None);
        feed(&mut detector, &[(-90.0, 0.0), (-45.0, 10.0), (-60.0, 20.0)]);
        assert_eq!(detector.time_since_last_onset(30.0), None);
        assert_eq!(detector.state(), OnsetState::Silent);
    }

    #[test]
    fn test_aborted_rise_restarts_timing() {
        let mut detector = detector();
        let events = feed(
            &mut detector,
            &[
                (-45.0, 0.0),  // rising
                (-55.0, 10.0), // back to silent
                (-45.0, 20.0), // rising again
                (-30.0, 30.0), // sustain
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].onset_time_ms, 20.0);
        assert_eq!(events[0].rise_time_ms, 10.0);
    }

    #[test]
    fn test_jump_straight_to_sound_has_zero_rise() {
        let mut detector = detector();
        let events = feed(&mut detector, &[(-100.0, 0.0), (-20.0, 10.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rise_time_ms, 0.0);
    }

    #[test]
    fn test_sustain_holds_until_silence() {
        let mut detector = detector();
        feed(&mut detector, &[(-20.0, 0.0)]);
        // Dipping between the thresholds does not retrigger
        let events = feed(&mut detector, &[(-45.0, 10.0), (-20.0, 20.0)]);
        assert!(events.is_empty());
        assert_eq!(detector.state(), OnsetState::Sustain);

        feed(&mut detector, &[(-70.0, 30.0)]);
        assert_eq!(detector.state(), OnsetState::Silent);

        let events = feed(&mut detector, &[(-20.0, 40.0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(detector.events().len(), 2);
        assert_eq!(detector.time_since_last_onset(50.0), Some(10.0));
    }

    #[test]
    fn test_reset_clears_log_and_state() {
        let mut detector = detector();
        feed(&mut detector, &[(-20.0, 0.0)]);
        assert_eq!(detector.events().len(), 1);

        detector.reset();
        assert!(detector.events().is_empty());
        assert_eq!(detector.state(), OnsetState::Silent);
        assert_eq!(detector.time_since_last_onset(100.0), None);
        assert_eq!(detector.latest_rise_time(), None);
    }
}
