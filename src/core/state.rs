//! Session-scoped typing statistics and the event handlers that feed them.
//!
//! The state never stores typed text. Characters are held only as the
//! previous key (for bigram pairing) and as keys of open press timestamps.

use crate::config::TrackerConfig;
use crate::core::window::{round2, RollingWindow};
use crate::port::types::{KeyEvent, MutationRecord, PasteEvent};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// The 30 most common English bigrams, used for typing signatures.
pub const TRACKED_BIGRAMS: [&str; 30] = [
    "th", "he", "in", "er", "an", "re", "on", "at", "en", "nd", "ti", "es", "or", "te", "of",
    "ed", "is", "it", "al", "ar", "st", "to", "nt", "ng", "se", "ha", "as", "ou", "io", "le",
];

/// Returns the bigram key when `first` followed by `second` is tracked.
pub fn tracked_bigram(first: char, second: char) -> Option<&'static str> {
    let mut buf = [0u8; 8];
    let len_first = first.encode_utf8(&mut buf).len();
    let len_second = second.encode_utf8(&mut buf[len_first..]).len();
    let pair = std::str::from_utf8(&buf[..len_first + len_second]).ok()?;
    TRACKED_BIGRAMS.iter().copied().find(|b| *b == pair)
}

/// Mutable tracking state for one composition session.
#[derive(Debug, Clone)]
pub struct TrackerState {
    /// Characters attributed to real keypresses
    pub human_chars: u64,
    /// Characters attributed to paste or large external mutation
    pub alien_chars: u64,
    /// Inter-keystroke intervals in milliseconds
    pub flight_times: RollingWindow,
    /// Press-to-release durations in milliseconds
    pub dwell_times: RollingWindow,
    /// Flight times keyed by tracked bigram
    pub bigram_timings: BTreeMap<&'static str, Vec<f64>>,
    /// Average flight time per fatigue window
    pub fatigue_windows: RollingWindow,
    /// Time of the previous qualifying press
    pub last_key_time: Option<f64>,
    /// Character of the previous qualifying press
    pub last_key_char: Option<char>,
    /// Open press timestamps awaiting release
    pub key_down_times: HashMap<char, f64>,
    /// Qualifying keydown events seen this session
    pub total_keystrokes: u64,
    /// When this session started
    pub session_start: DateTime<Utc>,
}

impl TrackerState {
    /// Create an empty state sized by `config`, starting now.
    pub fn new(config: &TrackerConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// Create an empty state with an explicit session start.
    pub fn starting_at(config: &TrackerConfig, session_start: DateTime<Utc>) -> Self {
        Self {
            human_chars: 0,
            alien_chars: 0,
            flight_times: RollingWindow::new(config.max_flight_samples),
            dwell_times: RollingWindow::new(config.max_dwell_samples),
            bigram_timings: BTreeMap::new(),
            fatigue_windows: RollingWindow::new(config.fatigue_window_count),
            last_key_time: None,
            last_key_char: None,
            key_down_times: HashMap::new(),
            total_keystrokes: 0,
            session_start,
        }
    }

    /// Handle a key press.
    pub fn on_press(&mut self, event: &KeyEvent, config: &TrackerConfig) {
        let Some(current) = event.typed_char() else {
            return;
        };
        let now = event.timestamp_ms;

        self.human_chars += 1;
        self.total_keystrokes += 1;
        self.key_down_times.insert(current, now);

        if let Some(last_time) = self.last_key_time {
            let flight = now - last_time;
            if config.flight_in_bounds(flight) {
                self.record_flight(flight, current, config);
            }
        }

        self.last_key_time = Some(now);
        self.last_key_char = Some(current);
    }

    fn record_flight(&mut self, flight: f64, current: char, config: &TrackerConfig) {
        self.flight_times.push(flight);

        if let Some(bigram) = self
            .last_key_char
            .and_then(|previous| tracked_bigram(previous, current))
        {
            self.bigram_timings.entry(bigram).or_default().push(flight);
        }

        if config.fatigue_window_keystrokes > 0
            && self.total_keystrokes % config.fatigue_window_keystrokes == 0
        {
            let window = config.fatigue_window_keystrokes as usize;
            if let Some(avg) = self.flight_times.tail_mean(window) {
                self.fatigue_windows.push(round2(avg));
            }
        }

        tracing::trace!(
            samples = self.flight_times.len(),
            keystrokes = self.total_keystrokes,
            "flight recorded"
        );
    }

    /// Handle a key release.
    ///
    /// The matching open press is always cleared, even when the dwell time
    /// falls outside the accepted range.
    pub fn on_release(&mut self, event: &KeyEvent, config: &TrackerConfig) {
        let Some(current) = event.typed_char() else {
            return;
        };

        if let Some(pressed_at) = self.key_down_times.remove(&current) {
            let dwell = event.timestamp_ms - pressed_at;
            if config.dwell_in_bounds(dwell) {
                self.dwell_times.push(dwell);
            }
        }
    }

    /// Handle a paste. The whole pasted length counts as alien.
    pub fn on_paste(&mut self, event: &PasteEvent) {
        self.alien_chars = self.alien_chars.saturating_add(event.text_len as u64);
    }

    /// Handle a structural text change.
    ///
    /// Growth up to the autocorrect tolerance is ignored; anything larger
    /// counts in full as alien.
    pub fn on_mutate(&mut self, record: &MutationRecord, config: &TrackerConfig) {
        let added = record.added();
        if added > config.autocorrect_tolerance {
            self.alien_chars = self.alien_chars.saturating_add(added as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::types::Modifiers;

    fn press(state: &mut TrackerState, key: &str, at: f64) {
        state.on_press(&KeyEvent::new(key, at), &TrackerConfig::default());
    }

    fn release(state: &mut TrackerState, key: &str, at: f64) {
        state.on_release(&KeyEvent::new(key, at), &TrackerConfig::default());
    }

    fn fresh() -> TrackerState {
        TrackerState::new(&TrackerConfig::default())
    }

    #[test]
    fn test_tracked_bigram_lookup() {
        assert_eq!(tracked_bigram('t', 'h'), Some("th"));
        assert_eq!(tracked_bigram('l', 'e'), Some("le"));
        assert_eq!(tracked_bigram('h', 't'), None);
        assert_eq!(tracked_bigram('é', 't'), None);
    }

    #[test]
    fn test_first_press_has_no_flight() {
        let mut state = fresh();
        press(&mut state, "a", 1000.0);
        assert_eq!(state.human_chars, 1);
        assert_eq!(state.total_keystrokes, 1);
        assert!(state.flight_times.is_empty());
        assert_eq!(state.last_key_time, Some(1000.0));
        assert_eq!(state.last_key_char, Some('a'));
    }

    #[test]
    fn test_flight_bounds_filtering() {
        let mut state = fresh();
        press(&mut state, "a", 0.0);
        press(&mut state, "b", 5.0); // too fast
        press(&mut state, "c", 3005.0); // too slow
        press(&mut state, "d", 3505.0);
        assert_eq!(state.flight_times.to_vec(), vec![500.0]);
        assert_eq!(state.human_chars, 4);
    }

    #[test]
    fn test_cursor_advances_after_rejected_flight() {
        let mut state = fresh();
        press(&mut state, "t", 0.0);
        press(&mut state, "x", 5000.0);
        press(&mut state, "h", 5100.0);
        // "xh" is not tracked and "th" was never consecutive.
        assert!(state.bigram_timings.is_empty());
        assert_eq!(state.flight_times.to_vec(), vec![100.0]);
    }

    #[test]
    fn test_ignored_keys_do_not_count() {
        let mut state = fresh();
        let config = TrackerConfig::default();
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        state.on_press(&KeyEvent::new("v", 0.0).with_modifiers(ctrl), &config);
        state.on_press(&KeyEvent::new("Backspace", 10.0), &config);
        state.on_press(&KeyEvent::new("Shift", 20.0), &config);
        assert_eq!(state.human_chars, 0);
        assert_eq!(state.total_keystrokes, 0);
        assert!(state.last_key_time.is_none());
    }

    #[test]
    fn test_bigram_recorded_case_insensitively() {
        let mut state = fresh();
        press(&mut state, "T", 0.0);
        press(&mut state, "h", 120.0);
        assert_eq!(state.bigram_timings.get("th"), Some(&vec![120.0]));
    }

    #[test]
    fn test_dwell_pairing_and_cleanup() {
        let mut state = fresh();
        press(&mut state, "a", 0.0);
        release(&mut state, "A", 80.0);
        assert_eq!(state.dwell_times.to_vec(), vec![80.0]);
        assert!(state.key_down_times.is_empty());

        // Out-of-range dwell still clears the open press.
        press(&mut state, "b", 200.0);
        release(&mut state, "b", 900.0);
        assert_eq!(state.dwell_times.len(), 1);
        assert!(state.key_down_times.is_empty());

        // Release without a press is a no-op.
        release(&mut state, "z", 1000.0);
        assert_eq!(state.dwell_times.len(), 1);
    }

    #[test]
    fn test_last_press_wins_for_repeated_key() {
        let mut state = fresh();
        press(&mut state, "e", 0.0);
        press(&mut state, "e", 100.0);
        release(&mut state, "e", 150.0);
        assert_eq!(state.dwell_times.to_vec(), vec![50.0]);
    }

    #[test]
    fn test_mutation_tolerance() {
        let mut state = fresh();
        let config = TrackerConfig::default();
        state.on_mutate(&MutationRecord { old_len: 10, new_len: 25 }, &config);
        assert_eq!(state.alien_chars, 0);
        state.on_mutate(&MutationRecord { old_len: 10, new_len: 26 }, &config);
        assert_eq!(state.alien_chars, 16);
        state.on_mutate(&MutationRecord { old_len: 80, new_len: 2 }, &config);
        assert_eq!(state.alien_chars, 16);
    }

    #[test]
    fn test_alien_count_saturates() {
        let mut state = fresh();
        let config = TrackerConfig::default();
        state.on_paste(&PasteEvent { text_len: usize::MAX });
        state.on_paste(&PasteEvent { text_len: 5 });
        state.on_mutate(&MutationRecord { old_len: 0, new_len: 400 }, &config);
        assert_eq!(state.alien_chars, u64::MAX);
    }

    #[test]
    fn test_fatigue_window_cadence() {
        let mut state = fresh();
        for i in 0..25 {
            press(&mut state, "x", i as f64 * 100.0);
        }
        assert_eq!(state.fatigue_windows.to_vec(), vec![100.0]);

        for i in 25..100 {
            press(&mut state, "x", i as f64 * 100.0);
        }
        assert_eq!(state.fatigue_windows.len(), 4);

        for i in 100..125 {
            press(&mut state, "x", i as f64 * 100.0);
        }
        assert_eq!(state.fatigue_windows.len(), 4);
    }
}
