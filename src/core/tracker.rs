//! The keystroke signature tracker.
//!
//! A tracker is attached to at most one [`InputHandle`] at a time. While
//! attached it receives press, release, paste and mutation notifications
//! through a listener adapter that shares its state. Everything runs on the
//! host's event thread; no locking is involved.

use crate::config::TrackerConfig;
use crate::core::snapshot::{self, JitterProfile, PuritySnapshot};
use crate::core::state::TrackerState;
use crate::port::types::{KeyEvent, MutationRecord, PasteEvent};
use crate::port::{InputHandle, InputListener, ListenerId, MutationListener, ObserverId};
use crate::transparency::SharedTransparencyLog;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared between the tracker and its listener adapter.
struct Inner {
    state: TrackerState,
    config: TrackerConfig,
    log: Option<SharedTransparencyLog>,
}

impl Inner {
    fn press(&mut self, event: &KeyEvent) {
        self.state.on_press(event, &self.config);
        if let Some(log) = &self.log {
            log.record_press();
        }
    }

    fn release(&mut self, event: &KeyEvent) {
        self.state.on_release(event, &self.config);
        if let Some(log) = &self.log {
            log.record_release();
        }
    }

    fn paste(&mut self, event: &PasteEvent) {
        self.state.on_paste(event);
        if let Some(log) = &self.log {
            log.record_paste();
        }
    }

    fn mutate(&mut self, record: &MutationRecord) {
        self.state.on_mutate(record, &self.config);
        if let Some(log) = &self.log {
            log.record_mutation();
        }
    }
}

/// Listener registered on the attached input.
struct Adapter {
    inner: Rc<RefCell<Inner>>,
}

impl InputListener for Adapter {
    fn on_press(&self, event: &KeyEvent) {
        self.inner.borrow_mut().press(event);
    }

    fn on_release(&self, event: &KeyEvent) {
        self.inner.borrow_mut().release(event);
    }

    fn on_paste(&self, event: &PasteEvent) {
        self.inner.borrow_mut().paste(event);
    }
}

impl MutationListener for Adapter {
    fn on_mutate(&self, record: &MutationRecord) {
        self.inner.borrow_mut().mutate(record);
    }
}

/// Registrations held on the attached input.
struct Attachment {
    input: Rc<dyn InputHandle>,
    listener: ListenerId,
    observer: Option<ObserverId>,
}

/// Read-only counters describing the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub human_chars: u64,
    pub alien_chars: u64,
    pub total_keystrokes: u64,
    pub flight_samples: usize,
    pub dwell_samples: usize,
    pub fatigue_windows: usize,
    pub open_presses: usize,
}

/// Builds a behavioral typing signature for one text input.
pub struct KeystrokeSignatureTracker {
    inner: Rc<RefCell<Inner>>,
    attachment: Option<Attachment>,
    time_zone: Option<Tz>,
}

impl KeystrokeSignatureTracker {
    /// Create a tracker with default thresholds.
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Create a tracker with custom thresholds.
    pub fn with_config(config: TrackerConfig) -> Self {
        let state = TrackerState::new(&config);
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state,
                config,
                log: None,
            })),
            attachment: None,
            time_zone: None,
        }
    }

    /// Report `hour_of_day` in `tz` instead of host local time.
    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.time_zone = Some(tz);
        self
    }

    /// Count processed events in `log`.
    pub fn with_transparency_log(self, log: SharedTransparencyLog) -> Self {
        self.inner.borrow_mut().log = Some(log);
        self
    }

    /// Attach to `input`, detaching from any previous input first.
    ///
    /// Passing `None` only detaches.
    pub fn attach(&mut self, input: Option<Rc<dyn InputHandle>>) {
        self.detach();

        let Some(input) = input else {
            return;
        };

        let adapter = Rc::new(Adapter {
            inner: Rc::clone(&self.inner),
        });
        let listener = input.add_listener(adapter.clone());
        let observer = input.observe_mutations(adapter);
        if observer.is_none() {
            tracing::debug!("Input cannot observe mutations; tracking keyboard and paste only");
        }

        tracing::debug!("Tracker attached");
        self.attachment = Some(Attachment {
            input,
            listener,
            observer,
        });
    }

    /// Remove all registrations from the attached input.
    ///
    /// Safe to call any number of times.
    pub fn detach(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            attachment.input.remove_listener(attachment.listener);
            if let Some(observer) = attachment.observer {
                attachment.input.disconnect_observer(observer);
            }
            tracing::debug!("Tracker detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Replace all tracking data with a fresh session.
    ///
    /// The attachment, if any, is kept.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.state = TrackerState::new(&inner.config);
        if let Some(log) = &inner.log {
            log.record_reset();
        }
        tracing::debug!("Tracker reset");
    }

    /// Current purity snapshot. Never mutates tracking data.
    pub fn purity(&self) -> PuritySnapshot {
        let inner = self.inner.borrow();
        let snapshot = snapshot::purity(&inner.state, &inner.config);
        if let Some(log) = &inner.log {
            log.record_purity_snapshot();
        }
        snapshot
    }

    /// Jitter profile for submission, `None` when signal is insufficient.
    ///
    /// Does not consume the session; call [`reset`](Self::reset) for that.
    pub fn jitter_profile(&self) -> Option<JitterProfile> {
        let inner = self.inner.borrow();
        let profile = snapshot::jitter_profile(&inner.state, &inner.config, self.time_zone);
        if profile.is_some() {
            if let Some(log) = &inner.log {
                log.record_jitter_profile();
            }
        }
        profile
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.inner.borrow().state.session_start
    }

    pub fn stats(&self) -> TrackerStats {
        let inner = self.inner.borrow();
        let state = &inner.state;
        TrackerStats {
            human_chars: state.human_chars,
            alien_chars: state.alien_chars,
            total_keystrokes: state.total_keystrokes,
            flight_samples: state.flight_times.len(),
            dwell_samples: state.dwell_times.len(),
            fatigue_windows: state.fatigue_windows.len(),
            open_presses: state.key_down_times.len(),
        }
    }

    /// Flight times held, oldest first.
    pub fn flight_times(&self) -> Vec<f64> {
        self.inner.borrow().state.flight_times.to_vec()
    }

    /// Fatigue window averages held, oldest first.
    pub fn fatigue_windows(&self) -> Vec<f64> {
        self.inner.borrow().state.fatigue_windows.to_vec()
    }

    /// Feed a key press directly, for hosts that call in.
    pub fn on_press(&self, event: &KeyEvent) {
        self.inner.borrow_mut().press(event);
    }

    pub fn on_release(&self, event: &KeyEvent) {
        self.inner.borrow_mut().release(event);
    }

    pub fn on_paste(&self, event: &PasteEvent) {
        self.inner.borrow_mut().paste(event);
    }

    pub fn on_mutate(&self, record: &MutationRecord) {
        self.inner.borrow_mut().mutate(record);
    }
}

impl Default for KeystrokeSignatureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KeystrokeSignatureTracker {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::VirtualInput;
    use crate::transparency::create_shared_log;

    #[test]
    fn test_attach_registers_and_detach_removes() {
        let input = Rc::new(VirtualInput::new());
        let mut tracker = KeystrokeSignatureTracker::new();

        tracker.attach(Some(input.clone()));
        assert!(tracker.is_attached());
        assert_eq!(input.registration_count(), 2);

        tracker.detach();
        tracker.detach();
        assert!(!tracker.is_attached());
        assert_eq!(input.registration_count(), 0);
    }

    #[test]
    fn test_reattach_moves_listeners() {
        let first = Rc::new(VirtualInput::new());
        let second = Rc::new(VirtualInput::new());
        let mut tracker = KeystrokeSignatureTracker::new();

        tracker.attach(Some(first.clone()));
        tracker.attach(Some(second.clone()));
        assert_eq!(first.registration_count(), 0);
        assert_eq!(second.registration_count(), 2);

        first.tap("a", 0.0, 50.0);
        assert_eq!(tracker.stats().human_chars, 0);
        second.tap("a", 0.0, 50.0);
        assert_eq!(tracker.stats().human_chars, 1);
    }

    #[test]
    fn test_drop_detaches() {
        let input = Rc::new(VirtualInput::new());
        {
            let mut tracker = KeystrokeSignatureTracker::new();
            tracker.attach(Some(input.clone()));
        }
        assert_eq!(input.registration_count(), 0);
    }

    #[test]
    fn test_keyboard_only_without_observer() {
        let input = Rc::new(VirtualInput::without_observer());
        let mut tracker = KeystrokeSignatureTracker::new();
        tracker.attach(Some(input.clone()));
        assert_eq!(input.registration_count(), 1);

        input.inject("a long dictated sentence without keys");
        input.tap("h", 0.0, 60.0);
        let stats = tracker.stats();
        assert_eq!(stats.alien_chars, 0);
        assert_eq!(stats.human_chars, 1);
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let tracker = KeystrokeSignatureTracker::new();
        for i in 0..30 {
            tracker.on_press(&KeyEvent::new("a", i as f64 * 120.0));
        }
        let before = tracker.stats();
        let first = tracker.purity();
        let profile = tracker.jitter_profile();
        assert_eq!(tracker.purity(), first);
        assert_eq!(tracker.jitter_profile(), profile);
        assert_eq!(tracker.stats(), before);
    }

    #[test]
    fn test_transparency_counts() {
        let log = create_shared_log();
        let input = Rc::new(VirtualInput::new());
        let mut tracker = KeystrokeSignatureTracker::new().with_transparency_log(log.clone());
        tracker.attach(Some(input.clone()));

        input.tap("a", 0.0, 50.0);
        input.paste("clip");
        input.inject("voice input longer than tolerance");
        tracker.purity();
        tracker.reset();

        let stats = log.stats();
        assert_eq!(stats.presses, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.pastes, 1);
        assert_eq!(stats.mutations, 1);
        assert_eq!(stats.purity_snapshots, 1);
        assert_eq!(stats.resets, 1);
    }
}
