//! Host-agnostic text input.
//!
//! `VirtualInput` plays the role of a text area for hosts without a widget
//! toolkit (replay tooling, tests). It tracks the current text length only.

use crate::port::types::{InputEvent, KeyEvent, MutationRecord, PasteEvent};
use crate::port::{InputHandle, InputListener, ListenerId, MutationListener, ObserverId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// An in-memory input that dispatches events to its listeners synchronously.
pub struct VirtualInput {
    listeners: RefCell<Vec<(ListenerId, Rc<dyn InputListener>)>>,
    observers: RefCell<Vec<(ObserverId, Rc<dyn MutationListener>)>>,
    supports_mutations: bool,
    text_len: Cell<usize>,
    next_id: Cell<u64>,
}

impl VirtualInput {
    /// Create an input that supports mutation observation.
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            supports_mutations: true,
            text_len: Cell::new(0),
            next_id: Cell::new(1),
        }
    }

    /// Create an input whose host cannot observe structural changes.
    pub fn without_observer() -> Self {
        Self {
            supports_mutations: false,
            ..Self::new()
        }
    }

    /// Deliver a key press. Printable keys grow the text by one character.
    pub fn press(&self, event: KeyEvent) {
        if event.typed_char().is_some() {
            self.text_len.set(self.text_len.get().saturating_add(1));
        }
        for listener in self.snapshot_listeners() {
            listener.on_press(&event);
        }
    }

    /// Deliver a key release.
    pub fn release(&self, event: KeyEvent) {
        for listener in self.snapshot_listeners() {
            listener.on_release(&event);
        }
    }

    /// Press and release `key` at `at_ms`, holding it for `hold_ms`.
    pub fn tap(&self, key: &str, at_ms: f64, hold_ms: f64) {
        self.press(KeyEvent::new(key, at_ms));
        self.release(KeyEvent::new(key, at_ms + hold_ms));
    }

    /// Deliver a paste of `text`.
    pub fn paste(&self, text: &str) {
        self.deliver_paste(PasteEvent::from_text(text));
    }

    fn deliver_paste(&self, event: PasteEvent) {
        self.text_len
            .set(self.text_len.get().saturating_add(event.text_len));
        for listener in self.snapshot_listeners() {
            listener.on_paste(&event);
        }
    }

    /// Deliver a recorded event, e.g. from a replay log.
    pub fn dispatch(&self, event: InputEvent) {
        match event {
            InputEvent::Press(e) => self.press(e),
            InputEvent::Release(e) => self.release(e),
            InputEvent::Paste(e) => self.deliver_paste(e),
            InputEvent::Mutate(record) => {
                self.text_len.set(record.new_len);
                self.emit_mutation(record);
            }
        }
    }

    /// Insert text without keyboard or clipboard involvement.
    ///
    /// Only this path produces a [`MutationRecord`].
    pub fn inject(&self, text: &str) {
        let old_len = self.text_len.get();
        let new_len = old_len.saturating_add(text.encode_utf16().count());
        self.text_len.set(new_len);
        self.emit_mutation(MutationRecord { old_len, new_len });
    }

    /// Replace the whole text content, e.g. after an autocorrect pass.
    pub fn replace_text(&self, new_len: usize) {
        let old_len = self.text_len.replace(new_len);
        self.emit_mutation(MutationRecord { old_len, new_len });
    }

    /// Clear the text (as after a form submit). No mutation is reported.
    pub fn clear(&self) {
        self.text_len.set(0);
    }

    /// Current text length in UTF-16 units.
    pub fn text_len(&self) -> usize {
        self.text_len.get()
    }

    /// Number of registered listeners and observers.
    pub fn registration_count(&self) -> usize {
        self.listeners.borrow().len() + self.observers.borrow().len()
    }

    fn emit_mutation(&self, record: MutationRecord) {
        let observers: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer.on_mutate(&record);
        }
    }

    // Listeners may detach themselves while handling an event.
    fn snapshot_listeners(&self) -> Vec<Rc<dyn InputListener>> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect()
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for VirtualInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandle for VirtualInput {
    fn add_listener(&self, listener: Rc<dyn InputListener>) -> ListenerId {
        let id = ListenerId(self.allocate_id());
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    fn observe_mutations(&self, observer: Rc<dyn MutationListener>) -> Option<ObserverId> {
        if !self.supports_mutations {
            return None;
        }
        let id = ObserverId(self.allocate_id());
        self.observers.borrow_mut().push((id, observer));
        Some(id)
    }

    fn disconnect_observer(&self, id: ObserverId) {
        self.observers.borrow_mut().retain(|(oid, _)| *oid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        presses: Cell<usize>,
        pasted: Cell<usize>,
        added: Cell<usize>,
    }

    impl InputListener for Recorder {
        fn on_press(&self, _event: &KeyEvent) {
            self.presses.set(self.presses.get() + 1);
        }
        fn on_release(&self, _event: &KeyEvent) {}
        fn on_paste(&self, event: &PasteEvent) {
            self.pasted.set(self.pasted.get() + event.text_len);
        }
    }

    impl MutationListener for Recorder {
        fn on_mutate(&self, record: &MutationRecord) {
            self.added.set(self.added.get() + record.added());
        }
    }

    #[test]
    fn test_dispatch_and_removal() {
        let input = VirtualInput::new();
        let recorder = Rc::new(Recorder::default());
        let id = input.add_listener(recorder.clone());

        input.tap("a", 0.0, 50.0);
        input.paste("hello");
        assert_eq!(recorder.presses.get(), 1);
        assert_eq!(recorder.pasted.get(), 5);
        assert_eq!(input.text_len(), 6);

        input.remove_listener(id);
        input.remove_listener(id);
        input.tap("b", 100.0, 50.0);
        assert_eq!(recorder.presses.get(), 1);
        assert_eq!(input.registration_count(), 0);
    }

    #[test]
    fn test_only_injection_emits_mutations() {
        let input = VirtualInput::new();
        let recorder = Rc::new(Recorder::default());
        let id = input.observe_mutations(recorder.clone()).unwrap();

        input.tap("a", 0.0, 40.0);
        input.paste("pasted");
        assert_eq!(recorder.added.get(), 0);

        input.inject("dictated words");
        assert_eq!(recorder.added.get(), 14);

        input.disconnect_observer(id);
        input.inject("more");
        assert_eq!(recorder.added.get(), 14);
    }

    #[test]
    fn test_dispatch_routes_recorded_events() {
        let input = VirtualInput::new();
        let recorder = Rc::new(Recorder::default());
        input.add_listener(recorder.clone());
        input.observe_mutations(recorder.clone());

        input.dispatch(InputEvent::Press(KeyEvent::new("q", 0.0)));
        input.dispatch(InputEvent::Paste(PasteEvent { text_len: 9 }));
        input.dispatch(InputEvent::Mutate(MutationRecord { old_len: 10, new_len: 40 }));

        assert_eq!(recorder.presses.get(), 1);
        assert_eq!(recorder.pasted.get(), 9);
        assert_eq!(recorder.added.get(), 30);
        assert_eq!(input.text_len(), 40);
    }

    #[test]
    fn test_text_length_saturates() {
        let input = VirtualInput::new();
        input.dispatch(InputEvent::Paste(PasteEvent { text_len: usize::MAX }));
        input.tap("a", 0.0, 50.0);
        input.paste("more");
        input.inject("dictated text");
        assert_eq!(input.text_len(), usize::MAX);
    }

    #[test]
    fn test_without_observer_refuses_mutation_listeners() {
        let input = VirtualInput::without_observer();
        let recorder = Rc::new(Recorder::default());
        assert!(input.observe_mutations(recorder).is_none());
    }
}
