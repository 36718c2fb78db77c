//! Event port between a hosting UI layer and the tracker.
//!
//! The host owns the actual text widget. It exposes it as an [`InputHandle`]
//! that accepts listeners for key presses, releases and pastes, and
//! optionally an observer for structural text changes (voice dictation,
//! drag-drop, programmatic injection).

pub mod replay;
pub mod types;
pub mod virtual_input;

use std::rc::Rc;

// Re-export commonly used types
pub use replay::{read_events, spawn_reader, ReplayError};
pub use types::{InputEvent, KeyEvent, Modifiers, MutationRecord, PasteEvent, EDITING_KEYS};
pub use virtual_input::VirtualInput;

/// Receives keyboard and paste notifications from an input.
pub trait InputListener {
    fn on_press(&self, event: &KeyEvent);
    fn on_release(&self, event: &KeyEvent);
    fn on_paste(&self, event: &PasteEvent);
}

/// Receives structural text changes from an input's subtree.
pub trait MutationListener {
    fn on_mutate(&self, record: &MutationRecord);
}

/// Identifies a registered [`InputListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Identifies a registered [`MutationListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// An attachable text input.
///
/// Implementations must deliver events synchronously and in the order the
/// user produced them. Removing an id that is not registered is a no-op.
pub trait InputHandle {
    fn add_listener(&self, listener: Rc<dyn InputListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);

    /// Register a structural-change observer.
    ///
    /// Returns `None` when the host cannot observe text mutations.
    fn observe_mutations(&self, observer: Rc<dyn MutationListener>) -> Option<ObserverId>;

    fn disconnect_observer(&self, id: ObserverId);
}
