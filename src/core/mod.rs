//! Core keystroke-dynamics tracking.
//!
//! This module contains:
//! - Bounded sample windows and their statistics
//! - Session state and the per-event update rules
//! - Purity snapshot and jitter profile computation
//! - The attachable tracker

pub mod snapshot;
pub mod state;
pub mod tracker;
pub mod window;

// Re-export commonly used types
pub use snapshot::{BigramSignature, JitterProfile, PuritySnapshot};
pub use state::{TrackerState, TRACKED_BIGRAMS};
pub use tracker::{KeystrokeSignatureTracker, TrackerStats};
pub use window::RollingWindow;
