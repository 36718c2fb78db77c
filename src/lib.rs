//! Purity Tracker - keystroke-dynamics signatures for review verification.
//!
//! This library observes how a review is typed into a single text field and
//! estimates how much of it was typed by a person rather than pasted or
//! injected. It also builds a per-session timing profile (flight time, dwell
//! time, bigram signatures, fatigue drift) that callers forward with a vote
//! for server-side trust scoring.
//!
//! # Privacy Guarantees
//!
//! - **No content**: typed text is never stored; pastes are counted by length
//! - **Bounded memory**: every sample window has a fixed capacity
//! - **No I/O in the tracker**: outputs are plain values the caller forwards
//! - **Transparency**: all observation can be counted and audited
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Purity Tracker                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐    │
//! │  │ InputHandle │──▶│   Tracker   │──▶│ PuritySnapshot   │    │
//! │  │  (host UI)  │   │   (state)   │   │ JitterProfile    │    │
//! │  └─────────────┘   └─────────────┘   └──────────────────┘    │
//! │                           │                   │              │
//! │                           ▼                   ▼              │
//! │                   ┌─────────────┐     ┌──────────────┐       │
//! │                   │Transparency │     │  Submission  │       │
//! │                   │    Log      │     │   (caller)   │       │
//! │                   └─────────────┘     └──────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use purity_tracker::{KeystrokeSignatureTracker, VirtualInput};
//! use std::rc::Rc;
//!
//! let input = Rc::new(VirtualInput::new());
//! let mut tracker = KeystrokeSignatureTracker::new();
//! tracker.attach(Some(input.clone()));
//!
//! for (i, key) in "the food here".chars().enumerate() {
//!     input.tap(&key.to_string(), i as f64 * 140.0, 70.0);
//! }
//! input.paste("copied from somewhere else");
//!
//! let snapshot = tracker.purity();
//! assert_eq!(snapshot.human_chars, 13);
//! assert_eq!(snapshot.alien_chars, 26);
//! assert!(snapshot.purity.is_some());
//!
//! // Clear between compositions.
//! tracker.reset();
//! assert!(tracker.jitter_profile().is_none());
//! ```

pub mod config;
pub mod core;
pub mod port;
pub mod submission;
pub mod transparency;
pub mod trust;

#[cfg(feature = "gateway")]
pub mod gateway;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, TrackerConfig};
pub use core::{
    BigramSignature, JitterProfile, KeystrokeSignatureTracker, PuritySnapshot, TrackerStats,
};
pub use port::{InputEvent, InputHandle, KeyEvent, Modifiers, MutationRecord, PasteEvent, VirtualInput};
pub use submission::{ReviewSubmission, SubmissionBuilder, SubmissionError};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};
pub use trust::{classify, ReviewerProfile, TrustBadge, TrustSummary};

// Gateway re-exports (when enabled)
#[cfg(feature = "gateway")]
pub use gateway::{BlockingGatewayClient, GatewayClient, GatewayConfig, GatewayError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║               PURITY TRACKER - PRIVACY DECLARATION               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  We measure HOW you type a review, not WHAT you type.            ║
║                                                                  ║
║  ✓ WHAT WE MEASURE:                                              ║
║    • Time between key presses (flight time)                      ║
║    • How long each key is held (dwell time)                      ║
║    • Timing of common letter pairs such as "th"                  ║
║    • How many characters were pasted or inserted (count only)    ║
║                                                                  ║
║  ✗ WHAT WE NEVER KEEP:                                           ║
║    • The text you typed or pasted                                ║
║    • Keystrokes outside the review field                         ║
║    • Anything after the review is submitted or cleared           ║
║                                                                  ║
║  Statistics stay in memory and are reset after every review.     ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    purity-tracker status                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
