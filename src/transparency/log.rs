//! Privacy-preserving transparency log.
//!
//! Counts what the tracker observed and produced, without storing any key
//! identity or typed content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency counters for the current process.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Key press notifications processed
    presses: AtomicU64,
    /// Key release notifications processed
    releases: AtomicU64,
    /// Paste notifications processed
    pastes: AtomicU64,
    /// Structural mutations processed
    mutations: AtomicU64,
    /// Purity snapshots taken
    purity_snapshots: AtomicU64,
    /// Jitter profiles produced
    jitter_profiles: AtomicU64,
    /// Tracker resets
    resets: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            presses: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            pastes: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
            purity_snapshots: AtomicU64::new(0),
            jitter_profiles: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a transparency log that accumulates into `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous transparency stats: {e}");
        }

        log
    }

    /// Record a processed key press.
    pub fn record_press(&self) {
        self.presses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a processed key release.
    pub fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an observed paste.
    pub fn record_paste(&self) {
        self.pastes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an observed text mutation.
    pub fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a purity snapshot taken.
    pub fn record_purity_snapshot(&self) {
        self.purity_snapshots.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a jitter profile produced.
    pub fn record_jitter_profile(&self) {
        self.jitter_profiles.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tracker reset.
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            presses: self.presses.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            pastes: self.pastes.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
            purity_snapshots: self.purity_snapshots.load(Ordering::Relaxed),
            jitter_profiles: self.jitter_profiles.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Key presses processed: {}\n\
             - Key releases processed: {}\n\
             - Pastes observed: {}\n\
             - Text mutations observed: {}\n\
             - Purity snapshots taken: {}\n\
             - Jitter profiles produced: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No typed content retained\n\
             - Pastes recorded by length only\n\
             - Only timing statistics leave the tracker",
            stats.presses,
            stats.releases,
            stats.pastes,
            stats.mutations,
            stats.purity_snapshots,
            stats.jitter_profiles,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                presses: stats.presses,
                releases: stats.releases,
                pastes: stats.pastes,
                mutations: stats.mutations,
                purity_snapshots: stats.purity_snapshots,
                jitter_profiles: stats.jitter_profiles,
                resets: stats.resets,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.presses.store(persisted.presses, Ordering::Relaxed);
                self.releases.store(persisted.releases, Ordering::Relaxed);
                self.pastes.store(persisted.pastes, Ordering::Relaxed);
                self.mutations.store(persisted.mutations, Ordering::Relaxed);
                self.purity_snapshots
                    .store(persisted.purity_snapshots, Ordering::Relaxed);
                self.jitter_profiles
                    .store(persisted.jitter_profiles, Ordering::Relaxed);
                self.resets.store(persisted.resets, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub presses: u64,
    pub releases: u64,
    pub pastes: u64,
    pub mutations: u64,
    pub purity_snapshots: u64,
    pub jitter_profiles: u64,
    pub resets: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedStats {
    pub presses: u64,
    pub releases: u64,
    pub pastes: u64,
    pub mutations: u64,
    pub purity_snapshots: u64,
    pub jitter_profiles: u64,
    pub resets: u64,
    pub last_updated: DateTime<Utc>,
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

/// Create a new shared transparency log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_log_counting() {
        let log = TransparencyLog::new();

        log.record_press();
        log.record_press();
        log.record_paste();

        let stats = log.stats();
        assert_eq!(stats.presses, 2);
        assert_eq!(stats.pastes, 1);
        assert_eq!(stats.releases, 0);
    }

    #[test]
    fn test_persistence_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats").join("transparency.json");

        let log = TransparencyLog::with_persistence(path.clone());
        log.record_press();
        log.record_jitter_profile();
        log.save().unwrap();

        let reloaded = TransparencyLog::with_persistence(path);
        reloaded.record_press();
        let stats = reloaded.stats();
        assert_eq!(stats.presses, 2);
        assert_eq!(stats.jitter_profiles, 1);
    }

    #[test]
    fn test_summary_format() {
        let log = TransparencyLog::new();
        let summary = log.summary();

        assert!(summary.contains("Key presses"));
        assert!(summary.contains("Pastes observed"));
        assert!(summary.contains("Privacy Guarantee"));
        assert!(summary.contains("No typed content retained"));
    }
}
