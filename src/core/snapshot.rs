//! Derived outputs: the purity snapshot and the jitter profile.
//!
//! Both are computed read-only from [`TrackerState`]. A `None` field always
//! means "not enough signal", never zero.

use crate::config::TrackerConfig;
use crate::core::state::TrackerState;
use crate::core::window::{mean, population_std_dev, round2};
use chrono::{Local, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lightweight purity/jitter reading taken at submit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuritySnapshot {
    /// Percentage (0-100) of characters attributed to live typing
    pub purity: Option<f64>,
    /// Standard deviation of flight times in milliseconds
    pub jitter: Option<f64>,
    #[serde(rename = "humanChars")]
    pub human_chars: u64,
    #[serde(rename = "alienChars")]
    pub alien_chars: u64,
}

impl PuritySnapshot {
    /// True when enough characters were seen to score purity.
    pub fn has_signal(&self) -> bool {
        self.purity.is_some()
    }
}

/// Timing summary for a single tracked bigram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigramSignature {
    pub mean: f64,
    pub std: f64,
    pub n: usize,
}

/// Full per-session keystroke profile for server-side trust scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterProfile {
    pub total_keystrokes: u64,
    pub mean_inter_key: f64,
    pub std_inter_key: f64,
    pub mean_dwell: Option<f64>,
    pub std_dwell: Option<f64>,
    pub bigram_signatures: BTreeMap<String, BigramSignature>,
    pub fatigue_drift: Option<f64>,
    pub hour_of_day: u32,
    pub sample_size: usize,
}

/// Compute the purity snapshot.
pub fn purity(state: &TrackerState, config: &TrackerConfig) -> PuritySnapshot {
    let human_chars = state.human_chars;
    let alien_chars = state.alien_chars;
    let total = human_chars.saturating_add(alien_chars);

    if total < config.min_chars_for_score as u64 {
        return PuritySnapshot {
            purity: None,
            jitter: None,
            human_chars,
            alien_chars,
        };
    }

    let purity = round2(human_chars as f64 / total as f64 * 100.0);

    let jitter = if state.flight_times.len() >= config.min_jitter_samples {
        state.flight_times.population_std_dev().map(round2)
    } else {
        None
    };

    PuritySnapshot {
        purity: Some(purity),
        jitter,
        human_chars,
        alien_chars,
    }
}

/// Compute the jitter profile, or `None` with too few flight samples.
///
/// `tz` selects the zone for `hour_of_day`; `None` uses host local time.
pub fn jitter_profile(
    state: &TrackerState,
    config: &TrackerConfig,
    tz: Option<Tz>,
) -> Option<JitterProfile> {
    let flights = &state.flight_times;
    if flights.is_empty() || flights.len() < config.min_profile_samples {
        return None;
    }

    let mean_inter_key = round2(flights.mean()?);
    let std_inter_key = round2(flights.population_std_dev()?);

    let mean_dwell = state.dwell_times.mean().map(round2);
    let std_dwell = if state.dwell_times.len() >= 2 {
        state.dwell_times.population_std_dev().map(round2)
    } else {
        None
    };

    let bigram_signatures = state
        .bigram_timings
        .iter()
        .filter(|(_, timings)| timings.len() >= 2)
        .filter_map(|(bigram, timings)| {
            Some((
                bigram.to_string(),
                BigramSignature {
                    mean: round2(mean(timings)?),
                    std: round2(population_std_dev(timings)?),
                    n: timings.len(),
                },
            ))
        })
        .collect();

    Some(JitterProfile {
        total_keystrokes: state.total_keystrokes,
        mean_inter_key,
        std_inter_key,
        mean_dwell,
        std_dwell,
        bigram_signatures,
        fatigue_drift: fatigue_drift(state),
        hour_of_day: hour_of_day(state, tz),
        sample_size: flights.len(),
    })
}

/// Two-point slope across the fatigue windows.
///
/// Positive values mean typing slowed over the session.
fn fatigue_drift(state: &TrackerState) -> Option<f64> {
    let windows = &state.fatigue_windows;
    if windows.len() < 2 {
        return None;
    }
    let first = windows.first()?;
    let last = windows.last()?;
    Some(round2((last - first) / (windows.len() - 1) as f64))
}

fn hour_of_day(state: &TrackerState, tz: Option<Tz>) -> u32 {
    match tz {
        Some(tz) => state.session_start.with_timezone(&tz).hour(),
        None => state.session_start.with_timezone(&Local).hour(),
    }
}
